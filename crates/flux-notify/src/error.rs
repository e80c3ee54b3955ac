use thiserror::Error;

/// 通知错误
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Email delivery failed: {0}")]
    Email(String),

    #[error("Topic publish failed: {0}")]
    Publish(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

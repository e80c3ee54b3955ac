use thiserror::Error;

/// 指标子系统错误
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Metrics backend error: {0}")]
    Backend(String),

    #[error("Invalid metric query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

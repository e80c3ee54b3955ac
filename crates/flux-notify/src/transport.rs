//! 外部投递接口及其实现：HTTP Webhook、SMTP 邮件、ntfy 主题发布。

use crate::config::{SmtpConfig, TopicConfig};
use crate::error::NotifyError;
use crate::providers::WebhookPayload;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 邮件内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub source: String,
    pub destination_addresses: Vec<String>,
    pub subject: String,
    pub body_text: String,
}

/// 主题发布请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub topic_arn: String,
    pub subject: String,
    pub message: String,
}

/// Webhook 投递接口
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, url: &str, payload: &WebhookPayload) -> Result<()>;
}

/// 邮件发送接口
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, email: &EmailMessage) -> Result<()>;
}

/// 主题发布接口
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> Result<()>;
}

// ============================================================================
// HTTP Webhook
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct HttpWebhookTransport {
    client: reqwest::Client,
}

impl HttpWebhookTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhookTransport {
    async fn post(&self, url: &str, payload: &WebhookPayload) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Http(format!(
                "webhook failed with status: {}",
                response.status()
            ))
            .into());
        }

        debug!("Webhook payload delivered");
        Ok(())
    }
}

// ============================================================================
// SMTP 邮件
// ============================================================================

pub struct SmtpEmailSender {
    mailer: lettre::AsyncSmtpTransport<lettre::Tokio1Executor>,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig) -> std::result::Result<Self, NotifyError> {
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, Tokio1Executor};

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifyError::Config(e.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<()> {
        use lettre::message::header::ContentType;
        use lettre::{AsyncTransport, Message};

        let mut builder = Message::builder()
            .from(email.source.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        for destination in &email.destination_addresses {
            builder = builder.to(destination.parse()?);
        }

        let message = builder
            .body(email.body_text.clone())
            .map_err(|e| NotifyError::Email(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Email(e.to_string()))?;

        Ok(())
    }
}

/// 未配置 SMTP 时使用：只记录邮件内容
#[derive(Debug, Clone, Default)]
pub struct TracingEmailSender;

#[async_trait]
impl EmailSender for TracingEmailSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<()> {
        info!(
            to = ?email.destination_addresses,
            subject = %email.subject,
            "Email notification would be sent"
        );
        debug!("{}", email.body_text);
        Ok(())
    }
}

// ============================================================================
// ntfy 主题发布
// ============================================================================

pub struct NtfyPublisher {
    base_url: String,
    client: reqwest::Client,
}

impl NtfyPublisher {
    pub fn new(config: &TopicConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// 主题名取 ARN 最后一段，`arn:aws:sns:region:acct:ops` -> `ops`
    pub fn topic_name(topic_arn: &str) -> &str {
        topic_arn.rsplit(':').next().unwrap_or(topic_arn)
    }

    pub fn topic_url(&self, topic_arn: &str) -> String {
        format!("{}/{}", self.base_url, Self::topic_name(topic_arn))
    }
}

#[async_trait]
impl TopicPublisher for NtfyPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<()> {
        let response = self
            .client
            .post(self.topic_url(&request.topic_arn))
            .header("Title", request.subject.as_str())
            .body(request.message.clone())
            .send()
            .await
            .map_err(|e| NotifyError::Publish(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Publish(format!(
                "topic publish failed with status: {}",
                response.status()
            ))
            .into());
        }

        Ok(())
    }
}

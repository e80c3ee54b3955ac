use crate::message::{Alert, AlertSeverity};
use crate::notifier::Notifier;
use crate::transport::{EmailMessage, EmailSender, PublishRequest, TopicPublisher, WebhookTransport};
use anyhow::Result;
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const COLOR_TEAL: &str = "#008080";
const COLOR_AMBER: &str = "#ffbf00";

/// Webhook 附件颜色
///
/// ERROR 与 CRITICAL 没有单独的颜色，落到与 INFO 相同的默认值。
pub fn severity_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Info => COLOR_TEAL,
        AlertSeverity::Warning => COLOR_AMBER,
        _ => COLOR_TEAL,
    }
}

/// `[SEVERITY] title`
pub fn alert_subject(alert: &Alert) -> String {
    format!("[{}] {}", alert.severity, alert.title)
}

/// 邮件与主题消息共用的正文模板
pub fn format_alert_body(alert: &Alert) -> String {
    let mut body = format!("Severity: {}\n", alert.severity);
    body.push_str(&format!(
        "Time: {}\n",
        alert.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    body.push_str(&format!("Message: {}\n", alert.message));

    if let Some(metadata) = &alert.metadata {
        body.push_str("\nMetadata:\n");
        for (key, value) in metadata {
            body.push_str(&format!("{}: {}\n", key, value));
        }
    }

    body
}

// ============================================================================
// 聊天 Webhook
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub attachments: Vec<WebhookAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookAttachment {
    pub title: String,
    pub text: String,
    pub color: String,
    pub fields: Vec<WebhookField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

pub fn build_webhook_payload(alert: &Alert) -> WebhookPayload {
    let fields = alert
        .metadata
        .iter()
        .flatten()
        .map(|(key, value)| WebhookField {
            title: key.clone(),
            value: value.to_string(),
            short: true,
        })
        .collect();

    WebhookPayload {
        attachments: vec![WebhookAttachment {
            title: alert_subject(alert),
            text: alert.message.clone(),
            color: severity_color(alert.severity).to_string(),
            fields,
        }],
    }
}

pub struct ChatWebhookNotifier {
    url: Option<String>,
    transport: Arc<dyn WebhookTransport>,
}

impl ChatWebhookNotifier {
    pub fn new(url: Option<String>, transport: Arc<dyn WebhookTransport>) -> Self {
        Self { url, transport }
    }
}

#[async_trait]
impl Notifier for ChatWebhookNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) else {
            return Ok(());
        };
        self.transport.post(url, &build_webhook_payload(alert)).await
    }

    fn name(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

// ============================================================================
// 邮件
// ============================================================================

pub struct EmailNotifier {
    sender: Arc<dyn EmailSender>,
    source: String,
    destinations: Vec<String>,
}

impl EmailNotifier {
    pub fn new(sender: Arc<dyn EmailSender>, source: String, destinations: Vec<String>) -> Self {
        Self {
            sender,
            source,
            destinations,
        }
    }

    pub fn build_email(&self, alert: &Alert) -> EmailMessage {
        EmailMessage {
            source: self.source.clone(),
            destination_addresses: self.destinations.clone(),
            subject: alert_subject(alert),
            body_text: format_alert_body(alert),
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        self.sender.send_email(&self.build_email(alert)).await
    }

    fn name(&self) -> &str {
        "email"
    }
}

// ============================================================================
// 主题发布（仅严重告警）
// ============================================================================

pub struct TopicNotifier {
    publisher: Arc<dyn TopicPublisher>,
    topic_arn: String,
}

impl TopicNotifier {
    pub fn new(publisher: Arc<dyn TopicPublisher>, topic_arn: String) -> Self {
        Self {
            publisher,
            topic_arn,
        }
    }
}

#[async_trait]
impl Notifier for TopicNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let request = PublishRequest {
            topic_arn: self.topic_arn.clone(),
            subject: alert_subject(alert),
            message: format_alert_body(alert),
        };
        self.publisher.publish(&request).await
    }

    fn name(&self) -> &str {
        "topic"
    }

    fn accepts(&self, severity: AlertSeverity) -> bool {
        severity == AlertSeverity::Critical
    }
}

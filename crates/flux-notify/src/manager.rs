use crate::config::DispatcherConfig;
use crate::error::NotifyError;
use crate::message::Alert;
use crate::notifier::Notifier;
use crate::providers::{ChatWebhookNotifier, EmailNotifier, TopicNotifier};
use crate::transport::{
    EmailSender, HttpWebhookTransport, NtfyPublisher, SmtpEmailSender, TracingEmailSender,
};
use flux_logging::{EventLog, TracingEventLog};
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 单个通道的投递结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelOutcome {
    pub channel: String,
    pub status: DeliveryStatus,
}

/// 一次分发的汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub alert_id: String,
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, DeliveryStatus::Failed(_)))
            .count()
    }

    pub fn outcome(&self, channel: &str) -> Option<&DeliveryStatus> {
        self.outcomes
            .iter()
            .find(|o| o.channel == channel)
            .map(|o| &o.status)
    }
}

/// 告警分发器
///
/// 每条告警并发投递到所有启用且接受该级别的通道，单个通道失败只记录日志，
/// 不影响其他通道。
pub struct AlertDispatcher {
    notifiers: Vec<Box<dyn Notifier>>,
    events: Arc<dyn EventLog>,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
            events: Arc::new(TracingEventLog::new()),
        }
    }

    pub fn with_event_log(mut self, events: Arc<dyn EventLog>) -> Self {
        self.events = events;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.add_notifier(notifier);
        self
    }

    /// 注册通知通道
    pub fn add_notifier(&mut self, notifier: Box<dyn Notifier>) {
        info!("Registered notifier: {}", notifier.name());
        self.notifiers.push(notifier);
    }

    /// 按配置装配 webhook、邮件、主题三个通道
    pub fn from_config(config: &DispatcherConfig) -> Result<Self, NotifyError> {
        let mut dispatcher = Self::new();

        dispatcher.add_notifier(Box::new(ChatWebhookNotifier::new(
            config.webhook_url.clone(),
            Arc::new(HttpWebhookTransport::new()),
        )));

        let sender: Arc<dyn EmailSender> = match &config.email.smtp {
            Some(smtp) => Arc::new(SmtpEmailSender::new(smtp)?),
            None => Arc::new(TracingEmailSender),
        };
        dispatcher.add_notifier(Box::new(EmailNotifier::new(
            sender,
            config.email.source.clone(),
            config.email.destinations.clone(),
        )));

        if let Some(topic) = &config.topic {
            dispatcher.add_notifier(Box::new(TopicNotifier::new(
                Arc::new(NtfyPublisher::new(topic)),
                topic.topic_arn.clone(),
            )));
        }

        Ok(dispatcher)
    }

    pub fn channels(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// 分发告警，等待所有通道完成
    pub async fn send_alert(&self, alert: &Alert) -> DispatchReport {
        let targets: Vec<&dyn Notifier> = self
            .notifiers
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| n.is_enabled() && n.accepts(alert.severity))
            .collect();

        debug!(
            "Dispatching alert {} ({}) to {} channel(s)",
            alert.id,
            alert.severity,
            targets.len()
        );

        let outcomes = join_all(targets.into_iter().map(|notifier| async move {
            let status = match notifier.send(alert).await {
                Ok(()) => {
                    info!("Alert sent via {}: {}", notifier.name(), alert.title);
                    DeliveryStatus::Delivered
                }
                Err(e) => {
                    error!("Alert delivery failed via {}: {}", notifier.name(), e);
                    self.events.error(
                        "Failed to deliver alert",
                        Some(json!({
                            "channel": notifier.name(),
                            "alertId": alert.id,
                            "severity": alert.severity,
                            "error": e.to_string(),
                        })),
                    );
                    DeliveryStatus::Failed(e.to_string())
                }
            };
            ChannelOutcome {
                channel: notifier.name().to_string(),
                status,
            }
        }))
        .await;

        DispatchReport {
            alert_id: alert.id.clone(),
            outcomes,
        }
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

pub mod config;
pub mod error;
pub mod manager;
pub mod message;
pub mod notifier;
pub mod providers;
pub mod transport;

pub use config::{DispatcherConfig, EmailConfig, SmtpConfig, TopicConfig};
pub use error::NotifyError;
pub use manager::{AlertDispatcher, ChannelOutcome, DeliveryStatus, DispatchReport};
pub use message::{Alert, AlertSeverity};
pub use notifier::Notifier;
pub use providers::{
    alert_subject, build_webhook_payload, format_alert_body, severity_color, ChatWebhookNotifier,
    EmailNotifier, TopicNotifier, WebhookAttachment, WebhookField, WebhookPayload,
};
pub use transport::{
    EmailMessage, EmailSender, HttpWebhookTransport, NtfyPublisher, PublishRequest,
    SmtpEmailSender, TopicPublisher, TracingEmailSender, WebhookTransport,
};

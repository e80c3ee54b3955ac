use crate::message::{Alert, AlertSeverity};
use anyhow::Result;
use async_trait::async_trait;

/// 告警通道
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 发送告警
    async fn send(&self, alert: &Alert) -> Result<()>;

    /// 通道名称
    fn name(&self) -> &str;

    /// 是否处理该级别的告警
    fn accepts(&self, _severity: AlertSeverity) -> bool {
        true
    }

    /// 是否启用
    fn is_enabled(&self) -> bool {
        true
    }
}

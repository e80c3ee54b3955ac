use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flux_metrics::{Dimensions, MetricCollector};
use flux_notify::{Alert, AlertDispatcher};

/// 指标历史查询
#[async_trait]
pub trait MetricHistory: Send + Sync {
    /// 返回按时间顺序排列的平均值样本，没有数据时为空
    async fn metric_history(
        &self,
        namespace: &str,
        metric_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: u32,
        dimensions: Option<&Dimensions>,
    ) -> Result<Vec<f64>>;
}

/// 告警出口
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn dispatch(&self, alert: &Alert) -> Result<()>;
}

#[async_trait]
impl MetricHistory for MetricCollector {
    async fn metric_history(
        &self,
        namespace: &str,
        metric_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: u32,
        dimensions: Option<&Dimensions>,
    ) -> Result<Vec<f64>> {
        let mut results = self
            .get_metrics(namespace, &[metric_name.to_string()], start, end, period, dimensions)
            .await?;
        Ok(results.remove(metric_name).unwrap_or_default())
    }
}

#[async_trait]
impl AlertSink for AlertDispatcher {
    async fn dispatch(&self, alert: &Alert) -> Result<()> {
        // 通道失败已在分发器内部记录
        self.send_alert(alert).await;
        Ok(())
    }
}

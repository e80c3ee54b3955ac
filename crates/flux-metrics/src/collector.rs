use crate::backend::MetricsBackend;
use crate::error::{MetricsError, Result};
use crate::model::{
    aggregation_key, Dimensions, MetricAggregation, MetricBatch, MetricDataQuery, MetricDatum,
    Statistic,
};
use crate::telemetry::PipelineMetrics;
use chrono::{DateTime, Utc};
use flux_logging::{EventLog, TracingEventLog};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// 采集器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// 批量刷新间隔（秒）
    pub batch_interval_secs: u64,

    /// 触发立即刷新的排队批次数，同时也是单次后端写入的最大点数
    pub max_batch_size: usize,
}

impl CollectorConfig {
    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs(self.batch_interval_secs)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            batch_interval_secs: 60,
            max_batch_size: 20,
        }
    }
}

/// 指标采集器
///
/// 接收指标批次并排队，在定时器到期或队列达到上限时统一写入后端，
/// 同时维护按 `(namespace, name, 维度)` 聚合的诊断缓存。
/// 克隆后共享同一份状态。
#[derive(Clone)]
pub struct MetricCollector {
    backend: Arc<dyn MetricsBackend>,
    events: Arc<dyn EventLog>,
    telemetry: Option<Arc<PipelineMetrics>>,
    config: CollectorConfig,

    // 待刷新的批次
    queue: Arc<Mutex<Vec<MetricBatch>>>,
    // 聚合键 -> 运行聚合
    aggregations: Arc<RwLock<HashMap<String, MetricAggregation>>>,
    // 已挂起的刷新定时器
    flush_timer: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MetricCollector {
    pub fn new(backend: Arc<dyn MetricsBackend>, config: CollectorConfig) -> Self {
        Self {
            backend,
            events: Arc::new(TracingEventLog::new()),
            telemetry: None,
            config,
            queue: Arc::new(Mutex::new(Vec::new())),
            aggregations: Arc::new(RwLock::new(HashMap::new())),
            flush_timer: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_event_log(mut self, events: Arc<dyn EventLog>) -> Self {
        self.events = events;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<PipelineMetrics>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// 提交一批指标
    ///
    /// 队列达到上限时取消定时器并在当前调用中完成刷新，刷新失败会返回给调用方；
    /// 否则在没有挂起定时器时启动一个。
    pub async fn publish_metrics(&self, batch: MetricBatch) -> Result<()> {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_batch_published(&batch.namespace);
        }

        let queued = {
            let mut queue = self.queue.lock().await;
            queue.push(batch);
            queue.len()
        };

        if queued >= self.config.max_batch_size {
            debug!(queued, "Max batch size reached, flushing immediately");
            self.cancel_flush_timer().await;
            return self.flush().await;
        }

        self.arm_flush_timer().await;
        Ok(())
    }

    async fn arm_flush_timer(&self) {
        let mut timer = self.flush_timer.lock().await;
        if timer.is_some() {
            return;
        }

        let collector = self.clone();
        let delay = self.config.batch_interval();

        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            collector.flush_timer.lock().await.take();

            // 失败已在 flush 中记录
            if let Err(e) = collector.flush().await {
                debug!("Scheduled flush failed: {}", e);
            }
        }));
    }

    async fn cancel_flush_timer(&self) {
        if let Some(handle) = self.flush_timer.lock().await.take() {
            handle.abort();
        }
    }

    /// 取出当前队列，更新聚合并分块写入后端
    pub async fn flush(&self) -> Result<()> {
        let batches = std::mem::take(&mut *self.queue.lock().await);
        if batches.is_empty() {
            return Ok(());
        }

        // 按命名空间首次出现的顺序暂存
        let mut staged: Vec<(String, Vec<MetricDatum>)> = Vec::new();
        {
            let mut aggregations = self.aggregations.write().await;

            for batch in &batches {
                for metric in &batch.metrics {
                    let key = aggregation_key(
                        &batch.namespace,
                        &metric.name,
                        metric.dimensions.as_ref(),
                    );
                    aggregations
                        .entry(key)
                        .and_modify(|agg| agg.record(metric))
                        .or_insert_with(|| MetricAggregation::first(&batch.namespace, metric));

                    let datum = MetricDatum::from(metric);
                    match staged.iter_mut().find(|(ns, _)| *ns == batch.namespace) {
                        Some((_, data)) => data.push(datum),
                        None => staged.push((batch.namespace.clone(), vec![datum])),
                    }
                }
            }

            if let Some(telemetry) = &self.telemetry {
                telemetry.set_aggregation_keys(aggregations.len());
            }
        }

        let chunk_size = self.config.max_batch_size.max(1);
        for (namespace, data) in &staged {
            for chunk in data.chunks(chunk_size) {
                if let Err(e) = self.backend.put_metric_data(namespace, chunk).await {
                    error!(namespace = %namespace, points = chunk.len(), error = %e, "Failed to publish metrics");
                    self.events.error(
                        "Failed to publish metrics",
                        Some(json!({
                            "namespace": namespace,
                            "points": chunk.len(),
                            "error": e.to_string(),
                        })),
                    );
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.record_flush_failure();
                    }
                    return Err(MetricsError::Backend(e.to_string()));
                }

                if let Some(telemetry) = &self.telemetry {
                    telemetry.record_points_written(namespace, chunk.len());
                }
            }
        }

        if let Some(telemetry) = &self.telemetry {
            telemetry.record_flush();
        }
        debug!(batches = batches.len(), namespaces = staged.len(), "Metrics flushed");
        Ok(())
    }

    /// 查询历史平均值，返回指标名 -> 时间顺序的样本值
    pub async fn get_metrics(
        &self,
        namespace: &str,
        metric_names: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: u32,
        dimensions: Option<&Dimensions>,
    ) -> Result<HashMap<String, Vec<f64>>> {
        let queries: Vec<MetricDataQuery> = metric_names
            .iter()
            .enumerate()
            .map(|(i, name)| MetricDataQuery {
                id: format!("m{}", i),
                namespace: namespace.to_string(),
                metric_name: name.clone(),
                period,
                statistic: Statistic::Average,
                dimensions: dimensions.cloned(),
            })
            .collect();

        let mut results = match self.backend.get_metric_data(&queries, start, end).await {
            Ok(results) => results,
            Err(e) => {
                error!(namespace = %namespace, metrics = ?metric_names, error = %e, "Failed to get metrics");
                self.events.error(
                    "Failed to get metrics",
                    Some(json!({
                        "namespace": namespace,
                        "metricNames": metric_names,
                        "startTime": start.to_rfc3339(),
                        "endTime": end.to_rfc3339(),
                        "period": period,
                        "dimensions": dimensions,
                        "error": e.to_string(),
                    })),
                );
                return Err(MetricsError::Backend(e.to_string()));
            }
        };

        Ok(queries
            .into_iter()
            .filter_map(|q| results.remove(&q.id).map(|values| (q.metric_name, values)))
            .collect())
    }

    /// 读取聚合缓存
    pub async fn get_metric_aggregation(
        &self,
        namespace: &str,
        name: &str,
        dimensions: Option<&Dimensions>,
    ) -> Option<MetricAggregation> {
        let key = aggregation_key(namespace, name, dimensions);
        self.aggregations.read().await.get(&key).cloned()
    }

    /// 清空聚合缓存
    pub async fn clear_metric_aggregations(&self) {
        self.aggregations.write().await.clear();
        if let Some(telemetry) = &self.telemetry {
            telemetry.set_aggregation_keys(0);
        }
    }

    /// 取消定时器并立即刷新，用于关闭
    pub async fn flush_all_metrics(&self) -> Result<()> {
        self.cancel_flush_timer().await;
        self.flush().await
    }

    pub async fn pending_batches(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn flush_scheduled(&self) -> bool {
        self.flush_timer.lock().await.is_some()
    }
}

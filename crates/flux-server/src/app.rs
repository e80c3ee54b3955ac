use flux_config::AlertingConfig;
use flux_logging::{BufferedEventLog, EventAggregator, EventLog, LoggingConfig, TracingEventLog};
use flux_metrics::{InMemoryMetricsBackend, MetricCollector, PipelineMetrics};
use flux_notify::AlertDispatcher;
use flux_rule::MonitoringRuleEngine;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 事件日志目标名
const EVENT_TARGET: &str = "flux-alerting";

/// 管道事件日志，配置了事件文件时附带归档任务
#[derive(Clone)]
pub struct PipelineEvents {
    pub log: Arc<dyn EventLog>,
    archive: Option<Arc<BufferedEventLog>>,
}

impl PipelineEvents {
    /// 只转发到 tracing
    pub fn tracing() -> Self {
        Self {
            log: Arc::new(TracingEventLog::new()),
            archive: None,
        }
    }

    pub fn buffered(archive: Arc<BufferedEventLog>) -> Self {
        let log: Arc<dyn EventLog> = archive.clone();
        Self {
            log,
            archive: Some(archive),
        }
    }
}

/// 共享状态（供 main.rs 和测试使用）
pub struct AppState {
    pub collector: MetricCollector,
    pub engine: Arc<MonitoringRuleEngine>,
    pub telemetry: Arc<PipelineMetrics>,
    pub events: Arc<dyn EventLog>,
    event_archive: Option<Arc<BufferedEventLog>>,
}

impl AppState {
    /// 按配置装配采集器、分发器和规则引擎
    pub fn from_config(config: &AlertingConfig, events: PipelineEvents) -> anyhow::Result<Arc<Self>> {
        let PipelineEvents { log: events, archive } = events;
        let telemetry = Arc::new(PipelineMetrics::new()?);

        let collector = MetricCollector::new(
            Arc::new(InMemoryMetricsBackend::new()),
            config.collector.clone(),
        )
        .with_event_log(events.clone())
        .with_telemetry(telemetry.clone());

        let dispatcher = AlertDispatcher::from_config(&config.notifications)?.with_event_log(events.clone());
        info!(channels = ?dispatcher.channels(), "Alert dispatcher configured");

        let engine = MonitoringRuleEngine::new(Arc::new(collector.clone()), Arc::new(dispatcher))
            .with_event_log(events.clone())
            .with_telemetry(telemetry.clone())
            .with_max_concurrent_evaluations(config.scheduler.max_concurrent_evaluations);

        Ok(Arc::new(Self {
            collector,
            engine: Arc::new(engine),
            telemetry,
            events,
            event_archive: archive,
        }))
    }

    /// 停止调度、刷新剩余指标和事件
    ///
    /// 指标刷新失败时仍会关闭事件归档，错误在最后返回。
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        let stopped = if self.engine.is_scheduler_running().await {
            self.engine.stop_scheduler().await
        } else {
            Ok(())
        };

        let flushed = self.collector.flush_all_metrics().await;
        if let Err(e) = &flushed {
            error!(error = %e, "Failed to flush metrics at shutdown");
        }

        if let Some(archive) = &self.event_archive {
            let stats = archive.shutdown().await;
            info!(written = stats.written, dropped = stats.dropped, "Event log closed");
        }

        match self.telemetry.export() {
            Ok(exported) => debug!("Pipeline telemetry at shutdown:\n{}", exported),
            Err(e) => debug!("Failed to export pipeline telemetry: {}", e),
        }

        stopped?;
        flushed?;
        info!("Alerting pipeline shut down");
        Ok(())
    }
}

/// 配置了事件文件时写入文件，否则转发到 tracing
pub fn build_event_log(config: &LoggingConfig) -> PipelineEvents {
    match &config.event_log_path {
        Some(path) => {
            let aggregator = EventAggregator::new(config.buffer_size, config.flush_interval_secs)
                .with_output_path(path.clone());
            PipelineEvents::buffered(Arc::new(BufferedEventLog::new(aggregator, EVENT_TARGET)))
        }
        None => PipelineEvents::tracing(),
    }
}

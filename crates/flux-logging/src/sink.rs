//! 事件日志接收端。
//!
//! 管道各组件只依赖 [`EventLog`]，日志的收集与归档由外部系统负责。
//! 写入是即发即忘的：任何失败都不会回传给调用方。

use crate::aggregator::{ArchiveStats, EventAggregator};
use crate::structured::{EventEntry, EventLevel};
use serde_json::Value;
use std::sync::RwLock;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 事件日志接口
pub trait EventLog: Send + Sync {
    fn log_event(&self, level: EventLevel, message: &str, metadata: Option<Value>);

    fn info(&self, message: &str, metadata: Option<Value>) {
        self.log_event(EventLevel::Info, message, metadata);
    }

    fn warn(&self, message: &str, metadata: Option<Value>) {
        self.log_event(EventLevel::Warn, message, metadata);
    }

    fn error(&self, message: &str, metadata: Option<Value>) {
        self.log_event(EventLevel::Error, message, metadata);
    }
}

/// 直接转发到 tracing 的事件日志
#[derive(Debug, Clone, Default)]
pub struct TracingEventLog;

impl TracingEventLog {
    pub fn new() -> Self {
        Self
    }
}

impl EventLog for TracingEventLog {
    fn log_event(&self, level: EventLevel, message: &str, metadata: Option<Value>) {
        let metadata = metadata.map(|m| m.to_string()).unwrap_or_default();
        match level {
            EventLevel::Info => info!(target: "flux_alerting::events", metadata = %metadata, "{}", message),
            EventLevel::Warn => warn!(target: "flux_alerting::events", metadata = %metadata, "{}", message),
            EventLevel::Error => error!(target: "flux_alerting::events", metadata = %metadata, "{}", message),
        }
    }
}

/// 经由 [`EventAggregator`] 归档任务写出的事件日志
///
/// 必须在 tokio 运行时内创建：构造时会启动归档任务。
/// [`BufferedEventLog::shutdown`] 之后记录的事件会被丢弃。
pub struct BufferedEventLog {
    tx: RwLock<Option<mpsc::UnboundedSender<EventEntry>>>,
    archive: Mutex<Option<JoinHandle<ArchiveStats>>>,
    target: String,
}

impl BufferedEventLog {
    pub fn new(aggregator: EventAggregator, target: impl Into<String>) -> Self {
        let (tx, archive) = aggregator.spawn();
        Self {
            tx: RwLock::new(Some(tx)),
            archive: Mutex::new(Some(archive)),
            target: target.into(),
        }
    }

    /// 关闭发送端，等待归档任务写出队列中剩余的事件
    ///
    /// 重复调用返回空统计。
    pub async fn shutdown(&self) -> ArchiveStats {
        let sender = match self.tx.write() {
            Ok(mut tx) => tx.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        let Some(archive) = self.archive.lock().await.take() else {
            return ArchiveStats::default();
        };

        match archive.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Event archive task failed");
                ArchiveStats::default()
            }
        }
    }
}

impl EventLog for BufferedEventLog {
    fn log_event(&self, level: EventLevel, message: &str, metadata: Option<Value>) {
        let mut entry = EventEntry::new(level, message, self.target.clone());
        if let Some(metadata) = metadata {
            entry = entry.with_metadata(metadata);
        }

        let tx = match self.tx.read() {
            Ok(tx) => tx,
            Err(poisoned) => poisoned.into_inner(),
        };
        match tx.as_ref() {
            Some(tx) => {
                // 归档任务已退出时静默丢弃
                let _ = tx.send(entry);
            }
            None => debug!(event = %message, "Event log closed, dropping event"),
        }
    }
}

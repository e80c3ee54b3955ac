//! 事件归档任务。
//!
//! [`EventAggregator`] 只描述批量大小、刷新间隔和输出位置；[`EventAggregator::spawn`]
//! 启动的后台任务独占接收端，按条数或时间间隔把事件写成 JSON 行。
//! 所有发送端关闭后，任务写出剩余事件并返回归档统计。

use crate::structured::EventEntry;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

/// 归档统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    /// 已写出的事件数
    pub written: u64,

    /// 序列化或写入失败而丢弃的事件数
    pub dropped: u64,
}

/// 事件归档配置
#[derive(Debug, Clone)]
pub struct EventAggregator {
    max_batch_size: usize,
    flush_interval: Duration,
    output_path: Option<PathBuf>,
}

impl EventAggregator {
    pub fn new(max_batch_size: usize, flush_interval_secs: u64) -> Self {
        Self {
            max_batch_size: max_batch_size.max(1),
            flush_interval: Duration::from_secs(flush_interval_secs.max(1)),
            output_path: None,
        }
    }

    /// 写入文件（追加），未设置时写到标准输出
    pub fn with_output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }

    /// 启动归档任务，返回发送端和任务句柄
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn spawn(self) -> (mpsc::UnboundedSender<EventEntry>, JoinHandle<ArchiveStats>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<EventEntry>) -> ArchiveStats {
        let mut pending: Vec<String> = Vec::with_capacity(self.max_batch_size);
        let mut stats = ArchiveStats::default();

        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = rx.recv() => {
                    let Some(entry) = received else { break };
                    match entry.to_json() {
                        Ok(line) => pending.push(line),
                        Err(e) => {
                            stats.dropped += 1;
                            warn!(event = %entry.message, error = %e, "Failed to serialize event log entry");
                        }
                    }
                    if pending.len() >= self.max_batch_size {
                        self.write_batch(&mut pending, &mut stats).await;
                    }
                }
                _ = ticker.tick() => {
                    self.write_batch(&mut pending, &mut stats).await;
                }
            }
        }

        self.write_batch(&mut pending, &mut stats).await;
        debug!(written = stats.written, dropped = stats.dropped, "Event archive closed");
        stats
    }

    async fn write_batch(&self, pending: &mut Vec<String>, stats: &mut ArchiveStats) {
        if pending.is_empty() {
            return;
        }

        let lines = std::mem::take(pending);
        let count = lines.len() as u64;

        match self.write_lines(&lines).await {
            Ok(()) => stats.written += count,
            Err(e) => {
                stats.dropped += count;
                error!(count, error = %e, "Failed to write event log entries");
            }
        }
    }

    async fn write_lines(&self, lines: &[String]) -> std::io::Result<()> {
        let mut payload = lines.join("\n");
        payload.push('\n');

        match &self.output_path {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
                file.write_all(payload.as_bytes()).await?;
                file.flush().await
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(payload.as_bytes()).await?;
                stdout.flush().await
            }
        }
    }
}

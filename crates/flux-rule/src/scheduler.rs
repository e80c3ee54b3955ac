//! 周期性评估调度器。
//!
//! 启动时立即触发一次评估，之后每个间隔触发一次。每次评估都在独立任务中运行，
//! 上一次尚未结束时下一次照常开始。停止只阻止后续触发，已在运行的评估会自行完成。

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Scheduler is not running")]
    NotRunning,

    #[error("Scheduler interval must be greater than zero")]
    InvalidInterval,
}

/// 调度配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 评估间隔（毫秒）
    pub interval_ms: u64,

    /// 单轮评估的并发上限，`None` 表示不限制
    pub max_concurrent_evaluations: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            max_concurrent_evaluations: None,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

pub type EvaluationFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
pub type ErrorHandler = Arc<dyn Fn(anyhow::Error) + Send + Sync>;

type Evaluator = Arc<dyn Fn() -> EvaluationFuture + Send + Sync>;

struct RunningTask {
    shutdown_tx: watch::Sender<bool>,
    join_handle: JoinHandle<()>,
}

/// 调度器：Stopped / Running 两种状态
pub struct Scheduler {
    running: Mutex<Option<RunningTask>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            running: Mutex::new(None),
        }
    }

    pub async fn start<F, Fut>(
        &self,
        evaluator: F,
        interval: Duration,
        on_error: Option<ErrorHandler>,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }

        let evaluator: Evaluator = Arc::new(move || Box::pin(evaluator()) as EvaluationFuture);

        spawn_evaluation(&evaluator, &on_error);

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let join_handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        spawn_evaluation(&evaluator, &on_error);
                    }
                }
            }
            debug!("Scheduler loop exited");
        });

        *running = Some(RunningTask {
            shutdown_tx,
            join_handle,
        });

        info!(interval_ms = interval.as_millis() as u64, "Scheduler started");
        Ok(())
    }

    /// 停止后续触发；返回时调度循环已退出
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let task = self
            .running
            .lock()
            .await
            .take()
            .ok_or(SchedulerError::NotRunning)?;

        let _ = task.shutdown_tx.send(true);
        let _ = task.join_handle.await;

        info!("Scheduler stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_evaluation(evaluator: &Evaluator, on_error: &Option<ErrorHandler>) {
    let future = evaluator();
    let on_error = on_error.clone();
    tokio::spawn(async move {
        if let Err(e) = future.await {
            match on_error {
                Some(handler) => handler(e),
                None => error!(error = %e, "Scheduled evaluation failed"),
            }
        }
    });
}

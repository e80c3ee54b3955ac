use crate::collaborators::{AlertSink, MetricHistory};
use crate::error::{Result, RuleError};
use crate::model::{MonitoringRule, MonitoringThreshold, NewMonitoringRule, RuleUpdate};
use crate::scheduler::{ErrorHandler, Scheduler};
use crate::storage::RuleStorage;
use chrono::{Duration as ChronoDuration, Utc};
use flux_logging::{EventLog, TracingEventLog};
use flux_metrics::PipelineMetrics;
use flux_notify::Alert;
use futures::future::{join_all, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 监控规则引擎
///
/// 持有内存中的阈值规则，按规则拉取指标历史，越过阈值时生成告警并交给分发器。
pub struct MonitoringRuleEngine {
    /// 规则存储
    storage: RuleStorage,

    history: Arc<dyn MetricHistory>,
    alerts: Arc<dyn AlertSink>,
    events: Arc<dyn EventLog>,
    telemetry: Option<Arc<PipelineMetrics>>,

    /// 单轮评估并发上限
    max_concurrent_evaluations: Option<usize>,

    scheduler: Scheduler,
}

impl MonitoringRuleEngine {
    pub fn new(history: Arc<dyn MetricHistory>, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            storage: RuleStorage::new(),
            history,
            alerts,
            events: Arc::new(TracingEventLog::new()),
            telemetry: None,
            max_concurrent_evaluations: None,
            scheduler: Scheduler::new(),
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

    pub fn with_max_concurrent_evaluations(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent_evaluations = limit;
        self
    }

    /// 添加规则
    pub async fn add_rule(&self, rule: NewMonitoringRule) -> Result<MonitoringRule> {
        let rule = MonitoringRule::from_new(rule);
        rule.validate().map_err(RuleError::InvalidRule)?;

        self.storage.save(rule.clone()).await;
        info!(rule_id = %rule.id, rule_name = %rule.name, "Rule added");
        Ok(rule)
    }

    /// 删除规则，ID 不存在时不做任何事
    pub async fn remove_rule(&self, rule_id: &str) {
        if self.storage.delete(rule_id).await {
            info!(rule_id = %rule_id, "Rule removed");
        }
    }

    /// 合并部分更新
    pub async fn update_rule(&self, rule_id: &str, update: RuleUpdate) -> Result<MonitoringRule> {
        let updated = self
            .storage
            .modify(rule_id, |rule| {
                rule.apply(update);
                rule.validate()
            })
            .await
            .ok_or_else(|| RuleError::NotFound(rule_id.to_string()))?
            .map_err(RuleError::InvalidRule)?;

        info!(rule_id = %rule_id, "Rule updated");
        Ok(updated)
    }

    pub async fn get_rule(&self, rule_id: &str) -> Option<MonitoringRule> {
        self.storage.get(rule_id).await
    }

    /// 当前规则快照，按创建顺序
    pub async fn get_rules(&self) -> Vec<MonitoringRule> {
        self.storage.list().await
    }

    /// 评估单条规则，触发时返回已分发的告警
    pub async fn evaluate_rule(&self, rule: &MonitoringRule) -> Result<Option<Alert>> {
        if !rule.enabled {
            debug!(rule_id = %rule.id, "Rule disabled, skipping evaluation");
            self.record_evaluation("skipped");
            return Ok(None);
        }

        match self.evaluate_enabled_rule(rule).await {
            Ok(alert) => {
                self.record_evaluation(if alert.is_some() { "triggered" } else { "ok" });
                Ok(alert)
            }
            Err(e) => {
                error!(rule_id = %rule.id, rule_name = %rule.name, error = %e, "Failed to evaluate rule");
                self.events.error(
                    "Failed to evaluate rule",
                    Some(json!({
                        "ruleId": rule.id,
                        "ruleName": rule.name,
                        "error": e.to_string(),
                    })),
                );
                self.record_evaluation("error");
                Err(RuleError::Evaluation {
                    rule_id: rule.id.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    async fn evaluate_enabled_rule(&self, rule: &MonitoringRule) -> anyhow::Result<Option<Alert>> {
        let end = Utc::now();
        let start = i64::try_from(rule.lookback_seconds())
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .and_then(|lookback| end.checked_sub_signed(lookback))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "lookback window of {} x {}s is out of range",
                    rule.evaluation_periods,
                    rule.period
                )
            })?;

        let samples = self
            .history
            .metric_history(
                &rule.namespace,
                &rule.metric_name,
                start,
                end,
                rule.period,
                rule.dimensions.as_ref(),
            )
            .await?;

        let Some(&current) = samples.last() else {
            warn!(rule_id = %rule.id, metric = %rule.metric_name, "No data points found for rule");
            self.events.warn(
                "No data points found for rule",
                Some(json!({
                    "ruleId": rule.id,
                    "ruleName": rule.name,
                    "namespace": rule.namespace,
                    "metricName": rule.metric_name,
                })),
            );
            return Ok(None);
        };

        let Some(threshold) = select_threshold(&rule.thresholds, current) else {
            return Ok(None);
        };

        let alert = build_alert(rule, threshold, current);
        self.alerts.dispatch(&alert).await?;

        if let Some(telemetry) = &self.telemetry {
            telemetry.record_alert(alert.severity.as_str());
        }
        info!(
            rule_id = %rule.id,
            severity = %alert.severity,
            value = current,
            "Monitoring alert triggered"
        );
        Ok(Some(alert))
    }

    /// 并发评估全部规则，单条失败不影响其他规则
    pub async fn evaluate_all_rules(&self) -> Result<()> {
        let rules = self.get_rules().await;
        let evaluations: Vec<BoxFuture<'_, Result<Option<Alert>>>> =
            rules.iter().map(|rule| self.evaluate_rule(rule).boxed()).collect();

        let results: Vec<Result<Option<Alert>>> = match self.max_concurrent_evaluations {
            Some(limit) => {
                stream::iter(evaluations)
                    .buffer_unordered(limit.max(1))
                    .collect()
                    .await
            }
            None => join_all(evaluations).await,
        };

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|r| r.err())
            .map(|e| e.to_string())
            .collect();

        if failures.is_empty() {
            debug!(rules = rules.len(), "All rules evaluated");
            return Ok(());
        }

        error!(failed = failures.len(), total = rules.len(), "Rule evaluation round had failures");
        self.events.error(
            "Rule evaluation round had failures",
            Some(json!({
                "failed": failures.len(),
                "total": rules.len(),
                "errors": failures,
            })),
        );
        Err(RuleError::Aggregate { failures })
    }

    /// 启动周期评估
    pub async fn start_scheduler(
        self: &Arc<Self>,
        interval: Duration,
        on_error: Option<ErrorHandler>,
    ) -> Result<()> {
        let engine = Arc::downgrade(self);
        self.scheduler
            .start(
                move || {
                    let engine = engine.clone();
                    async move {
                        match engine.upgrade() {
                            Some(engine) => engine.evaluate_all_rules().await.map_err(anyhow::Error::from),
                            None => Ok(()),
                        }
                    }
                },
                interval,
                on_error,
            )
            .await?;
        Ok(())
    }

    pub async fn stop_scheduler(&self) -> Result<()> {
        self.scheduler.stop().await?;
        Ok(())
    }

    pub async fn is_scheduler_running(&self) -> bool {
        self.scheduler.is_running().await
    }

    fn record_evaluation(&self, outcome: &str) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_rule_evaluation(outcome);
        }
    }
}

/// 命中的阈值中取级别最高的一个，同级取第一个
fn select_threshold(thresholds: &[MonitoringThreshold], value: f64) -> Option<&MonitoringThreshold> {
    thresholds
        .iter()
        .filter(|t| t.is_breached(value))
        .fold(None, |best: Option<&MonitoringThreshold>, t| match best {
            Some(b) if b.severity.rank() >= t.severity.rank() => Some(b),
            _ => Some(t),
        })
}

fn build_alert(rule: &MonitoringRule, threshold: &MonitoringThreshold, value: f64) -> Alert {
    let mut metadata = Map::new();
    metadata.insert("ruleId".to_string(), json!(rule.id));
    metadata.insert("ruleName".to_string(), json!(rule.name));
    metadata.insert("metricName".to_string(), json!(rule.metric_name));
    metadata.insert("namespace".to_string(), json!(rule.namespace));
    metadata.insert("dimensions".to_string(), json!(rule.dimensions));
    metadata.insert("currentValue".to_string(), json!(value));
    metadata.insert(
        "threshold".to_string(),
        serde_json::to_value(threshold).unwrap_or(Value::Null),
    );

    Alert::new(
        threshold.severity,
        format!("Monitoring Alert: {}", rule.name),
        format!(
            "Metric {} is {} (threshold: {} {})",
            rule.metric_name, value, threshold.operator, threshold.value
        ),
    )
    .with_metadata(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThresholdOperator;
    use async_trait::async_trait;
    use chrono::DateTime;
    use flux_metrics::Dimensions;
    use flux_notify::AlertSeverity;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeHistory {
        samples: HashMap<String, Vec<f64>>,
        failing: Vec<String>,
        calls: AtomicUsize,
        windows: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>, u32)>>,
    }

    impl FakeHistory {
        fn with_samples(metric: &str, samples: Vec<f64>) -> Self {
            let mut history = Self::default();
            history.samples.insert(metric.to_string(), samples);
            history
        }
    }

    #[async_trait]
    impl MetricHistory for FakeHistory {
        async fn metric_history(
            &self,
            _namespace: &str,
            metric_name: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
            period: u32,
            _dimensions: Option<&Dimensions>,
        ) -> anyhow::Result<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.windows.lock().unwrap().push((start, end, period));
            if self.failing.iter().any(|m| m == metric_name) {
                anyhow::bail!("backend unavailable for {}", metric_name);
            }
            Ok(self.samples.get(metric_name).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<Alert>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn dispatch(&self, alert: &Alert) -> anyhow::Result<()> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    fn latency_rule(metric: &str) -> NewMonitoringRule {
        NewMonitoringRule {
            name: format!("{}-rule", metric),
            description: String::new(),
            namespace: "Flux/Api".to_string(),
            metric_name: metric.to_string(),
            dimensions: None,
            period: 60,
            evaluation_periods: 3,
            enabled: true,
            thresholds: vec![
                MonitoringThreshold::new(ThresholdOperator::Gt, 100.0, AlertSeverity::Warning),
                MonitoringThreshold::new(ThresholdOperator::Gt, 200.0, AlertSeverity::Error),
            ],
        }
    }

    fn engine(history: Arc<FakeHistory>, sink: Arc<RecordingSink>) -> MonitoringRuleEngine {
        MonitoringRuleEngine::new(history, sink)
    }

    #[tokio::test]
    async fn test_rule_crud() {
        let engine = engine(Arc::new(FakeHistory::default()), Arc::new(RecordingSink::default()));

        let a = engine.add_rule(latency_rule("Latency")).await.unwrap();
        let b = engine.add_rule(latency_rule("Errors")).await.unwrap();
        assert_ne!(a.id, b.id);

        let mut snapshot = engine.get_rules().await;
        assert_eq!(snapshot.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec![a.id.as_str(), b.id.as_str()]);
        snapshot.clear();
        assert_eq!(engine.get_rules().await.len(), 2);

        let updated = engine
            .update_rule(&a.id, RuleUpdate { enabled: Some(false), ..Default::default() })
            .await
            .unwrap();
        assert!(!updated.enabled);
        assert_eq!(updated.metric_name, "Latency");
        assert_eq!(engine.get_rule(&a.id).await.unwrap(), updated);

        engine.remove_rule(&a.id).await;
        engine.remove_rule("missing").await;
        assert_eq!(engine.get_rules().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_rule_fails() {
        let engine = engine(Arc::new(FakeHistory::default()), Arc::new(RecordingSink::default()));
        let err = engine.update_rule("nope", RuleUpdate::default()).await.unwrap_err();
        assert!(matches!(err, RuleError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_invalid_rules_rejected() {
        let engine = engine(Arc::new(FakeHistory::default()), Arc::new(RecordingSink::default()));

        let mut rule = latency_rule("Latency");
        rule.period = 0;
        assert!(matches!(engine.add_rule(rule).await, Err(RuleError::InvalidRule(_))));

        let stored = engine.add_rule(latency_rule("Latency")).await.unwrap();
        let err = engine
            .update_rule(&stored.id, RuleUpdate { evaluation_periods: Some(0), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidRule(_)));
        // 校验失败不写回
        assert_eq!(engine.get_rule(&stored.id).await.unwrap().evaluation_periods, 3);
    }

    #[tokio::test]
    async fn test_disabled_rule_never_queries() {
        let history = Arc::new(FakeHistory::with_samples("Latency", vec![500.0]));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(history.clone(), sink.clone());

        let mut rule = latency_rule("Latency");
        rule.enabled = false;
        let rule = engine.add_rule(rule).await.unwrap();

        assert!(engine.evaluate_rule(&rule).await.unwrap().is_none());
        assert_eq!(history.calls.load(Ordering::SeqCst), 0);
        assert!(sink.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_sample_selects_highest_severity() {
        let history = Arc::new(FakeHistory::with_samples("Latency", vec![50.0, 150.0, 250.0]));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(history.clone(), sink.clone());
        let rule = engine.add_rule(latency_rule("Latency")).await.unwrap();

        let alert = engine.evaluate_rule(&rule).await.unwrap().unwrap();
        assert_eq!(alert.severity, AlertSeverity::Error);
        assert_eq!(alert.title, "Monitoring Alert: Latency-rule");
        assert!(alert.message.contains("Latency"));
        assert!(alert.message.contains("250"));
        assert!(alert.message.contains("gt 200"));

        let metadata = alert.metadata.as_ref().unwrap();
        assert_eq!(metadata["ruleId"], json!(rule.id));
        assert_eq!(metadata["currentValue"], json!(250.0));
        assert_eq!(metadata["threshold"]["severity"], json!("ERROR"));
        assert_eq!(metadata["namespace"], json!("Flux/Api"));

        let dispatched = sink.alerts.lock().unwrap();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].id, alert.id);

        let (start, end, period) = history.windows.lock().unwrap()[0];
        assert_eq!((end - start).num_seconds(), 180);
        assert_eq!(period, 60);
    }

    #[tokio::test]
    async fn test_no_samples_no_alert() {
        let history = Arc::new(FakeHistory::default());
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(history.clone(), sink.clone());
        let rule = engine.add_rule(latency_rule("Latency")).await.unwrap();

        assert!(engine.evaluate_rule(&rule).await.unwrap().is_none());
        assert_eq!(history.calls.load(Ordering::SeqCst), 1);
        assert!(sink.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_threshold_breached() {
        let history = Arc::new(FakeHistory::with_samples("Latency", vec![500.0, 20.0]));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(history, sink.clone());
        let rule = engine.add_rule(latency_rule("Latency")).await.unwrap();

        assert!(engine.evaluate_rule(&rule).await.unwrap().is_none());
        assert!(sink.alerts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_equal_severity_keeps_first_threshold() {
        let thresholds = vec![
            MonitoringThreshold::new(ThresholdOperator::Gt, 10.0, AlertSeverity::Warning),
            MonitoringThreshold::new(ThresholdOperator::Gt, 20.0, AlertSeverity::Critical),
            MonitoringThreshold::new(ThresholdOperator::Gt, 30.0, AlertSeverity::Critical),
        ];
        let chosen = select_threshold(&thresholds, 50.0).unwrap();
        assert_eq!(chosen.value, 20.0);
        assert!(select_threshold(&thresholds, 5.0).is_none());
    }

    #[tokio::test]
    async fn test_eq_threshold_misses_float_noise() {
        // eq 没有容差：0.1 + 0.2 不等于 0.3
        let history = Arc::new(FakeHistory::with_samples("Ratio", vec![0.1 + 0.2]));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(history, sink.clone());

        let mut rule = latency_rule("Ratio");
        rule.thresholds = vec![MonitoringThreshold::new(ThresholdOperator::Eq, 0.3, AlertSeverity::Info)];
        let rule = engine.add_rule(rule).await.unwrap();

        assert!(engine.evaluate_rule(&rule).await.unwrap().is_none());
        assert!(sink.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_is_returned() {
        let mut history = FakeHistory::default();
        history.failing.push("Latency".to_string());
        let engine = engine(Arc::new(history), Arc::new(RecordingSink::default()));
        let rule = engine.add_rule(latency_rule("Latency")).await.unwrap();

        let err = engine.evaluate_rule(&rule).await.unwrap_err();
        assert!(matches!(&err, RuleError::Evaluation { rule_id, .. } if *rule_id == rule.id));
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_evaluate_all_collects_every_failure() {
        let mut history = FakeHistory::with_samples("Latency", vec![300.0]);
        history.failing = vec!["Errors".to_string(), "Saturation".to_string()];
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(Arc::new(history), sink.clone());

        engine.add_rule(latency_rule("Latency")).await.unwrap();
        engine.add_rule(latency_rule("Errors")).await.unwrap();
        engine.add_rule(latency_rule("Saturation")).await.unwrap();

        let err = engine.evaluate_all_rules().await.unwrap_err();
        match err {
            RuleError::Aggregate { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures.iter().any(|f| f.contains("Errors")));
                assert!(failures.iter().any(|f| f.contains("Saturation")));
            }
            other => panic!("unexpected error: {other}"),
        }
        // 失败的规则不影响成功的规则
        assert_eq!(sink.alerts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_evaluate_all_with_concurrency_cap() {
        let history = Arc::new(FakeHistory::with_samples("Latency", vec![150.0]));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(history.clone(), sink.clone()).with_max_concurrent_evaluations(Some(2));

        for _ in 0..5 {
            engine.add_rule(latency_rule("Latency")).await.unwrap();
        }

        engine.evaluate_all_rules().await.unwrap();
        assert_eq!(history.calls.load(Ordering::SeqCst), 5);
        assert_eq!(sink.alerts.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_out_of_range_lookback_is_an_evaluation_error() {
        let history = Arc::new(FakeHistory::with_samples("Latency", vec![300.0]));
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(history.clone(), sink.clone());

        let mut ancient = latency_rule("Latency");
        ancient.period = 86_400;
        ancient.evaluation_periods = 100_000_000;
        let ancient = engine.add_rule(ancient).await.unwrap();

        let mut widest = latency_rule("Latency");
        widest.period = u32::MAX;
        widest.evaluation_periods = u32::MAX;
        let widest = engine.add_rule(widest).await.unwrap();

        for rule in [&ancient, &widest] {
            let err = engine.evaluate_rule(rule).await.unwrap_err();
            assert!(matches!(&err, RuleError::Evaluation { rule_id, .. } if *rule_id == rule.id));
            assert!(err.to_string().contains("out of range"));
        }
        assert_eq!(history.calls.load(Ordering::SeqCst), 0);

        // 其余规则照常评估
        engine.add_rule(latency_rule("Latency")).await.unwrap();
        match engine.evaluate_all_rules().await.unwrap_err() {
            RuleError::Aggregate { failures } => assert_eq!(failures.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sink.alerts.lock().unwrap().len(), 1);
    }

    /// 每次查询都在屏障处等待，只有全部规则同时在途时才能返回
    struct GatedHistory {
        gate: tokio::sync::Barrier,
        started: AtomicUsize,
    }

    #[async_trait]
    impl MetricHistory for GatedHistory {
        async fn metric_history(
            &self,
            _namespace: &str,
            _metric_name: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _period: u32,
            _dimensions: Option<&Dimensions>,
        ) -> anyhow::Result<Vec<f64>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.gate.wait().await;
            Ok(vec![150.0])
        }
    }

    #[tokio::test]
    async fn test_evaluate_all_starts_every_rule_before_any_finishes() {
        let history = Arc::new(GatedHistory {
            gate: tokio::sync::Barrier::new(4),
            started: AtomicUsize::new(0),
        });
        let sink = Arc::new(RecordingSink::default());
        let engine = MonitoringRuleEngine::new(history.clone(), sink.clone());

        for metric in ["Latency", "Errors", "Saturation", "Traffic"] {
            engine.add_rule(latency_rule(metric)).await.unwrap();
        }

        tokio::time::timeout(Duration::from_secs(5), engine.evaluate_all_rules())
            .await
            .expect("evaluations did not run concurrently")
            .unwrap();

        assert_eq!(history.started.load(Ordering::SeqCst), 4);
        assert_eq!(sink.alerts.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_telemetry_counts_outcomes() {
        let history = Arc::new(FakeHistory::with_samples("Latency", vec![250.0]));
        let telemetry = Arc::new(PipelineMetrics::new().unwrap());
        let engine = engine(history, Arc::new(RecordingSink::default())).with_telemetry(telemetry.clone());

        engine.add_rule(latency_rule("Latency")).await.unwrap();
        engine.add_rule(latency_rule("Quiet")).await.unwrap();
        engine.evaluate_all_rules().await.unwrap();

        let exported = telemetry.export().unwrap();
        assert!(exported.contains("alerting_rule_evaluations_total{outcome=\"triggered\"} 1"));
        assert!(exported.contains("alerting_rule_evaluations_total{outcome=\"ok\"} 1"));
        assert!(exported.contains("alerting_alerts_triggered_total{severity=\"ERROR\"} 1"));
    }

    #[tokio::test]
    async fn test_scheduler_lifecycle() {
        let engine = Arc::new(engine(Arc::new(FakeHistory::default()), Arc::new(RecordingSink::default())));

        assert!(!engine.is_scheduler_running().await);
        engine.start_scheduler(Duration::from_secs(60), None).await.unwrap();
        assert!(engine.is_scheduler_running().await);

        let err = engine.start_scheduler(Duration::from_secs(60), None).await.unwrap_err();
        assert!(matches!(err, RuleError::Scheduler(crate::scheduler::SchedulerError::AlreadyRunning)));

        engine.stop_scheduler().await.unwrap();
        let err = engine.stop_scheduler().await.unwrap_err();
        assert!(matches!(err, RuleError::Scheduler(crate::scheduler::SchedulerError::NotRunning)));
    }
}

use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

/// 告警管道自身的运行指标
pub struct PipelineMetrics {
    // 采集指标
    batches_published_total: CounterVec,
    points_written_total: CounterVec,
    flushes_total: Counter,
    flush_failures_total: Counter,
    aggregation_keys: Gauge,

    // 规则指标
    rule_evaluations_total: CounterVec,
    alerts_triggered_total: CounterVec,

    registry: Registry,
}

impl PipelineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let batches_published_total = CounterVec::new(
            Opts::new(
                "alerting_metric_batches_published_total",
                "Total number of metric batches accepted by the collector",
            ),
            &["namespace"],
        )?;
        registry.register(Box::new(batches_published_total.clone()))?;

        let points_written_total = CounterVec::new(
            Opts::new(
                "alerting_metric_points_written_total",
                "Total number of metric points written to the backend",
            ),
            &["namespace"],
        )?;
        registry.register(Box::new(points_written_total.clone()))?;

        let flushes_total = Counter::new("alerting_flushes_total", "Total number of completed flushes")?;
        registry.register(Box::new(flushes_total.clone()))?;

        let flush_failures_total =
            Counter::new("alerting_flush_failures_total", "Total number of failed flushes")?;
        registry.register(Box::new(flush_failures_total.clone()))?;

        let aggregation_keys = Gauge::new(
            "alerting_aggregation_keys",
            "Number of distinct keys in the aggregation cache",
        )?;
        registry.register(Box::new(aggregation_keys.clone()))?;

        let rule_evaluations_total = CounterVec::new(
            Opts::new(
                "alerting_rule_evaluations_total",
                "Total number of rule evaluations by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(rule_evaluations_total.clone()))?;

        let alerts_triggered_total = CounterVec::new(
            Opts::new(
                "alerting_alerts_triggered_total",
                "Total number of alerts triggered by severity",
            ),
            &["severity"],
        )?;
        registry.register(Box::new(alerts_triggered_total.clone()))?;

        Ok(Self {
            batches_published_total,
            points_written_total,
            flushes_total,
            flush_failures_total,
            aggregation_keys,
            rule_evaluations_total,
            alerts_triggered_total,
            registry,
        })
    }

    pub fn record_batch_published(&self, namespace: &str) {
        self.batches_published_total
            .with_label_values(&[namespace])
            .inc();
    }

    pub fn record_points_written(&self, namespace: &str, count: usize) {
        self.points_written_total
            .with_label_values(&[namespace])
            .inc_by(count as f64);
    }

    pub fn record_flush(&self) {
        self.flushes_total.inc();
    }

    pub fn record_flush_failure(&self) {
        self.flush_failures_total.inc();
    }

    pub fn set_aggregation_keys(&self, count: usize) {
        self.aggregation_keys.set(count as f64);
    }

    pub fn record_rule_evaluation(&self, outcome: &str) {
        self.rule_evaluations_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn record_alert(&self, severity: &str) {
        self.alerts_triggered_total
            .with_label_values(&[severity])
            .inc();
    }

    // 导出指标
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

//! 端到端：采集 -> 刷新 -> 规则评估 -> 告警分发

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use flux_metrics::{CollectorConfig, InMemoryMetricsBackend, Metric, MetricBatch, MetricCollector, MetricUnit};
use flux_notify::{
    AlertDispatcher, AlertSeverity, ChatWebhookNotifier, EmailMessage, EmailNotifier, EmailSender,
    PublishRequest, TopicNotifier, TopicPublisher, WebhookPayload, WebhookTransport,
};
use flux_rule::{MonitoringRuleEngine, MonitoringThreshold, NewMonitoringRule, ThresholdOperator};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Outbox {
    webhooks: Mutex<Vec<WebhookPayload>>,
    emails: Mutex<Vec<EmailMessage>>,
    topics: Mutex<Vec<PublishRequest>>,
}

struct OutboxWebhook(Arc<Outbox>);
struct OutboxEmail(Arc<Outbox>);
struct OutboxTopic(Arc<Outbox>);

#[async_trait]
impl WebhookTransport for OutboxWebhook {
    async fn post(&self, _url: &str, payload: &WebhookPayload) -> anyhow::Result<()> {
        self.0.webhooks.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[async_trait]
impl EmailSender for OutboxEmail {
    async fn send_email(&self, email: &EmailMessage) -> anyhow::Result<()> {
        self.0.emails.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[async_trait]
impl TopicPublisher for OutboxTopic {
    async fn publish(&self, request: &PublishRequest) -> anyhow::Result<()> {
        self.0.topics.lock().unwrap().push(request.clone());
        Ok(())
    }
}

struct Pipeline {
    collector: MetricCollector,
    engine: Arc<MonitoringRuleEngine>,
    outbox: Arc<Outbox>,
}

fn pipeline() -> Pipeline {
    let backend = Arc::new(InMemoryMetricsBackend::new());
    let collector = MetricCollector::new(backend, CollectorConfig::default());

    let outbox = Arc::new(Outbox::default());
    let dispatcher = AlertDispatcher::new()
        .with_notifier(Box::new(ChatWebhookNotifier::new(
            Some("https://chat.example.com/hook".to_string()),
            Arc::new(OutboxWebhook(outbox.clone())),
        )))
        .with_notifier(Box::new(EmailNotifier::new(
            Arc::new(OutboxEmail(outbox.clone())),
            "alerts@example.com".to_string(),
            vec!["oncall@example.com".to_string()],
        )))
        .with_notifier(Box::new(TopicNotifier::new(
            Arc::new(OutboxTopic(outbox.clone())),
            "arn:aws:sns:eu-west-1:123:critical".to_string(),
        )));

    let engine = Arc::new(MonitoringRuleEngine::new(
        Arc::new(collector.clone()),
        Arc::new(dispatcher),
    ));

    Pipeline {
        collector,
        engine,
        outbox,
    }
}

fn latency_rule(thresholds: Vec<MonitoringThreshold>) -> NewMonitoringRule {
    NewMonitoringRule {
        name: "api-latency".to_string(),
        description: "API latency per minute".to_string(),
        namespace: "Flux/Api".to_string(),
        metric_name: "Latency".to_string(),
        dimensions: None,
        period: 60,
        evaluation_periods: 5,
        enabled: true,
        thresholds,
    }
}

async fn publish_latency(collector: &MetricCollector, samples: &[(i64, f64)]) {
    let now = Utc::now();
    let metrics = samples
        .iter()
        .map(|(age_secs, value)| {
            Metric::new("Latency", *value, MetricUnit::Milliseconds)
                .with_timestamp(now - ChronoDuration::seconds(*age_secs))
        })
        .collect();
    collector
        .publish_metrics(MetricBatch::new("Flux/Api", metrics))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_published_metrics_trigger_error_alert() {
    let p = pipeline();
    publish_latency(&p.collector, &[(150, 50.0), (90, 150.0), (30, 250.0)]).await;
    p.collector.flush_all_metrics().await.unwrap();

    let aggregation = p
        .collector
        .get_metric_aggregation("Flux/Api", "Latency", None)
        .await
        .unwrap();
    assert_eq!(aggregation.count, 3);
    assert_eq!(aggregation.sum, 450.0);

    p.engine
        .add_rule(latency_rule(vec![
            MonitoringThreshold::new(ThresholdOperator::Gt, 100.0, AlertSeverity::Warning),
            MonitoringThreshold::new(ThresholdOperator::Gt, 200.0, AlertSeverity::Error),
        ]))
        .await
        .unwrap();

    p.engine.evaluate_all_rules().await.unwrap();

    let emails = p.outbox.emails.lock().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].subject, "[ERROR] Monitoring Alert: api-latency");
    assert!(emails[0].body_text.contains("Severity: ERROR"));

    let webhooks = p.outbox.webhooks.lock().unwrap();
    assert_eq!(webhooks.len(), 1);
    assert_eq!(webhooks[0].attachments[0].color, "#008080");

    assert!(p.outbox.topics.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_critical_alert_reaches_topic() {
    let p = pipeline();
    publish_latency(&p.collector, &[(30, 900.0)]).await;
    p.collector.flush_all_metrics().await.unwrap();

    p.engine
        .add_rule(latency_rule(vec![MonitoringThreshold::new(
            ThresholdOperator::Gte,
            500.0,
            AlertSeverity::Critical,
        )]))
        .await
        .unwrap();

    p.engine.evaluate_all_rules().await.unwrap();

    let topics = p.outbox.topics.lock().unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].subject, "[CRITICAL] Monitoring Alert: api-latency");
    assert_eq!(p.outbox.emails.lock().unwrap().len(), 1);
    assert_eq!(p.outbox.webhooks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unflushed_metrics_are_not_visible() {
    let p = pipeline();
    publish_latency(&p.collector, &[(30, 900.0)]).await;
    assert_eq!(p.collector.pending_batches().await, 1);

    p.engine
        .add_rule(latency_rule(vec![MonitoringThreshold::new(
            ThresholdOperator::Gt,
            100.0,
            AlertSeverity::Warning,
        )]))
        .await
        .unwrap();

    p.engine.evaluate_all_rules().await.unwrap();
    assert!(p.outbox.emails.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_scheduler_drives_evaluation() {
    let p = pipeline();
    publish_latency(&p.collector, &[(30, 150.0)]).await;
    p.collector.flush_all_metrics().await.unwrap();

    p.engine
        .add_rule(latency_rule(vec![MonitoringThreshold::new(
            ThresholdOperator::Gt,
            100.0,
            AlertSeverity::Warning,
        )]))
        .await
        .unwrap();

    p.engine.start_scheduler(Duration::from_secs(3600), None).await.unwrap();

    // 启动时立即评估一次
    for _ in 0..50 {
        if !p.outbox.emails.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    p.engine.stop_scheduler().await.unwrap();
    assert!(!p.engine.is_scheduler_running().await);

    let emails = p.outbox.emails.lock().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].subject, "[WARNING] Monitoring Alert: api-latency");
}

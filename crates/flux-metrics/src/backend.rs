use crate::model::{dimension_key, MetricDataQuery, MetricDatum};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// 指标后端接口
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// 写入一批数据点
    async fn put_metric_data(&self, namespace: &str, data: &[MetricDatum]) -> anyhow::Result<()>;

    /// 按查询 ID 返回时间顺序的统计值；无数据的查询可以不出现在结果中
    async fn get_metric_data(
        &self,
        queries: &[MetricDataQuery],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<HashMap<String, Vec<f64>>>;
}

#[derive(Debug, Clone)]
struct StoredPoint {
    namespace: String,
    dimension_key: String,
    datum: MetricDatum,
}

/// 内存指标后端
///
/// 查询时按 `period` 秒分桶（以 `start` 对齐），对每个非空桶计算统计值。
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricsBackend {
    points: Arc<RwLock<Vec<StoredPoint>>>,
}

impl InMemoryMetricsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.points.write().await.clear();
    }
}

#[async_trait]
impl MetricsBackend for InMemoryMetricsBackend {
    async fn put_metric_data(&self, namespace: &str, data: &[MetricDatum]) -> anyhow::Result<()> {
        let mut points = self.points.write().await;
        points.extend(data.iter().map(|datum| StoredPoint {
            namespace: namespace.to_string(),
            dimension_key: dimension_key(datum.dimensions.as_ref()),
            datum: datum.clone(),
        }));

        debug!(namespace = %namespace, count = data.len(), "Metric data stored in memory");
        Ok(())
    }

    async fn get_metric_data(
        &self,
        queries: &[MetricDataQuery],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<HashMap<String, Vec<f64>>> {
        if end < start {
            anyhow::bail!("query end {} is before start {}", end, start);
        }

        let points = self.points.read().await;
        let mut results = HashMap::new();

        for query in queries {
            if query.period == 0 {
                anyhow::bail!("query {} has a zero period", query.id);
            }

            let key = dimension_key(query.dimensions.as_ref());
            let period = i64::from(query.period);
            let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();

            for point in points.iter().filter(|p| {
                p.namespace == query.namespace
                    && p.datum.metric_name == query.metric_name
                    && p.dimension_key == key
                    && p.datum.timestamp >= start
                    && p.datum.timestamp <= end
            }) {
                let offset = (point.datum.timestamp - start).num_seconds();
                buckets
                    .entry(offset / period)
                    .or_default()
                    .push(point.datum.value);
            }

            let values: Vec<f64> = buckets
                .values()
                .filter_map(|bucket| query.statistic.apply(bucket))
                .collect();

            if !values.is_empty() {
                results.insert(query.id.clone(), values);
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimensions, MetricUnit, Statistic};
    use chrono::Duration;

    fn datum(name: &str, value: f64, timestamp: DateTime<Utc>) -> MetricDatum {
        MetricDatum {
            metric_name: name.to_string(),
            value,
            unit: MetricUnit::Percent,
            timestamp,
            dimensions: None,
        }
    }

    fn query(id: &str, name: &str, period: u32) -> MetricDataQuery {
        MetricDataQuery {
            id: id.to_string(),
            namespace: "App".to_string(),
            metric_name: name.to_string(),
            period,
            statistic: Statistic::Average,
            dimensions: None,
        }
    }

    #[tokio::test]
    async fn test_average_per_period_bucket() {
        let backend = InMemoryMetricsBackend::new();
        let start = Utc::now() - Duration::seconds(180);

        backend
            .put_metric_data(
                "App",
                &[
                    datum("Cpu", 40.0, start + Duration::seconds(10)),
                    datum("Cpu", 60.0, start + Duration::seconds(20)),
                    datum("Cpu", 150.0, start + Duration::seconds(70)),
                    datum("Cpu", 250.0, start + Duration::seconds(130)),
                ],
            )
            .await
            .unwrap();

        let results = backend
            .get_metric_data(&[query("m0", "Cpu", 60)], start, start + Duration::seconds(180))
            .await
            .unwrap();

        assert_eq!(results.get("m0"), Some(&vec![50.0, 150.0, 250.0]));
    }

    #[tokio::test]
    async fn test_missing_metric_is_absent() {
        let backend = InMemoryMetricsBackend::new();
        let now = Utc::now();
        backend
            .put_metric_data("App", &[datum("Cpu", 1.0, now)])
            .await
            .unwrap();

        let results = backend
            .get_metric_data(
                &[query("m0", "Cpu", 60), query("m1", "Memory", 60)],
                now - Duration::seconds(60),
                now,
            )
            .await
            .unwrap();

        assert!(results.contains_key("m0"));
        assert!(!results.contains_key("m1"));
    }

    #[tokio::test]
    async fn test_dimensions_and_namespace_filter() {
        let backend = InMemoryMetricsBackend::new();
        let now = Utc::now();

        let mut dims = Dimensions::new();
        dims.insert("service".to_string(), "api".to_string());

        let mut tagged = datum("Cpu", 80.0, now);
        tagged.dimensions = Some(dims.clone());

        backend.put_metric_data("App", &[tagged]).await.unwrap();
        backend
            .put_metric_data("Other", &[datum("Cpu", 10.0, now)])
            .await
            .unwrap();
        assert_eq!(backend.len().await, 2);

        let mut q = query("m0", "Cpu", 60);
        q.dimensions = Some(dims);
        let results = backend
            .get_metric_data(&[q], now - Duration::seconds(60), now)
            .await
            .unwrap();
        assert_eq!(results.get("m0"), Some(&vec![80.0]));

        let untagged = backend
            .get_metric_data(&[query("m0", "Cpu", 60)], now - Duration::seconds(60), now)
            .await
            .unwrap();
        assert!(untagged.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_queries_are_rejected() {
        let backend = InMemoryMetricsBackend::new();
        let now = Utc::now();

        assert!(backend
            .get_metric_data(&[query("m0", "Cpu", 0)], now - Duration::seconds(60), now)
            .await
            .is_err());
        assert!(backend
            .get_metric_data(&[query("m0", "Cpu", 60)], now, now - Duration::seconds(60))
            .await
            .is_err());
    }
}

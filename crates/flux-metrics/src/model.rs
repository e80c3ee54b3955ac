use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 维度集合（键值标签）
pub type Dimensions = HashMap<String, String>;

/// 指标单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricUnit {
    Seconds,
    Microseconds,
    Milliseconds,
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Bits,
    Percent,
    Count,
    #[serde(rename = "Bytes/Second")]
    BytesPerSecond,
    #[serde(rename = "Count/Second")]
    CountPerSecond,
    None,
}

/// 单个指标样本，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    /// 缺省为接收时间
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, unit: MetricUnit) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
            timestamp: Utc::now(),
            dimensions: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// 同一命名空间下的一批指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBatch {
    pub namespace: String,
    pub metrics: Vec<Metric>,
}

impl MetricBatch {
    pub fn new(namespace: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self {
            namespace: namespace.into(),
            metrics,
        }
    }
}

/// 规范化维度：按键排序后以 `k=v` 逗号拼接，与插入顺序无关
pub fn dimension_key(dimensions: Option<&Dimensions>) -> String {
    let Some(dimensions) = dimensions else {
        return String::new();
    };

    let mut pairs: Vec<(&String, &String)> = dimensions.iter().collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// 聚合缓存键：`namespace:name:维度`
pub fn aggregation_key(namespace: &str, name: &str, dimensions: Option<&Dimensions>) -> String {
    format!("{}:{}:{}", namespace, name, dimension_key(dimensions))
}

/// 指标的运行聚合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregation {
    pub namespace: String,
    pub name: String,
    pub dimensions: Option<Dimensions>,
    pub sum: f64,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub last_timestamp: DateTime<Utc>,
}

impl MetricAggregation {
    pub fn first(namespace: &str, metric: &Metric) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: metric.name.clone(),
            dimensions: metric.dimensions.clone(),
            sum: metric.value,
            count: 1,
            min: metric.value,
            max: metric.value,
            last_timestamp: metric.timestamp,
        }
    }

    pub fn record(&mut self, metric: &Metric) {
        self.sum += metric.value;
        self.count += 1;
        self.min = self.min.min(metric.value);
        self.max = self.max.max(metric.value);
        if metric.timestamp > self.last_timestamp {
            self.last_timestamp = metric.timestamp;
        }
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// 写入后端的数据点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDatum {
    pub metric_name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl From<&Metric> for MetricDatum {
    fn from(metric: &Metric) -> Self {
        Self {
            metric_name: metric.name.clone(),
            value: metric.value,
            unit: metric.unit,
            timestamp: metric.timestamp,
            dimensions: metric.dimensions.clone(),
        }
    }
}

/// 统计方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Sum,
    Minimum,
    Maximum,
    SampleCount,
}

impl Statistic {
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        let value = match self {
            Statistic::Average => values.iter().sum::<f64>() / values.len() as f64,
            Statistic::Sum => values.iter().sum(),
            Statistic::Minimum => values.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Maximum => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Statistic::SampleCount => values.len() as f64,
        };
        Some(value)
    }
}

/// 后端历史查询
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDataQuery {
    pub id: String,
    pub namespace: String,
    pub metric_name: String,
    /// 统计周期（秒）
    pub period: u32,
    pub statistic: Statistic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

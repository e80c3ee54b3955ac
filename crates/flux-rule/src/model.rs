use chrono::{DateTime, Utc};
use flux_metrics::Dimensions;
use flux_notify::AlertSeverity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 阈值比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    /// 精确相等，不带容差
    Eq,
}

impl ThresholdOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdOperator::Gt => "gt",
            ThresholdOperator::Gte => "gte",
            ThresholdOperator::Lt => "lt",
            ThresholdOperator::Lte => "lte",
            ThresholdOperator::Eq => "eq",
        }
    }

    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            ThresholdOperator::Gt => value > threshold,
            ThresholdOperator::Gte => value >= threshold,
            ThresholdOperator::Lt => value < threshold,
            ThresholdOperator::Lte => value <= threshold,
            ThresholdOperator::Eq => value == threshold,
        }
    }
}

impl fmt::Display for ThresholdOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringThreshold {
    pub operator: ThresholdOperator,
    pub value: f64,
    pub severity: AlertSeverity,
}

impl MonitoringThreshold {
    pub fn new(operator: ThresholdOperator, value: f64, severity: AlertSeverity) -> Self {
        Self {
            operator,
            value,
            severity,
        }
    }

    pub fn is_breached(&self, value: f64) -> bool {
        self.operator.compare(value, self.value)
    }
}

/// 待添加的规则（尚未分配 ID）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMonitoringRule {
    /// 规则名称
    pub name: String,

    /// 规则描述
    #[serde(default)]
    pub description: String,

    /// 指标命名空间
    pub namespace: String,

    /// 指标名称
    pub metric_name: String,

    #[serde(default)]
    pub dimensions: Option<Dimensions>,

    /// 统计周期（秒）
    pub period: u32,

    /// 回看的周期数
    pub evaluation_periods: u32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub thresholds: Vec<MonitoringThreshold>,
}

fn default_enabled() -> bool {
    true
}

/// 已存储的监控规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringRule {
    /// 规则 ID
    pub id: String,
    pub name: String,
    pub description: String,
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Option<Dimensions>,
    pub period: u32,
    pub evaluation_periods: u32,
    pub enabled: bool,
    pub thresholds: Vec<MonitoringThreshold>,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl MonitoringRule {
    pub fn from_new(rule: NewMonitoringRule) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: rule.name,
            description: rule.description,
            namespace: rule.namespace,
            metric_name: rule.metric_name,
            dimensions: rule.dimensions,
            period: rule.period,
            evaluation_periods: rule.evaluation_periods,
            enabled: rule.enabled,
            thresholds: rule.thresholds,
            created_at: now,
            updated_at: now,
        }
    }

    /// 回看窗口长度（秒）
    pub fn lookback_seconds(&self) -> u64 {
        u64::from(self.evaluation_periods) * u64::from(self.period)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.period == 0 {
            return Err(format!("rule '{}': period must be greater than 0", self.name));
        }
        if self.evaluation_periods == 0 {
            return Err(format!(
                "rule '{}': evaluation_periods must be at least 1",
                self.name
            ));
        }
        Ok(())
    }

    /// 合并部分更新，未提供的字段保持不变
    pub fn apply(&mut self, update: RuleUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(namespace) = update.namespace {
            self.namespace = namespace;
        }
        if let Some(metric_name) = update.metric_name {
            self.metric_name = metric_name;
        }
        if let Some(dimensions) = update.dimensions {
            self.dimensions = Some(dimensions);
        }
        if let Some(period) = update.period {
            self.period = period;
        }
        if let Some(evaluation_periods) = update.evaluation_periods {
            self.evaluation_periods = evaluation_periods;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(thresholds) = update.thresholds {
            self.thresholds = thresholds;
        }
        self.updated_at = Utc::now();
    }
}

/// 规则的部分更新
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub namespace: Option<String>,
    pub metric_name: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub period: Option<u32>,
    pub evaluation_periods: Option<u32>,
    pub enabled: Option<bool>,
    pub thresholds: Option<Vec<MonitoringThreshold>>,
}

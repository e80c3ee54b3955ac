pub mod collaborators;
pub mod engine;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod storage;

pub use collaborators::{AlertSink, MetricHistory};
pub use engine::MonitoringRuleEngine;
pub use error::RuleError;
pub use model::{
    MonitoringRule, MonitoringThreshold, NewMonitoringRule, RuleUpdate, ThresholdOperator,
};
pub use scheduler::{ErrorHandler, EvaluationFuture, Scheduler, SchedulerConfig, SchedulerError};
pub use storage::RuleStorage;

use crate::scheduler::SchedulerError;
use thiserror::Error;

/// 规则引擎错误
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule not found: {0}")]
    NotFound(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Failed to evaluate rule {rule_id}: {message}")]
    Evaluation { rule_id: String, message: String },

    #[error("{} rule evaluation(s) failed: {}", .failures.len(), .failures.join("; "))]
    Aggregate { failures: Vec<String> },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

pub type Result<T> = std::result::Result<T, RuleError>;

use crate::model::MonitoringRule;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 规则存储（内存实现），保持插入顺序
pub struct RuleStorage {
    rules: Arc<RwLock<Vec<MonitoringRule>>>,
}

impl RuleStorage {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// 新增或替换同 ID 的规则
    pub async fn save(&self, rule: MonitoringRule) {
        let mut rules = self.rules.write().await;
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
    }

    pub async fn get(&self, rule_id: &str) -> Option<MonitoringRule> {
        let rules = self.rules.read().await;
        rules.iter().find(|r| r.id == rule_id).cloned()
    }

    /// 返回是否确实删除了规则
    pub async fn delete(&self, rule_id: &str) -> bool {
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        rules.len() != before
    }

    /// 在写锁内修改规则，`f` 返回错误时不写回
    pub async fn modify<F, E>(&self, rule_id: &str, f: F) -> Option<Result<MonitoringRule, E>>
    where
        F: FnOnce(&mut MonitoringRule) -> Result<(), E>,
    {
        let mut rules = self.rules.write().await;
        let existing = rules.iter_mut().find(|r| r.id == rule_id)?;
        let mut candidate = existing.clone();
        Some(f(&mut candidate).map(|()| {
            *existing = candidate.clone();
            candidate
        }))
    }

    pub async fn list(&self) -> Vec<MonitoringRule> {
        self.rules.read().await.clone()
    }
}

impl Default for RuleStorage {
    fn default() -> Self {
        Self::new()
    }
}

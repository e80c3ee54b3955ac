use flux_logging::LoggingConfig;
use flux_metrics::CollectorConfig;
use flux_notify::DispatcherConfig;
use flux_rule::SchedulerConfig;
use serde::{Deserialize, Serialize};

/// 告警管道配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertingConfig {
    pub collector: CollectorConfig,
    pub scheduler: SchedulerConfig,
    pub notifications: DispatcherConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9090,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AlertingConfig {
    /// 渲染为 TOML，便于生成示例配置
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

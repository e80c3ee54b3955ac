use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to install subscriber: {0}")]
    InitError(String),
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 默认日志级别，可被 RUST_LOG 覆盖
    pub level: String,

    /// 是否输出 JSON 格式
    pub json: bool,

    /// 事件日志文件，未设置时输出到 stdout
    pub event_log_path: Option<PathBuf>,

    /// 事件缓冲条数
    pub buffer_size: usize,

    /// 事件刷新间隔（秒）
    pub flush_interval_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            event_log_path: None,
            buffer_size: 100,
            flush_interval_secs: 5,
        }
    }
}

/// 初始化全局 tracing 订阅者
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| LoggingError::InitError(e.to_string()))
}

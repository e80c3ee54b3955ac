use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::AlertingConfig;

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "alerting.toml";

/// 环境变量前缀，例如 `FLUX_ALERT__SCHEDULER__INTERVAL_MS`
pub const ENV_PREFIX: &str = "FLUX_ALERT";

/// 配置加载器
pub struct ConfigLoader {
    config_dir: PathBuf,
    env_source: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
            env_source: None,
        }
    }

    /// 用给定的变量表代替进程环境
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// 加载配置：文件（可选）+ 环境变量
    pub fn load(&self) -> Result<AlertingConfig> {
        let config_path = self.config_path();
        let mut builder = Config::builder();

        if config_path.exists() {
            builder = builder.add_source(File::new(
                config_path.to_str().ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ));
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(self.env_source.clone());

        let config = builder.add_source(environment).build()?;
        Ok(config.try_deserialize()?)
    }

    /// 加载并校验
    pub fn load_validated(&self) -> Result<AlertingConfig> {
        let config = self.load()?;
        validate(&config)?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        validate(&self.load()?)
    }
}

/// 校验已加载的配置
pub fn validate(config: &AlertingConfig) -> Result<()> {
    if config.collector.max_batch_size == 0 {
        return Err(anyhow!("collector.max_batch_size must be greater than 0"));
    }

    if config.collector.batch_interval_secs == 0 {
        return Err(anyhow!("collector.batch_interval_secs must be greater than 0"));
    }

    if config.scheduler.interval_ms == 0 {
        return Err(anyhow!("scheduler.interval_ms must be greater than 0"));
    }

    if config.scheduler.max_concurrent_evaluations == Some(0) {
        return Err(anyhow!("scheduler.max_concurrent_evaluations must be greater than 0 when set"));
    }

    if config.notifications.email.destinations.is_empty() {
        return Err(anyhow!("notifications.email.destinations must not be empty"));
    }

    if config.server.port == 0 {
        return Err(anyhow!("server.port must be greater than 0"));
    }

    if let Some(topic) = &config.notifications.topic {
        if topic.topic_arn.trim().is_empty() {
            return Err(anyhow!("notifications.topic.topic_arn must be set"));
        }
    }

    Ok(())
}

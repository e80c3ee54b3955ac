use serde::{Deserialize, Serialize};

/// 告警分发配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// 聊天 Webhook 地址，未设置时跳过该通道
    pub webhook_url: Option<String>,

    pub email: EmailConfig,

    /// 主题发布，仅用于严重告警
    pub topic: Option<TopicConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub source: String,
    pub destinations: Vec<String>,

    /// 未设置时只记录日志
    pub smtp: Option<SmtpConfig>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            source: "alerts@localhost".to_string(),
            destinations: vec!["root@localhost".to_string()],
            smtp: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConfig {
    /// 发布服务地址
    pub url: String,
    pub topic_arn: String,
}

pub mod alerting;
pub mod loader;

pub use alerting::{AlertingConfig, ServerConfig};
pub use loader::{validate, ConfigLoader, CONFIG_FILE_NAME, ENV_PREFIX};

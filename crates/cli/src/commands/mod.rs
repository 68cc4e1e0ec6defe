pub mod ask;
pub mod init;
pub mod run;
pub mod search;

use henrybot_config::{AppConfig, ConfigError};
use std::path::Path;

/// Load `path` and layer the process environment on top.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    AppConfig::load_with_env(path, |name| std::env::var(name).ok())
}

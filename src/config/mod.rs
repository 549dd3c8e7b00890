pub mod env;
mod loader;

pub use env::{AppConfig, ChromeConfig, ConfigError, DirectoryConfig, OpenRouterConfig, ScanConfig};
pub use loader::{load_config, DEFAULT_MODEL};

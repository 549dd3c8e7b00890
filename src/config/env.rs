use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openrouter: OpenRouterConfig,
    pub scan: ScanConfig,
    pub chrome: ChromeConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl OpenRouterConfig {
    /// The credential precondition: scans refuse to start without a key
    /// rather than producing a column of error verdicts.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::Missing("OPENROUTER_API_KEY"))
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub max_replies: usize,
    pub confidence_threshold: u8,
    pub auto_scroll: bool,
    pub max_idle_scrolls: u32,
}

/// How to reach a browser: an explicit websocket endpoint wins, then a
/// devtools port that may already have a browser listening, then spawning
/// the executable ourselves.
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    pub executable: Option<String>,
    pub debug_port: u16,
    pub profile_dir: Option<String>,
    pub ws_url: Option<String>,
    pub headless: bool,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
}

use std::{env, str::FromStr};

use super::env::{
    AppConfig, ChromeConfig, ConfigError, DirectoryConfig, LoggingConfig, OpenRouterConfig,
    ScanConfig,
};

pub const DEFAULT_MODEL: &str = "google/gemma-2-9b-it";
pub const DEFAULT_MAX_REPLIES: usize = 50;
pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 80;
pub const DEFAULT_MAX_IDLE_SCROLLS: u32 = 3;
pub const DEFAULT_DEBUG_PORT: u16 = 9222;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let openrouter = OpenRouterConfig {
            api_key: env::var("OPENROUTER_API_KEY").ok().filter(|v| !v.is_empty()),
            model: env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        };

        let scan = ScanConfig {
            max_replies: parse_num("MAX_REPLIES").unwrap_or(DEFAULT_MAX_REPLIES),
            confidence_threshold: parse_num("CONFIDENCE_THRESHOLD")
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            auto_scroll: parse_bool("AUTO_SCROLL").unwrap_or(true),
            max_idle_scrolls: parse_num("MAX_IDLE_SCROLLS").unwrap_or(DEFAULT_MAX_IDLE_SCROLLS),
        };

        let chrome = ChromeConfig {
            executable: env::var("CHROME_EXECUTABLE").ok().filter(|v| !v.is_empty()),
            debug_port: parse_num("CHROME_DEBUG_PORT").unwrap_or(DEFAULT_DEBUG_PORT),
            profile_dir: env::var("CHROME_PROFILE_DIR").ok().filter(|v| !v.is_empty()),
            ws_url: env::var("CHROME_WS_URL").ok().filter(|v| !v.is_empty()),
            headless: parse_bool("BROWSER_HEADLESS").unwrap_or(false),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "allowlist.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        Ok(Self {
            openrouter,
            scan,
            chrome,
            directories,
            logging,
        })
    }
}

fn parse_num<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_bool(key: &str) -> Option<bool> {
    let value = env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_num_ignores_garbage() {
        env::set_var("HB_TEST_NUM", "not-a-number");
        assert_eq!(parse_num::<usize>("HB_TEST_NUM"), None);
        env::set_var("HB_TEST_NUM", " 42 ");
        assert_eq!(parse_num::<usize>("HB_TEST_NUM"), Some(42));
        env::remove_var("HB_TEST_NUM");
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        env::set_var("HB_TEST_BOOL", "TRUE");
        assert_eq!(parse_bool("HB_TEST_BOOL"), Some(true));
        env::set_var("HB_TEST_BOOL", "off");
        assert_eq!(parse_bool("HB_TEST_BOOL"), Some(false));
        env::set_var("HB_TEST_BOOL", "maybe");
        assert_eq!(parse_bool("HB_TEST_BOOL"), None);
        env::remove_var("HB_TEST_BOOL");
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let config = OpenRouterConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        };
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::Missing("OPENROUTER_API_KEY"))
        ));
    }
}

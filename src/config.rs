use std::time::Duration;

use tracing::warn;

use crate::browser::HeadlessBrowser;
use crate::error::Result;

pub const ENV_CHROME_PATH: &str = "ORDER_FORM_CHROME_PATH";
pub const ENV_HEADLESS: &str = "ORDER_FORM_HEADLESS";
pub const ENV_TIMEOUT_SECS: &str = "ORDER_FORM_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<String>,
    /// Timeout for element, readiness and URL waits, and for each CDP request (default: 30s).
    pub default_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chrome_path: None,
            default_timeout: Duration::from_secs(30),
        }
    }
}

impl BrowserConfig {
    /// Defaults, overridden by `ORDER_FORM_*` environment variables when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_CHROME_PATH).filter(|p| !p.is_empty()) {
            config.chrome_path = Some(path);
        }

        if let Some(raw) = lookup(ENV_HEADLESS) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.headless = true,
                "0" | "false" | "no" => config.headless = false,
                _ => warn!(var = ENV_HEADLESS, value = %raw, "ignoring unrecognised value"),
            }
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.default_timeout = Duration::from_secs(secs),
                _ => warn!(var = ENV_TIMEOUT_SECS, value = %raw, "ignoring invalid timeout"),
            }
        }

        config
    }
}

pub struct BrowserBuilder {
    config: BrowserConfig,
}

impl BrowserBuilder {
    pub fn new() -> Self {
        Self {
            config: BrowserConfig::default(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<String>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    pub fn build_config(self) -> BrowserConfig {
        self.config
    }

    pub async fn build(self) -> Result<HeadlessBrowser> {
        HeadlessBrowser::launch(self.build_config()).await
    }
}

impl Default for BrowserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

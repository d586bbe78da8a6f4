/// Configuration constants for the application
pub struct Config;

impl Config {
    /// Backend used when `GATEWAY_DASHBOARD_API_URL` is not set at build time
    pub const DEFAULT_API_URL: &'static str = "http://localhost:8000";

    /// Header carrying the credential on every authenticated request
    pub const API_KEY_HEADER: &'static str = "X-API-Key";

    /// Local storage key holding the persisted credential
    pub const CREDENTIAL_STORAGE_KEY: &'static str = "gateway_dashboard.api_key";

    /// Client-side route of the login view
    pub const LOGIN_PATH: &'static str = "/login";

    /// How long a cached query result is served without revalidation (30 seconds)
    pub const DEFAULT_STALE_TIME_MS: u64 = 30_000;

    /// Extra attempts made after a failed fetch
    pub const DEFAULT_RETRY_COUNT: u32 = 1;

    /// Base delay before the first retry; doubles on each further attempt
    pub const DEFAULT_RETRY_DELAY_MS: u32 = 1_000;

    /// Upper bound on any single retry delay
    pub const MAX_RETRY_DELAY_MS: u32 = 30_000;

    /// Fallback message when neither the body nor the transport explain a failure
    pub const GENERIC_ERROR_MESSAGE: &'static str = "An unexpected error occurred";

    /// Most verbose level forwarded to the browser console
    pub const LOG_LEVEL: tracing::Level = tracing::Level::INFO;
}

/// Startup settings, read once and immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub use_mock: bool,
    pub api_url: String,
}

impl AppConfig {
    /// Reads the build-time environment.
    ///
    /// The browser has no process environment, so the flags are baked in when
    /// the bundle is built (`GATEWAY_DASHBOARD_USE_MOCK=true trunk build`).
    pub fn from_env() -> Self {
        Self::from_values(
            option_env!("GATEWAY_DASHBOARD_USE_MOCK"),
            option_env!("GATEWAY_DASHBOARD_API_URL"),
        )
    }

    pub fn from_values(use_mock: Option<&str>, api_url: Option<&str>) -> Self {
        let api_url = api_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(Config::DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            use_mock: parse_flag(use_mock),
            api_url,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_values(None, None)
    }
}

/// Interprets a boolean-valued environment flag. Anything unrecognised is `false`.
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" TRUE ")));
        assert!(parse_flag(Some("1")));
        assert!(parse_flag(Some("on")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(Some("maybe")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert!(!config.use_mock);
        assert_eq!(config.api_url, Config::DEFAULT_API_URL);
    }

    #[test]
    fn test_app_config_trims_trailing_slash() {
        let config = AppConfig::from_values(Some("yes"), Some("https://gw.example.com/api/"));
        assert!(config.use_mock);
        assert_eq!(config.api_url, "https://gw.example.com/api");
    }

    #[test]
    fn test_app_config_blank_url_falls_back() {
        let config = AppConfig::from_values(None, Some("   "));
        assert_eq!(config.api_url, Config::DEFAULT_API_URL);
    }
}

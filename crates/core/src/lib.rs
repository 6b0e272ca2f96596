pub mod domain;
pub mod ingest;
pub mod quote;
pub mod scan;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_ROSTER_URL: &str =
        "https://datahub.io/core/s-and-p-500-companies/datapackage.json";
    pub const DEFAULT_QUOTE_BASE_URL: &str = "https://query2.finance.yahoo.com";
    pub const DEFAULT_QUOTE_COOKIE_URL: &str = "https://fc.yahoo.com";
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_LOG_CONFIG: &str = "logger.yaml";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub roster_url: String,
        pub quote_base_url: String,
        pub quote_cookie_url: String,
        pub http_timeout_secs: u64,
        pub log_config: String,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                roster_url: DEFAULT_ROSTER_URL.to_string(),
                quote_base_url: DEFAULT_QUOTE_BASE_URL.to_string(),
                quote_cookie_url: DEFAULT_QUOTE_COOKIE_URL.to_string(),
                http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
                log_config: DEFAULT_LOG_CONFIG.to_string(),
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();

            let http_timeout_secs = match non_empty_var("HTTP_TIMEOUT_SECS") {
                Some(s) => s
                    .parse::<u64>()
                    .with_context(|| format!("HTTP_TIMEOUT_SECS must be an integer (got {s})"))?,
                None => defaults.http_timeout_secs,
            };

            Ok(Self {
                roster_url: non_empty_var("ROSTER_URL").unwrap_or(defaults.roster_url),
                quote_base_url: non_empty_var("QUOTE_BASE_URL").unwrap_or(defaults.quote_base_url),
                quote_cookie_url: non_empty_var("QUOTE_COOKIE_URL")
                    .unwrap_or(defaults.quote_cookie_url),
                http_timeout_secs,
                log_config: non_empty_var("LOG_CONFIG").unwrap_or(defaults.log_config),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}

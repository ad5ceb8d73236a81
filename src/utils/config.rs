use std::time::Duration;

pub const DEFAULT_IRACING_API_URL: &str = "https://members-ng.iracing.com";
pub const DEFAULT_BOT_API_URL: &str = "https://api.rockyracing13.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// Raw value; validated on every stats request so a bad id degrades
    /// to fallback data instead of stopping the server.
    pub iracing_cust_id: Option<String>,
    pub iracing_email: Option<String>,
    pub iracing_password: Option<String>,
    pub iracing_primary_category: Option<String>,
    pub iracing_api_url: String,
    pub iracing_timeout: Duration,
    pub bot_api_url: String,
    pub bot_api_cache_secs: i64,
    pub bind_addr: String,
}

impl Config {
    pub fn init() -> Self {
        Config {
            iracing_cust_id: optional_var("IRACING_CUST_ID"),
            iracing_email: optional_var("IRACING_EMAIL"),
            iracing_password: optional_var("IRACING_PASSWORD"),
            iracing_primary_category: optional_var("IRACING_PRIMARY_CATEGORY"),
            iracing_api_url: optional_var("IRACING_API_URL")
                .unwrap_or_else(|| DEFAULT_IRACING_API_URL.to_string()),
            iracing_timeout: Duration::from_secs(
                optional_var("IRACING_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(5),
            ),
            bot_api_url: optional_var("BOT_API_URL")
                .unwrap_or_else(|| DEFAULT_BOT_API_URL.to_string()),
            bot_api_cache_secs: optional_var("BOT_API_CACHE_SECS")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            bind_addr: optional_var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

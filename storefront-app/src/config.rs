//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Unknown LOG_FORMAT: {}", s)),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub catalog_api_url: String,
    pub rates_api_url: String,
    /// Defaults to the catalog service
    pub contact_api_url: Option<String>,
    pub rate_refresh: Duration,
    pub default_exchange_rate: f64,
    pub page_size: usize,
    pub rate_limit_per_minute: u32,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = parse("PORT", &get("PORT", "3000"))?;
        let refresh_secs: u64 = parse("RATE_REFRESH_SECS", &get("RATE_REFRESH_SECS", "1800"))?;
        if refresh_secs == 0 {
            anyhow::bail!("RATE_REFRESH_SECS must be greater than zero");
        }

        let default_exchange_rate: f64 =
            parse("DEFAULT_EXCHANGE_RATE", &get("DEFAULT_EXCHANGE_RATE", "850"))?;
        if !(default_exchange_rate.is_finite() && default_exchange_rate > 0.0) {
            anyhow::bail!(
                "DEFAULT_EXCHANGE_RATE must be a positive number, got {}",
                default_exchange_rate
            );
        }

        let page_size: usize = parse("PAGE_SIZE", &get("PAGE_SIZE", "12"))?;
        if page_size == 0 {
            anyhow::bail!("PAGE_SIZE must be greater than zero");
        }

        Ok(Self {
            port,
            catalog_api_url: get("CATALOG_API_URL", "http://localhost:3002/api"),
            rates_api_url: get("RATES_API_URL", "http://localhost:3001/api"),
            contact_api_url: lookup("CONTACT_API_URL").filter(|url| !url.is_empty()),
            rate_refresh: Duration::from_secs(refresh_secs),
            default_exchange_rate,
            page_size,
            rate_limit_per_minute: parse(
                "RATE_LIMIT_PER_MINUTE",
                &get("RATE_LIMIT_PER_MINUTE", "100"),
            )?,
            log_format: get("LOG_FORMAT", "text").parse()?,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: {:?}", key, raw))
}

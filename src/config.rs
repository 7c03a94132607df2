use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::filter::FilterConfig;

/// Default screener query: purchases + sales, filings up to 730 days back,
/// 500 rows per page.
pub const DEFAULT_SOURCE_URL: &str = "http://openinsider.com/screener?s=&o=&pl=&ph=&ll=&lh=&fd=730&fdr=&td=0&tdr=&fdlyl=&fdlyh=&daysago=&xp=1&xs=1&vl=&vh=&ocl=&och=&sic1=-1&sicl=100&sich=9999&grp=0&nfl=&nfh=&nil=&nih=&nol=&noh=&v2l=&v2h=&oc2l=&oc2h=&sortcol=0&cnt=500&page=1";

/// Hard per-request embed cap imposed by the webhook API.
pub const SINK_MAX_EMBEDS_PER_REQUEST: usize = 10;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub filter: FilterSettings,
    #[serde(default)]
    pub sink: SinkSettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceSettings {
    pub url: String,
    /// Offline override: read markup from this file instead of fetching.
    pub local_html: Option<String>,
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            local_html: None,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterSettings {
    /// Comma-separated trade-type allow-list, e.g. "P,S".
    pub types: String,
    pub max_days_filed: f64,
    pub max_days_trade: f64,
    pub min_price: f64,
    pub min_value_k: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            types: "P,S".to_string(),
            max_days_filed: 3.0,
            max_days_trade: 365.0,
            min_price: 5.0,
            min_value_k: 0.0,
        }
    }
}

impl FilterSettings {
    pub fn to_filter_config(&self) -> FilterConfig {
        FilterConfig {
            types: FilterConfig::parse_types(&self.types),
            max_days_filed: self.max_days_filed,
            max_days_trade: self.max_days_trade,
            min_price: self.min_price,
            min_value_k: self.min_value_k,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SinkSettings {
    /// The only required setting; startup fails without it.
    pub webhook_url: Option<String>,
    /// true = one-line embeds; false = plain-text messages, one per record.
    pub embed_mode: bool,
    pub embeds_per_request: usize,
    /// Minimum pause between successive sink requests.
    pub rate_limit_ms: u64,
    pub max_per_run: usize,
    /// Lower bound on the 429 backoff wait.
    pub throttle_floor_ms: u64,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            embed_mode: true,
            embeds_per_request: 10,
            rate_limit_ms: 750,
            max_per_run: 200,
            throttle_floor_ms: 1000,
        }
    }
}

impl SinkSettings {
    /// Configured batch size clamped to the webhook's hard cap, never 0.
    pub fn effective_batch_size(&self) -> usize {
        self.embeds_per_request.clamp(1, SINK_MAX_EMBEDS_PER_REQUEST)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LedgerSettings {
    pub path: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: "./openinsider.sent.log".to_string(),
        }
    }
}

impl Settings {
    /// Layered load: optional config files, then INSIDER__-prefixed
    /// environment overrides (e.g. INSIDER__SINK__WEBHOOK_URL).
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config/config").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("INSIDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Required-option check per the process exit contract.
    pub fn webhook_url(&self) -> Result<&str, ConfigError> {
        self.sink
            .webhook_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                ConfigError::NotFound("sink.webhook_url (INSIDER__SINK__WEBHOOK_URL)".to_string())
            })
    }
}

//! Dashboard configuration.
//!
//! Loaded from TOML. Every section and field is optional; missing values fall
//! back to the defaults below. `validate` runs after loading and rejects
//! values no request could succeed with.

use crate::data::provider::SourceKind;
use crate::data::symbols::SymbolMap;
use crate::error::ConfigError;
use crate::etf::EtfFilter;
use crate::etf::ranking::{DEFAULT_EXCLUDE_KEYWORDS, DEFAULT_TOP_N};
use crate::indicators::DEFAULT_WINDOW;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; bandview/0.1)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Index data source.
    pub source: SourceKind,
    pub http: HttpSettings,
    pub indicator: IndicatorSettings,
    pub etf: EtfSettings,
    pub cache: CacheSettings,
    /// Extra or replacement name -> ticker mappings.
    pub symbols: SymbolOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout. Requests are never retried.
    pub timeout_secs: u64,
    /// How long a tripped breaker blocks requests.
    pub breaker_cooldown_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            breaker_cooldown_secs: 30 * 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub window: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtfSettings {
    pub top_n: usize,
    pub exclude_keywords: Vec<String>,
}

impl Default for EtfSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            exclude_keywords: DEFAULT_EXCLUDE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolOverrides {
    pub yahoo: BTreeMap<String, String>,
    pub krx: BTreeMap<String, String>,
}

impl DashboardConfig {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), source = %config.source, "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indicator.window == 0 {
            return Err(ConfigError::Invalid("indicator.window must be >= 1".into()));
        }
        if self.etf.top_n == 0 {
            return Err(ConfigError::Invalid("etf.top_n must be >= 1".into()));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be >= 1".into()));
        }
        for (name, ticker) in &self.symbols.krx {
            if ticker.len() != 4 || !ticker.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ConfigError::Invalid(format!(
                    "symbols.krx.{name}: KRX index tickers are four digits, got '{ticker}'"
                )));
            }
        }
        Ok(())
    }

    /// Built-in Yahoo mappings with overrides applied.
    pub fn yahoo_symbols(&self) -> SymbolMap {
        let mut map = SymbolMap::yahoo_default();
        map.merge(&self.symbols.yahoo);
        map
    }

    /// Built-in KRX mappings with overrides applied.
    pub fn krx_symbols(&self) -> SymbolMap {
        let mut map = SymbolMap::krx_default();
        map.merge(&self.symbols.krx);
        map
    }

    pub fn etf_filter(&self) -> EtfFilter {
        EtfFilter::new(self.etf.exclude_keywords.iter().cloned())
    }
}

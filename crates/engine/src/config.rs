//! Ledger configuration via `tally.toml`
//!
//! All settings have defaults, so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tally_core::{TallyError, TallyResult};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tally.toml";

fn default_idempotency_ttl_ms() -> u64 {
    24 * 60 * 60 * 1000
}

fn default_sweep_interval_ms() -> u64 {
    5 * 60 * 1000
}

fn default_page_limit() -> usize {
    20
}

fn default_max_page_limit() -> usize {
    100
}

/// Ledger configuration loaded from `tally.toml`.
///
/// # Example
///
/// ```toml
/// idempotency_ttl_ms = 86400000
/// sweep_interval_ms = 300000
/// default_page_limit = 20
/// max_page_limit = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Maximum age of an idempotency entry. `0` disables eviction.
    #[serde(default = "default_idempotency_ttl_ms")]
    pub idempotency_ttl_ms: u64,
    /// Time between sweeper passes.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Page size used when a list request gives no limit.
    #[serde(default = "default_page_limit")]
    pub default_page_limit: usize,
    /// Largest accepted page size.
    #[serde(default = "default_max_page_limit")]
    pub max_page_limit: usize,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl_ms: default_idempotency_ttl_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            default_page_limit: default_page_limit(),
            max_page_limit: default_max_page_limit(),
        }
    }
}

/// Whole milliseconds in `d`, rounded up and saturating at `u64::MAX`
fn millis_ceil(d: Duration) -> u64 {
    let millis = (d.as_nanos() + 999_999) / 1_000_000;
    u64::try_from(millis).unwrap_or(u64::MAX)
}

impl TallyConfig {
    /// Idempotency TTL as a `Duration` (zero = never expire)
    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_millis(self.idempotency_ttl_ms)
    }

    /// Sweeper interval as a `Duration`
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// True when the sweeper should run
    pub fn eviction_enabled(&self) -> bool {
        self.idempotency_ttl_ms > 0
    }

    /// Set the idempotency TTL
    ///
    /// Sub-millisecond remainders round up, so only `Duration::ZERO` disables
    /// eviction.
    pub fn with_idempotency_ttl(mut self, ttl: Duration) -> Self {
        self.idempotency_ttl_ms = millis_ceil(ttl);
        self
    }

    /// Set the sweeper interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = millis_ceil(interval);
        self
    }

    /// Set default and maximum page sizes
    pub fn with_page_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_page_limit = default_limit;
        self.max_page_limit = max_limit;
        self
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// - sweep interval is zero while eviction is enabled
    /// - page limits are not `1 <= default <= max`
    pub fn validate(&self) -> TallyResult<()> {
        if self.eviction_enabled() && self.sweep_interval_ms == 0 {
            return Err(TallyError::config(
                "sweep_interval_ms must be greater than 0 when idempotency_ttl_ms is set",
            ));
        }
        if self.max_page_limit == 0 {
            return Err(TallyError::config("max_page_limit must be at least 1"));
        }
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(TallyError::config(format!(
                "default_page_limit must be between 1 and max_page_limit ({})",
                self.max_page_limit
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Tally ledger configuration
#
# Maximum age of an idempotency entry, in milliseconds (default: 24h).
# After eviction, a retry with the same key creates a new transaction.
# Set to 0 to keep entries forever.
idempotency_ttl_ms = 86400000

# How often expired idempotency entries are swept, in milliseconds (default: 5m).
sweep_interval_ms = 300000

# Page size when a list request gives no limit.
default_page_limit = 20

# Largest accepted page size. Larger requests are rejected, not clamped.
max_page_limit = 100
"#
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> TallyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TallyError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: TallyConfig = toml::from_str(&content).map_err(|e| {
            TallyError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> TallyResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                TallyError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> TallyResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TallyError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            TallyError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

//! Service configuration, loaded from JSON.

use crate::address::Address;
use crate::network::Network;
use crate::util::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Trading fee as a fraction of the purchase price.
pub const DEFAULT_FEE_RATE: f64 = 0.025;
/// Smallest output the fee will be rounded up to.
pub const DUST_LIMIT: i64 = 273;
/// Change outputs are split into chunks of about this size.
pub const DEFAULT_CHANGE_SPLIT_SATS: u64 = 250_000;
/// Fee rate requested from the funding service.
pub const DEFAULT_SATS_PER_BYTE: f64 = 0.05;
/// Per-request deadline for every network call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings shared by the signers and network adapters.
///
/// ```
/// use utxo_custody::config::Config;
/// let config = Config::from_json(r#"{
///     "api_url": "https://api.example.com",
///     "network": "test",
///     "fyx_id": "game",
///     "user_id": "alice",
///     "order_lock_pattern": "^97dfd76851bf465e8f715593b217714858bbe9570ff3bd5e33840a34e20ff026"
/// }"#).unwrap();
/// assert_eq!(config.change_split_sats, 250_000);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the REST services, without a trailing slash
    pub api_url: String,
    /// Network for address rendering and service naming
    #[serde(default)]
    pub network: Network,
    /// Application id in account paths
    #[serde(default)]
    pub fyx_id: String,
    /// User id in account paths and the `from` of signed messages
    #[serde(default)]
    pub user_id: String,
    /// Recipient of purchase trading fees, if any
    #[serde(default)]
    pub fee_address: Option<Address>,
    /// Trading fee rate
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    /// Change split size for the locking purse
    #[serde(default = "default_change_split_sats")]
    pub change_split_sats: u64,
    /// Funding fee rate for the locking purse
    #[serde(default = "default_sats_per_byte")]
    pub sats_per_byte: f64,
    /// Deadline for each HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Regular expression over the lowercase hex of an order-lock script
    pub order_lock_pattern: String,
    /// Key for the hosted payment gateway
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_fee_rate() -> f64 {
    DEFAULT_FEE_RATE
}

fn default_change_split_sats() -> u64 {
    DEFAULT_CHANGE_SPLIT_SATS
}

fn default_sats_per_byte() -> f64 {
    DEFAULT_SATS_PER_BYTE
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Config {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    /// `Error::JsonError` for malformed JSON, `Error::BadArgument` for invalid values.
    pub fn from_json(json: &str) -> Result<Config> {
        let mut config: Config = serde_json::from_str(json)?;
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    /// IO errors plus those of [`Config::from_json`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        Config::from_json(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(Error::BadArgument("api_url is required".to_string()));
        }
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(Error::BadArgument("fee_rate must be in [0, 1)".to_string()));
        }
        if self.sats_per_byte <= 0.0 {
            return Err(Error::BadArgument("sats_per_byte must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::BadArgument("request_timeout_secs must be positive".to_string()));
        }
        regex::Regex::new(&self.order_lock_pattern)?;
        Ok(())
    }

    /// Request deadline as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// HTTP client with the configured deadline applied to every request.
    ///
    /// # Errors
    /// `Error::HttpError` if the TLS backend cannot be initialized.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(self.request_timeout()).build()?)
    }
}

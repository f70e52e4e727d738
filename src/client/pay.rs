//! Hosted payment gateway.

use super::check_status;
use crate::config::Config;
use crate::util::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct RawTx<'a> {
    rawtx: &'a str,
}

#[derive(Deserialize)]
struct Paid {
    rawtx: String,
}

#[derive(Deserialize)]
struct Broadcast {
    txid: String,
}

/// Funds and broadcasts transactions through a hosted purse identified by an API key.
#[derive(Debug, Clone)]
pub struct PayPurse {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl PayPurse {
    /// Creates a gateway client.
    pub fn new(api_url: &str, api_key: &str, client: reqwest::Client) -> PayPurse {
        PayPurse {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    /// Creates a gateway client from `config`.
    ///
    /// # Errors
    /// `Error::BadArgument` without an `api_key`, or if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<PayPurse> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::BadArgument("api_key is required for the payment gateway".to_string()))?;
        Ok(PayPurse::new(&config.api_url, api_key, config.http_client()?))
    }

    /// Returns `rawtx` funded and signed by the hosted purse.
    ///
    /// # Errors
    /// Transport failures, non-success statuses and malformed responses.
    pub async fn pay(&self, rawtx: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/pay/{}", self.api_url, self.api_key))
            .json(&RawTx { rawtx })
            .send()
            .await?;
        let paid: Paid = serde_json::from_slice(&check_status(response).await?.bytes().await?)?;
        Ok(paid.rawtx)
    }

    /// Broadcasts `rawtx` and returns its txid.
    ///
    /// # Errors
    /// Transport failures, non-success statuses and malformed responses.
    pub async fn broadcast(&self, rawtx: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/broadcast", self.api_url))
            .json(&RawTx { rawtx })
            .send()
            .await?;
        let sent: Broadcast = serde_json::from_slice(&check_status(response).await?.bytes().await?)?;
        debug!("Gateway broadcast {}", sent.txid);
        Ok(sent.txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_server::{serve, test_client};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn pay_and_broadcast() {
        let (url, server) = serve(2, |line| {
            if line.starts_with("POST /pay/secret ") {
                (200, br#"{"rawtx":"0200"}"#.to_vec())
            } else {
                (200, br#"{"txid":"ff00"}"#.to_vec())
            }
        })
        .await;
        let purse = PayPurse::new(&url, "secret", test_client());
        assert_eq!(purse.pay("0100").await.unwrap(), "0200");
        assert_eq!(purse.broadcast("0200").await.unwrap(), "ff00");
        let seen = server.await.unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&seen[0].body).unwrap(), serde_json::json!({"rawtx": "0100"}));
        assert!(seen[1].line.starts_with("POST /broadcast "));
    }

    #[tokio::test]
    async fn malformed_response() {
        let (url, server) = serve(1, |_| (200, b"[]".to_vec())).await;
        let purse = PayPurse::new(&url, "k", test_client());
        assert!(matches!(purse.pay("00").await, Err(Error::JsonError(_))));
        server.await.unwrap();
    }

    #[test]
    fn needs_api_key() {
        let config = Config::from_json(r#"{"api_url": "http://x", "order_lock_pattern": "^00"}"#).unwrap();
        assert!(PayPurse::from_config(&config).is_err());
    }
}

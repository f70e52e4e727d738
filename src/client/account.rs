//! Signed calls to the account service.

use super::{AccountApi, Derivation, check_status};
use crate::config::Config;
use crate::message::SignedMessage;
use crate::util::Result;
use crate::wallet::KeyPair;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Subject of the derivation listing request
pub const LOAD_DERIVATIONS: &str = "LoadDerivations";
/// Subject of the receiving address request
pub const GET_PAYMENT_DESTINATION: &str = "GetPaymentDestination";

#[derive(Deserialize)]
struct PaymentDestination {
    address: String,
}

/// Talks to `{api}/accounts/{fyx_id}/{user_id}/...`, authenticating every request with a
/// [`SignedMessage`] from the user's key.
#[derive(Debug, Clone)]
pub struct AccountClient {
    api_url: String,
    fyx_id: String,
    user_id: String,
    key_pair: KeyPair,
    client: reqwest::Client,
}

impl AccountClient {
    /// Creates a client for one user.
    pub fn new(api_url: &str, fyx_id: &str, user_id: &str, key_pair: KeyPair, client: reqwest::Client) -> AccountClient {
        AccountClient {
            api_url: api_url.trim_end_matches('/').to_string(),
            fyx_id: fyx_id.to_string(),
            user_id: user_id.to_string(),
            key_pair,
            client,
        }
    }

    /// Creates a client with the URL, ids and request timeout of `config`.
    ///
    /// # Errors
    /// If the HTTP client cannot be built.
    pub fn from_config(config: &Config, key_pair: KeyPair) -> Result<AccountClient> {
        Ok(AccountClient::new(
            &config.api_url,
            &config.fyx_id,
            &config.user_id,
            key_pair,
            config.http_client()?,
        ))
    }

    async fn post_signed<T: DeserializeOwned>(&self, endpoint: &str, subject: &str) -> Result<T> {
        let message = SignedMessage::signed(SignedMessage::with_subject(subject), &self.user_id, &self.key_pair)?;
        let url = format!("{}/accounts/{}/{}/{}", self.api_url, self.fyx_id, self.user_id, endpoint);
        debug!("{} as {} ({})", subject, self.user_id, message.id());
        let response = self.client.post(url).json(&message).send().await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl AccountApi for AccountClient {
    async fn derivations(&self) -> Result<Vec<Derivation>> {
        self.post_signed("derivations", LOAD_DERIVATIONS).await
    }

    async fn payment_destination(&self) -> Result<String> {
        let destination: PaymentDestination = self.post_signed("payment-destination", GET_PAYMENT_DESTINATION).await?;
        Ok(destination.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_server::{serve, test_client};
    use crate::util::Error;
    use pretty_assertions::assert_eq;

    fn key() -> KeyPair {
        KeyPair::from_secret_hex("1111111111111111111111111111111111111111111111111111111111111111").unwrap()
    }

    #[tokio::test]
    async fn derivations_are_requested_with_a_signed_message() {
        let (url, server) = serve(1, |line| {
            if line.starts_with("POST /accounts/game/alice/derivations ") {
                (200, br#"[{"path":"m/0/3","script":"76a914751e76e8199196d454941c45d1b3a323f1433bd688ac"}]"#.to_vec())
            } else {
                (404, vec![])
            }
        })
        .await;
        let client = AccountClient::new(&url, "game", "alice", key(), test_client());
        let derivations = client.derivations().await.unwrap();
        assert_eq!(derivations.len(), 1);
        assert_eq!(derivations[0].path, "m/0/3");

        let seen = server.await.unwrap();
        let message: SignedMessage = serde_json::from_slice(&seen[0].body).unwrap();
        assert_eq!(message.subject, LOAD_DERIVATIONS);
        assert_eq!(message.from, "alice");
        assert!(message.verify(key().public_key()).unwrap());
    }

    #[tokio::test]
    async fn payment_destination() {
        let (url, server) = serve(2, |line| {
            if line.contains("/payment-destination ") {
                (200, br#"{"address":"1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"}"#.to_vec())
            } else {
                (401, b"bad signature".to_vec())
            }
        })
        .await;
        let client = AccountClient::new(&url, "game", "alice", key(), test_client());
        assert_eq!(client.payment_destination().await.unwrap(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        let err = client.derivations().await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus(401, _)));
        assert!(!err.is_retryable());
        let seen = server.await.unwrap();
        let message: SignedMessage = serde_json::from_slice(&seen[0].body).unwrap();
        assert_eq!(message.subject, GET_PAYMENT_DESTINATION);
    }
}

//! REST adapter for the blockchain service.

use super::{Blockchain, PaymentIO, PaymentRequest, Utxo, check_status};
use crate::address::Address;
use crate::config::Config;
use crate::messages::Tx;
use crate::network::Network;
use crate::script::Script;
use crate::signer::Parent;
use crate::util::{Error, Result, sha256};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::try_join_all;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Index key of a script in the UTXO endpoints: SHA-256 of the script bytes, reversed, in hex.
#[must_use]
pub fn scripthash(script: &Script) -> String {
    let mut hash = sha256(&script.0);
    hash.reverse();
    hex::encode(hash)
}

#[derive(Serialize)]
struct PaymentIOWire {
    s: String,
    i: i64,
    ss: u64,
    ms: u64,
}

impl From<&PaymentIO> for PaymentIOWire {
    fn from(io: &PaymentIO) -> Self {
        PaymentIOWire {
            s: BASE64.encode(&io.script.0),
            i: io.amount,
            ss: io.split_sats,
            ms: io.max_splits,
        }
    }
}

#[derive(Serialize)]
struct PaymentRequestWire {
    r: String,
    i: Vec<PaymentIOWire>,
    f: PaymentIOWire,
}

impl From<&PaymentRequest> for PaymentRequestWire {
    fn from(req: &PaymentRequest) -> Self {
        PaymentRequestWire {
            r: BASE64.encode(&req.rawtx),
            i: req.io.iter().map(PaymentIOWire::from).collect(),
            f: PaymentIOWire::from(&req.fee_io),
        }
    }
}

/// `t` is the txid bytes in base64, in the order the service stores them.
#[derive(Deserialize)]
struct UtxoWire {
    t: String,
    v: u32,
    s: i64,
}

/// Blockchain service over HTTP.
#[derive(Debug, Clone)]
pub struct RestBlockchain {
    api_url: String,
    network: Network,
    client: reqwest::Client,
}

impl RestBlockchain {
    /// Creates an adapter for `api_url` using `client` for every request.
    pub fn new(api_url: &str, network: Network, client: reqwest::Client) -> RestBlockchain {
        RestBlockchain {
            api_url: api_url.trim_end_matches('/').to_string(),
            network,
            client,
        }
    }

    /// Creates an adapter with the URL, network and request timeout of `config`.
    ///
    /// # Errors
    /// If the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<RestBlockchain> {
        Ok(RestBlockchain::new(&config.api_url, config.network, config.http_client()?))
    }

    /// The service's network.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// Network name in bsv tooling form.
    #[must_use]
    pub fn bsv_network(&self) -> &'static str {
        self.network.bsv_name()
    }

    /// Asks the service to add `req`'s payments and returns the resulting transaction bytes.
    ///
    /// # Errors
    /// Transport failures and non-success statuses.
    pub async fn build_payments(&self, req: &PaymentRequest) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(format!("{}/pay", self.api_url))
            .json(&PaymentRequestWire::from(req))
            .send()
            .await?;
        Ok(check_status(response).await?.bytes().await?.to_vec())
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let response = self.client.get(format!("{}{}", self.api_url, path)).send().await?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let bytes = self.get(path).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Blockchain for RestBlockchain {
    async fn broadcast(&self, rawtx: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/broadcast", self.api_url))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(hex::decode(rawtx.trim())?)
            .send()
            .await?;
        let txid = check_status(response).await?.text().await?;
        let txid = txid.trim().trim_matches('"').to_string();
        debug!("Broadcast {}", txid);
        Ok(txid)
    }

    async fn fetch(&self, txid: &str) -> Result<String> {
        let bytes = self.get(&format!("/tx/{}", txid)).await?.bytes().await?;
        Ok(hex::encode(bytes))
    }

    async fn spends(&self, txid: &str, vout: u32) -> Result<Option<String>> {
        match self.get(&format!("/spends/{}/{}", txid, vout)).await {
            Ok(response) => {
                let bytes = response.bytes().await?;
                Ok((!bytes.is_empty()).then(|| hex::encode(bytes)))
            }
            Err(Error::HttpStatus(404, _)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn utxos(&self, script: &Script) -> Result<Vec<Utxo>> {
        let wire: Vec<UtxoWire> = self.get_json(&format!("/utxos/{}", scripthash(script))).await?;
        wire.into_iter()
            .map(|u| -> Result<Utxo> {
                Ok(Utxo {
                    txid: hex::encode(BASE64.decode(u.t)?),
                    vout: u.v,
                    satoshis: u.s,
                    script: script.clone(),
                })
            })
            .collect()
    }

    async fn utxo_count(&self, script: &Script) -> Result<u64> {
        self.get_json(&format!("/utxos/{}/count", scripthash(script))).await
    }

    async fn balance(&self, script: &Script) -> Result<i64> {
        self.get_json(&format!("/utxos/{}/balance", scripthash(script))).await
    }

    async fn apply_payments(
        &self,
        _rawtx: &str,
        _payments: &[PaymentIO],
        _change: &Address,
        _change_split_sats: u64,
        _sats_per_byte: f64,
    ) -> Result<String> {
        Err(Error::Unsupported("apply_payments is not offered by the REST service".to_string()))
    }

    async fn load_parents(&self, rawtx: &str) -> Result<Vec<Parent>> {
        let tx = Tx::from_hex(rawtx)?;
        try_join_all(tx.inputs.iter().map(|input| async move {
            let txid = input.prev_output.hash.encode();
            let parent = Tx::from_hex(&self.fetch(&txid).await?)?;
            if parent.hash() != input.prev_output.hash {
                return Err(Error::BadData(format!("Service returned the wrong tx for {}", txid)));
            }
            let out = parent
                .outputs
                .get(input.prev_output.index as usize)
                .ok_or_else(|| Error::BadData(format!("{} has no output {}", txid, input.prev_output.index)))?;
            Ok(Parent::from(out))
        }))
        .await
    }
}

//! Remote collaborators: the blockchain service, the account service and the payment gateway.
//!
//! The signers depend on the [`Blockchain`] and [`AccountApi`] traits only, so they can run
//! against the REST adapters here or against in-memory implementations.

mod account;
mod pay;
mod rest;

pub use self::account::AccountClient;
pub use self::pay::PayPurse;
pub use self::rest::{RestBlockchain, scripthash};

use crate::address::Address;
use crate::script::Script;
use crate::signer::Parent;
use crate::util::{Error, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A `(path, script)` pair issued by the account service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    /// BIP-32 path relative to the identity's master key
    pub path: String,
    /// Lock script the derived key unlocks
    pub script: Script,
}

/// An unspent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Id of the funding transaction, hex
    pub txid: String,
    /// Output index
    pub vout: u32,
    /// Value
    pub satoshis: i64,
    /// Lock script
    pub script: Script,
}

/// One payment leg of a [`PaymentRequest`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaymentIO {
    /// Lock script to pay to
    pub script: Script,
    /// Amount in satoshis
    pub amount: i64,
    /// Split change into outputs of about this size; 0 for no split
    pub split_sats: u64,
    /// Upper bound on split outputs; 0 for no bound
    pub max_splits: u64,
}

/// Request for the blockchain service to add payments to a transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaymentRequest {
    /// Serialized transaction to extend
    pub rawtx: Vec<u8>,
    /// Payments to add
    pub io: Vec<PaymentIO>,
    /// Where the fee and change come from
    pub fee_io: PaymentIO,
}

/// Blockchain queries and funding.
pub trait Blockchain: Send + Sync {
    /// Submits a transaction and returns its txid.
    fn broadcast(&self, rawtx: &str) -> impl Future<Output = Result<String>> + Send;

    /// Raw transaction hex for a txid.
    fn fetch(&self, txid: &str) -> impl Future<Output = Result<String>> + Send;

    /// Hex of the transaction spending `txid:vout`, if any.
    fn spends(&self, txid: &str, vout: u32) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Unspent outputs locked by `script`.
    fn utxos(&self, script: &Script) -> impl Future<Output = Result<Vec<Utxo>>> + Send;

    /// Number of unspent outputs locked by `script`.
    fn utxo_count(&self, script: &Script) -> impl Future<Output = Result<u64>> + Send;

    /// Total value locked by `script`.
    fn balance(&self, script: &Script) -> impl Future<Output = Result<i64>> + Send;

    /// Adds `payments`, funding inputs and change to `change` outputs; returns the new hex.
    fn apply_payments(
        &self,
        rawtx: &str,
        payments: &[PaymentIO],
        change: &Address,
        change_split_sats: u64,
        sats_per_byte: f64,
    ) -> impl Future<Output = Result<String>> + Send;

    /// The previous output of every input of `rawtx`, in input order.
    fn load_parents(&self, rawtx: &str) -> impl Future<Output = Result<Vec<Parent>>> + Send;
}

/// Account-service calls made on behalf of one user.
pub trait AccountApi: Send + Sync {
    /// Derivations issued to the user so far.
    fn derivations(&self) -> impl Future<Output = Result<Vec<Derivation>>> + Send;

    /// A fresh receiving address for the user.
    fn payment_destination(&self) -> impl Future<Output = Result<String>> + Send;
}

/// Turns a non-success response into `Error::HttpStatus` carrying the body text.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    warn!("{} answered {}", url.path(), status);
    Err(Error::HttpStatus(status.as_u16(), body))
}

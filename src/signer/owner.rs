//! The registry-backed transaction signer of a wallet identity.

use super::order_lock::{self, ORDER_LOCK_INPUT, OrderLockPattern};
use super::{InputOutcome, Parent, check_parents, install, p2pkh_unlock};
use crate::address::Address;
use crate::client::AccountApi;
use crate::config::{Config, DEFAULT_FEE_RATE, DUST_LIMIT};
use crate::messages::{Tx, TxOut};
use crate::script::Script;
use crate::util::Result;
use crate::wallet::{ExtendedKey, KeyRegistry};
use log::{debug, info, trace};
use rayon::prelude::*;
use tokio::sync::RwLock;

/// Value of the baton output in a listing base
const BATON_SATOSHIS: i64 = 546;

/// Signs transactions for one wallet identity.
///
/// Owns the identity's [`KeyRegistry`]; the account collaborator `A` supplies the remotely
/// issued derivations and fresh receiving addresses.
pub struct Owner<A: AccountApi> {
    api: A,
    registry: RwLock<KeyRegistry>,
    order_lock: OrderLockPattern,
    payment_address: Address,
    baton_address: Address,
    fee_address: Option<Address>,
    fee_rate: f64,
}

impl<A: AccountApi> Owner<A> {
    /// Creates an owner with no trading fee.
    pub fn new(api: A, registry: KeyRegistry, order_lock: OrderLockPattern) -> Owner<A> {
        Owner {
            api,
            payment_address: registry.payment_address(),
            baton_address: registry.baton_address(),
            registry: RwLock::new(registry),
            order_lock,
            fee_address: None,
            fee_rate: DEFAULT_FEE_RATE,
        }
    }

    /// Creates an owner from `master` with the network, fee and order-lock settings of `config`.
    ///
    /// # Errors
    /// Invalid master key or order-lock pattern.
    pub fn from_config(config: &Config, api: A, master: ExtendedKey) -> Result<Owner<A>> {
        let registry = KeyRegistry::new(master, config.network)?;
        let order_lock = OrderLockPattern::new(&config.order_lock_pattern)?;
        let mut owner = Owner::new(api, registry, order_lock);
        owner.fee_address = config.fee_address;
        owner.fee_rate = config.fee_rate;
        Ok(owner)
    }

    /// Charges `fee_rate` of every purchase to `fee_address`.
    #[must_use]
    pub fn with_fee(mut self, fee_address: Address, fee_rate: f64) -> Owner<A> {
        self.fee_address = Some(fee_address);
        self.fee_rate = fee_rate;
        self
    }

    /// Address of the payment key.
    #[must_use]
    pub fn payment_address(&self) -> &Address {
        &self.payment_address
    }

    /// Address of the baton key.
    #[must_use]
    pub fn baton_address(&self) -> &Address {
        &self.baton_address
    }

    /// Number of scripts the registry can sign for.
    pub async fn known_scripts(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Refreshes the registry from the account service.
    ///
    /// The fetch runs without holding the registry lock; only the merge takes it.
    ///
    /// # Errors
    /// Propagates collaborator failures and malformed derivation paths.
    pub async fn load_derivations(&self) -> Result<usize> {
        let derivations = self.api.derivations().await?;
        self.registry.write().await.merge(&derivations)
    }

    /// Signs every input it can and returns the transaction hex.
    ///
    /// # Errors
    /// As [`Owner::sign_tx`], plus malformed transaction hex.
    pub async fn sign(&self, rawtx: &str, parents: &[Parent]) -> Result<String> {
        let (tx, _) = self.sign_tx(Tx::from_hex(rawtx)?, parents).await?;
        Ok(tx.to_hex())
    }

    /// Signs every input it can and reports what happened to each.
    ///
    /// Input 0 spending an order lock gets the template unlock. Other inputs whose previous
    /// script resolves in the registry get a `SIGHASH_ALL | SIGHASH_FORKID` P2PKH unlock.
    /// Unresolved inputs are left untouched.
    ///
    /// # Errors
    /// `Error::BadArgument` if `parents` does not match the inputs one-to-one. Registry refresh
    /// failures propagate, and no input is signed in that case.
    pub async fn sign_tx(&self, mut tx: Tx, parents: &[Parent]) -> Result<(Tx, Vec<InputOutcome>)> {
        check_parents(&tx, parents)?;
        self.load_derivations().await?;

        let results: Vec<Result<(InputOutcome, Option<Script>)>> = {
            let registry = self.registry.read().await;
            let tx = &tx;
            let registry = &*registry;
            parents
                .par_iter()
                .enumerate()
                .map(|(i, parent)| self.sign_input(tx, i, parent, registry))
                .collect()
        };

        let mut outcomes = Vec::with_capacity(results.len());
        let mut unlocks = Vec::new();
        for (i, result) in results.into_iter().enumerate() {
            let (outcome, unlock) = result?;
            if let Some(script) = unlock {
                unlocks.push((i, script));
            }
            outcomes.push(outcome);
        }
        install(&mut tx, unlocks);

        let signed = outcomes.iter().filter(|o| **o != InputOutcome::Skipped).count();
        info!("Signed {} of {} inputs of {}", signed, outcomes.len(), tx.hash().encode());
        Ok((tx, outcomes))
    }

    fn sign_input(
        &self,
        tx: &Tx,
        i: usize,
        parent: &Parent,
        registry: &KeyRegistry,
    ) -> Result<(InputOutcome, Option<Script>)> {
        if i == ORDER_LOCK_INPUT && self.order_lock.matches(&parent.script) {
            let (spend, script) = order_lock::unlock(tx, &parent.script, parent.satoshis)?;
            debug!("Input {} spends an order lock: {:?}", i, spend);
            return Ok((InputOutcome::OrderLock(spend), Some(script)));
        }
        match registry.resolve(&parent.script) {
            Some(key_pair) => {
                let script = p2pkh_unlock(tx, i, parent, key_pair)?;
                Ok((InputOutcome::Signed, Some(script)))
            }
            None => {
                trace!("No key for input {} script {}", i, parent.script.to_hex());
                Ok((InputOutcome::Skipped, None))
            }
        }
    }

    /// Transaction hex with a single baton output, the start of a listing.
    #[must_use]
    pub fn listing_base(&self) -> String {
        let tx = Tx {
            version: 1,
            inputs: vec![],
            outputs: vec![TxOut {
                satoshis: BATON_SATOSHIS,
                lock_script: self.baton_address.lock_script(),
            }],
            lock_time: 0,
        };
        tx.to_hex()
    }

    /// Transaction hex paying `satoshis` to `address`, plus the trading fee if one is configured.
    ///
    /// The fee is `max(floor(satoshis * fee_rate), DUST_LIMIT)`.
    #[must_use]
    pub fn purchase_base(&self, address: &Address, satoshis: i64) -> String {
        let mut outputs = vec![TxOut {
            satoshis,
            lock_script: address.lock_script(),
        }];
        if let Some(fee_address) = &self.fee_address {
            let fee = ((satoshis as f64 * self.fee_rate).floor() as i64).max(DUST_LIMIT);
            outputs.push(TxOut {
                satoshis: fee,
                lock_script: fee_address.lock_script(),
            });
        }
        let tx = Tx {
            version: 1,
            inputs: vec![],
            outputs,
            lock_time: 0,
        };
        tx.to_hex()
    }

    /// A fresh receiving address issued by the account service.
    ///
    /// # Errors
    /// Collaborator failures, or an unparseable address.
    pub async fn next_owner(&self) -> Result<Address> {
        self.api.payment_destination().await?.parse()
    }
}

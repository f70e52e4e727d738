//! A single-key purse that funds transactions through the blockchain service and signs its own
//! inputs.

use super::{check_parents, install, p2pkh_unlock};
use crate::address::Address;
use crate::client::{Blockchain, Utxo};
use crate::config::{Config, DEFAULT_CHANGE_SPLIT_SATS, DEFAULT_SATS_PER_BYTE};
use crate::messages::Tx;
use crate::network::Network;
use crate::script::Script;
use crate::util::Result;
use crate::wallet::KeyPair;
use log::{debug, info};
use rayon::prelude::*;

/// Pays for transactions from the P2PKH outputs of one key.
pub struct LockingPurse<B: Blockchain> {
    key_pair: KeyPair,
    blockchain: B,
    address: Address,
    script: Script,
    change_split_sats: u64,
    sats_per_byte: f64,
}

impl<B: Blockchain> LockingPurse<B> {
    /// Creates a purse with the default change split and fee rate.
    pub fn new(key_pair: KeyPair, blockchain: B, network: Network) -> LockingPurse<B> {
        let address = key_pair.address(network);
        LockingPurse {
            script: address.lock_script(),
            address,
            key_pair,
            blockchain,
            change_split_sats: DEFAULT_CHANGE_SPLIT_SATS,
            sats_per_byte: DEFAULT_SATS_PER_BYTE,
        }
    }

    /// Creates a purse with the network and funding settings of `config`.
    pub fn from_config(config: &Config, key_pair: KeyPair, blockchain: B) -> LockingPurse<B> {
        let mut purse = LockingPurse::new(key_pair, blockchain, config.network);
        purse.change_split_sats = config.change_split_sats;
        purse.sats_per_byte = config.sats_per_byte;
        purse
    }

    /// The purse's address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The lock script of the purse's address.
    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Has the blockchain service fund `rawtx` with change back to this purse, then signs every
    /// input that spends the purse's own script.
    ///
    /// # Errors
    /// Funding or parent-loading failures, or parents that do not match the funded inputs.
    pub async fn pay(&self, rawtx: &str) -> Result<String> {
        let funded = self
            .blockchain
            .apply_payments(rawtx, &[], &self.address, self.change_split_sats, self.sats_per_byte)
            .await?;
        let parents = self.blockchain.load_parents(&funded).await?;
        let mut tx = Tx::from_hex(&funded)?;
        check_parents(&tx, &parents)?;

        let unlocks: Vec<(usize, Script)> = parents
            .par_iter()
            .enumerate()
            .filter(|(_, parent)| parent.script == self.script)
            .map(|(i, parent)| p2pkh_unlock(&tx, i, parent, &self.key_pair).map(|script| (i, script)))
            .collect::<Result<_>>()?;
        debug!("Purse signs {} of {} inputs", unlocks.len(), tx.inputs.len());
        install(&mut tx, unlocks);
        info!("Paid for {}", tx.hash().encode());
        Ok(tx.to_hex())
    }

    /// Unspent outputs of the purse's script.
    ///
    /// # Errors
    /// Propagates collaborator failures.
    pub async fn utxos(&self) -> Result<Vec<Utxo>> {
        let mut utxos = self.blockchain.utxos(&self.script).await?;
        for utxo in &mut utxos {
            utxo.script = self.script.clone();
        }
        Ok(utxos)
    }

    /// Total value held by the purse's script.
    ///
    /// # Errors
    /// Propagates collaborator failures.
    pub async fn balance(&self) -> Result<i64> {
        self.blockchain.balance(&self.script).await
    }

    /// Number of unspent outputs of the purse's script.
    ///
    /// # Errors
    /// Propagates collaborator failures.
    pub async fn utxo_count(&self) -> Result<u64> {
        self.blockchain.utxo_count(&self.script).await
    }
}

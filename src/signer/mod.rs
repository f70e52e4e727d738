//! Transaction signers: the registry-backed owner, the single-key locking purse and the
//! order-lock unlock builder they share a sighash layer with.

pub mod order_lock;
mod owner;
mod purse;

pub use self::order_lock::{OrderLockPattern, OrderLockSpend};
pub use self::owner::Owner;
pub use self::purse::LockingPurse;

use crate::messages::{Tx, TxOut};
use crate::script::Script;
use crate::transaction::sighash::{SIGHASH_ALL, SIGHASH_FORKID, SigHashCache, sighash};
use crate::util::{Error, Result};
use crate::wallet::KeyPair;
use serde::{Deserialize, Serialize};

/// The previous output spent by an input: its lock script and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    /// Lock script of the spent output
    pub script: Script,
    /// Value of the spent output
    pub satoshis: i64,
}

impl From<&TxOut> for Parent {
    fn from(out: &TxOut) -> Self {
        Parent {
            script: out.lock_script.clone(),
            satoshis: out.satoshis,
        }
    }
}

/// What signing did to one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// A `<sig> <pubkey>` unlock was installed.
    Signed,
    /// Input 0 spends an order lock; the unlock for this path was installed.
    OrderLock(OrderLockSpend),
    /// No key for the previous script. The input keeps its unlock script.
    Skipped,
}

pub(crate) fn check_parents(tx: &Tx, parents: &[Parent]) -> Result<()> {
    if parents.len() != tx.inputs.len() {
        return Err(Error::BadArgument(format!(
            "{} parents for {} inputs",
            parents.len(),
            tx.inputs.len()
        )));
    }
    Ok(())
}

/// `SIGHASH_ALL | SIGHASH_FORKID` P2PKH unlock for input `n_input`.
pub(crate) fn p2pkh_unlock(tx: &Tx, n_input: usize, parent: &Parent, key_pair: &KeyPair) -> Result<Script> {
    // Each input gets its own cache so inputs can be signed in parallel
    let mut cache = SigHashCache::new();
    let sighash_type = SIGHASH_ALL | SIGHASH_FORKID;
    let digest = sighash(tx, n_input, &parent.script.0, parent.satoshis, sighash_type, &mut cache)?;
    key_pair.p2pkh_unlock(&digest, sighash_type)
}

/// Writes computed unlock scripts into their inputs.
pub(crate) fn install(tx: &mut Tx, unlocks: Vec<(usize, Script)>) {
    for (i, script) in unlocks {
        tx.inputs[i].unlock_script = script;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{OutPoint, TxIn};
    use crate::transaction::{p2pkh, verify_signature};
    use crate::util::Hash256;

    #[test]
    fn parent_json() {
        let parent: Parent =
            serde_json::from_str(r#"{"script": "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac", "satoshis": 1000}"#)
                .unwrap();
        assert_eq!(parent.satoshis, 1000);
        assert!(p2pkh::check_lock_script(&parent.script.0));
    }

    #[test]
    fn unlock_verifies() {
        let kp = KeyPair::from_secret_hex("0000000000000000000000000000000000000000000000000000000000000002").unwrap();
        let tx = Tx {
            version: 1,
            inputs: vec![TxIn {
                prev_output: OutPoint { hash: Hash256([9; 32]), index: 1 },
                ..Default::default()
            }],
            outputs: vec![TxOut { satoshis: 900, lock_script: kp.lock_script() }],
            lock_time: 0,
        };
        let parent = Parent { script: kp.lock_script(), satoshis: 1000 };
        let unlock = p2pkh_unlock(&tx, 0, &parent, &kp).unwrap();
        let pubkey = p2pkh::extract_pubkey(&unlock.0).unwrap();
        assert_eq!(pubkey, kp.public_bytes().to_vec());
        let sig = &unlock.0[1..1 + unlock.0[0] as usize];
        let digest = sighash(&tx, 0, &parent.script.0, 1000, SIGHASH_ALL | SIGHASH_FORKID, &mut SigHashCache::new()).unwrap();
        assert!(verify_signature(sig, &pubkey, &digest).unwrap());
        assert!(check_parents(&tx, &[]).is_err());
    }
}

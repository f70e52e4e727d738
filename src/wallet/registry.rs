//! Maps previous-output scripts to the key pairs that unlock them.

use super::{ExtendedKey, KeyPair};
use crate::address::Address;
use crate::client::Derivation;
use crate::network::Network;
use crate::script::Script;
use crate::util::{Error, Result};
use log::{debug, trace};
use secp256k1::{All, Secp256k1};
use std::collections::HashMap;

/// Derivation path of the primary payment key
pub const PAYMENT_PATH: &str = "m/0/0";
/// Derivation path of the baton key that marks open listings
pub const BATON_PATH: &str = "m/1/0";

/// Key derivation registry owned by one wallet identity.
///
/// Keys are stored by the exact bytes of the lock script they unlock. The map only grows: an
/// entry, once present, is never replaced or removed.
pub struct KeyRegistry {
    secp: Secp256k1<All>,
    master: ExtendedKey,
    network: Network,
    payment: KeyPair,
    baton: KeyPair,
    keys: HashMap<Script, KeyPair>,
}

impl KeyRegistry {
    /// Derives the payment and baton keys and registers the baton key under its P2PKH script.
    ///
    /// # Errors
    /// `Error::BadArgument` if `master` is not a private extended key.
    pub fn new(master: ExtendedKey, network: Network) -> Result<KeyRegistry> {
        if !master.is_private() {
            return Err(Error::BadArgument("Registry needs a private master key".to_string()));
        }
        let secp = Secp256k1::new();
        let payment = derive_key_pair(&secp, &master, PAYMENT_PATH)?;
        let baton = derive_key_pair(&secp, &master, BATON_PATH)?;
        let mut keys = HashMap::new();
        keys.insert(baton.lock_script(), baton.clone());
        Ok(KeyRegistry {
            secp,
            master,
            network,
            payment,
            baton,
            keys,
        })
    }

    /// Network used for address rendering.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// Key at `m/0/0`.
    #[must_use]
    pub fn payment_key(&self) -> &KeyPair {
        &self.payment
    }

    /// Key at `m/1/0`.
    #[must_use]
    pub fn baton_key(&self) -> &KeyPair {
        &self.baton
    }

    /// Address of the payment key.
    #[must_use]
    pub fn payment_address(&self) -> Address {
        self.payment.address(self.network)
    }

    /// Address of the baton key.
    #[must_use]
    pub fn baton_address(&self) -> Address {
        self.baton.address(self.network)
    }

    /// Looks up the key for a previous-output script. Absence is not an error here.
    #[must_use]
    pub fn resolve(&self, script: &Script) -> Option<&KeyPair> {
        self.keys.get(script)
    }

    /// Number of registered scripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no script is registered. Never true after construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Inserts a key for every derivation whose script is not yet registered.
    ///
    /// Returns how many entries were added. Existing entries win. The owning signer fetches
    /// the derivations and calls this under its write lock.
    ///
    /// # Errors
    /// A malformed path aborts the merge; entries inserted before it stay.
    pub fn merge(&mut self, derivations: &[Derivation]) -> Result<usize> {
        let mut added = 0;
        for d in derivations {
            if self.keys.contains_key(&d.script) {
                continue;
            }
            let key_pair = derive_key_pair(&self.secp, &self.master, &d.path)?;
            trace!("Registered {} for script {}", d.path, d.script.to_hex());
            self.keys.insert(d.script.clone(), key_pair);
            added += 1;
        }
        debug!("Merged {} of {} derivations ({} keys)", added, derivations.len(), self.keys.len());
        Ok(added)
    }
}

fn derive_key_pair(secp: &Secp256k1<All>, master: &ExtendedKey, path: &str) -> Result<KeyPair> {
    let child = master.derive_path(path, secp)?;
    Ok(KeyPair::from_secret(secp, child.secret_key()?))
}

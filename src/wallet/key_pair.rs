//! A concrete secp256k1 key pair and the P2PKH forms derived from it.

use crate::address::Address;
use crate::network::Network;
use crate::script::Script;
use crate::transaction::{generate_signature, p2pkh};
use crate::util::{Hash256, Result};
use secp256k1::{PublicKey, Secp256k1, SecretKey, Signing};
use std::fmt;

/// Secret key plus its public key.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Builds the pair for a secret key.
    pub fn from_secret<C: Signing>(secp: &Secp256k1<C>, secret: SecretKey) -> KeyPair {
        KeyPair {
            public: PublicKey::from_secret_key(secp, &secret),
            secret,
        }
    }

    /// Parses a 32-byte hex secret.
    ///
    /// # Errors
    /// Hex or secp256k1 errors for malformed input.
    pub fn from_secret_hex(secret_hex: &str) -> Result<KeyPair> {
        let secret = SecretKey::from_slice(&hex::decode(secret_hex.trim())?)?;
        Ok(KeyPair::from_secret(&Secp256k1::signing_only(), secret))
    }

    /// The secret key.
    #[must_use]
    #[inline]
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// The public key.
    #[must_use]
    #[inline]
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Compressed SEC1 encoding of the public key.
    #[must_use]
    #[inline]
    pub fn public_bytes(&self) -> [u8; 33] {
        self.public.serialize()
    }

    /// P2PKH address of the compressed public key.
    #[must_use]
    pub fn address(&self, network: Network) -> Address {
        Address::from_public_key(network, &self.public_bytes())
    }

    /// P2PKH lock script of the compressed public key. The same for every network.
    #[must_use]
    pub fn lock_script(&self) -> Script {
        self.address(Network::Mainnet).lock_script()
    }

    /// Signs a sighash and builds the `<sig> <pubkey>` unlock script.
    ///
    /// # Errors
    /// Propagates signing failures.
    pub fn p2pkh_unlock(&self, sighash: &Hash256, sighash_type: u8) -> Result<Script> {
        let sig = generate_signature(&self.secret, sighash, sighash_type)?;
        p2pkh::create_unlock_script(&sig, &self.public_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "KeyPair({})", hex::encode(self.public_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn forms() {
        let kp = KeyPair::from_secret_hex("0000000000000000000000000000000000000000000000000000000000000001").unwrap();
        assert_eq!(
            hex::encode(kp.public_bytes()),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert_eq!(kp.address(Network::Mainnet).to_string(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(kp.lock_script().to_hex(), "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac");
        assert!(!format!("{:?}", kp).contains("0000000000000000000000000000000000000000000000000000000000000001"));
        assert!(KeyPair::from_secret_hex("00").is_err());
    }
}

//! P2PKH addresses in base58check form.
//!
//! Mainnet uses version byte `0x00`; testnet and STN share `0x6f`, so a parsed testnet-style
//! address always reports [`Network::Testnet`].

use crate::network::Network;
use crate::script::Script;
use crate::transaction::p2pkh;
use crate::util::{Error, Hash160, Result, hash160, sha256d};
use base58::{FromBase58, ToBase58};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MAINNET_P2PKH_VERSION: u8 = 0x00;
const TESTNET_P2PKH_VERSION: u8 = 0x6F;

/// A pay-to-public-key-hash address.
///
/// # Examples
/// ```
/// use utxo_custody::address::Address;
/// let addr: Address = "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH".parse().unwrap();
/// assert_eq!(addr.lock_script().to_hex(), "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Network the address is encoded for
    pub network: Network,
    /// Hash160 of the serialized public key
    pub hash160: Hash160,
}

impl Address {
    /// Address of a serialized (normally compressed) public key.
    #[must_use]
    pub fn from_public_key(network: Network, public_key: &[u8]) -> Address {
        Address {
            network,
            hash160: hash160(public_key),
        }
    }

    /// The P2PKH lock script paying to this address.
    #[must_use]
    #[inline]
    pub fn lock_script(&self) -> Script {
        p2pkh::create_lock_script(&self.hash160)
    }

    fn version(&self) -> u8 {
        match self.network {
            Network::Mainnet => MAINNET_P2PKH_VERSION,
            Network::Testnet | Network::STN => TESTNET_P2PKH_VERSION,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut v = [0u8; 25];
        v[0] = self.version();
        v[1..21].copy_from_slice(&self.hash160.0);
        let checksum = sha256d(&v[..21]);
        v[21..25].copy_from_slice(&checksum.0[..4]);
        f.write_str(&v.to_base58())
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Verifies the 25-byte length, checksum and P2PKH version byte.
    fn from_str(input: &str) -> Result<Address> {
        let bytes = input.trim().from_base58()?;
        if bytes.len() != 25 {
            return Err(Error::BadData("Invalid address length".to_string()));
        }
        let checksum = sha256d(&bytes[..21]);
        if checksum.0[..4] != bytes[21..] {
            return Err(Error::BadData("Invalid checksum".to_string()));
        }
        let network = match bytes[0] {
            MAINNET_P2PKH_VERSION => Network::Mainnet,
            TESTNET_P2PKH_VERSION => Network::Testnet,
            v => return Err(Error::BadData(format!("Unsupported address version {:#04x}", v))),
        };
        let mut hash = Hash160([0; 20]);
        hash.0.copy_from_slice(&bytes[1..21]);
        Ok(Address { network, hash160: hash })
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! BIP-32 extended keys (xprv/xpub) and path derivation.

use crate::network::Network;
use crate::util::{Error, Result, Serializable, hash160, sha256d};
use base58::{FromBase58, ToBase58};
use bitcoin_hashes::{Hash as _, HashEngine as _, hmac, sha512};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey, Signing, Verification};
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

/// Version bytes for a mainnet private key (`xprv`)
pub const MAINNET_PRIVATE_EXTENDED_KEY: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
/// Version bytes for a mainnet public key (`xpub`)
pub const MAINNET_PUBLIC_EXTENDED_KEY: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];
/// Version bytes for a testnet private key (`tprv`)
pub const TESTNET_PRIVATE_EXTENDED_KEY: [u8; 4] = [0x04, 0x35, 0x83, 0x94];
/// Version bytes for a testnet public key (`tpub`)
pub const TESTNET_PUBLIC_EXTENDED_KEY: [u8; 4] = [0x04, 0x35, 0x87, 0xCF];
/// Index offset of hardened children
pub const HARDENED_KEY: u32 = 0x80000000;

/// A BIP-32 extended key in its 78-byte serialized layout.
///
/// `version(4) | depth(1) | parent fingerprint(4) | child number(4) | chain code(32) | key(33)`,
/// where a private key is stored as `0x00 || secret`.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey(pub [u8; 78]);

impl ExtendedKey {
    /// Creates the master private key for a seed.
    ///
    /// # Errors
    /// `Error::BadArgument` if the seed is not 16 to 64 bytes, or a secp256k1 error for the
    /// (astronomically unlikely) invalid master secret.
    ///
    /// # Examples
    /// ```
    /// use utxo_custody::network::Network;
    /// use utxo_custody::wallet::ExtendedKey;
    /// let seed = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
    /// let master = ExtendedKey::from_seed(&seed, Network::Mainnet).unwrap();
    /// assert!(master.encode().starts_with("xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbP"));
    /// ```
    pub fn from_seed(seed: &[u8], network: Network) -> Result<ExtendedKey> {
        if !(16..=64).contains(&seed.len()) {
            return Err(Error::BadArgument("Seed must be 16 to 64 bytes".to_string()));
        }
        let result = hmac_sha512(b"Bitcoin seed", &[seed]);
        let secret_key = SecretKey::from_slice(&result[..32])?;
        let version = match network {
            Network::Mainnet => MAINNET_PRIVATE_EXTENDED_KEY,
            Network::Testnet | Network::STN => TESTNET_PRIVATE_EXTENDED_KEY,
        };
        let mut key = ExtendedKey([0; 78]);
        key.0[0..4].copy_from_slice(&version);
        key.0[13..45].copy_from_slice(&result[32..]);
        key.0[46..78].copy_from_slice(&secret_key.secret_bytes());
        Ok(key)
    }

    /// Returns the version bytes.
    #[must_use]
    #[inline]
    pub fn version(&self) -> [u8; 4] {
        let mut version = [0u8; 4];
        version.copy_from_slice(&self.0[0..4]);
        version
    }

    /// Returns the depth of the key.
    #[must_use]
    #[inline]
    pub fn depth(&self) -> u8 {
        self.0[4]
    }

    /// Returns the parent fingerprint.
    #[must_use]
    #[inline]
    pub fn parent_fingerprint(&self) -> [u8; 4] {
        let mut fingerprint = [0u8; 4];
        fingerprint.copy_from_slice(&self.0[5..9]);
        fingerprint
    }

    /// Returns the child number.
    #[must_use]
    #[inline]
    pub fn child_number(&self) -> u32 {
        u32::from_be_bytes([self.0[9], self.0[10], self.0[11], self.0[12]])
    }

    /// Returns the chain code.
    #[must_use]
    #[inline]
    pub fn chain_code(&self) -> [u8; 32] {
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&self.0[13..45]);
        chain_code
    }

    /// Returns the key data (`0x00 || secret` or a compressed public key).
    #[must_use]
    #[inline]
    pub fn key(&self) -> [u8; 33] {
        let mut key = [0u8; 33];
        key.copy_from_slice(&self.0[45..78]);
        key
    }

    /// Checks if the key is private.
    #[must_use]
    #[inline]
    pub fn is_private(&self) -> bool {
        let version = self.version();
        version == MAINNET_PRIVATE_EXTENDED_KEY || version == TESTNET_PRIVATE_EXTENDED_KEY
    }

    /// The secret key of a private extended key.
    ///
    /// # Errors
    /// `Error::BadArgument` for a public extended key.
    pub fn secret_key(&self) -> Result<SecretKey> {
        if !self.is_private() {
            return Err(Error::BadArgument("Not a private extended key".to_string()));
        }
        Ok(SecretKey::from_slice(&self.0[46..78])?)
    }

    /// The public key, computing it from the secret for a private extended key.
    ///
    /// # Errors
    /// A secp256k1 error if the key data is not a valid key.
    pub fn public_key<C: Signing>(&self, secp: &Secp256k1<C>) -> Result<PublicKey> {
        if self.is_private() {
            Ok(PublicKey::from_secret_key(secp, &self.secret_key()?))
        } else {
            Ok(PublicKey::from_slice(&self.key())?)
        }
    }

    /// The matching extended public key. Returns a copy if already public.
    ///
    /// # Errors
    /// A secp256k1 error if the key data is not a valid key.
    pub fn to_public<C: Signing>(&self, secp: &Secp256k1<C>) -> Result<ExtendedKey> {
        if !self.is_private() {
            return Ok(self.clone());
        }
        let version = if self.version() == MAINNET_PRIVATE_EXTENDED_KEY {
            MAINNET_PUBLIC_EXTENDED_KEY
        } else {
            TESTNET_PUBLIC_EXTENDED_KEY
        };
        let mut key = self.clone();
        key.0[0..4].copy_from_slice(&version);
        key.0[45..78].copy_from_slice(&self.public_key(secp)?.serialize());
        Ok(key)
    }

    /// Encodes an extended key into a base58check string.
    #[must_use]
    pub fn encode(&self) -> String {
        let checksum = sha256d(&self.0);
        let mut v = [0u8; 82];
        v[0..78].copy_from_slice(&self.0);
        v[78..82].copy_from_slice(&checksum.0[0..4]);
        v.to_base58()
    }

    /// Decodes an extended key from a base58check string.
    ///
    /// # Errors
    /// `Error::BadData` if invalid length, checksum or version.
    pub fn decode(s: &str) -> Result<ExtendedKey> {
        let v = s.trim().from_base58()?;
        if v.len() != 82 {
            return Err(Error::BadData("Invalid extended key length".to_string()));
        }
        let checksum = sha256d(&v[..78]);
        if checksum.0[0..4] != v[78..] {
            return Err(Error::BadData("Invalid checksum".to_string()));
        }
        let mut extended_key = ExtendedKey([0; 78]);
        extended_key.0.copy_from_slice(&v[..78]);
        let version = extended_key.version();
        if ![
            MAINNET_PRIVATE_EXTENDED_KEY,
            MAINNET_PUBLIC_EXTENDED_KEY,
            TESTNET_PRIVATE_EXTENDED_KEY,
            TESTNET_PUBLIC_EXTENDED_KEY,
        ]
        .contains(&version)
        {
            return Err(Error::BadData("Unknown extended key version".to_string()));
        }
        if extended_key.is_private() && extended_key.0[45] != 0 {
            return Err(Error::BadData("Invalid private key prefix".to_string()));
        }
        Ok(extended_key)
    }

    /// Derives a child key (hardened or normal).
    ///
    /// # Errors
    /// `Error::BadArgument` for hardened derivation from a public key, and a secp256k1 or
    /// `Error::BadData` error in the rare case the derived key is invalid.
    pub fn derive_child<C: Signing + Verification>(
        &self,
        index: u32,
        secp: &Secp256k1<C>,
    ) -> Result<ExtendedKey> {
        let is_private = self.is_private();
        let parent_pubkey = self.public_key(secp)?;
        let index_bytes = index.to_be_bytes();

        let result = if index >= HARDENED_KEY {
            if !is_private {
                return Err(Error::BadArgument(
                    "Hardened derivation not supported for public keys".to_string(),
                ));
            }
            hmac_sha512(&self.chain_code(), &[&self.key(), &index_bytes])
        } else {
            hmac_sha512(&self.chain_code(), &[&parent_pubkey.serialize(), &index_bytes])
        };
        let mut il = [0u8; 32];
        il.copy_from_slice(&result[..32]);
        let tweak = Scalar::from_be_bytes(il)
            .map_err(|_| Error::BadData("Derived tweak out of range".to_string()))?;

        let mut child_key = ExtendedKey([0; 78]);
        child_key.0[0..4].copy_from_slice(&self.version());
        child_key.0[4] = self.depth().wrapping_add(1);
        child_key.0[5..9].copy_from_slice(&hash160(&parent_pubkey.serialize()).0[..4]);
        child_key.0[9..13].copy_from_slice(&index_bytes);
        child_key.0[13..45].copy_from_slice(&result[32..]);
        if is_private {
            let child_secret = self.secret_key()?.add_tweak(&tweak)?;
            child_key.0[46..78].copy_from_slice(&child_secret.secret_bytes());
        } else {
            let child_pubkey = parent_pubkey.add_exp_tweak(secp, &tweak)?;
            child_key.0[45..78].copy_from_slice(&child_pubkey.serialize());
        }
        Ok(child_key)
    }

    /// Derives along a path such as `m/0/0` or `m/44'/0H/1`, relative to this key.
    ///
    /// `m` returns the key itself. Every path must start with `m`.
    ///
    /// # Errors
    /// `Error::BadArgument` for a missing `m` root or a malformed path component.
    pub fn derive_path<C: Signing + Verification>(
        &self,
        path: &str,
        secp: &Secp256k1<C>,
    ) -> Result<ExtendedKey> {
        let rest = match path.trim() {
            "m" => return Ok(self.clone()),
            p => p
                .strip_prefix("m/")
                .ok_or_else(|| Error::BadArgument(format!("Path must start with m: {:?}", p)))?,
        };
        let mut key = self.clone();
        for part in rest.split('/') {
            key = key.derive_child(parse_index(part)?, secp)?;
        }
        Ok(key)
    }
}

fn parse_index(part: &str) -> Result<u32> {
    let bad = || Error::BadArgument(format!("Invalid derivation index: {:?}", part));
    let is_hardened = part.ends_with('H') || part.ends_with('h') || part.ends_with('\'');
    let index: u32 = part
        .trim_end_matches(['H', 'h', '\''])
        .parse()
        .map_err(|_| bad())?;
    if index >= HARDENED_KEY {
        return Err(bad());
    }
    Ok(if is_hardened { index + HARDENED_KEY } else { index })
}

fn hmac_sha512(key: &[u8], data: &[&[u8]]) -> [u8; 64] {
    let mut engine = hmac::HmacEngine::<sha512::Hash>::new(key);
    for d in data {
        engine.input(d);
    }
    hmac::Hmac::<sha512::Hash>::from_engine(engine).to_byte_array()
}

impl Serializable<ExtendedKey> for ExtendedKey {
    fn read(reader: &mut dyn Read) -> Result<ExtendedKey> {
        let mut data = [0u8; 78];
        reader.read_exact(&mut data)?;
        Ok(ExtendedKey(data))
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.0)
    }
}

impl FromStr for ExtendedKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<ExtendedKey> {
        ExtendedKey::decode(s)
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Never print private material
        write!(
            f,
            "ExtendedKey {{ private: {}, depth: {}, child: {} }}",
            self.is_private(),
            self.depth(),
            self.child_number()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SEED: &str = "000102030405060708090a0b0c0d0e0f";

    fn master() -> ExtendedKey {
        ExtendedKey::from_seed(&hex::decode(SEED).unwrap(), Network::Mainnet).unwrap()
    }

    #[test]
    fn bip32_vector_one() -> Result<()> {
        let secp = Secp256k1::new();
        let m = master();
        assert_eq!(
            m.encode(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            m.to_public(&secp)?.encode(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
        assert_eq!(
            m.derive_path("m/0H", &secp)?.encode(),
            "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7"
        );
        assert_eq!(
            m.derive_path("m/0'/1", &secp)?.encode(),
            "xprv9wTYmMFdV23N2TdNG573QoEsfRrWKQgWeibmLntzniatZvR9BmLnvSxqu53Kw1UmYPxLgboyZQaXwTCg8MSY3H2EU4pWcQDnRnrVA1xe8fs"
        );
        Ok(())
    }

    #[test]
    fn non_hardened_paths() -> Result<()> {
        let secp = Secp256k1::new();
        let m = master();
        let payment = m.derive_path("m/0/0", &secp)?;
        assert_eq!(
            hex::encode(payment.public_key(&secp)?.serialize()),
            "02756de182c5dd4b717ea87e693006da62dbb3cddaa4a5cad2ed1f5bbab755f0f5"
        );
        let baton = m.derive_path("m/1/0", &secp)?;
        assert_eq!(
            hex::encode(baton.public_key(&secp)?.serialize()),
            "029b393153a1ec68c7af3a98e88aecede3a409f27e698c090540098611c79e05b0"
        );
        assert_eq!(payment.depth(), 2);
        assert_eq!(payment.child_number(), 0);
        // Public derivation agrees with private derivation for normal children
        let xpub = m.to_public(&secp)?;
        assert_eq!(xpub.derive_path("m/0/0", &secp)?, payment.to_public(&secp)?);
        Ok(())
    }

    #[test]
    fn decode_rejects_and_roundtrips() -> Result<()> {
        let m = master();
        assert_eq!(m.encode().parse::<ExtendedKey>()?, m);
        let testnet = ExtendedKey::from_seed(&hex::decode(SEED)?, Network::Testnet)?;
        assert_eq!(
            testnet.encode(),
            "tprv8ZgxMBicQKsPeDgjzdC36fs6bMjGApWDNLR9erAXMs5skhMv36j9MV5ecvfavji5khqjWaWSFhN3YcCUUdiKH6isR4Pwy3U5y5egddBr16m"
        );
        let mut broken = m.encode();
        broken.pop();
        broken.push('j');
        assert!(ExtendedKey::decode(&broken).is_err());
        assert!(ExtendedKey::decode("xprv").is_err());
        Ok(())
    }

    #[test]
    fn bad_paths() {
        let secp = Secp256k1::new();
        let m = master();
        assert!(m.derive_path("m/x", &secp).is_err());
        assert!(m.derive_path("m/0//1", &secp).is_err());
        assert!(m.derive_path("m/2147483648", &secp).is_err());
        let xpub = m.to_public(&secp).unwrap();
        assert!(xpub.derive_path("m/0'", &secp).is_err());
        assert!(xpub.secret_key().is_err());
        assert_eq!(m.derive_path("m", &secp).unwrap(), m);
        // Server-issued paths are rooted
        assert!(m.derive_path("0/1", &secp).is_err());
        assert!(m.derive_path("", &secp).is_err());
        assert!(m.derive_path("M/0", &secp).is_err());
        assert!(m.derive_path("m/", &secp).is_err());
    }
}

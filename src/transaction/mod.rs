//! Transaction signing for Bitcoin SV.
//!
//! Covers the BIP-143 forkid sighash, P2PKH scripts and low-S ECDSA signatures.
//!
//! # Examples
//!
//! Sign a P2PKH input:
//! ```
//! use secp256k1::{PublicKey, Secp256k1, SecretKey};
//! use utxo_custody::messages::{Tx, TxIn};
//! use utxo_custody::transaction::{generate_signature, p2pkh::{create_lock_script, create_unlock_script}, sighash::{sighash, SigHashCache, SIGHASH_ALL, SIGHASH_FORKID}};
//! use utxo_custody::util::hash160;
//!
//! let mut tx = Tx { inputs: vec![TxIn::default()], ..Default::default() };
//! let secret = SecretKey::from_slice(&[1; 32]).unwrap();
//! let public = PublicKey::from_secret_key(&Secp256k1::new(), &secret).serialize();
//!
//! let lock_script = create_lock_script(&hash160(&public));
//! let mut cache = SigHashCache::new();
//! let sighash_type = SIGHASH_ALL | SIGHASH_FORKID;
//! let digest = sighash(&tx, 0, &lock_script.0, 1000, sighash_type, &mut cache).unwrap();
//! let signature = generate_signature(&secret, &digest, sighash_type).unwrap();
//! tx.inputs[0].unlock_script = create_unlock_script(&signature, &public).unwrap();
//! ```

pub mod p2pkh;
pub mod sighash;

use crate::util::{Error, Hash256, Result};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

/// Generates a DER-encoded ECDSA signature over `sighash` with the sighash type byte appended.
///
/// S is normalized to the low half of the curve order.
///
/// # Errors
/// Currently infallible for a valid `SecretKey`; kept fallible to match the other signing calls.
pub fn generate_signature(secret: &SecretKey, sighash: &Hash256, sighash_type: u8) -> Result<Vec<u8>> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(sighash.0);
    let mut signature = secp.sign_ecdsa(&message, secret);
    signature.normalize_s();
    let mut der = signature.serialize_der().to_vec();
    der.push(sighash_type);
    Ok(der)
}

/// Checks a script signature (DER + sighash type byte) against `sighash` and a serialized pubkey.
///
/// Returns `Ok(false)` for a well-formed signature that does not match.
///
/// # Errors
/// `Error::BadData` if the signature is empty, `Error::Secp256k1Error` if the DER or key is malformed.
pub fn verify_signature(sig: &[u8], pubkey: &[u8], sighash: &Hash256) -> Result<bool> {
    let (_, der) = sig
        .split_last()
        .ok_or_else(|| Error::BadData("Empty signature".to_string()))?;
    let mut signature = Signature::from_der(der)?;
    signature.normalize_s();
    let pubkey = PublicKey::from_slice(pubkey)?;
    let message = Message::from_digest(sighash.0);
    Ok(Secp256k1::verification_only().verify_ecdsa(&message, &signature, &pubkey).is_ok())
}

//! Pay-to-Public-Key-Hash (P2PKH) scripts.
//!
//! The lock is `DUP HASH160 <20> EQUALVERIFY CHECKSIG`; the unlock pushes the signature then the pubkey.
use crate::script::op_codes::{OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160, OP_PUSH};
use crate::script::{Script, push_end};
use crate::util::{Error, Hash160, Result};

/// Creates P2PKH lock script (DUP HASH160 [hash] EQUALVERIFY CHECKSIG).
#[must_use]
#[inline]
pub fn create_lock_script(address: &Hash160) -> Script {
    let mut script = Script::new();
    script.append(OP_DUP);
    script.append(OP_HASH160);
    script.append(OP_PUSH + 20);
    script.append_slice(&address.0);
    script.append(OP_EQUALVERIFY);
    script.append(OP_CHECKSIG);
    script
}

/// Creates P2PKH unlock script (push sig + pubkey).
///
/// # Errors
/// Only if a push is too long to encode.
pub fn create_unlock_script(sig: &[u8], public_key: &[u8]) -> Result<Script> {
    let mut script = Script::new();
    script.append_data(sig)?;
    script.append_data(public_key)?;
    Ok(script)
}

/// Checks if script is P2PKH lock (len=25, ops match).
#[must_use]
#[inline]
pub fn check_lock_script(lock_script: &[u8]) -> bool {
    lock_script.len() == 25
        && lock_script[0] == OP_DUP
        && lock_script[1] == OP_HASH160
        && lock_script[2] == OP_PUSH + 20
        && lock_script[23] == OP_EQUALVERIFY
        && lock_script[24] == OP_CHECKSIG
}

/// Checks if script is P2PKH unlock (sig push 9-73B + pubkey 33/65B).
#[must_use]
pub fn check_unlock_script(unlock_script: &[u8]) -> bool {
    if unlock_script.is_empty() {
        return false;
    }
    let sig_len = unlock_script[0];
    if !(OP_PUSH + 9..=OP_PUSH + 73).contains(&sig_len) {
        return false;
    }
    let i = match push_end(0, unlock_script) {
        Some(i) if i < unlock_script.len() => i,
        _ => return false,
    };
    let pk_len = unlock_script[i];
    if pk_len != OP_PUSH + 33 && pk_len != OP_PUSH + 65 {
        return false;
    }
    push_end(i, unlock_script) == Some(unlock_script.len())
}

/// Extracts the pubkey from a P2PKH unlock.
///
/// # Errors
/// `Error::BadData` if the script is not a P2PKH unlock.
pub fn extract_pubkey(unlock_script: &[u8]) -> Result<Vec<u8>> {
    if !check_unlock_script(unlock_script) {
        return Err(Error::BadData("Not P2PKH unlock".to_string()));
    }
    // The signature is a direct push
    let i = 1 + unlock_script[0] as usize;
    Ok(unlock_script[i + 1..].to_vec())
}

/// Extracts hash160 from P2PKH lock.
///
/// # Errors
/// `Error::BadData` if the script is not a P2PKH lock.
pub fn extract_pubkeyhash(lock_script: &[u8]) -> Result<Hash160> {
    if !check_lock_script(lock_script) {
        return Err(Error::BadData("Not P2PKH lock".to_string()));
    }
    let mut hash160 = Hash160([0; 20]);
    hash160.0.copy_from_slice(&lock_script[3..23]);
    Ok(hash160)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::op_codes::OP_1;

    #[test]
    fn lock_script() {
        let hash = Hash160([5; 20]);
        let s = create_lock_script(&hash);
        assert!(check_lock_script(&s.0));
        assert_eq!(extract_pubkeyhash(&s.0).unwrap(), hash);
        let mut bad = s.clone();
        bad.0[24] = OP_1;
        assert!(!check_lock_script(&bad.0));
        assert!(extract_pubkeyhash(&bad.0).is_err());
        assert!(!check_lock_script(&s.0[..24]));
    }

    #[test]
    fn unlock_script() {
        let sig = [8u8; 71];
        let pk = [2u8; 33];
        let s = create_unlock_script(&sig, &pk).unwrap();
        assert!(check_unlock_script(&s.0));
        assert_eq!(extract_pubkey(&s.0).unwrap(), pk.to_vec());
        // Pubkey push cut short by one byte
        let short = &s.0[..s.len() - 1];
        assert!(!check_unlock_script(short));
        assert!(extract_pubkey(short).is_err());
        // Signature push running past the end
        assert!(!check_unlock_script(&s.0[..40]));
        // Trailing byte after the pubkey
        let mut long = s.0.clone();
        long.push(0);
        assert!(!check_unlock_script(&long));
        assert!(!check_unlock_script(&[]));
        let uncompressed = create_unlock_script(&sig, &[4u8; 65]).unwrap();
        assert!(check_unlock_script(&uncompressed.0));
    }
}

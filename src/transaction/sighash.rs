//! Transaction sighash computation (BIP-143 with forkid).
//!
//! Every signing mode in this crate carries `SIGHASH_FORKID`, so only the BIP-143 algorithm is
//! implemented. The preimage is exposed on its own for the order-lock template.
//! Cache intermediates when signing several inputs of the same tx.

use crate::messages::Tx;
use crate::util::{Error, Hash256, Result, Serializable, sha256d, var_int};
use byteorder::{LittleEndian, WriteBytesExt};

const FORK_ID: u32 = 0; // 24-bit BSV fork ID

/// Signs all outputs.
pub const SIGHASH_ALL: u8 = 0x01;
/// Signs no outputs (anyone spend).
pub const SIGHASH_NONE: u8 = 0x02;
/// Signs only matching output.
pub const SIGHASH_SINGLE: u8 = 0x03;
/// Anyone can add inputs.
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;
/// BSV/BCH fork flag (post-2017).
pub const SIGHASH_FORKID: u8 = 0x40;

/// Computes sighash digest for signing.
///
/// # Errors
/// Input out-of-range; `Error::Unsupported` without `SIGHASH_FORKID`.
///
/// # Examples
/// ```
/// use utxo_custody::messages::{Tx, TxIn};
/// use utxo_custody::transaction::sighash::{sighash, SigHashCache, SIGHASH_ALL, SIGHASH_FORKID};
/// let tx = Tx { inputs: vec![TxIn::default()], ..Default::default() };
/// let mut cache = SigHashCache::new();
/// let digest = sighash(&tx, 0, &[], 1000, SIGHASH_ALL | SIGHASH_FORKID, &mut cache).unwrap();
/// assert_eq!(digest.0.len(), 32);
/// ```
pub fn sighash(
    tx: &Tx,
    n_input: usize,
    script_code: &[u8],
    satoshis: i64,
    sighash_type: u8,
    cache: &mut SigHashCache,
) -> Result<Hash256> {
    let preimage = sighash_preimage(tx, n_input, script_code, satoshis, sighash_type, cache)?;
    Ok(sha256d(&preimage))
}

/// Cache for sighash intermediates (prevouts/sequences/outputs).
///
/// Only valid for one transaction; reuse across its inputs.
#[derive(Default, Debug, Clone)]
pub struct SigHashCache {
    hash_prevouts: Option<Hash256>,
    hash_sequence: Option<Hash256>,
    hash_outputs: Option<Hash256>,
}

impl SigHashCache {
    /// Creates a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// BIP-143 preimage (post-2017, forkid), the bytes that are double-hashed into the sighash.
///
/// Serializes: version | hash_prevouts | hash_sequence | outpoint | script | value | sequence |
/// hash_outputs | locktime | type|FORK_ID<<8.
///
/// # Errors
/// Input out-of-range; `Error::Unsupported` without `SIGHASH_FORKID`.
pub fn sighash_preimage(
    tx: &Tx,
    n_input: usize,
    script_code: &[u8],
    satoshis: i64,
    sighash_type: u8,
    cache: &mut SigHashCache,
) -> Result<Vec<u8>> {
    if sighash_type & SIGHASH_FORKID == 0 {
        return Err(Error::Unsupported("Sighash without SIGHASH_FORKID".to_string()));
    }
    if n_input >= tx.inputs.len() {
        return Err(Error::BadArgument("Input index out of range".to_string()));
    }
    let mut s = Vec::with_capacity(160 + script_code.len());
    let base_type = sighash_type & 0x1f;
    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;
    // 1. nVersion
    s.write_u32::<LittleEndian>(tx.version)?;
    // 2. hashPrevouts
    if !anyone_can_pay {
        let hash_prevouts = match cache.hash_prevouts {
            Some(h) => h,
            None => {
                let mut prevouts = Vec::with_capacity(36 * tx.inputs.len());
                for input in &tx.inputs {
                    input.prev_output.write(&mut prevouts)?;
                }
                let h = sha256d(&prevouts);
                cache.hash_prevouts = Some(h);
                h
            }
        };
        s.extend_from_slice(&hash_prevouts.0);
    } else {
        s.extend_from_slice(&[0u8; 32]);
    }
    // 3. hashSequence
    if !anyone_can_pay && base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
        let hash_sequence = match cache.hash_sequence {
            Some(h) => h,
            None => {
                let mut sequences = Vec::with_capacity(4 * tx.inputs.len());
                for input in &tx.inputs {
                    sequences.write_u32::<LittleEndian>(input.sequence)?;
                }
                let h = sha256d(&sequences);
                cache.hash_sequence = Some(h);
                h
            }
        };
        s.extend_from_slice(&hash_sequence.0);
    } else {
        s.extend_from_slice(&[0u8; 32]);
    }
    // 4. outpoint
    tx.inputs[n_input].prev_output.write(&mut s)?;
    // 5. scriptCode len + code
    var_int::write(script_code.len() as u64, &mut s)?;
    s.extend_from_slice(script_code);
    // 6. value
    s.write_i64::<LittleEndian>(satoshis)?;
    // 7. nSequence
    s.write_u32::<LittleEndian>(tx.inputs[n_input].sequence)?;
    // 8. hashOutputs
    if base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
        let hash_outputs = match cache.hash_outputs {
            Some(h) => h,
            None => {
                let mut outputs = Vec::with_capacity(tx.outputs.iter().map(|o| o.size()).sum());
                for out in &tx.outputs {
                    out.write(&mut outputs)?;
                }
                let h = sha256d(&outputs);
                cache.hash_outputs = Some(h);
                h
            }
        };
        s.extend_from_slice(&hash_outputs.0);
    } else if base_type == SIGHASH_SINGLE && n_input < tx.outputs.len() {
        let mut single_out = Vec::with_capacity(tx.outputs[n_input].size());
        tx.outputs[n_input].write(&mut single_out)?;
        s.extend_from_slice(&sha256d(&single_out).0);
    } else {
        s.extend_from_slice(&[0u8; 32]);
    }
    // 9. nLockTime
    s.write_u32::<LittleEndian>(tx.lock_time)?;
    // 10. sighash_type
    s.write_u32::<LittleEndian>((FORK_ID << 8) | (sighash_type as u32))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::messages::{OutPoint, TxIn, TxOut};
    use crate::script::Script;
    use crate::transaction::p2pkh;
    use pretty_assertions::assert_eq;

    fn vector_tx() -> Result<Tx> {
        let addr: Address = "mfmKD4cP6Na7T8D87XRSiR7shA1HNGSaec".parse()?;
        Ok(Tx {
            version: 2,
            inputs: vec![TxIn {
                prev_output: OutPoint {
                    hash: Hash256::decode("f671dc000ad12795e86b59b27e0c367d9b026bbd4141c227b9285867a53bb6f7")?,
                    index: 0,
                },
                unlock_script: Script(vec![]),
                sequence: 0,
            }],
            outputs: vec![
                TxOut {
                    satoshis: 100,
                    lock_script: p2pkh::create_lock_script(&addr.hash160),
                },
                TxOut {
                    satoshis: 259899900,
                    lock_script: p2pkh::create_lock_script(&addr.hash160),
                },
            ],
            lock_time: 0,
        })
    }

    #[test]
    fn bip143_sighash_test() -> Result<()> {
        let lock_script = hex::decode("76a91402b74813b047606b4b3fbdfb1a6e8e053fdb8dab88ac")?;
        let tx = vector_tx()?;
        let mut cache = SigHashCache::new();
        let sighash_type = SIGHASH_ALL | SIGHASH_FORKID;
        let digest = sighash(&tx, 0, &lock_script, 260000000, sighash_type, &mut cache)?;
        let expected = "1e2121837829018daf3aeadab76f1a542c49a3600ded7bd74323ee74ce0d840c";
        assert_eq!(digest.0.to_vec(), hex::decode(expected)?);
        assert!(cache.hash_prevouts.is_some());
        assert!(cache.hash_sequence.is_some());
        assert!(cache.hash_outputs.is_some());
        Ok(())
    }

    #[test]
    fn preimage_layout_for_single_anyonecanpay() -> Result<()> {
        let lock_script = hex::decode("76a91402b74813b047606b4b3fbdfb1a6e8e053fdb8dab88ac")?;
        let tx = vector_tx()?;
        let mut cache = SigHashCache::new();
        let flags = SIGHASH_SINGLE | SIGHASH_ANYONECANPAY | SIGHASH_FORKID;
        let preimage = sighash_preimage(&tx, 0, &lock_script, 260000000, flags, &mut cache)?;
        // version(4) + 2 * 32 + outpoint(36) + varint(1) + script(25) + value(8) + seq(4) + 32 + 4 + 4
        assert_eq!(preimage.len(), 4 + 64 + 36 + 1 + 25 + 8 + 4 + 32 + 4 + 4);
        assert_eq!(&preimage[4..68], &[0u8; 64][..]);
        let mut out0 = Vec::new();
        tx.outputs[0].write(&mut out0)?;
        assert_eq!(&preimage[142..174], &sha256d(&out0).0[..]);
        assert_eq!(&preimage[preimage.len() - 4..], &[0xc3, 0, 0, 0]);
        assert!(cache.hash_prevouts.is_none());
        Ok(())
    }

    #[test]
    fn none_commits_to_no_outputs() -> Result<()> {
        let tx = vector_tx()?;
        let flags = SIGHASH_NONE | SIGHASH_FORKID;
        let a = sighash_preimage(&tx, 0, &[], 1, flags, &mut SigHashCache::new())?;
        let mut other = tx.clone();
        other.outputs.pop();
        let b = sighash_preimage(&other, 0, &[], 1, flags, &mut SigHashCache::new())?;
        assert_eq!(a, b);
        assert_ne!(&a[4..36], &[0u8; 32][..]);
        Ok(())
    }

    #[test]
    fn rejects_legacy_and_out_of_range() -> Result<()> {
        let tx = vector_tx()?;
        let mut cache = SigHashCache::new();
        assert!(matches!(sighash(&tx, 0, &[], 0, SIGHASH_ALL, &mut cache), Err(Error::Unsupported(_))));
        assert!(matches!(
            sighash(&tx, 1, &[], 0, SIGHASH_ALL | SIGHASH_FORKID, &mut cache),
            Err(Error::BadArgument(_))
        ));
        Ok(())
    }
}

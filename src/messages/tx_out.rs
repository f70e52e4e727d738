//! Transaction output.

use crate::messages::MAX_SCRIPT_LEN;
use crate::script::Script;
use crate::util::{Error, Result, Serializable, var_int};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::{Read, Write};

/// Maximum satoshis (21M BSV).
pub const MAX_SATOSHIS: i64 = 21_000_000 * 100_000_000;

/// Transaction output.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone)]
pub struct TxOut {
    /// Number of satoshis to spend.
    pub satoshis: i64,
    /// Public key script to claim the output.
    pub lock_script: Script,
}

impl TxOut {
    /// Returns the size of the transaction output in bytes.
    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        8 + var_int::size(self.lock_script.0.len() as u64) + self.lock_script.0.len()
    }

    /// Validates the transaction output.
    ///
    /// # Errors
    /// `Error::BadData` if satoshis negative or exceeds MAX_SATOSHIS.
    pub fn validate(&self) -> Result<()> {
        if self.satoshis < 0 {
            return Err(Error::BadData("Negative satoshis".to_string()));
        }
        if self.satoshis > MAX_SATOSHIS {
            return Err(Error::BadData("Satoshis exceeds max".to_string()));
        }
        Ok(())
    }
}

impl Serializable<TxOut> for TxOut {
    fn read(reader: &mut dyn Read) -> Result<TxOut> {
        let satoshis = reader.read_i64::<LittleEndian>()?;
        let script_len = var_int::read(reader)? as usize;
        if script_len > MAX_SCRIPT_LEN {
            return Err(Error::BadData(format!("Lock script too long: {}", script_len)));
        }
        let mut lock_script = vec![0; script_len];
        reader.read_exact(&mut lock_script)?;
        let tx_out = TxOut {
            satoshis,
            lock_script: Script(lock_script),
        };
        tx_out.validate()?;
        Ok(tx_out)
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_i64::<LittleEndian>(self.satoshis)?;
        var_int::write(self.lock_script.0.len() as u64, writer)?;
        writer.write_all(&self.lock_script.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn write_read() {
        let mut v = Vec::new();
        let t = TxOut {
            satoshis: 4400044000,
            lock_script: Script(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 100, 99, 98, 97, 96]),
        };
        t.write(&mut v).unwrap();
        assert_eq!(v.len(), t.size());
        assert_eq!(TxOut::read(&mut Cursor::new(&v)).unwrap(), t);
    }

    #[test]
    fn validate() {
        let t = TxOut {
            satoshis: -1,
            lock_script: Script(vec![1; 100]),
        };
        assert_eq!(t.validate().unwrap_err().to_string(), "Bad data: Negative satoshis");
        let t = TxOut {
            satoshis: MAX_SATOSHIS + 1,
            lock_script: Script(vec![1; 100]),
        };
        assert_eq!(t.validate().unwrap_err().to_string(), "Bad data: Satoshis exceeds max");
    }

    #[test]
    fn read_oversized_script() {
        // 8 satoshi bytes, then a varint claiming a 0xffffffffff-byte script
        let b = hex::decode("00e1f50500000000ffffffffffff000000").unwrap();
        assert!(TxOut::read(&mut Cursor::new(&b)).unwrap_err().to_string().starts_with("Bad data: Lock script too long"));
    }
}

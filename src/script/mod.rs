//! Script byte programs: construction, push encoding and the shape checks the signers need.
//!
//! This crate does not evaluate scripts; it only builds and recognizes them.

pub mod op_codes;

use self::op_codes::{
    MAX_DIRECT_PUSH, OP_FALSE, OP_PUSH, OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4, OP_RETURN,
};
use crate::util::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Transaction script, stored as its serialized bytes.
#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct Script(pub Vec<u8>);

impl Script {
    /// Creates a new empty script.
    #[must_use]
    #[inline]
    pub fn new() -> Script {
        Script(vec![])
    }

    /// Appends a single opcode or data byte.
    #[inline]
    pub fn append(&mut self, byte: u8) {
        self.0.push(byte);
    }

    /// Appends a slice of data verbatim.
    #[inline]
    pub fn append_slice(&mut self, slice: &[u8]) {
        self.0.extend_from_slice(slice);
    }

    /// Appends the opcodes and data to push `data` with the smallest push encoding.
    ///
    /// An empty slice is pushed as `OP_0`.
    ///
    /// # Errors
    /// `Error::BadArgument` if the data is longer than `OP_PUSHDATA4` can describe.
    pub fn append_data(&mut self, data: &[u8]) -> Result<()> {
        let len = data.len();
        match len {
            0 => self.append(OP_FALSE),
            n if n <= MAX_DIRECT_PUSH as usize => self.append(OP_PUSH + n as u8),
            n if n <= 0xff => {
                self.append(OP_PUSHDATA1);
                self.append(n as u8);
            }
            n if n <= 0xffff => {
                self.append(OP_PUSHDATA2);
                self.append_slice(&(n as u16).to_le_bytes());
            }
            n if n <= 0xffffffff => {
                self.append(OP_PUSHDATA4);
                self.append_slice(&(n as u32).to_le_bytes());
            }
            _ => return Err(Error::BadArgument("Data too long to push".to_string())),
        }
        self.append_slice(data);
        Ok(())
    }

    /// Parses a script from its hex form.
    ///
    /// # Errors
    /// `Error::FromHexError` for malformed hex.
    #[inline]
    pub fn from_hex(s: &str) -> Result<Script> {
        Ok(Script(hex::decode(s.trim())?))
    }

    /// Lowercase hex of the script bytes.
    #[must_use]
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Returns whether the script has no bytes.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the script length in bytes.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is a provably unspendable data output: `OP_FALSE OP_RETURN` followed
    /// only by data pushes. A final push cut short by the end of the script still counts.
    #[must_use]
    pub fn is_safe_data_out(&self) -> bool {
        let s = &self.0;
        if s.len() < 2 || s[0] != OP_FALSE || s[1] != OP_RETURN {
            return false;
        }
        let mut i = 2;
        while i < s.len() {
            if !is_data_push(s[i]) {
                return false;
            }
            // A truncated push still reads as a data chunk running to the end
            i = next_op(i, s);
        }
        true
    }
}

#[inline]
fn is_data_push(op: u8) -> bool {
    (1..=OP_PUSHDATA4).contains(&op)
}

/// Index just past the push starting at `i`, without clamping to the script length.
///
/// `None` when the length prefix itself is cut off.
#[must_use]
pub fn push_end(i: usize, script: &[u8]) -> Option<usize> {
    let op = script[i];
    match op {
        len @ 1..=MAX_DIRECT_PUSH => Some(i + 1 + len as usize),
        OP_PUSHDATA1 => script.get(i + 1).map(|l| i + 2 + *l as usize),
        OP_PUSHDATA2 => script
            .get(i + 1..i + 3)
            .map(|l| i + 3 + u16::from_le_bytes([l[0], l[1]]) as usize),
        OP_PUSHDATA4 => script
            .get(i + 1..i + 5)
            .map(|l| i + 5 + u32::from_le_bytes([l[0], l[1], l[2], l[3]]) as usize),
        _ => Some(i + 1),
    }
}

/// Gets the next operation index in the script, or the script length if at the end
#[must_use]
pub fn next_op(i: usize, script: &[u8]) -> usize {
    if i >= script.len() {
        return script.len();
    }
    match push_end(i, script) {
        Some(end) if end <= script.len() => end,
        _ => script.len(),
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

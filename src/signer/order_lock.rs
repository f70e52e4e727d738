//! Unlocking scripts for the order-lock escrow template.
//!
//! The template accepts two unlock shapes, picked by the spending transaction's output 0:
//!
//! * Cancel (output 0 is an `OP_FALSE OP_RETURN` data output):
//!   `<preimage NONE|FORKID> <outpoints of inputs 2..> OP_TRUE`
//! * Fill (anything else):
//!   `<preimage SINGLE|ANYONECANPAY|FORKID> <00> OP_FALSE`
//!
//! The preimage is always for input 0, with the order-lock script as script code.

use crate::messages::Tx;
use crate::script::Script;
use crate::script::op_codes::{OP_FALSE, OP_TRUE};
use crate::transaction::sighash::{
    SIGHASH_ANYONECANPAY, SIGHASH_FORKID, SIGHASH_NONE, SIGHASH_SINGLE, SigHashCache, sighash_preimage,
};
use crate::util::{Error, Result, Serializable};
use regex::Regex;

/// Index of the input that spends the order lock.
pub const ORDER_LOCK_INPUT: usize = 0;
/// Inputs before this index are control inputs, left out of the cancel commitment.
pub const CANCEL_PREVOUTS_FROM: usize = 2;

/// Recognizes order-lock scripts by a regular expression over their lowercase hex.
#[derive(Debug, Clone)]
pub struct OrderLockPattern(Regex);

impl OrderLockPattern {
    /// Compiles the pattern.
    ///
    /// # Errors
    /// `Error::RegexError` for an invalid expression.
    pub fn new(pattern: &str) -> Result<OrderLockPattern> {
        Ok(OrderLockPattern(Regex::new(pattern)?))
    }

    /// Whether `script` is an order lock.
    #[must_use]
    pub fn matches(&self, script: &Script) -> bool {
        self.0.is_match(&script.to_hex())
    }
}

/// The two ways to spend an order lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLockSpend {
    /// The seller takes the locked output back
    Cancel,
    /// A buyer pays the asking price
    Fill,
}

impl OrderLockSpend {
    /// Classifies by output 0 alone.
    ///
    /// # Errors
    /// `Error::BadData` if the transaction has no outputs.
    pub fn classify(tx: &Tx) -> Result<OrderLockSpend> {
        let first = tx
            .outputs
            .first()
            .ok_or_else(|| Error::BadData("Order-lock spend has no outputs".to_string()))?;
        Ok(if first.lock_script.is_safe_data_out() {
            OrderLockSpend::Cancel
        } else {
            OrderLockSpend::Fill
        })
    }

    /// Sighash flags committed to by this path.
    #[must_use]
    pub fn sighash_type(&self) -> u8 {
        match self {
            OrderLockSpend::Cancel => SIGHASH_FORKID | SIGHASH_NONE,
            OrderLockSpend::Fill => SIGHASH_FORKID | SIGHASH_SINGLE | SIGHASH_ANYONECANPAY,
        }
    }
}

/// Builds the unlock for input 0 spending `lock_script` worth `satoshis`.
///
/// Depends only on the transaction and the previous output, so repeated calls give the same
/// script.
///
/// # Errors
/// `Error::BadData` for a transaction without inputs or outputs.
pub fn unlock(tx: &Tx, lock_script: &Script, satoshis: i64) -> Result<(OrderLockSpend, Script)> {
    if tx.inputs.is_empty() {
        return Err(Error::BadData("Order-lock spend has no inputs".to_string()));
    }
    let spend = OrderLockSpend::classify(tx)?;
    let mut cache = SigHashCache::new();
    let preimage = sighash_preimage(
        tx,
        ORDER_LOCK_INPUT,
        &lock_script.0,
        satoshis,
        spend.sighash_type(),
        &mut cache,
    )?;

    let mut script = Script::new();
    script.append_data(&preimage)?;
    match spend {
        OrderLockSpend::Cancel => {
            let mut prevouts = Vec::new();
            for input in tx.inputs.iter().skip(CANCEL_PREVOUTS_FROM) {
                input.prev_output.write(&mut prevouts)?;
            }
            script.append_data(&prevouts)?;
            script.append(OP_TRUE);
        }
        OrderLockSpend::Fill => {
            script.append_data(&[0])?;
            script.append(OP_FALSE);
        }
    }
    Ok((spend, script))
}

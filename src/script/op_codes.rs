//! Script opcodes used by the lock and unlock templates in this crate.
//!
//! # Examples
//! ```
//! use utxo_custody::script::op_codes::*;
//! assert_eq!(OP_TRUE, 81);
//! ```

// Pushdata and constants
/// Pushes empty array (0/false) onto the stack.
pub const OP_0: u8 = 0;
/// Pushes empty array (0/false) onto the stack.
pub const OP_FALSE: u8 = 0;
/// Offset for direct pushes of 1-75 bytes (`OP_PUSH + n`).
pub const OP_PUSH: u8 = 0;
/// Largest length that is pushed directly by its own opcode.
pub const MAX_DIRECT_PUSH: u8 = 75;
/// Next byte is push length (up to 255 bytes).
pub const OP_PUSHDATA1: u8 = 76;
/// Next two bytes are push length (up to 65535 bytes).
pub const OP_PUSHDATA2: u8 = 77;
/// Next four bytes are push length (up to 4GB).
pub const OP_PUSHDATA4: u8 = 78;
/// Pushes 1 (true) onto the stack.
pub const OP_1: u8 = 81;
/// Pushes 1 (true) onto the stack.
pub const OP_TRUE: u8 = 81;

// Flow control
/// Ends execution; marks provably unspendable data outputs.
pub const OP_RETURN: u8 = 106;

// Stack, comparison and crypto
/// Duplicates the top stack item.
pub const OP_DUP: u8 = 118;
/// Pushes 1 if the top two items are equal.
pub const OP_EQUAL: u8 = 135;
/// OP_EQUAL followed by OP_VERIFY.
pub const OP_EQUALVERIFY: u8 = 136;
/// Replaces the top item with its RIPEMD160(SHA256) hash.
pub const OP_HASH160: u8 = 169;
/// Verifies a signature against a public key and the sighash.
pub const OP_CHECKSIG: u8 = 172;

//! Signed control messages exchanged with the account service.

mod signed_message;

pub use self::signed_message::{MAGIC_BYTES, SignedMessage};

//! Wallet keys: BIP-32 extended keys, key pairs and the script-indexed key registry.

mod extended_key;
mod key_pair;
mod registry;

pub use self::extended_key::{
    ExtendedKey, HARDENED_KEY, MAINNET_PRIVATE_EXTENDED_KEY, MAINNET_PUBLIC_EXTENDED_KEY,
    TESTNET_PRIVATE_EXTENDED_KEY, TESTNET_PUBLIC_EXTENDED_KEY,
};
pub use self::key_pair::KeyPair;
pub use self::registry::{BATON_PATH, KeyRegistry, PAYMENT_PATH};

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*! # UTXO Custody

Custodial signing for Bitcoin SV wallet identities. Maps previous-output scripts to keys through
a BIP-32 derivation registry, signs every input it owns, builds the fill and cancel unlocks of the
order-lock escrow template, and authenticates calls to the account service with signed messages.

## Usage
```no_run
use utxo_custody::client::{AccountClient, RestBlockchain};
use utxo_custody::config::Config;
use utxo_custody::signer::{LockingPurse, Owner, Parent};
use utxo_custody::wallet::{ExtendedKey, KeyPair};

# async fn run(rawtx: &str, parents: Vec<Parent>) -> utxo_custody::util::Result<()> {
let config = Config::from_file("custody.json")?;
let identity = KeyPair::from_secret_hex("...")?;
let account = AccountClient::from_config(&config, identity.clone())?;
let owner = Owner::from_config(&config, account, "xprv...".parse::<ExtendedKey>()?)?;
let signed = owner.sign(rawtx, &parents).await?;

let purse = LockingPurse::from_config(&config, identity, RestBlockchain::from_config(&config)?);
println!("{} sats in {}", purse.balance().await?, purse.address());
# let _ = signed;
# Ok(())
# }
```

## Modules
- `signer`: the owner and purse signers and the order-lock unlock builder.
- `wallet`: extended keys, key pairs and the key registry.
- `message`: the signed-message envelope.
- `client`: blockchain, account and payment-gateway adapters.
- `transaction`, `script`, `messages`, `address`, `util`: wire and signing primitives.

## Security
- Keys are never logged or printed by `Debug`.
- Network calls do not retry; check `Error::is_retryable` to decide.
*/

pub mod address;
pub mod client;
pub mod config;
pub mod message;
pub mod messages;
pub mod network;
pub mod script;
pub mod signer;
pub mod transaction;
pub mod util;
pub mod wallet;

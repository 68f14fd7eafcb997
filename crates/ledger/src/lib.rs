//! Supply-capped fungible token ledger.
//!
//! All issuance goes through a single authorized minter; the total supply can
//! never exceed the cap fixed at construction.

pub mod error;
pub mod events;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use events::LedgerEvent;
pub use ledger::{Ledger, TokenMetadata};

//! Notifications emitted by the ledger for external indexers.

use drip_common::{Address, Amount};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Balance movement. `from: None` marks a mint.
    Transfer {
        from: Option<Address>,
        to: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    MinterChanged {
        previous: Address,
        current: Address,
    },
}

impl LedgerEvent {
    /// True when `account` appears in any field of the event.
    pub fn involves(&self, account: &Address) -> bool {
        match self {
            LedgerEvent::Transfer { from, to, .. } => from.as_ref() == Some(account) || to == account,
            LedgerEvent::Approval { owner, spender, .. } => owner == account || spender == account,
            LedgerEvent::MinterChanged { previous, current } => previous == account || current == account,
        }
    }

    pub fn is_mint(&self) -> bool {
        matches!(self, LedgerEvent::Transfer { from: None, .. })
    }
}

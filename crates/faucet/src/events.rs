//! Events emitted by committed calls

use drip_common::{Address, Amount, Timestamp};
use drip_ledger::LedgerEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Both contracts were created and bound together
    Deployed {
        deployer: Address,
        ledger: Address,
        dispenser: Address,
    },
    /// Emitted by the ledger (mint, transfer, approval, minter rebinding)
    Ledger(LedgerEvent),
    TokensClaimed {
        account: Address,
        amount: Amount,
        timestamp: Timestamp,
    },
    /// Emitted on every successful `set_paused`, even if the flag did not change
    FaucetPaused { paused: bool },
}

impl Event {
    pub fn involves(&self, account: &Address) -> bool {
        match self {
            Event::Deployed { deployer, ledger, dispenser } => {
                deployer == account || ledger == account || dispenser == account
            }
            Event::Ledger(event) => event.involves(account),
            Event::TokensClaimed { account: claimer, .. } => claimer == account,
            Event::FaucetPaused { .. } => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Deployed { .. } => "Deployed",
            Event::Ledger(LedgerEvent::Transfer { .. }) => "Transfer",
            Event::Ledger(LedgerEvent::Approval { .. }) => "Approval",
            Event::Ledger(LedgerEvent::MinterChanged { .. }) => "MinterChanged",
            Event::TokensClaimed { .. } => "TokensClaimed",
            Event::FaucetPaused { .. } => "FaucetPaused",
        }
    }
}

impl From<LedgerEvent> for Event {
    fn from(event: LedgerEvent) -> Self {
        Event::Ledger(event)
    }
}

/// Journal entry: an event with its commit sequence number and time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub timestamp: Timestamp,
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involves() {
        let a = Address([1u8; 20]);
        let b = Address([2u8; 20]);

        let claimed = Event::TokensClaimed { account: a, amount: 10, timestamp: 1 };
        assert!(claimed.involves(&a));
        assert!(!claimed.involves(&b));

        let mint = Event::from(LedgerEvent::Transfer { from: None, to: b, amount: 10 });
        assert!(mint.involves(&b));
        assert_eq!(mint.name(), "Transfer");

        assert!(!Event::FaucetPaused { paused: true }.involves(&a));
    }
}

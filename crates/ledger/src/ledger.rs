//! Capped token ledger state and operations

use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use drip_common::types::DECIMALS;
use drip_common::{Address, Amount, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Token name, symbol and decimals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: DECIMALS,
        }
    }
}

/// Supply-capped balance table.
///
/// Every mutating method validates before it writes, so a returned error
/// always means nothing changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    address: Address,
    metadata: TokenMetadata,
    owner: Address,
    authorized_minter: Address,
    max_supply: Amount,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<Address, HashMap<Address, Amount>>,
}

impl Ledger {
    /// Create an empty ledger. `owner` is the deployer; `minter` may be a
    /// placeholder until [`Ledger::set_authorized_minter`] rebinds it.
    pub fn new(
        address: Address,
        metadata: TokenMetadata,
        owner: Address,
        minter: Address,
        max_supply: Amount,
    ) -> Self {
        info!(
            "Ledger {} created: {} ({}), max supply {}, minter {}",
            address, metadata.name, metadata.symbol, max_supply, minter
        );
        Self {
            address,
            metadata,
            owner,
            authorized_minter: minter,
            max_supply,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// Mint `amount` new units to `account`. Only the authorized minter may call.
    pub fn issue(&mut self, caller: Address, account: Address, amount: Amount) -> LedgerResult<LedgerEvent> {
        if caller != self.authorized_minter {
            return Err(LedgerError::Unauthorized(Role::Minter));
        }
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        let available = self.remaining_supply();
        if amount > available {
            return Err(LedgerError::SupplyExceeded { requested: amount, available });
        }

        *self.balances.entry(account).or_default() += amount;
        self.total_supply += amount;

        debug!("Issued {} to {}, total supply {}", amount, account, self.total_supply);
        Ok(LedgerEvent::Transfer { from: None, to: account, amount })
    }

    /// Rebind the sole minter. Owner only; repeatable.
    pub fn set_authorized_minter(&mut self, caller: Address, new_minter: Address) -> LedgerResult<LedgerEvent> {
        if caller != self.owner {
            return Err(LedgerError::Unauthorized(Role::Owner));
        }

        let previous = std::mem::replace(&mut self.authorized_minter, new_minter);
        info!("Ledger {} minter changed: {} -> {}", self.address, previous, new_minter);
        Ok(LedgerEvent::MinterChanged { previous, current: new_minter })
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> LedgerResult<LedgerEvent> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance { balance, needed: amount });
        }

        self.balances.insert(from, balance - amount);
        *self.balances.entry(to).or_default() += amount;

        debug!("Transfer {} from {} to {}", amount, from, to);
        Ok(LedgerEvent::Transfer { from: Some(from), to, amount })
    }

    /// Set (not add to) the amount `spender` may move out of `owner`'s balance.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> LedgerResult<LedgerEvent> {
        if spender.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        self.allowances.entry(owner).or_default().insert(spender, amount);
        Ok(LedgerEvent::Approval { owner, spender, amount })
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> LedgerResult<LedgerEvent> {
        let allowance = self.allowance(&from, &spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance { allowance, needed: amount });
        }

        let event = self.transfer(from, to, amount)?;
        self.allowances.entry(from).or_default().insert(spender, allowance - amount);
        Ok(event)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn max_supply(&self) -> Amount {
        self.max_supply
    }

    /// Units that can still be issued before the cap is hit.
    pub fn remaining_supply(&self) -> Amount {
        self.max_supply - self.total_supply
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn authorized_minter(&self) -> Address {
        self.authorized_minter
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn holders(&self) -> usize {
        self.balances.values().filter(|b| **b > 0).count()
    }

    /// Sum of all balances; always equal to `total_supply`.
    pub fn circulating(&self) -> Amount {
        self.balances.values().sum()
    }
}

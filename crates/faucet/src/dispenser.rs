//! Dispenser: cooldown and lifetime-cap gate in front of the ledger's mint

use crate::config::FaucetConfig;
use crate::error::{FaucetError, FaucetResult};
use crate::events::Event;
use drip_common::{Address, Amount, Role, Timestamp};
use drip_ledger::{Ledger, LedgerEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Per-account claim history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub last_claim_at: Timestamp,
    pub total_claimed: Amount,
}

impl ClaimRecord {
    /// Every successful claim adds a non-zero amount, so a zero total means
    /// the account never claimed, whatever `last_claim_at` holds.
    pub fn has_claimed(&self) -> bool {
        self.total_claimed > 0
    }
}

/// Eligibility of an account at a point in time, derived from stored state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimState {
    Eligible,
    CooldownBlocked { retry_at: Timestamp },
    LimitReached,
    Paused,
}

/// A successful claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub account: Address,
    pub amount: Amount,
    pub timestamp: Timestamp,
    pub mint: LedgerEvent,
}

impl Claim {
    pub fn events(&self) -> Vec<Event> {
        vec![
            Event::Ledger(self.mint.clone()),
            Event::TokensClaimed {
                account: self.account,
                amount: self.amount,
                timestamp: self.timestamp,
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispenser {
    address: Address,
    token: Address,
    admin: Address,
    faucet_amount: Amount,
    cooldown_secs: u64,
    max_claim_amount: Amount,
    paused: bool,
    claims: HashMap<Address, ClaimRecord>,
}

impl Dispenser {
    /// Create a dispenser minting through the ledger at `token`, administered by `admin`
    pub fn new(address: Address, token: Address, admin: Address, config: &FaucetConfig) -> Self {
        info!(
            "Dispenser {} created for token {}: {} per claim, cooldown {}s, cap {}",
            address,
            token,
            config.faucet_amount(),
            config.cooldown_secs,
            config.max_claim_amount()
        );
        Self {
            address,
            token,
            admin,
            faucet_amount: config.faucet_amount(),
            cooldown_secs: config.cooldown_secs,
            max_claim_amount: config.max_claim_amount(),
            paused: false,
            claims: HashMap::new(),
        }
    }

    /// Claim the per-request amount for `caller` at time `now`.
    ///
    /// Checks run in a fixed order: pause, lifetime cap, cooldown. The claim
    /// is recorded before the ledger mints; if the mint fails the record is
    /// restored, so the dispenser never counts a claim that moved no tokens.
    pub fn request_tokens(&mut self, ledger: &mut Ledger, caller: Address, now: Timestamp) -> FaucetResult<Claim> {
        if self.paused {
            return Err(FaucetError::FaucetPaused);
        }

        let record = self.record(&caller);
        let amount = self.claimable_amount(&record);
        if amount == 0 {
            debug!("{} has exhausted its lifetime allowance", caller);
            return Err(FaucetError::LifetimeLimitReached);
        }

        if let Some(retry_at) = self.cooldown_until(&record, now) {
            debug!("{} claimed too soon, retry at {}", caller, retry_at);
            return Err(FaucetError::CooldownOrLimitNotElapsed { retry_at });
        }

        let previous = self.claims.insert(
            caller,
            ClaimRecord {
                last_claim_at: now,
                total_claimed: record.total_claimed + amount,
            },
        );

        let mint = match ledger.issue(self.address, caller, amount) {
            Ok(event) => event,
            Err(err) => {
                match previous {
                    Some(record) => self.claims.insert(caller, record),
                    None => self.claims.remove(&caller),
                };
                warn!("Mint for {} failed, claim rolled back: {}", caller, err);
                return Err(err.into());
            }
        };

        info!("{} claimed {} at {}", caller, amount, now);
        Ok(Claim {
            account: caller,
            amount,
            timestamp: now,
            mint,
        })
    }

    /// Toggle the pause flag. Admin only.
    pub fn set_paused(&mut self, caller: Address, paused: bool) -> FaucetResult<Event> {
        if caller != self.admin {
            return Err(FaucetError::Unauthorized(Role::Admin));
        }

        self.paused = paused;
        info!("Faucet {} paused = {}", self.address, paused);
        Ok(Event::FaucetPaused { paused })
    }

    pub fn status(&self, account: &Address, now: Timestamp) -> ClaimState {
        if self.paused {
            return ClaimState::Paused;
        }

        let record = self.record(account);
        if record.total_claimed >= self.max_claim_amount {
            return ClaimState::LimitReached;
        }

        match self.cooldown_until(&record, now) {
            Some(retry_at) => ClaimState::CooldownBlocked { retry_at },
            None => ClaimState::Eligible,
        }
    }

    pub fn can_claim(&self, account: &Address, now: Timestamp) -> bool {
        self.status(account, now) == ClaimState::Eligible
    }

    /// Amount the account may still receive over its lifetime
    pub fn remaining_allowance(&self, account: &Address) -> Amount {
        self.max_claim_amount
            .saturating_sub(self.record(account).total_claimed)
    }

    /// Earliest time the next claim may happen, `None` if never claimed
    pub fn next_claim_at(&self, account: &Address) -> Option<Timestamp> {
        let record = self.record(account);
        record
            .has_claimed()
            .then(|| record.last_claim_at.saturating_add(self.cooldown_secs))
    }

    pub fn last_claim_at(&self, account: &Address) -> Timestamp {
        self.record(account).last_claim_at
    }

    pub fn total_claimed(&self, account: &Address) -> Amount {
        self.record(account).total_claimed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn faucet_amount(&self) -> Amount {
        self.faucet_amount
    }

    pub fn cooldown_time(&self) -> u64 {
        self.cooldown_secs
    }

    pub fn max_claim_amount(&self) -> Amount {
        self.max_claim_amount
    }

    pub fn claimants(&self) -> usize {
        self.claims.len()
    }

    pub fn records(&self) -> impl Iterator<Item = (&Address, &ClaimRecord)> {
        self.claims.iter()
    }

    fn record(&self, account: &Address) -> ClaimRecord {
        self.claims.get(account).copied().unwrap_or_default()
    }

    // Partial amount only when the cap is not a multiple of the per-claim amount
    fn claimable_amount(&self, record: &ClaimRecord) -> Amount {
        self.faucet_amount
            .min(self.max_claim_amount.saturating_sub(record.total_claimed))
    }

    fn cooldown_until(&self, record: &ClaimRecord, now: Timestamp) -> Option<Timestamp> {
        if !record.has_claimed() {
            return None;
        }
        let retry_at = record.last_claim_at.saturating_add(self.cooldown_secs);
        (now < retry_at).then_some(retry_at)
    }
}

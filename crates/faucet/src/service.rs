//! Faucet service: hosts the ledger and dispenser and executes calls atomically

use crate::clock::Clock;
use crate::config::FaucetConfig;
use crate::database::{FaucetDatabase, FaucetStatistics};
use crate::dispenser::{Claim, ClaimState, Dispenser};
use crate::error::{FaucetError, FaucetResult};
use crate::events::{Event, EventRecord};
use crate::metrics::FaucetMetrics;
use drip_common::{Address, Amount, Timestamp};
use drip_ledger::{Ledger, LedgerError, TokenMetadata};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the ledger learns the dispenser's identity at deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStrategy {
    /// Ledger starts with the deployer as placeholder minter, then the
    /// deployer rebinds it to the dispenser.
    TwoPhase,
    /// Ledger is created with the dispenser's precomputed address as minter.
    Precomputed,
}

/// Addresses fixed at deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub deployer: Address,
    pub ledger: Address,
    pub dispenser: Address,
}

/// Everything a call can mutate. Committed as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractState {
    pub deployment: Deployment,
    pub ledger: Ledger,
    pub dispenser: Dispenser,
    pub statistics: FaucetStatistics,
}

/// Serializing host for the two contracts.
///
/// Each mutating method samples the clock once, runs against a working copy
/// of the state and swaps it in only after the call succeeded and, when a
/// database is attached, after the new state and its events were persisted.
/// A failed call therefore leaves no trace: no state change, no events.
pub struct FaucetService {
    config: FaucetConfig,
    clock: Arc<dyn Clock>,
    contracts: Option<ContractState>,
    /// Event journal when running without a database
    journal: Vec<EventRecord>,
    next_seq: u64,
    database: Option<FaucetDatabase>,
    metrics: Option<FaucetMetrics>,
}

impl FaucetService {
    /// Create new faucet service
    pub fn new(config: FaucetConfig, clock: Arc<dyn Clock>) -> FaucetResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            clock,
            contracts: None,
            journal: Vec::new(),
            next_seq: 0,
            database: None,
            metrics: None,
        })
    }

    /// Attach persistent storage, restoring any previously committed state.
    ///
    /// Must be attached before [`FaucetService::deploy`]; a service that
    /// already holds contracts fails with `AlreadyDeployed`.
    pub fn with_database(mut self, database: FaucetDatabase) -> FaucetResult<Self> {
        if self.contracts.is_some() {
            return Err(FaucetError::AlreadyDeployed);
        }

        self.contracts = database.load_state()?;
        self.next_seq = database.next_seq()?;

        match &self.contracts {
            Some(contracts) => info!(
                "Restored deployment: ledger {}, dispenser {}, next event #{}",
                contracts.deployment.ledger, contracts.deployment.dispenser, self.next_seq
            ),
            None => info!("Database holds no deployment yet"),
        }

        self.database = Some(database);
        self.restore_metrics();
        Ok(self)
    }

    /// Attach metrics. Seeded from committed state whichever of
    /// `with_database` and `with_metrics` runs first.
    pub fn with_metrics(mut self, metrics: FaucetMetrics) -> Self {
        self.metrics = Some(metrics);
        self.restore_metrics();
        self
    }

    fn restore_metrics(&self) {
        if let (Some(metrics), Some(contracts)) = (&self.metrics, &self.contracts) {
            metrics.restore(
                &contracts.statistics,
                contracts.ledger.total_supply(),
                contracts.dispenser.is_paused(),
            );
        }
    }

    /// Create the ledger and dispenser and bind the dispenser as sole minter.
    ///
    /// Ledger and dispenser take the deployer's first two contract addresses.
    /// With [`DeployStrategy::TwoPhase`] the placeholder minter exists only
    /// inside this call, never in committed state.
    pub fn deploy(&mut self, deployer: Address, strategy: DeployStrategy) -> FaucetResult<Deployment> {
        if self.contracts.is_some() {
            return Err(FaucetError::AlreadyDeployed);
        }
        if deployer.is_zero() {
            return Err(LedgerError::ZeroAddress.into());
        }

        let now = self.clock.now();
        let deployment = Deployment {
            deployer,
            ledger: Address::contract_address(&deployer, 0),
            dispenser: Address::contract_address(&deployer, 1),
        };
        let metadata = TokenMetadata::new(self.config.token_name.clone(), self.config.token_symbol.clone());

        let mut events = vec![Event::Deployed {
            deployer,
            ledger: deployment.ledger,
            dispenser: deployment.dispenser,
        }];

        let ledger = match strategy {
            DeployStrategy::Precomputed => Ledger::new(
                deployment.ledger,
                metadata,
                deployer,
                deployment.dispenser,
                self.config.max_supply(),
            ),
            DeployStrategy::TwoPhase => {
                let mut ledger = Ledger::new(deployment.ledger, metadata, deployer, deployer, self.config.max_supply());
                events.push(ledger.set_authorized_minter(deployer, deployment.dispenser)?.into());
                ledger
            }
        };
        let dispenser = Dispenser::new(deployment.dispenser, deployment.ledger, deployer, &self.config);

        let contracts = ContractState {
            deployment,
            ledger,
            dispenser,
            statistics: FaucetStatistics::default(),
        };
        self.commit(contracts, events, now)?;
        info!("Deployed with {:?}: ledger {}, dispenser {}", strategy, deployment.ledger, deployment.dispenser);
        Ok(deployment)
    }

    /// Claim the faucet amount for `caller`
    pub fn request_tokens(&mut self, caller: Address) -> FaucetResult<Claim> {
        let result = self.execute(|contracts, now| {
            let claim = contracts
                .dispenser
                .request_tokens(&mut contracts.ledger, caller, now)?;
            let first_claim = contracts.dispenser.total_claimed(&caller) == claim.amount;
            contracts.statistics.record_claim(claim.amount, first_claim);
            let events = claim.events();
            Ok((claim, events))
        });

        match &result {
            Ok(claim) => {
                if let (Some(metrics), Some(contracts)) = (&self.metrics, &self.contracts) {
                    metrics.record_claim(claim.amount, contracts.ledger.total_supply());
                }
            }
            Err(err) => {
                warn!("Claim by {} rejected: {}", caller, err);
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejection(err);
                }
            }
        }

        result
    }

    pub fn set_paused(&mut self, caller: Address, paused: bool) -> FaucetResult<()> {
        self.execute(|contracts, _| {
            let event = contracts.dispenser.set_paused(caller, paused)?;
            Ok(((), vec![event]))
        })?;

        if let Some(metrics) = &self.metrics {
            metrics.set_paused(paused);
        }
        Ok(())
    }

    pub fn set_authorized_minter(&mut self, caller: Address, minter: Address) -> FaucetResult<()> {
        self.execute(|contracts, _| {
            let event = contracts.ledger.set_authorized_minter(caller, minter)?;
            Ok(((), vec![event.into()]))
        })
    }

    /// Direct ledger mint. Succeeds only for the authorized minter.
    pub fn issue(&mut self, caller: Address, account: Address, amount: Amount) -> FaucetResult<()> {
        self.execute(|contracts, _| {
            let event = contracts.ledger.issue(caller, account, amount)?;
            Ok(((), vec![event.into()]))
        })
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> FaucetResult<()> {
        self.execute(|contracts, _| {
            let event = contracts.ledger.transfer(from, to, amount)?;
            Ok(((), vec![event.into()]))
        })
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> FaucetResult<()> {
        self.execute(|contracts, _| {
            let event = contracts.ledger.approve(owner, spender, amount)?;
            Ok(((), vec![event.into()]))
        })
    }

    pub fn transfer_from(&mut self, spender: Address, from: Address, to: Address, amount: Amount) -> FaucetResult<()> {
        self.execute(|contracts, _| {
            let event = contracts.ledger.transfer_from(spender, from, to, amount)?;
            Ok(((), vec![event.into()]))
        })
    }

    // --- Reads ---

    pub fn contracts(&self) -> FaucetResult<&ContractState> {
        self.contracts.as_ref().ok_or(FaucetError::NotDeployed)
    }

    pub fn ledger(&self) -> FaucetResult<&Ledger> {
        Ok(&self.contracts()?.ledger)
    }

    pub fn dispenser(&self) -> FaucetResult<&Dispenser> {
        Ok(&self.contracts()?.dispenser)
    }

    pub fn deployment(&self) -> FaucetResult<Deployment> {
        Ok(self.contracts()?.deployment)
    }

    pub fn balance_of(&self, account: &Address) -> FaucetResult<Amount> {
        Ok(self.ledger()?.balance_of(account))
    }

    pub fn can_claim(&self, account: &Address) -> FaucetResult<bool> {
        Ok(self.dispenser()?.can_claim(account, self.clock.now()))
    }

    pub fn remaining_allowance(&self, account: &Address) -> FaucetResult<Amount> {
        Ok(self.dispenser()?.remaining_allowance(account))
    }

    pub fn status(&self, account: &Address) -> FaucetResult<ClaimState> {
        Ok(self.dispenser()?.status(account, self.clock.now()))
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn config(&self) -> &FaucetConfig {
        &self.config
    }

    /// All committed events in sequence order
    pub fn events(&self) -> FaucetResult<Vec<EventRecord>> {
        self.events_since(0)
    }

    pub fn events_since(&self, from: u64) -> FaucetResult<Vec<EventRecord>> {
        match &self.database {
            Some(database) => database.events_since(from),
            None => Ok(self.journal.iter().filter(|record| record.seq >= from).cloned().collect()),
        }
    }

    pub fn events_for(&self, account: &Address) -> FaucetResult<Vec<EventRecord>> {
        match &self.database {
            Some(database) => database.events_for(account),
            None => Ok(self
                .journal
                .iter()
                .filter(|record| record.event.involves(account))
                .cloned()
                .collect()),
        }
    }

    /// Running claim totals; zero before deployment
    pub fn statistics(&self) -> FaucetStatistics {
        self.contracts
            .as_ref()
            .map(|contracts| contracts.statistics)
            .unwrap_or_default()
    }

    pub fn metrics(&self) -> Option<&FaucetMetrics> {
        self.metrics.as_ref()
    }

    /// Run `call` against a working copy and commit it only on success
    fn execute<T, F>(&mut self, call: F) -> FaucetResult<T>
    where
        F: FnOnce(&mut ContractState, Timestamp) -> FaucetResult<(T, Vec<Event>)>,
    {
        let now = self.clock.now();
        let mut working = self.contracts()?.clone();

        let (value, events) = call(&mut working, now)?;
        self.commit(working, events, now)?;
        Ok(value)
    }

    fn commit(&mut self, contracts: ContractState, events: Vec<Event>, now: Timestamp) -> FaucetResult<()> {
        let records: Vec<EventRecord> = events
            .into_iter()
            .enumerate()
            .map(|(i, event)| EventRecord {
                seq: self.next_seq + i as u64,
                timestamp: now,
                event,
            })
            .collect();

        if let Some(database) = &self.database {
            database.commit(&contracts, &records)?;
        }

        for record in &records {
            debug!("Event #{} {}: {:?}", record.seq, record.event.name(), record.event);
        }

        self.next_seq += records.len() as u64;
        self.contracts = Some(contracts);
        if self.database.is_none() {
            self.journal.extend(records);
        }
        Ok(())
    }
}

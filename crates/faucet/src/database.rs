//! Faucet database for persisting contract state and the event journal

use crate::error::{FaucetError, FaucetResult};
use crate::events::EventRecord;
use crate::service::ContractState;
use drip_common::utils::codec::{decode, encode};
use drip_common::{Address, Amount};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;
use tracing::{debug, info};

const STATE_KEY: &[u8] = b"contracts";

/// Faucet database
pub struct FaucetDatabase {
    db: Db,
    /// Tree holding the latest committed contract state
    state: Tree,
    /// Tree for event records, keyed by big-endian sequence number
    events: Tree,
}

impl FaucetDatabase {
    /// Create or open faucet database
    pub fn new<P: AsRef<Path>>(path: P) -> FaucetResult<Self> {
        info!("Opening faucet database at: {}", path.as_ref().display());

        // Every commit flushes itself; a background flusher would hold the
        // file lock past drop and block a reopen of the same path.
        let db = sled::Config::default()
            .path(path)
            .cache_capacity(64 * 1024 * 1024) // 64MB cache
            .flush_every_ms(None)
            .open()?;

        let state = db.open_tree("state")?;
        let events = db.open_tree("events")?;

        Ok(Self { db, state, events })
    }

    /// Write the new state and the events of one call in a single transaction
    pub fn commit(&self, contracts: &ContractState, records: &[EventRecord]) -> FaucetResult<()> {
        let state_bytes = encode(contracts)?;
        let encoded = records
            .iter()
            .map(|record| -> FaucetResult<_> { Ok((record.seq.to_be_bytes(), encode(record)?)) })
            .collect::<FaucetResult<Vec<_>>>()?;

        (&self.state, &self.events)
            .transaction(|(state, events)| {
                state.insert(STATE_KEY, state_bytes.as_slice())?;
                for (key, value) in &encoded {
                    events.insert(key.as_slice(), value.as_slice())?;
                }
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|err| match err {
                TransactionError::Storage(err) => FaucetError::Database(err),
                TransactionError::Abort(()) => FaucetError::Serialization("commit aborted".to_string()),
            })?;

        self.db.flush()?;
        debug!("Committed state with {} event(s)", records.len());
        Ok(())
    }

    /// Latest committed state, `None` before deployment
    pub fn load_state(&self) -> FaucetResult<Option<ContractState>> {
        match self.state.get(STATE_KEY)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All records with `seq >= from`, in commit order
    pub fn events_since(&self, from: u64) -> FaucetResult<Vec<EventRecord>> {
        let mut records = Vec::new();

        for item in self.events.range(from.to_be_bytes()..) {
            let (_, value) = item?;
            records.push(decode(&value)?);
        }

        Ok(records)
    }

    /// Records mentioning `account`, scanned from disk on demand
    pub fn events_for(&self, account: &Address) -> FaucetResult<Vec<EventRecord>> {
        let mut records = Vec::new();

        for item in self.events.iter() {
            let (_, value) = item?;
            let record: EventRecord = decode(&value)?;
            if record.event.involves(account) {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Sequence number the next record will get
    pub fn next_seq(&self) -> FaucetResult<u64> {
        match self.events.last()? {
            Some((key, _)) => {
                let bytes: [u8; 8] = key
                    .as_ref()
                    .try_into()
                    .map_err(|_| FaucetError::Serialization("Invalid event key".to_string()))?;
                Ok(u64::from_be_bytes(bytes) + 1)
            }
            None => Ok(0),
        }
    }

    /// Get statistics from the committed state
    pub fn statistics(&self) -> FaucetResult<FaucetStatistics> {
        Ok(self
            .load_state()?
            .map(|contracts| contracts.statistics)
            .unwrap_or_default())
    }
}

/// Faucet statistics, kept as running totals in the committed state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetStatistics {
    pub total_claims: u64,
    pub unique_claimants: u64,
    pub total_dispensed: Amount,
}

impl FaucetStatistics {
    pub fn record_claim(&mut self, amount: Amount, first_claim: bool) {
        self.total_claims += 1;
        self.total_dispensed += amount;
        if first_claim {
            self.unique_claimants += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use crate::service::{DeployStrategy, FaucetService};
    use crate::{FaucetConfig, ManualClock};
    use std::sync::Arc;

    fn record(seq: u64, account: u8, amount: u128) -> EventRecord {
        EventRecord {
            seq,
            timestamp: 1_700_000_000 + seq,
            event: Event::TokensClaimed {
                account: Address([account; 20]),
                amount,
                timestamp: 1_700_000_000 + seq,
            },
        }
    }

    fn deployed_state() -> ContractState {
        let mut service = FaucetService::new(FaucetConfig::default(), Arc::new(ManualClock::new(1_700_000_000))).unwrap();
        service.deploy(Address([1u8; 20]), DeployStrategy::TwoPhase).unwrap();
        service.contracts().unwrap().clone()
    }

    #[test]
    fn test_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = FaucetDatabase::new(dir.path()).unwrap();

        assert!(db.load_state().unwrap().is_none());
        assert!(db.events_since(0).unwrap().is_empty());
        assert_eq!(db.next_seq().unwrap(), 0);
        assert_eq!(db.statistics().unwrap(), FaucetStatistics::default());
    }

    #[test]
    fn test_commit_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = deployed_state();
        state.statistics.record_claim(10, true);
        state.statistics.record_claim(10, true);
        state.statistics.record_claim(10, false);

        {
            let db = FaucetDatabase::new(dir.path()).unwrap();
            db.commit(&state, &[record(0, 7, 10), record(1, 8, 10)]).unwrap();
            db.commit(&state, &[record(2, 7, 10)]).unwrap();
        }

        let db = FaucetDatabase::new(dir.path()).unwrap();
        assert_eq!(db.load_state().unwrap(), Some(state));
        assert_eq!(db.next_seq().unwrap(), 3);

        let tail = db.events_since(1).unwrap();
        assert_eq!(tail.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![1, 2]);

        let mine = db.events_for(&Address([7u8; 20])).unwrap();
        assert_eq!(mine.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![0, 2]);

        let stats = db.statistics().unwrap();
        assert_eq!(stats.total_claims, 3);
        assert_eq!(stats.unique_claimants, 2);
        assert_eq!(stats.total_dispensed, 30);
    }

    #[test]
    fn test_reopen_immediately_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let state = deployed_state();

        for seq in 0..5 {
            let db = FaucetDatabase::new(dir.path()).unwrap();
            db.commit(&state, &[record(seq, 7, 10)]).unwrap();
        }

        let db = FaucetDatabase::new(dir.path()).unwrap();
        assert_eq!(db.next_seq().unwrap(), 5);
    }

    #[test]
    fn test_sequence_order_survives_byte_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let db = FaucetDatabase::new(dir.path()).unwrap();
        let state = deployed_state();

        let records: Vec<_> = (250..260).map(|seq| record(seq, 1, 1)).collect();
        db.commit(&state, &records).unwrap();

        let seqs: Vec<u64> = db.events_since(0).unwrap().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, (250..260).collect::<Vec<_>>());
        assert_eq!(db.next_seq().unwrap(), 260);
    }
}

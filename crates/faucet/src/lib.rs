//! Rate-limited token faucet.
//!
//! The dispenser mints a fixed amount per claim through the capped ledger,
//! subject to:
//! - a per-account cooldown between claims
//! - a per-account lifetime cap
//! - an admin-controlled pause flag
//!
//! [`FaucetService`] hosts both contracts and executes every call atomically.

pub mod clock;
pub mod config;
pub mod database;
pub mod dispenser;
pub mod error;
pub mod events;
pub mod metrics;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FaucetConfig;
pub use database::{FaucetDatabase, FaucetStatistics};
pub use dispenser::{Claim, ClaimRecord, ClaimState, Dispenser};
pub use error::{ErrorKind, FaucetError, FaucetResult};
pub use events::{Event, EventRecord};
pub use metrics::FaucetMetrics;
pub use service::{ContractState, DeployStrategy, Deployment, FaucetService};

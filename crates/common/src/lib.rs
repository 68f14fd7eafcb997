pub mod error;
pub mod types;
pub mod utils;

pub use error::{DripError, Result};
pub use types::{Address, Amount, Role, Timestamp};

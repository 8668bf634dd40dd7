pub mod address_list;
pub mod config;
pub mod error;
pub mod events;
pub mod id;
pub mod ledger;
pub mod ownership;
pub mod sheets;

/// Token quantity in base units
pub type Amount = u128;

/// Monotonic host height used for time-locks
pub type BlockHeight = u64;

// Re-export the main types for convenience
pub use address_list::{AddressList, ListDirectory};
pub use config::{ControllerConfig, HostConfig, LedgerConfig, DEFAULT_MINT_DELAY};
pub use error::{LedgerError, LedgerResult};
pub use events::LedgerEvent;
pub use id::AccountId;
pub use ledger::{compute_fee, Ledger, ListBinding};
pub use ownership::{CapabilityHolder, Claimable};
pub use sheets::{AllowanceSheet, BalanceSheet};

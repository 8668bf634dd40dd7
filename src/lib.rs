//! TrueVND
//!
//! A permissioned value ledger governed by a time-locked mint controller.
//! This crate re-exports all the components of the system.

pub use truevnd_controller::{ControllerEvent, MintRequest, TimeLockedController};
pub use truevnd_core::{
    AccountId, AddressList, AllowanceSheet, Amount, BalanceSheet, BlockHeight, CapabilityHolder,
    Claimable, ControllerConfig, HostConfig, Ledger, LedgerConfig, LedgerError, LedgerEvent,
    LedgerResult, ListBinding, ListDirectory,
};
pub use truevnd_runtime::{Call, CallHash, CallOutput, CallReceipt, Host, HostEvent};

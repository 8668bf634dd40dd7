use crate::id::AccountId;
use crate::BlockHeight;
use thiserror::Error;

/// Represents all possible errors raised by the ledger, its lists and the controller
///
/// Every error is raised before any state is touched, so a failed operation
/// leaves the ledger exactly as it was.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The caller lacks the role or capability the operation requires
    #[error("Unauthorized: {0} may not perform this operation")]
    Unauthorized(AccountId),

    /// Unknown request id or resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// The mint request has already been finalized
    #[error("Mint request {0} is already finalized")]
    AlreadyFinalized(u64),

    /// The observation window has not elapsed yet
    #[error("Too early: request becomes final at height {ready_at}, current height is {current}")]
    TooEarly {
        ready_at: BlockHeight,
        current: BlockHeight,
    },

    /// Value-moving transfers are suspended
    #[error("Ledger is paused")]
    Paused,

    #[error("Insufficient funds: {account} holds {available}, needs {required}")]
    InsufficientFunds {
        account: AccountId,
        available: u128,
        required: u128,
    },

    #[error("Insufficient allowance: {available} approved, {required} required")]
    InsufficientAllowance { available: u128, required: u128 },

    /// The account is on the deny list
    #[error("Account {0} is denied")]
    Denied(AccountId),

    /// Mint or burn target is not on the corresponding allow list
    #[error("Account {0} is not on the required allow list")]
    NotOnAllowList(AccountId),

    /// The ledger has not been bound to its sheets or lists yet
    #[error("Ledger is not wired: missing {0}")]
    NotWired(&'static str),

    #[error("Invalid fee {numerator}/{denominator}")]
    InvalidFee { numerator: u128, denominator: u128 },

    #[error("Arithmetic overflow")]
    Overflow,

    /// The host height counter only moves forward
    #[error("Height may not decrease from {current} to {requested}")]
    HeightRegression {
        current: BlockHeight,
        requested: BlockHeight,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

/// Result alias used across the workspace
pub type LedgerResult<T> = Result<T, LedgerError>;

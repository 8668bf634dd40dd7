use serde::{Deserialize, Serialize};

use truevnd_core::{AccountId, Amount, BlockHeight};

/// Observable effects of successful controller operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerEvent {
    MintRequested {
        id: u64,
        target: AccountId,
        amount: Amount,
        requested_at: BlockHeight,
    },
    MintFinalized {
        id: u64,
        target: AccountId,
        amount: Amount,
        finalized_at: BlockHeight,
    },
    AdminshipTransferred {
        previous: AccountId,
        new_admin: AccountId,
    },
    LedgerBound(AccountId),
}

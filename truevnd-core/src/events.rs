use serde::{Deserialize, Serialize};

use crate::id::AccountId;
use crate::Amount;

/// Observable effects of successful ledger operations
///
/// The ledger buffers events while an operation runs; the host drains them
/// into the receipt of the call that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Issued { target: AccountId, amount: Amount },
    Reduced { account: AccountId, amount: Amount },
    /// `amount` is what the recipient received, after fees
    Transferred { from: AccountId, to: AccountId, amount: Amount },
    FeeCharged { payer: AccountId, recipient: AccountId, amount: Amount },
    Approved { owner: AccountId, spender: AccountId, amount: Amount },
    Paused,
    Unpaused,
    DelegateSet(AccountId),
    DelegateRevoked(AccountId),
    FeeRecipientChanged(AccountId),
    FeeChanged { numerator: Amount, denominator: Amount },
    Renamed { name: String, symbol: String },
}

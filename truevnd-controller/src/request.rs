use serde::{Deserialize, Serialize};

use truevnd_core::{AccountId, Amount, BlockHeight};

/// A queued issuance awaiting finalization
///
/// `id` is the request's position in the controller's queue and is never
/// reused. Only `finalized` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    pub id: u64,
    pub target: AccountId,
    pub amount: Amount,
    pub requested_at: BlockHeight,
    pub finalized: bool,
}

impl MintRequest {
    pub fn new(id: u64, target: AccountId, amount: Amount, requested_at: BlockHeight) -> Self {
        Self {
            id,
            target,
            amount,
            requested_at,
            finalized: false,
        }
    }

    /// First height at which a non-owner may finalize, capped at
    /// `BlockHeight::MAX` when that height is unreachable
    pub fn ready_at(&self, delay: BlockHeight) -> BlockHeight {
        self.requested_at.saturating_add(delay)
    }

    /// Whether at least `delay` blocks have passed since the request
    pub fn is_ready(&self, delay: BlockHeight, height: BlockHeight) -> bool {
        height
            .checked_sub(self.requested_at)
            .map_or(false, |elapsed| elapsed >= delay)
    }
}

//! Two-step capability transfer shared by every governed resource

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::id::AccountId;

/// Current holder of a resource plus a single pending-transfer slot
///
/// Authority only moves when the nominated account claims it, so a mistyped
/// or unreachable nominee can never lock the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityHolder {
    current: AccountId,
    pending: Option<AccountId>,
}

impl CapabilityHolder {
    pub fn new(initial_holder: AccountId) -> Self {
        Self {
            current: initial_holder,
            pending: None,
        }
    }

    pub fn current(&self) -> AccountId {
        self.current
    }

    pub fn pending(&self) -> Option<AccountId> {
        self.pending
    }

    pub fn is_holder(&self, caller: &AccountId) -> bool {
        self.current == *caller
    }

    /// Fail with `Unauthorized` unless `caller` is the current holder
    pub fn ensure_holder(&self, caller: &AccountId) -> LedgerResult<()> {
        if self.is_holder(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(*caller))
        }
    }

    /// Nominate `new_holder`; authority stays where it is until claimed.
    /// A later nomination replaces an unclaimed one.
    pub fn initiate_transfer(&mut self, new_holder: AccountId, caller: &AccountId) -> LedgerResult<()> {
        self.ensure_holder(caller)?;
        self.pending = Some(new_holder);
        Ok(())
    }

    /// Complete a transfer; only the nominated account may call this
    pub fn claim(&mut self, caller: &AccountId) -> LedgerResult<()> {
        match self.pending {
            Some(pending) if pending == *caller => {
                self.current = pending;
                self.pending = None;
                Ok(())
            }
            _ => Err(LedgerError::Unauthorized(*caller)),
        }
    }
}

/// A resource whose authority is held through a [`CapabilityHolder`]
///
/// Ledgers, address lists, sheets and controllers all implement this, so the
/// controller can take over or hand off any of them through one code path.
pub trait Claimable {
    /// Identifier of the resource itself
    fn resource_id(&self) -> AccountId;

    fn capability(&self) -> &CapabilityHolder;

    fn capability_mut(&mut self) -> &mut CapabilityHolder;

    fn holder(&self) -> AccountId {
        self.capability().current()
    }

    fn pending_holder(&self) -> Option<AccountId> {
        self.capability().pending()
    }

    fn transfer_ownership(&mut self, new_holder: AccountId, caller: &AccountId) -> LedgerResult<()> {
        let resource = self.resource_id();
        self.capability_mut().initiate_transfer(new_holder, caller)?;
        info!("{} nominated {} as holder of {}", caller, new_holder, resource);
        Ok(())
    }

    fn claim_ownership(&mut self, caller: &AccountId) -> LedgerResult<()> {
        let resource = self.resource_id();
        self.capability_mut().claim(caller)?;
        info!("{} claimed {}", caller, resource);
        Ok(())
    }
}

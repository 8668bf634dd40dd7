//! Time-locked mint controller
//!
//! The controller sits between the operators and a ledger it holds. The owner
//! (through the embedded capability holder) can do anything immediately; the
//! admin can only queue mint requests and finalize them once the mint delay
//! has elapsed on the host's height counter.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use truevnd_core::{
    AccountId, AddressList, Amount, BlockHeight, CapabilityHolder, Claimable, ControllerConfig,
    Ledger, LedgerError, LedgerResult, ListDirectory,
};

use crate::events::ControllerEvent;
use crate::request::MintRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeLockedController {
    id: AccountId,
    ownership: CapabilityHolder,
    admin: AccountId,
    requests: Vec<MintRequest>,
    mint_delay: BlockHeight,
    ledger: Option<AccountId>,
    #[serde(skip)]
    events: Vec<ControllerEvent>,
}

impl TimeLockedController {
    /// Create a controller owned by `owner`, who also starts out as admin
    pub fn new(id: AccountId, owner: AccountId, config: &ControllerConfig) -> Self {
        Self {
            id,
            ownership: CapabilityHolder::new(owner),
            admin: owner,
            requests: Vec::new(),
            mint_delay: config.mint_delay,
            ledger: None,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn current_owner(&self) -> AccountId {
        self.ownership.current()
    }

    pub fn current_admin(&self) -> AccountId {
        self.admin
    }

    pub fn mint_delay(&self) -> BlockHeight {
        self.mint_delay
    }

    pub fn bound_ledger(&self) -> Option<AccountId> {
        self.ledger
    }

    pub fn request_count(&self) -> u64 {
        self.requests.len() as u64
    }

    pub fn request_at(&self, id: u64) -> LedgerResult<&MintRequest> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.requests.get(index))
            .ok_or_else(|| LedgerError::NotFound(format!("mint request {}", id)))
    }

    /// Requests that have not been finalized yet, oldest first
    pub fn pending_requests(&self) -> impl Iterator<Item = &MintRequest> {
        self.requests.iter().filter(|request| !request.finalized)
    }

    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Roles ----

    /// Replace the admin immediately; the old admin loses finalize rights on
    /// every pending request.
    pub fn transfer_adminship(&mut self, new_admin: AccountId, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        let previous = std::mem::replace(&mut self.admin, new_admin);
        info!("{} admin {} -> {}", self.id, previous, new_admin);
        self.events.push(ControllerEvent::AdminshipTransferred { previous, new_admin });
        Ok(())
    }

    pub fn bind_ledger(&mut self, ledger: AccountId, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.ledger = Some(ledger);
        info!("{} bound to ledger {}", self.id, ledger);
        self.events.push(ControllerEvent::LedgerBound(ledger));
        Ok(())
    }

    // ---- Issuance ----

    pub fn request_issue(
        &mut self,
        target: AccountId,
        amount: Amount,
        caller: &AccountId,
        height: BlockHeight,
    ) -> LedgerResult<u64> {
        self.ensure_admin(caller)?;

        let id = self.request_count();
        self.requests.push(MintRequest::new(id, target, amount, height));

        info!("{} mint request {}: {} to {} at height {}", self.id, id, amount, target, height);
        self.events.push(ControllerEvent::MintRequested {
            id,
            target,
            amount,
            requested_at: height,
        });
        Ok(id)
    }

    /// Carry out request `id` against the bound ledger
    ///
    /// The owner may finalize at any time. Anyone else must be the admin at
    /// the moment of finalization and the mint delay must have elapsed since
    /// the request was made. The request is only marked finalized once the
    /// ledger has accepted the issuance.
    pub fn finalize_issue<D: ListDirectory + ?Sized>(
        &mut self,
        id: u64,
        caller: &AccountId,
        height: BlockHeight,
        ledger: &mut Ledger,
        lists: &D,
    ) -> LedgerResult<()> {
        let request = self.request_at(id)?;
        if request.finalized {
            return Err(LedgerError::AlreadyFinalized(id));
        }
        if !self.ownership.is_holder(caller) {
            self.ensure_admin(caller)?;
            if !request.is_ready(self.mint_delay, height) {
                return Err(LedgerError::TooEarly {
                    ready_at: request.ready_at(self.mint_delay),
                    current: height,
                });
            }
        }
        self.ensure_bound(ledger)?;

        let (target, amount) = (request.target, request.amount);
        ledger.issue(lists, target, amount, &self.id)?;

        // request_at succeeded above, so the index is in range
        if let Some(request) = self.requests.get_mut(id as usize) {
            request.finalized = true;
        }
        info!("{} finalized mint request {} at height {}", self.id, id, height);
        self.events.push(ControllerEvent::MintFinalized {
            id,
            target,
            amount,
            finalized_at: height,
        });
        Ok(())
    }

    // ---- Capabilities ----

    /// Claim a resource that has nominated this controller as its next holder
    pub fn claim_capability(&self, resource: &mut dyn Claimable, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        resource.claim_ownership(&self.id)
    }

    /// Nominate `new_holder` for a resource this controller holds
    pub fn release_capability(
        &self,
        resource: &mut dyn Claimable,
        new_holder: AccountId,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        resource.transfer_ownership(new_holder, &self.id)
    }

    // ---- Governance passthroughs ----

    /// Add or remove `account` on a list held by this controller
    pub fn update_list(
        &self,
        list: &mut AddressList,
        account: AccountId,
        present: bool,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        if !self.ownership.is_holder(caller) {
            self.ensure_admin(caller)?;
        }
        debug!("{} updating list {} for {}", self.id, list.id(), account);
        list.set_membership(account, present, &self.id)
    }

    pub fn rename_list(&self, list: &mut AddressList, name: &str, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        list.rename(name, &self.id)
    }

    pub fn pause_ledger(&self, ledger: &mut Ledger, caller: &AccountId) -> LedgerResult<()> {
        self.owner_on_ledger(ledger, caller)?;
        ledger.set_paused(true, &self.id)
    }

    pub fn unpause_ledger(&self, ledger: &mut Ledger, caller: &AccountId) -> LedgerResult<()> {
        self.owner_on_ledger(ledger, caller)?;
        ledger.set_paused(false, &self.id)
    }

    pub fn set_ledger_delegate(
        &self,
        ledger: &mut Ledger,
        delegate: AccountId,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.owner_on_ledger(ledger, caller)?;
        ledger.set_delegate(delegate, &self.id)
    }

    pub fn revoke_ledger_delegate(
        &self,
        ledger: &mut Ledger,
        delegate: AccountId,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.owner_on_ledger(ledger, caller)?;
        ledger.revoke_delegate(delegate, &self.id)
    }

    pub fn set_ledger_fee_recipient(
        &self,
        ledger: &mut Ledger,
        recipient: AccountId,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.owner_on_ledger(ledger, caller)?;
        ledger.set_fee_recipient(recipient, &self.id)
    }

    pub fn set_ledger_fee(
        &self,
        ledger: &mut Ledger,
        numerator: Amount,
        denominator: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.owner_on_ledger(ledger, caller)?;
        ledger.set_transfer_fee(numerator, denominator, &self.id)
    }

    pub fn rename_ledger(
        &self,
        ledger: &mut Ledger,
        name: &str,
        symbol: &str,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.owner_on_ledger(ledger, caller)?;
        ledger.rename(name, symbol, &self.id)
    }

    // ---- Internals ----

    fn ensure_admin(&self, caller: &AccountId) -> LedgerResult<()> {
        if self.admin == *caller {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(*caller))
        }
    }

    fn ensure_bound(&self, ledger: &Ledger) -> LedgerResult<()> {
        match self.ledger {
            None => Err(LedgerError::NotWired("ledger")),
            Some(bound) if bound == ledger.id() => Ok(()),
            Some(_) => Err(LedgerError::NotFound(format!("ledger {} is not bound to {}", ledger.id(), self.id))),
        }
    }

    fn owner_on_ledger(&self, ledger: &Ledger, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.ensure_bound(ledger)
    }
}

impl Claimable for TimeLockedController {
    fn resource_id(&self) -> AccountId {
        self.id
    }

    fn capability(&self) -> &CapabilityHolder {
        &self.ownership
    }

    fn capability_mut(&mut self) -> &mut CapabilityHolder {
        &mut self.ownership
    }
}

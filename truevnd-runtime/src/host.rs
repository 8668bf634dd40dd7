//! In-memory host environment
//!
//! The host owns every constructed instance, keeps the height counter and
//! serializes calls. Each call runs to completion against the registry and
//! leaves a [`CallReceipt`] behind, whether it succeeded or not.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context};
use log::{debug, info, warn};

use truevnd_controller::{MintRequest, TimeLockedController};
use truevnd_core::{
    AccountId, AddressList, AllowanceSheet, Amount, BalanceSheet, BlockHeight, Claimable, HostConfig,
    Ledger, LedgerError, LedgerResult, ListBinding,
};

use crate::call::{Call, CallOutput};
use crate::receipt::{CallHash, CallReceipt, HostEvent};

/// Attempts at deriving a fresh instance id before giving up
const MAX_DERIVATION_ATTEMPTS: usize = 16;

pub struct Host {
    config: HostConfig,
    height: BlockHeight,
    /// Seed for instance id derivation, bumped on every attempt
    nonce: u64,
    lists: HashMap<AccountId, AddressList>,
    balance_sheets: HashMap<AccountId, BalanceSheet>,
    allowance_sheets: HashMap<AccountId, AllowanceSheet>,
    ledgers: HashMap<AccountId, Ledger>,
    controllers: HashMap<AccountId, TimeLockedController>,
    receipts: Vec<CallReceipt>,
}

impl Default for Host {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        info!(
            "Starting host at height {} (mint delay {})",
            config.initial_height, config.controller.mint_delay
        );
        Self {
            height: config.initial_height,
            config,
            nonce: 0,
            lists: HashMap::new(),
            balance_sheets: HashMap::new(),
            allowance_sheets: HashMap::new(),
            ledgers: HashMap::new(),
            controllers: HashMap::new(),
            receipts: Vec::new(),
        }
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = HostConfig::from_json_file(path)
            .with_context(|| format!("Failed to start host from {}", path.display()))?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    // ---- Height ----

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// Move the height forward by `blocks`, returning the new height
    pub fn advance(&mut self, blocks: BlockHeight) -> LedgerResult<BlockHeight> {
        self.height = self.height.checked_add(blocks).ok_or(LedgerError::Overflow)?;
        debug!("Height advanced to {}", self.height);
        Ok(self.height)
    }

    pub fn set_height(&mut self, height: BlockHeight) -> LedgerResult<()> {
        if height < self.height {
            return Err(LedgerError::HeightRegression {
                current: self.height,
                requested: height,
            });
        }
        self.height = height;
        Ok(())
    }

    // ---- Call dispatch ----

    /// Run `call` on behalf of `caller` and return its receipt
    ///
    /// Fails only when the call cannot be hashed; rejected calls still
    /// yield a receipt with `success == false`.
    pub fn execute(&mut self, caller: AccountId, call: Call) -> LedgerResult<CallReceipt> {
        Ok(self.run(caller, call)?.0)
    }

    pub fn receipts(&self) -> &[CallReceipt] {
        &self.receipts
    }

    pub fn receipt(&self, hash: &CallHash) -> Option<&CallReceipt> {
        self.receipts.iter().find(|receipt| receipt.call_hash == *hash)
    }

    fn submit(&mut self, caller: AccountId, call: Call) -> LedgerResult<CallOutput> {
        self.run(caller, call)?.1
    }

    fn run(
        &mut self,
        caller: AccountId,
        call: Call,
    ) -> LedgerResult<(CallReceipt, LedgerResult<CallOutput>)> {
        let sequence = self.receipts.len() as u64;
        let mut receipt = CallReceipt::new(sequence, caller, self.height, &call)?;

        let result = self
            .ensure_signer(&caller)
            .and_then(|()| self.apply(&caller, &call));
        receipt.events = self.collect_events();
        match &result {
            Ok(output) => {
                debug!("{} by {} succeeded at height {}", call.name(), caller, self.height);
                receipt.output = *output;
            }
            Err(err) => {
                warn!("{} by {} rejected: {}", call.name(), caller, err);
                receipt.set_error(err.to_string());
            }
        }

        self.receipts.push(receipt.clone());
        Ok((receipt, result))
    }

    /// Instances act only through their own logic, never as a call's signer
    fn ensure_signer(&self, caller: &AccountId) -> LedgerResult<()> {
        if self.exists(caller) {
            return Err(LedgerError::Unauthorized(*caller));
        }
        Ok(())
    }

    fn apply(&mut self, caller: &AccountId, call: &Call) -> LedgerResult<CallOutput> {
        match call {
            Call::CreateList { name, deny } => {
                let id = self.derive_instance_id("list", caller)?;
                self.lists.insert(id, AddressList::new(id, name.as_str(), *deny, *caller));
                info!("Created {} list '{}' as {}", if *deny { "deny" } else { "allow" }, name, id);
                Ok(CallOutput::Created(id))
            }
            Call::CreateBalanceSheet => {
                let id = self.derive_instance_id("balance_sheet", caller)?;
                self.balance_sheets.insert(id, BalanceSheet::new(id, *caller));
                info!("Created balance sheet {}", id);
                Ok(CallOutput::Created(id))
            }
            Call::CreateAllowanceSheet => {
                let id = self.derive_instance_id("allowance_sheet", caller)?;
                self.allowance_sheets.insert(id, AllowanceSheet::new(id, *caller));
                info!("Created allowance sheet {}", id);
                Ok(CallOutput::Created(id))
            }
            Call::CreateLedger => {
                let id = self.derive_instance_id("ledger", caller)?;
                self.ledgers.insert(id, Ledger::new(id, *caller, &self.config.ledger));
                info!("Created ledger {} held by {}", id, caller);
                Ok(CallOutput::Created(id))
            }
            Call::CreateController => {
                let id = self.derive_instance_id("controller", caller)?;
                self.controllers
                    .insert(id, TimeLockedController::new(id, *caller, &self.config.controller));
                info!("Created controller {} owned by {}", id, caller);
                Ok(CallOutput::Created(id))
            }

            Call::SetLists { ledger, binding } => {
                for list in [binding.mint_allow, binding.burn_allow, binding.deny, binding.fee_exempt] {
                    if !self.lists.contains_key(&list) {
                        return Err(not_found("address list", &list));
                    }
                }
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.set_lists(*binding, caller)?;
                Ok(CallOutput::None)
            }
            Call::SetBalanceSheet { ledger, sheet } => {
                let target = lookup_mut(&mut self.ledgers, ledger, "ledger")?;
                let adopted = self
                    .balance_sheets
                    .remove(sheet)
                    .ok_or_else(|| not_found("balance sheet", sheet))?;
                match target.set_balance_sheet(adopted.clone(), caller) {
                    Ok(Some(previous)) => {
                        self.balance_sheets.insert(previous.resource_id(), previous);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        self.balance_sheets.insert(*sheet, adopted);
                        return Err(err);
                    }
                }
                Ok(CallOutput::None)
            }
            Call::SetAllowanceSheet { ledger, sheet } => {
                let target = lookup_mut(&mut self.ledgers, ledger, "ledger")?;
                let adopted = self
                    .allowance_sheets
                    .remove(sheet)
                    .ok_or_else(|| not_found("allowance sheet", sheet))?;
                match target.set_allowance_sheet(adopted.clone(), caller) {
                    Ok(Some(previous)) => {
                        self.allowance_sheets.insert(previous.resource_id(), previous);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        self.allowance_sheets.insert(*sheet, adopted);
                        return Err(err);
                    }
                }
                Ok(CallOutput::None)
            }

            Call::TransferOwnership { resource, new_holder } => {
                self.claimable_mut(resource)?.transfer_ownership(*new_holder, caller)?;
                Ok(CallOutput::None)
            }
            Call::ClaimOwnership { resource } => {
                self.claimable_mut(resource)?.claim_ownership(caller)?;
                Ok(CallOutput::None)
            }

            Call::SetMembership { list, account, present } => {
                lookup_mut(&mut self.lists, list, "address list")?.set_membership(*account, *present, caller)?;
                Ok(CallOutput::None)
            }
            Call::RenameList { list, name } => {
                lookup_mut(&mut self.lists, list, "address list")?.rename(name.as_str(), caller)?;
                Ok(CallOutput::None)
            }

            Call::Issue { ledger, target, amount } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.issue(&self.lists, *target, *amount, caller)?;
                Ok(CallOutput::None)
            }
            Call::Reduce { ledger, amount } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.reduce(&self.lists, *amount, caller)?;
                Ok(CallOutput::None)
            }
            Call::Transfer { ledger, to, amount } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.transfer(&self.lists, *caller, *to, *amount, caller)?;
                Ok(CallOutput::None)
            }
            Call::Approve { ledger, spender, amount } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.approve(*caller, *spender, *amount, caller)?;
                Ok(CallOutput::None)
            }
            Call::TransferFrom { ledger, owner, to, amount } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?
                    .transfer_from(&self.lists, *owner, *to, *amount, caller)?;
                Ok(CallOutput::None)
            }
            Call::DelegatedTransfer { ledger, to, amount, from } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?
                    .delegated_transfer(&self.lists, *to, *amount, *from, caller)?;
                Ok(CallOutput::None)
            }
            Call::SetPaused { ledger, paused } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.set_paused(*paused, caller)?;
                Ok(CallOutput::None)
            }
            Call::SetDelegate { ledger, delegate } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.set_delegate(*delegate, caller)?;
                Ok(CallOutput::None)
            }
            Call::RevokeDelegate { ledger, delegate } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.revoke_delegate(*delegate, caller)?;
                Ok(CallOutput::None)
            }
            Call::SetFeeRecipient { ledger, recipient } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.set_fee_recipient(*recipient, caller)?;
                Ok(CallOutput::None)
            }
            Call::SetTransferFee { ledger, numerator, denominator } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.set_transfer_fee(*numerator, *denominator, caller)?;
                Ok(CallOutput::None)
            }
            Call::RenameLedger { ledger, name, symbol } => {
                lookup_mut(&mut self.ledgers, ledger, "ledger")?.rename(name.as_str(), symbol.as_str(), caller)?;
                Ok(CallOutput::None)
            }

            Call::RequestIssue { controller, target, amount } => {
                let height = self.height;
                let id = lookup_mut(&mut self.controllers, controller, "controller")?
                    .request_issue(*target, *amount, caller, height)?;
                Ok(CallOutput::Request(id))
            }
            Call::FinalizeIssue { controller, request } => {
                let height = self.height;
                let acting = lookup_mut(&mut self.controllers, controller, "controller")?;
                let ledger_id = acting.bound_ledger().ok_or(LedgerError::NotWired("ledger"))?;
                let ledger = lookup_mut(&mut self.ledgers, &ledger_id, "ledger")?;
                acting.finalize_issue(*request, caller, height, ledger, &self.lists)?;
                Ok(CallOutput::None)
            }
            Call::TransferAdminship { controller, new_admin } => {
                lookup_mut(&mut self.controllers, controller, "controller")?.transfer_adminship(*new_admin, caller)?;
                Ok(CallOutput::None)
            }
            Call::BindLedger { controller, ledger } => {
                if !self.ledgers.contains_key(ledger) {
                    return Err(not_found("ledger", ledger));
                }
                lookup_mut(&mut self.controllers, controller, "controller")?.bind_ledger(*ledger, caller)?;
                Ok(CallOutput::None)
            }
            Call::ClaimCapability { controller, resource } => {
                self.with_acting_controller(controller, resource, |acting, target| {
                    acting.claim_capability(target, caller)
                })?;
                Ok(CallOutput::None)
            }
            Call::ReleaseCapability { controller, resource, new_holder } => {
                self.with_acting_controller(controller, resource, |acting, target| {
                    acting.release_capability(target, *new_holder, caller)
                })?;
                Ok(CallOutput::None)
            }
            Call::UpdateList { controller, list, account, present } => {
                let acting = lookup(&self.controllers, controller, "controller")?;
                let target = lookup_mut(&mut self.lists, list, "address list")?;
                acting.update_list(target, *account, *present, caller)?;
                Ok(CallOutput::None)
            }
            Call::ControllerRenameList { controller, list, name } => {
                let acting = lookup(&self.controllers, controller, "controller")?;
                let target = lookup_mut(&mut self.lists, list, "address list")?;
                acting.rename_list(target, name, caller)?;
                Ok(CallOutput::None)
            }
            Call::PauseLedger { controller } => {
                let (acting, ledger) = self.controller_and_ledger(controller)?;
                acting.pause_ledger(ledger, caller)?;
                Ok(CallOutput::None)
            }
            Call::UnpauseLedger { controller } => {
                let (acting, ledger) = self.controller_and_ledger(controller)?;
                acting.unpause_ledger(ledger, caller)?;
                Ok(CallOutput::None)
            }
            Call::SetLedgerDelegate { controller, delegate } => {
                let (acting, ledger) = self.controller_and_ledger(controller)?;
                acting.set_ledger_delegate(ledger, *delegate, caller)?;
                Ok(CallOutput::None)
            }
            Call::RevokeLedgerDelegate { controller, delegate } => {
                let (acting, ledger) = self.controller_and_ledger(controller)?;
                acting.revoke_ledger_delegate(ledger, *delegate, caller)?;
                Ok(CallOutput::None)
            }
            Call::SetLedgerFeeRecipient { controller, recipient } => {
                let (acting, ledger) = self.controller_and_ledger(controller)?;
                acting.set_ledger_fee_recipient(ledger, *recipient, caller)?;
                Ok(CallOutput::None)
            }
            Call::SetLedgerFee { controller, numerator, denominator } => {
                let (acting, ledger) = self.controller_and_ledger(controller)?;
                acting.set_ledger_fee(ledger, *numerator, *denominator, caller)?;
                Ok(CallOutput::None)
            }
            Call::RenameLedgerVia { controller, name, symbol } => {
                let (acting, ledger) = self.controller_and_ledger(controller)?;
                acting.rename_ledger(ledger, name, symbol, caller)?;
                Ok(CallOutput::None)
            }
        }
    }

    // ---- Construction ----

    pub fn create_list(&mut self, name: &str, deny: bool, creator: AccountId) -> LedgerResult<AccountId> {
        created(self.submit(
            creator,
            Call::CreateList {
                name: name.to_string(),
                deny,
            },
        )?)
    }

    pub fn create_balance_sheet(&mut self, creator: AccountId) -> LedgerResult<AccountId> {
        created(self.submit(creator, Call::CreateBalanceSheet)?)
    }

    pub fn create_allowance_sheet(&mut self, creator: AccountId) -> LedgerResult<AccountId> {
        created(self.submit(creator, Call::CreateAllowanceSheet)?)
    }

    pub fn create_ledger(&mut self, creator: AccountId) -> LedgerResult<AccountId> {
        created(self.submit(creator, Call::CreateLedger)?)
    }

    pub fn create_controller(&mut self, creator: AccountId) -> LedgerResult<AccountId> {
        created(self.submit(creator, Call::CreateController)?)
    }

    // ---- Wiring ----

    pub fn set_lists(&mut self, ledger: AccountId, binding: ListBinding, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::SetLists { ledger, binding }).map(drop)
    }

    pub fn set_balance_sheet(&mut self, ledger: AccountId, sheet: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::SetBalanceSheet { ledger, sheet }).map(drop)
    }

    pub fn set_allowance_sheet(&mut self, ledger: AccountId, sheet: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::SetAllowanceSheet { ledger, sheet }).map(drop)
    }

    // ---- Capabilities ----

    pub fn transfer_ownership(
        &mut self,
        resource: AccountId,
        new_holder: AccountId,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(caller, Call::TransferOwnership { resource, new_holder }).map(drop)
    }

    pub fn claim_ownership(&mut self, resource: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::ClaimOwnership { resource }).map(drop)
    }

    pub fn claim_capability(&mut self, controller: AccountId, resource: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::ClaimCapability { controller, resource }).map(drop)
    }

    pub fn release_capability(
        &mut self,
        controller: AccountId,
        resource: AccountId,
        new_holder: AccountId,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::ReleaseCapability {
                controller,
                resource,
                new_holder,
            },
        )
        .map(drop)
    }

    pub fn bind_ledger(&mut self, controller: AccountId, ledger: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::BindLedger { controller, ledger }).map(drop)
    }

    // ---- Lists ----

    pub fn set_membership(
        &mut self,
        list: AccountId,
        account: AccountId,
        present: bool,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(caller, Call::SetMembership { list, account, present }).map(drop)
    }

    pub fn rename_list(&mut self, list: AccountId, name: &str, caller: AccountId) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::RenameList {
                list,
                name: name.to_string(),
            },
        )
        .map(drop)
    }

    // ---- Ledger ----

    pub fn issue(&mut self, ledger: AccountId, target: AccountId, amount: Amount, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::Issue { ledger, target, amount }).map(drop)
    }

    pub fn reduce(&mut self, ledger: AccountId, amount: Amount, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::Reduce { ledger, amount }).map(drop)
    }

    /// Transfer from the caller's own balance
    pub fn transfer(&mut self, ledger: AccountId, to: AccountId, amount: Amount, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::Transfer { ledger, to, amount }).map(drop)
    }

    /// Set the allowance the caller grants `spender`
    pub fn approve(&mut self, ledger: AccountId, spender: AccountId, amount: Amount, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::Approve { ledger, spender, amount }).map(drop)
    }

    pub fn transfer_from(
        &mut self,
        ledger: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::TransferFrom {
                ledger,
                owner,
                to,
                amount,
            },
        )
        .map(drop)
    }

    pub fn delegated_transfer(
        &mut self,
        ledger: AccountId,
        to: AccountId,
        amount: Amount,
        from: AccountId,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::DelegatedTransfer {
                ledger,
                to,
                amount,
                from,
            },
        )
        .map(drop)
    }

    pub fn set_paused(&mut self, ledger: AccountId, paused: bool, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::SetPaused { ledger, paused }).map(drop)
    }

    pub fn set_delegate(&mut self, ledger: AccountId, delegate: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::SetDelegate { ledger, delegate }).map(drop)
    }

    pub fn revoke_delegate(&mut self, ledger: AccountId, delegate: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::RevokeDelegate { ledger, delegate }).map(drop)
    }

    pub fn set_fee_recipient(&mut self, ledger: AccountId, recipient: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::SetFeeRecipient { ledger, recipient }).map(drop)
    }

    pub fn set_transfer_fee(
        &mut self,
        ledger: AccountId,
        numerator: Amount,
        denominator: Amount,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::SetTransferFee {
                ledger,
                numerator,
                denominator,
            },
        )
        .map(drop)
    }

    pub fn rename_ledger(&mut self, ledger: AccountId, name: &str, symbol: &str, caller: AccountId) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::RenameLedger {
                ledger,
                name: name.to_string(),
                symbol: symbol.to_string(),
            },
        )
        .map(drop)
    }

    // ---- Controller ----

    pub fn request_issue(
        &mut self,
        controller: AccountId,
        target: AccountId,
        amount: Amount,
        caller: AccountId,
    ) -> LedgerResult<u64> {
        match self.submit(caller, Call::RequestIssue { controller, target, amount })? {
            CallOutput::Request(id) => Ok(id),
            other => Err(unexpected_output(other)),
        }
    }

    pub fn finalize_issue(&mut self, controller: AccountId, request: u64, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::FinalizeIssue { controller, request }).map(drop)
    }

    pub fn transfer_adminship(&mut self, controller: AccountId, new_admin: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::TransferAdminship { controller, new_admin }).map(drop)
    }

    pub fn update_list(
        &mut self,
        controller: AccountId,
        list: AccountId,
        account: AccountId,
        present: bool,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::UpdateList {
                controller,
                list,
                account,
                present,
            },
        )
        .map(drop)
    }

    pub fn pause_ledger(&mut self, controller: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::PauseLedger { controller }).map(drop)
    }

    pub fn unpause_ledger(&mut self, controller: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::UnpauseLedger { controller }).map(drop)
    }

    pub fn set_ledger_delegate(&mut self, controller: AccountId, delegate: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::SetLedgerDelegate { controller, delegate }).map(drop)
    }

    pub fn set_ledger_fee_recipient(
        &mut self,
        controller: AccountId,
        recipient: AccountId,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(caller, Call::SetLedgerFeeRecipient { controller, recipient }).map(drop)
    }

    pub fn revoke_ledger_delegate(&mut self, controller: AccountId, delegate: AccountId, caller: AccountId) -> LedgerResult<()> {
        self.submit(caller, Call::RevokeLedgerDelegate { controller, delegate }).map(drop)
    }

    pub fn set_ledger_fee(
        &mut self,
        controller: AccountId,
        numerator: Amount,
        denominator: Amount,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::SetLedgerFee {
                controller,
                numerator,
                denominator,
            },
        )
        .map(drop)
    }

    pub fn rename_ledger_via(&mut self, controller: AccountId, name: &str, symbol: &str, caller: AccountId) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::RenameLedgerVia {
                controller,
                name: name.to_string(),
                symbol: symbol.to_string(),
            },
        )
        .map(drop)
    }

    pub fn controller_rename_list(
        &mut self,
        controller: AccountId,
        list: AccountId,
        name: &str,
        caller: AccountId,
    ) -> LedgerResult<()> {
        self.submit(
            caller,
            Call::ControllerRenameList {
                controller,
                list,
                name: name.to_string(),
            },
        )
        .map(drop)
    }

    // ---- Observability ----

    pub fn ledger(&self, id: &AccountId) -> Option<&Ledger> {
        self.ledgers.get(id)
    }

    pub fn controller(&self, id: &AccountId) -> Option<&TimeLockedController> {
        self.controllers.get(id)
    }

    pub fn list(&self, id: &AccountId) -> Option<&AddressList> {
        self.lists.get(id)
    }

    pub fn balance_of(&self, ledger: &AccountId, account: &AccountId) -> LedgerResult<Amount> {
        Ok(lookup(&self.ledgers, ledger, "ledger")?.balance_of(account))
    }

    pub fn allowance_of(&self, ledger: &AccountId, owner: &AccountId, spender: &AccountId) -> LedgerResult<Amount> {
        Ok(lookup(&self.ledgers, ledger, "ledger")?.allowance_of(owner, spender))
    }

    pub fn total_supply(&self, ledger: &AccountId) -> LedgerResult<Amount> {
        Ok(lookup(&self.ledgers, ledger, "ledger")?.total_supply())
    }

    pub fn is_paused(&self, ledger: &AccountId) -> LedgerResult<bool> {
        Ok(lookup(&self.ledgers, ledger, "ledger")?.is_paused())
    }

    pub fn on_list(&self, list: &AccountId, account: &AccountId) -> LedgerResult<bool> {
        Ok(lookup(&self.lists, list, "address list")?.on_list(account))
    }

    pub fn request_at(&self, controller: &AccountId, id: u64) -> LedgerResult<MintRequest> {
        lookup(&self.controllers, controller, "controller")?.request_at(id).cloned()
    }

    pub fn current_admin(&self, controller: &AccountId) -> LedgerResult<AccountId> {
        Ok(lookup(&self.controllers, controller, "controller")?.current_admin())
    }

    pub fn current_owner(&self, controller: &AccountId) -> LedgerResult<AccountId> {
        Ok(lookup(&self.controllers, controller, "controller")?.current_owner())
    }

    /// Current holder of any resource, including sheets wired into a ledger
    pub fn holder_of(&self, resource: &AccountId) -> LedgerResult<AccountId> {
        let holder = self
            .lists
            .get(resource)
            .map(|r| r.holder())
            .or_else(|| self.balance_sheets.get(resource).map(|r| r.holder()))
            .or_else(|| self.allowance_sheets.get(resource).map(|r| r.holder()))
            .or_else(|| self.ledgers.get(resource).map(|r| r.holder()))
            .or_else(|| self.controllers.get(resource).map(|r| r.holder()))
            .or_else(|| {
                self.ledgers.values().find_map(|ledger| {
                    ledger
                        .balance_sheet()
                        .filter(|sheet| sheet.resource_id() == *resource)
                        .map(|sheet| sheet.holder())
                        .or_else(|| {
                            ledger
                                .allowance_sheet()
                                .filter(|sheet| sheet.resource_id() == *resource)
                                .map(|sheet| sheet.holder())
                        })
                })
            });
        holder.ok_or_else(|| not_found("resource", resource))
    }

    // ---- Internals ----

    fn derive_instance_id(&mut self, kind: &str, creator: &AccountId) -> LedgerResult<AccountId> {
        for _ in 0..MAX_DERIVATION_ATTEMPTS {
            let nonce = self.nonce;
            self.nonce += 1;
            let nonce_bytes = nonce.to_le_bytes();
            if let Some((id, bump)) = AccountId::try_derive(&[kind.as_bytes(), creator.bytes(), &nonce_bytes]) {
                if !self.exists(&id) {
                    debug!("Derived {} id {} (nonce {}, bump {})", kind, id, nonce, bump);
                    return Ok(id);
                }
            }
        }
        Err(anyhow!("Could not derive an instance id for {}", kind).into())
    }

    fn exists(&self, id: &AccountId) -> bool {
        self.holder_of(id).is_ok()
    }

    /// Any governed resource the host holds directly, by id
    fn claimable_mut(&mut self, id: &AccountId) -> LedgerResult<&mut dyn Claimable> {
        if let Some(list) = self.lists.get_mut(id) {
            return Ok(list);
        }
        if let Some(sheet) = self.balance_sheets.get_mut(id) {
            return Ok(sheet);
        }
        if let Some(sheet) = self.allowance_sheets.get_mut(id) {
            return Ok(sheet);
        }
        if let Some(ledger) = self.ledgers.get_mut(id) {
            return Ok(ledger);
        }
        if let Some(controller) = self.controllers.get_mut(id) {
            return Ok(controller);
        }
        Err(not_found("resource", id))
    }

    /// Run `op` with the controller taken out of the registry, so it can act
    /// on any resource, including another controller.
    fn with_acting_controller<F>(&mut self, controller: &AccountId, resource: &AccountId, op: F) -> LedgerResult<()>
    where
        F: FnOnce(&TimeLockedController, &mut dyn Claimable) -> LedgerResult<()>,
    {
        let acting = self
            .controllers
            .remove(controller)
            .ok_or_else(|| not_found("controller", controller))?;
        let result = self.claimable_mut(resource).and_then(|target| op(&acting, target));
        self.controllers.insert(*controller, acting);
        result
    }

    fn controller_and_ledger(&mut self, controller: &AccountId) -> LedgerResult<(&TimeLockedController, &mut Ledger)> {
        let acting = lookup(&self.controllers, controller, "controller")?;
        let ledger_id = acting.bound_ledger().ok_or(LedgerError::NotWired("ledger"))?;
        let ledger = lookup_mut(&mut self.ledgers, &ledger_id, "ledger")?;
        Ok((acting, ledger))
    }

    fn collect_events(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        for (id, ledger) in self.ledgers.iter_mut() {
            events.extend(ledger.drain_events().into_iter().map(|event| HostEvent::Ledger {
                ledger: *id,
                event,
            }));
        }
        for (id, controller) in self.controllers.iter_mut() {
            events.extend(controller.drain_events().into_iter().map(|event| HostEvent::Controller {
                controller: *id,
                event,
            }));
        }
        events
    }
}

fn lookup<'a, T>(map: &'a HashMap<AccountId, T>, id: &AccountId, kind: &str) -> LedgerResult<&'a T> {
    map.get(id).ok_or_else(|| not_found(kind, id))
}

fn lookup_mut<'a, T>(map: &'a mut HashMap<AccountId, T>, id: &AccountId, kind: &str) -> LedgerResult<&'a mut T> {
    map.get_mut(id).ok_or_else(|| not_found(kind, id))
}

fn not_found(kind: &str, id: &AccountId) -> LedgerError {
    LedgerError::NotFound(format!("{} {}", kind, id))
}

fn created(output: CallOutput) -> LedgerResult<AccountId> {
    match output {
        CallOutput::Created(id) => Ok(id),
        other => Err(unexpected_output(other)),
    }
}

fn unexpected_output(output: CallOutput) -> LedgerError {
    anyhow!("Unexpected call output {:?}", output).into()
}

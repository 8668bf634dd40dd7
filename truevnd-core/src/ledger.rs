//! The permissioned ledger
//!
//! Composes a balance sheet, an allowance sheet and four address lists into
//! the value-transfer engine: issuance, reduction, fee-on-transfer transfers,
//! delegated transfers and pausing. Every public mutator validates all of its
//! preconditions before the first write, so a rejected call changes nothing.

use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::address_list::{AddressList, ListDirectory};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::id::AccountId;
use crate::ownership::{CapabilityHolder, Claimable};
use crate::sheets::{AllowanceSheet, BalanceSheet};
use crate::Amount;

/// The address lists a ledger consults, by identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBinding {
    pub mint_allow: AccountId,
    pub burn_allow: AccountId,
    pub deny: AccountId,
    pub fee_exempt: AccountId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListRole {
    Mint,
    Burn,
    Deny,
    FeeExempt,
}

impl ListRole {
    fn pick(self, binding: &ListBinding) -> AccountId {
        match self {
            ListRole::Mint => binding.mint_allow,
            ListRole::Burn => binding.burn_allow,
            ListRole::Deny => binding.deny,
            ListRole::FeeExempt => binding.fee_exempt,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ListRole::Mint => "mint allow list",
            ListRole::Burn => "burn allow list",
            ListRole::Deny => "deny list",
            ListRole::FeeExempt => "fee exemption list",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    id: AccountId,
    ownership: CapabilityHolder,
    balances: Option<BalanceSheet>,
    allowances: Option<AllowanceSheet>,
    lists: Option<ListBinding>,
    paused: bool,
    fee_recipient: AccountId,
    fee_numerator: Amount,
    fee_denominator: Amount,
    delegates: HashSet<AccountId>,
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    #[serde(skip)]
    events: Vec<LedgerEvent>,
}

impl Ledger {
    /// Create an unwired ledger held by `holder`; fees go to the holder until changed
    pub fn new(id: AccountId, holder: AccountId, config: &LedgerConfig) -> Self {
        Self {
            id,
            ownership: CapabilityHolder::new(holder),
            balances: None,
            allowances: None,
            lists: None,
            paused: false,
            fee_recipient: holder,
            fee_numerator: config.fee_numerator,
            fee_denominator: config.fee_denominator,
            delegates: HashSet::new(),
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            total_supply: 0,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn fee(&self) -> (Amount, Amount) {
        (self.fee_numerator, self.fee_denominator)
    }

    pub fn fee_recipient(&self) -> AccountId {
        self.fee_recipient
    }

    pub fn is_delegate(&self, account: &AccountId) -> bool {
        self.delegates.contains(account)
    }

    pub fn list_binding(&self) -> Option<&ListBinding> {
        self.lists.as_ref()
    }

    pub fn balance_sheet(&self) -> Option<&BalanceSheet> {
        self.balances.as_ref()
    }

    pub fn allowance_sheet(&self) -> Option<&AllowanceSheet> {
        self.allowances.as_ref()
    }

    /// Balance of `account`; zero on an unwired ledger
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.as_ref().map(|sheet| sheet.get(account)).unwrap_or(0)
    }

    pub fn allowance_of(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .as_ref()
            .map(|sheet| sheet.get(owner, spender))
            .unwrap_or(0)
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Wiring ----

    pub fn set_lists(&mut self, binding: ListBinding, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.lists = Some(binding);
        info!("{} bound to lists {:?}", self.id, binding);
        Ok(())
    }

    /// Check that `resource` can be adopted: the caller holds this ledger and
    /// the resource's current holder has nominated the ledger.
    pub fn check_adoption(&self, resource: &dyn Claimable, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        if resource.pending_holder() != Some(self.id) {
            return Err(LedgerError::Unauthorized(self.id));
        }
        Ok(())
    }

    /// Claim `sheet` and bind it, returning the sheet it replaces
    pub fn set_balance_sheet(
        &mut self,
        mut sheet: BalanceSheet,
        caller: &AccountId,
    ) -> LedgerResult<Option<BalanceSheet>> {
        self.check_adoption(&sheet, caller)?;
        sheet.claim_ownership(&self.id)?;
        info!("{} adopted balance sheet {}", self.id, sheet.resource_id());
        Ok(self.balances.replace(sheet))
    }

    /// Claim `sheet` and bind it, returning the sheet it replaces
    pub fn set_allowance_sheet(
        &mut self,
        mut sheet: AllowanceSheet,
        caller: &AccountId,
    ) -> LedgerResult<Option<AllowanceSheet>> {
        self.check_adoption(&sheet, caller)?;
        sheet.claim_ownership(&self.id)?;
        info!("{} adopted allowance sheet {}", self.id, sheet.resource_id());
        Ok(self.allowances.replace(sheet))
    }

    // ---- Supply ----

    /// Mint `amount` to `target`. Only the ledger holder may issue, and only
    /// to accounts the mint list permits. Pausing does not block issuance.
    pub fn issue<D: ListDirectory + ?Sized>(
        &mut self,
        lists: &D,
        target: AccountId,
        amount: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        if !self.resolve(lists, ListRole::Mint)?.permits(&target) {
            return Err(LedgerError::NotOnAllowList(target));
        }
        let supply = self.total_supply.checked_add(amount).ok_or(LedgerError::Overflow)?;

        let ledger = self.id;
        self.balances_mut()?.credit(target, amount, &ledger)?;
        self.total_supply = supply;

        info!("{} issued {} to {}", ledger, amount, target);
        self.events.push(LedgerEvent::Issued { target, amount });
        Ok(())
    }

    /// Burn `amount` from the caller's own balance
    pub fn reduce<D: ListDirectory + ?Sized>(
        &mut self,
        lists: &D,
        amount: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        if !self.resolve(lists, ListRole::Burn)?.permits(caller) {
            return Err(LedgerError::NotOnAllowList(*caller));
        }

        let ledger = self.id;
        self.balances_mut()?.debit(*caller, amount, &ledger)?;
        // A balance never exceeds the supply it is part of
        self.total_supply = self.total_supply.saturating_sub(amount);

        info!("{} reduced {} from {}", ledger, amount, caller);
        self.events.push(LedgerEvent::Reduced {
            account: *caller,
            amount,
        });
        Ok(())
    }

    // ---- Transfers ----

    pub fn transfer<D: ListDirectory + ?Sized>(
        &mut self,
        lists: &D,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        if *caller != from {
            return Err(LedgerError::Unauthorized(*caller));
        }
        self.ensure_transferable(lists, &from, &to)?;
        let fee = self.fee_for(lists, &from, &to, amount)?;
        self.move_funds(from, to, amount, fee)
    }

    pub fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        if *caller != owner {
            return Err(LedgerError::Unauthorized(*caller));
        }
        let ledger = self.id;
        self.allowances_mut()?.approve(owner, spender, amount, &ledger)?;
        self.events.push(LedgerEvent::Approved {
            owner,
            spender,
            amount,
        });
        Ok(())
    }

    /// Spend `amount` of the allowance `owner` granted the caller
    pub fn transfer_from<D: ListDirectory + ?Sized>(
        &mut self,
        lists: &D,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.ensure_transferable(lists, &owner, &to)?;

        let available = self.allowances_ref()?.get(&owner, caller);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                available,
                required: amount,
            });
        }
        self.ensure_funds(&owner, amount)?;
        let fee = self.fee_for(lists, &owner, &to, amount)?;

        let ledger = self.id;
        self.allowances_mut()?.consume(owner, *caller, amount, &ledger)?;
        self.move_funds(owner, to, amount, fee)
    }

    /// Move funds out of `from` on behalf of a relayer registered as delegate.
    /// No allowance is consulted or consumed.
    pub fn delegated_transfer<D: ListDirectory + ?Sized>(
        &mut self,
        lists: &D,
        to: AccountId,
        amount: Amount,
        from: AccountId,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        if !self.delegates.contains(caller) {
            return Err(LedgerError::Unauthorized(*caller));
        }
        self.ensure_transferable(lists, &from, &to)?;
        let fee = self.fee_for(lists, &from, &to, amount)?;
        debug!("delegate {} moving {} from {}", caller, amount, from);
        self.move_funds(from, to, amount, fee)
    }

    /// `floor(amount * numerator / denominator)`, or zero when either party is
    /// fee exempt. Small transfers round down to a zero fee.
    pub fn fee_for<D: ListDirectory + ?Sized>(
        &self,
        lists: &D,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> LedgerResult<Amount> {
        let exempt = self.resolve(lists, ListRole::FeeExempt)?;
        if exempt.permits(from) || exempt.permits(to) {
            return Ok(0);
        }
        compute_fee(amount, self.fee_numerator, self.fee_denominator)
    }

    // ---- Administration ----

    pub fn set_paused(&mut self, paused: bool, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.paused = paused;
        info!("{} {}", self.id, if paused { "paused" } else { "unpaused" });
        self.events.push(if paused {
            LedgerEvent::Paused
        } else {
            LedgerEvent::Unpaused
        });
        Ok(())
    }

    pub fn set_delegate(&mut self, delegate: AccountId, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.delegates.insert(delegate);
        self.events.push(LedgerEvent::DelegateSet(delegate));
        Ok(())
    }

    pub fn revoke_delegate(&mut self, delegate: AccountId, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        if self.delegates.remove(&delegate) {
            self.events.push(LedgerEvent::DelegateRevoked(delegate));
        }
        Ok(())
    }

    pub fn set_fee_recipient(&mut self, recipient: AccountId, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.fee_recipient = recipient;
        self.events.push(LedgerEvent::FeeRecipientChanged(recipient));
        Ok(())
    }

    pub fn set_transfer_fee(
        &mut self,
        numerator: Amount,
        denominator: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        if denominator == 0 || numerator > denominator {
            return Err(LedgerError::InvalidFee {
                numerator,
                denominator,
            });
        }
        self.fee_numerator = numerator;
        self.fee_denominator = denominator;
        self.events.push(LedgerEvent::FeeChanged {
            numerator,
            denominator,
        });
        Ok(())
    }

    pub fn rename(
        &mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.name = name.into();
        self.symbol = symbol.into();
        self.events.push(LedgerEvent::Renamed {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
        });
        Ok(())
    }

    // ---- Internals ----

    fn resolve<'a, D: ListDirectory + ?Sized>(
        &self,
        lists: &'a D,
        role: ListRole,
    ) -> LedgerResult<&'a AddressList> {
        let binding = self.lists.as_ref().ok_or(LedgerError::NotWired("address lists"))?;
        let id = role.pick(binding);
        lists
            .list(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("{} {}", role.label(), id)))
    }

    fn ensure_transferable<D: ListDirectory + ?Sized>(
        &self,
        lists: &D,
        from: &AccountId,
        to: &AccountId,
    ) -> LedgerResult<()> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        let deny = self.resolve(lists, ListRole::Deny)?;
        for account in [from, to] {
            if !deny.permits(account) {
                return Err(LedgerError::Denied(*account));
            }
        }
        Ok(())
    }

    fn ensure_funds(&self, account: &AccountId, amount: Amount) -> LedgerResult<()> {
        let available = self.balances_ref()?.get(account);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *account,
                available,
                required: amount,
            });
        }
        Ok(())
    }

    /// Debit `amount` from `from`, credit `amount - fee` to `to` and `fee` to
    /// the fee recipient.
    fn move_funds(&mut self, from: AccountId, to: AccountId, amount: Amount, fee: Amount) -> LedgerResult<()> {
        let ledger = self.id;
        let recipient = self.fee_recipient;
        let sheet = self.balances_mut()?;

        // The debit is the only step that can fail. Balances sum to the total
        // supply, so crediting back the debited amount cannot overflow.
        sheet.debit(from, amount, &ledger)?;
        sheet.credit(to, amount - fee, &ledger)?;
        if fee > 0 {
            sheet.credit(recipient, fee, &ledger)?;
        }

        debug!("{} -> {}: {} (fee {})", from, to, amount - fee, fee);
        self.events.push(LedgerEvent::Transferred {
            from,
            to,
            amount: amount - fee,
        });
        if fee > 0 {
            self.events.push(LedgerEvent::FeeCharged {
                payer: from,
                recipient,
                amount: fee,
            });
        }
        Ok(())
    }

    fn balances_ref(&self) -> LedgerResult<&BalanceSheet> {
        self.balances.as_ref().ok_or(LedgerError::NotWired("balance sheet"))
    }

    fn balances_mut(&mut self) -> LedgerResult<&mut BalanceSheet> {
        self.balances.as_mut().ok_or(LedgerError::NotWired("balance sheet"))
    }

    fn allowances_ref(&self) -> LedgerResult<&AllowanceSheet> {
        self.allowances.as_ref().ok_or(LedgerError::NotWired("allowance sheet"))
    }

    fn allowances_mut(&mut self) -> LedgerResult<&mut AllowanceSheet> {
        self.allowances.as_mut().ok_or(LedgerError::NotWired("allowance sheet"))
    }
}

impl Claimable for Ledger {
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

/// Floor of `amount * numerator / denominator` without forming the full product
pub fn compute_fee(amount: Amount, numerator: Amount, denominator: Amount) -> LedgerResult<Amount> {
    if denominator == 0 {
        return Err(LedgerError::InvalidFee {
            numerator,
            denominator,
        });
    }
    let whole = (amount / denominator)
        .checked_mul(numerator)
        .ok_or(LedgerError::Overflow)?;
    let part = (amount % denominator)
        .checked_mul(numerator)
        .ok_or(LedgerError::Overflow)?
        / denominator;
    whole.checked_add(part).ok_or(LedgerError::Overflow)
}

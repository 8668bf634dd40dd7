//! Balance and allowance sheets
//!
//! Plain key-value ledgers mutated only by their holder, which in a wired
//! deployment is the ledger instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::id::AccountId;
use crate::ownership::{CapabilityHolder, Claimable};
use crate::Amount;

/// Account → balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheet {
    id: AccountId,
    balances: HashMap<AccountId, Amount>,
    ownership: CapabilityHolder,
}

impl BalanceSheet {
    pub fn new(id: AccountId, holder: AccountId) -> Self {
        Self {
            id,
            balances: HashMap::new(),
            ownership: CapabilityHolder::new(holder),
        }
    }

    pub fn get(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, account: AccountId, amount: Amount, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        let updated = self.get(&account).checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.store(account, updated);
        Ok(())
    }

    pub fn debit(&mut self, account: AccountId, amount: Amount, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        let available = self.get(&account);
        let updated = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                account,
                available,
                required: amount,
            })?;
        self.store(account, updated);
        Ok(())
    }

    /// Sum of every balance on the sheet
    pub fn total(&self) -> Amount {
        self.balances.values().sum()
    }

    /// Number of accounts with a non-zero balance
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    fn store(&mut self, account: AccountId, amount: Amount) {
        if amount == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }
}

impl Claimable for BalanceSheet {
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

/// (owner, spender) → remaining allowance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowanceSheet {
    id: AccountId,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    ownership: CapabilityHolder,
}

impl AllowanceSheet {
    pub fn new(id: AccountId, holder: AccountId) -> Self {
        Self {
            id,
            allowances: HashMap::new(),
            ownership: CapabilityHolder::new(holder),
        }
    }

    pub fn get(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Set the allowance outright; approvals do not accumulate
    pub fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.store(owner, spender, amount);
        Ok(())
    }

    pub fn consume(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
        caller: &AccountId,
    ) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        let available = self.get(&owner, &spender);
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                available,
                required: amount,
            })?;
        self.store(owner, spender, remaining);
        Ok(())
    }

    fn store(&mut self, owner: AccountId, spender: AccountId, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }
}

impl Claimable for AllowanceSheet {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit() {
        let holder = AccountId::from_label("ledger");
        let alice = AccountId::from_label("alice");
        let mut sheet = BalanceSheet::new(AccountId::new([1; 32]), holder);

        sheet.credit(alice, 100, &holder).unwrap();
        sheet.debit(alice, 40, &holder).unwrap();
        assert_eq!(sheet.get(&alice), 60);

        let err = sheet.debit(alice, 61, &holder).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { available: 60, required: 61, .. }
        ));
        assert_eq!(sheet.get(&alice), 60);

        sheet.debit(alice, 60, &holder).unwrap();
        assert_eq!(sheet.get(&alice), 0);
        assert_eq!(sheet.account_count(), 0);
    }

    #[test]
    fn test_balance_sheet_rejects_non_holder() {
        let holder = AccountId::from_label("ledger");
        let alice = AccountId::from_label("alice");
        let mut sheet = BalanceSheet::new(AccountId::new([1; 32]), holder);

        assert!(matches!(
            sheet.credit(alice, 1, &alice),
            Err(LedgerError::Unauthorized(_))
        ));
        assert_eq!(sheet.total(), 0);
    }

    #[test]
    fn test_credit_overflow_leaves_balance() {
        let holder = AccountId::from_label("ledger");
        let alice = AccountId::from_label("alice");
        let mut sheet = BalanceSheet::new(AccountId::new([1; 32]), holder);

        sheet.credit(alice, Amount::MAX, &holder).unwrap();
        assert!(matches!(sheet.credit(alice, 1, &holder), Err(LedgerError::Overflow)));
        assert_eq!(sheet.get(&alice), Amount::MAX);
    }

    #[test]
    fn test_allowance_is_set_not_added() {
        let holder = AccountId::from_label("ledger");
        let owner = AccountId::from_label("owner");
        let spender = AccountId::from_label("spender");
        let mut sheet = AllowanceSheet::new(AccountId::new([2; 32]), holder);

        sheet.approve(owner, spender, 50, &holder).unwrap();
        sheet.approve(owner, spender, 30, &holder).unwrap();
        assert_eq!(sheet.get(&owner, &spender), 30);
        assert_eq!(sheet.get(&spender, &owner), 0);
    }

    #[test]
    fn test_consume_allowance() {
        let holder = AccountId::from_label("ledger");
        let owner = AccountId::from_label("owner");
        let spender = AccountId::from_label("spender");
        let mut sheet = AllowanceSheet::new(AccountId::new([2; 32]), holder);

        sheet.approve(owner, spender, 50, &holder).unwrap();
        sheet.consume(owner, spender, 20, &holder).unwrap();
        assert_eq!(sheet.get(&owner, &spender), 30);

        let err = sheet.consume(owner, spender, 31, &holder).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientAllowance { available: 30, required: 31 }
        ));
        assert!(sheet.consume(owner, spender, 30, &spender).is_err());
        assert_eq!(sheet.get(&owner, &spender), 30);
    }
}

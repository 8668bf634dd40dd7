use std::collections::{HashMap, HashSet};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::id::AccountId;
use crate::ownership::{CapabilityHolder, Claimable};

/// A named set of accounts gating a ledger operation
///
/// The polarity is fixed at construction: on an allow list presence grants
/// permission, on a deny list presence revokes it. The ledger decides what
/// each list means; the list itself only answers membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressList {
    id: AccountId,
    name: String,
    deny_semantics: bool,
    members: HashSet<AccountId>,
    ownership: CapabilityHolder,
}

impl AddressList {
    pub fn new(id: AccountId, name: impl Into<String>, deny_semantics: bool, holder: AccountId) -> Self {
        Self {
            id,
            name: name.into(),
            deny_semantics,
            members: HashSet::new(),
            ownership: CapabilityHolder::new(holder),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_deny_list(&self) -> bool {
        self.deny_semantics
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.members.contains(account)
    }

    /// Alias of [`AddressList::contains`]
    pub fn on_list(&self, account: &AccountId) -> bool {
        self.contains(account)
    }

    /// Whether the list grants its privilege to `account`, honoring polarity
    pub fn permits(&self, account: &AccountId) -> bool {
        self.contains(account) != self.deny_semantics
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add or remove `account`; setting the current state again is a no-op
    pub fn set_membership(&mut self, account: AccountId, present: bool, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;

        let changed = if present {
            self.members.insert(account)
        } else {
            self.members.remove(&account)
        };
        if changed {
            info!("{} {} list '{}'", account, if present { "added to" } else { "removed from" }, self.name);
        }
        Ok(())
    }

    pub fn rename(&mut self, new_name: impl Into<String>, caller: &AccountId) -> LedgerResult<()> {
        self.ownership.ensure_holder(caller)?;
        self.name = new_name.into();
        Ok(())
    }
}

impl Claimable for AddressList {
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

/// Read access to address lists by identifier
///
/// The ledger only references its lists by id; whoever hosts the lists
/// resolves them through this trait.
pub trait ListDirectory {
    fn list(&self, id: &AccountId) -> Option<&AddressList>;
}

impl ListDirectory for HashMap<AccountId, AddressList> {
    fn list(&self, id: &AccountId) -> Option<&AddressList> {
        self.get(id)
    }
}

impl ListDirectory for [AddressList] {
    fn list(&self, id: &AccountId) -> Option<&AddressList> {
        self.iter().find(|list| list.id() == *id)
    }
}

impl ListDirectory for Vec<AddressList> {
    fn list(&self, id: &AccountId) -> Option<&AddressList> {
        self.as_slice().list(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;

    #[test]
    fn test_namable_list() {
        let owner = AccountId::from_label("owner");
        let other = AccountId::from_label("other");
        let mut list = AddressList::new(AccountId::new([9; 32]), "Burn whitelist", false, owner);

        assert_eq!(list.name(), "Burn whitelist");
        assert!(!list.is_deny_list());

        let err = list.rename("fooList", &other).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
        list.rename("fooList", &owner).unwrap();
        assert_eq!(list.name(), "fooList");

        assert!(!list.on_list(&owner));
        list.set_membership(owner, true, &owner).unwrap();
        assert!(list.on_list(&owner));
    }

    #[test]
    fn test_membership_is_idempotent() {
        let owner = AccountId::from_label("owner");
        let member = AccountId::from_label("member");
        let mut list = AddressList::new(AccountId::new([1; 32]), "Blacklist", true, owner);

        list.set_membership(member, true, &owner).unwrap();
        list.set_membership(member, true, &owner).unwrap();
        assert_eq!(list.len(), 1);

        list.set_membership(member, false, &owner).unwrap();
        list.set_membership(member, false, &owner).unwrap();
        assert!(list.is_empty());
        assert!(list.is_deny_list());
    }

    #[test]
    fn test_permits_honors_polarity() {
        let owner = AccountId::from_label("owner");
        let member = AccountId::from_label("member");
        let outsider = AccountId::from_label("outsider");
        let mut allow = AddressList::new(AccountId::new([7; 32]), "Mint whitelist", false, owner);
        let mut deny = AddressList::new(AccountId::new([8; 32]), "Blacklist", true, owner);

        allow.set_membership(member, true, &owner).unwrap();
        deny.set_membership(member, true, &owner).unwrap();

        assert!(allow.permits(&member));
        assert!(!allow.permits(&outsider));
        assert!(!deny.permits(&member));
        assert!(deny.permits(&outsider));
    }

    #[test]
    fn test_non_holder_cannot_change_membership() {
        let owner = AccountId::from_label("owner");
        let other = AccountId::from_label("other");
        let mut list = AddressList::new(AccountId::new([2; 32]), "Mint whitelist", false, owner);

        assert!(list.set_membership(other, true, &other).is_err());
        assert!(!list.contains(&other));
    }

    #[test]
    fn test_membership_follows_claimed_holder() {
        let owner = AccountId::from_label("owner");
        let controller = AccountId::from_label("controller");
        let member = AccountId::from_label("member");
        let mut list = AddressList::new(AccountId::new([3; 32]), "No Fees list", false, owner);

        list.transfer_ownership(controller, &owner).unwrap();
        // Still the old holder until claimed
        list.set_membership(member, true, &owner).unwrap();
        list.claim_ownership(&controller).unwrap();

        assert!(list.set_membership(member, false, &owner).is_err());
        list.set_membership(member, false, &controller).unwrap();
        assert!(!list.contains(&member));
    }

    #[test]
    fn test_directory_lookup() {
        let owner = AccountId::from_label("owner");
        let lists = vec![
            AddressList::new(AccountId::new([4; 32]), "a", false, owner),
            AddressList::new(AccountId::new([5; 32]), "b", true, owner),
        ];

        assert_eq!(lists.list(&AccountId::new([5; 32])).map(|l| l.name()), Some("b"));
        assert!(lists.list(&AccountId::new([6; 32])).is_none());
    }
}

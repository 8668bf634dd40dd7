use serde::{Deserialize, Serialize};

use truevnd_core::{AccountId, Amount, ListBinding};

/// Every mutating operation the host accepts, addressed by instance id
///
/// The caller is not part of the call; the host supplies it alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    // Construction
    CreateList { name: String, deny: bool },
    CreateBalanceSheet,
    CreateAllowanceSheet,
    CreateLedger,
    CreateController,

    // Wiring
    SetLists { ledger: AccountId, binding: ListBinding },
    SetBalanceSheet { ledger: AccountId, sheet: AccountId },
    SetAllowanceSheet { ledger: AccountId, sheet: AccountId },

    // Capabilities on any resource
    TransferOwnership { resource: AccountId, new_holder: AccountId },
    ClaimOwnership { resource: AccountId },

    // Lists, called by their holder
    SetMembership { list: AccountId, account: AccountId, present: bool },
    RenameList { list: AccountId, name: String },

    // Ledger, called directly
    Issue { ledger: AccountId, target: AccountId, amount: Amount },
    Reduce { ledger: AccountId, amount: Amount },
    Transfer { ledger: AccountId, to: AccountId, amount: Amount },
    Approve { ledger: AccountId, spender: AccountId, amount: Amount },
    TransferFrom { ledger: AccountId, owner: AccountId, to: AccountId, amount: Amount },
    DelegatedTransfer { ledger: AccountId, to: AccountId, amount: Amount, from: AccountId },
    SetPaused { ledger: AccountId, paused: bool },
    SetDelegate { ledger: AccountId, delegate: AccountId },
    RevokeDelegate { ledger: AccountId, delegate: AccountId },
    SetFeeRecipient { ledger: AccountId, recipient: AccountId },
    SetTransferFee { ledger: AccountId, numerator: Amount, denominator: Amount },
    RenameLedger { ledger: AccountId, name: String, symbol: String },

    // Controller
    RequestIssue { controller: AccountId, target: AccountId, amount: Amount },
    FinalizeIssue { controller: AccountId, request: u64 },
    TransferAdminship { controller: AccountId, new_admin: AccountId },
    BindLedger { controller: AccountId, ledger: AccountId },
    ClaimCapability { controller: AccountId, resource: AccountId },
    ReleaseCapability { controller: AccountId, resource: AccountId, new_holder: AccountId },
    UpdateList { controller: AccountId, list: AccountId, account: AccountId, present: bool },
    ControllerRenameList { controller: AccountId, list: AccountId, name: String },
    PauseLedger { controller: AccountId },
    UnpauseLedger { controller: AccountId },
    SetLedgerDelegate { controller: AccountId, delegate: AccountId },
    RevokeLedgerDelegate { controller: AccountId, delegate: AccountId },
    SetLedgerFeeRecipient { controller: AccountId, recipient: AccountId },
    SetLedgerFee { controller: AccountId, numerator: Amount, denominator: Amount },
    RenameLedgerVia { controller: AccountId, name: String, symbol: String },
}

impl Call {
    /// Short operation name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Call::CreateList { .. } => "create_list",
            Call::CreateBalanceSheet => "create_balance_sheet",
            Call::CreateAllowanceSheet => "create_allowance_sheet",
            Call::CreateLedger => "create_ledger",
            Call::CreateController => "create_controller",
            Call::SetLists { .. } => "set_lists",
            Call::SetBalanceSheet { .. } => "set_balance_sheet",
            Call::SetAllowanceSheet { .. } => "set_allowance_sheet",
            Call::TransferOwnership { .. } => "transfer_ownership",
            Call::ClaimOwnership { .. } => "claim_ownership",
            Call::SetMembership { .. } => "set_membership",
            Call::RenameList { .. } => "rename_list",
            Call::Issue { .. } => "issue",
            Call::Reduce { .. } => "reduce",
            Call::Transfer { .. } => "transfer",
            Call::Approve { .. } => "approve",
            Call::TransferFrom { .. } => "transfer_from",
            Call::DelegatedTransfer { .. } => "delegated_transfer",
            Call::SetPaused { .. } => "set_paused",
            Call::SetDelegate { .. } => "set_delegate",
            Call::RevokeDelegate { .. } => "revoke_delegate",
            Call::SetFeeRecipient { .. } => "set_fee_recipient",
            Call::SetTransferFee { .. } => "set_transfer_fee",
            Call::RenameLedger { .. } => "rename_ledger",
            Call::RequestIssue { .. } => "request_issue",
            Call::FinalizeIssue { .. } => "finalize_issue",
            Call::TransferAdminship { .. } => "transfer_adminship",
            Call::BindLedger { .. } => "bind_ledger",
            Call::ClaimCapability { .. } => "claim_capability",
            Call::ReleaseCapability { .. } => "release_capability",
            Call::UpdateList { .. } => "update_list",
            Call::ControllerRenameList { .. } => "controller_rename_list",
            Call::PauseLedger { .. } => "pause_ledger",
            Call::UnpauseLedger { .. } => "unpause_ledger",
            Call::SetLedgerDelegate { .. } => "set_ledger_delegate",
            Call::RevokeLedgerDelegate { .. } => "revoke_ledger_delegate",
            Call::SetLedgerFeeRecipient { .. } => "set_ledger_fee_recipient",
            Call::SetLedgerFee { .. } => "set_ledger_fee",
            Call::RenameLedgerVia { .. } => "rename_ledger_via_controller",
        }
    }
}

/// Value returned by a successful call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutput {
    None,
    /// Identifier of a newly constructed instance
    Created(AccountId),
    /// Identifier of a newly queued mint request
    Request(u64),
}

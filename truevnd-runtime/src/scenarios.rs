//! Full deployments driven through the host

use truevnd_controller::ControllerEvent;
use truevnd_core::{AccountId, Amount, HostConfig, LedgerError, LedgerEvent, ListBinding};

use crate::call::Call;
use crate::host::Host;
use crate::receipt::HostEvent;

const DELAY: u64 = 20;

/// 10^18 base units per whole token
const UNIT: Amount = 1_000_000_000_000_000_000;

fn account(index: usize) -> AccountId {
    AccountId::from_label(&format!("account-{}", index))
}

struct Deployment {
    host: Host,
    ledger: AccountId,
    lists: ListBinding,
}

/// Lists, sheets and a ledger created and wired by `account(0)`
fn deploy(mint_delay: u64) -> Deployment {
    let mut config = HostConfig::default();
    config.controller.mint_delay = mint_delay;
    let mut host = Host::new(config);
    let deployer = account(0);

    let lists = ListBinding {
        mint_allow: host.create_list("Mint whitelist", false, deployer).unwrap(),
        burn_allow: host.create_list("Burn whitelist", false, deployer).unwrap(),
        deny: host.create_list("Blacklist", true, deployer).unwrap(),
        fee_exempt: host.create_list("No Fees list", false, deployer).unwrap(),
    };
    let balances = host.create_balance_sheet(deployer).unwrap();
    let allowances = host.create_allowance_sheet(deployer).unwrap();
    let ledger = host.create_ledger(deployer).unwrap();

    host.set_lists(ledger, lists, deployer).unwrap();
    host.transfer_ownership(balances, ledger, deployer).unwrap();
    host.transfer_ownership(allowances, ledger, deployer).unwrap();
    host.set_balance_sheet(ledger, balances, deployer).unwrap();
    host.set_allowance_sheet(ledger, allowances, deployer).unwrap();

    Deployment { host, ledger, lists }
}

#[test]
fn test_controller_lifecycle() {
    let Deployment { mut host, ledger, lists } = deploy(DELAY);
    let owner = account(0);
    let target = account(3);
    host.set_membership(lists.mint_allow, target, true, owner).unwrap();

    let controller = host.create_controller(owner).unwrap();
    for resource in [lists.mint_allow, lists.burn_allow, lists.deny, ledger] {
        host.transfer_ownership(resource, controller, owner).unwrap();
    }
    // Nominating the controller leaves the owner in charge until the claim
    host.issue(ledger, target, 10, owner).unwrap();
    assert_eq!(host.balance_of(&ledger, &target).unwrap(), 10);

    for resource in [lists.mint_allow, lists.burn_allow, lists.deny, ledger] {
        host.claim_capability(controller, resource, owner).unwrap();
    }
    host.bind_ledger(controller, ledger, owner).unwrap();
    assert!(matches!(host.issue(ledger, target, 10, owner), Err(LedgerError::Unauthorized(_))));

    // The owner is admin at first and may finalize immediately
    assert_eq!(host.request_issue(controller, target, 9, owner).unwrap(), 0);
    host.finalize_issue(controller, 0, owner).unwrap();
    assert_eq!(host.balance_of(&ledger, &target).unwrap(), 19);

    assert!(host.request_issue(controller, target, 200, account(1)).is_err());
    host.transfer_adminship(controller, account(1), owner).unwrap();
    assert_eq!(host.request_issue(controller, target, 200, account(1)).unwrap(), 1);

    assert!(host.finalize_issue(controller, 1, target).is_err());
    host.advance(DELAY / 2).unwrap();
    assert!(host.finalize_issue(controller, 1, target).is_err());
    assert!(matches!(
        host.finalize_issue(controller, 1, account(1)),
        Err(LedgerError::TooEarly { .. })
    ));
    host.advance(DELAY / 2).unwrap();
    // The target never finalizes, even after the delay
    assert!(host.finalize_issue(controller, 1, target).is_err());
    host.finalize_issue(controller, 1, account(1)).unwrap();
    assert_eq!(host.balance_of(&ledger, &target).unwrap(), 219);

    assert_eq!(host.request_issue(controller, target, 3000, account(1)).unwrap(), 2);
    assert_eq!(host.request_issue(controller, target, 40000, account(1)).unwrap(), 3);
    host.advance(DELAY).unwrap();
    host.finalize_issue(controller, 3, account(1)).unwrap();
    assert!(matches!(
        host.finalize_issue(controller, 3, account(1)),
        Err(LedgerError::AlreadyFinalized(3))
    ));
    assert_eq!(host.balance_of(&ledger, &target).unwrap(), 40219);

    host.transfer_adminship(controller, account(2), owner).unwrap();
    assert!(host.finalize_issue(controller, 2, account(1)).is_err());
    assert!(host.finalize_issue(controller, 2, target).is_err());
    assert!(!host.request_at(&controller, 2).unwrap().finalized);

    assert!(host.release_capability(controller, ledger, account(2), account(1)).is_err());
    assert_eq!(host.request_issue(controller, target, 500000, account(2)).unwrap(), 4);
    for resource in [ledger, lists.mint_allow, lists.burn_allow, lists.deny] {
        host.release_capability(controller, resource, account(2), owner).unwrap();
    }
    host.claim_ownership(ledger, account(2)).unwrap();
    assert_eq!(host.holder_of(&ledger).unwrap(), account(2));
    assert!(host.finalize_issue(controller, 4, account(2)).is_err());
    // Even the owner cannot finalize while the controller no longer holds the ledger
    assert!(matches!(
        host.finalize_issue(controller, 4, owner),
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(!host.request_at(&controller, 4).unwrap().finalized);

    host.transfer_ownership(ledger, controller, account(2)).unwrap();
    host.claim_capability(controller, ledger, owner).unwrap();
    host.advance(DELAY).unwrap();
    host.finalize_issue(controller, 4, account(2)).unwrap();
    assert_eq!(host.balance_of(&ledger, &target).unwrap(), 540219);
    assert_eq!(host.total_supply(&ledger).unwrap(), 540219);
}

#[test]
fn test_trusted_ledger_case() {
    let Deployment { mut host, ledger, lists } = deploy(DELAY);
    let owner = account(0);

    host.set_fee_recipient(ledger, owner, owner).unwrap();
    assert!(matches!(
        host.issue(ledger, account(3), 10, owner),
        Err(LedgerError::NotOnAllowList(_))
    ));
    assert!(host.set_membership(lists.mint_allow, account(3), true, account(1)).is_err());
    host.set_membership(lists.mint_allow, account(3), true, owner).unwrap();

    assert_eq!(host.balance_of(&ledger, &account(3)).unwrap(), 0);
    host.issue(ledger, account(3), 12345 * UNIT, owner).unwrap();
    assert_eq!(host.balance_of(&ledger, &account(3)).unwrap(), 12345 * UNIT);
    assert_eq!(host.balance_of(&ledger, &owner).unwrap(), 0);

    host.transfer(ledger, account(4), 11000 * UNIT, account(3)).unwrap();
    let half = UNIT / 2;
    assert_eq!(host.balance_of(&ledger, &owner).unwrap(), 5 * UNIT + half);
    assert_eq!(host.balance_of(&ledger, &account(3)).unwrap(), 1345 * UNIT);
    assert_eq!(host.balance_of(&ledger, &account(4)).unwrap(), 11000 * UNIT - 5 * UNIT - half);

    host.set_paused(ledger, true, owner).unwrap();
    assert!(matches!(
        host.transfer(ledger, account(5), 5000 * UNIT, account(4)),
        Err(LedgerError::Paused)
    ));
    host.set_paused(ledger, false, owner).unwrap();

    assert!(matches!(
        host.delegated_transfer(ledger, account(5), 5000 * UNIT, account(4), account(6)),
        Err(LedgerError::Unauthorized(_))
    ));
    host.set_delegate(ledger, account(6), owner).unwrap();
    host.delegated_transfer(ledger, account(5), 5000 * UNIT, account(4), account(6)).unwrap();

    assert_eq!(
        host.balance_of(&ledger, &account(4)).unwrap(),
        11000 * UNIT - 5 * UNIT - half - 5000 * UNIT
    );
    assert_eq!(host.balance_of(&ledger, &account(5)).unwrap(), 5000 * UNIT - 2 * UNIT - half);
    assert_eq!(host.balance_of(&ledger, &owner).unwrap(), 8 * UNIT);
    assert_eq!(host.total_supply(&ledger).unwrap(), 12345 * UNIT);
}

#[test]
fn test_ledger_can_change_name() {
    let mut host = Host::default();
    let owner = account(0);
    let ledger = host.create_ledger(owner).unwrap();

    let current = host.ledger(&ledger).unwrap();
    assert_eq!(current.name(), "TrueVND");
    assert_eq!(current.symbol(), "TVND");
    assert_eq!(current.decimals(), 18);

    host.rename_ledger(ledger, "FooCoin", "FCN", owner).unwrap();
    let current = host.ledger(&ledger).unwrap();
    assert_eq!(current.name(), "FooCoin");
    assert_eq!(current.symbol(), "FCN");
}

#[test]
fn test_namable_address_list() {
    let mut host = Host::default();
    let owner = account(0);
    let list = host.create_list("abc", false, owner).unwrap();

    assert_eq!(host.list(&list).unwrap().name(), "abc");
    host.rename_list(list, "fooList", owner).unwrap();
    assert_eq!(host.list(&list).unwrap().name(), "fooList");

    assert!(!host.on_list(&list, &account(1)).unwrap());
    host.set_membership(list, account(1), true, owner).unwrap();
    assert!(host.on_list(&list, &account(1)).unwrap());
}

#[test]
fn test_end_to_end_delayed_issuance() {
    let Deployment { mut host, ledger, lists } = deploy(DELAY);
    let owner = account(0);
    let admin = account(1);
    let x = account(7);
    host.set_height(100).unwrap();

    let controller = host.create_controller(owner).unwrap();
    host.set_membership(lists.mint_allow, x, true, owner).unwrap();
    host.transfer_ownership(ledger, controller, owner).unwrap();
    host.claim_capability(controller, ledger, owner).unwrap();
    host.bind_ledger(controller, ledger, owner).unwrap();

    let first = host.request_issue(controller, x, 10, owner).unwrap();
    host.finalize_issue(controller, first, owner).unwrap();
    assert_eq!(host.balance_of(&ledger, &x).unwrap(), 10);

    host.transfer_adminship(controller, admin, owner).unwrap();
    assert_eq!(host.current_admin(&controller).unwrap(), admin);
    let requested_at = host.height();
    let second = host.request_issue(controller, x, 200, admin).unwrap();

    host.set_height(requested_at + DELAY / 2).unwrap();
    let receipt = host
        .execute(
            admin,
            Call::FinalizeIssue {
                controller,
                request: second,
            },
        )
        .unwrap();
    assert!(!receipt.success);
    assert!(receipt.error_message.unwrap().contains("Too early"));
    assert_eq!(host.balance_of(&ledger, &x).unwrap(), 10);

    host.set_height(requested_at + DELAY).unwrap();
    let receipt = host
        .execute(
            admin,
            Call::FinalizeIssue {
                controller,
                request: second,
            },
        )
        .unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.height, requested_at + DELAY);
    assert!(receipt.events.contains(&HostEvent::Ledger {
        ledger,
        event: LedgerEvent::Issued { target: x, amount: 200 },
    }));
    assert!(receipt.events.contains(&HostEvent::Controller {
        controller,
        event: ControllerEvent::MintFinalized {
            id: second,
            target: x,
            amount: 200,
            finalized_at: requested_at + DELAY,
        },
    }));
    assert_eq!(host.balance_of(&ledger, &x).unwrap(), 210);
}

#[test]
fn test_controller_id_cannot_issue_directly() {
    let Deployment { mut host, ledger, lists } = deploy(DELAY);
    let owner = account(0);
    let admin = account(1);
    let x = account(7);

    let controller = host.create_controller(owner).unwrap();
    host.set_membership(lists.mint_allow, x, true, owner).unwrap();
    host.transfer_ownership(ledger, controller, owner).unwrap();
    host.claim_capability(controller, ledger, owner).unwrap();
    host.bind_ledger(controller, ledger, owner).unwrap();
    host.transfer_adminship(controller, admin, owner).unwrap();
    let supply = host.total_supply(&ledger).unwrap();

    assert!(matches!(
        host.issue(ledger, x, 1_000_000, controller),
        Err(LedgerError::Unauthorized(id)) if id == controller
    ));
    assert!(host.request_issue(controller, x, 1_000_000, controller).is_err());
    assert_eq!(host.balance_of(&ledger, &x).unwrap(), 0);
    assert_eq!(host.total_supply(&ledger).unwrap(), supply);

    let rejected = host.receipts().last().unwrap();
    assert!(!rejected.success);
    assert_eq!(rejected.caller, controller);
    assert!(rejected.events.is_empty());

    // The delayed path still works for the admin
    let id = host.request_issue(controller, x, 1_000_000, admin).unwrap();
    assert!(host.finalize_issue(controller, id, admin).is_err());
    host.advance(DELAY).unwrap();
    host.finalize_issue(controller, id, admin).unwrap();
    assert_eq!(host.balance_of(&ledger, &x).unwrap(), 1_000_000);
}

#[test]
fn test_controller_governs_lists_and_ledger() {
    let Deployment { mut host, ledger, lists } = deploy(DELAY);
    let owner = account(0);
    let admin = account(1);
    let mallory = account(9);
    let controller = host.create_controller(owner).unwrap();

    for resource in [lists.mint_allow, lists.deny, ledger] {
        host.transfer_ownership(resource, controller, owner).unwrap();
        host.claim_capability(controller, resource, owner).unwrap();
    }
    host.bind_ledger(controller, ledger, owner).unwrap();
    host.transfer_adminship(controller, admin, owner).unwrap();

    // Admin manages membership, the owner operates the ledger
    host.update_list(controller, lists.mint_allow, mallory, true, admin).unwrap();
    let id = host.request_issue(controller, mallory, 1000, admin).unwrap();
    host.finalize_issue(controller, id, owner).unwrap();

    host.update_list(controller, lists.deny, mallory, true, admin).unwrap();
    assert!(matches!(
        host.transfer(ledger, admin, 10, mallory),
        Err(LedgerError::Denied(_))
    ));
    assert!(host.set_membership(lists.deny, mallory, false, owner).is_err());

    assert!(host.pause_ledger(controller, admin).is_err());
    host.pause_ledger(controller, owner).unwrap();
    assert!(host.is_paused(&ledger).unwrap());
    host.unpause_ledger(controller, owner).unwrap();

    let staker = account(8);
    host.set_ledger_fee_recipient(controller, staker, owner).unwrap();
    host.set_ledger_delegate(controller, admin, owner).unwrap();
    host.update_list(controller, lists.deny, mallory, false, owner).unwrap();
    host.delegated_transfer(ledger, admin, 1000, mallory, admin).unwrap();
    assert_eq!(host.balance_of(&ledger, &admin).unwrap(), 1000);
    assert_eq!(host.balance_of(&ledger, &staker).unwrap(), 0);

    host.revoke_ledger_delegate(controller, admin, owner).unwrap();
    assert!(!host.ledger(&ledger).unwrap().is_delegate(&admin));

    assert!(host.set_ledger_fee(controller, 1, 0, owner).is_err());
    host.set_ledger_fee(controller, 1, 100, owner).unwrap();
    assert_eq!(host.ledger(&ledger).unwrap().fee(), (1, 100));

    host.rename_ledger_via(controller, "FooCoin", "FCN", owner).unwrap();
    assert_eq!(host.ledger(&ledger).unwrap().symbol(), "FCN");

    host.controller_rename_list(controller, lists.deny, "Denylist", owner).unwrap();
    assert_eq!(host.list(&lists.deny).unwrap().name(), "Denylist");
}

#[test]
fn test_allowance_flow_through_host() {
    let Deployment { mut host, ledger, lists } = deploy(DELAY);
    let owner = account(0);
    let (holder, spender, payee) = (account(1), account(2), account(3));
    host.set_membership(lists.mint_allow, holder, true, owner).unwrap();
    host.issue(ledger, holder, 10_000, owner).unwrap();

    host.approve(ledger, spender, 4000, holder).unwrap();
    assert_eq!(host.allowance_of(&ledger, &holder, &spender).unwrap(), 4000);

    host.transfer_from(ledger, holder, payee, 4000, spender).unwrap();
    assert_eq!(host.allowance_of(&ledger, &holder, &spender).unwrap(), 0);
    assert_eq!(host.balance_of(&ledger, &payee).unwrap(), 3998);
    assert!(matches!(
        host.transfer_from(ledger, holder, payee, 1, spender),
        Err(LedgerError::InsufficientAllowance { .. })
    ));

    host.set_membership(lists.burn_allow, payee, true, owner).unwrap();
    host.reduce(ledger, 998, payee).unwrap();
    assert_eq!(host.total_supply(&ledger).unwrap(), 9002);
}

//! KYC step: customer type, account owners, directors and the KYC gate.

use backoffice_core::{
    command::WizardCommand,
    config::WizardConfig,
    error::WizardError,
    event::NotificationVariant,
    kyc_step::{KycList, KycSelection},
    route::WizardStep,
    state::{CustomerType, ProductInput},
    wizard::Wizard,
};

fn config() -> WizardConfig {
    WizardConfig {
        min_field_len: 1,
        ..WizardConfig::default_test()
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Selecting the same KYC twice leaves exactly one entry, for both customer types.
#[test]
fn duplicate_account_owner_is_kept_once() {
    init_logger();
    for (customer_type, kyc_id) in [(CustomerType::Retail, "K1"), (CustomerType::Business, "BK1")] {
        let mut wizard = Wizard::build_test(config()).unwrap();
        wizard
            .apply(WizardCommand::SelectCustomerType { customer_type })
            .unwrap();

        let first = wizard.select_kyc(KycList::AccountOwners, kyc_id).unwrap();
        let second = wizard.select_kyc(KycList::AccountOwners, kyc_id).unwrap();

        assert_eq!(first, KycSelection::Staged);
        assert_eq!(second, KycSelection::DuplicateIgnored);
        assert_eq!(
            wizard.state().account_owners().len(),
            1,
            "{customer_type}: duplicate must not be staged twice"
        );
        assert!(wizard.event_types().contains(&"kyc_duplicate_ignored"));
    }
}

#[test]
fn selecting_kyc_before_customer_type_fails() {
    let mut wizard = Wizard::build_test(config()).unwrap();
    let err = wizard
        .apply(WizardCommand::SelectKyc {
            list:   KycList::AccountOwners,
            kyc_id: "K1".into(),
        })
        .unwrap_err();
    assert!(matches!(err, WizardError::CustomerTypeNotSelected));
}

#[test]
fn unknown_kyc_is_a_validation_error() {
    let mut wizard = Wizard::build_test(config()).unwrap();
    wizard
        .apply(WizardCommand::SelectCustomerType {
            customer_type: CustomerType::Retail,
        })
        .unwrap();
    let err = wizard.select_kyc(KycList::AccountOwners, "K-404").unwrap_err();
    let WizardError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.has_field("accountOwners"));
}

/// Business owners set the legal entity name; directors go to otherKYCs.
#[test]
fn business_selection_fills_legal_name_and_directors() {
    let mut wizard = Wizard::build_test(config()).unwrap();
    wizard
        .apply(WizardCommand::SelectCustomerType {
            customer_type: CustomerType::Business,
        })
        .unwrap();
    wizard.select_kyc(KycList::AccountOwners, "BK1").unwrap();

    // No director yet: the gate holds.
    assert!(matches!(wizard.apply(WizardCommand::Next), Err(WizardError::Gate(_))));
    assert_eq!(wizard.step(), WizardStep::Kyc);

    wizard.select_kyc(KycList::OtherKycs, "DK1").unwrap();
    let state = wizard.state();
    assert_eq!(state.legal_entity_name(), Some("Acme Ltd"));
    assert_eq!(state.other_kycs()[0].kyc_id, "DK1");
    assert_eq!(state.other_kycs()[0].name, "Dana Director");

    wizard.apply(WizardCommand::Next).unwrap();
    assert_eq!(wizard.step(), WizardStep::Products);
}

#[test]
fn kyc_gate_failure_notifies_and_stays() {
    let mut wizard = Wizard::build_test(config()).unwrap();
    wizard
        .apply(WizardCommand::SelectCustomerType {
            customer_type: CustomerType::Retail,
        })
        .unwrap();

    let err = wizard.apply(WizardCommand::Next).unwrap_err();
    let WizardError::Gate(failure) = err else {
        panic!("expected gate failure");
    };
    assert_eq!(failure.title, "Data Not Saved");
    assert_eq!(wizard.step(), WizardStep::Kyc);

    let last = wizard.notifications().last().unwrap();
    assert_eq!(last.variant, NotificationVariant::Destructive);
    assert_eq!(last.description, "Please save data before proceeding");

    wizard.apply(WizardCommand::DismissNotification { index: 0 }).unwrap();
    assert!(wizard.notifications().is_empty());
}

/// Going back and switching type drops the staged KYCs but keeps the product.
#[test]
fn switching_customer_type_drops_staged_kycs() {
    let mut wizard = Wizard::build_test(config()).unwrap();
    wizard
        .apply(WizardCommand::SelectCustomerType {
            customer_type: CustomerType::Retail,
        })
        .unwrap();
    wizard.select_kyc(KycList::AccountOwners, "K1").unwrap();
    wizard.apply(WizardCommand::Next).unwrap();
    wizard
        .apply(WizardCommand::SaveProduct {
            product: ProductInput::new("P1", "USD", "Low"),
        })
        .unwrap();
    wizard.apply(WizardCommand::Back).unwrap();
    assert_eq!(wizard.step(), WizardStep::Kyc);

    // Same type again changes nothing.
    wizard.select_customer_type(CustomerType::Retail).unwrap();
    assert_eq!(wizard.state().account_owners().len(), 1);

    wizard.select_customer_type(CustomerType::Business).unwrap();
    let state = wizard.state();
    assert_eq!(state.customer_type(), Some(CustomerType::Business));
    assert!(state.account_owners().is_empty());
    assert!(state.product_input.is_complete());
}

#[test]
fn step_commands_are_rejected_on_other_steps() {
    let mut wizard = Wizard::build_test(config()).unwrap();
    let err = wizard
        .apply(WizardCommand::SaveProduct {
            product: ProductInput::new("P1", "USD", "Low"),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        WizardError::WrongStep {
            expected: WizardStep::Products,
            actual:   WizardStep::Kyc,
        }
    ));
}

#[test]
fn removed_kyc_is_unstaged() {
    let mut wizard = Wizard::build_test(config()).unwrap();
    wizard.select_customer_type(CustomerType::Retail).unwrap();
    wizard.select_kyc(KycList::AccountOwners, "K1").unwrap();
    assert!(wizard.remove_kyc(KycList::AccountOwners, "K1").unwrap());
    assert!(!wizard.remove_kyc(KycList::AccountOwners, "K1").unwrap());
    assert!(wizard.state().account_owners().is_empty());
}

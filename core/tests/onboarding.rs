//! Mandates step: the chained onboarding save protocol end to end.

use backoffice_core::{
    command::WizardCommand,
    config::WizardConfig,
    error::WizardError,
    gate,
    kyc_step::KycList,
    mandate_step::MandateTuple,
    route::WizardStep,
    state::{CustomerType, ProductInput},
    store::BackOfficeStore,
    wizard::Wizard,
};
use serde_json::Value;

fn config() -> WizardConfig {
    WizardConfig {
        min_field_len: 1,
        ..WizardConfig::default_test()
    }
}

/// Walk a fresh wizard to the Mandates step with the given parties staged.
fn wizard_at_mandates(customer_type: CustomerType) -> Wizard<BackOfficeStore> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut wizard = Wizard::build_test(config()).unwrap();
    wizard.select_customer_type(customer_type).unwrap();
    match customer_type {
        CustomerType::Retail => {
            wizard.select_kyc(KycList::AccountOwners, "K1").unwrap();
        }
        CustomerType::Business => {
            wizard.select_kyc(KycList::AccountOwners, "BK1").unwrap();
            wizard.select_kyc(KycList::OtherKycs, "DK1").unwrap();
        }
    }
    wizard.apply(WizardCommand::Next).unwrap();
    wizard
        .apply(WizardCommand::SaveProduct {
            product: ProductInput::new("P1", "USD", "Low"),
        })
        .unwrap();
    wizard.apply(WizardCommand::Next).unwrap();
    assert_eq!(wizard.step(), WizardStep::Mandates);
    wizard
}

fn payload(store: &BackOfficeStore, operation: &str) -> Value {
    let entry = store
        .operation_log()
        .unwrap()
        .into_iter()
        .find(|e| e.operation == operation)
        .unwrap_or_else(|| panic!("no {operation} in operation log"));
    serde_json::from_str(&entry.payload).unwrap()
}

/// Retail: mandate, Retail, Customer, Account, Customer update, in that order.
#[test]
fn retail_onboarding_chains_ids_in_order() {
    let mut wizard = wizard_at_mandates(CustomerType::Retail);
    assert!(!gate::mandate_gate(&wizard.state()));

    wizard
        .apply(WizardCommand::SubmitMandates {
            mandates: vec![MandateTuple::new("S1", "M1", "A12345")],
        })
        .unwrap();

    let store = wizard.gateway();
    assert_eq!(
        store.operation_names().unwrap(),
        vec!["createMandate", "createRetail", "createCustomer", "createAccount", "updateCustomer"]
    );

    let state = wizard.state();
    let mandate_id = state.mandates[0].mandate_id.clone();
    let retail_id = state.retail.clone().unwrap();
    let customer_id = state.customer.clone().unwrap();
    let account_id = state.account.clone().unwrap();
    assert!(state.business.is_none());

    let retail = payload(store, "createRetail");
    assert_eq!(retail["individualKyc"], "K1");
    assert_eq!(retail["productTypes"], "P1");
    assert_eq!(retail["accountCurrency"], "USD");
    assert_eq!(retail["riskRating"], "Low");
    assert_eq!(retail["accountMandates"][0], mandate_id.as_str());
    assert_eq!(retail["modifiedBy"], "user-test");
    assert_eq!(retail["modifiedOn"], "2024-01-15T09:30:00");

    let customer = payload(store, "createCustomer");
    assert_eq!(customer["retail"], retail_id.as_str());
    assert_eq!(customer["accountMandates"][0], mandate_id.as_str());

    let account = payload(store, "createAccount");
    assert_eq!(account["accountOwner"], customer_id.as_str());
    assert_eq!(account["name"], customer_id.as_str());
    assert_eq!(account["description"], format!("Retail Account for {customer_id}"));
    assert_eq!(account["branchId"], format!("BRANCH-{customer_id}"));
    assert_eq!(account["normalBalance"], "CREDIT");

    let attach = payload(store, "updateCustomer");
    assert_eq!(attach["customerId"], customer_id.as_str());
    assert_eq!(attach["accounts"][0], account_id.as_str());

    assert!(gate::mandate_gate(&state), "mandate gate must pass after a save");
    assert!(store.orphaned_mandates().unwrap().is_empty());
}

#[test]
fn retail_onboarding_notifies_creation_then_mandates() {
    let mut wizard = wizard_at_mandates(CustomerType::Retail);
    wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .unwrap();

    let customer_id = wizard.state().customer.clone().unwrap();
    let titles: Vec<&str> = wizard.notifications().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Customer Created", "Mandates Saved"]);
    assert_eq!(
        wizard.notifications()[0].description,
        format!("Customer {customer_id} has been created successfully")
    );
    assert!(wizard.event_types().contains(&"save_committed"));
}

/// Going forward and back to resubmit updates the records this session
/// already created instead of onboarding a second customer.
#[test]
fn resubmit_after_back_updates_in_place() {
    let mut wizard = wizard_at_mandates(CustomerType::Retail);
    let rows = [MandateTuple::new("S1", "M1", "A12345")];
    wizard.submit_mandates(&rows).unwrap();
    let first = wizard.state();
    let before = wizard.gateway().operation_log().unwrap().len();

    wizard.next().unwrap();
    assert_eq!(wizard.step(), WizardStep::MandateRules);
    wizard.back().unwrap();
    assert_eq!(wizard.step(), WizardStep::Mandates);
    wizard.submit_mandates(&rows).unwrap();

    let store = wizard.gateway();
    let ops = store.operation_names().unwrap();
    assert_eq!(
        &ops[before..],
        &["updateMandate", "updateRetail", "updateCustomer", "updateAccount", "updateCustomer"]
    );
    assert_eq!(store.customer_count().unwrap(), 1);
    assert_eq!(store.retail_count().unwrap(), 1);
    assert_eq!(store.account_count().unwrap(), 1);
    assert_eq!(store.mandate_count().unwrap(), 1);

    let state = wizard.state();
    assert_eq!(state.customer, first.customer);
    assert_eq!(state.retail, first.retail);
    assert_eq!(state.account, first.account);
    assert_eq!(state.mandates[0].mandate_id, first.mandates[0].mandate_id);
    assert!(wizard.notifications().iter().any(|n| n.title == "Customer Updated"));
}

/// Business: a Business create referencing owner and director, same chaining after.
#[test]
fn business_onboarding_creates_business_not_retail() {
    let mut wizard = wizard_at_mandates(CustomerType::Business);
    wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .unwrap();

    let store = wizard.gateway();
    assert_eq!(
        store.operation_names().unwrap(),
        vec!["createMandate", "createBusiness", "createCustomer", "createAccount", "updateCustomer"]
    );
    assert_eq!(store.retail_count().unwrap(), 0);
    assert_eq!(store.business_count().unwrap(), 1);

    let business = payload(store, "createBusiness");
    assert_eq!(business["legalEntityName"], "Acme Ltd");
    assert_eq!(business["businessKyc"], "BK1");
    assert_eq!(business["directorsKyc"], "DK1");

    let state = wizard.state();
    let customer_id = state.customer.clone().unwrap();
    let customer = payload(store, "createCustomer");
    assert_eq!(customer["business"], state.business.clone().unwrap().as_str());

    let account = payload(store, "createAccount");
    assert_eq!(account["name"], "Acme Ltd Account");
    assert_eq!(account["description"], format!("Business Account for {customer_id}"));

    assert!(gate::mandate_gate(&state));
    let titles: Vec<&str> = wizard.notifications().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Customer Created", "Data Saved"]);
}

/// N tuples: N mandate creates before the single party create.
#[test]
fn every_tuple_is_created_before_the_party() {
    let mut wizard = wizard_at_mandates(CustomerType::Retail);
    wizard
        .submit_mandates(&[
            MandateTuple::new("S1", "M1", "A1"),
            MandateTuple::new("S2", "M2", "A2"),
            MandateTuple::new("S3", "M1", "A3"),
        ])
        .unwrap();

    let ops = wizard.gateway().operation_names().unwrap();
    assert_eq!(&ops[..3], &["createMandate", "createMandate", "createMandate"]);
    assert_eq!(&ops[3..], &["createRetail", "createCustomer", "createAccount", "updateCustomer"]);

    let state = wizard.state();
    assert_eq!(state.mandates.len(), 3);
    let retail = payload(wizard.gateway(), "createRetail");
    assert_eq!(retail["accountMandates"].as_array().unwrap().len(), 3);
}

#[test]
fn invalid_tuples_send_nothing() {
    let mut wizard = wizard_at_mandates(CustomerType::Retail);
    let err = wizard
        .submit_mandates(&[MandateTuple::new("S1", "", "A12345")])
        .unwrap_err();
    let WizardError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.has_field("mandates.0.mandateType"));
    assert!(wizard.gateway().operation_log().unwrap().is_empty());

    assert!(matches!(wizard.submit_mandates(&[]), Err(WizardError::Validation(_))));
}

#[test]
fn mandate_gate_blocks_until_saved() {
    let mut wizard = wizard_at_mandates(CustomerType::Retail);
    assert!(matches!(wizard.apply(WizardCommand::Next), Err(WizardError::Gate(_))));
    assert_eq!(wizard.step(), WizardStep::Mandates);

    wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .unwrap();
    wizard.apply(WizardCommand::Next).unwrap();
    assert_eq!(wizard.step(), WizardStep::MandateRules);
    assert_eq!(wizard.route().path(), "/customers/customer-wizard/mandate-rules");
}

/// Events persist to the store and read back in order.
#[test]
fn event_log_round_trips_through_store() {
    let mut wizard = wizard_at_mandates(CustomerType::Retail);
    wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .unwrap();

    for entry in wizard.event_log() {
        wizard.gateway().append_event(entry).unwrap();
    }
    let stored = wizard
        .gateway()
        .events_for_session(&wizard.session_id)
        .unwrap();
    assert_eq!(stored.len(), wizard.event_log().len());
    assert_eq!(stored[0].event_type, "wizard_started");
    assert_eq!(
        stored.last().unwrap().event_type,
        wizard.event_log().last().unwrap().event_type
    );
}

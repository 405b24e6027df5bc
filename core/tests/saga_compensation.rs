//! Failed saves: reverse-order compensation, saves without rollback,
//! and the error notification shown to the operator.

use backoffice_core::{
    config::WizardConfig,
    error::WizardError,
    event::NotificationVariant,
    fault::{FaultAction, FaultInjectingGateway},
    gate,
    gateway::Operation,
    kyc_step::KycList,
    mandate_step::MandateTuple,
    reference::ReferenceData,
    route::WizardStep,
    state::{CustomerType, ProductInput},
    store::BackOfficeStore,
    wizard::{test_clock, Wizard},
};

type FaultyWizard = Wizard<FaultInjectingGateway<BackOfficeStore>>;

fn config() -> WizardConfig {
    WizardConfig {
        min_field_len: 1,
        ..WizardConfig::default_test()
    }
}

fn retail_wizard(config: WizardConfig, op: Operation, nth: u32, action: FaultAction) -> FaultyWizard {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = BackOfficeStore::in_memory_seeded(&ReferenceData::default_test()).unwrap();
    let gateway = FaultInjectingGateway::new(store, 1).script(op, nth, action);
    let mut wizard = Wizard::new("session-saga", config, test_clock(), gateway).unwrap();
    wizard.select_customer_type(CustomerType::Retail).unwrap();
    wizard.select_kyc(KycList::AccountOwners, "K1").unwrap();
    wizard.next().unwrap();
    wizard.save_product(ProductInput::new("P1", "USD", "Low")).unwrap();
    wizard.next().unwrap();
    assert_eq!(wizard.step(), WizardStep::Mandates);
    wizard
}

/// createCustomer fails: Retail then mandates are deleted, newest first.
#[test]
fn customer_failure_rolls_back_party_and_mandates() {
    let mut wizard = retail_wizard(
        config(),
        Operation::CreateCustomer,
        1,
        FaultAction::Fail("Customer service unavailable".into()),
    );
    let version = wizard.state_version();

    let err = wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .unwrap_err();
    assert!(matches!(
        err,
        WizardError::Remote(ref e) if e.operation == Operation::CreateCustomer
    ));

    let store = wizard.gateway().inner();
    assert_eq!(
        store.operation_names().unwrap(),
        vec!["createMandate", "createRetail", "deleteRetail", "deleteMandate"]
    );
    assert_eq!(store.mandate_count().unwrap(), 0);
    assert_eq!(store.retail_count().unwrap(), 0);
    assert!(store.orphaned_mandates().unwrap().is_empty());

    // Nothing from the failed run reaches the wizard state.
    assert_eq!(wizard.state_version(), version);
    let state = wizard.state();
    assert!(state.mandates.is_empty());
    assert!(state.retail.is_none());
    assert!(!gate::mandate_gate(&state));

    let last = wizard.notifications().last().unwrap();
    assert_eq!(last.title, "Error");
    assert_eq!(last.description, "Customer service unavailable");
    assert_eq!(last.variant, NotificationVariant::Destructive);
    assert!(wizard.event_types().contains(&"save_failed"));
}

/// Account creation fails after the customer exists: customer is removed too.
#[test]
fn account_failure_rolls_back_customer() {
    let mut wizard = retail_wizard(
        config(),
        Operation::CreateAccount,
        1,
        FaultAction::Fail("Account rejected".into()),
    );
    assert!(wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .is_err());

    let store = wizard.gateway().inner();
    assert_eq!(
        store.operation_names().unwrap(),
        vec![
            "createMandate",
            "createRetail",
            "createCustomer",
            "deleteCustomer",
            "deleteRetail",
            "deleteMandate",
        ]
    );
    assert_eq!(store.customer_count().unwrap(), 0);
    assert_eq!(store.account_count().unwrap(), 0);
}

/// The final attach (updateCustomer) fails: every record of the run is
/// deleted, newest first.
#[test]
fn attach_failure_rolls_back_everything() {
    let mut wizard = retail_wizard(
        config(),
        Operation::UpdateCustomer,
        1,
        FaultAction::Fail("Customer locked".into()),
    );
    let err = wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .unwrap_err();
    assert!(matches!(
        err,
        WizardError::Remote(ref e) if e.operation == Operation::UpdateCustomer
    ));

    let store = wizard.gateway().inner();
    assert_eq!(
        store.operation_names().unwrap(),
        vec![
            "createMandate",
            "createRetail",
            "createCustomer",
            "createAccount",
            "deleteAccount",
            "deleteCustomer",
            "deleteRetail",
            "deleteMandate",
        ]
    );
    assert_eq!(store.mandate_count().unwrap(), 0);
    assert_eq!(store.retail_count().unwrap(), 0);
    assert_eq!(store.customer_count().unwrap(), 0);
    assert_eq!(store.account_count().unwrap(), 0);

    let state = wizard.state();
    assert!(state.customer.is_none());
    assert!(state.account.is_none());
    assert_eq!(wizard.notifications().last().unwrap().description, "Customer locked");
}

/// Edit mode: a failed account update deletes only the mandate created in
/// this run. Updated records keep their new values.
#[test]
fn edit_failure_keeps_updates_and_deletes_new_rows() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut onboard = Wizard::build_test(config()).unwrap();
    onboard.select_customer_type(CustomerType::Retail).unwrap();
    onboard.select_kyc(KycList::AccountOwners, "K1").unwrap();
    onboard.next().unwrap();
    onboard.save_product(ProductInput::new("P1", "USD", "Low")).unwrap();
    onboard.next().unwrap();
    onboard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .unwrap();
    let customer_id = onboard.state().customer.clone().unwrap();
    let original_mandate = onboard.state().mandates[0].mandate_id.clone();
    let store = onboard.into_gateway();

    let gateway = FaultInjectingGateway::new(store, 1).script(
        Operation::UpdateAccount,
        1,
        FaultAction::Fail("Account frozen".into()),
    );
    let mut wizard = Wizard::new("session-edit-saga", config(), test_clock(), gateway).unwrap();
    wizard.load_customer(&customer_id, None).unwrap();
    wizard.next().unwrap();
    wizard.next().unwrap();
    assert_eq!(wizard.step(), WizardStep::Mandates);
    let before = wizard.gateway().inner().operation_log().unwrap().len();

    let err = wizard
        .submit_mandates(&[
            MandateTuple::new("S1", "M2", "B22222"),
            MandateTuple::new("S2", "M1", "C33333"),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        WizardError::Remote(ref e) if e.operation == Operation::UpdateAccount
    ));

    let store = wizard.gateway().inner();
    let ops = store.operation_names().unwrap();
    assert_eq!(
        &ops[before..],
        &["updateMandate", "createMandate", "updateRetail", "updateCustomer", "deleteMandate"]
    );
    assert_eq!(store.customer_count().unwrap(), 1);
    assert_eq!(store.retail_count().unwrap(), 1);
    assert_eq!(store.account_count().unwrap(), 1);
    assert_eq!(store.mandate_count().unwrap(), 1);

    let kept = store.find_mandate(&original_mandate).unwrap().unwrap();
    assert_eq!(kept.mandate_type, "M2");
    assert_eq!(kept.category, "B22222");

    let state = wizard.state();
    assert_eq!(state.customer.as_deref(), Some(customer_id.as_str()));
    assert_eq!(state.mandates.len(), 1);
    assert_eq!(state.mandates[0].mandate_id, original_mandate);
}

/// With compensation off, ids created before the failure are kept in state
/// and the server keeps the records.
#[test]
fn without_rollback_partial_ids_are_kept() {
    let no_rollback = WizardConfig {
        compensate_on_failure: false,
        ..config()
    };
    let mut wizard = retail_wizard(
        no_rollback,
        Operation::CreateCustomer,
        1,
        FaultAction::Fail("Customer service unavailable".into()),
    );
    assert!(wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .is_err());

    let store = wizard.gateway().inner();
    assert_eq!(store.operation_names().unwrap(), vec!["createMandate", "createRetail"]);
    assert_eq!(store.orphaned_mandates().unwrap().len(), 1);

    let state = wizard.state();
    assert_eq!(state.mandates.len(), 1);
    assert!(state.retail.is_some());
    assert!(state.customer.is_none());
    // The retail id alone satisfies the mandate gate.
    assert!(gate::mandate_gate(&state));
}

#[test]
fn failure_without_server_message_shows_generic_text() {
    let mut wizard = retail_wizard(
        config(),
        Operation::CreateRetail,
        1,
        FaultAction::FailWithoutMessage,
    );
    assert!(wizard
        .submit_mandates(&[MandateTuple::new("S1", "M1", "A12345")])
        .is_err());

    let last = wizard.notifications().last().unwrap();
    assert_eq!(last.title, "Error");
    assert_eq!(last.description, wizard.config().generic_error_message);
    assert_eq!(
        wizard.gateway().inner().operation_names().unwrap(),
        vec!["createMandate", "deleteMandate"]
    );
}

/// One failing tuple: the others are still issued, then every created
/// mandate is deleted and the party is never created.
#[test]
fn failing_tuple_waits_for_the_batch_then_compensates() {
    let mut wizard = retail_wizard(
        config(),
        Operation::CreateMandate,
        2,
        FaultAction::Fail("Mandate rejected".into()),
    );
    assert!(wizard
        .submit_mandates(&[
            MandateTuple::new("S1", "M1", "A1"),
            MandateTuple::new("S2", "M1", "A2"),
            MandateTuple::new("S3", "M2", "A3"),
        ])
        .is_err());

    let store = wizard.gateway().inner();
    assert_eq!(
        store.operation_names().unwrap(),
        vec!["createMandate", "createMandate", "deleteMandate", "deleteMandate"]
    );
    assert_eq!(store.retail_count().unwrap(), 0);
    assert_eq!(store.mandate_count().unwrap(), 0);
    assert!(wizard.state().mandates.is_empty());
    assert_eq!(wizard.notifications().last().unwrap().description, "Mandate rejected");
}

/// After a compensated failure the same rows can be resubmitted cleanly.
#[test]
fn resubmit_after_failure_commits() {
    let mut wizard = retail_wizard(
        config(),
        Operation::CreateCustomer,
        1,
        FaultAction::Fail("Customer service unavailable".into()),
    );
    let rows = [MandateTuple::new("S1", "M1", "A12345")];
    assert!(wizard.submit_mandates(&rows).is_err());
    wizard.submit_mandates(&rows).unwrap();

    let store = wizard.gateway().inner();
    assert_eq!(store.customer_count().unwrap(), 1);
    assert_eq!(store.mandate_count().unwrap(), 1);
    assert!(store.orphaned_mandates().unwrap().is_empty());
    assert!(gate::mandate_gate(&wizard.state()));
    assert_eq!(wizard.submit_guard(WizardStep::Mandates).map(|g| g.is_in_flight()), Some(false));
}

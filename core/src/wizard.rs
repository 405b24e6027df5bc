//! The onboarding wizard: one session from the first step to Done.
//!
//! STEP ORDER (fixed):
//!   1. Kyc           customer type and KYC selection (staging only)
//!   2. Products      product selection (staging only)
//!   3. Mandates      mandate entry, then the onboarding save protocol
//!   4. MandateRules  signing rules and limits
//!   5. Done          wizard closed, state discarded
//!
//! RULES:
//!   - A step's data only changes while that step is active.
//!   - Forward navigation passes the step's completion gate first.
//!   - A state write that follows remote calls is dropped when the step
//!     activation that issued the calls is no longer current.
//!   - Every transition and notification is recorded as a WizardEvent.

use crate::{
    activation::{ActivationHandle, ActivationToken, SubmitGuard},
    audit::AuditClock,
    command::WizardCommand,
    config::WizardConfig,
    error::{ValidationErrors, WizardError, WizardResult},
    event::{EventLogEntry, Notification, WizardEvent},
    gate,
    gateway::{CustomerData, GatewayError, RemoteGateway},
    kyc_step::{self, KycList, KycSelection},
    mandate_rule_step::{self, MandateRuleTuple},
    mandate_step::{self, MandateTuple},
    product_step,
    reference::{KycCandidate, ReferenceData},
    saga::{SagaOutcome, SagaReport},
    snapshot::WizardSnapshot,
    state::{
        ConfirmedProduct, CustomerProfile, CustomerType, KycRef, ProductInput, StateContainer,
        WizardPatch, WizardState,
    },
    route::{WizardRoute, WizardStep},
    store::BackOfficeStore,
    types::{EntityId, SessionId},
};
use std::{collections::HashMap, sync::Arc};

pub struct Wizard<G: RemoteGateway> {
    pub session_id:     SessionId,
    config:             WizardConfig,
    clock:              AuditClock,
    gateway:            G,
    state:              StateContainer,
    route:              WizardRoute,
    reference:          ReferenceData,
    guards:             HashMap<WizardStep, SubmitGuard>,
    activation:         ActivationHandle,
    token:              ActivationToken,
    notifications:      Vec<Notification>,
    events:             Vec<EventLogEntry>,
    seq:                u64,
    closed:             bool,
    completed_customer: Option<EntityId>,
}

impl Wizard<BackOfficeStore> {
    /// Wizard over a seeded in-memory store with a fixed audit clock.
    /// Use this in tests instead of wiring a store by hand.
    pub fn build_test(config: WizardConfig) -> WizardResult<Self> {
        let store = BackOfficeStore::in_memory_seeded(&ReferenceData::default_test())?;
        Wizard::new("session-test", config, test_clock(), store)
    }
}

/// 2024-01-15T09:30:00, the instant every test stamp carries.
pub fn test_clock() -> AuditClock {
    chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .map(AuditClock::Fixed)
        .unwrap_or(AuditClock::System)
}

impl<G: RemoteGateway> Wizard<G> {
    pub fn new(
        session_id: impl Into<SessionId>,
        config: WizardConfig,
        clock: AuditClock,
        gateway: G,
    ) -> WizardResult<Self> {
        let session_id = session_id.into();
        let activation = ActivationHandle::new();
        let token = activation.activate(WizardStep::Kyc);
        let guards = [WizardStep::Mandates, WizardStep::MandateRules]
            .into_iter()
            .map(|step| (step, SubmitGuard::new(step)))
            .collect();
        let route = WizardRoute::new(config.route_base.clone());
        let path = route.path();

        let mut wizard = Self {
            session_id: session_id.clone(),
            config,
            clock,
            gateway,
            state: StateContainer::new(),
            route,
            reference: ReferenceData::default(),
            guards,
            activation,
            token,
            notifications: Vec::new(),
            events: Vec::new(),
            seq: 0,
            closed: false,
            completed_customer: None,
        };
        wizard.emit(WizardEvent::WizardStarted {
            session_id,
            edit_customer: None,
        })?;
        wizard.emit(WizardEvent::StepEntered {
            step: WizardStep::Kyc,
            path,
        })?;
        log::info!("session={} started", wizard.session_id);
        Ok(wizard)
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn state(&self) -> Arc<WizardState> {
        self.state.snapshot()
    }

    pub fn state_version(&self) -> u64 {
        self.state.version()
    }

    pub fn route(&self) -> &WizardRoute {
        &self.route
    }

    pub fn step(&self) -> WizardStep {
        self.route.step
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn event_log(&self) -> &[EventLogEntry] {
        &self.events
    }

    /// Event type names in the order they were recorded.
    pub fn event_types(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.event_type.as_str()).collect()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Hand the gateway back, e.g. to start another session on the same store.
    pub fn into_gateway(self) -> G {
        self.gateway
    }

    /// Handle for invalidating the current activation from outside,
    /// e.g. when the user closes the page mid-submit.
    pub fn activation_handle(&self) -> ActivationHandle {
        self.activation.clone()
    }

    pub fn submit_guard(&self, step: WizardStep) -> Option<&SubmitGuard> {
        self.guards.get(&step)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The customer id the wizard finished with, once Done.
    pub fn completed_customer(&self) -> Option<&str> {
        self.completed_customer.as_deref()
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            session_id:    self.session_id.clone(),
            step:          self.route.step,
            path:          self.route.path(),
            edit_mode:     self.route.is_edit_mode(),
            closed:        self.closed,
            state_version: self.state.version(),
            state:         (*self.state.snapshot()).clone(),
            notifications: self.notifications.clone(),
            submitting:    self.guards.values().any(SubmitGuard::is_in_flight),
            product_types: self.reference.product_type_options(),
            mandate_types: self.reference.mandate_type_options(),
            signatories:   self.reference.signatory_options(),
        }
    }

    // ── Dispatch ───────────────────────────────────────────────

    pub fn apply(&mut self, cmd: WizardCommand) -> WizardResult<()> {
        if self.closed {
            return Err(WizardError::Closed);
        }
        log::debug!(
            "session={} step={} cmd={}",
            self.session_id,
            self.route.step,
            cmd.name()
        );
        match cmd {
            WizardCommand::Next => self.next(),
            WizardCommand::Back => self.back(),
            WizardCommand::Abandon => self.abandon(),
            WizardCommand::SelectCustomerType { customer_type } => {
                self.select_customer_type(customer_type)
            }
            WizardCommand::SelectKyc { list, kyc_id } => self.select_kyc(list, &kyc_id).map(|_| ()),
            WizardCommand::RemoveKyc { list, kyc_id } => self.remove_kyc(list, &kyc_id).map(|_| ()),
            WizardCommand::SaveProduct { product } => self.save_product(product),
            WizardCommand::SubmitMandates { mandates } => self.submit_mandates(&mandates),
            WizardCommand::SubmitMandateRules { rules } => self.submit_mandate_rules(&rules),
            WizardCommand::LoadReferenceData => self.load_reference_data(),
            WizardCommand::LoadCustomer {
                customer_id,
                return_to,
            } => self.load_customer(&customer_id, return_to),
            WizardCommand::DismissNotification { index } => {
                self.dismiss_notification(index);
                Ok(())
            }
        }
    }

    // ── Navigation ─────────────────────────────────────────────

    /// Evaluate the current step's gate and move forward when it passes.
    pub fn next(&mut self) -> WizardResult<()> {
        self.ensure_open()?;
        let step = self.route.step;
        let state = self.state.snapshot();
        if let Err(failure) = gate::check(step, &state) {
            log::warn!(
                "session={} step={step} gate blocked: {}",
                self.session_id,
                failure.description
            );
            self.emit(WizardEvent::GateBlocked {
                step,
                reason: failure.description.clone(),
            })?;
            self.notify(Notification::error(
                failure.title.clone(),
                failure.description.clone(),
            ))?;
            return Err(WizardError::Gate(failure));
        }
        match self.route.advance() {
            Some(WizardStep::Done) => self.complete(),
            Some(next) => self.enter(next),
            None => Err(WizardError::Closed),
        }
    }

    /// Move back one step. Never gated; state is kept.
    pub fn back(&mut self) -> WizardResult<()> {
        self.ensure_open()?;
        match self.route.retreat() {
            Some(prev) => self.enter(prev),
            None => {
                log::debug!("session={} already on the first step", self.session_id);
                Ok(())
            }
        }
    }

    /// Leave the wizard. Outstanding remote calls keep their server-side
    /// effects; their responses are discarded.
    pub fn abandon(&mut self) -> WizardResult<()> {
        self.ensure_open()?;
        let step = self.route.step;
        self.activation.invalidate();
        self.emit(WizardEvent::WizardAbandoned { step })?;
        log::info!("session={} abandoned on step={step}", self.session_id);
        self.close();
        Ok(())
    }

    fn enter(&mut self, step: WizardStep) -> WizardResult<()> {
        self.token = self.activation.activate(step);
        let path = self.route.path();
        log::info!("session={} step={step} path={path}", self.session_id);
        self.emit(WizardEvent::StepEntered { step, path })
    }

    fn complete(&mut self) -> WizardResult<()> {
        let customer_id = self.state.snapshot().customer.clone();
        self.emit(WizardEvent::StepEntered {
            step: WizardStep::Done,
            path: self.route.path(),
        })?;
        self.emit(WizardEvent::WizardCompleted {
            customer_id: customer_id.clone(),
        })?;
        log::info!(
            "session={} completed customer={}",
            self.session_id,
            customer_id.as_deref().unwrap_or("-")
        );
        self.completed_customer = customer_id;
        self.activation.invalidate();
        self.close();
        Ok(())
    }

    fn close(&mut self) {
        self.state.reset();
        self.closed = true;
    }

    // ── Kyc step ───────────────────────────────────────────────

    pub fn select_customer_type(&mut self, customer_type: CustomerType) -> WizardResult<()> {
        self.require_step(WizardStep::Kyc)?;
        let current = self.state.snapshot();
        let saved = current.customer.as_deref().is_some_and(|id| !id.trim().is_empty());
        if saved && current.customer_type().is_some_and(|t| t != customer_type) {
            // The customer already hangs off a party of the current type.
            return Err(ValidationErrors::single(
                "customerType",
                "Customer type cannot be changed once the customer has been saved",
            ));
        }
        let dropped_kycs = match current.customer_type() {
            Some(t) if t != customer_type => current.account_owners().len() + current.other_kycs().len(),
            _ => 0,
        };
        self.state.update(|s| s.with_customer_type(customer_type));
        if dropped_kycs > 0 {
            log::info!("customer type -> {customer_type}: dropped {dropped_kycs} staged KYCs");
        }
        self.emit(WizardEvent::CustomerTypeSelected {
            customer_type,
            dropped_kycs,
        })
    }

    /// Stage a KYC from the reference lists into `list`.
    pub fn select_kyc(&mut self, list: KycList, kyc_id: &str) -> WizardResult<KycSelection> {
        self.require_step(WizardStep::Kyc)?;
        let current = self.state.snapshot();
        let customer_type = current
            .customer_type()
            .ok_or(WizardError::CustomerTypeNotSelected)?;
        if !self.reference.is_loaded() {
            self.load_reference_data()?;
        }
        let candidate = self.candidate_for(customer_type, list, kyc_id).ok_or_else(|| {
            ValidationErrors::single(list.name(), format!("Unknown KYC {kyc_id}"))
        })?;

        let (next, selection) = kyc_step::select_kyc(&current, list, &candidate, &self.config)?;
        let event = match selection {
            KycSelection::Staged => {
                self.state.update(|_| next);
                WizardEvent::KycStaged {
                    list:   list.name().into(),
                    kyc_id: kyc_id.into(),
                }
            }
            KycSelection::DuplicateIgnored => WizardEvent::KycDuplicateIgnored {
                list:   list.name().into(),
                kyc_id: kyc_id.into(),
            },
        };
        self.emit(event)?;
        Ok(selection)
    }

    /// Unstage a KYC. Returns whether anything was removed.
    pub fn remove_kyc(&mut self, list: KycList, kyc_id: &str) -> WizardResult<bool> {
        self.require_step(WizardStep::Kyc)?;
        let current = self.state.snapshot();
        let (next, removed) = kyc_step::remove_kyc(&current, list, kyc_id)?;
        if removed {
            self.state.update(|_| next);
            self.emit(WizardEvent::KycRemoved {
                list:   list.name().into(),
                kyc_id: kyc_id.into(),
            })?;
        }
        Ok(removed)
    }

    fn candidate_for(&self, customer_type: CustomerType, list: KycList, kyc_id: &str) -> Option<KycCandidate> {
        let preferred = match (customer_type, list) {
            (CustomerType::Business, KycList::AccountOwners) => self.reference.business_candidate(kyc_id),
            _ => self.reference.individual_candidate(kyc_id),
        };
        preferred.or_else(|| self.reference.candidate(kyc_id))
    }

    // ── Products step ──────────────────────────────────────────

    pub fn save_product(&mut self, product: ProductInput) -> WizardResult<()> {
        self.require_step(WizardStep::Products)?;
        let current = self.state.snapshot();
        let next = product_step::save_product(&current, product, &self.config, &self.reference)?;
        let product_types = next.product_input.product_types.clone();
        self.state.update(|_| next);
        self.emit(WizardEvent::ProductStaged { product_types })
    }

    // ── Mandates step ──────────────────────────────────────────

    /// Validate the mandate rows and run the onboarding save protocol.
    pub fn submit_mandates(&mut self, tuples: &[MandateTuple]) -> WizardResult<()> {
        let step = WizardStep::Mandates;
        self.require_step(step)?;
        let guard = self.guard(step)?;
        let _permit = guard.try_acquire()?;
        let token = self.token.clone();
        let version = self.state.version();
        let current = self.state.snapshot();

        let plan = mandate_step::plan_onboarding(&current, tuples, &self.config, &self.clock)?;
        let (report, ctx) = mandate_step::run_onboarding(
            &plan,
            &mut self.gateway,
            &token,
            self.config.compensate_on_failure,
        );
        if !token.is_current() {
            return self.discard(step, &report);
        }

        if let Some(patch) = mandate_step::onboarding_patch(
            &plan,
            &ctx,
            &report,
            self.config.compensate_on_failure,
        ) {
            self.state.apply_if_version(version, patch)?;
        }
        let calls = ctx.calls.iter().map(|op| op.name().to_string()).collect();
        match report.outcome.clone() {
            SagaOutcome::Committed => {
                let customer_id = ctx.customer_id.clone().unwrap_or_default();
                let (title, verb) = if plan.existing.is_edit() {
                    ("Customer Updated", "updated")
                } else {
                    ("Customer Created", "created")
                };
                self.notify(Notification::success(
                    title,
                    format!("Customer {customer_id} has been {verb} successfully"),
                ))?;
                let saved = match plan.customer_type {
                    CustomerType::Retail => {
                        Notification::success("Mandates Saved", "Mandates have been saved successfully")
                    }
                    CustomerType::Business => {
                        Notification::success("Data Saved", "Data has been saved successfully")
                    }
                };
                self.notify(saved)?;
                log::info!("session={} customer {customer_id} {verb}", self.session_id);
                self.emit(WizardEvent::SaveCommitted { step, calls })
            }
            SagaOutcome::Failed {
                error, compensated, ..
            } => self.save_failed(step, error, compensated),
            SagaOutcome::Abandoned { .. } => self.discard(step, &report),
        }
    }

    // ── Mandate rules step ─────────────────────────────────────

    pub fn submit_mandate_rules(&mut self, rules: &[MandateRuleTuple]) -> WizardResult<()> {
        let step = WizardStep::MandateRules;
        self.require_step(step)?;
        let guard = self.guard(step)?;
        let _permit = guard.try_acquire()?;
        let token = self.token.clone();
        let version = self.state.version();
        let current = self.state.snapshot();

        let plan = mandate_rule_step::plan_rules(&current, rules, &self.config, &self.clock)?;
        let (report, ctx) = mandate_rule_step::run_rules(&plan, &mut self.gateway, &token);
        if !token.is_current() {
            return self.discard(step, &report);
        }

        let calls = ctx.calls.iter().map(|op| op.name().to_string()).collect();
        match report.outcome.clone() {
            SagaOutcome::Committed => {
                self.state.apply_if_version(
                    version,
                    WizardPatch {
                        mandate_rules: Some(ctx.rules.clone()),
                        ..Default::default()
                    },
                )?;
                self.notify(Notification::success(
                    "Mandate Rules Saved",
                    "Mandate rules have been saved successfully",
                ))?;
                self.emit(WizardEvent::SaveCommitted { step, calls })
            }
            SagaOutcome::Failed {
                error, compensated, ..
            } => self.save_failed(step, error, compensated),
            SagaOutcome::Abandoned { .. } => self.discard(step, &report),
        }
    }

    fn save_failed(
        &mut self,
        step: WizardStep,
        error: GatewayError,
        compensated: Vec<&'static str>,
    ) -> WizardResult<()> {
        self.emit(WizardEvent::SaveFailed {
            step,
            failed_call: error.operation.name().to_string(),
            message: error.message.clone(),
            compensated: compensated.iter().map(|s| s.to_string()).collect(),
        })?;
        self.notify_remote_error("Error", &error)?;
        Err(WizardError::Remote(error))
    }

    /// The activation went stale while the protocol ran: record it and drop
    /// the response. Records already written stay server-side.
    fn discard(&mut self, step: WizardStep, report: &SagaReport) -> WizardResult<()> {
        let before_call = match &report.outcome {
            SagaOutcome::Abandoned { before_step } => before_step.to_string(),
            _ => "none".to_string(),
        };
        log::warn!(
            "session={} step={step} left mid-save; discarding response (completed: {:?})",
            self.session_id,
            report.completed
        );
        self.emit(WizardEvent::SaveAbandoned { step, before_call })?;
        self.emit(WizardEvent::ResponseDiscarded { step })?;
        if !self.token.is_current() && !self.closed {
            // The step is shown again; later submits run under a fresh activation.
            self.token = self.activation.activate(self.route.step);
        }
        Err(WizardError::Cancelled { step })
    }

    // ── Data loading ───────────────────────────────────────────

    /// Fetch the four lookup lists. On failure the previous lists stay.
    pub fn load_reference_data(&mut self) -> WizardResult<()> {
        self.ensure_open()?;
        match ReferenceData::fetch(&mut self.gateway) {
            Ok(data) => {
                self.reference = data;
                Ok(())
            }
            Err(error) => {
                log::warn!("session={} reference data: {error}", self.session_id);
                self.notify_remote_error("Error loading reference data", &error)?;
                Err(WizardError::Remote(error))
            }
        }
    }

    /// Enter edit mode: fetch an existing customer and prefill every step.
    pub fn load_customer(&mut self, customer_id: &str, return_to: Option<String>) -> WizardResult<()> {
        self.require_step(WizardStep::Kyc)?;
        if !self.reference.is_loaded() {
            self.load_reference_data()?;
        }
        let token = self.token.clone();
        let data = match self.gateway.customer(customer_id) {
            Ok(Some(data)) => data,
            Ok(None) => {
                return Err(WizardError::CustomerNotFound {
                    customer_id: customer_id.to_string(),
                });
            }
            Err(error) => {
                self.notify_remote_error("Error", &error)?;
                return Err(WizardError::Remote(error));
            }
        };
        if !token.is_current() {
            let step = token.step();
            self.emit(WizardEvent::ResponseDiscarded { step })?;
            return Err(WizardError::Cancelled { step });
        }

        let prefilled = prefill(&data, &self.config, &self.reference);
        self.state.update(|_| prefilled);
        self.route.customer_id = Some(data.customer.customer_id.clone());
        self.route.return_to = return_to;
        self.emit(WizardEvent::CustomerLoaded {
            customer_id: data.customer.customer_id.clone(),
        })?;
        self.enter(WizardStep::Kyc)
    }

    pub fn dismiss_notification(&mut self, index: usize) {
        if index < self.notifications.len() {
            self.notifications.remove(index);
        }
    }

    // ── Helpers ────────────────────────────────────────────────

    fn ensure_open(&self) -> WizardResult<()> {
        if self.closed {
            Err(WizardError::Closed)
        } else {
            Ok(())
        }
    }

    fn require_step(&self, expected: WizardStep) -> WizardResult<()> {
        self.ensure_open()?;
        if self.route.step != expected {
            return Err(WizardError::WrongStep {
                expected,
                actual: self.route.step,
            });
        }
        Ok(())
    }

    fn guard(&self, step: WizardStep) -> WizardResult<SubmitGuard> {
        self.guards
            .get(&step)
            .cloned()
            .ok_or(WizardError::WrongStep {
                expected: step,
                actual:   self.route.step,
            })
    }

    fn notify_remote_error(&mut self, title: &str, error: &GatewayError) -> WizardResult<()> {
        let description = error
            .message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.generic_error_message.clone());
        self.notify(Notification::error(title, description))
    }

    fn notify(&mut self, notification: Notification) -> WizardResult<()> {
        self.notifications.push(notification.clone());
        self.emit(WizardEvent::Notified { notification })
    }

    fn emit(&mut self, event: WizardEvent) -> WizardResult<()> {
        self.seq += 1;
        self.events.push(EventLogEntry {
            id:         None,
            session_id: self.session_id.clone(),
            seq:        self.seq,
            step:       self.route.step,
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(&event)?,
        });
        Ok(())
    }
}

/// Wizard state for an existing customer.
fn prefill(data: &CustomerData, config: &WizardConfig, reference: &ReferenceData) -> WizardState {
    let kyc_ref = |kyc_id: &str, candidate: Option<KycCandidate>| KycRef {
        kyc_id:     kyc_id.to_string(),
        kyc_type:   candidate.as_ref().map(|c| c.kyc_type.clone()).unwrap_or_default(),
        name:       candidate.map(|c| c.display_name).unwrap_or_default(),
        created_by: config.operator_name.clone(),
        status:     config.default_kyc_status.clone(),
    };
    let non_empty = |id: &str| !id.trim().is_empty();

    let (profile, product) = if let Some(business) = &data.business {
        let f = &business.fields;
        let profile = CustomerProfile::Business {
            legal_entity_name: Some(f.legal_entity_name.clone()),
            account_owners:    std::iter::once(f.business_kyc.as_str())
                .filter(|id| non_empty(*id))
                .map(|id| kyc_ref(id, reference.business_candidate(id)))
                .collect(),
            other_kycs:        std::iter::once(f.directors_kyc.as_str())
                .filter(|id| non_empty(*id))
                .map(|id| kyc_ref(id, reference.individual_candidate(id)))
                .collect(),
        };
        let product = ConfirmedProduct {
            product_type_id:  f.product_types.clone(),
            account_currency: f.account_currency.clone(),
            risk_rating:      f.risk_rating.clone(),
        };
        (Some(profile), Some(product))
    } else if let Some(retail) = &data.retail {
        let f = &retail.fields;
        let profile = CustomerProfile::Retail {
            account_owners: std::iter::once(f.individual_kyc.as_str())
                .filter(|id| non_empty(*id))
                .map(|id| kyc_ref(id, reference.individual_candidate(id)))
                .collect(),
        };
        let product = ConfirmedProduct {
            product_type_id:  f.product_types.clone(),
            account_currency: f.account_currency.clone(),
            risk_rating:      f.risk_rating.clone(),
        };
        (Some(profile), Some(product))
    } else {
        let profile = CustomerType::parse(&data.customer.customer_type).map(CustomerProfile::empty);
        (profile, None)
    };

    WizardState {
        profile,
        product_input: product.as_ref().map(ConfirmedProduct::as_input).unwrap_or_default(),
        product,
        mandates: data.mandates.clone(),
        customer: Some(data.customer.customer_id.clone()),
        business: data.business.as_ref().map(|b| b.business_id.clone()),
        retail: data.retail.as_ref().map(|r| r.retail_id.clone()),
        account: data.customer.accounts.first().cloned(),
        mandate_rules: data.mandate_rules.clone(),
        customer_data: Some(data.clone()),
    }
}

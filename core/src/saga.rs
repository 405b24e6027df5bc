//! Compensable multi-call save protocol.
//!
//! RULE: Steps run strictly in order; each may read what earlier steps
//! stored in the shared context (entity-id chaining). Before every step the
//! activation token is checked. On failure, completed steps are compensated
//! in reverse order when compensation is enabled. Abandonment never
//! compensates: whatever was already written stays server-side.

use crate::{
    activation::ActivationToken,
    gateway::{GatewayError, RemoteGateway},
};

pub trait SagaStep<C> {
    /// Stable step name, used in logs and reports.
    fn name(&self) -> &'static str;

    fn execute(&self, ctx: &mut C, gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError>;

    /// Undo whatever `execute` created. Also called for the failing step
    /// itself, so it must cope with partially completed work.
    fn compensate(&self, _ctx: &C, _gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaOutcome {
    Committed,
    Failed {
        step:                &'static str,
        error:               GatewayError,
        compensated:         Vec<&'static str>,
        compensation_errors: Vec<(&'static str, GatewayError)>,
    },
    /// The activation went stale before `before_step` could start.
    Abandoned { before_step: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaReport {
    pub completed: Vec<&'static str>,
    pub outcome:   SagaOutcome,
}

impl SagaReport {
    pub fn is_committed(&self) -> bool {
        matches!(self.outcome, SagaOutcome::Committed)
    }
}

pub struct Saga<'a, C> {
    name:                  &'static str,
    steps:                 Vec<Box<dyn SagaStep<C> + 'a>>,
    compensate_on_failure: bool,
}

impl<'a, C> Saga<'a, C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            compensate_on_failure: true,
        }
    }

    pub fn compensate_on_failure(mut self, enabled: bool) -> Self {
        self.compensate_on_failure = enabled;
        self
    }

    pub fn step(mut self, step: impl SagaStep<C> + 'a) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn run(
        &self,
        ctx: &mut C,
        gateway: &mut dyn RemoteGateway,
        token: &ActivationToken,
    ) -> SagaReport {
        let mut completed: Vec<&'static str> = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            if !token.is_current() {
                log::warn!(
                    "saga={} abandoned before step={} (completed: {:?})",
                    self.name,
                    step.name(),
                    completed
                );
                return SagaReport {
                    completed,
                    outcome: SagaOutcome::Abandoned {
                        before_step: step.name(),
                    },
                };
            }

            log::debug!("saga={} step={} executing", self.name, step.name());
            match step.execute(ctx, gateway) {
                Ok(()) => completed.push(step.name()),
                Err(error) => {
                    log::warn!("saga={} step={} failed: {error}", self.name, step.name());
                    let (compensated, compensation_errors) = if self.compensate_on_failure {
                        self.compensate(index, ctx, gateway)
                    } else {
                        (Vec::new(), Vec::new())
                    };
                    return SagaReport {
                        completed,
                        outcome: SagaOutcome::Failed {
                            step: step.name(),
                            error,
                            compensated,
                            compensation_errors,
                        },
                    };
                }
            }
        }

        log::info!("saga={} committed {} steps", self.name, completed.len());
        SagaReport {
            completed,
            outcome: SagaOutcome::Committed,
        }
    }

    /// Compensate steps `0..=failed_index` in reverse order.
    fn compensate(
        &self,
        failed_index: usize,
        ctx: &C,
        gateway: &mut dyn RemoteGateway,
    ) -> (Vec<&'static str>, Vec<(&'static str, GatewayError)>) {
        let mut compensated = Vec::new();
        let mut errors = Vec::new();
        for step in self.steps[..=failed_index].iter().rev() {
            match step.compensate(ctx, gateway) {
                Ok(()) => compensated.push(step.name()),
                Err(e) => {
                    log::warn!("saga={} compensation of step={} failed: {e}", self.name, step.name());
                    errors.push((step.name(), e));
                }
            }
        }
        (compensated, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        activation::ActivationHandle, gateway::Operation, reference::ReferenceData,
        route::WizardStep, store::BackOfficeStore,
    };

    /// Records execute/compensate calls into the shared log; fails on demand.
    struct Recording {
        name: &'static str,
        fail: bool,
    }

    impl SagaStep<Vec<String>> for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn execute(&self, ctx: &mut Vec<String>, _gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
            ctx.push(format!("run {}", self.name));
            if self.fail {
                return Err(GatewayError::new(Operation::CreateCustomer, "boom"));
            }
            Ok(())
        }
    }

    /// Invalidates the activation while it runs, like a user leaving mid-call.
    struct Leaving {
        handle: ActivationHandle,
    }

    impl SagaStep<Vec<String>> for Leaving {
        fn name(&self) -> &'static str {
            "leaving"
        }

        fn execute(&self, ctx: &mut Vec<String>, _gateway: &mut dyn RemoteGateway) -> Result<(), GatewayError> {
            ctx.push("run leaving".into());
            self.handle.invalidate();
            Ok(())
        }
    }

    fn store() -> BackOfficeStore {
        BackOfficeStore::in_memory_seeded(&ReferenceData::default_test()).unwrap()
    }

    fn step(name: &'static str, fail: bool) -> Recording {
        Recording { name, fail }
    }

    #[test]
    fn all_steps_commit_in_order() {
        let handle = ActivationHandle::new();
        let token = handle.activate(WizardStep::Mandates);
        let mut ctx = Vec::new();
        let report = Saga::new("t")
            .step(step("a", false))
            .step(step("b", false))
            .run(&mut ctx, &mut store(), &token);
        assert!(report.is_committed());
        assert_eq!(report.completed, vec!["a", "b"]);
        assert_eq!(ctx, vec!["run a", "run b"]);
    }

    /// The failing step and everything before it are compensated, newest first.
    #[test]
    fn failure_compensates_in_reverse() {
        let handle = ActivationHandle::new();
        let token = handle.activate(WizardStep::Mandates);
        let mut ctx = Vec::new();
        let report = Saga::new("t")
            .step(step("a", false))
            .step(step("b", false))
            .step(step("c", true))
            .step(step("d", false))
            .run(&mut ctx, &mut store(), &token);

        let SagaOutcome::Failed { step, compensated, compensation_errors, .. } = report.outcome else {
            panic!("expected failure");
        };
        assert_eq!(step, "c");
        assert_eq!(compensated, vec!["c", "b", "a"]);
        assert!(compensation_errors.is_empty());
        assert_eq!(report.completed, vec!["a", "b"]);
        assert!(!ctx.contains(&"run d".to_string()));
    }

    #[test]
    fn disabled_compensation_reports_nothing_compensated() {
        let handle = ActivationHandle::new();
        let token = handle.activate(WizardStep::Mandates);
        let report = Saga::new("t")
            .compensate_on_failure(false)
            .step(step("a", false))
            .step(step("b", true))
            .run(&mut Vec::new(), &mut store(), &token);
        let SagaOutcome::Failed { compensated, .. } = report.outcome else {
            panic!("expected failure");
        };
        assert!(compensated.is_empty());
    }

    /// A stale token stops the run before the next step; nothing is compensated.
    #[test]
    fn stale_token_abandons_before_next_step() {
        let handle = ActivationHandle::new();
        let token = handle.activate(WizardStep::Mandates);
        let mut ctx = Vec::new();
        let report = Saga::new("t")
            .step(Leaving { handle: handle.clone() })
            .step(step("b", false))
            .run(&mut ctx, &mut store(), &token);
        assert_eq!(report.outcome, SagaOutcome::Abandoned { before_step: "b" });
        assert_eq!(report.completed, vec!["leaving"]);
        assert_eq!(ctx, vec!["run leaving"]);
    }
}

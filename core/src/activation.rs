//! Submit guards and per-activation cancellation tokens.
//!
//! A step that fires remote calls holds a `SubmitPermit` for the duration
//! of the submit. Every state write that follows a remote call first checks
//! the `ActivationToken` it was started with; once the step is left (or the
//! wizard abandoned) the token is stale and the write is dropped.

use crate::{
    error::{WizardError, WizardResult},
    route::WizardStep,
};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

/// Issues activation tokens and invalidates them.
#[derive(Debug, Clone, Default)]
pub struct ActivationHandle {
    generation: Arc<AtomicU64>,
}

impl ActivationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new activation. All previously issued tokens become stale.
    pub fn activate(&self, step: WizardStep) -> ActivationToken {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        ActivationToken {
            step,
            generation,
            source: Arc::clone(&self.generation),
        }
    }

    /// Invalidate every outstanding token without starting a new activation.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Proof that a step activation is still the current one.
#[derive(Debug, Clone)]
pub struct ActivationToken {
    step:       WizardStep,
    generation: u64,
    source:     Arc<AtomicU64>,
}

impl ActivationToken {
    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_current(&self) -> bool {
        self.source.load(Ordering::SeqCst) == self.generation
    }
}

/// Prevents a step from being submitted twice while a submit is in flight.
#[derive(Debug, Clone)]
pub struct SubmitGuard {
    step:      WizardStep,
    in_flight: Arc<AtomicBool>,
}

impl SubmitGuard {
    pub fn new(step: WizardStep) -> Self {
        Self {
            step,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn try_acquire(&self) -> WizardResult<SubmitPermit> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("step={} duplicate submit rejected", self.step);
            return Err(WizardError::SubmitInFlight { step: self.step });
        }
        Ok(SubmitPermit {
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Held while a submit runs; releases the guard on drop.
#[derive(Debug)]
pub struct SubmitPermit {
    in_flight: Arc<AtomicBool>,
}

impl Drop for SubmitPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

use crate::{
    gate::GateFailure,
    gateway::GatewayError,
    route::WizardStep,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Remote(#[from] GatewayError),

    #[error("{}: {}", .0.title, .0.description)]
    Gate(GateFailure),

    #[error("Customer type has not been selected")]
    CustomerTypeNotSelected,

    #[error("Step '{step}' already has a submission in flight")]
    SubmitInFlight { step: WizardStep },

    #[error("Step '{step}' is no longer active; response discarded")]
    Cancelled { step: WizardStep },

    #[error("Command for step '{expected}' received while on step '{actual}'")]
    WrongStep { expected: WizardStep, actual: WizardStep },

    #[error("State changed underneath the writer: expected version {expected}, found {actual}")]
    StaleWrite { expected: u64, actual: u64 },

    #[error("Customer '{customer_id}' not found")]
    CustomerNotFound { customer_id: String },

    #[error("Wizard is closed")]
    Closed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type WizardResult<T> = Result<T, WizardError>;

/// A single inline field error, shown next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field:   String,
    pub message: String,
}

/// All field errors collected for one submit attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field:   field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Ok when no errors were collected, otherwise a `WizardError::Validation`.
    pub fn into_result(self) -> WizardResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(WizardError::Validation(self))
        }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> WizardError {
        let mut errors = Self::new();
        errors.push(field, message);
        WizardError::Validation(errors)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

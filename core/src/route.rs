//! Wizard step state machine and the route the surrounding router renders.
//!
//! Start -> Kyc -> Products -> Mandates -> MandateRules -> Done
//! Forward moves are gated (see gate.rs); backward moves never are.

use crate::types::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Kyc,
    Products,
    Mandates,
    MandateRules,
    Done,
}

impl WizardStep {
    pub fn next(&self) -> Option<WizardStep> {
        match self {
            Self::Kyc          => Some(Self::Products),
            Self::Products     => Some(Self::Mandates),
            Self::Mandates     => Some(Self::MandateRules),
            Self::MandateRules => Some(Self::Done),
            Self::Done         => None,
        }
    }

    pub fn previous(&self) -> Option<WizardStep> {
        match self {
            Self::Kyc          => None,
            Self::Products     => Some(Self::Kyc),
            Self::Mandates     => Some(Self::Products),
            Self::MandateRules => Some(Self::Mandates),
            Self::Done         => Some(Self::MandateRules),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Kyc          => "kyc",
            Self::Products     => "products",
            Self::Mandates     => "mandates",
            Self::MandateRules => "mandate_rules",
            Self::Done         => "done",
        }
    }

    pub fn from_name(name: &str) -> Option<WizardStep> {
        [Self::Kyc, Self::Products, Self::Mandates, Self::MandateRules, Self::Done]
            .into_iter()
            .find(|s| s.name() == name)
    }

    /// Path segment under the wizard base ("" for the first step).
    fn segment(&self) -> &'static str {
        match self {
            Self::Kyc          => "",
            Self::Products     => "products",
            Self::Mandates     => "mandates",
            Self::MandateRules => "mandate-rules",
            Self::Done         => "done",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardRoute {
    pub base:        String,
    pub step:        WizardStep,
    /// Set in edit mode; routes are then nested under the customer id.
    pub customer_id: Option<EntityId>,
    pub return_to:   Option<String>,
}

impl WizardRoute {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base:        base.into(),
            step:        WizardStep::Kyc,
            customer_id: None,
            return_to:   None,
        }
    }

    pub fn is_edit_mode(&self) -> bool {
        self.customer_id.is_some()
    }

    /// Path for `step` in the current mode.
    pub fn path_for(&self, step: WizardStep) -> String {
        let base = self.base.trim_end_matches('/');
        match &self.customer_id {
            Some(id) => format!("{base}/{id}/{}", step.segment()),
            None     => format!("{base}/{}", step.segment()),
        }
    }

    pub fn path(&self) -> String {
        self.path_for(self.step)
    }

    /// Advance one step. Returns the new step, or None when already done.
    pub fn advance(&mut self) -> Option<WizardStep> {
        let next = self.step.next()?;
        self.step = next;
        Some(next)
    }

    pub fn retreat(&mut self) -> Option<WizardStep> {
        let prev = self.step.previous()?;
        self.step = prev;
        Some(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_mode_paths() {
        let route = WizardRoute::new("/customers/customer-wizard");
        assert_eq!(route.path(), "/customers/customer-wizard/");
        assert_eq!(
            route.path_for(WizardStep::MandateRules),
            "/customers/customer-wizard/mandate-rules"
        );
    }

    #[test]
    fn edit_mode_paths_nest_under_customer() {
        let mut route = WizardRoute::new("/customers/customer-wizard/");
        route.customer_id = Some("c-42".into());
        assert_eq!(
            route.path_for(WizardStep::Mandates),
            "/customers/customer-wizard/c-42/mandates"
        );
    }

    #[test]
    fn linear_walk_forward_and_back() {
        let mut route = WizardRoute::new("/w");
        let mut seen = vec![route.step];
        while let Some(step) = route.advance() {
            seen.push(step);
        }
        assert_eq!(
            seen,
            vec![
                WizardStep::Kyc,
                WizardStep::Products,
                WizardStep::Mandates,
                WizardStep::MandateRules,
                WizardStep::Done,
            ]
        );
        assert_eq!(route.retreat(), Some(WizardStep::MandateRules));
    }
}

//! KYC / account-owner selection.
//!
//! Staging only: nothing here talks to the gateway.

use crate::{
    config::WizardConfig,
    error::{ValidationErrors, WizardError, WizardResult},
    reference::{KycCandidate, KycKind},
    state::{CustomerProfile, CustomerType, KycRef, WizardState},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycList {
    AccountOwners,
    OtherKycs,
}

impl KycList {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountOwners => "accountOwners",
            Self::OtherKycs     => "otherKYCs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KycSelection {
    Staged,
    /// A KYC with the same id is already in the list; nothing changed.
    DuplicateIgnored,
}

/// The candidate kind each (customer type, list) slot accepts.
fn accepted_kind(customer_type: CustomerType, list: KycList) -> Option<KycKind> {
    match (customer_type, list) {
        (CustomerType::Retail, KycList::AccountOwners)   => Some(KycKind::Individual),
        (CustomerType::Retail, KycList::OtherKycs)       => None,
        (CustomerType::Business, KycList::AccountOwners) => Some(KycKind::Business),
        (CustomerType::Business, KycList::OtherKycs)     => Some(KycKind::Individual),
    }
}

/// Stage `candidate` into `list`, returning the next state.
pub fn select_kyc(
    state: &WizardState,
    list: KycList,
    candidate: &KycCandidate,
    config: &WizardConfig,
) -> WizardResult<(WizardState, KycSelection)> {
    let profile = state.profile.as_ref().ok_or(WizardError::CustomerTypeNotSelected)?;
    let customer_type = profile.customer_type();

    match accepted_kind(customer_type, list) {
        None => {
            return Err(ValidationErrors::single(
                list.name(),
                format!("{} customers have no {} list", customer_type, list.name()),
            ));
        }
        Some(kind) if kind != candidate.kind => {
            return Err(ValidationErrors::single(
                list.name(),
                format!("Expected a {kind:?} KYC for {}", list.name()),
            ));
        }
        Some(_) => {}
    }

    let entry = KycRef {
        kyc_id:     candidate.kyc_id.clone(),
        kyc_type:   candidate.kyc_type.clone(),
        name:       candidate.display_name.clone(),
        created_by: config.operator_name.clone(),
        status:     config.default_kyc_status.clone(),
    };

    let mut next_profile = profile.clone();
    let target = match (&mut next_profile, list) {
        (CustomerProfile::Retail { account_owners }, _) => account_owners,
        (CustomerProfile::Business { account_owners, .. }, KycList::AccountOwners) => account_owners,
        (CustomerProfile::Business { other_kycs, .. }, KycList::OtherKycs) => other_kycs,
    };

    if target.iter().any(|k| k.kyc_id == entry.kyc_id) {
        log::debug!("{}: duplicate kyc {} ignored", list.name(), entry.kyc_id);
        return Ok((state.clone(), KycSelection::DuplicateIgnored));
    }
    target.push(entry);

    if let (
        CustomerProfile::Business {
            legal_entity_name, ..
        },
        KycList::AccountOwners,
    ) = (&mut next_profile, list)
    {
        *legal_entity_name = candidate.legal_entity_name.clone();
    }

    let next = WizardState {
        profile: Some(next_profile),
        ..state.clone()
    };
    Ok((next, KycSelection::Staged))
}

/// Unstage `kyc_id` from `list`. Returns whether anything was removed.
pub fn remove_kyc(
    state: &WizardState,
    list: KycList,
    kyc_id: &str,
) -> WizardResult<(WizardState, bool)> {
    let profile = state.profile.as_ref().ok_or(WizardError::CustomerTypeNotSelected)?;
    let mut next_profile = profile.clone();
    let target = match (&mut next_profile, list) {
        (CustomerProfile::Retail { account_owners }, KycList::AccountOwners) => account_owners,
        (CustomerProfile::Retail { .. }, KycList::OtherKycs) => return Ok((state.clone(), false)),
        (CustomerProfile::Business { account_owners, .. }, KycList::AccountOwners) => account_owners,
        (CustomerProfile::Business { other_kycs, .. }, KycList::OtherKycs) => other_kycs,
    };
    let before = target.len();
    target.retain(|k| k.kyc_id != kyc_id);
    if target.len() == before {
        return Ok((state.clone(), false));
    }
    let next = WizardState {
        profile: Some(next_profile),
        ..state.clone()
    };
    Ok((next, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual(id: &str) -> KycCandidate {
        KycCandidate {
            kyc_id:            id.into(),
            kyc_type:          "individual".into(),
            kind:              KycKind::Individual,
            display_name:      "Jane Doe".into(),
            legal_entity_name: None,
        }
    }

    fn business(id: &str, name: &str) -> KycCandidate {
        KycCandidate {
            kyc_id:            id.into(),
            kyc_type:          "business".into(),
            kind:              KycKind::Business,
            display_name:      name.into(),
            legal_entity_name: Some(name.into()),
        }
    }

    fn typed(customer_type: CustomerType) -> WizardState {
        WizardState::default().with_customer_type(customer_type)
    }

    #[test]
    fn requires_customer_type() {
        let config = WizardConfig::default_test();
        let err = select_kyc(&WizardState::default(), KycList::AccountOwners, &individual("K1"), &config)
            .unwrap_err();
        assert!(matches!(err, WizardError::CustomerTypeNotSelected));
    }

    #[test]
    fn staged_entry_carries_operator_and_status() {
        let config = WizardConfig::default_test();
        let (state, outcome) =
            select_kyc(&typed(CustomerType::Retail), KycList::AccountOwners, &individual("K1"), &config)
                .unwrap();
        assert_eq!(outcome, KycSelection::Staged);
        let owner = &state.account_owners()[0];
        assert_eq!(owner.created_by, "Test Operator");
        assert_eq!(owner.status, "Pending");
    }

    #[test]
    fn business_owner_sets_legal_entity_name() {
        let config = WizardConfig::default_test();
        let (state, _) = select_kyc(
            &typed(CustomerType::Business),
            KycList::AccountOwners,
            &business("BK1", "Acme Ltd"),
            &config,
        )
        .unwrap();
        assert_eq!(state.legal_entity_name(), Some("Acme Ltd"));
    }

    #[test]
    fn kind_mismatch_and_retail_directors_are_rejected() {
        let config = WizardConfig::default_test();
        let retail = typed(CustomerType::Retail);
        assert!(matches!(
            select_kyc(&retail, KycList::AccountOwners, &business("BK1", "Acme"), &config),
            Err(WizardError::Validation(_))
        ));
        assert!(matches!(
            select_kyc(&retail, KycList::OtherKycs, &individual("K1"), &config),
            Err(WizardError::Validation(_))
        ));
        let biz = typed(CustomerType::Business);
        assert!(matches!(
            select_kyc(&biz, KycList::OtherKycs, &business("BK1", "Acme"), &config),
            Err(WizardError::Validation(_))
        ));
    }

    #[test]
    fn remove_unstages_entry() {
        let config = WizardConfig::default_test();
        let (state, _) =
            select_kyc(&typed(CustomerType::Retail), KycList::AccountOwners, &individual("K1"), &config)
                .unwrap();
        let (state, removed) = remove_kyc(&state, KycList::AccountOwners, "K1").unwrap();
        assert!(removed);
        assert!(state.account_owners().is_empty());
        let (_, removed) = remove_kyc(&state, KycList::AccountOwners, "K1").unwrap();
        assert!(!removed);
    }
}

//! Reference-data adapters: the lookup lists every step renders from.

use crate::{
    gateway::{
        BusinessKyc, GatewayResult, IndividualKyc, MandateType, ProductType, RemoteGateway,
    },
    types::KycId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycKind {
    Individual,
    Business,
}

/// A KYC record offered in the selector dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycCandidate {
    pub kyc_id:            KycId,
    pub kyc_type:          String,
    pub kind:              KycKind,
    pub display_name:      String,
    /// Only set for business candidates.
    pub legal_entity_name: Option<String>,
}

impl From<&IndividualKyc> for KycCandidate {
    fn from(kyc: &IndividualKyc) -> Self {
        Self {
            kyc_id:            kyc.individual_kyc_id.clone(),
            kyc_type:          kyc.kyc_type.clone(),
            kind:              KycKind::Individual,
            display_name:      full_name(kyc),
            legal_entity_name: None,
        }
    }
}

impl From<&BusinessKyc> for KycCandidate {
    fn from(kyc: &BusinessKyc) -> Self {
        Self {
            kyc_id:            kyc.business_kyc_id.clone(),
            kyc_type:          kyc.kyc_type.clone(),
            kind:              KycKind::Business,
            display_name:      kyc.legal_entity_name.clone(),
            legal_entity_name: Some(kyc.legal_entity_name.clone()),
        }
    }
}

fn full_name(kyc: &IndividualKyc) -> String {
    format!("{} {}", kyc.first_name.trim(), kyc.last_name.trim())
        .trim()
        .to_string()
}

/// `value`/`label` pair for a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub individual_kycs: Vec<IndividualKyc>,
    #[serde(default)]
    pub business_kycs:   Vec<BusinessKyc>,
    #[serde(default)]
    pub product_types:   Vec<ProductType>,
    #[serde(default)]
    pub mandate_types:   Vec<MandateType>,
    #[serde(skip)]
    loaded:              bool,
}

impl ReferenceData {
    /// Issue the four lookup queries. Any failure aborts the whole fetch.
    pub fn fetch(gateway: &mut dyn RemoteGateway) -> GatewayResult<Self> {
        let individual_kycs = gateway.individual_kycs()?;
        let business_kycs = gateway.business_kycs()?;
        let product_types = gateway.product_types()?;
        let mandate_types = gateway.mandate_types()?;
        log::debug!(
            "reference data: {} individual, {} business, {} product types, {} mandate types",
            individual_kycs.len(),
            business_kycs.len(),
            product_types.len(),
            mandate_types.len()
        );
        Ok(Self {
            individual_kycs,
            business_kycs,
            product_types,
            mandate_types,
            loaded: true,
        })
    }

    /// Read a seed file (`{data_dir}/reference/reference_data.json`).
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/reference/reference_data.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let data: ReferenceData = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Seed used by tests and the demo run.
    pub fn default_test() -> Self {
        let individual = |id: &str, first: &str, last: &str| IndividualKyc {
            individual_kyc_id: id.into(),
            kyc_type:          "individual".into(),
            first_name:        first.into(),
            last_name:         last.into(),
            risk_rating:       "Low".into(),
        };
        Self {
            individual_kycs: vec![
                individual("K1", "Jane", "Doe"),
                individual("K2", "John", "Roe"),
                individual("DK1", "Dana", "Director"),
            ],
            business_kycs: vec![BusinessKyc {
                business_kyc_id:   "BK1".into(),
                kyc_type:          "business".into(),
                legal_entity_name: "Acme Ltd".into(),
                risk_rating:       "Medium".into(),
            }],
            product_types: vec![
                ProductType {
                    product_type_id:   "P1".into(),
                    product_type_name: "Current Account".into(),
                },
                ProductType {
                    product_type_id:   "SAV-01".into(),
                    product_type_name: "Savings Account".into(),
                },
            ],
            mandate_types: vec![
                MandateType {
                    mandate_type_id:   "M1".into(),
                    mandate_type_name: "Sole Signatory".into(),
                    mandate_type_code: "SOLE".into(),
                },
                MandateType {
                    mandate_type_id:   "M2".into(),
                    mandate_type_name: "Joint Signatories".into(),
                    mandate_type_code: "JOINT".into(),
                },
            ],
            loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn individual_candidate(&self, kyc_id: &str) -> Option<KycCandidate> {
        self.individual_kycs
            .iter()
            .find(|k| k.individual_kyc_id == kyc_id)
            .map(KycCandidate::from)
    }

    pub fn business_candidate(&self, kyc_id: &str) -> Option<KycCandidate> {
        self.business_kycs
            .iter()
            .find(|k| k.business_kyc_id == kyc_id)
            .map(KycCandidate::from)
    }

    /// Individual first, then business.
    pub fn candidate(&self, kyc_id: &str) -> Option<KycCandidate> {
        self.individual_candidate(kyc_id)
            .or_else(|| self.business_candidate(kyc_id))
    }

    pub fn has_product_type(&self, product_type_id: &str) -> bool {
        self.product_types
            .iter()
            .any(|p| p.product_type_id == product_type_id)
    }

    pub fn product_type_options(&self) -> Vec<SelectOption> {
        self.product_types
            .iter()
            .map(|p| SelectOption {
                value: p.product_type_id.clone(),
                label: p.product_type_name.clone(),
            })
            .collect()
    }

    pub fn mandate_type_options(&self) -> Vec<SelectOption> {
        self.mandate_types
            .iter()
            .map(|m| SelectOption {
                value: m.mandate_type_id.clone(),
                label: m.mandate_type_name.clone(),
            })
            .collect()
    }

    /// Signatories are picked from the individual KYC list.
    pub fn signatory_options(&self) -> Vec<SelectOption> {
        self.individual_kycs
            .iter()
            .map(|k| SelectOption {
                value: k.individual_kyc_id.clone(),
                label: full_name(k),
            })
            .collect()
    }
}

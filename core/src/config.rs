use serde::{Deserialize, Serialize};

/// Defaults applied to the account opened at the end of onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDefaults {
    pub branch_prefix:         String,
    pub normal_balance:        String,
    pub retail_account_type:   String,
    pub business_account_type: String,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            branch_prefix:         "BRANCH-".into(),
            normal_balance:        "CREDIT".into(),
            retail_account_type:   "Retail".into(),
            business_account_type: "Business".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Sent as `modifiedBy` on every mutation.
    pub operator_id:            String,
    /// Recorded as `createdBy` on staged KYC references.
    pub operator_name:          String,
    pub default_kyc_status:     String,
    pub min_field_len:          usize,
    /// When false a failed save is not rolled back:
    /// records created before the failing call stay, and so do their ids.
    pub compensate_on_failure:  bool,
    pub route_base:             String,
    pub generic_error_message:  String,
    #[serde(default)]
    pub account:                AccountDefaults,
}

#[derive(Debug, Clone, Deserialize)]
struct WizardConfigFile {
    wizard: WizardConfig,
}

impl WizardConfig {
    /// Load from the data/ directory.
    /// In tests, use WizardConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/wizard/wizard_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: WizardConfigFile = serde_json::from_str(&content)?;
        let config = file.wizard;
        if config.min_field_len == 0 {
            anyhow::bail!("{path}: min_field_len must be at least 1");
        }
        if config.operator_id.trim().is_empty() {
            anyhow::bail!("{path}: operator_id must not be empty");
        }
        Ok(config)
    }

    pub fn default_test() -> Self {
        Self {
            operator_id:           "user-test".into(),
            operator_name:         "Test Operator".into(),
            default_kyc_status:    "Pending".into(),
            min_field_len:         3,
            compensate_on_failure: true,
            route_base:            "/customers/customer-wizard".into(),
            generic_error_message: "Something went wrong. Please try again.".into(),
            account:               AccountDefaults::default(),
        }
    }
}

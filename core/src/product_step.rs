//! Product selection. Local validation only; the selection is written to
//! `product_input` and sent to the server later by the mandate step.

use crate::{
    config::WizardConfig,
    error::{ValidationErrors, WizardResult},
    reference::ReferenceData,
    state::{ProductInput, WizardState},
};

fn require(errors: &mut ValidationErrors, field: &str, label: &str, value: &str, min_len: usize) {
    if value.trim().chars().count() < min_len {
        errors.push(field, format!("{label} is required"));
    }
}

pub fn validate_product(
    input: &ProductInput,
    config: &WizardConfig,
    reference: &ReferenceData,
) -> WizardResult<()> {
    let mut errors = ValidationErrors::new();
    let min = config.min_field_len;
    require(&mut errors, "productTypes", "Product Types", &input.product_types, min);
    require(&mut errors, "accountCurrency", "Account Currency", &input.account_currency, min);
    require(&mut errors, "riskRating", "Risk Rating", &input.risk_rating, min);

    // Only checkable once the lookup list has been fetched.
    if reference.is_loaded()
        && !errors.has_field("productTypes")
        && !reference.has_product_type(input.product_types.trim())
    {
        errors.push("productTypes", "Unknown product type");
    }
    errors.into_result()
}

pub fn save_product(
    state: &WizardState,
    input: ProductInput,
    config: &WizardConfig,
    reference: &ReferenceData,
) -> WizardResult<WizardState> {
    validate_product(&input, config, reference)?;
    let product_input = ProductInput::new(
        input.product_types.trim(),
        input.account_currency.trim(),
        input.risk_rating.trim(),
    );
    Ok(WizardState {
        product_input,
        ..state.clone()
    })
}

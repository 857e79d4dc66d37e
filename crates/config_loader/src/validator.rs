//! Config validation
//!
//! Rules:
//! - declarative ranges on every numeric field (`validator` derive)
//! - 0 <= s1_end < s2_end <= lap_length

use contracts::{CircuitProfile, ReplayConfig, ReplayError};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate an engine configuration
///
/// Returns the first violation found, or Ok(()).
pub fn validate(config: &ReplayConfig) -> Result<(), ReplayError> {
    config.validate().map_err(|e| into_contract_error(&e))?;
    if let Some(circuit) = config.circuit {
        validate_sector_order(&CircuitProfile::from(circuit), "circuit")?;
    }
    Ok(())
}

/// Validate a standalone circuit profile
pub fn validate_circuit(profile: &CircuitProfile) -> Result<(), ReplayError> {
    profile.validate().map_err(|e| into_contract_error(&e))?;
    validate_sector_order(profile, "circuit")
}

/// Sector thresholds must be increasing and fit inside the lap
fn validate_sector_order(profile: &CircuitProfile, field: &str) -> Result<(), ReplayError> {
    let bounds = profile.sector_boundaries;
    if bounds.s1_end >= bounds.s2_end {
        return Err(ReplayError::config_validation(
            format!("{field}.s1_end / {field}.s2_end"),
            format!(
                "s1_end ({}) must be < s2_end ({})",
                bounds.s1_end, bounds.s2_end
            ),
        ));
    }
    if bounds.s2_end > profile.lap_length {
        return Err(ReplayError::config_validation(
            format!("{field}.s2_end"),
            format!(
                "s2_end ({}) must be <= lap_length ({})",
                bounds.s2_end, profile.lap_length
            ),
        ));
    }
    Ok(())
}

fn into_contract_error(errors: &ValidationErrors) -> ReplayError {
    let (field, message) =
        first_violation(errors, "").unwrap_or_else(|| ("config".to_string(), errors.to_string()));
    ReplayError::config_validation(field, message)
}

fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(violations) => {
                if let Some(violation) = violations.first() {
                    return Some((path, violation.to_string()));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

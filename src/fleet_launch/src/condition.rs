//! Condition evaluation for gated launch units

use crate::{error::SubstitutionError, ir::Condition, substitution::LaunchContext};

/// Evaluate whether a unit gated by `condition` should run
pub fn evaluate_condition(
    condition: &Condition,
    context: &LaunchContext,
) -> Result<bool, SubstitutionError> {
    match condition {
        Condition::If(expr) => Ok(is_truthy(&expr.resolve(context)?)),
        Condition::Unless(expr) => Ok(!is_truthy(&expr.resolve(context)?)),
        Condition::All(conditions) => {
            for inner in conditions {
                if !evaluate_condition(inner, context)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

/// Determine if a string value is "truthy"
pub fn is_truthy(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    matches!(
        normalized.as_str(),
        "true" | "1" | "yes" | "y" | "on" | "enabled"
    )
}

/// Parse a boolean launch value, rejecting anything that is not clearly true or false
pub fn parse_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_lowercase();
    match normalized.as_str() {
        "true" | "1" | "yes" | "y" | "on" | "enabled" => Some(true),
        "false" | "0" | "no" | "n" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

/// Render a flag the way launch files spell it
pub fn flag_str(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

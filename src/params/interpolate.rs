//! Variable interpolation for strings
//!
//! Run-level config overlays and prompt texts may reference resolved
//! parameters using the ${param} syntax, with environment variables as a
//! fallback.

use crate::error::{ParamError, ParamResult};
use regex::Regex;
use std::collections::HashMap;
use std::env;

/// Interpolate variables in a string
///
/// Supports:
/// - `${param}` - resolved parameter value
/// - Environment variables (when the parameter is not resolved)
///
/// Unresolvable references are left in place.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> ParamResult<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    let mut result = s.to_string();
    let mut seen = std::collections::HashSet::new();

    // Loop to handle nested interpolation
    loop {
        let mut changed = false;

        result = re
            .replace_all(&result, |caps: &regex::Captures| {
                let var_name = &caps[1];

                if !seen.insert(var_name.to_string()) {
                    return format!("${{{}}}", var_name);
                }

                if let Some(value) = vars.get(var_name) {
                    changed = true;
                    return value.clone();
                }

                if let Ok(value) = env::var(var_name) {
                    changed = true;
                    return value;
                }

                format!("${{{}}}", var_name)
            })
            .to_string();

        if !changed {
            break;
        }

        if seen.len() > 100 {
            return Err(ParamError::InvalidValue {
                name: s.to_string(),
                error: "recursive interpolation".to_string(),
            });
        }
    }

    Ok(result)
}

/// Interpolate with strict mode - errors on undefined references
pub fn interpolate_strict(s: &str, vars: &HashMap<String, String>) -> ParamResult<String> {
    let result = interpolate(s, vars)?;

    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    if let Some(caps) = re.captures(&result) {
        return Err(ParamError::UnknownParam(caps[1].to_string()));
    }

    Ok(result)
}

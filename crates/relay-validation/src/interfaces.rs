//! Structural validation of a monitor's interface list

use std::collections::HashSet;
use thiserror::Error;

/// Field path of the interface list in a monitor document
pub const INTERFACES_FIELD: &str = "spec.interfaces";

/// Malformed interface list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Entry is empty once surrounding whitespace is removed
    #[error("spec.interfaces[{index}]: Invalid value: {value:?}: interface cannot be empty")]
    EmptyInterface { index: usize, value: String },

    /// Same interface listed more than once (compared after trimming)
    #[error("spec.interfaces: Invalid value: {interfaces:?}: interfaces must be unique")]
    DuplicateInterfaces { interfaces: Vec<String> },
}

impl ValidationError {
    /// Path of the offending field
    pub fn field(&self) -> String {
        match self {
            ValidationError::EmptyInterface { index, .. } => {
                format!("{}[{}]", INTERFACES_FIELD, index)
            }
            ValidationError::DuplicateInterfaces { .. } => INTERFACES_FIELD.to_string(),
        }
    }
}

/// Check that every entry is non-blank and entries are unique after trimming
///
/// Blank entries are reported before duplicates, at the first offending index.
pub fn validate_interfaces(interfaces: &[String]) -> Result<(), ValidationError> {
    let mut trimmed = Vec::with_capacity(interfaces.len());

    for (index, raw) in interfaces.iter().enumerate() {
        let interface = raw.trim();
        if interface.is_empty() {
            return Err(ValidationError::EmptyInterface {
                index,
                value: raw.clone(),
            });
        }
        trimmed.push(interface);
    }

    let mut seen = HashSet::with_capacity(trimmed.len());
    if trimmed.iter().any(|interface| !seen.insert(*interface)) {
        return Err(ValidationError::DuplicateInterfaces {
            interfaces: trimmed.into_iter().map(str::to_string).collect(),
        });
    }

    Ok(())
}

//! Static validation of compiled program files
//!
//! Catches broken references before a program is ever dispatched. The engine
//! reports the same problems at run time, but only on the path a dispatch
//! actually takes.
//!
//! # Usage
//!
//! ```ignore
//! use action_core::validator::validate_program_file;
//!
//! let errors = validate_program_file(&file);
//! for error in errors.iter().filter(|e| e.is_error()) {
//!     eprintln!("{}", error);
//! }
//! ```
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `validator/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod rules;

use std::fmt;

use crate::types::ProgramFile;

// ============================================================================
// Validation Error Types
// ============================================================================

/// Where in a program file an issue was found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub action_id: Option<String>,
    pub sequence_id: Option<String>,
    pub position: Option<usize>,
    pub block_id: Option<String>,
}

impl Location {
    pub fn action(action_id: &str) -> Self {
        Self {
            action_id: Some(action_id.to_string()),
            ..Self::default()
        }
    }

    pub fn sequence(sequence_id: &str) -> Self {
        Self {
            sequence_id: Some(sequence_id.to_string()),
            ..Self::default()
        }
    }

    pub fn reference(sequence_id: &str, position: usize, block_id: &str) -> Self {
        Self {
            sequence_id: Some(sequence_id.to_string()),
            position: Some(position),
            block_id: Some(block_id.to_string()),
            ..Self::default()
        }
    }

    pub fn block(block_id: &str) -> Self {
        Self {
            block_id: Some(block_id.to_string()),
            ..Self::default()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(a) = &self.action_id {
            parts.push(format!("action '{}'", a));
        }
        if let Some(s) = &self.sequence_id {
            parts.push(format!("sequence '{}'", s));
        }
        if let Some(p) = self.position {
            parts.push(format!("position {}", p));
        }
        if let Some(b) = &self.block_id {
            parts.push(format!("block '{}'", b));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// A problem found in a program file
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: Location,
    /// Human-readable message
    pub message: String,
    pub severity: Severity,
    /// Which rule produced this error
    pub rule_id: &'static str,
}

/// Severity levels for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The engine will fail when it reaches this
    Error,
    /// Probably a mistake, but may work with the right host setup
    Warning,
}

impl ValidationError {
    pub fn error(location: Location, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            location,
            message: message.into(),
            severity: Severity::Error,
            rule_id,
        }
    }

    pub fn warning(location: Location, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            location,
            message: message.into(),
            severity: Severity::Warning,
            rule_id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{} at {}: {} [{}]",
            severity, self.location, self.message, self.rule_id
        )
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait that all validation rules implement
pub trait ValidationRule: Send + Sync {
    /// Unique identifier, e.g. "missing-reference"
    fn id(&self) -> &'static str;

    /// What this rule checks
    fn description(&self) -> &'static str;

    fn validate(&self, file: &ProgramFile) -> Vec<ValidationError>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a validator with all built-in rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::MissingReferenceRule),
                Box::new(rules::ChildReferenceRule),
                Box::new(rules::BranchTargetRule),
                // Warnings: methods and async handlers are registered by the host
                Box::new(rules::UnknownOperationRule),
                Box::new(rules::UnusedOverrideRule),
            ],
        }
    }

    pub fn validate(&self, file: &ProgramFile) -> Vec<ValidationError> {
        self.rules
            .iter()
            .flat_map(|rule| rule.validate(file))
            .collect()
    }

    /// All registered rules as (id, description)
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Run every built-in rule against a program file
pub fn validate_program_file(file: &ProgramFile) -> Vec<ValidationError> {
    Validator::new().validate(file)
}

/// True if the file has at least one error (warnings don't count)
pub fn has_errors(file: &ProgramFile) -> bool {
    validate_program_file(file).iter().any(|e| e.is_error())
}

/// Sorted map keys, so reports come out in a stable order
pub(crate) fn sorted_keys<V>(map: &std::collections::HashMap<String, V>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

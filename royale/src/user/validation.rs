//! Declarative field validation.
//!
//! A rule set is a slice of [`FieldRule`]s evaluated uniformly against any
//! [`FieldSource`]. Evaluation never short-circuits: every violated rule is
//! reported, in rule order, so error messages are deterministic.

use serde::Serialize;
use thiserror::Error;

/// Default minimum accepted password length (inclusive)
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// A single predicate applied to one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Present and not blank
    Required,
    /// At least `n` characters. Absent or blank values are left to `Required`.
    MinLength(usize),
}

/// Binds a rule to a field.
///
/// `label` is the word used in human-facing messages (e.g. `"Password"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub label: &'static str,
    pub rule: Rule,
}

impl FieldRule {
    pub const fn required(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            rule: Rule::Required,
        }
    }

    pub const fn min_length(field: &'static str, label: &'static str, min: usize) -> Self {
        Self {
            field,
            label,
            rule: Rule::MinLength(min),
        }
    }

    fn check(&self, value: Option<&str>) -> Option<Violation> {
        let value = value.filter(|v| !v.trim().is_empty());
        let kind = match (self.rule, value) {
            (Rule::Required, None) => ViolationKind::Missing,
            (Rule::MinLength(min), Some(v)) if v.chars().count() < min => {
                ViolationKind::TooShort { min }
            }
            _ => return None,
        };

        Some(Violation {
            field: self.field,
            label: self.label,
            kind,
        })
    }
}

/// Rules every persisted record must satisfy
pub const RECORD_RULES: &[FieldRule] = &[
    FieldRule::required("username", "username"),
    FieldRule::required("name", "name"),
    FieldRule::required("passwordHash", "passwordHash"),
];

/// Password acceptance policy, applied before hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

/// Rules for an incoming signup request
pub fn signup_rules(policy: &PasswordPolicy) -> [FieldRule; 4] {
    [
        FieldRule::required("username", "username"),
        FieldRule::required("name", "name"),
        FieldRule::required("password", "Password"),
        FieldRule::min_length("password", "Password", policy.min_length),
    ]
}

/// Anything whose fields can be looked up by name
pub trait FieldSource {
    fn field_value(&self, field: &str) -> Option<&str>;
}

/// Evaluate every rule against `source`, collecting all violations
pub fn evaluate<S: FieldSource + ?Sized>(
    rules: &[FieldRule],
    source: &S,
) -> Result<(), ValidationErrors> {
    let violations: Vec<Violation> = rules
        .iter()
        .filter_map(|rule| rule.check(source.field_value(rule.field)))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { violations })
    }
}

/// What went wrong with a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    TooShort { min: usize },
}

/// One failed rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub label: &'static str,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn message(&self) -> String {
        match self.kind {
            ViolationKind::Missing => format!("{} is required", self.label),
            ViolationKind::TooShort { min } => {
                format!("{} must be at least {} characters long", self.label, min)
            }
        }
    }
}

/// Field-level detail for API error bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All violations found by one evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.summary())]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True if any violation concerns `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(Violation::message)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        self.violations
            .iter()
            .map(|v| FieldError {
                field: v.field.to_string(),
                message: v.message(),
            })
            .collect()
    }
}

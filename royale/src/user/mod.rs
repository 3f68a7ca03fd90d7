//! User data model: the stored credential record, its sanitized view, and
//! the validation rules a record must satisfy before it is persisted.

pub mod models;
pub mod validation;

pub use models::{NewUserRecord, SubmissionId, UserId, UserRecord, UserView};
pub use validation::{
    DEFAULT_MIN_PASSWORD_LENGTH, FieldError, FieldRule, FieldSource, PasswordPolicy,
    RECORD_RULES, Rule, ValidationErrors, Violation, ViolationKind, evaluate, signup_rules,
};

impl FieldSource for NewUserRecord {
    fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "username" => Some(&self.username),
            "name" => Some(&self.name),
            "passwordHash" => Some(&self.password_hash),
            _ => None,
        }
    }
}

/// Validate a candidate record against [`RECORD_RULES`]
pub fn validate_record(record: &NewUserRecord) -> Result<(), ValidationErrors> {
    evaluate(RECORD_RULES, record)
}

//! Input validation shared by the generation requests and the wizard steps.
//!
//! Errors carry the field path, a human-readable message and an optional
//! suggestion, and are returned to clients as a 400 body.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex");
}

/// Validation error with detailed, user-friendly messages.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    pub message: String,
    /// Suggestion for how to fix the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create error for empty required field
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
            .with_suggestion(format!("Please enter {}", label.to_lowercase()))
    }

    pub fn too_long(field: &str, label: &str, max: usize) -> Self {
        Self::new(field, format!("{} must be at most {} characters", label, max))
    }

    pub fn invalid_phone(field: &str) -> Self {
        Self::new(field, "Phone number is not valid")
            .with_suggestion("Use 8 to 15 digits, optionally starting with +, e.g. +23276123456")
    }

    pub fn invalid_email(field: &str) -> Self {
        Self::new(field, "Email address is not valid")
            .with_suggestion("Use a format like name@example.com")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors with formatted output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// One-line summary used as the response message.
    pub fn summary(&self) -> String {
        match self.errors.as_slice() {
            [] => String::new(),
            [only] => only.message.clone(),
            many => format!("{} fields need attention", many.len()),
        }
    }

    /// Convert to Result - Ok if no errors, Err with the collected errors otherwise
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trait for validating request objects.
pub trait Validator {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

// ============================================================================
// Validation functions
// ============================================================================

/// Validate that a value is present and not blank
pub fn validate_required(
    value: Option<&str>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.add(ValidationError::empty_field(field, label));
    }
}

pub fn validate_max_len(
    value: Option<&str>,
    max: usize,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) {
    if let Some(value) = value {
        if value.trim().chars().count() > max {
            errors.add(ValidationError::too_long(field, label, max));
        }
    }
}

/// Validate phone number format
pub fn validate_phone(value: Option<&str>, field: &str, errors: &mut ValidationErrors) {
    let trimmed = value.unwrap_or_default().trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field, "Phone number"));
        return;
    }

    let allowed = trimmed
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || (c == '+' && i == 0));
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();

    if !allowed || !(8..=15).contains(&digits) {
        errors.add(ValidationError::invalid_phone(field));
    }
}

/// Validate an optional e-mail address; blank is accepted.
pub fn validate_email_optional(value: Option<&str>, field: &str, errors: &mut ValidationErrors) {
    let trimmed = value.unwrap_or_default().trim();
    if !trimmed.is_empty() && !EMAIL_RE.is_match(trimmed) {
        errors.add(ValidationError::invalid_email(field));
    }
}

/// Trim a value and turn blanks into `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim a value that has already passed `validate_required`.
pub fn clean_required(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_missing_and_blank() {
        let mut errors = ValidationErrors::new();
        validate_required(None, "topic", "Topic", &mut errors);
        validate_required(Some("   "), "genre", "Genre", &mut errors);
        validate_required(Some("Fractions"), "title", "Title", &mut errors);

        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("topic"));
        assert!(errors.has_field("genre"));
        assert_eq!(errors.summary(), "2 fields need attention");
    }

    #[test]
    fn test_phone_rules() {
        let mut errors = ValidationErrors::new();
        validate_phone(Some("+232 76 123 456"), "phone", &mut errors);
        assert!(errors.is_empty());

        validate_phone(Some("12ab"), "phone", &mut errors);
        validate_phone(Some("123"), "phone2", &mut errors);
        validate_phone(None, "phone3", &mut errors);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_optional_email() {
        let mut errors = ValidationErrors::new();
        validate_email_optional(None, "email", &mut errors);
        validate_email_optional(Some(""), "email", &mut errors);
        validate_email_optional(Some("parent@example.sl"), "email", &mut errors);
        assert!(errors.is_empty());

        validate_email_optional(Some("not-an-email"), "email", &mut errors);
        assert_eq!(errors.errors()[0], ValidationError::invalid_email("email"));
    }

    #[test]
    fn test_max_len_counts_chars() {
        let mut errors = ValidationErrors::new();
        validate_max_len(Some("ééé"), 3, "f", "Field", &mut errors);
        assert!(errors.is_empty());
        validate_max_len(Some("abcd"), 3, "f", "Field", &mut errors);
        assert_eq!(errors.summary(), "Field must be at most 3 characters");
    }

    #[test]
    fn test_clean_helpers() {
        assert_eq!(clean_optional(Some("  ".to_string())), None);
        assert_eq!(clean_optional(Some(" JSS2 ".to_string())), Some("JSS2".to_string()));
        assert_eq!(clean_required(Some(" Bo ".to_string())), "Bo");
    }

    #[test]
    fn test_display_lists_errors() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::empty_field("topic", "Topic"));
        let text = errors.to_string();
        assert!(text.starts_with("1. [topic] Topic is required"));
    }
}

//! Structural and business validation for language and translation requests.
//!
//! Violations are collected into a single report rather than failing on the
//! first one, so a caller sees every problem with a request at once.

use crate::config::MAX_TEXT_LENGTH;
use regex::Regex;
use std::sync::OnceLock;

/// Aggregated validation outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the report, returning Err with all messages when invalid.
    pub fn into_result(self) -> Result<(), crate::error::ServiceError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(crate::error::ServiceError::Validation(self.errors))
        }
    }
}

/// Validator for incoming create/update requests.
pub struct RequestValidator;

// Pattern cached for reuse across requests.
static CODE_REGEX: OnceLock<Regex> = OnceLock::new();

fn code_regex() -> &'static Regex {
    CODE_REGEX.get_or_init(|| Regex::new(r"(?i)^[a-z]{2}$").expect("valid regex"))
}

impl RequestValidator {
    /// Check a language code's shape: exactly two letters, case-insensitive.
    pub fn is_valid_code(code: &str) -> bool {
        code_regex().is_match(code)
    }

    /// Validate the fields of a language create/update request.
    ///
    /// Rules: code required and two letters; name required, 2-100 chars;
    /// local name, when present, at least 2 chars.
    pub fn validate_language(
        code: &str,
        name: &str,
        local_name: Option<&str>,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        if code.is_empty() {
            report.errors.push("language code is required".to_string());
        } else if !Self::is_valid_code(code) {
            report.errors.push(format!(
                "language code '{}' must be a 2-letter ISO 639-1 code",
                code
            ));
        }

        let name_len = name.chars().count();
        if name.is_empty() {
            report.errors.push("language name is required".to_string());
        } else if !(2..=100).contains(&name_len) {
            report
                .errors
                .push("language name must be between 2 and 100 characters".to_string());
        }

        if let Some(local) = local_name {
            if local.chars().count() < 2 {
                report
                    .errors
                    .push("local name must be at least 2 characters".to_string());
            }
        }

        report
    }

    /// Validate the fields of a translation create/update request.
    ///
    /// Rules: original and destination required, non-empty, at most 5000
    /// chars each; language code required.
    pub fn validate_translation(
        original: &str,
        destination: &str,
        language_code: &str,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        if original.trim().is_empty() {
            report.errors.push("original text is required".to_string());
        } else if original.chars().count() > MAX_TEXT_LENGTH {
            report.errors.push(format!(
                "original text exceeds {} characters",
                MAX_TEXT_LENGTH
            ));
        }

        if destination.trim().is_empty() {
            report
                .errors
                .push("destination text is required".to_string());
        } else if destination.chars().count() > MAX_TEXT_LENGTH {
            report.errors.push(format!(
                "destination text exceeds {} characters",
                MAX_TEXT_LENGTH
            ));
        }

        if language_code.is_empty() {
            report.errors.push("language code is required".to_string());
        }

        report
    }

    /// Validate a single translate request's text and target language shape.
    pub fn validate_translate_request(text: &str, target_language: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        if text.trim().is_empty() {
            report.errors.push("text is required".to_string());
        } else if text.chars().count() > MAX_TEXT_LENGTH {
            report
                .errors
                .push(format!("text exceeds {} characters", MAX_TEXT_LENGTH));
        }

        if !Self::is_valid_code(target_language) {
            report.errors.push(format!(
                "target language '{}' must be a 2-letter ISO 639-1 code",
                target_language
            ));
        }

        report
    }
}

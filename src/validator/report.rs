use std::fmt;

use serde::Serialize;

pub const REPORT_HEADER: &str = "Model Validation Error(s):";
pub const MISSING_LABEL: &str = "Missing parameters in request: ";
pub const INVALID_LABEL: &str = "Invalid parameters in request: ";

/// Missing-property and failed-rule messages collected for one payload.
///
/// Each list keeps first-occurrence order and holds no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    missing: Vec<String>,
    invalid: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    #[must_use]
    pub fn invalid(&self) -> &[String] {
        &self.invalid
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    pub fn push_missing(&mut self, message: String) {
        if !self.missing.contains(&message) {
            self.missing.push(message);
        }
    }

    pub fn push_invalid(&mut self, message: String) {
        if !self.invalid.contains(&message) {
            self.invalid.push(message);
        }
    }

    /// The client-facing message, or `None` when the payload passed.
    #[must_use]
    pub fn to_message(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REPORT_HEADER}")?;
        if !self.missing.is_empty() {
            write!(f, "\n{MISSING_LABEL}{}", self.missing.join(", "))?;
        }
        if !self.invalid.is_empty() {
            write!(f, "\n{INVALID_LABEL}{}", self.invalid.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_has_no_message() {
        assert_eq!(ValidationReport::new().to_message(), None);
    }

    #[test]
    fn test_message_layout_and_dedup() {
        let mut report = ValidationReport::new();
        report.push_missing("Missing or undefined property in payload: id".to_string());
        report.push_invalid("Invalid format [Range] on id".to_string());
        report.push_invalid("Invalid format [Range] on id".to_string());
        assert_eq!(report.invalid().len(), 1);
        assert_eq!(
            report.to_message().unwrap(),
            "Model Validation Error(s):\n\
             Missing parameters in request: Missing or undefined property in payload: id\n\
             Invalid parameters in request: Invalid format [Range] on id"
        );
    }

    #[test]
    fn test_empty_section_is_omitted() {
        let mut report = ValidationReport::new();
        report.push_invalid("Invalid format [Email] on value".to_string());
        assert_eq!(
            report.to_string(),
            "Model Validation Error(s):\nInvalid parameters in request: Invalid format [Email] on value"
        );
    }
}

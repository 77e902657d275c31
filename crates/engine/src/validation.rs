//! Aggregated input validation.
//!
//! Every operation validates its whole input before touching the store, so a
//! single request reports all broken constraints at once instead of only the
//! first one.

use crate::{EngineError, ResultEngine};

/// Collects field violations across one input record.
#[derive(Debug, Default)]
pub(crate) struct Violations {
    messages: Vec<String>,
}

impl Violations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// A required text field: trimmed, non-empty, bounded length.
    ///
    /// Returns the normalized value; on violation the returned string is
    /// unusable but [`into_result`](Self::into_result) fails before any
    /// caller can persist it.
    pub(crate) fn required_text(&mut self, value: &str, label: &str, max: usize) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(format!("{label} must not be empty"));
        } else if trimmed.chars().count() > max {
            self.push(format!("{label} must be at most {max} characters"));
        }
        trimmed.to_string()
    }

    /// An optional text field: empty input collapses to `None`.
    pub(crate) fn optional_text(
        &mut self,
        value: Option<&str>,
        label: &str,
        max: usize,
    ) -> Option<String> {
        let trimmed = value.map(str::trim).filter(|s| !s.is_empty())?;
        if trimmed.chars().count() > max {
            self.push(format!("{label} must be at most {max} characters"));
        }
        Some(trimmed.to_string())
    }

    pub(crate) fn email(&mut self, value: &str, label: &str) -> String {
        let trimmed = self.required_text(value, label, 255);
        if !trimmed.is_empty() && !trimmed.contains('@') {
            self.push(format!("{label} must be a valid email address"));
        }
        trimmed
    }

    /// Passwords are checked as-is: no trimming, surrounding spaces count.
    pub(crate) fn password(&mut self, value: &str, label: &str, max: usize) {
        if value.is_empty() {
            self.push(format!("{label} must not be empty"));
        } else if value.chars().count() > max {
            self.push(format!("{label} must be at most {max} characters"));
        }
    }

    pub(crate) fn into_result(self) -> ResultEngine<()> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self.messages.join(". ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collector_passes() {
        assert_eq!(Violations::new().into_result(), Ok(()));
    }

    #[test]
    fn collects_every_violation_into_one_message() {
        let mut check = Violations::new();
        check.required_text("", "name", 100);
        check.optional_text(Some("x".repeat(256).as_str()), "note", 255);
        let err = check.into_result().unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(
                "name must not be empty. note must be at most 255 characters".to_string()
            )
        );
    }

    #[test]
    fn required_text_trims() {
        let mut check = Violations::new();
        assert_eq!(check.required_text("  Living  ", "name", 100), "Living");
        assert_eq!(check.into_result(), Ok(()));
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let mut check = Violations::new();
        check.required_text("   ", "name", 100);
        assert!(check.into_result().is_err());
    }

    #[test]
    fn optional_text_collapses_empty_to_none() {
        let mut check = Violations::new();
        assert_eq!(check.optional_text(Some("   "), "note", 255), None);
        assert_eq!(check.optional_text(None, "note", 255), None);
        assert_eq!(
            check.optional_text(Some(" rent "), "note", 255),
            Some("rent".to_string())
        );
        assert_eq!(check.into_result(), Ok(()));
    }

    #[test]
    fn email_requires_at_sign() {
        let mut check = Violations::new();
        check.email("not-an-email", "email");
        assert_eq!(
            check.into_result(),
            Err(EngineError::Validation(
                "email must be a valid email address".to_string()
            ))
        );
    }

    #[test]
    fn password_keeps_surrounding_spaces() {
        let mut check = Violations::new();
        check.password("  secret  ", "password", 100);
        assert_eq!(check.into_result(), Ok(()));
    }
}

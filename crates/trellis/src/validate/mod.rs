//! Input validation for bound widgets.
//!
//! Two layers live here:
//!
//! - [`Validator`] - the custom business-rule hook an application can attach
//!   to a bound attribute. It runs immediately after type conversion
//!   succeeds and may reject an otherwise well-typed value; its message
//!   takes display precedence.
//! - [`FeedbackMachine`] - the per-widget state machine that decides *when*
//!   an invalid value is announced to the user: errors are surfaced after a
//!   grace period, not on every keystroke.
//!
//! # Example
//!
//! ```
//! use trellis::convert::Value;
//! use trellis::validate::{FnValidator, ValidationError, Validator};
//!
//! let adults_only = FnValidator::new(|value: &Value| {
//!     match value.as_int() {
//!         Some(age) if age >= 18 => Ok(()),
//!         Some(_) => Err(ValidationError::new("must be 18 or older")),
//!         None => Ok(()),
//!     }
//! });
//!
//! assert!(adults_only.check(&Value::Int(21)).is_ok());
//! assert!(adults_only.check(&Value::Int(12)).is_err());
//! ```

use std::sync::Arc;

use crate::convert::Value;

mod feedback;

pub use feedback::{FeedbackConfig, FeedbackMachine, FeedbackPhase, FeedbackSurface};

/// A recoverable business-rule rejection of a well-typed value.
///
/// Handled exactly like a conversion error: captured as feedback state and
/// surfaced asynchronously, never propagated as a panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Create a validation error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Application-supplied check for a bound attribute's value.
///
/// Checked immediately after type conversion succeeds; a rejection keeps
/// the model untouched and drives the feedback machinery with the
/// rejection's message.
pub trait Validator: Send + Sync {
    /// Accept or reject a converted value.
    fn check(&self, value: &Value) -> Result<(), ValidationError>;
}

// Allow using Arc<dyn Validator> as a Validator
impl<V: Validator + ?Sized> Validator for Arc<V> {
    fn check(&self, value: &Value) -> Result<(), ValidationError> {
        (**self).check(value)
    }
}

// Allow using Box<dyn Validator> as a Validator
impl<V: Validator + ?Sized> Validator for Box<V> {
    fn check(&self, value: &Value) -> Result<(), ValidationError> {
        (**self).check(value)
    }
}

/// A validator backed by a closure.
pub struct FnValidator<F>
where
    F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync,
{
    check_fn: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync,
{
    /// Create a validator from the given closure.
    pub fn new(check_fn: F) -> Self {
        Self { check_fn }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync,
{
    fn check(&self, value: &Value) -> Result<(), ValidationError> {
        (self.check_fn)(value)
    }
}

/// A validator that matches string values against a regular expression.
///
/// Non-string values pass unchecked; attach pattern validators to string
/// attributes.
///
/// # Example
///
/// ```
/// use trellis::convert::Value;
/// use trellis::validate::{PatternValidator, Validator};
///
/// let zip = PatternValidator::new(r"^\d{5}$", "expected a 5-digit code").unwrap();
/// assert!(zip.check(&Value::Str("12345".into())).is_ok());
/// assert!(zip.check(&Value::Str("abc".into())).is_err());
/// ```
pub struct PatternValidator {
    pattern: regex::Regex,
    message: String,
}

impl PatternValidator {
    /// Create a pattern validator with the given regex and rejection message.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: regex::Regex::new(pattern)?,
            message: message.into(),
        })
    }

    /// The pattern string.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Validator for PatternValidator {
    fn check(&self, value: &Value) -> Result<(), ValidationError> {
        match value.as_str() {
            Some(s) if !self.pattern.is_match(s) => Err(ValidationError::new(&self.message)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_validator() {
        let positive = FnValidator::new(|value: &Value| match value.as_int() {
            Some(v) if v <= 0 => Err(ValidationError::new("must be positive")),
            _ => Ok(()),
        });

        assert!(positive.check(&Value::Int(1)).is_ok());
        let err = positive.check(&Value::Int(-1)).unwrap_err();
        assert_eq!(err.message(), "must be positive");
    }

    #[test]
    fn test_pattern_validator() {
        let phone = PatternValidator::new(r"^\d{3}-\d{4}$", "expected NNN-NNNN").unwrap();
        assert!(phone.check(&Value::Str("123-4567".into())).is_ok());
        assert!(phone.check(&Value::Str("1234567".into())).is_err());
        // Non-string values pass through.
        assert!(phone.check(&Value::Int(5)).is_ok());
    }

    #[test]
    fn test_arc_and_box_blankets() {
        let v: Arc<dyn Validator> = Arc::new(FnValidator::new(|_| Ok(())));
        assert!(v.check(&Value::Bool(true)).is_ok());
        let b: Box<dyn Validator> =
            Box::new(FnValidator::new(|_| Err(ValidationError::new("no"))));
        assert!(b.check(&Value::Bool(true)).is_err());
    }
}

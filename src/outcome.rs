//! # Outcome Envelope
//!
//! A success/value/failure-message triple a handler may return as its
//! response type when an expected failure should travel as data rather than
//! as an error. The mediator treats it like any other response.
//!
//! ```rust
//! use m3diator::Outcome;
//!
//! let found: Outcome<u32> = Outcome::success_with(42);
//! assert_eq!(found.value(), Some(&42));
//!
//! let missing: Outcome<u32> = Outcome::fail("customer not found");
//! assert!(missing.is_failure());
//! assert_eq!(missing.error_message(), "customer not found");
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome<T> {
    value: Option<T>,
    is_success: bool,
    error_message: String,
}

impl<T> Outcome<T> {
    /// Success without a value
    pub fn success() -> Self {
        Self {
            value: None,
            is_success: true,
            error_message: String::new(),
        }
    }

    pub fn success_with(value: T) -> Self {
        Self {
            value: Some(value),
            is_success: true,
            error_message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            value: None,
            is_success: false,
            error_message: message.into(),
        }
    }

    /// Failure without a message
    pub fn fail_empty() -> Self {
        Self::fail(String::new())
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.is_success {
            Ok(self.value)
        } else {
            Err(self.error_message)
        }
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self::success()
    }
}

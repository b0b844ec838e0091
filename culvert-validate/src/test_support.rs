//! Test-only validator double returning canned verdicts.

use crate::{ChangeValidator, ValidatorError, Verdict, validate_inputs};

/// Validator that applies the usual input validation, then returns a fixed
/// verdict (or a fixed error) without any network traffic.
#[derive(Debug)]
pub struct StubValidator {
    outcome: Result<Verdict, String>,
}

impl StubValidator {
    /// Stub answering every well-formed request with `verdict`.
    #[must_use]
    pub fn with_verdict(verdict: Verdict) -> Self {
        Self {
            outcome: Ok(verdict),
        }
    }

    /// Stub simulating an unreachable engine.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
        }
    }
}

impl ChangeValidator for StubValidator {
    fn check_osm_change(&self, document: &str, check: &str) -> Result<Verdict, ValidatorError> {
        validate_inputs(document, check)?;
        match &self.outcome {
            Ok(verdict) => Ok(verdict.clone()),
            Err(message) => Err(ValidatorError::Unavailable {
                source: Box::new(std::io::Error::other(message.clone())),
            }),
        }
    }
}

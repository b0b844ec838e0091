//! Gateway to an external OsmChange validation engine.
//!
//! The gateway hands a raw change document and a named check to the engine
//! and relays the structured verdict untouched; it never interprets the
//! verdict's contents. Input is rejected up front when the document or check
//! name is empty, so a blank request never reaches the engine.

#![forbid(unsafe_code)]

use thiserror::Error;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// The engine's verdict, relayed as-is.
pub type Verdict = serde_json::Value;

/// Failure while requesting a validation verdict.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The change document was empty after trimming.
    #[error("change document is empty")]
    EmptyDocument,
    /// The check name was empty after trimming.
    #[error("check name is empty")]
    EmptyCheck,
    /// The check name contains characters outside `[A-Za-z0-9_-]`.
    #[error("check name {name:?} contains invalid characters")]
    InvalidCheckName {
        /// The rejected name.
        name: String,
    },
    /// The engine answered with a non-success HTTP status.
    #[error("validation engine rejected the request with HTTP status {status}")]
    EngineStatus {
        /// Status code the engine returned.
        status: u16,
    },
    /// The engine could not be reached.
    #[error("validation engine is unreachable: {source}")]
    Unavailable {
        /// Transport-level failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The engine's response body was not valid JSON.
    #[error("validation engine returned a verdict that is not valid JSON: {source}")]
    InvalidVerdict {
        /// Decoding failure.
        #[source]
        source: std::io::Error,
    },
}

/// Forward a change document and a named check to a validation engine.
pub trait ChangeValidator {
    /// Request a verdict for `document` under the rule set named `check`.
    ///
    /// # Errors
    /// Returns [`ValidatorError`] when the input is empty or malformed, or
    /// when the engine is unreachable or answers with an error.
    fn check_osm_change(&self, document: &str, check: &str) -> Result<Verdict, ValidatorError>;
}

/// Reject blank input before any request is attempted; returns the trimmed
/// document and check name.
pub(crate) fn validate_inputs<'a>(
    document: &'a str,
    check: &'a str,
) -> Result<(&'a str, &'a str), ValidatorError> {
    let document = document.trim();
    if document.is_empty() {
        return Err(ValidatorError::EmptyDocument);
    }
    let check = check.trim();
    if check.is_empty() {
        return Err(ValidatorError::EmptyCheck);
    }
    if !check
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(ValidatorError::InvalidCheckName {
            name: check.to_owned(),
        });
    }
    Ok((document, check))
}

/// HTTP client for a validation engine exposing `POST <base>/check/<name>`.
///
/// # Examples
/// ```no_run
/// use culvert_validate::{ChangeValidator, HttpValidator};
///
/// let validator = HttpValidator::new("http://localhost:8000");
/// let verdict = validator.check_osm_change("<osmChange>...</osmChange>", "building")?;
/// println!("{verdict}");
/// # Ok::<(), culvert_validate::ValidatorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpValidator {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpValidator {
    /// Create a client for the engine at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url,
        }
    }
}

impl ChangeValidator for HttpValidator {
    fn check_osm_change(&self, document: &str, check: &str) -> Result<Verdict, ValidatorError> {
        let (document, check) = validate_inputs(document, check)?;
        let url = format!("{}/check/{check}", self.base_url);
        log::debug!("posting {}-byte change document to {url}", document.len());
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/xml")
            .send_string(document)
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => ValidatorError::EngineStatus { status },
                transport => ValidatorError::Unavailable {
                    source: Box::new(transport),
                },
            })?;
        response
            .into_json()
            .map_err(|source| ValidatorError::InvalidVerdict { source })
    }
}

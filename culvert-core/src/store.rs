//! The store port: a data-access boundary the query layer talks through.
//!
//! The core never opens connections; callers inject a [`RawStore`]
//! implementation (PostGIS in `culvert-pg`, an in-memory double in
//! `test_support`). Query cancellation and timeouts belong to the
//! store and its caller; this layer passes them through untouched.

use thiserror::Error;

use crate::feature::FeatureRecord;
use crate::query::RawQuery;

/// Store-reported failure while executing a built query.
///
/// Execution errors are surfaced to the caller and never retried here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store rejected or failed the query.
    #[error("query execution failed: {source}")]
    Execution {
        /// Underlying driver error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A row carried geometry the store could not decode.
    #[error("could not decode geometry for feature {id}: {detail}")]
    InvalidGeometry {
        /// Identifier of the offending feature.
        id: i64,
        /// Driver-level description of the failure.
        detail: String,
    },
    /// A row's tag payload was not a string-to-string mapping.
    #[error("failed to parse tags for feature {id}: {source}")]
    InvalidTags {
        /// Identifier of the offending feature.
        id: i64,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Wrap a driver error as an execution failure.
    pub fn execution<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Execution {
            source: source.into(),
        }
    }
}

/// Read-only execution of built queries.
///
/// Implementations run the query and return the matching records with
/// validation status joined in; they perform no shaping. Repeated calls with
/// an identical query return identical results absent concurrent writes.
pub trait RawStore {
    /// Execute a built query and return the matching records.
    ///
    /// An empty match is `Ok(vec![])`, never an error.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the store reports a connection, syntax,
    /// or row-decoding failure.
    fn run(&mut self, query: &RawQuery) -> Result<Vec<FeatureRecord>, StoreError>;
}

//! Facade crate for the culvert raw-data query layer.
//!
//! This crate re-exports the core filter, query, and repository types and
//! exposes the optional store and validator implementations behind feature
//! flags.

#![forbid(unsafe_code)]

pub use culvert_core::{
    AreaRing, FeatureKind, FeatureRecord, FeatureRepository, FilterError, FilterSpec, FlatFeature,
    OutputShape, PageWindow, QueryParam, RawQuery, RawStore, RepositoryError, StoreError,
    TagFilter, Tags, build_query,
};

#[cfg(feature = "store-pg")]
pub use culvert_pg::{PgConnectError, PgRawStore};

#[cfg(feature = "validate-http")]
pub use culvert_validate::{ChangeValidator, HttpValidator, ValidatorError, Verdict};

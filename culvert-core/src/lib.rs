//! Core query layer over a raw OpenStreetMap feature store.
//!
//! The crate turns a typed [`FilterSpec`] into an injection-safe SQL query
//! ([`build_query`]) and shapes the rows a store returns into either a
//! GeoJSON `FeatureCollection` or a flat listing with centroid coordinates
//! ([`FeatureRepository`]). Storage itself lives behind the [`RawStore`]
//! port; this crate never opens connections.

#![forbid(unsafe_code)]

mod feature;
mod filter;
pub mod query;
mod repository;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use feature::{FeatureKind, FeatureRecord, FlatFeature, Tags};
pub use filter::{AreaRing, FilterError, FilterSpec, TagFilter};
pub use query::{OutputShape, PageWindow, QueryParam, RawQuery, build_query};
pub use repository::{FeatureRepository, RepositoryError};
pub use store::{RawStore, StoreError};

//! Execution and result shaping for raw-feature queries.
//!
//! [`FeatureRepository`] owns an injected [`RawStore`] handle, runs built
//! queries through it, and shapes the returned records into one of the two
//! supported output forms. It holds no other state and performs no writes.

use geo::Centroid;
use geojson::{Feature, FeatureCollection, JsonObject, feature::Id};
use thiserror::Error;

use crate::feature::{FeatureKind, FeatureRecord, FlatFeature};
use crate::filter::{FilterError, FilterSpec};
use crate::query::{OutputShape, build_query};
use crate::store::{RawStore, StoreError};

/// Failure while building, executing, or shaping a query.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The filter was rejected before any store was touched.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// The store reported an execution failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A matched feature has a degenerate geometry with no centroid, so it
    /// cannot appear in a flat listing.
    #[error("feature {id} has a degenerate geometry with no centroid")]
    Centroid {
        /// Identifier of the offending feature.
        id: i64,
    },
}

/// Read-only access to raw features through an injected store handle.
///
/// # Examples
/// ```
/// use culvert_core::{
///     FeatureRecord, FeatureRepository, FilterSpec, RawQuery, RawStore, StoreError,
/// };
///
/// struct EmptyStore;
///
/// impl RawStore for EmptyStore {
///     fn run(&mut self, _query: &RawQuery) -> Result<Vec<FeatureRecord>, StoreError> {
///         Ok(Vec::new())
///     }
/// }
///
/// let mut repository = FeatureRepository::new(EmptyStore);
/// let collection = repository.polygons(&FilterSpec::default())?;
/// assert!(collection.features.is_empty());
/// # Ok::<(), culvert_core::RepositoryError>(())
/// ```
#[derive(Debug)]
pub struct FeatureRepository<S> {
    store: S,
}

impl<S: RawStore> FeatureRepository<S> {
    /// Wrap a store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Give the store handle back.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Polygon features matching `filter`, as a GeoJSON `FeatureCollection`.
    ///
    /// # Errors
    /// Returns [`RepositoryError`] when the filter is invalid or the store
    /// fails.
    pub fn polygons(
        &mut self,
        filter: &FilterSpec,
    ) -> Result<FeatureCollection, RepositoryError> {
        self.features(FeatureKind::Polygon, filter)
    }

    /// Node features matching `filter`, as a GeoJSON `FeatureCollection`.
    ///
    /// An area filter is mandatory for nodes.
    ///
    /// # Errors
    /// Returns [`RepositoryError`] when the filter is invalid (including a
    /// missing area) or the store fails.
    pub fn nodes(&mut self, filter: &FilterSpec) -> Result<FeatureCollection, RepositoryError> {
        self.features(FeatureKind::Node, filter)
    }

    /// Polygon features matching `filter`, as a flat listing with centroid
    /// coordinates and no geometry payload.
    ///
    /// # Errors
    /// Returns [`RepositoryError`] when the filter is invalid, the store
    /// fails, or a matched geometry has no centroid.
    pub fn polygons_list(
        &mut self,
        filter: &FilterSpec,
    ) -> Result<Vec<FlatFeature>, RepositoryError> {
        self.listing(FeatureKind::Polygon, filter)
    }

    /// Node features matching `filter`, as a flat listing.
    ///
    /// # Errors
    /// Returns [`RepositoryError`] when the filter is invalid (including a
    /// missing area) or the store fails.
    pub fn nodes_list(
        &mut self,
        filter: &FilterSpec,
    ) -> Result<Vec<FlatFeature>, RepositoryError> {
        self.listing(FeatureKind::Node, filter)
    }

    fn features(
        &mut self,
        kind: FeatureKind,
        filter: &FilterSpec,
    ) -> Result<FeatureCollection, RepositoryError> {
        let query = build_query(kind, OutputShape::FeatureCollection, filter)?;
        let records = self.store.run(&query)?;
        log::debug!("{kind:?} query matched {} records", records.len());
        Ok(FeatureCollection {
            bbox: None,
            features: records.into_iter().map(to_feature).collect(),
            foreign_members: None,
        })
    }

    fn listing(
        &mut self,
        kind: FeatureKind,
        filter: &FilterSpec,
    ) -> Result<Vec<FlatFeature>, RepositoryError> {
        let query = build_query(kind, OutputShape::FlatList, filter)?;
        let records = self.store.run(&query)?;
        log::debug!("{kind:?} listing matched {} records", records.len());
        records.into_iter().map(to_flat).collect()
    }
}

/// Shape one record as a GeoJSON feature: id at the top level, every
/// non-geometry column under `properties`, geometry serialized as GeoJSON.
fn to_feature(record: FeatureRecord) -> Feature {
    let geometry = geojson::Geometry::new(geojson::Value::from(&record.geometry));

    let mut properties = JsonObject::new();
    properties.insert("id".into(), serde_json::Value::from(record.id));
    let tags: JsonObject = record
        .tags
        .into_iter()
        .map(|(key, value)| (key, serde_json::Value::String(value)))
        .collect();
    properties.insert("tags".into(), serde_json::Value::Object(tags));
    properties.insert(
        "status".into(),
        record
            .status
            .map_or(serde_json::Value::Null, serde_json::Value::String),
    );
    if let Some(timestamp) = record.timestamp {
        properties.insert(
            "timestamp".into(),
            serde_json::Value::String(timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()),
        );
    }

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: Some(Id::Number(record.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Shape one record as a flat row, deriving point-like coordinates from the
/// geometry's centroid and dropping the geometry payload.
fn to_flat(record: FeatureRecord) -> Result<FlatFeature, RepositoryError> {
    let centroid = record
        .geometry
        .centroid()
        .ok_or(RepositoryError::Centroid { id: record.id })?;
    Ok(FlatFeature {
        id: record.id,
        lon: centroid.x(),
        lat: centroid.y(),
        tags: record.tags,
        status: record.status,
        timestamp: record.timestamp,
    })
}

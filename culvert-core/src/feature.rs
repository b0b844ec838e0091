//! Domain types for raw OSM features and their shaped listing form.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use geo::Geometry;
use serde::Serialize;

/// OpenStreetMap-style free-form key/value attributes.
pub type Tags = HashMap<String, String>;

/// Which raw-feature table a query targets.
///
/// Polygons come from closed ways; nodes are point features. The two kinds
/// share filter semantics but differ in their table, and nodes carry no
/// capture timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Area features derived from closed ways.
    Polygon,
    /// Point features.
    Node,
}

impl FeatureKind {
    /// Name of the store table holding this kind of feature.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Polygon => "raw_poly",
            Self::Node => "raw_node",
        }
    }

    /// Whether records of this kind carry a capture timestamp.
    #[must_use]
    pub const fn has_timestamp(self) -> bool {
        matches!(self, Self::Polygon)
    }
}

/// A single raw feature as returned by a store, validation status joined in.
///
/// Geometry is WGS84 (SRID 4326) with `x = longitude` and `y = latitude`.
/// `status` is the verdict from the validation side table; features the
/// validator has not seen have `None`, which is not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Stable identifier of the source OSM object.
    pub id: i64,
    /// Polygon or point shape in geographic coordinates.
    pub geometry: Geometry<f64>,
    /// Tag key/value pairs.
    pub tags: Tags,
    /// Validation status joined by id, when present.
    pub status: Option<String>,
    /// Capture time; polygons only, nodes carry `None`.
    pub timestamp: Option<NaiveDateTime>,
}

impl FeatureRecord {
    /// Construct a record.
    #[must_use]
    pub fn new(
        id: i64,
        geometry: Geometry<f64>,
        tags: Tags,
        status: Option<String>,
        timestamp: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id,
            geometry,
            tags,
            status,
            timestamp,
        }
    }
}

/// One row of a flat listing: centroid coordinates instead of a geometry
/// payload.
///
/// Serializes to the plain JSON object the listing endpoints emit. The
/// timestamp field is omitted entirely for nodes rather than serialized as
/// null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatFeature {
    /// Stable identifier of the source OSM object.
    pub id: i64,
    /// Centroid longitude.
    pub lon: f64,
    /// Centroid latitude.
    pub lat: f64,
    /// Tag key/value pairs.
    pub tags: Tags,
    /// Validation status joined by id, when present.
    pub status: Option<String>,
    /// Capture time; polygons only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

//! PostGIS-backed implementation of the `culvert-core` store port.
//!
//! Executes built queries over a synchronous `postgres` client, binding the
//! query's parameters and decoding rows into [`FeatureRecord`]s. Geometry
//! comes back as `ST_AsGeoJSON` text and is parsed into `geo` types through
//! the `geojson` crate.

#![forbid(unsafe_code)]

use chrono::NaiveDateTime;
use culvert_core::{FeatureKind, FeatureRecord, QueryParam, RawQuery, RawStore, StoreError, Tags};
use geo::Geometry;
use postgres::types::ToSql;
use postgres::{Client, NoTls, Row};
use thiserror::Error;

/// Opening the PostGIS connection failed.
#[derive(Debug, Error)]
#[error("failed to connect to the PostGIS store: {source}")]
pub struct PgConnectError {
    #[source]
    source: postgres::Error,
}

/// Raw-feature store backed by PostgreSQL with PostGIS.
///
/// Holds one injected client connection; the caller decides pooling and
/// timeouts. Statement cancellation follows the driver's usual mechanism and
/// is not intercepted here.
pub struct PgRawStore {
    client: Client,
}

impl std::fmt::Debug for PgRawStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgRawStore").finish_non_exhaustive()
    }
}

impl PgRawStore {
    /// Connect to the store with a libpq-style connection string.
    ///
    /// # Errors
    /// Returns [`PgConnectError`] when the connection cannot be established.
    pub fn connect(url: &str) -> Result<Self, PgConnectError> {
        let client = Client::connect(url, NoTls).map_err(|source| PgConnectError { source })?;
        Ok(Self { client })
    }

    /// Wrap an already-open client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl RawStore for PgRawStore {
    fn run(&mut self, query: &RawQuery) -> Result<Vec<FeatureRecord>, StoreError> {
        let params: Vec<&(dyn ToSql + Sync)> =
            query.params.iter().map(as_sql_param).collect();
        log::debug!("executing raw query with {} parameters", params.len());
        let rows = self
            .client
            .query(query.sql.as_str(), &params)
            .map_err(StoreError::execution)?;
        rows.iter().map(|row| decode_row(query.kind, row)).collect()
    }
}

fn as_sql_param(param: &QueryParam) -> &(dyn ToSql + Sync) {
    match param {
        QueryParam::Text(text) => text as &(dyn ToSql + Sync),
        QueryParam::Int(value) => value as &(dyn ToSql + Sync),
    }
}

fn decode_row(kind: FeatureKind, row: &Row) -> Result<FeatureRecord, StoreError> {
    let id: i64 = row.try_get("id").map_err(StoreError::execution)?;
    let geometry_text: String = row.try_get("geometry").map_err(StoreError::execution)?;
    let geometry = parse_geometry(id, &geometry_text)?;
    let tags_value: serde_json::Value = row.try_get("tags").map_err(StoreError::execution)?;
    let tags: Tags = serde_json::from_value(tags_value)
        .map_err(|source| StoreError::InvalidTags { id, source })?;
    let status: Option<String> = row.try_get("status").map_err(StoreError::execution)?;
    let timestamp: Option<NaiveDateTime> = if kind.has_timestamp() {
        row.try_get("timestamp").map_err(StoreError::execution)?
    } else {
        None
    };
    Ok(FeatureRecord {
        id,
        geometry,
        tags,
        status,
        timestamp,
    })
}

fn parse_geometry(id: i64, text: &str) -> Result<Geometry<f64>, StoreError> {
    let geometry: geojson::Geometry =
        serde_json::from_str(text).map_err(|err| StoreError::InvalidGeometry {
            id,
            detail: err.to_string(),
        })?;
    Geometry::try_from(geometry).map_err(|err: geojson::Error| StoreError::InvalidGeometry {
        id,
        detail: err.to_string(),
    })
}

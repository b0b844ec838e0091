//! Test-only, in-memory [`RawStore`] implementation used by unit and
//! behaviour tests.
//!
//! The store ignores the rendered SQL and evaluates the typed filter carried
//! by the query with `geo` predicates, so it exercises the same semantics a
//! SQL store would without needing a database.

use geo::Intersects;

use crate::feature::{FeatureKind, FeatureRecord};
use crate::filter::{FilterSpec, TagFilter};
use crate::query::RawQuery;
use crate::store::{RawStore, StoreError};

/// In-memory store holding one dataset per feature kind.
///
/// Performs a linear scan; intended only for small test datasets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    polygons: Vec<FeatureRecord>,
    nodes: Vec<FeatureRecord>,
}

impl MemoryStore {
    /// Create a store from polygon and node collections.
    pub fn with_records<P, N>(polygons: P, nodes: N) -> Self
    where
        P: IntoIterator<Item = FeatureRecord>,
        N: IntoIterator<Item = FeatureRecord>,
    {
        Self {
            polygons: polygons.into_iter().collect(),
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Add a polygon feature.
    pub fn push_polygon(&mut self, record: FeatureRecord) {
        self.polygons.push(record);
    }

    /// Add a node feature.
    pub fn push_node(&mut self, record: FeatureRecord) {
        self.nodes.push(record);
    }
}

impl RawStore for MemoryStore {
    fn run(&mut self, query: &RawQuery) -> Result<Vec<FeatureRecord>, StoreError> {
        let records = match query.kind {
            FeatureKind::Polygon => &self.polygons,
            FeatureKind::Node => &self.nodes,
        };
        let mut matched: Vec<FeatureRecord> = records
            .iter()
            .filter(|record| matches_filter(&query.filter, record))
            .cloned()
            .collect();
        if let Some(window) = query.window {
            // Newest capture first, matching the SQL ORDER BY.
            matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            matched = matched
                .into_iter()
                .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
                .collect();
        }
        Ok(matched)
    }
}

fn matches_filter(filter: &FilterSpec, record: &FeatureRecord) -> bool {
    if let Some(ring) = &filter.area {
        if !ring.to_polygon().intersects(&record.geometry) {
            return false;
        }
    }
    match &filter.tag {
        None => true,
        Some(TagFilter::KeyExists(key)) => record.tags.contains_key(key),
        Some(TagFilter::KeyPrefix { key, value }) => record
            .tags
            .get(key)
            .is_some_and(|tag| tag.to_lowercase().starts_with(&value.to_lowercase())),
    }
}

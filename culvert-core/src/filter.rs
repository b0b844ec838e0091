//! Typed filter specification for raw-feature queries.
//!
//! Constructors validate up front so the query builder only ever sees
//! well-formed input: rings must be explicitly closed, and a tag value can
//! never appear without its key.

use geo::{Coord, LineString, Polygon};
use thiserror::Error;

/// Minimum number of points in a closed ring (triangle plus the closing
/// repeat of the first point).
pub const MIN_RING_POINTS: usize = 4;

/// Rejection of a malformed or contradictory filter, raised before any store
/// is touched.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    /// The ring has too few points to describe an area.
    #[error("area ring needs at least {MIN_RING_POINTS} points including the closing one, got {points}")]
    RingTooShort {
        /// Number of points supplied.
        points: usize,
    },
    /// The first and last ring points differ. Rings are never auto-closed.
    #[error("area ring is not closed; the first and last points must be equal")]
    RingNotClosed,
    /// A ring coordinate was NaN or infinite.
    #[error("area ring contains a non-finite coordinate")]
    NonFiniteCoordinate,
    /// A tag value was supplied without a tag key.
    #[error("tag value {value:?} was supplied without a tag key")]
    ValueWithoutKey {
        /// The orphaned value.
        value: String,
    },
    /// Node queries must always be bounded by an area.
    #[error("node queries require an area filter")]
    AreaRequired,
}

/// An explicitly closed polygon ring in WGS84 coordinates.
///
/// Points are `(lon, lat)` pairs; the first point must equal the last.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use culvert_core::AreaRing;
///
/// let ring = AreaRing::new(vec![
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 0.0, y: 1.0 },
///     Coord { x: 1.0, y: 1.0 },
///     Coord { x: 0.0, y: 0.0 },
/// ])?;
/// assert_eq!(ring.to_wkt(), "POLYGON((0 0, 0 1, 1 1, 0 0))");
/// # Ok::<(), culvert_core::FilterError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AreaRing(Vec<Coord<f64>>);

impl AreaRing {
    /// Validate and construct a ring.
    ///
    /// # Errors
    /// Returns [`FilterError`] when the ring has fewer than
    /// [`MIN_RING_POINTS`] points, is not closed, or contains a non-finite
    /// coordinate.
    pub fn new(points: Vec<Coord<f64>>) -> Result<Self, FilterError> {
        if points.len() < MIN_RING_POINTS {
            return Err(FilterError::RingTooShort {
                points: points.len(),
            });
        }
        if points
            .iter()
            .any(|point| !point.x.is_finite() || !point.y.is_finite())
        {
            return Err(FilterError::NonFiniteCoordinate);
        }
        match (points.first(), points.last()) {
            (Some(first), Some(last)) if first == last => Ok(Self(points)),
            _ => Err(FilterError::RingNotClosed),
        }
    }

    /// The ring's points, closing point included.
    #[must_use]
    pub fn points(&self) -> &[Coord<f64>] {
        &self.0
    }

    /// Render the ring as WKT `POLYGON` text, suitable for binding into
    /// `ST_GeomFromText`.
    #[must_use]
    pub fn to_wkt(&self) -> String {
        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|point| format!("{} {}", point.x, point.y))
            .collect();
        format!("POLYGON(({}))", pairs.join(", "))
    }

    /// The ring as a `geo` polygon for in-process intersection tests.
    #[must_use]
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.0.clone()), Vec::new())
    }
}

/// Attribute filter over a feature's tags: either "the key exists" or "the
/// key's value starts with this prefix, case-insensitively".
///
/// The two-field shape of the wire form (optional key, optional value) is
/// collapsed through [`TagFilter::from_parts`] so the contradictory state —
/// a value without a key — is rejected rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// Match features carrying the key, whatever its value.
    KeyExists(String),
    /// Match features whose value for `key` starts with `value`,
    /// case-insensitively. The value is a literal prefix, not a pattern.
    KeyPrefix {
        /// Tag key to inspect.
        key: String,
        /// Literal prefix the tag's value must start with.
        value: String,
    },
}

impl TagFilter {
    /// Collapse optional key/value request fields into a filter.
    ///
    /// Empty strings behave as absent: a blank query parameter means "no
    /// filter", not "filter on the empty string".
    ///
    /// # Errors
    /// Returns [`FilterError::ValueWithoutKey`] when a value is supplied
    /// without a key.
    pub fn from_parts(
        key: Option<String>,
        value: Option<String>,
    ) -> Result<Option<Self>, FilterError> {
        let key = key.filter(|key| !key.is_empty());
        let value = value.filter(|value| !value.is_empty());
        match (key, value) {
            (None, None) => Ok(None),
            (Some(key), None) => Ok(Some(Self::KeyExists(key))),
            (Some(key), Some(value)) => Ok(Some(Self::KeyPrefix { key, value })),
            (None, Some(value)) => Err(FilterError::ValueWithoutKey { value }),
        }
    }
}

/// A complete, immutable filter for one query.
///
/// Built per request and discarded after execution. The `hashtag` field is
/// accepted for interface compatibility but does not participate in
/// filtering yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Spatial bound; mandatory for node queries.
    pub area: Option<AreaRing>,
    /// Attribute filter over tags.
    pub tag: Option<TagFilter>,
    /// Reserved; currently ignored by the builder.
    pub hashtag: Option<String>,
    /// Page number; `None` and `Some(0)` both mean "no pagination".
    pub page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn unit_square() -> Vec<Coord<f64>> {
        vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 1.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 0.0, y: 0.0 },
        ]
    }

    #[rstest]
    fn accepts_closed_ring() {
        let ring = AreaRing::new(unit_square()).expect("valid ring");
        assert_eq!(ring.points().len(), 5);
    }

    #[rstest]
    fn rejects_short_ring() {
        let result = AreaRing::new(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 0.0, y: 0.0 },
        ]);
        assert_eq!(result, Err(FilterError::RingTooShort { points: 3 }));
    }

    #[rstest]
    fn rejects_open_ring() {
        let mut points = unit_square();
        points.pop();
        assert_eq!(AreaRing::new(points), Err(FilterError::RingNotClosed));
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_non_finite_coordinates(#[case] bad: f64) {
        let mut points = unit_square();
        points[1].y = bad;
        assert_eq!(
            AreaRing::new(points),
            Err(FilterError::NonFiniteCoordinate)
        );
    }

    #[rstest]
    fn wkt_renders_lon_lat_pairs() {
        let ring = AreaRing::new(unit_square()).expect("valid ring");
        assert_eq!(ring.to_wkt(), "POLYGON((0 0, 0 1, 1 1, 1 0, 0 0))");
    }

    #[rstest]
    fn tag_filter_from_key_only_is_exists() {
        let filter = TagFilter::from_parts(Some("building".into()), None).expect("valid filter");
        assert_eq!(filter, Some(TagFilter::KeyExists("building".into())));
    }

    #[rstest]
    fn tag_filter_from_both_is_prefix() {
        let filter = TagFilter::from_parts(Some("building".into()), Some("Yes".into()))
            .expect("valid filter");
        assert_eq!(
            filter,
            Some(TagFilter::KeyPrefix {
                key: "building".into(),
                value: "Yes".into(),
            })
        );
    }

    #[rstest]
    fn tag_filter_rejects_value_without_key() {
        let result = TagFilter::from_parts(None, Some("yes".into()));
        assert_eq!(
            result,
            Err(FilterError::ValueWithoutKey {
                value: "yes".into()
            })
        );
    }

    #[rstest]
    #[case(Some(String::new()), None)]
    #[case(None, Some(String::new()))]
    #[case(Some(String::new()), Some(String::new()))]
    fn tag_filter_treats_empty_strings_as_absent(
        #[case] key: Option<String>,
        #[case] value: Option<String>,
    ) {
        assert_eq!(TagFilter::from_parts(key, value), Ok(None));
    }
}

//! Translation of a [`FilterSpec`] into an executable, injection-safe query.
//!
//! The builder composes independently optional clause fragments joined with
//! `AND`. Every caller-supplied value — the area ring's WKT, the tag key and
//! value, the pagination window — travels as a bound parameter; no filter
//! text is ever interpolated into the SQL.

use crate::feature::FeatureKind;
use crate::filter::{FilterError, FilterSpec, TagFilter};

/// Fixed page size for paginated listings.
pub const RESULTS_PER_PAGE: u32 = 25;

/// How the caller wants the matched rows shaped.
///
/// A closed enum rather than a format string: an unsupported shape is a
/// compile error, not a runtime surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputShape {
    /// GeoJSON `FeatureCollection`, geometry included per feature.
    FeatureCollection,
    /// Flat array of objects with derived centroid coordinates and no
    /// geometry payload.
    FlatList,
}

/// A single bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// Text value (WKT ring, tag key, anchored prefix pattern).
    Text(String),
    /// Integer value (limit, offset).
    Int(i64),
}

/// The row window selected by a page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Maximum rows returned.
    pub limit: i64,
    /// Rows skipped before the window starts.
    pub offset: i64,
}

/// A fully-formed query plus its output-shape descriptor.
///
/// `sql` and `params` drive SQL stores; the typed `filter` and `window` are
/// retained so non-SQL stores (and test doubles) can evaluate identical
/// semantics without parsing SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuery {
    /// Feature kind the query targets.
    pub kind: FeatureKind,
    /// Requested result shape.
    pub shape: OutputShape,
    /// Rendered SQL with `$n` placeholders.
    pub sql: String,
    /// Bound parameters, ordered by placeholder index.
    pub params: Vec<QueryParam>,
    /// Normalized pagination window, when one applies.
    pub window: Option<PageWindow>,
    /// The validated filter this query was built from.
    pub filter: FilterSpec,
}

/// Build an executable query for one feature kind and output shape.
///
/// Pagination is consistent across both output shapes: a page of `None` or
/// `Some(0)` means no window at all, while `Some(n)` selects 25 rows at
/// offset `n * 25`, newest capture first.
///
/// # Errors
/// Returns [`FilterError::AreaRequired`] for node queries without an area;
/// querying every node unbounded is not a supported mode.
///
/// # Examples
/// ```
/// use culvert_core::{FeatureKind, FilterSpec, OutputShape, build_query};
///
/// let query = build_query(
///     FeatureKind::Polygon,
///     OutputShape::FeatureCollection,
///     &FilterSpec::default(),
/// )?;
/// assert!(query.sql.contains("WHERE TRUE"));
/// assert!(query.params.is_empty());
/// # Ok::<(), culvert_core::FilterError>(())
/// ```
pub fn build_query(
    kind: FeatureKind,
    shape: OutputShape,
    filter: &FilterSpec,
) -> Result<RawQuery, FilterError> {
    if kind == FeatureKind::Node && filter.area.is_none() {
        return Err(FilterError::AreaRequired);
    }
    if let Some(hashtag) = &filter.hashtag {
        log::warn!("hashtag filter {hashtag:?} is reserved and currently ignored");
    }

    let table = kind.table();
    let mut params: Vec<QueryParam> = Vec::new();
    let mut clauses: Vec<String> = Vec::new();

    if let Some(ring) = &filter.area {
        params.push(QueryParam::Text(ring.to_wkt()));
        clauses.push(format!(
            "ST_Intersects({table}.geometry, ST_GeomFromText(${}, 4326))",
            params.len()
        ));
    }

    match &filter.tag {
        None => {}
        Some(TagFilter::KeyExists(key)) => {
            params.push(QueryParam::Text(key.clone()));
            clauses.push(format!("{table}.tags ? ${}", params.len()));
        }
        Some(TagFilter::KeyPrefix { key, value }) => {
            params.push(QueryParam::Text(key.clone()));
            let key_index = params.len();
            params.push(QueryParam::Text(format!("^{}", escape_regex(value))));
            clauses.push(format!(
                "{table}.tags->>${key_index} ~* ${}",
                params.len()
            ));
        }
    }

    let predicate = if clauses.is_empty() {
        String::from("TRUE")
    } else {
        clauses.join(" AND ")
    };

    let mut sql = format!(
        "SELECT {columns} FROM {table} \
         LEFT JOIN validation ON validation.osm_id = {table}.osm_id \
         WHERE {predicate}",
        columns = select_columns(kind),
    );

    let window = filter.page.filter(|page| *page > 0).map(|page| PageWindow {
        limit: i64::from(RESULTS_PER_PAGE),
        offset: i64::from(page) * i64::from(RESULTS_PER_PAGE),
    });
    if let Some(window) = window {
        params.push(QueryParam::Int(window.limit));
        let limit_index = params.len();
        params.push(QueryParam::Int(window.offset));
        sql.push_str(&format!(
            " ORDER BY {table}.timestamp DESC LIMIT ${limit_index} OFFSET ${}",
            params.len()
        ));
    }

    log::debug!(
        "built {kind:?}/{shape:?} query with {} bound parameters",
        params.len()
    );

    Ok(RawQuery {
        kind,
        shape,
        sql,
        params,
        window,
        filter: filter.clone(),
    })
}

fn select_columns(kind: FeatureKind) -> String {
    let table = kind.table();
    let mut columns = format!(
        "{table}.osm_id AS id, ST_AsGeoJSON({table}.geometry) AS geometry, \
         {table}.tags AS tags, validation.status AS status"
    );
    if kind.has_timestamp() {
        columns.push_str(&format!(", {table}.timestamp AS timestamp"));
    }
    columns
}

/// Escape regex metacharacters so a tag value matches as a literal prefix.
fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(
            ch,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AreaRing;
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn unit_square() -> AreaRing {
        AreaRing::new(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 1.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 0.0, y: 0.0 },
        ])
        .expect("valid ring")
    }

    #[rstest]
    fn unfiltered_polygon_query_matches_everything(
        #[values(OutputShape::FeatureCollection, OutputShape::FlatList)] shape: OutputShape,
    ) {
        let query = build_query(FeatureKind::Polygon, shape, &FilterSpec::default())
            .expect("valid query");
        assert!(query.sql.ends_with("WHERE TRUE"));
        assert!(query.params.is_empty());
        assert!(query.window.is_none());
    }

    #[rstest]
    fn node_query_without_area_is_rejected(
        #[values(OutputShape::FeatureCollection, OutputShape::FlatList)] shape: OutputShape,
    ) {
        let result = build_query(FeatureKind::Node, shape, &FilterSpec::default());
        assert_eq!(result.unwrap_err(), FilterError::AreaRequired);
    }

    #[rstest]
    fn area_travels_as_bound_wkt(unit_square: AreaRing) {
        let filter = FilterSpec {
            area: Some(unit_square.clone()),
            ..FilterSpec::default()
        };
        let query = build_query(FeatureKind::Polygon, OutputShape::FeatureCollection, &filter)
            .expect("valid query");
        assert!(
            query
                .sql
                .contains("ST_Intersects(raw_poly.geometry, ST_GeomFromText($1, 4326))")
        );
        assert_eq!(
            query.params,
            vec![QueryParam::Text(unit_square.to_wkt())]
        );
        // The ring text itself must never leak into the SQL.
        assert!(!query.sql.contains("POLYGON(("));
    }

    #[rstest]
    fn key_only_filter_emits_exists_predicate() {
        let filter = FilterSpec {
            tag: Some(TagFilter::KeyExists("building".into())),
            ..FilterSpec::default()
        };
        let query = build_query(FeatureKind::Polygon, OutputShape::FeatureCollection, &filter)
            .expect("valid query");
        assert!(query.sql.contains("raw_poly.tags ? $1"));
        assert!(!query.sql.contains("~*"));
        assert_eq!(query.params, vec![QueryParam::Text("building".into())]);
    }

    #[rstest]
    fn key_value_filter_emits_anchored_prefix_predicate() {
        let filter = FilterSpec {
            tag: Some(TagFilter::KeyPrefix {
                key: "building".into(),
                value: "res".into(),
            }),
            ..FilterSpec::default()
        };
        let query = build_query(FeatureKind::Polygon, OutputShape::FeatureCollection, &filter)
            .expect("valid query");
        assert!(query.sql.contains("raw_poly.tags->>$1 ~* $2"));
        assert_eq!(
            query.params,
            vec![
                QueryParam::Text("building".into()),
                QueryParam::Text("^res".into()),
            ]
        );
    }

    #[rstest]
    fn prefix_value_is_matched_literally() {
        let filter = FilterSpec {
            tag: Some(TagFilter::KeyPrefix {
                key: "name".into(),
                value: "a.b*".into(),
            }),
            ..FilterSpec::default()
        };
        let query = build_query(FeatureKind::Polygon, OutputShape::FlatList, &filter)
            .expect("valid query");
        assert_eq!(
            query.params,
            vec![
                QueryParam::Text("name".into()),
                QueryParam::Text("^a\\.b\\*".into()),
            ]
        );
    }

    #[rstest]
    fn hostile_tag_key_never_reaches_the_sql() {
        let hostile = "x'; DROP TABLE raw_poly; --";
        let filter = FilterSpec {
            tag: Some(TagFilter::KeyExists(hostile.into())),
            ..FilterSpec::default()
        };
        let query = build_query(FeatureKind::Polygon, OutputShape::FeatureCollection, &filter)
            .expect("valid query");
        assert!(!query.sql.contains("DROP TABLE"));
        assert_eq!(query.params, vec![QueryParam::Text(hostile.into())]);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(0))]
    fn page_zero_means_no_window(
        #[case] page: Option<u32>,
        #[values(OutputShape::FeatureCollection, OutputShape::FlatList)] shape: OutputShape,
    ) {
        let filter = FilterSpec {
            page,
            ..FilterSpec::default()
        };
        let query = build_query(FeatureKind::Polygon, shape, &filter).expect("valid query");
        assert!(query.window.is_none());
        assert!(!query.sql.contains("LIMIT"));
        assert!(!query.sql.contains("ORDER BY"));
    }

    #[rstest]
    fn page_selects_bound_window(
        #[values(OutputShape::FeatureCollection, OutputShape::FlatList)] shape: OutputShape,
    ) {
        let filter = FilterSpec {
            page: Some(2),
            ..FilterSpec::default()
        };
        let query = build_query(FeatureKind::Polygon, shape, &filter).expect("valid query");
        assert_eq!(
            query.window,
            Some(PageWindow {
                limit: 25,
                offset: 50,
            })
        );
        assert!(
            query
                .sql
                .ends_with("ORDER BY raw_poly.timestamp DESC LIMIT $1 OFFSET $2")
        );
        assert_eq!(
            query.params,
            vec![QueryParam::Int(25), QueryParam::Int(50)]
        );
    }

    #[rstest]
    fn kinds_build_independently(unit_square: AreaRing) {
        let filter = FilterSpec {
            area: Some(unit_square),
            tag: Some(TagFilter::KeyExists("amenity".into())),
            ..FilterSpec::default()
        };
        let polygons =
            build_query(FeatureKind::Polygon, OutputShape::FeatureCollection, &filter)
                .expect("valid query");
        let nodes = build_query(FeatureKind::Node, OutputShape::FeatureCollection, &filter)
            .expect("valid query");
        assert!(polygons.sql.contains("raw_poly"));
        assert!(!polygons.sql.contains("raw_node"));
        assert!(nodes.sql.contains("raw_node"));
        assert!(!nodes.sql.contains("raw_poly"));
        // Nodes never select a timestamp column.
        assert!(polygons.sql.contains("raw_poly.timestamp AS timestamp"));
        assert!(!nodes.sql.contains("AS timestamp"));
        assert_eq!(polygons.params, nodes.params);
    }

    #[rstest]
    fn clauses_combine_with_and(unit_square: AreaRing) {
        let filter = FilterSpec {
            area: Some(unit_square),
            tag: Some(TagFilter::KeyPrefix {
                key: "building".into(),
                value: "res".into(),
            }),
            page: Some(1),
            ..FilterSpec::default()
        };
        let query = build_query(FeatureKind::Polygon, OutputShape::FlatList, &filter)
            .expect("valid query");
        assert!(
            query
                .sql
                .contains("ST_GeomFromText($1, 4326)) AND raw_poly.tags->>$2 ~* $3")
        );
        assert_eq!(query.params.len(), 5);
        assert_eq!(
            &query.params[3..],
            &[QueryParam::Int(25), QueryParam::Int(25)]
        );
    }

    #[rstest]
    fn escape_regex_leaves_plain_text_alone() {
        assert_eq!(escape_regex("residential"), "residential");
        assert_eq!(escape_regex("a.b"), "a\\.b");
        assert_eq!(escape_regex("^$"), "\\^\\$");
    }
}

//! Unit tests for argument handling and configuration conversion.
//!
//! `load_and_merge` reads the real environment, so tests convert argument
//! structs directly instead of going through the merge step.

use super::*;
use clap::Parser as _;
use culvert_core::FilterError;
use rstest::rstest;

#[rstest]
fn validate_subcommand_parses_short_flags() {
    let cli = Cli::try_parse_from(["culvert", "validate", "-f", "change.osc", "-c", "building"])
        .expect("valid arguments");
    let Command::Validate(args) = cli.command else {
        panic!("expected validate subcommand");
    };
    assert_eq!(args.file, Some(Utf8PathBuf::from("change.osc")));
    assert_eq!(args.check, Some(String::from("building")));
}

#[rstest]
fn missing_file_is_an_error_not_a_usage_hint() {
    let args = ValidateArgs {
        check: Some(String::from("building")),
        ..ValidateArgs::default()
    };
    let error = ValidateConfig::try_from(args).expect_err("missing file");
    assert!(matches!(
        error,
        CliError::MissingArgument { field: "file", .. }
    ));
}

#[rstest]
fn missing_check_is_an_error() {
    let args = ValidateArgs {
        file: Some(Utf8PathBuf::from("change.osc")),
        ..ValidateArgs::default()
    };
    let error = ValidateConfig::try_from(args).expect_err("missing check");
    assert!(matches!(
        error,
        CliError::MissingArgument { field: "check", .. }
    ));
}

#[rstest]
fn validator_url_defaults_when_absent() {
    let args = ValidateArgs {
        file: Some(Utf8PathBuf::from("change.osc")),
        check: Some(String::from("building")),
        validator_url: None,
    };
    let config = ValidateConfig::try_from(args).expect("valid config");
    assert_eq!(config.validator_url, DEFAULT_VALIDATOR_URL);
}

#[rstest]
fn query_config_requires_a_database_url() {
    let error = QueryConfig::try_from(QueryArgs::default()).expect_err("missing url");
    assert!(matches!(
        error,
        CliError::MissingArgument {
            field: "database-url",
            ..
        }
    ));
}

#[rstest]
fn query_config_assembles_the_filter() {
    let args = QueryArgs {
        database_url: Some(String::from("host=localhost user=culvert")),
        kind: Some(QueryKind::Nodes),
        area: Some(String::from("0 0,0 1,1 1,0 0")),
        key: Some(String::from("amenity")),
        value: Some(String::from("cafe")),
        page: Some(2),
        list: true,
    };
    let config = QueryConfig::try_from(args).expect("valid config");
    assert_eq!(config.kind, QueryKind::Nodes);
    assert!(config.list);
    assert_eq!(config.filter.page, Some(2));
    assert_eq!(
        config.filter.tag,
        Some(TagFilter::KeyPrefix {
            key: String::from("amenity"),
            value: String::from("cafe"),
        })
    );
    let ring = config.filter.area.expect("ring parsed");
    assert_eq!(ring.points().len(), 4);
}

#[rstest]
fn value_without_key_is_rejected() {
    let args = QueryArgs {
        database_url: Some(String::from("host=localhost")),
        value: Some(String::from("cafe")),
        ..QueryArgs::default()
    };
    let error = QueryConfig::try_from(args).expect_err("contradictory tag filter");
    assert!(matches!(
        error,
        CliError::Filter(FilterError::ValueWithoutKey { .. })
    ));
}

#[rstest]
#[case("0 0,0 1,1 1")] // open ring
#[case("0 0,0 1,junk,0 0")]
#[case("0,1,2,3")]
fn malformed_rings_are_rejected(#[case] ring: &str) {
    let args = QueryArgs {
        database_url: Some(String::from("host=localhost")),
        area: Some(String::from(ring)),
        ..QueryArgs::default()
    };
    assert!(QueryConfig::try_from(args).is_err());
}

#[rstest]
fn parse_ring_accepts_a_closed_square() {
    let ring = parse_ring("13 52,13 53,14 53,14 52,13 52").expect("valid ring");
    assert_eq!(ring.points().len(), 5);
    assert_eq!(ring.to_wkt(), "POLYGON((13 52, 13 53, 14 53, 14 52, 13 52))");
}

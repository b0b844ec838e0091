//! Command-line interface for the culvert raw-data layer.
//!
//! Two subcommands: `validate` forwards an OsmChange file to the external
//! validation engine and prints its verdict; `query` runs a filtered
//! raw-feature query against a PostGIS store and prints the shaped result.
//! Flags merge with environment variables and configuration files through
//! `ortho_config`.

#![forbid(unsafe_code)]

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use culvert_core::{AreaRing, FeatureRepository, FilterSpec, TagFilter};
use culvert_pg::PgRawStore;
use culvert_validate::{ChangeValidator, HttpValidator};
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

mod error;

pub use error::CliError;

const ARG_FILE: &str = "file";
const ARG_CHECK: &str = "check";
const ARG_DATABASE_URL: &str = "database-url";
const ENV_FILE: &str = "CULVERT_CMDS_VALIDATE_FILE";
const ENV_CHECK: &str = "CULVERT_CMDS_VALIDATE_CHECK";
const ENV_DATABASE_URL: &str = "CULVERT_CMDS_QUERY_DATABASE_URL";
const DEFAULT_VALIDATOR_URL: &str = "http://127.0.0.1:8000";

/// Run the culvert CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] for argument, configuration, store, or validator
/// failures; the binary prints the error and exits non-zero.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Query(args) => run_query(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "culvert",
    about = "Query and validate raw OpenStreetMap features",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Forward an OsmChange file to the validation engine.
    Validate(ValidateArgs),
    /// Run a filtered raw-feature query against the PostGIS store.
    Query(QueryArgs),
}

/// CLI arguments for the `validate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Check an OsmChange document against a named rule set")]
#[ortho_config(prefix = "CULVERT")]
struct ValidateArgs {
    /// Path to the OsmChange file.
    #[arg(long = ARG_FILE, short = 'f', value_name = "path")]
    #[serde(default)]
    file: Option<Utf8PathBuf>,
    /// Name of the check to run (ex: building).
    #[arg(long = ARG_CHECK, short = 'c', value_name = "name")]
    #[serde(default)]
    check: Option<String>,
    /// Base URL of the validation engine.
    #[arg(long = "validator-url", value_name = "url")]
    #[serde(default)]
    validator_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ValidateConfig {
    file: Utf8PathBuf,
    check: String,
    validator_url: String,
}

impl TryFrom<ValidateArgs> for ValidateConfig {
    type Error = CliError;

    fn try_from(args: ValidateArgs) -> Result<Self, Self::Error> {
        let file = args.file.ok_or(CliError::MissingArgument {
            field: ARG_FILE,
            env: ENV_FILE,
        })?;
        let check = args.check.ok_or(CliError::MissingArgument {
            field: ARG_CHECK,
            env: ENV_CHECK,
        })?;
        Ok(Self {
            file,
            check,
            validator_url: args
                .validator_url
                .unwrap_or_else(|| DEFAULT_VALIDATOR_URL.to_owned()),
        })
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ValidateConfig::try_from(merged)?;
    let document =
        std::fs::read_to_string(&config.file).map_err(|source| CliError::ReadChangeFile {
            path: config.file.clone(),
            source,
        })?;
    let validator = HttpValidator::new(&config.validator_url);
    let verdict = validator.check_osm_change(document.trim_end(), &config.check)?;
    print_json(&verdict)
}

/// Which feature kind a query targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize,
)]
#[serde(rename_all = "kebab-case")]
enum QueryKind {
    /// Area features derived from closed ways.
    #[default]
    Polygons,
    /// Point features.
    Nodes,
}

/// CLI arguments for the `query` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Query raw features as GeoJSON or a flat listing")]
#[ortho_config(prefix = "CULVERT")]
struct QueryArgs {
    /// PostGIS connection string.
    #[arg(long = ARG_DATABASE_URL, value_name = "url")]
    #[serde(default)]
    database_url: Option<String>,
    /// Feature kind to query.
    #[arg(long = "kind", value_enum, value_name = "kind")]
    #[serde(default)]
    kind: Option<QueryKind>,
    /// Closed area ring as comma-separated "lon lat" pairs.
    #[arg(long = "area", value_name = "ring")]
    #[serde(default)]
    area: Option<String>,
    /// Tag key to filter on.
    #[arg(long = "key", value_name = "key")]
    #[serde(default)]
    key: Option<String>,
    /// Tag value prefix; requires --key.
    #[arg(long = "value", value_name = "value")]
    #[serde(default)]
    value: Option<String>,
    /// Page number; pages are 25 rows, page 0 means everything.
    #[arg(long = "page", value_name = "n")]
    #[serde(default)]
    page: Option<u32>,
    /// Emit a flat listing with centroids instead of GeoJSON.
    #[arg(long = "list")]
    #[serde(default)]
    list: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct QueryConfig {
    database_url: String,
    kind: QueryKind,
    filter: FilterSpec,
    list: bool,
}

impl TryFrom<QueryArgs> for QueryConfig {
    type Error = CliError;

    fn try_from(args: QueryArgs) -> Result<Self, Self::Error> {
        let database_url = args.database_url.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE_URL,
            env: ENV_DATABASE_URL,
        })?;
        let area = args.area.as_deref().map(parse_ring).transpose()?;
        let tag = TagFilter::from_parts(args.key, args.value)?;
        Ok(Self {
            database_url,
            kind: args.kind.unwrap_or_default(),
            filter: FilterSpec {
                area,
                tag,
                hashtag: None,
                page: args.page,
            },
            list: args.list,
        })
    }
}

/// Parse a ring given as comma-separated "lon lat" pairs, e.g.
/// `"0 0,0 1,1 1,0 0"`. The ring must already be closed.
fn parse_ring(text: &str) -> Result<AreaRing, CliError> {
    let mut points = Vec::new();
    for pair in text.split(',') {
        let mut coords = pair.split_whitespace();
        let (Some(lon), Some(lat), None) = (coords.next(), coords.next(), coords.next()) else {
            return Err(CliError::InvalidAreaRing {
                detail: format!("expected \"lon lat\", got {pair:?}"),
            });
        };
        let lon: f64 = lon.parse().map_err(|_| CliError::InvalidAreaRing {
            detail: format!("bad longitude {lon:?}"),
        })?;
        let lat: f64 = lat.parse().map_err(|_| CliError::InvalidAreaRing {
            detail: format!("bad latitude {lat:?}"),
        })?;
        points.push(Coord { x: lon, y: lat });
    }
    Ok(AreaRing::new(points)?)
}

fn run_query(args: QueryArgs) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = QueryConfig::try_from(merged)?;
    let store = PgRawStore::connect(&config.database_url)?;
    let mut repository = FeatureRepository::new(store);
    match (config.kind, config.list) {
        (QueryKind::Polygons, false) => print_json(&repository.polygons(&config.filter)?),
        (QueryKind::Nodes, false) => print_json(&repository.nodes(&config.filter)?),
        (QueryKind::Polygons, true) => print_json(&repository.polygons_list(&config.filter)?),
        (QueryKind::Nodes, true) => print_json(&repository.nodes_list(&config.filter)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).map_err(CliError::RenderOutput)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests;

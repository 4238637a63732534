//! ArgMatches → run request conversion.
//!
//! Translates clap's parsed arguments into a `PruneConfig`:
//! - `--config` supplies defaults
//! - flags override them
//! - the keep list comes from `--keep`, `--keep-file` or `--interactive`
//!   (resolved later, since interactive entry needs the terminal)

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use mapprune_core::{Error, Result};
use mapprune_engine::{PruneConfig, ReportFormat};

/// Default save file name
pub const DEFAULT_DB_NAME: &str = "map.sqlite3";

/// Where the keep list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepSource {
    /// Comma-separated list on the command line
    List(String),
    /// Keep-file path
    File(PathBuf),
    /// Prompt on stdin
    Interactive,
    /// Only what the config file holds
    Config,
}

/// A fully parsed invocation.
#[derive(Debug, Clone)]
pub struct CliRequest {
    /// Database argument, if given
    pub db: Option<PathBuf>,
    /// Options with flags applied
    pub config: PruneConfig,
    /// Keep list source
    pub keep: KeepSource,
    /// Output format
    pub format: ReportFormat,
    /// `-v` count
    pub verbose: u8,
}

/// Convert matches into a request.
///
/// # Errors
///
/// `Error::Config` / `Error::MissingFile` if `--config` cannot be loaded.
pub fn matches_to_request(matches: &ArgMatches) -> Result<CliRequest> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => PruneConfig::from_file(Path::new(path))?,
        None => PruneConfig::default(),
    };

    if let Some(span) = matches.get_one::<i32>("span") {
        config.span = *span;
    }
    config.no_vacuum |= matches.get_flag("no-vacuum");
    config.dry_run |= matches.get_flag("dry-run");
    config.force |= matches.get_flag("force");
    config.remove_grid |= matches.get_flag("remove-grid");
    config.verify_only |= matches.get_flag("verify-only");
    if let Some(path) = matches.get_one::<String>("verify-against") {
        config.verify_against = Some(PathBuf::from(path));
    }

    let keep = if let Some(list) = matches.get_one::<String>("keep") {
        KeepSource::List(list.clone())
    } else if let Some(path) = matches.get_one::<String>("keep-file") {
        KeepSource::File(PathBuf::from(path))
    } else if matches.get_flag("interactive") {
        KeepSource::Interactive
    } else {
        KeepSource::Config
    };

    let format = if matches.get_flag("json") {
        ReportFormat::Json
    } else {
        ReportFormat::Human
    };

    Ok(CliRequest {
        db: matches.get_one::<String>("db").map(PathBuf::from),
        config,
        keep,
        format,
        verbose: matches.get_count("verbose"),
    })
}

/// Read keep entries from a keep-file.
///
/// Everything after `#` on a line is a comment; blank lines are skipped.
/// Each remaining line may hold several comma-separated coordinates.
pub fn read_keep_file(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(Error::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|line| line.split_once('#').map_or(line, |(before, _)| before).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Pick the database path.
///
/// An explicit argument is used as given. Otherwise `map.sqlite3` next to
/// the executable is tried, then in the working directory.
pub fn resolve_db_path(arg: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DB_NAME)));
    let in_cwd = std::env::current_dir().ok().map(|dir| dir.join(DEFAULT_DB_NAME));

    beside_exe
        .into_iter()
        .chain(in_cwd)
        .find(|path| path.is_file())
        .ok_or_else(|| Error::MissingFile {
            path: PathBuf::from(DEFAULT_DB_NAME),
        })
}

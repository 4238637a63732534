//! Prune configuration via TOML
//!
//! Every run is described by one `PruneConfig`. The CLI builds it from flags,
//! optionally starting from a TOML file given with `--config`; flags always
//! override file values.

use std::path::{Path, PathBuf};

use mapprune_core::coordinate::{parse_list, ITEM_DELIMITER};
use mapprune_core::{Coordinate, Error, Result, Span, DEFAULT_SPAN};
use serde::{Deserialize, Serialize};

use crate::grid::GridMode;

/// Run configuration
///
/// # Example
///
/// ```toml
/// span = 180
/// keep = ["119.183.10", "119.183.9"]
/// no_vacuum = false
/// remove_grid = false
/// # verify_against = "map.sqlite3.bak"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PruneConfig {
    /// Submaps per overmap along x and y
    #[serde(default = "default_span")]
    pub span: i32,
    /// Coordinates to keep, each `x.y.z` (items may also hold comma lists)
    #[serde(default)]
    pub keep: Vec<String>,
    /// Skip the post-prune `VACUUM`
    #[serde(default)]
    pub no_vacuum: bool,
    /// Report the plan without touching the file
    #[serde(default)]
    pub dry_run: bool,
    /// Skip the confirmation prompt
    #[serde(default)]
    pub force: bool,
    /// Clear grids of surviving overmaps instead of filtering them
    #[serde(default)]
    pub remove_grid: bool,
    /// Second snapshot to verify against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_against: Option<PathBuf>,
    /// Only verify, never prune
    #[serde(default)]
    pub verify_only: bool,
}

fn default_span() -> i32 {
    DEFAULT_SPAN
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            span: default_span(),
            keep: Vec::new(),
            no_vacuum: false,
            dry_run: false,
            force: false,
            remove_grid: false,
            verify_against: None,
            verify_only: false,
        }
    }
}

impl PruneConfig {
    /// Read and parse config from a file path
    ///
    /// # Errors
    ///
    /// `Error::MissingFile` if the file does not exist, `Error::Config` if it
    /// does not parse or fails validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::config(format!(
                "config file '{}': {}",
                path.display(),
                msg
            )),
            other => other,
        })
    }

    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PruneConfig =
            toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.span()?;
        Ok(config)
    }

    /// Validated span
    pub fn span(&self) -> Result<Span> {
        Span::new(self.span)
    }

    /// Grid handling mode
    pub fn grid_mode(&self) -> GridMode {
        if self.remove_grid {
            GridMode::Remove
        } else {
            GridMode::Preserve
        }
    }

    /// Parse every keep entry, in order
    ///
    /// # Errors
    ///
    /// `Error::Parse` on the first malformed coordinate.
    pub fn keep_coordinates(&self) -> Result<Vec<Coordinate>> {
        let mut coords = Vec::new();
        for item in &self.keep {
            coords.extend(parse_list(item, ITEM_DELIMITER)?);
        }
        Ok(coords)
    }

    /// Check option combinations
    ///
    /// # Errors
    ///
    /// `Error::Config` when:
    /// - the span is not positive
    /// - `verify_only` is set without `verify_against`
    /// - nothing is kept on a pruning run
    pub fn validate(&self) -> Result<()> {
        self.span()?;
        if self.verify_only {
            if self.verify_against.is_none() {
                return Err(Error::config("--verify-only requires --verify-against"));
            }
            return Ok(());
        }
        if self.keep_coordinates()?.is_empty() {
            return Err(Error::config(
                "keep list is empty; nothing would remain after pruning",
            ));
        }
        Ok(())
    }
}

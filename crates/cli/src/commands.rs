//! Clap command definition.
//!
//! Builds the single `clap::Command` for `mapprune`. There are no
//! subcommands: the mode (prune, dry run, verify only) is picked by flags.

use clap::{Arg, ArgAction, ArgGroup, Command};

/// Build the complete CLI command.
pub fn build_cli() -> Command {
    Command::new("mapprune")
        .about("Prune a Bright Nights map.sqlite3 save down to a kept set of submaps")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .help("Save database (default: map.sqlite3 next to the executable, then in the working directory)")
                .value_name("DB"),
        )
        .arg(
            Arg::new("keep")
                .long("keep")
                .short('k')
                .value_name("LIST")
                .help("Coordinates to keep, e.g. \"119.183.10, 119.183.9\""),
        )
        .arg(
            Arg::new("keep-file")
                .long("keep-file")
                .value_name("PATH")
                .help("File with comma-separated coordinates per line; '#' starts a comment"),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .short('i')
                .help("Enter coordinates at a prompt")
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("keep-source")
                .args(["keep", "keep-file", "interactive"])
                .multiple(false),
        )
        .arg(
            Arg::new("span")
                .long("span")
                .value_name("N")
                .help("Submaps per overmap edge (default: 180)")
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("no-vacuum")
                .long("no-vacuum")
                .help("Skip VACUUM after pruning")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Show the plan; do not modify the database")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .short('f')
                .help("Do not ask for confirmation")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("remove-grid")
                .long("remove-grid")
                .visible_alias("remove-grids")
                .help("Clear electric/fluid grids of kept overmaps instead of filtering them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verify-against")
                .long("verify-against")
                .value_name("PATH")
                .help("Original database to compare the result against"),
        )
        .arg(
            Arg::new("verify-only")
                .long("verify-only")
                .help("Only compare DB with --verify-against; never prune")
                .action(ArgAction::SetTrue)
                .requires("verify-against")
                .conflicts_with_all(["dry-run", "interactive"]),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .help("TOML file with default options; flags override it"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("More output (-v lists records, -vv debug logs)")
                .action(ArgAction::Count),
        )
}

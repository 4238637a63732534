//! mapprune: prune a Bright Nights `map.sqlite3` save.
//!
//! Three modes, picked by flags:
//! - **Prune** (default): plan, confirm, back up, delete, compact
//! - **Dry run** (`--dry-run`): print the plan, touch nothing
//! - **Verify only** (`--verify-only`): compare DB with `--verify-against`
//!
//! The process exit code is taken from `Error::exit_code`; a failed
//! verification exits with 1.

mod backup;
mod commands;
mod format;
mod parse;
mod prompt;

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use mapprune_core::Result;
use mapprune_engine::{DryRunReporter, PruneHooks, PrunePlan, Pruner, ReportFormat, RunOutcome};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use commands::build_cli;
use format::{format_error, format_prune, format_verification};
use parse::{matches_to_request, read_keep_file, resolve_db_path, CliRequest, KeepSource};

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let format = if matches.get_flag("json") {
        ReportFormat::Json
    } else {
        ReportFormat::Human
    };

    let exit_code = match matches_to_request(&matches).and_then(run) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format_error(&e, format));
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(request: CliRequest) -> Result<i32> {
    let CliRequest {
        db,
        mut config,
        keep,
        format,
        verbose,
    } = request;

    match keep {
        KeepSource::List(list) => config.keep = vec![list],
        KeepSource::File(path) => config.keep = read_keep_file(&path)?,
        KeepSource::Interactive => {
            let stdin = io::stdin();
            let line = prompt::read_coordinates(&mut stdin.lock(), &mut io::stdout())?;
            config.keep = vec![line];
        }
        KeepSource::Config => {}
    }

    let database = resolve_db_path(db)?;
    debug!(database = %database.display(), "using database");

    let reporter = DryRunReporter::new(format, verbose > 0);
    let mut hooks = CliHooks { reporter };

    match Pruner::new(database, config).run(&mut hooks)? {
        RunOutcome::Verified(report) => {
            println!("{}", format_verification(&report, format));
            Ok(if report.is_consistent() { 0 } else { 1 })
        }
        RunOutcome::DryRun(plan) => {
            println!("{}", reporter.render(&plan)?);
            if format == ReportFormat::Human {
                println!("[DRY RUN] The database was not modified.");
            }
            Ok(0)
        }
        RunOutcome::Declined(_) => {
            println!("Cancelled. The database was not changed.");
            Ok(0)
        }
        RunOutcome::Pruned(report) => {
            println!("{}", format_prune(&report, format));
            let consistent = report
                .verification
                .as_ref()
                .map_or(true, |verification| verification.is_consistent());
            Ok(if consistent { 0 } else { 1 })
        }
    }
}

/// Plan printout, terminal prompt and `.bak` copy for the executor.
struct CliHooks {
    reporter: DryRunReporter,
}

impl PruneHooks for CliHooks {
    fn review(&mut self, plan: &PrunePlan) -> Result<()> {
        println!("{}", self.reporter.render(plan)?);
        Ok(())
    }

    fn confirm(&mut self, _plan: &PrunePlan) -> Result<bool> {
        let stdin = io::stdin();
        prompt::confirm(&mut stdin.lock(), &mut io::stdout(), "Apply this plan?")
    }

    fn snapshot(&mut self, database: &Path) -> Result<PathBuf> {
        let target = backup::create_backup(database)?;
        println!("Backup created: {}", target.display());
        Ok(target)
    }
}

//! Plan rendering
//!
//! Two formats:
//! - **Human**: an input summary (coordinates with their overmap and local
//!   position) and a plan block with keep/delete counts; `verbose` adds the
//!   full record lists
//! - **JSON**: the serialized `PrunePlan` via `serde_json::to_string_pretty`

use mapprune_core::{Error, Result};
use serde::Serialize;

use crate::grid::{GridActionKind, GridMode};
use crate::plan::{PlanSummary, PrunePlan};

/// Output format of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Plain text
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

/// Renders a plan without touching the database
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunReporter {
    format: ReportFormat,
    verbose: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: PlanSummary,
    plan: &'a PrunePlan,
}

impl DryRunReporter {
    /// Create a reporter
    pub fn new(format: ReportFormat, verbose: bool) -> Self {
        DryRunReporter { format, verbose }
    }

    /// Render `plan`
    pub fn render(&self, plan: &PrunePlan) -> Result<String> {
        match self.format {
            ReportFormat::Json => serde_json::to_string_pretty(&JsonReport {
                summary: plan.summary(),
                plan,
            })
            .map_err(|e| Error::config(format!("cannot serialize plan: {}", e))),
            ReportFormat::Human => Ok(self.render_human(plan)),
        }
    }

    fn render_human(&self, plan: &PrunePlan) -> String {
        let summary = plan.summary();
        let mut lines = vec!["=== INPUT SUMMARY ===".to_string(), "Keep coords:".to_string()];
        lines.extend(plan.retention.requested().iter().map(|coord| format!("  {}", coord)));

        lines.push(String::new());
        lines.push("Keep overmaps (with local position):".to_string());
        lines.extend(plan.retention.assignments().iter().map(|assignment| {
            format!(
                "  {} -> {}  (local {})",
                assignment.coord, assignment.overmap, assignment.local
            )
        }));

        let grid = match plan.grid_mode {
            GridMode::Preserve => "filter to surviving submaps (default)",
            GridMode::Remove => "remove all grids",
        };
        lines.push(String::new());
        lines.push(format!("Span: {}", plan.retention.span()));
        lines.push(format!("Grid handling: {}", grid));

        lines.push(String::new());
        lines.push("=== PLAN ===".to_string());
        lines.push(format!("DB: {}", plan.database.display()));
        lines.push(format!(
            "Total map entries: {}",
            summary.submaps_kept + summary.submaps_deleted
        ));
        lines.push(format!("  Will keep:   {}", summary.submaps_kept));
        lines.push(format!("  Will delete: {}", summary.submaps_deleted));
        lines.push(format!(
            "Total overmap entries: {}",
            summary.overmaps_kept + summary.overmaps_deleted
        ));
        lines.push(format!("  Will keep:   {}", summary.overmaps_kept));
        lines.push(format!("  Will delete: {}", summary.overmaps_deleted));
        lines.push(format!(
            "Grid actions: {} rewrite, {} clear, {} drop",
            summary.grid_rewrites, summary.grid_clears, summary.grid_drops
        ));

        if !plan.missing_overmaps.is_empty() {
            lines.push(String::new());
            lines.push("Warning: kept overmaps not present in the database:".to_string());
            lines.extend(plan.missing_overmaps.iter().map(|key| format!("  {}", key)));
        }
        if !plan.missing_submaps.is_empty() {
            lines.push(String::new());
            lines.push("Warning: kept coordinates with no submap record:".to_string());
            lines.extend(plan.missing_submaps.iter().map(|coord| format!("  {}", coord)));
        }

        if self.verbose {
            lines.push(String::new());
            lines.push("Submaps to delete:".to_string());
            lines.extend(plan.submaps_deleted.iter().map(|entry| format!("  {}", entry.path)));
            lines.push("Overmaps to delete:".to_string());
            lines.extend(plan.overmaps_deleted.iter().map(|entry| format!("  {}", entry.path)));
            lines.push("Grid rewrites:".to_string());
            lines.extend(
                plan.grid_actions
                    .iter()
                    .filter(|action| action.kind != GridActionKind::Drop)
                    .map(|action| {
                        format!(
                            "  {} ({:?}: {} entries, {} links removed)",
                            action.path, action.kind, action.entries_removed, action.links_removed
                        )
                    }),
            );
        }
        lines.push("============".to_string());
        lines.join("\n")
    }
}

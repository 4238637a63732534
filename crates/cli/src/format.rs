//! Outcome → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): section blocks like `=== VERIFY ===`
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use mapprune_core::Error;
use mapprune_engine::{EdgeDiff, Partition, PruneReport, ReportFormat, VerificationReport};
use serde::Serialize;

/// Maximum number of missing edges listed per network kind
pub const EDGE_LIST_LIMIT: usize = 50;

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"cannot serialize output: {}\"}}", e))
}

/// Format an error.
pub fn format_error(err: &Error, format: ReportFormat) -> String {
    match format {
        ReportFormat::Json => to_json(&serde_json::json!({
            "error": err.to_string(),
            "exit_code": err.exit_code(),
        })),
        ReportFormat::Human => format!("(error) {}", err),
    }
}

/// Format a verification report.
pub fn format_verification(report: &VerificationReport, format: ReportFormat) -> String {
    if format == ReportFormat::Json {
        return to_json(&serde_json::json!({
            "consistent": report.is_consistent(),
            "report": report,
        }));
    }

    let mut lines = vec![
        "=== VERIFY ===".to_string(),
        format!("A: {}", report.a.display()),
        format!("B: {}", report.b.display()),
        partition_line("Submaps", &report.submaps),
        partition_line("Overmaps", &report.overmaps),
    ];
    lines.extend(
        report
            .submaps
            .content_mismatch
            .iter()
            .map(|coord| format!("  content differs: {}", coord)),
    );
    if !report.lost_submaps.is_empty() || !report.lost_overmaps.is_empty() {
        lines.push(String::new());
        lines.push("[Kept records lost]".to_string());
        lines.extend(report.lost_submaps.iter().map(|coord| format!("  {}", coord)));
        lines.extend(report.lost_overmaps.iter().map(|key| format!("  {}", key)));
    }

    if let Some(edges) = &report.edges {
        lines.push(String::new());
        lines.push(format!("Kept coords with submaps in A: {}", edges.endpoints));
        edge_lines(&mut lines, "Electric", &edges.electric);
        edge_lines(&mut lines, "Fluid", &edges.fluid);
    }

    let verdict = if report.is_consistent() { "PASS" } else { "FAIL" };
    lines.push(String::new());
    lines.push(format!("VERIFY: {}", verdict));
    lines.join("\n")
}

fn partition_line<K>(label: &str, partition: &Partition<K>) -> String {
    format!(
        "{}: matched {}, missing from A {}, missing from B {}, content mismatch {}",
        label,
        partition.matched.len(),
        partition.missing_from_a.len(),
        partition.missing_from_b.len(),
        partition.content_mismatch.len()
    )
}

fn edge_lines(lines: &mut Vec<String>, label: &str, diff: &EdgeDiff) {
    lines.push(format!(
        "{} edges: A {}, B {}, missing {}",
        label,
        diff.in_a,
        diff.in_b,
        diff.missing.len()
    ));
    if diff.missing.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!(
        "[Missing {} edges] (showing up to {})",
        label, EDGE_LIST_LIMIT
    ));
    lines.extend(
        diff.missing
            .iter()
            .take(EDGE_LIST_LIMIT)
            .map(|edge| format!("  {}", edge)),
    );
}

/// Format the result of a committed prune.
pub fn format_prune(report: &PruneReport, format: ReportFormat) -> String {
    if format == ReportFormat::Json {
        return to_json(report);
    }

    let compaction = &report.compaction;
    let vacuum = if compaction.did_compact() {
        format!(
            "VACUUM: {} -> {} bytes ({} reclaimed, {} ms)",
            compaction.bytes_before, compaction.bytes_after, compaction.reclaimed_bytes, compaction.duration_ms
        )
    } else {
        "VACUUM: skipped".to_string()
    };
    let mut lines = vec![
        "=== DONE ===".to_string(),
        format!("Backup: {}", report.stats.snapshot.display()),
        format!("Deleted submaps:           {}", report.stats.submaps_deleted),
        format!("Deleted overmaps:          {}", report.stats.overmaps_deleted),
        format!("Rewritten overmaps:        {}", report.stats.overmaps_rewritten),
        vacuum,
        format!("Remaining map entries:     {}", report.remaining.submaps),
        format!("Remaining overmap entries: {}", report.remaining.overmaps),
        format!("Total remaining entries:   {}", report.remaining.total),
        format!("Modified DB: {}", report.plan.database.display()),
        "============".to_string(),
    ];

    if let Some(verification) = &report.verification {
        lines.push(String::new());
        lines.push(format_verification(verification, ReportFormat::Human));
    }
    lines.join("\n")
}

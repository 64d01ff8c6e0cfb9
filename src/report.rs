//! Plain-text and JSON views over a snapshot. Presentation only; nothing in
//! here feeds back into the engine.

use crate::farm::evaluate;
use crate::model::StatusSnapshot;
use std::path::Path;

const SEPARATOR: &str = "+-----+--------------------+--------------------+--------------+----------------------+----------------------+----------------------+-----------+------------+";

/// Boxed overview table: title, header row, one line per box, and a footer
/// with the platform name, box count and failure count.
pub fn render_overview(snapshot: &StatusSnapshot, platform: &str) -> String {
    let summary = evaluate::evaluate(snapshot, None);
    let head: Vec<&str> = snapshot.headline.split(", ").collect();
    let header_cell = |i: usize| head.get(i).copied().unwrap_or("");

    let mut out = String::new();
    out.push_str(&format!("+{}+\n", "-".repeat(156)));
    out.push_str(&format!("| {:<155}|\n", snapshot.title));
    out.push_str(SEPARATOR);
    out.push('\n');
    out.push_str(&format_row(
        header_cell(0),
        header_cell(1),
        header_cell(2),
        header_cell(3),
        header_cell(4),
        header_cell(5),
        header_cell(6),
        header_cell(7),
        header_cell(8),
    ));
    out.push_str(SEPARATOR);
    out.push('\n');
    for record in &snapshot.boxes {
        out.push_str(&format_row(
            &format!("{:>3}", record.ordinal),
            &record.name,
            &record.oem_name,
            &format!("{:>12}", record.status),
            &record.start_build,
            &record.start_feed_sync,
            &record.end_build,
            &format!("{:>9}", record.sync_time),
            &format!("{:>10}", record.build_time),
        ));
    }
    out.push_str(SEPARATOR);
    out.push('\n');
    out.push_str(&format!(
        "| {:<50}{:<48}{:<57}|\n",
        format!("current platform: {}", platform.to_uppercase()),
        format!("boxes found: {}", summary.box_count),
        format!("building errors found: {:>3}", summary.failed_count),
    ));
    out.push_str(&format!("+{}+\n", "-".repeat(156)));
    out
}

#[allow(clippy::too_many_arguments)]
fn format_row(
    no: &str,
    name: &str,
    oem: &str,
    status: &str,
    start_build: &str,
    start_sync: &str,
    end_build: &str,
    sync_time: &str,
    build_time: &str,
) -> String {
    format!(
        "| {no:<3} | {name:<18} | {oem:<18} | {status:<12} | {start_build:<20} | {start_sync:<20} | {end_build:<20} | {sync_time:<9} | {build_time:<10} |\n"
    )
}

/// Writes the snapshot as JSON with the established export field names, for
/// offline inspection by existing consumers.
pub fn write_json(snapshot: &StatusSnapshot, path: &Path) -> std::io::Result<()> {
    let text = serde_json::to_string_pretty(snapshot).map_err(std::io::Error::other)?;
    std::fs::write(path, text)
}

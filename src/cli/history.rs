//! Version history commands.

use super::{print_json, OutputFormat};
use crate::workspace::Workspace;

/// List versions, newest first.
pub(crate) fn cmd_versions(ws: &Workspace, filename: &str, format: OutputFormat) -> crate::Result<()> {
    let versions = ws.versions(filename)?;
    if format == OutputFormat::Json {
        return print_json(&versions);
    }

    if versions.is_empty() {
        println!("No versions of '{filename}'");
        return Ok(());
    }

    println!(
        "{:>5} {:<40} {:<20} {:>8}  ACTION",
        "INDEX", "VERSION", "CREATED", "ROWS"
    );
    println!("{}", "-".repeat(100));
    for (i, record) in versions.iter().enumerate() {
        println!(
            "{:>5} {:<40} {:<20} {:>8}  {}",
            i,
            record.name,
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.rows,
            record.action
        );
    }
    Ok(())
}

/// Make version `index` current.
pub(crate) fn cmd_undo(ws: &Workspace, filename: &str, index: usize) -> crate::Result<()> {
    let record = ws.undo(filename, index)?;
    println!(
        "\u{2713} '{}' reverted to {} ({})",
        filename, record.name, record.action
    );
    Ok(())
}

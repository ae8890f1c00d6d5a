//! Dataset transfer commands: upload, list, download, exports.

use std::path::Path;

use crate::{workspace::Workspace, Error};

/// Upload a file as a dataset.
pub(crate) fn cmd_upload(ws: &Workspace, path: &Path, name: Option<&str>) -> crate::Result<()> {
    let filename = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::invalid_input(format!("cannot derive a dataset name from {}", path.display()))
            })?,
    };

    let data = std::fs::read(path).map_err(|e| Error::io(e, path))?;
    let snapshot = ws.upload_bytes(&filename, &data)?;
    let score = ws.score(&filename)?;

    println!(
        "Uploaded {} as '{}' ({} rows, {} columns)",
        path.display(),
        filename,
        snapshot.num_rows(),
        snapshot.num_columns()
    );
    println!("Quality score: {:.1}/100", score.total);
    Ok(())
}

/// List uploaded datasets.
pub(crate) fn cmd_list(ws: &Workspace) -> crate::Result<()> {
    let datasets = ws.datasets()?;
    if datasets.is_empty() {
        println!("No datasets uploaded");
        return Ok(());
    }

    println!("{:<32} {:<10} {:>8}", "DATASET", "SOURCE", "VERSIONS");
    println!("{}", "-".repeat(52));
    for filename in &datasets {
        let (_, source) = ws.current(filename)?;
        let versions = ws.versions(filename)?.len();
        println!("{filename:<32} {:<10} {versions:>8}", source.as_str());
    }
    Ok(())
}

fn write_or_print(output: Option<&Path>, data: &[u8]) -> crate::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, data).map_err(|e| Error::io(e, path))?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(data).map_err(Error::io_no_path)?;
        }
    }
    Ok(())
}

/// Write the current data as CSV.
pub(crate) fn cmd_download(ws: &Workspace, filename: &str, output: Option<&Path>) -> crate::Result<()> {
    let data = ws.download(filename)?;
    write_or_print(output, &data)
}

/// Export analytics and scores as JSON.
pub(crate) fn cmd_export(ws: &Workspace, filename: &str, output: Option<&Path>) -> crate::Result<()> {
    let mut json = ws.export_analytics(filename)?.to_json()?;
    json.push('\n');
    write_or_print(output, json.as_bytes())
}

/// Write the pandas cleaning script.
pub(crate) fn cmd_export_script(
    ws: &Workspace,
    filename: &str,
    output: Option<&Path>,
) -> crate::Result<()> {
    let script = ws.export_script(filename)?;
    if output.is_none() {
        eprintln!("# {}", script.name);
    }
    write_or_print(output, script.source.as_bytes())
}

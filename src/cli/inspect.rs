//! Read-only inspection commands.

use super::{print_json, OutputFormat};
use crate::{
    quality::{QualityScore, Suggestion, SuggestionSeverity},
    stats::Analytics,
    workspace::{DatasetSummary, Workspace},
};

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn print_score(score: &QualityScore) {
    println!("Quality Score: {:.1}/100", score.total);
    println!("  Completeness: {:>5.1}/25", score.completeness);
    println!("  Uniqueness:   {:>5.1}/25", score.uniqueness);
    println!("  Consistency:  {:>5.1}/25", score.consistency);
    println!("  Validity:     {:>5.1}/25", score.validity);
}

fn print_suggestions(suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        println!("\u{2713} No cleaning suggestions");
        return;
    }
    for (i, s) in suggestions.iter().enumerate() {
        let severity = match s.severity {
            SuggestionSeverity::High => "HIGH",
            SuggestionSeverity::Medium => "MEDIUM",
        };
        println!("{:>2}. [{severity}] {} ({}): {}", i + 1, s.column, s.issue, s.message);
        println!("    -> {}", s.recommendation);
    }
}

fn print_analytics(analytics: &Analytics) {
    println!("Rows: {}", analytics.row_count);
    println!("Duplicate rows: {}", analytics.duplicate_rows);
    println!();
    println!(
        "{:<20} {:<8} {:>8} {:>12} {:>12} {:>12} {:>14} {:>9}",
        "COLUMN", "TYPE", "MISSING", "MIN", "MEAN", "MAX", "VARIANCE", "OUTLIERS"
    );
    println!("{}", "-".repeat(102));
    for col in &analytics.columns {
        let summary = col.numeric.unwrap_or_default();
        println!(
            "{:<20} {:<8} {:>8} {:>12} {:>12} {:>12} {:>14} {:>9}",
            col.name,
            col.kind.dtype_name(),
            col.missing_count,
            fmt_opt(summary.min),
            fmt_opt(summary.mean),
            fmt_opt(summary.max),
            fmt_opt(summary.variance),
            summary.outlier_count
        );
    }

    let matrix = &analytics.correlation;
    if matrix.columns.len() > 1 {
        println!();
        println!("Correlation:");
        print!("{:<20}", "");
        for name in &matrix.columns {
            print!(" {name:>10.10}");
        }
        println!();
        for (name, row) in matrix.columns.iter().zip(&matrix.values) {
            print!("{name:<20}");
            for value in row {
                print!(" {value:>10.2}");
            }
            println!();
        }
    }
}

/// Full report.
pub(crate) fn cmd_report(ws: &Workspace, filename: &str, format: OutputFormat) -> crate::Result<()> {
    let report = ws.report(filename)?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }

    println!("Data Quality Report");
    println!("===================");
    println!(
        "Dataset: {} ({})",
        report.filename,
        report.data_source.as_str()
    );
    println!(
        "Score: {:.1} -> {:.1}",
        report.before_score.total, report.after_score.total
    );
    println!();
    print_score(&report.after_score);
    println!();
    print_analytics(&report.analytics);
    println!();
    println!("Suggestions:");
    println!("------------");
    print_suggestions(&report.suggestions);
    Ok(())
}

/// Quality score.
pub(crate) fn cmd_score(ws: &Workspace, filename: &str, format: OutputFormat) -> crate::Result<()> {
    let score = ws.score(filename)?;
    match format {
        OutputFormat::Json => print_json(&score),
        OutputFormat::Text => {
            print_score(&score);
            Ok(())
        }
    }
}

/// Cleaning suggestions.
pub(crate) fn cmd_suggest(ws: &Workspace, filename: &str, format: OutputFormat) -> crate::Result<()> {
    let suggestions = ws.suggestions(filename)?;
    match format {
        OutputFormat::Json => print_json(&suggestions),
        OutputFormat::Text => {
            print_suggestions(&suggestions);
            Ok(())
        }
    }
}

/// Column statistics.
pub(crate) fn cmd_analyze(ws: &Workspace, filename: &str, format: OutputFormat) -> crate::Result<()> {
    let analytics = ws.analytics(filename)?;
    match format {
        OutputFormat::Json => print_json(&analytics),
        OutputFormat::Text => {
            print_analytics(&analytics);
            Ok(())
        }
    }
}

/// Per-column diagnosis.
pub(crate) fn cmd_diagnose(ws: &Workspace, filename: &str, format: OutputFormat) -> crate::Result<()> {
    let diagnosis = ws.diagnose(filename)?;
    if format == OutputFormat::Json {
        return print_json(&diagnosis);
    }

    println!(
        "Rows: {}  Columns: {}  Duplicates: {}",
        diagnosis.rows, diagnosis.columns, diagnosis.duplicates
    );
    println!();
    println!("{:<20} {:<8} {:>10} {:<10}", "COLUMN", "DTYPE", "MISSING %", "HEALTH");
    println!("{}", "-".repeat(52));
    for (name, pct) in &diagnosis.missing_percent {
        let dtype = diagnosis.dtypes.get(name).map_or("-", String::as_str);
        let health = diagnosis.severity.get(name).map_or("-", |h| h.as_str());
        println!("{name:<20} {dtype:<8} {pct:>10.2} {health:<10}");
    }
    Ok(())
}

fn print_summary_row(label: &str, original: String, current: String) {
    println!("{label:<16} {original:>12} {current:>12}");
}

/// Original versus current.
pub(crate) fn cmd_compare(ws: &Workspace, filename: &str, format: OutputFormat) -> crate::Result<()> {
    let comparison = ws.compare(filename)?;
    if format == OutputFormat::Json {
        return print_json(&comparison);
    }

    let (a, b): (&DatasetSummary, &DatasetSummary) = (&comparison.original, &comparison.current);
    println!("{:<16} {:>12} {:>12}", "", "ORIGINAL", "CURRENT");
    println!("{}", "-".repeat(42));
    print_summary_row("Rows", a.rows.to_string(), b.rows.to_string());
    print_summary_row("Columns", a.columns.to_string(), b.columns.to_string());
    print_summary_row("Missing cells", a.missing_cells.to_string(), b.missing_cells.to_string());
    print_summary_row("Duplicate rows", a.duplicate_rows.to_string(), b.duplicate_rows.to_string());
    print_summary_row("Outlier cells", a.outlier_cells.to_string(), b.outlier_cells.to_string());
    print_summary_row(
        "Score",
        format!("{:.1}", a.score.total),
        format!("{:.1}", b.score.total),
    );
    Ok(())
}

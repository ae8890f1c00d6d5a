//! Cleaning commands. Each successful command commits one version.

use clap::Args;

use crate::{
    quality::IssueKind,
    transform::{CleaningPlan, FillStrategy, OutlierAction},
    versioning::VersionRecord,
    workspace::Workspace,
    Error,
};

/// Steps of a custom cleaning plan.
#[derive(Debug, Clone, Default, Args)]
pub struct PlanArgs {
    /// Fill missing numeric cells (auto, mean, median, mode)
    #[arg(long)]
    pub fill: Option<FillStrategy>,
    /// Handle numeric outliers (cap, remove)
    #[arg(long)]
    pub outliers: Option<OutlierAction>,
    /// Drop repeated rows
    #[arg(long)]
    pub remove_duplicates: bool,
}

impl PlanArgs {
    /// The plan these flags describe.
    pub fn to_plan(&self) -> CleaningPlan {
        let mut plan = CleaningPlan::new().remove_duplicates(self.remove_duplicates);
        if let Some(strategy) = self.fill {
            plan = plan.fill_missing(strategy);
        }
        if let Some(action) = self.outliers {
            plan = plan.outliers(action);
        }
        plan
    }
}

fn print_record(record: &VersionRecord) {
    println!("\u{2713} {}", record.action);
    println!(
        "  Saved version {} ({} rows, {} columns)",
        record.name, record.rows, record.columns
    );
}

/// Fix one suggested issue.
pub(crate) fn cmd_apply(
    ws: &Workspace,
    filename: &str,
    issue: IssueKind,
    column: &str,
) -> crate::Result<()> {
    let record = ws.apply_suggestion(filename, issue, column)?;
    print_record(&record);
    Ok(())
}

/// Fix every current suggestion.
pub(crate) fn cmd_apply_all(ws: &Workspace, filename: &str) -> crate::Result<()> {
    let (record, applied) = ws.apply_all(filename)?;
    if applied.is_empty() {
        println!("No suggestions to apply");
    }
    for suggestion in &applied {
        println!("  - {} ({})", suggestion.issue, suggestion.column);
    }
    print_record(&record);
    Ok(())
}

/// Run a custom cleaning plan.
pub(crate) fn cmd_clean(ws: &Workspace, filename: &str, args: &PlanArgs) -> crate::Result<()> {
    let plan = args.to_plan();
    if plan.is_empty() {
        return Err(Error::invalid_input(
            "nothing to do: pass --fill, --outliers or --remove-duplicates",
        ));
    }
    let record = ws.clean(filename, &plan)?;
    print_record(&record);
    Ok(())
}

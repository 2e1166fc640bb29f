//! Batch status command.

use anyhow::Result;
use clap::Args;
use seatplan_engine::{status, DepartmentStatus, StatusReport};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_output, print_single, print_warning, OutputFormat};

use super::CommandContext;

/// Show seated/unseated totals for the current batch.
#[derive(Debug, Args)]
pub struct StatusCommand {}

#[derive(Debug, Serialize, Tabled)]
struct DepartmentRow {
    #[tabled(rename = "Department")]
    dept: String,

    #[tabled(rename = "Total")]
    total: usize,

    #[tabled(rename = "Seated")]
    seated: usize,

    #[tabled(rename = "Unseated")]
    unseated: usize,
}

impl DepartmentRow {
    fn new(dept: String, counts: &DepartmentStatus) -> Self {
        Self {
            dept,
            total: counts.total,
            seated: counts.seated,
            unseated: counts.unseated,
        }
    }
}

/// Warning line for a batch larger than the available seats, if any.
fn shortfall_warning(report: &StatusReport) -> Option<String> {
    let shortfall = report.shortfall();
    (shortfall > 0).then(|| {
        format!(
            "{} examinee(s) but only {} seat(s) in available rooms; {} more seat(s) needed",
            report.total, report.available_capacity, shortfall
        )
    })
}

impl StatusCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let store = ctx.open_store()?;
        let batch = ctx.require_batch(&store)?;
        let report = status(&store, batch.id)?;

        match ctx.format {
            OutputFormat::Json => print_single(&serde_json::json!({
                "report": report,
                "shortfall": report.shortfall(),
            })),
            OutputFormat::Table => {
                print_info(&format!(
                    "Batch '{}': {} examinee(s), {} seated, {} unseated",
                    report.batch.name, report.total, report.seated, report.unseated
                ));
                print_info(&format!(
                    "Rooms: {} of {} available, {} seat(s)",
                    report.rooms_available, report.rooms_total, report.available_capacity
                ));

                let rows: Vec<DepartmentRow> = report
                    .departments
                    .iter()
                    .map(|(dept, counts)| DepartmentRow::new(dept.to_string(), counts))
                    .collect();
                print_output(&rows, OutputFormat::Table);

                if let Some(warning) = shortfall_warning(&report) {
                    print_warning(&warning);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatplan_engine::{Batch, ExamType};
    use seatplan_id::BatchId;
    use std::collections::BTreeMap;

    fn report(total: usize, available_capacity: u64) -> StatusReport {
        StatusReport {
            batch: Batch {
                id: BatchId::new(),
                name: "Mid term".to_string(),
                exam_type: ExamType::Internal,
                description: None,
                created_at: chrono::Utc::now(),
                active: true,
            },
            total,
            seated: 0,
            unseated: total,
            departments: BTreeMap::new(),
            rooms_total: 2,
            rooms_available: 1,
            available_capacity,
        }
    }

    #[test]
    fn test_shortfall_warning() {
        let warning = shortfall_warning(&report(50, 30)).unwrap();
        assert!(warning.contains("20 more seat(s)"));
        assert!(shortfall_warning(&report(30, 30)).is_none());
    }
}

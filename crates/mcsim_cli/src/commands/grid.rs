//! Grid command implementation
//!
//! Prints the time grid built from mandatory times or event dates.

use chrono::NaiveDate;
use mcsim_core::types::{mandatory_times, DayCountConvention};
use mcsim_core::{Time, TimeGrid};
use serde::Serialize;
use tracing::info;

use super::OutputFormat;
use crate::{CliError, Result};

/// Where the mandatory times come from.
#[derive(Debug, Clone, PartialEq)]
pub enum GridInput {
    /// Times in years
    Times(Vec<Time>),
    /// Event dates measured from a reference date
    Dates {
        reference: NaiveDate,
        dates: Vec<NaiveDate>,
        day_count: DayCountConvention,
    },
}

impl GridInput {
    fn mandatory(&self) -> Result<Vec<Time>> {
        match self {
            GridInput::Times(times) => Ok(times.clone()),
            GridInput::Dates {
                reference,
                dates,
                day_count,
            } => Ok(mandatory_times(*reference, dates, *day_count)?),
        }
    }
}

/// One grid node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPoint {
    pub index: usize,
    pub time: Time,
    /// Length of the interval ending here
    pub dt: Option<Time>,
    pub mandatory: bool,
}

/// Constructed grid as reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridReport {
    pub steps: usize,
    pub mandatory_times: Vec<Time>,
    pub points: Vec<GridPoint>,
}

/// Run the grid command
pub fn run(input: &GridInput, steps: usize, format: OutputFormat) -> Result<()> {
    info!("Building time grid...");
    info!("  Requested steps: {}", steps);

    let report = build(input, steps)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }

    info!(points = report.points.len(), "Grid complete");
    Ok(())
}

/// Builds the grid and its report.
pub fn build(input: &GridInput, steps: usize) -> Result<GridReport> {
    let mandatory = input.mandatory()?;
    if mandatory.is_empty() {
        return Err(CliError::InvalidArgument(
            "at least one mandatory time is required".into(),
        ));
    }
    let grid = TimeGrid::new(&mandatory, steps)?;

    let points = grid
        .times()
        .iter()
        .enumerate()
        .map(|(index, &time)| GridPoint {
            index,
            time,
            dt: index.checked_sub(1).map(|prev| time - grid.times()[prev]),
            mandatory: is_mandatory(&grid, time),
        })
        .collect();

    Ok(GridReport {
        steps,
        mandatory_times: grid.mandatory_times().to_vec(),
        points,
    })
}

fn is_mandatory(grid: &TimeGrid, time: Time) -> bool {
    grid.mandatory_times().contains(&time)
}

fn print_table(report: &GridReport) {
    println!("\n┌───────┬──────────────┬──────────────┬───────────┐");
    println!("│ Index │ Time         │ dt           │ Mandatory │");
    println!("├───────┼──────────────┼──────────────┼───────────┤");
    for point in &report.points {
        let dt = point.dt.map_or("-".to_string(), |dt| format!("{:.8}", dt));
        let mark = if point.mandatory { "*" } else { "" };
        println!(
            "│ {:>5} │ {:>12.8} │ {:>12} │ {:^9} │",
            point.index, point.time, dt, mark
        );
    }
    println!("└───────┴──────────────┴──────────────┴───────────┘");
}

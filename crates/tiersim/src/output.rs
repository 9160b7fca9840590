//! Non-interactive renderings of simulation results.

use anyhow::Result;
use clap::ValueEnum;
use std::io::Write;
use tiersim_engine::data_structures::bytes_to_gib;
use tiersim_engine::{Comparison, MonthlyResult, SimulationRun, StorageClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

const CSV_HEADER: &str = "month,period,standard_gib,nearline_gib,coldline_gib,archive_gib,total_gib,\
storage,retrieval,early_deletion,api_class_a,api_class_b,management_fee,total_cost,cumulative_cost,\
managed_objects,reconciled_gib,generation_count";

pub fn write_run<W: Write>(out: &mut W, run: &SimulationRun, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, run)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "{}", CSV_HEADER)?;
            for row in run.rows() {
                writeln!(out, "{}", csv_row(row))?;
            }
        }
        OutputFormat::Table => {
            writeln!(out, "{}", run.strategy())?;
            write_table(out, run.rows())?;
            for warning in run.warnings() {
                writeln!(out, "Warning: {}", warning)?;
            }
        }
    }
    Ok(())
}

pub fn write_comparison<W: Write>(
    out: &mut W,
    comparison: &Comparison,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, comparison)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            writeln!(
                out,
                "month,autoclass_total,lifecycle_total,monthly_delta,cumulative_delta,leader,leader_changed"
            )?;
            for delta in &comparison.deltas {
                writeln!(
                    out,
                    "{},{:.6},{:.6},{:.6},{:.6},{},{}",
                    delta.month,
                    delta.autoclass_total,
                    delta.lifecycle_total,
                    delta.monthly_delta,
                    delta.cumulative_delta,
                    delta.leader,
                    delta.leader_changed
                )?;
            }
        }
        OutputFormat::Table => {
            write_run(out, &comparison.autoclass, OutputFormat::Table)?;
            writeln!(out)?;
            write_run(out, &comparison.lifecycle, OutputFormat::Table)?;
            writeln!(out)?;

            writeln!(
                out,
                "{:>5} {:>14} {:>14} {:>14} {:>10}",
                "Month", "Autoclass", "Lifecycle", "Cum. delta", "Leader"
            )?;
            for delta in &comparison.deltas {
                writeln!(
                    out,
                    "{:>5} {:>14.2} {:>14.2} {:>14.2} {:>10}{}",
                    delta.month,
                    delta.autoclass_total,
                    delta.lifecycle_total,
                    delta.cumulative_delta,
                    delta.leader,
                    if delta.leader_changed { " *" } else { "" }
                )?;
            }

            writeln!(out)?;
            for insight in comparison.insights() {
                writeln!(out, "- {}", insight)?;
            }
            writeln!(out, "{}", comparison.summary.recommendation)?;
        }
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, rows: &[MonthlyResult]) -> Result<()> {
    writeln!(
        out,
        "{:>5} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "Month", "Standard", "Nearline", "Coldline", "Archive", "Fees", "Cost", "Cumulative"
    )?;
    for row in rows {
        let costs = row.costs();
        let fees = costs.total() - costs.storage();
        writeln!(
            out,
            "{:>5} {:>12.1} {:>12.1} {:>12.1} {:>12.1} {:>12.2} {:>12.2} {:>14.2}",
            row.month(),
            bytes_to_gib(row.bytes_in(StorageClass::Standard)),
            bytes_to_gib(row.bytes_in(StorageClass::Nearline)),
            bytes_to_gib(row.bytes_in(StorageClass::Coldline)),
            bytes_to_gib(row.bytes_in(StorageClass::Archive)),
            fees,
            row.total_cost(),
            row.cumulative_cost()
        )?;
    }
    Ok(())
}

fn csv_row(row: &MonthlyResult) -> String {
    let costs = row.costs();
    let period = row
        .period()
        .map(|date| date.format("%Y-%m").to_string())
        .unwrap_or_default();

    format!(
        "{},{},{:.3},{:.3},{:.3},{:.3},{:.3},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.1},{:.3},{}",
        row.month(),
        period,
        bytes_to_gib(row.bytes_in(StorageClass::Standard)),
        bytes_to_gib(row.bytes_in(StorageClass::Nearline)),
        bytes_to_gib(row.bytes_in(StorageClass::Coldline)),
        bytes_to_gib(row.bytes_in(StorageClass::Archive)),
        bytes_to_gib(row.total_bytes()),
        costs.storage(),
        costs.retrieval(),
        costs.early_deletion(),
        costs.api_class_a(),
        costs.api_class_b(),
        costs.management_fee(),
        row.total_cost(),
        row.cumulative_cost(),
        row.managed_objects(),
        bytes_to_gib(row.reconciled_bytes()),
        row.generation_count()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiersim_engine::{PricingTable, SimulationConfig, Simulator, Strategy};

    fn run() -> SimulationRun {
        Simulator::new(SimulationConfig::default(), PricingTable::base())
            .unwrap()
            .run(Strategy::Lifecycle)
            .unwrap()
    }

    #[test]
    fn test_csv_has_one_line_per_month() {
        let mut out = Vec::new();
        write_run(&mut out, &run(), OutputFormat::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("1,,"));
        assert_eq!(
            lines[1].split(',').count(),
            CSV_HEADER.split(',').count()
        );
    }

    #[test]
    fn test_csv_carries_audit_columns() {
        let run = run();
        let mut out = Vec::new();
        write_run(&mut out, &run, OutputFormat::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(
            &header[header.len() - 3..],
            &["managed_objects", "reconciled_gib", "generation_count"]
        );

        let last = run.final_row().unwrap();
        let fields: Vec<&str> = lines.last().unwrap().split(',').collect();
        assert_eq!(fields[header.len() - 1], last.generation_count().to_string());
        assert_eq!(
            fields[header.len() - 3],
            format!("{:.1}", last.managed_objects())
        );
    }

    #[test]
    fn test_json_is_parseable() {
        let mut out = Vec::new();
        write_run(&mut out, &run(), OutputFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["strategy"], "lifecycle");
        assert_eq!(value["rows"].as_array().unwrap().len(), 12);
    }
}

/// reporting.rs — Evaluation and fit reports
///
/// Output formats:
///   - summary CSV, one row per evaluated instrument, fixed column set
///   - JSON export of the whole batch (all metrics, verdicts, failures)
///   - console blocks per instrument and a summary table
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use vol_engine::diagnostics::{LjungBox, ReturnSummary};
use vol_engine::models::FittedVolatility;
use vol_engine::{Evaluation, Verdict};

use crate::data::write_csv;

/// Column order of the summary table.
pub const SUMMARY_COLUMNS: [&str; 9] = [
    "Ticker",
    "RMSE_GARCH",
    "RMSE_LSTM",
    "MAE_GARCH",
    "MAE_LSTM",
    "MAPE_GARCH",
    "MAPE_LSTM",
    "DM_stat",
    "p_value",
];

/// An instrument whose evaluation did not complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentFailure {
    pub ticker: String,
    pub reason: String,
}

/// Result of a batch run across instruments.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub significance: f64,
    pub evaluations: Vec<Evaluation>,
    pub verdicts: Vec<Verdict>,
    pub failures: Vec<InstrumentFailure>,
}

impl BatchReport {
    pub fn new(
        significance: f64,
        evaluations: Vec<Evaluation>,
        failures: Vec<InstrumentFailure>,
    ) -> Self {
        let verdicts = evaluations.iter().map(|e| e.verdict(significance)).collect();
        Self {
            generated_at: Utc::now(),
            significance,
            evaluations,
            verdicts,
            failures,
        }
    }
}

pub fn summary_frame(evaluations: &[Evaluation]) -> Result<DataFrame> {
    let col = |f: &dyn Fn(&Evaluation) -> f64| -> Vec<f64> { evaluations.iter().map(f).collect() };
    let tickers: Vec<String> = evaluations.iter().map(|e| e.ticker.clone()).collect();

    let df = df!(
        SUMMARY_COLUMNS[0] => tickers,
        SUMMARY_COLUMNS[1] => col(&|e: &Evaluation| e.garch.metrics.rmse),
        SUMMARY_COLUMNS[2] => col(&|e: &Evaluation| e.lstm.metrics.rmse),
        SUMMARY_COLUMNS[3] => col(&|e: &Evaluation| e.garch.metrics.mae),
        SUMMARY_COLUMNS[4] => col(&|e: &Evaluation| e.lstm.metrics.mae),
        SUMMARY_COLUMNS[5] => col(&|e: &Evaluation| e.garch.metrics.mape),
        SUMMARY_COLUMNS[6] => col(&|e: &Evaluation| e.lstm.metrics.mape),
        SUMMARY_COLUMNS[7] => col(&|e: &Evaluation| e.dm.statistic),
        SUMMARY_COLUMNS[8] => col(&|e: &Evaluation| e.dm.p_value),
    )?;
    Ok(df)
}

pub fn write_summary_csv(evaluations: &[Evaluation], path: &Path) -> Result<()> {
    let mut df = summary_frame(evaluations)?;
    write_csv(&mut df, path)?;
    info!("Summary written to {}", path.display());
    Ok(())
}

pub fn write_json(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!("JSON report written to {}", path.display());
    Ok(())
}

/// Console block for one instrument.
pub fn format_evaluation(ev: &Evaluation, significance: f64) -> String {
    let g = &ev.garch;
    let l = &ev.lstm;
    let mut out = String::new();
    out.push_str(&format!("\n=== {} ===\n", ev.ticker));
    out.push_str(&format!("Period: {} → {} ({} obs)\n", ev.start, ev.end, ev.n_obs));
    out.push_str(&format!("GARCH | {} | LL: {:.2}\n", g.metrics, g.log_likelihood));
    out.push_str(&format!("LSTM  | {} | LL: {:.2}\n", l.metrics, l.log_likelihood));
    out.push_str(&format!("{}\n", ev.dm));
    out.push_str(&format!("Verdict (α = {significance}): {}", ev.verdict(significance)));
    out
}

/// Fixed-width summary table, one row per instrument.
pub fn format_summary_table(evaluations: &[Evaluation]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<10}", SUMMARY_COLUMNS[0]));
    for name in &SUMMARY_COLUMNS[1..] {
        out.push_str(&format!(" {name:>12}"));
    }
    out.push('\n');
    for ev in evaluations {
        out.push_str(&format!(
            "{:<10} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>12.4} {:>12.4} {:>12.4} {:>12.4}\n",
            ev.ticker,
            ev.garch.metrics.rmse,
            ev.lstm.metrics.rmse,
            ev.garch.metrics.mae,
            ev.lstm.metrics.mae,
            ev.garch.metrics.mape,
            ev.lstm.metrics.mape,
            ev.dm.statistic,
            ev.dm.p_value,
        ));
    }
    out
}

pub fn print_failures(failures: &[InstrumentFailure]) {
    if failures.is_empty() {
        return;
    }
    println!("\nFailed instruments:");
    for f in failures {
        println!("  {:<10} {}", f.ticker, f.reason);
    }
}

/// Console block for one instrument's fit step.
pub fn format_fit(
    ticker: &str,
    summary: &ReturnSummary,
    fits: &[(FittedVolatility, Option<LjungBox>)],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n{ticker}\n{}\n", "=".repeat(50), "=".repeat(50)));
    out.push_str(&format!("Returns | {summary}\n"));
    for (fit, lb) in fits {
        out.push_str(&format!("{fit}\n"));
        match lb {
            Some(lb) => out.push_str(&format!(
                "{} - mean Ljung-Box p-value (z², lags 1..={}): {:.4}\n",
                fit.model,
                lb.max_lag(),
                lb.mean_p_value()
            )),
            None => out.push_str(&format!("{} - Ljung-Box not available\n", fit.model)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use vol_engine::{evaluate, AlignedSeries};

    fn sample_evaluation(ticker: &str) -> Evaluation {
        let aligned = AlignedSeries {
            dates: (1..=3).map(|d| NaiveDate::from_ymd_opt(2024, 2, d).unwrap()).collect(),
            realized: vec![1.0, 2.0, 3.0],
            garch: vec![1.1, 2.1, 2.9],
            lstm: vec![0.9, 2.2, 3.2],
        };
        evaluate(ticker, &aligned).unwrap()
    }

    #[test]
    fn summary_has_fixed_columns() {
        let df = summary_frame(&[sample_evaluation("GSPC"), sample_evaluation("BTC-USD")]).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, SUMMARY_COLUMNS.to_vec());
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn summary_csv_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("evaluation_summary.csv");
        write_summary_csv(&[sample_evaluation("GSPC")], &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, SUMMARY_COLUMNS.join(","));
        assert!(text.lines().nth(1).unwrap().starts_with("GSPC,"));
    }

    #[test]
    fn json_report_includes_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = BatchReport::new(
            0.05,
            vec![sample_evaluation("GSPC")],
            vec![InstrumentFailure {
                ticker: "BTC-USD".into(),
                reason: "no overlapping dates".into(),
            }],
        );
        write_json(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["evaluations"][0]["ticker"], "GSPC");
        assert_eq!(value["failures"][0]["ticker"], "BTC-USD");
        assert_eq!(value["verdicts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn console_block_mentions_both_models() {
        let text = format_evaluation(&sample_evaluation("GSPC"), 0.05);
        assert!(text.contains("=== GSPC ==="));
        assert!(text.contains("GARCH |"));
        assert!(text.contains("LSTM  |"));
        assert!(text.contains("DM test"));
    }
}

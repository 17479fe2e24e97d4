/// pipeline.rs — The three entry points behind the CLI
///
///   evaluate : batch over configured tickers, canonical on-disk layout
///   compare  : one instrument, explicit file paths
///   fit      : GARCH / EGARCH on log returns, persists predictions
///
/// Every entry point takes its configuration as a parameter.  A failure in
/// one instrument is recorded and the batch moves on; the batch itself only
/// fails when no instrument succeeds.
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use vol_engine::diagnostics::{ljung_box, LjungBox, ReturnSummary};
use vol_engine::models::{EgarchModel, FittedVolatility, GarchModel, VolatilityModel};
use vol_engine::{align, evaluate, AlignedSeries, Evaluation};

use crate::config::{AppConfig, InstrumentPaths};
use crate::data::{load_aligned, load_returns, load_series, write_csv, VolatilityTable};
use crate::plotting::{plot_fit, plot_forecasts};
use crate::reporting::{
    format_evaluation, format_fit, format_summary_table, print_failures, write_json,
    write_summary_csv, BatchReport, InstrumentFailure,
};
use crate::schema;

// ── Evaluation ───────────────────────────────────────────────────────────

/// Load, align and score one instrument from the canonical layout.
pub fn evaluate_instrument(
    ticker: &str,
    paths: &InstrumentPaths,
) -> Result<(Evaluation, AlignedSeries)> {
    let aligned = load_aligned(paths).with_context(|| format!("{ticker}: loading inputs"))?;
    let evaluation =
        evaluate(ticker, &aligned).with_context(|| format!("{ticker}: scoring forecasts"))?;
    Ok((evaluation, aligned))
}

pub fn run_evaluation(cfg: &AppConfig) -> Result<BatchReport> {
    if cfg.tickers.is_empty() {
        bail!("no instruments configured");
    }
    info!("Evaluating {} instrument(s): {}", cfg.tickers.len(), cfg.tickers.join(", "));

    let mut evaluations = Vec::with_capacity(cfg.tickers.len());
    let mut failures = Vec::new();

    for ticker in &cfg.tickers {
        match evaluate_instrument(ticker, &cfg.instrument_paths(ticker)) {
            Ok((evaluation, aligned)) => {
                println!("{}", format_evaluation(&evaluation, cfg.significance));
                if cfg.plot {
                    let path = cfg.figures_dir.join(format!("{ticker}_forecast.png"));
                    render_forecasts(ticker, &aligned, &path);
                }
                evaluations.push(evaluation);
            }
            Err(e) => {
                warn!("{ticker}: evaluation failed: {e:#}");
                failures.push(InstrumentFailure {
                    ticker: ticker.clone(),
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    print_failures(&failures);
    if evaluations.is_empty() {
        // No summary rows this run: drop the previous summary, keep the failure record.
        let summary = cfg.summary_path();
        if summary.exists() {
            fs::remove_file(&summary)
                .with_context(|| format!("cannot remove stale {}", summary.display()))?;
        }
        let failed = failures.len();
        write_json(&BatchReport::new(cfg.significance, Vec::new(), failures), &cfg.report_path())?;
        bail!("all {failed} instrument(s) failed");
    }

    println!("\n{}", format_summary_table(&evaluations));
    write_summary_csv(&evaluations, &cfg.summary_path())?;

    let report = BatchReport::new(cfg.significance, evaluations, failures);
    write_json(&report, &cfg.report_path())?;
    Ok(report)
}

/// Single-instrument evaluation from explicit files.
pub fn run_comparison(
    ticker: &str,
    realized: &Path,
    garch: &Path,
    lstm: &Path,
    cfg: &AppConfig,
) -> Result<Evaluation> {
    let realized = load_series(realized, &schema::REALIZED, "realized")?;
    let garch = load_series(garch, &schema::GARCH, "garch")?;
    let lstm = load_series(lstm, &schema::LSTM, "lstm")?;

    let aligned = align(&realized, &garch, &lstm)
        .with_context(|| format!("{ticker}: aligning inputs"))?;
    let evaluation =
        evaluate(ticker, &aligned).with_context(|| format!("{ticker}: scoring forecasts"))?;

    println!("{}", format_evaluation(&evaluation, cfg.significance));
    if cfg.plot {
        let path = cfg.figures_dir.join(format!("{ticker}_comparison.png"));
        render_forecasts(ticker, &aligned, &path);
    }
    Ok(evaluation)
}

fn render_forecasts(ticker: &str, aligned: &AlignedSeries, path: &Path) {
    let title = format!("{ticker} - Realized vs forecast volatility");
    if let Err(e) = plot_forecasts(aligned, &title, path) {
        warn!("{ticker}: chart not rendered: {e:#}");
    }
}

// ── Fitting ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub ticker: String,
    pub returns: ReturnSummary,
    pub garch: FittedVolatility,
    pub egarch: FittedVolatility,
    pub garch_ljung_box: Option<LjungBox>,
    pub egarch_ljung_box: Option<LjungBox>,
    /// predictions/garch_<T>.csv
    pub predictions: PathBuf,
}

pub fn fit_instrument(
    ticker: &str,
    paths: &InstrumentPaths,
    cfg: &AppConfig,
) -> Result<FitOutcome> {
    let returns =
        load_returns(&paths.returns).with_context(|| format!("{ticker}: loading returns"))?;
    let values = returns.values();
    let summary = ReturnSummary::from_returns(&values)
        .with_context(|| format!("{ticker}: return summary"))?;
    info!("{ticker}: {summary}");

    let garch = fit_model(ticker, &GarchModel, &values)?;
    let egarch = fit_model(ticker, &EgarchModel::symmetric(), &values)?;

    let garch_ljung_box = residual_check(ticker, &garch, cfg);
    let egarch_ljung_box = residual_check(ticker, &egarch, cfg);

    let table = VolatilityTable {
        dates: returns.dates(),
        log_return: values,
        garch: garch.conditional_volatility.clone(),
        egarch: egarch.conditional_volatility.clone(),
    };
    let predictions = write_csv(&mut table.to_frame()?, &paths.garch)?;
    info!("{ticker}: conditional volatility saved to {}", predictions.display());

    if cfg.plot {
        let path = cfg.figures_dir.join(format!("{ticker}_garch_volatility.png"));
        if let Err(e) = plot_fit(&table, ticker, &path) {
            warn!("{ticker}: chart not rendered: {e:#}");
        }
    }

    Ok(FitOutcome {
        ticker: ticker.to_owned(),
        returns: summary,
        garch,
        egarch,
        garch_ljung_box,
        egarch_ljung_box,
        predictions,
    })
}

pub fn run_fit(cfg: &AppConfig) -> Result<Vec<FitOutcome>> {
    if cfg.tickers.is_empty() {
        bail!("no instruments configured");
    }

    let mut outcomes = Vec::with_capacity(cfg.tickers.len());
    let mut failures = Vec::new();

    for ticker in &cfg.tickers {
        match fit_instrument(ticker, &cfg.instrument_paths(ticker), cfg) {
            Ok(outcome) => {
                let fits = [
                    (outcome.garch.clone(), outcome.garch_ljung_box.clone()),
                    (outcome.egarch.clone(), outcome.egarch_ljung_box.clone()),
                ];
                println!("{}", format_fit(ticker, &outcome.returns, &fits));
                outcomes.push(outcome);
            }
            Err(e) => {
                warn!("{ticker}: fit failed: {e:#}");
                failures.push(InstrumentFailure {
                    ticker: ticker.clone(),
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    print_failures(&failures);
    if outcomes.is_empty() {
        bail!("all {} instrument(s) failed", failures.len());
    }
    Ok(outcomes)
}

fn fit_model(
    ticker: &str,
    model: &dyn VolatilityModel,
    returns: &[f64],
) -> Result<FittedVolatility> {
    let fitted = model
        .fit(returns)
        .with_context(|| format!("{ticker}: {} fit", model.name()))?;
    info!(
        "{ticker}: {} LL={:.3} AIC={:.3} BIC={:.3} ({} iterations)",
        fitted.model, fitted.log_likelihood, fitted.aic, fitted.bic, fitted.iterations
    );
    Ok(fitted)
}

/// Ljung-Box on squared standardized residuals; warns on remaining ARCH effects.
fn residual_check(ticker: &str, fitted: &FittedVolatility, cfg: &AppConfig) -> Option<LjungBox> {
    let squared: Vec<f64> = fitted.standardized_residuals.iter().map(|z| z * z).collect();
    match ljung_box(&squared, cfg.ljung_box_lags) {
        Ok(lb) => {
            let p = lb.mean_p_value();
            if p < cfg.significance {
                warn!(
                    "{ticker}: {} residuals show remaining ARCH effects \
                     (mean Ljung-Box p = {p:.4})",
                    fitted.model
                );
            }
            Some(lb)
        }
        Err(e) => {
            warn!("{ticker}: Ljung-Box skipped for {}: {e}", fitted.model);
            None
        }
    }
}

/// main.rs — volcmp entry point
///
/// Compares GARCH and LSTM volatility forecasts against realized volatility.
///
/// Usage:
///   cargo run --bin volcmp -- evaluate --tickers GSPC,BTC-USD --plot
///   cargo run --bin volcmp -- compare --ticker GSPC --realized r.csv --garch g.csv --lstm l.csv
///   cargo run --bin volcmp -- fit --tickers GSPC --lags 10
///
/// Defaults come from .env / environment (see `AppConfig::from_env`);
/// flags given here override them.
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vol_eval::config::AppConfig;
use vol_eval::pipeline::{run_comparison, run_evaluation, run_fit};

#[derive(Parser)]
#[command(name = "volcmp")]
#[command(about = "GARCH vs LSTM volatility forecast comparison")]
#[command(version)]
pub struct Cli {
    /// Root of processed/, predictions/ and sample/
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output directory for the summary CSV and JSON report
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    /// Output directory for PNG charts
    #[arg(long, global = true)]
    pub figures_dir: Option<PathBuf>,

    /// Significance level for the DM verdict and Ljung-Box warnings
    #[arg(long, global = true)]
    pub significance: Option<f64>,

    /// Render PNG charts
    #[arg(long, global = true)]
    pub plot: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate every configured instrument from the canonical layout
    Evaluate {
        /// Comma-separated tickers (e.g. GSPC,BTC-USD)
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,
    },

    /// Evaluate one instrument from explicit files
    Compare {
        #[arg(short, long)]
        ticker: String,

        /// CSV with date, rv20
        #[arg(long)]
        realized: PathBuf,

        /// CSV with date, volatility_garch (or volatility)
        #[arg(long)]
        garch: PathBuf,

        /// CSV with date, volatility_lstm (or volatility)
        #[arg(long)]
        lstm: PathBuf,
    },

    /// Fit GARCH(1,1) and EGARCH(1,1) on log returns
    Fit {
        /// Comma-separated tickers
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,

        /// Ljung-Box lags for the residual check
        #[arg(long)]
        lags: Option<usize>,
    },
}

impl Cli {
    /// Environment config with flags applied on top.
    fn config(&self) -> Result<AppConfig> {
        let mut cfg = AppConfig::from_env()?;
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(dir) = &self.results_dir {
            cfg.results_dir = dir.clone();
        }
        if let Some(dir) = &self.figures_dir {
            cfg.figures_dir = dir.clone();
        }
        if let Some(alpha) = self.significance {
            if !(alpha > 0.0 && alpha < 1.0) {
                bail!("--significance must be in (0, 1), got {alpha}");
            }
            cfg.significance = alpha;
        }
        cfg.plot |= self.plot;

        match &self.command {
            Commands::Evaluate { tickers } | Commands::Fit { tickers, .. }
                if !tickers.is_empty() =>
            {
                cfg.tickers = tickers.clone();
            }
            _ => {}
        }
        if let Commands::Fit { lags: Some(lags), .. } = &self.command {
            cfg.ljung_box_lags = *lags;
        }
        Ok(cfg)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = cli.config()?;
    info!(
        "Config: data={} results={} figures={} α={} plot={}",
        cfg.data_dir.display(),
        cfg.results_dir.display(),
        cfg.figures_dir.display(),
        cfg.significance,
        cfg.plot
    );

    match &cli.command {
        Commands::Evaluate { .. } => {
            let report = run_evaluation(&cfg)?;
            info!(
                "Evaluation complete: {} succeeded, {} failed",
                report.evaluations.len(),
                report.failures.len()
            );
        }
        Commands::Compare { ticker, realized, garch, lstm } => {
            run_comparison(ticker, realized, garch, lstm, &cfg)?;
        }
        Commands::Fit { .. } => {
            let outcomes = run_fit(&cfg)?;
            info!("Fit complete for {} instrument(s)", outcomes.len());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

/// config.rs — Centralised configuration loaded from .env
///
/// Every command reads its defaults from here; CLI flags override them.
/// Loading happens once at startup and the result is passed down by
/// reference, never stored globally.
use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_TICKERS: &str = "GSPC,BTC-USD";
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;
pub const DEFAULT_LJUNG_BOX_LAGS: usize = 10;
pub const SUMMARY_FILE: &str = "evaluation_summary.csv";
pub const REPORT_FILE: &str = "evaluation_report.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── Directories ──────────────────────────────────────────────────
    /// Root of processed/, predictions/ and sample/
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    pub figures_dir: PathBuf,

    // ── Instruments ──────────────────────────────────────────────────
    pub tickers: Vec<String>,

    // ── Statistics ───────────────────────────────────────────────────
    /// Significance level for the DM verdict and Ljung-Box flagging
    pub significance: f64,
    pub ljung_box_lags: usize,

    // ── Output ───────────────────────────────────────────────────────
    pub plot: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            figures_dir: PathBuf::from("figures"),
            tickers: parse_tickers(DEFAULT_TICKERS),
            significance: DEFAULT_SIGNIFICANCE,
            ljung_box_lags: DEFAULT_LJUNG_BOX_LAGS,
            plot: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // ignore missing .env

        let defaults = Self::default();
        let significance = parse_env("VOLCMP_SIGNIFICANCE", defaults.significance)?;
        if !(significance > 0.0 && significance < 1.0) {
            anyhow::bail!("Config key VOLCMP_SIGNIFICANCE: must be in (0, 1), got {significance}");
        }

        Ok(Self {
            data_dir: env_path("VOLCMP_DATA_DIR", defaults.data_dir),
            results_dir: env_path("VOLCMP_RESULTS_DIR", defaults.results_dir),
            figures_dir: env_path("VOLCMP_FIGURES_DIR", defaults.figures_dir),
            tickers: env::var("VOLCMP_TICKERS")
                .map(|v| parse_tickers(&v))
                .unwrap_or(defaults.tickers),
            significance,
            ljung_box_lags: parse_env("VOLCMP_LJUNG_BOX_LAGS", defaults.ljung_box_lags)?,
            plot: parse_env("VOLCMP_PLOT", defaults.plot)?,
        })
    }

    pub fn instrument_paths(&self, ticker: &str) -> InstrumentPaths {
        InstrumentPaths::for_ticker(&self.data_dir, ticker)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.results_dir.join(SUMMARY_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.results_dir.join(REPORT_FILE)
    }
}

/// Input/output files of one instrument under the data directory.
///
///   processed/<T>.csv              realized volatility (rv20)
///   predictions/garch_<T>.csv      GARCH predictions (written by `fit`)
///   predictions/lstm_<T>.csv       LSTM predictions
///   sample/<T>_sample.csv          log returns (input of `fit`)
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentPaths {
    pub realized: PathBuf,
    pub garch: PathBuf,
    pub lstm: PathBuf,
    pub returns: PathBuf,
}

impl InstrumentPaths {
    pub fn for_ticker(data_dir: &Path, ticker: &str) -> Self {
        let predictions = data_dir.join("predictions");
        Self {
            realized: data_dir.join("processed").join(format!("{ticker}.csv")),
            garch: predictions.join(format!("garch_{ticker}.csv")),
            lstm: predictions.join(format!("lstm_{ticker}.csv")),
            returns: data_dir.join("sample").join(format!("{ticker}_sample.csv")),
        }
    }
}

pub fn parse_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Config key {key}: {e}")),
        Err(_) => Ok(default),
    }
}

/// evaluation.rs — Per-instrument GARCH vs LSTM comparison
///
/// For one instrument with aligned (realized, garch, lstm) columns:
///
///   e_garch = realized − garch          e_lstm = realized − lstm
///   metrics(realized, garch)            metrics(realized, lstm)
///   ℓ(e_garch)                          ℓ(e_lstm)
///   DM(e_garch, e_lstm)
///
/// DM > 0 ⇒ GARCH has the larger squared error ⇒ LSTM forecasts better.
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::diebold_mariano::{diebold_mariano, DmResult};
use crate::error::StatsError;
use crate::metrics::{compute_metrics, forecast_errors, log_likelihood, ErrorMetrics};
use crate::series::AlignedSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelScore {
    pub metrics: ErrorMetrics,
    /// Unit-variance Gaussian log-likelihood of the forecast errors
    pub log_likelihood: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    GarchBetter,
    LstmBetter,
    NoDifference,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::GarchBetter => write!(f, "GARCH significantly more accurate"),
            Verdict::LstmBetter => write!(f, "LSTM significantly more accurate"),
            Verdict::NoDifference => write!(f, "no significant difference"),
        }
    }
}

/// One summary row: both models scored against realized volatility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub ticker: String,
    pub n_obs: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub garch: ModelScore,
    pub lstm: ModelScore,
    pub dm: DmResult,
}

impl Evaluation {
    pub fn verdict(&self, significance: f64) -> Verdict {
        if !self.dm.is_significant(significance) {
            Verdict::NoDifference
        } else if self.dm.statistic > 0.0 {
            Verdict::LstmBetter
        } else {
            Verdict::GarchBetter
        }
    }
}

pub fn evaluate(ticker: &str, aligned: &AlignedSeries) -> Result<Evaluation, StatsError> {
    let (start, end) = match (aligned.first_date(), aligned.last_date()) {
        (Some(s), Some(e)) => (s, e),
        _ => return Err(StatsError::EmptyInput),
    };

    let e_garch = forecast_errors(&aligned.realized, &aligned.garch)?;
    let e_lstm = forecast_errors(&aligned.realized, &aligned.lstm)?;

    let garch = ModelScore {
        metrics: compute_metrics(&aligned.realized, &aligned.garch)?,
        log_likelihood: log_likelihood(&e_garch)?,
    };
    let lstm = ModelScore {
        metrics: compute_metrics(&aligned.realized, &aligned.lstm)?,
        log_likelihood: log_likelihood(&e_lstm)?,
    };
    let dm = diebold_mariano(&e_garch, &e_lstm)?;

    debug!(
        "{ticker}: n={} RMSE garch={:.6} lstm={:.6} DM={:.4}",
        aligned.len(),
        garch.metrics.rmse,
        lstm.metrics.rmse,
        dm.statistic
    );

    Ok(Evaluation {
        ticker: ticker.to_owned(),
        n_obs: aligned.len(),
        start,
        end,
        garch,
        lstm,
        dm,
    })
}

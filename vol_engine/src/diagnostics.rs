/// diagnostics.rs — Residual and return-series diagnostics
///
/// LJUNG-BOX PORTMANTEAU TEST
///
///   ρ_k  = Σ_{t=k+1}^{n} (x_t − x̄)(x_{t−k} − x̄) / Σ_{t=1}^{n} (x_t − x̄)²
///   Q(h) = n (n + 2) Σ_{k=1}^{h} ρ_k² / (n − k)
///   p(h) = 1 − F_{χ²(h)}(Q(h))
///
///   Applied to squared standardized residuals of a fitted GARCH model, a
///   small p-value means volatility clustering the model failed to absorb.
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::StatsError;
use crate::metrics::{ensure_finite, mean, sample_variance};

/// Ljung-Box statistics for every lag 1..=h.
#[derive(Debug, Clone, PartialEq)]
pub struct LjungBox {
    pub lags: Vec<usize>,
    pub q_stats: Vec<f64>,
    pub p_values: Vec<f64>,
}

impl LjungBox {
    /// Mean of the per-lag p-values, the single figure the fit report prints.
    pub fn mean_p_value(&self) -> f64 {
        mean(&self.p_values).unwrap_or(f64::NAN)
    }

    pub fn max_lag(&self) -> usize {
        self.lags.last().copied().unwrap_or(0)
    }
}

pub fn ljung_box(data: &[f64], max_lag: usize) -> Result<LjungBox, StatsError> {
    let n = data.len();
    if max_lag == 0 {
        return Err(StatsError::Degenerate("Ljung-Box needs at least one lag".into()));
    }
    if n <= max_lag + 1 {
        return Err(StatsError::InsufficientData { required: max_lag + 2, actual: n });
    }
    ensure_finite(data)?;

    let m = mean(data).ok_or(StatsError::EmptyInput)?;
    let centered: Vec<f64> = data.iter().map(|x| x - m).collect();
    let denom: f64 = centered.iter().map(|x| x * x).sum();
    if denom <= 0.0 {
        return Err(StatsError::Degenerate("series is constant, autocorrelation undefined".into()));
    }

    let nf = n as f64;
    let mut lags = Vec::with_capacity(max_lag);
    let mut q_stats = Vec::with_capacity(max_lag);
    let mut p_values = Vec::with_capacity(max_lag);
    let mut acc = 0.0;

    for k in 1..=max_lag {
        let rho = centered[k..]
            .iter()
            .zip(&centered[..n - k])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / denom;
        acc += rho * rho / (nf - k as f64);
        let q = nf * (nf + 2.0) * acc;

        let chi2 = ChiSquared::new(k as f64)
            .map_err(|e| StatsError::Degenerate(format!("chi-squared({k}): {e}")))?;

        lags.push(k);
        q_stats.push(q);
        p_values.push(chi2.sf(q).clamp(0.0, 1.0));
    }

    Ok(LjungBox { lags, q_stats, p_values })
}

/// Count / mean / sample standard deviation of a return series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnSummary {
    pub n_obs: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl ReturnSummary {
    pub fn from_returns(returns: &[f64]) -> Result<Self, StatsError> {
        ensure_finite(returns)?;
        let mean = mean(returns).ok_or(StatsError::EmptyInput)?;
        let var = sample_variance(returns)
            .ok_or(StatsError::InsufficientData { required: 2, actual: returns.len() })?;
        Ok(Self { n_obs: returns.len(), mean, std_dev: var.sqrt() })
    }
}

impl std::fmt::Display for ReturnSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obs: {} | mean: {:.6} | std: {:.6}", self.n_obs, self.mean, self.std_dev)
    }
}

/// metrics.rs — Forecast Accuracy Metrics
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// Let y_i be realized volatility and ŷ_i a model's prediction, i = 1..n,
/// and e_i = y_i − ŷ_i the forecast error.
///
/// MEAN SQUARED ERROR / ROOT MEAN SQUARED ERROR
///   MSE  = (1/n) Σ e_i²
///   RMSE = √MSE
///
/// MEAN ABSOLUTE ERROR
///   MAE  = (1/n) Σ |e_i|
///
///   RMSE ≥ MAE ≥ 0 always (Jensen on the square function).
///
/// MEAN ABSOLUTE PERCENTAGE ERROR
///   MAPE = (100/m) Σ_{i: y_i ≠ 0} |e_i / y_i|
///
///   Points with y_i = 0 have no percentage error; they are skipped and
///   counted (m = n − skipped).  If every point is skipped MAPE is
///   undefined and the computation fails as degenerate.
///
/// GAUSSIAN LOG-LIKELIHOOD OF RESIDUALS
///   ℓ = −½ Σ [ ln(2π) + e_i² ]
///
///   Zero-mean, UNIT-variance Gaussian.  There is no fitted variance term,
///   so ℓ only ranks two error series against each other; it is not the
///   likelihood of either model.
/// ─────────────────────────────────────────────────────────────────────────
use serde::Serialize;
use std::f64::consts::PI;
use tracing::warn;

use crate::error::StatsError;

/// Accuracy of one predicted series against the realized series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorMetrics {
    pub rmse: f64,
    pub mae: f64,
    /// Percent (6.1 = 6.1%)
    pub mape: f64,
    pub mse: f64,
    pub n_obs: usize,
    /// Points excluded from MAPE because the realized value was zero
    pub mape_skipped: usize,
}

impl std::fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MSE: {:.6} | RMSE: {:.6} | MAE: {:.6} | MAPE: {:.2}%",
            self.mse, self.rmse, self.mae, self.mape
        )
    }
}

/// Compute RMSE, MAE, MAPE and MSE of `y_pred` against `y_true`.
///
/// # Errors
/// * `EmptyInput`      — no points
/// * `LengthMismatch`  — inputs are not index-aligned
/// * `NonFinite`       — NaN / ±∞ in either input
/// * `Degenerate`      — every realized value is zero (MAPE undefined), or
///                     the squared errors overflow
pub fn compute_metrics(y_true: &[f64], y_pred: &[f64]) -> Result<ErrorMetrics, StatsError> {
    let errors = forecast_errors(y_true, y_pred)?;
    let n = errors.len() as f64;

    let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    if !mse.is_finite() || !mae.is_finite() {
        return Err(StatsError::Degenerate(format!(
            "forecast errors overflow (MSE = {mse}, MAE = {mae})"
        )));
    }

    let mut pct_sum = 0.0;
    let mut used = 0usize;
    for (e, y) in errors.iter().zip(y_true) {
        if *y == 0.0 {
            continue;
        }
        pct_sum += (e / y).abs();
        used += 1;
    }
    let mape_skipped = errors.len() - used;
    if used == 0 {
        return Err(StatsError::Degenerate(
            "every realized value is zero, MAPE is undefined".into(),
        ));
    }
    if mape_skipped > 0 {
        warn!("MAPE: skipped {mape_skipped} point(s) with zero realized volatility");
    }

    Ok(ErrorMetrics {
        rmse: mse.sqrt(),
        mae,
        mape: pct_sum / used as f64 * 100.0,
        mse,
        n_obs: errors.len(),
        mape_skipped,
    })
}

/// Forecast errors e_i = y_true_i − y_pred_i.
///
/// Validates the same preconditions as [`compute_metrics`] except the MAPE
/// denominator rule.
pub fn forecast_errors(y_true: &[f64], y_pred: &[f64]) -> Result<Vec<f64>, StatsError> {
    if y_true.len() != y_pred.len() {
        return Err(StatsError::LengthMismatch {
            truth: y_true.len(),
            prediction: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    ensure_finite(y_true)?;
    ensure_finite(y_pred)?;

    Ok(y_true.iter().zip(y_pred).map(|(y, p)| y - p).collect())
}

/// ℓ = −½ Σ [ln(2π) + e_i²]  (unit-variance Gaussian, see module docs).
pub fn log_likelihood(residuals: &[f64]) -> Result<f64, StatsError> {
    if residuals.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    ensure_finite(residuals)?;

    let ln_2pi = (2.0 * PI).ln();
    let ll = -0.5 * residuals.iter().map(|e| ln_2pi + e * e).sum::<f64>();
    if !ll.is_finite() {
        return Err(StatsError::Degenerate("log-likelihood overflows".into()));
    }
    Ok(ll)
}

pub(crate) fn ensure_finite(data: &[f64]) -> Result<(), StatsError> {
    match data.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(StatsError::NonFinite { index }),
        None => Ok(()),
    }
}

// ── Statistical helpers ───────────────────────────────────────────────────

pub(crate) fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample variance (N − 1 denominator).
pub(crate) fn sample_variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    Some(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random sequence in (lo, hi).
    fn wobble(n: usize, seed: f64, lo: f64, hi: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let u = ((i as f64 + seed) * 12.9898).sin() * 43_758.545_3;
                lo + (u - u.floor()) * (hi - lo)
            })
            .collect()
    }

    #[test]
    fn perfect_forecast_has_zero_error() {
        let y = vec![0.12, 0.15, 0.2, 0.18];
        let m = compute_metrics(&y, &y).unwrap();
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.mape, 0.0);
        assert_eq!(m.mse, 0.0);
    }

    #[test]
    fn rmse_dominates_mae() {
        for seed in 0..20 {
            let y = wobble(50, seed as f64, 0.05, 0.8);
            let p = wobble(50, seed as f64 + 100.0, 0.05, 0.8);
            let m = compute_metrics(&y, &p).unwrap();
            assert!(m.mae >= 0.0);
            assert!(m.rmse + 1e-15 >= m.mae, "seed {seed}: rmse={} mae={}", m.rmse, m.mae);
        }
    }

    #[test]
    fn reference_scenario() {
        let y = [1.0, 2.0, 3.0];
        let garch = compute_metrics(&y, &[1.1, 2.1, 2.9]).unwrap();
        assert!((garch.rmse - 0.1).abs() < 1e-9);
        assert!((garch.mae - 0.1).abs() < 1e-9);
        assert!((garch.mape - (0.1 + 0.05 + 0.1 / 3.0) / 3.0 * 100.0).abs() < 1e-9);

        let lstm = compute_metrics(&y, &[0.9, 2.2, 3.2]).unwrap();
        assert!((lstm.rmse - 0.03_f64.sqrt()).abs() < 1e-9);
        assert!((lstm.mae - 0.5 / 3.0).abs() < 1e-9);
        assert!((lstm.mape - (0.1 + 0.1 + 0.2 / 3.0) / 3.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn length_mismatch_fails_fast() {
        assert_eq!(
            compute_metrics(&[1.0, 2.0], &[1.0]),
            Err(StatsError::LengthMismatch { truth: 2, prediction: 1 })
        );
    }

    #[test]
    fn empty_and_non_finite_rejected() {
        assert_eq!(compute_metrics(&[], &[]), Err(StatsError::EmptyInput));
        assert_eq!(
            compute_metrics(&[1.0, 2.0], &[1.0, f64::NAN]),
            Err(StatsError::NonFinite { index: 1 })
        );
    }

    #[test]
    fn mape_skips_zero_denominators() {
        let m = compute_metrics(&[0.0, 2.0, 4.0], &[0.5, 1.0, 5.0]).unwrap();
        assert_eq!(m.mape_skipped, 1);
        // (|1/2| + |−1/4|) / 2 × 100
        assert!((m.mape - 37.5).abs() < 1e-9);
        // RMSE/MAE still use all three points
        assert_eq!(m.n_obs, 3);
        assert!((m.mae - (0.5 + 1.0 + 1.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn mape_all_zero_is_degenerate() {
        assert!(matches!(
            compute_metrics(&[0.0, 0.0], &[0.1, 0.2]),
            Err(StatsError::Degenerate(_))
        ));
    }

    #[test]
    fn overflowing_squares_are_degenerate() {
        let y = [1e200, 2.0];
        let p = [-1e200, 2.0];
        assert!(matches!(compute_metrics(&y, &p), Err(StatsError::Degenerate(_))));
        assert!(matches!(log_likelihood(&[2e200, 0.0]), Err(StatsError::Degenerate(_))));
    }

    #[test]
    fn log_likelihood_of_zero_residuals() {
        let ll = log_likelihood(&[0.0; 4]).unwrap();
        assert!((ll + 2.0 * (2.0 * PI).ln()).abs() < 1e-12);
    }

    #[test]
    fn log_likelihood_penalises_larger_errors() {
        let small = log_likelihood(&[0.1, -0.1, 0.05]).unwrap();
        let large = log_likelihood(&[0.5, -0.4, 0.3]).unwrap();
        assert!(small > large);
    }
}

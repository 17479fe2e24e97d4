// diebold_mariano.rs — Equal Predictive Accuracy Test
//
// ─────────────────────────────────────────────────────────────────────────
// MATHEMATICAL SPECIFICATION
// ─────────────────────────────────────────────────────────────────────────
//
// Diebold & Mariano (1995), squared-error loss, one-step horizon.
//
//   Loss differential:   d_i = e1_i² − e2_i²
//   Mean differential:   d̄   = (1/n) Σ d_i
//   Variance:            s²  = Σ (d_i − d̄)² / (n − 1)        (ddof = 1)
//
//   DM = d̄ / √(s² / n)
//
//   H₀: E[d] = 0  (equal expected squared error)
//   Under H₀, DM → N(0, 1), two-sided p-value:
//
//       p = 2 · (1 − Φ(|DM|))
//
//   DM > 0  ⇒ forecast 1 has the larger squared error.
//   Swapping the forecasts negates DM and leaves p unchanged.
//
//   s² = 0 (e.g. identical error series) leaves DM undefined; the test
//   reports a degenerate input instead of returning NaN / ±∞.
// ─────────────────────────────────────────────────────────────────────────
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::StatsError;
use crate::metrics::{ensure_finite, mean, sample_variance};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DmResult {
    pub statistic: f64,
    /// Two-sided, in [0, 1]
    pub p_value: f64,
    pub mean_differential: f64,
    pub n: usize,
}

impl DmResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

impl std::fmt::Display for DmResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DM test | Stat: {:.4} | p-value: {:.4}", self.statistic, self.p_value)
    }
}

/// Diebold-Mariano test on two aligned forecast-error series.
///
/// # Errors
/// * `LengthMismatch` / `NonFinite` — inputs not aligned or not clean
/// * `InsufficientData`             — fewer than 2 points (sample variance)
/// * `Degenerate`                   — zero variance of the loss differential
pub fn diebold_mariano(e1: &[f64], e2: &[f64]) -> Result<DmResult, StatsError> {
    if e1.len() != e2.len() {
        return Err(StatsError::LengthMismatch { truth: e1.len(), prediction: e2.len() });
    }
    if e1.len() < 2 {
        return Err(StatsError::InsufficientData { required: 2, actual: e1.len() });
    }
    ensure_finite(e1)?;
    ensure_finite(e2)?;

    let d: Vec<f64> = e1.iter().zip(e2).map(|(a, b)| a * a - b * b).collect();
    let n = d.len();

    let d_mean = mean(&d).ok_or(StatsError::EmptyInput)?;
    let d_var = sample_variance(&d)
        .ok_or(StatsError::InsufficientData { required: 2, actual: n })?;

    // rounding noise on a constant differential is not variance
    if d_var <= f64::EPSILON * d_mean.powi(2).max(f64::MIN_POSITIVE) {
        return Err(StatsError::Degenerate(
            "loss differential has zero variance (forecast errors are identical)".into(),
        ));
    }

    let statistic = d_mean / (d_var / n as f64).sqrt();
    if !statistic.is_finite() {
        return Err(StatsError::Degenerate(format!(
            "DM statistic is not finite (mean={d_mean:e}, var={d_var:e})"
        )));
    }

    // N(0,1) parameters are always valid
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| StatsError::Degenerate(format!("standard normal: {e}")))?;
    let p_value = (2.0 * (1.0 - normal.cdf(statistic.abs()))).clamp(0.0, 1.0);

    Ok(DmResult { statistic, p_value, mean_differential: d_mean, n })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scenario_statistic() {
        let y = [1.0, 2.0, 3.0];
        let e_garch: Vec<f64> = y.iter().zip([1.1, 2.1, 2.9]).map(|(a, b)| a - b).collect();
        let e_lstm: Vec<f64> = y.iter().zip([0.9, 2.2, 3.2]).map(|(a, b)| a - b).collect();

        let dm = diebold_mariano(&e_garch, &e_lstm).unwrap();
        // d = [0, −0.03, −0.03], d̄ = −0.02, s² = 0.0003 → DM = −0.02 / 0.01
        assert!((dm.statistic + 2.0).abs() < 1e-6, "DM = {}", dm.statistic);
        assert!(dm.statistic.is_finite());
        assert!((0.0..=1.0).contains(&dm.p_value));
        assert!((dm.p_value - 0.0455).abs() < 1e-3, "p = {}", dm.p_value);
        assert_eq!(dm.n, 3);
    }

    #[test]
    fn antisymmetric_under_swap() {
        let e1 = [0.3, -0.1, 0.25, 0.05, -0.4, 0.12];
        let e2 = [0.1, -0.2, 0.05, 0.15, -0.1, 0.02];
        let ab = diebold_mariano(&e1, &e2).unwrap();
        let ba = diebold_mariano(&e2, &e1).unwrap();
        assert_eq!(ab.statistic, -ba.statistic);
        assert_eq!(ab.p_value, ba.p_value);
    }

    #[test]
    fn identical_errors_are_degenerate() {
        let e = [0.1, -0.2, 0.3];
        assert!(matches!(diebold_mariano(&e, &e), Err(StatsError::Degenerate(_))));
    }

    #[test]
    fn constant_nonzero_differential_is_degenerate() {
        // d_i = 1 for every i: mean ≠ 0 but zero variance
        let e1 = [1.0, -1.0, 1.0];
        let e2 = [0.0, 0.0, 0.0];
        assert!(matches!(diebold_mariano(&e1, &e2), Err(StatsError::Degenerate(_))));
    }

    #[test]
    fn rounding_noise_on_constant_differential_is_degenerate() {
        // e1² − e2² = 0.01 exactly in real arithmetic
        let e1 = [1.0, 2.0, 3.0, 4.0, 5.0];
        let e2: Vec<f64> = e1.iter().map(|e: &f64| (e * e - 0.01).sqrt()).collect();
        assert!(matches!(diebold_mariano(&e1, &e2), Err(StatsError::Degenerate(_))));
    }

    #[test]
    fn zero_mean_differential_gives_unit_p_value() {
        // d = [0.03, −0.03]: mean 0, non-zero variance
        let e1 = [0.2, 0.1];
        let e2 = [0.1, 0.2];
        let dm = diebold_mariano(&e1, &e2).unwrap();
        assert!(dm.statistic.abs() < 1e-12);
        assert!((dm.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn needs_two_points() {
        assert_eq!(
            diebold_mariano(&[0.1], &[0.2]),
            Err(StatsError::InsufficientData { required: 2, actual: 1 })
        );
    }

    #[test]
    fn large_gap_is_significant() {
        let e1: Vec<f64> = (0..200).map(|i| 0.5 + 0.01 * ((i % 5) as f64)).collect();
        let e2: Vec<f64> = (0..200).map(|i| 0.1 + 0.01 * ((i % 3) as f64)).collect();
        let dm = diebold_mariano(&e1, &e2).unwrap();
        assert!(dm.statistic > 0.0);
        assert!(dm.is_significant(0.05));
    }
}

// models/garch.rs — GARCH(1,1) Volatility Model
//
// ─────────────────────────────────────────────────────────────────────────
// MATHEMATICAL SPECIFICATION
// ─────────────────────────────────────────────────────────────────────────
//
// GARCH(1,1): Bollerslev (1986)
//
//   Return innovation:  ε_t = r_t − μ
//   Conditional variance update:
//
//       σ²_t = ω  +  α · ε²_{t-1}  +  β · σ²_{t-1}
//
//   Constraints (covariance stationarity):
//     ω > 0,  α ≥ 0,  β ≥ 0,  α + β < 1
//
//   Long-run (unconditional) variance:
//       σ²_∞ = ω / (1 − α − β)
//
//   Recursion start: σ²_0 = sample variance of r.
//
//   Rescaling r̃ = s·r maps (μ, ω, α, β) → (s·μ, s²·ω, α, β).
// ─────────────────────────────────────────────────────────────────────────
use super::{
    gaussian_nll, minimize, scale_returns, FittedVolatility, ParamEstimate, ScaledReturns,
    VolatilityModel, LARGE_NUMBER, SMALL_POS,
};
use crate::error::FitError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Garch11 {
    /// μ: constant conditional mean
    pub mu: f64,
    /// ω: long-run variance weight
    pub omega: f64,
    /// α: ARCH (shock) coefficient
    pub alpha: f64,
    /// β: GARCH (persistence) coefficient
    pub beta: f64,
}

impl Garch11 {
    pub fn is_valid(&self) -> bool {
        self.omega > 0.0 && self.alpha >= 0.0 && self.beta >= 0.0 && self.persistence() < 1.0
    }

    /// α + β
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// σ²_∞ = ω / (1 − α − β)
    pub fn long_run_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence())
    }

    /// Run the variance recursion over `returns`, starting at `sigma2_0`.
    ///
    /// Returns σ²_t for every t, or `None` if the recursion leaves the
    /// positive reals.
    pub fn conditional_variance(&self, returns: &[f64], sigma2_0: f64) -> Option<Vec<f64>> {
        let mut sigma2 = Vec::with_capacity(returns.len());
        let mut prev = sigma2_0.max(SMALL_POS);
        let mut prev_eps = 0.0;
        for (t, r) in returns.iter().enumerate() {
            let s2 = if t == 0 {
                prev
            } else {
                self.omega + self.alpha * prev_eps * prev_eps + self.beta * prev
            };
            if !(s2 > 0.0 && s2.is_finite()) {
                return None;
            }
            sigma2.push(s2);
            prev = s2;
            prev_eps = r - self.mu;
        }
        Some(sigma2)
    }

    fn from_theta(theta: &[f64]) -> Self {
        Self { mu: theta[0], omega: theta[1], alpha: theta[2], beta: theta[3] }
    }
}

/// GARCH(1,1) fitter, constant mean, Gaussian innovations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GarchModel;

fn negative_log_likelihood(theta: &[f64], data: &ScaledReturns) -> f64 {
    let params = Garch11::from_theta(theta);
    if !params.is_valid() {
        return LARGE_NUMBER;
    }
    let Some(sigma2) = params.conditional_variance(&data.values, data.sample_variance) else {
        return LARGE_NUMBER;
    };
    let residuals: Vec<f64> = data.values.iter().map(|r| r - params.mu).collect();
    let nll = gaussian_nll(&residuals, &sigma2);
    if nll.is_finite() { nll } else { LARGE_NUMBER }
}

impl VolatilityModel for GarchModel {
    fn name(&self) -> &'static str {
        "GARCH(1,1)"
    }

    fn fit(&self, returns: &[f64]) -> Result<FittedVolatility, FitError> {
        let data = scale_returns(returns)?;
        let n = data.values.len() as f64;
        let mu0 = data.values.iter().sum::<f64>() / n;
        let v0 = data.sample_variance;

        let start = [mu0, 0.05 * v0, 0.05, 0.90];
        let steps = [0.1, 0.025 * v0, 0.03, -0.05];
        let (theta, nll, iterations) = minimize(&data, negative_log_likelihood, &start, &steps)?;

        let scaled = Garch11::from_theta(&theta);
        if !scaled.is_valid() {
            return Err(FitError::InvalidParameters(format!(
                "ω={:.6}, α={:.6}, β={:.6}, α+β={:.6}",
                scaled.omega, scaled.alpha, scaled.beta, scaled.persistence()
            )));
        }

        let sigma2 = scaled
            .conditional_variance(&data.values, data.sample_variance)
            .ok_or_else(|| FitError::InvalidParameters("variance recursion diverged".into()))?;
        let standardized: Vec<f64> = data
            .values
            .iter()
            .zip(&sigma2)
            .map(|(r, s2)| (r - scaled.mu) / s2.sqrt())
            .collect();

        let s = data.scale;
        let volatility: Vec<f64> = sigma2.iter().map(|s2| s2.sqrt() / s).collect();
        let fitted = Garch11 {
            mu: scaled.mu / s,
            omega: scaled.omega / (s * s),
            alpha: scaled.alpha,
            beta: scaled.beta,
        };

        let params = vec![
            ParamEstimate { name: "mu".into(), value: fitted.mu },
            ParamEstimate { name: "omega".into(), value: fitted.omega },
            ParamEstimate { name: "alpha[1]".into(), value: fitted.alpha },
            ParamEstimate { name: "beta[1]".into(), value: fitted.beta },
        ];

        // ln f_r(r) = ln s + ln f_r̃(s·r)
        let log_likelihood = -nll + n * s.ln();

        Ok(FittedVolatility::assemble(
            self.name(),
            params,
            log_likelihood,
            iterations,
            volatility,
            standardized,
        ))
    }
}

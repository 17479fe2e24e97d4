/// models/egarch.rs — EGARCH(1,1) Volatility Model
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// EGARCH(1,1): Nelson (1991)
///
///   z_t = (r_t − μ) / σ_t
///
///   ln σ²_t = ω + α · (|z_{t-1}| − √(2/π)) + γ · z_{t-1} + β · ln σ²_{t-1}
///
///   √(2/π) = E|z| for z ~ N(0,1).
///   γ is the leverage (asymmetry) term; it is fixed at 0 unless the model
///   is built with `asymmetric = true`.
///
///   Constraint: |β| < 1  (stationarity of ln σ²).  No sign constraints on
///   ω, α, γ since positivity of σ² holds by construction.
///
///   Rescaling r̃ = s·r shifts the intercept:
///       ω = ω̃ − 2·ln(s)·(1 − β)
/// ─────────────────────────────────────────────────────────────────────────
use std::f64::consts::FRAC_2_PI;

use super::{
    gaussian_nll, minimize, scale_returns, FittedVolatility, ParamEstimate, ScaledReturns,
    VolatilityModel, LARGE_NUMBER, SMALL_POS,
};
use crate::error::FitError;

/// ln σ² beyond this overflows exp()
const MAX_LOG_VARIANCE: f64 = 700.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Egarch11 {
    pub mu: f64,
    pub omega: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub beta: f64,
}

impl Egarch11 {
    pub fn is_valid(&self) -> bool {
        self.beta.abs() < 1.0
    }

    /// Run the log-variance recursion over `returns` from `sigma2_0`.
    pub fn conditional_variance(&self, returns: &[f64], sigma2_0: f64) -> Option<Vec<f64>> {
        let e_abs_z = FRAC_2_PI.sqrt();
        let mut sigma2 = Vec::with_capacity(returns.len());
        let mut log_s2 = sigma2_0.max(SMALL_POS).ln();
        let mut prev_z: f64 = 0.0;

        for (t, r) in returns.iter().enumerate() {
            if t > 0 {
                log_s2 = self.omega
                    + self.alpha * (prev_z.abs() - e_abs_z)
                    + self.gamma * prev_z
                    + self.beta * log_s2;
            }
            if !log_s2.is_finite() || log_s2.abs() > MAX_LOG_VARIANCE {
                return None;
            }
            let s2 = log_s2.exp();
            sigma2.push(s2);
            prev_z = (r - self.mu) / s2.sqrt();
        }
        Some(sigma2)
    }
}

/// EGARCH(1,1) fitter, constant mean, Gaussian innovations.
#[derive(Debug, Clone, Copy, Default)]
pub struct EgarchModel {
    /// Estimate the leverage term γ (o = 1); otherwise γ = 0 (o = 0)
    pub asymmetric: bool,
}

impl EgarchModel {
    pub fn symmetric() -> Self {
        Self { asymmetric: false }
    }

    pub fn asymmetric() -> Self {
        Self { asymmetric: true }
    }

    /// θ layout: [μ, ω, α, β] or [μ, ω, α, γ, β]
    fn unpack(theta: &[f64]) -> Egarch11 {
        match theta.len() {
            5 => Egarch11 {
                mu: theta[0],
                omega: theta[1],
                alpha: theta[2],
                gamma: theta[3],
                beta: theta[4],
            },
            _ => Egarch11 {
                mu: theta[0],
                omega: theta[1],
                alpha: theta[2],
                gamma: 0.0,
                beta: theta[3],
            },
        }
    }
}

fn negative_log_likelihood(theta: &[f64], data: &ScaledReturns) -> f64 {
    let params = EgarchModel::unpack(theta);
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

impl VolatilityModel for EgarchModel {
    fn name(&self) -> &'static str {
        if self.asymmetric { "EGARCH(1,1,1)" } else { "EGARCH(1,1)" }
    }

    fn fit(&self, returns: &[f64]) -> Result<FittedVolatility, FitError> {
        let data = scale_returns(returns)?;
        let n = data.values.len() as f64;
        let mu0 = data.values.iter().sum::<f64>() / n;
        let beta0 = 0.95;
        let omega0 = data.sample_variance.ln() * (1.0 - beta0);

        let (start, steps) = if self.asymmetric {
            (vec![mu0, omega0, 0.10, 0.0, beta0], vec![0.1, 0.05, 0.05, 0.05, -0.03])
        } else {
            (vec![mu0, omega0, 0.10, beta0], vec![0.1, 0.05, 0.05, -0.03])
        };
        let (theta, nll, iterations) = minimize(&data, negative_log_likelihood, &start, &steps)?;

        let scaled = Self::unpack(&theta);
        if !scaled.is_valid() {
            return Err(FitError::InvalidParameters(format!("|β| = {:.6} ≥ 1", scaled.beta.abs())));
        }

        let sigma2 = scaled
            .conditional_variance(&data.values, data.sample_variance)
            .ok_or_else(|| FitError::InvalidParameters("log-variance recursion diverged".into()))?;
        let standardized: Vec<f64> = data
            .values
            .iter()
            .zip(&sigma2)
            .map(|(r, s2)| (r - scaled.mu) / s2.sqrt())
            .collect();

        let s = data.scale;
        let volatility: Vec<f64> = sigma2.iter().map(|s2| s2.sqrt() / s).collect();

        let mut params = vec![
            ParamEstimate { name: "mu".into(), value: scaled.mu / s },
            ParamEstimate {
                name: "omega".into(),
                value: scaled.omega - 2.0 * s.ln() * (1.0 - scaled.beta),
            },
            ParamEstimate { name: "alpha[1]".into(), value: scaled.alpha },
        ];
        if self.asymmetric {
            params.push(ParamEstimate { name: "gamma[1]".into(), value: scaled.gamma });
        }
        params.push(ParamEstimate { name: "beta[1]".into(), value: scaled.beta });

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

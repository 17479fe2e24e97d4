/// models.rs — Conditional volatility models (fitting collaborator)
///
/// The comparison core treats a fitted volatility model as a black box
/// exposing three things:
///   (a) conditional volatility σ_t aligned with the input returns
///   (b) standardized residuals z_t = (r_t − μ) / σ_t
///   (c) a parameter summary
///
/// `VolatilityModel` is that seam.  GARCH(1,1) and EGARCH(1,1) are provided,
/// both fitted by Gaussian quasi-maximum-likelihood with a constant mean:
///
///   NLL(θ) = Σ_t ½ [ ln(2π) + ln σ²_t + ε²_t / σ²_t ],   ε_t = r_t − μ
///
/// Returns are rescaled to unit standard deviation before optimisation
/// (r̃ = r·s, s = 1/std(r)) so the simplex works on O(1) parameters.
/// Everything reported back is in the units of the input.
pub mod egarch;
pub mod garch;

pub use egarch::{Egarch11, EgarchModel};
pub use garch::{Garch11, GarchModel};

use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::neldermead::NelderMead;
use tracing::debug;

use crate::error::FitError;

/// Minimum number of returns for a (1,1) model fit.
pub const MIN_OBSERVATIONS: usize = 10;

pub(crate) const LARGE_NUMBER: f64 = 1e12;
pub(crate) const SMALL_POS: f64 = 1e-12;
const MAX_ITERS: u64 = 5_000;
const SD_TOLERANCE: f64 = 1e-10;

pub trait VolatilityModel {
    /// Display name, e.g. "GARCH(1,1)"
    fn name(&self) -> &'static str;

    fn fit(&self, returns: &[f64]) -> Result<FittedVolatility, FitError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamEstimate {
    pub name: String,
    pub value: f64,
}

/// Output of a successful fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedVolatility {
    pub model: String,
    pub params: Vec<ParamEstimate>,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub n_obs: usize,
    pub iterations: u64,
    /// σ_t, same length and order as the input returns
    pub conditional_volatility: Vec<f64>,
    /// z_t = (r_t − μ) / σ_t
    pub standardized_residuals: Vec<f64>,
}

impl FittedVolatility {
    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.iter().find(|p| p.name == name).map(|p| p.value)
    }

    pub(crate) fn assemble(
        model: &str,
        params: Vec<ParamEstimate>,
        log_likelihood: f64,
        iterations: u64,
        conditional_volatility: Vec<f64>,
        standardized_residuals: Vec<f64>,
    ) -> Self {
        let n = conditional_volatility.len();
        let k = params.len() as f64;
        Self {
            model: model.to_owned(),
            aic: 2.0 * k - 2.0 * log_likelihood,
            bic: k * (n as f64).ln() - 2.0 * log_likelihood,
            params,
            log_likelihood,
            n_obs: n,
            iterations,
            conditional_volatility,
            standardized_residuals,
        }
    }
}

impl std::fmt::Display for FittedVolatility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  {} — Constant Mean, Gaussian QMLE", self.model)?;
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  Observations   : {}", self.n_obs)?;
        writeln!(f, "  Log-Likelihood : {:.3}", self.log_likelihood)?;
        writeln!(f, "  AIC            : {:.3}", self.aic)?;
        writeln!(f, "  BIC            : {:.3}", self.bic)?;
        writeln!(f, "  Iterations     : {}", self.iterations)?;
        writeln!(f, "  ── Parameters ──────────────────────────")?;
        for p in &self.params {
            writeln!(f, "  {:<14} : {:.6e}", p.name, p.value)?;
        }
        write!(f, "════════════════════════════════════════════")
    }
}

// ── QMLE plumbing shared by the models ───────────────────────────────────

/// Unit-variance copy of a return series plus the factor that produced it.
pub(crate) struct ScaledReturns {
    pub values: Vec<f64>,
    /// s such that values = returns · s
    pub scale: f64,
    pub sample_variance: f64,
}

pub(crate) fn scale_returns(returns: &[f64]) -> Result<ScaledReturns, FitError> {
    if returns.len() < MIN_OBSERVATIONS {
        return Err(FitError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: returns.len(),
        });
    }
    if let Some(index) = returns.iter().position(|r| !r.is_finite()) {
        return Err(FitError::NonFinite { index });
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    if var <= SMALL_POS * SMALL_POS {
        return Err(FitError::Degenerate("returns have zero variance".into()));
    }

    let scale = 1.0 / var.sqrt();
    let values: Vec<f64> = returns.iter().map(|r| r * scale).collect();
    let scaled_mean = values.iter().sum::<f64>() / n;
    let sample_variance = values.iter().map(|r| (r - scaled_mean).powi(2)).sum::<f64>() / (n - 1.0);

    Ok(ScaledReturns { values, scale, sample_variance })
}

/// Σ ½ [ln(2π) + ln σ²_t + ε²_t / σ²_t]
pub(crate) fn gaussian_nll(residuals: &[f64], sigma2: &[f64]) -> f64 {
    let c = 0.5 * (2.0 * std::f64::consts::PI).ln();
    residuals
        .iter()
        .zip(sigma2)
        .map(|(e, s2)| c + 0.5 * s2.ln() + 0.5 * e * e / s2)
        .sum()
}

type Objective = fn(&[f64], &ScaledReturns) -> f64;

struct NegLogLikelihood<'a> {
    data: &'a ScaledReturns,
    objective: Objective,
}

impl CostFunction for NegLogLikelihood<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, ArgminError> {
        Ok((self.objective)(theta, self.data))
    }
}

/// Minimise `objective` with Nelder-Mead from `start`.
///
/// The initial simplex is `start` plus one vertex per coordinate displaced
/// by `steps[i]`; every vertex must be feasible.  A second pass restarts
/// from the first optimum to escape early simplex collapse.
///
/// Returns (θ̂, NLL(θ̂), total iterations).
pub(crate) fn minimize(
    data: &ScaledReturns,
    objective: Objective,
    start: &[f64],
    steps: &[f64],
) -> Result<(Vec<f64>, f64, u64), FitError> {
    let mut best = start.to_vec();
    let mut best_cost = f64::INFINITY;
    let mut iterations = 0u64;

    for pass in 0..2 {
        let mut simplex = vec![best.clone()];
        for (i, step) in steps.iter().enumerate() {
            let mut vertex = best.clone();
            vertex[i] += step;
            simplex.push(vertex);
        }

        let solver = NelderMead::new(simplex)
            .with_sd_tolerance(SD_TOLERANCE)
            .map_err(|e| FitError::Optimizer(e.to_string()))?;

        let result = Executor::new(NegLogLikelihood { data, objective }, solver)
            .configure(|state| state.max_iters(MAX_ITERS))
            .run()
            .map_err(|e| FitError::Optimizer(e.to_string()))?;

        let state = result.state();
        let theta = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| FitError::Optimizer("optimizer did not produce parameters".into()))?;
        let cost = state.get_best_cost();
        iterations += state.get_iter();
        debug!("Nelder-Mead pass {pass}: NLL={cost:.6} after {} iterations", state.get_iter());

        if cost < best_cost {
            best = theta;
            best_cost = cost;
        }
    }

    if !best_cost.is_finite() || best_cost >= LARGE_NUMBER {
        return Err(FitError::Optimizer("no feasible parameter set found".into()));
    }
    Ok((best, best_cost, iterations))
}

/// lib.rs — Volatility forecast evaluation engine
///
/// Pure computation, no file I/O:
///   series          dated observations, three-way date alignment
///   metrics         RMSE / MAE / MAPE / MSE, Gaussian residual log-likelihood
///   diebold_mariano equal predictive accuracy test
///   diagnostics     Ljung-Box, return summary statistics
///   models          GARCH(1,1) / EGARCH(1,1) QMLE behind `VolatilityModel`
///   evaluation      per-instrument GARCH vs LSTM comparison
pub mod diagnostics;
pub mod diebold_mariano;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod models;
pub mod series;

pub use diebold_mariano::{diebold_mariano, DmResult};
pub use error::{AlignError, FitError, StatsError};
pub use evaluation::{evaluate, Evaluation, ModelScore, Verdict};
pub use metrics::{compute_metrics, forecast_errors, log_likelihood, ErrorMetrics};
pub use series::{align, AlignedSeries, Observation, TimeSeries};

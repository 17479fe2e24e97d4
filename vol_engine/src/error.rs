/// error.rs — Typed failures of the statistical core
///
/// Three families, matching the three stages a run goes through:
///   - AlignError: joining the realized / model series on their date key
///   - StatsError: metrics, Diebold-Mariano, log-likelihood, Ljung-Box
///   - FitError:   GARCH / EGARCH quasi-maximum-likelihood estimation
///
/// None of these are recoverable inside the core; the application decides
/// whether a failure aborts the batch or only the current instrument.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("empty input series")]
    EmptyInput,

    #[error("length mismatch: ground truth has {truth} points, prediction has {prediction}")]
    LengthMismatch { truth: usize, prediction: usize },

    #[error("non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("degenerate input: {0}")]
    Degenerate(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignError {
    #[error("source '{name}' has no observations")]
    EmptySource { name: String },

    #[error("no overlapping dates between realized, GARCH and LSTM series")]
    NoOverlap,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("insufficient data: need at least {required} returns, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("return series contains a non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("degenerate return series: {0}")]
    Degenerate(String),

    #[error("optimizer failed: {0}")]
    Optimizer(String),

    #[error("estimated parameters violate model constraints: {0}")]
    InvalidParameters(String),
}

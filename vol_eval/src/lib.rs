/// lib.rs — Volatility forecast comparison application
///
/// File-facing half of the workspace: configuration, CSV ingestion with the
/// column schema adapter, reporting, charts, and the three pipelines the
/// `volcmp` binary exposes (`evaluate`, `compare`, `fit`).
pub mod config;
pub mod data;
pub mod pipeline;
pub mod plotting;
pub mod reporting;
pub mod schema;

pub use config::{AppConfig, InstrumentPaths};
pub use pipeline::{evaluate_instrument, run_comparison, run_evaluation, run_fit, FitOutcome};
pub use reporting::{BatchReport, InstrumentFailure};

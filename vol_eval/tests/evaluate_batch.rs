use std::fs;
use std::path::Path;

use vol_eval::config::AppConfig;
use vol_eval::pipeline::run_evaluation;
use vol_eval::reporting::SUMMARY_COLUMNS;
use vol_engine::Verdict;

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn config(root: &Path, tickers: &[&str]) -> AppConfig {
    AppConfig {
        data_dir: root.join("data"),
        results_dir: root.join("results"),
        figures_dir: root.join("figures"),
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        ..AppConfig::default()
    }
}

/// GSPC: three overlapping days (plus a duplicate and a day missing from LSTM).
/// BTC-USD: predictions cover a different year than the realized series.
fn seed_layout(cfg: &AppConfig) {
    let gspc = cfg.instrument_paths("GSPC");
    write(
        &gspc.realized,
        "date,close,rv20\n\
         2024-01-01,100,1.0\n\
         2024-01-02,101,2.0\n\
         2024-01-02,101,9.0\n\
         2024-01-03,102,3.0\n\
         2024-01-04,103,4.0\n",
    );
    write(
        &gspc.garch,
        "date,volatility\n2024-01-01,1.1\n2024-01-02,2.1\n2024-01-03,2.9\n2024-01-04,4.1\n",
    );
    write(
        &gspc.lstm,
        "date,volatility_lstm\n2024-01-03,3.2\n2024-01-01,0.9\n2024-01-02,2.2\n",
    );

    let btc = cfg.instrument_paths("BTC-USD");
    write(&btc.realized, "date,rv20\n2023-01-01,0.5\n2023-01-02,0.6\n");
    write(&btc.garch, "date,volatility_garch\n2024-01-01,0.5\n2024-01-02,0.6\n");
    write(&btc.lstm, "date,volatility_lstm\n2024-01-01,0.5\n2024-01-02,0.6\n");
}

#[test]
fn batch_reports_successes_and_failures() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), &["GSPC", "BTC-USD"]);
    seed_layout(&cfg);

    let report = run_evaluation(&cfg).unwrap();

    assert_eq!(report.evaluations.len(), 1);
    let gspc = &report.evaluations[0];
    assert_eq!(gspc.ticker, "GSPC");
    assert_eq!(gspc.n_obs, 3);
    assert!((gspc.garch.metrics.rmse - 0.1).abs() < 1e-9);
    assert!((gspc.lstm.metrics.rmse - 0.03_f64.sqrt()).abs() < 1e-9);
    assert!((gspc.dm.statistic + 2.0).abs() < 1e-9);
    assert!((0.0..=1.0).contains(&gspc.dm.p_value));
    // p = 2(1 − Φ(2)) ≈ 0.0455
    assert_eq!(report.verdicts, vec![Verdict::GarchBetter]);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].ticker, "BTC-USD");
    assert!(report.failures[0].reason.contains("overlap"));

    let summary = fs::read_to_string(cfg.summary_path()).unwrap();
    let mut lines = summary.lines();
    assert_eq!(lines.next().unwrap(), SUMMARY_COLUMNS.join(","));
    assert!(lines.next().unwrap().starts_with("GSPC,"));
    assert!(lines.next().is_none());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(cfg.report_path()).unwrap()).unwrap();
    assert_eq!(json["failures"][0]["ticker"], "BTC-USD");
}

#[test]
fn batch_fails_when_no_instrument_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), &["BTC-USD", "MISSING"]);
    seed_layout(&cfg);
    write(&cfg.summary_path(), "Ticker,RMSE_GARCH\nOLD,1.0\n");

    let err = run_evaluation(&cfg).unwrap_err();
    assert!(err.to_string().contains("all 2 instrument(s) failed"));
    assert!(!cfg.summary_path().exists());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(cfg.report_path()).unwrap()).unwrap();
    assert_eq!(json["evaluations"].as_array().unwrap().len(), 0);
    let failed: Vec<&str> = json["failures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["ticker"].as_str().unwrap())
        .collect();
    assert_eq!(failed, vec!["BTC-USD", "MISSING"]);
}

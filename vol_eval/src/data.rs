/// data.rs — CSV ingestion and persistence
///
/// Reads dated numeric columns into `TimeSeries` through the column schema
/// adapter, and writes fitted volatility tables.  Policies at the boundary:
///   - missing file / missing column   → error naming the path
///   - unparseable date                → error naming the row
///   - null value in the value column  → row dropped, count logged
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use vol_engine::{align, AlignedSeries, TimeSeries};

use crate::config::InstrumentPaths;
use crate::schema::{self, ColumnSpec, DATE_COLUMN};

pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        bail!("input file not found: {}", path.display());
    }
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read CSV {}", path.display()))
}

/// Load one dated series from `path`, picking the value column via `spec`.
pub fn load_series(path: &Path, spec: &ColumnSpec, name: &str) -> Result<TimeSeries> {
    let df = read_csv(path)?;
    series_from_frame(&df, spec, name).with_context(|| format!("in {}", path.display()))
}

pub fn series_from_frame(df: &DataFrame, spec: &ColumnSpec, name: &str) -> Result<TimeSeries> {
    let value_col = spec.resolve(df).ok_or_else(|| {
        anyhow!("missing column '{}' (accepted: {})", spec.canonical, spec.aliases.join(", "))
    })?;
    if value_col != spec.canonical {
        debug!("{name}: reading '{}' from source column '{value_col}'", spec.canonical);
    }

    let dates = date_column(df)?;
    let values = df
        .column(value_col)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let values = values.f64()?;

    let mut series = TimeSeries::new(name);
    let mut dropped = 0usize;
    for (date, value) in dates.into_iter().zip(values.iter()) {
        match value {
            Some(v) if v.is_finite() => series.push(date, v),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!("{name}: dropped {dropped} row(s) with missing '{value_col}'");
    }
    Ok(series)
}

fn date_column(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let raw = df
        .column(DATE_COLUMN)
        .map_err(|_| anyhow!("missing column '{DATE_COLUMN}'"))?
        .as_materialized_series()
        .cast(&DataType::String)?;

    raw.str()?
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let cell = cell.ok_or_else(|| anyhow!("row {row}: empty date"))?;
            parse_date(cell).ok_or_else(|| anyhow!("row {row}: unparseable date '{cell}'"))
        })
        .collect()
}

/// Calendar date of a `YYYY-MM-DD[ HH:MM:SS | THH:MM:SS][offset]` cell.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Load realized, GARCH and LSTM series and inner-join them on date.
pub fn load_aligned(paths: &InstrumentPaths) -> Result<AlignedSeries> {
    let realized = load_series(&paths.realized, &schema::REALIZED, "realized")?;
    let garch = load_series(&paths.garch, &schema::GARCH, "garch")?;
    let lstm = load_series(&paths.lstm, &schema::LSTM, "lstm")?;

    let aligned = align(&realized, &garch, &lstm)?;
    debug!(
        "aligned {} of {}/{}/{} rows",
        aligned.len(),
        realized.len(),
        garch.len(),
        lstm.len()
    );
    Ok(aligned)
}

/// Dated log returns sorted ascending, one row per date (first occurrence
/// wins), rows with missing returns dropped.
pub fn load_returns(path: &Path) -> Result<TimeSeries> {
    let series = load_series(path, &schema::LOG_RETURN, "log_return")?;
    let (returns, duplicates) = series.sorted_unique();
    if duplicates > 0 {
        warn!("log_return: {duplicates} duplicate date(s) ignored, first occurrence kept");
    }
    Ok(returns)
}

/// Fitted conditional volatility aligned with the return dates.
#[derive(Debug, Clone)]
pub struct VolatilityTable {
    pub dates: Vec<NaiveDate>,
    pub log_return: Vec<f64>,
    pub garch: Vec<f64>,
    pub egarch: Vec<f64>,
}

impl VolatilityTable {
    pub fn to_frame(&self) -> Result<DataFrame> {
        let n = self.dates.len();
        if self.log_return.len() != n || self.garch.len() != n || self.egarch.len() != n {
            bail!("volatility table columns have different lengths");
        }
        let dates: Vec<String> =
            self.dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
        Ok(df!(
            DATE_COLUMN => dates,
            schema::LOG_RETURN.canonical => self.log_return.clone(),
            schema::GARCH.canonical => self.garch.clone(),
            schema::EGARCH.canonical => self.egarch.clone(),
        )?)
    }
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    let mut file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_common_date_shapes() {
        let d = NaiveDate::from_ymd_opt(2021, 6, 30).unwrap();
        assert_eq!(parse_date("2021-06-30"), Some(d));
        assert_eq!(parse_date("2021-06-30 00:00:00"), Some(d));
        assert_eq!(parse_date("2021-06-30T00:00:00"), Some(d));
        assert_eq!(parse_date("2021-06-30 00:00:00+00:00"), Some(d));
        assert_eq!(parse_date("2021-06-30T00:00:00Z"), Some(d));
        assert_eq!(parse_date("30/06/2021"), None);
    }

    #[test]
    fn garch_file_with_generic_column_name() {
        let dir = tempdir().unwrap();
        let body = "date,volatility\n2024-01-02,0.11\n2024-01-03,0.12\n";
        let path = write(dir.path(), "g.csv", body);
        let s = load_series(&path, &schema::GARCH, "garch").unwrap();
        assert_eq!(s.values(), vec![0.11, 0.12]);
    }

    #[test]
    fn missing_value_rows_are_dropped() {
        let dir = tempdir().unwrap();
        let body = "date,rv20\n2024-01-02,\n2024-01-03,0.2\n2024-01-04,0.3\n";
        let path = write(dir.path(), "r.csv", body);
        let s = load_series(&path, &schema::REALIZED, "realized").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.dates()[0], NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn missing_column_and_file_are_errors() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "l.csv", "date,prediction\n2024-01-02,0.1\n");
        let err = load_series(&path, &schema::LSTM, "lstm").unwrap_err();
        assert!(format!("{err:#}").contains("volatility_lstm"));

        let err = load_series(&dir.path().join("nope.csv"), &schema::LSTM, "lstm").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn returns_are_sorted_by_date() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "s.csv",
            "date,close,log_return\n2024-01-03,101,0.01\n2024-01-01,100,\n2024-01-02,100,0.0\n",
        );
        let r = load_returns(&path).unwrap();
        assert_eq!(r.values(), vec![0.0, 0.01]);
    }

    #[test]
    fn duplicate_return_dates_keep_first_row() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "s.csv",
            "date,log_return\n2024-01-02,0.02\n2024-01-01,0.01\n2024-01-02,0.99\n",
        );
        let r = load_returns(&path).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.values(), vec![0.01, 0.02]);
    }

    #[test]
    fn unparseable_date_is_fatal_and_names_the_row() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "r.csv", "date,rv20\n2021-06-29,0.1\n30/06/2021,0.2\n");
        let err = load_series(&path, &schema::REALIZED, "realized").unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("row 1"), "{msg}");
        assert!(msg.contains("30/06/2021"), "{msg}");
    }

    #[test]
    fn non_finite_value_rows_are_dropped() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "l.csv",
            "date,volatility_lstm\n\
             2024-01-02,0.1\n2024-01-03,inf\n2024-01-04,NaN\n2024-01-05,0.4\n",
        );
        let s = load_series(&path, &schema::LSTM, "lstm").unwrap();
        assert_eq!(s.values(), vec![0.1, 0.4]);
        assert_eq!(s.dates()[1], NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn volatility_table_round_trips_through_garch_loader() {
        let dir = tempdir().unwrap();
        let table = VolatilityTable {
            dates: vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ],
            log_return: vec![0.01, -0.02],
            garch: vec![0.011, 0.013],
            egarch: vec![0.010, 0.014],
        };
        let path = dir.path().join("predictions").join("garch_X.csv");
        write_csv(&mut table.to_frame().unwrap(), &path).unwrap();

        let s = load_series(&path, &schema::GARCH, "garch").unwrap();
        assert_eq!(s.values(), vec![0.011, 0.013]);
    }
}

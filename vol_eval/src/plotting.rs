/// plotting.rs — PNG line charts
///
/// The x-axis is the observation index; tick labels are mapped back to the
/// calendar date so gaps (weekends, holidays) do not stretch the chart.
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

use vol_engine::AlignedSeries;

use crate::data::VolatilityTable;

const FORECAST_SIZE: (u32, u32) = (1200, 500);
const FIT_SIZE: (u32, u32) = (1400, 900);

fn plot_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {e}")
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Padded (min, max) over every value of every series.
fn value_range(series: &[&[f64]]) -> (f64, f64) {
    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-9);
    (lo - pad, hi + pad)
}

fn date_label(dates: &[NaiveDate], idx: usize) -> String {
    dates.get(idx).map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Realized vs GARCH vs LSTM volatility over time.
pub fn plot_forecasts(aligned: &AlignedSeries, title: &str, path: &Path) -> Result<()> {
    if aligned.is_empty() {
        bail!("nothing to plot for '{title}'");
    }
    ensure_parent(path)?;

    let n = aligned.len();
    let (y_min, y_max) = value_range(&[
        aligned.realized.as_slice(),
        aligned.garch.as_slice(),
        aligned.lstm.as_slice(),
    ]);
    let dates = &aligned.dates;

    let root = BitMapBackend::new(path, FORECAST_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0usize..n.saturating_sub(1).max(1), y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|i: &usize| date_label(dates, *i))
        .y_desc("volatility")
        .draw()
        .map_err(plot_err)?;

    let lines: [(&str, &[f64], RGBColor, u32); 3] = [
        ("Realized volatility", aligned.realized.as_slice(), BLACK, 2),
        ("GARCH", aligned.garch.as_slice(), BLUE, 1),
        ("LSTM", aligned.lstm.as_slice(), RED, 1),
    ];
    for (label, values, color, width) in lines {
        chart
            .draw_series(LineSeries::new(
                values.iter().copied().enumerate(),
                color.stroke_width(width),
            ))
            .map_err(plot_err)?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("Chart saved to {}", path.display());
    Ok(())
}

/// Two panels: log returns on top, GARCH / EGARCH conditional volatility below.
pub fn plot_fit(table: &VolatilityTable, ticker: &str, path: &Path) -> Result<()> {
    if table.dates.is_empty() {
        bail!("nothing to plot for {ticker}");
    }
    ensure_parent(path)?;

    let n = table.dates.len();
    let x_range = 0usize..n.saturating_sub(1).max(1);
    let dates = &table.dates;

    let root = BitMapBackend::new(path, FIT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let (upper, lower) = root.split_vertically((FIT_SIZE.1 / 2) as i32);

    // ── Returns ──────────────────────────────────────────────────────────
    let (r_min, r_max) = value_range(&[table.log_return.as_slice()]);
    let mut returns_chart = ChartBuilder::on(&upper)
        .caption(format!("{ticker} - Returns"), ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), r_min..r_max)
        .map_err(plot_err)?;
    returns_chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|i: &usize| date_label(dates, *i))
        .draw()
        .map_err(plot_err)?;
    returns_chart
        .draw_series(LineSeries::new(
            table.log_return.iter().copied().enumerate(),
            BLUE.mix(0.6),
        ))
        .map_err(plot_err)?;

    // ── Conditional volatility ───────────────────────────────────────────
    let (v_min, v_max) = value_range(&[table.garch.as_slice(), table.egarch.as_slice()]);
    let mut vol_chart = ChartBuilder::on(&lower)
        .caption(format!("{ticker} - Conditional volatility"), ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, v_min..v_max)
        .map_err(plot_err)?;
    vol_chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|i: &usize| date_label(dates, *i))
        .draw()
        .map_err(plot_err)?;

    let garch_color = RGBColor(0, 0, 139);
    let egarch_color = RGBColor(255, 140, 0);
    vol_chart
        .draw_series(LineSeries::new(
            table.garch.iter().copied().enumerate(),
            garch_color.stroke_width(2),
        ))
        .map_err(plot_err)?
        .label("GARCH(1,1)")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], garch_color.stroke_width(2))
        });
    vol_chart
        .draw_series(LineSeries::new(
            table.egarch.iter().copied().enumerate(),
            egarch_color.stroke_width(1),
        ))
        .map_err(plot_err)?
        .label("EGARCH(1,1)")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], egarch_color.stroke_width(2))
        });
    vol_chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("Chart saved to {}", path.display());
    Ok(())
}

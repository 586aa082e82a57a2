//! Trailing statistics over the close price.
//!
//! Windows are given in minutes and converted to a bar count with the
//! series' own bar interval, so "30 minutes" means 6 bars on a 5-minute
//! series and 1 bar on a 30-minute series. Rows that do not yet have a full
//! window behind them get no value.

use crate::data_engine::{BarSeries, PriceBar, StatColumn};
use crate::error::{EngineError, Result};

/// Number of bars covering `window_size_minutes`, never less than one.
pub fn calculate_bar_window(window_size_minutes: u32, bar_interval_minutes: u32) -> Result<usize> {
    if bar_interval_minutes == 0 {
        return Err(EngineError::InvalidArgument("bar interval cannot be zero".into()));
    }
    Ok((window_size_minutes / bar_interval_minutes).max(1) as usize)
}

fn trailing<F>(closes: &[f64], window: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; closes.len().min(window - 1)];
    out.extend(closes.windows(window).map(|w| Some(stat(w))));
    out
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn with_column<T: PriceBar + Clone>(
    series: &BarSeries<T>,
    name: String,
    window: usize,
    stat: fn(&[f64]) -> f64,
) -> BarSeries<T> {
    let values = trailing(&series.closes(), window, stat);
    let mut out = series.clone();
    out.columns.retain(|c| c.name != name);
    out.columns.push(StatColumn { name, values });
    out
}

/// Copy of `series` with an `ma_{window_size_minutes}min` column.
pub fn add_moving_average<T: PriceBar + Clone>(
    series: &BarSeries<T>,
    window_size_minutes: u32,
    bar_interval_minutes: u32,
) -> Result<BarSeries<T>> {
    let window = calculate_bar_window(window_size_minutes, bar_interval_minutes)?;
    Ok(with_column(series, format!("ma_{window_size_minutes}min"), window, mean))
}

/// Copy of `series` with a `median_{window_size_minutes}min` column.
pub fn add_moving_median<T: PriceBar + Clone>(
    series: &BarSeries<T>,
    window_size_minutes: u32,
    bar_interval_minutes: u32,
) -> Result<BarSeries<T>> {
    let window = calculate_bar_window(window_size_minutes, bar_interval_minutes)?;
    Ok(with_column(series, format!("median_{window_size_minutes}min"), window, median))
}

use chrono::{Duration, NaiveDate};
use rand::Rng;
use tracing::debug;

use crate::config::SimulationConfig;
use crate::data_engine::{Bar, BarSeries};
use crate::minute_bar::{generate_minute_ticks, get_ohlc_from_ticks};
use crate::tick::generate_tick;

/// Tick count range used for every minute of a generated session.
///
/// Independent of `ticks_per_minute_min/max`, which only applies when
/// `generate_minute_ticks` is called without an explicit count.
pub const SESSION_TICKS_PER_MINUTE: (usize, usize) = (5, 20);

/// One trading day of one-minute bars.
///
/// The first minute starts from `config.base_value` when there is no previous
/// close, otherwise from `prev_day_close` gapped by one daily-shift tick.
/// Every later minute starts from the close of the minute before it.
pub fn generate_day<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    date: NaiveDate,
    prev_day_close: Option<f64>,
) -> BarSeries<Bar> {
    let mut prev_close = match prev_day_close {
        Some(close) => generate_tick(rng, close, &config.daily_shift()),
        None => config.base_value,
    };

    let session = config.session();
    let minute_shift = config.minute_shift();
    let (min_ticks, max_ticks) = SESSION_TICKS_PER_MINUTE;

    let mut bars = Vec::with_capacity(session.minutes_count());
    for dt in session.minutes(date) {
        let num_ticks = rng.gen_range(min_ticks..=max_ticks);
        let ticks = generate_minute_ticks(rng, config, prev_close, Some(num_ticks), &minute_shift);

        let Some(ohlc) = get_ohlc_from_ticks(rng, config, &ticks) else {
            continue;
        };
        prev_close = ohlc.close;
        bars.push(ohlc.stamp(dt));
    }

    debug!(%date, %session, bars = bars.len(), "generated trading day");
    BarSeries::new(bars)
}

/// `days` consecutive calendar days starting at `start`, each opening from
/// the previous day's close.
pub fn generate_days<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    start: NaiveDate,
    days: u32,
) -> BarSeries<Bar> {
    let mut bars = Vec::new();
    let mut prev_close = None;

    for offset in 0..days {
        let date = start + Duration::days(i64::from(offset));
        let day = generate_day(rng, config, date, prev_close);
        prev_close = day.last_close().or(prev_close);
        bars.extend(day.bars);
    }
    BarSeries::new(bars)
}

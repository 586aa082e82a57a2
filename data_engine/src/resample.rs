use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::data_engine::{AggregatedBar, BarSeries, PriceBar};
use crate::error::EngineError;

/// Bucket widths the resampler supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    FiveMinutes,
    ThirtyMinutes,
    OneDay,
}

impl Period {
    pub fn minutes(&self) -> u32 {
        match self {
            Period::FiveMinutes => 5,
            Period::ThirtyMinutes => 30,
            Period::OneDay => 24 * 60,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::FiveMinutes => "5min",
            Period::ThirtyMinutes => "30min",
            Period::OneDay => "1D",
        }
    }

    /// Start of the bucket containing `ts`. Buckets are laid out from midnight
    /// of the bar's own date.
    pub fn bucket_start(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let midnight = ts.date().and_time(NaiveTime::MIN);
        let width = i64::from(self.minutes());
        let offset = (ts - midnight).num_minutes();
        midnight + Duration::minutes(offset - offset % width)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "5min" => Ok(Period::FiveMinutes),
            "30min" => Ok(Period::ThirtyMinutes),
            "1D" | "1d" => Ok(Period::OneDay),
            other => Err(EngineError::InvalidArgument(format!(
                "unsupported period '{other}', expected one of 5min, 30min, 1D"
            ))),
        }
    }
}

struct Bucket {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    price_x_volume: f64,
    price_sum: f64,
    rows: usize,
}

impl Bucket {
    fn vwap(&self) -> f64 {
        if self.volume == 0 {
            // no volume to weight by
            self.price_sum / self.rows as f64
        } else {
            self.price_x_volume / self.volume as f64
        }
    }
}

/// Collapse `series` into `period`-wide buckets.
///
/// Open is the first bar, close the last, high/low the extremes and volume
/// the sum. VWAP is `sum(price * volume) / sum(volume)` over the bucket's
/// bars. Buckets without bars are not emitted. Statistic columns of the
/// input are not carried over.
pub fn aggregate<T: PriceBar>(series: &BarSeries<T>, period: Period) -> BarSeries<AggregatedBar> {
    let mut refs: Vec<&T> = series.bars.iter().collect();
    refs.sort_by_key(|b| b.timestamp());

    let mut buckets: BTreeMap<NaiveDateTime, Bucket> = BTreeMap::new();

    for r in refs {
        let key = period.bucket_start(r.timestamp());
        let weighted = r.vwap_price() * r.volume() as f64;

        match buckets.get_mut(&key) {
            Some(b) => {
                if r.high() > b.high { b.high = r.high(); }
                if r.low() < b.low { b.low = r.low(); }
                b.close = r.close();
                b.volume += r.volume();
                b.price_x_volume += weighted;
                b.price_sum += r.vwap_price();
                b.rows += 1;
            }
            None => {
                buckets.insert(key, Bucket {
                    open: r.open(),
                    high: r.high(),
                    low: r.low(),
                    close: r.close(),
                    volume: r.volume(),
                    price_x_volume: weighted,
                    price_sum: r.vwap_price(),
                    rows: 1,
                });
            }
        }
    }

    let bars: Vec<AggregatedBar> = buckets
        .into_iter()
        .map(|(timestamp, b)| AggregatedBar {
            timestamp,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
            vwap: b.vwap(),
        })
        .collect();

    debug!(period = %period, input = series.len(), output = bars.len(), "aggregated bars");
    BarSeries::new(bars)
}

pub fn agg_to_5min<T: PriceBar>(series: &BarSeries<T>) -> BarSeries<AggregatedBar> {
    aggregate(series, Period::FiveMinutes)
}

pub fn agg_to_30min<T: PriceBar>(series: &BarSeries<T>) -> BarSeries<AggregatedBar> {
    aggregate(series, Period::ThirtyMinutes)
}

pub fn agg_to_1day<T: PriceBar>(series: &BarSeries<T>) -> BarSeries<AggregatedBar> {
    aggregate(series, Period::OneDay)
}

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::{EngineError, Result};

/// Timestamp layout used for the `dt` column of every export.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub trait CsvRecord {
    fn headers() -> &'static [&'static str];
    fn record(&self) -> Vec<String>;
}

/// Common view over raw and aggregated bars.
pub trait PriceBar {
    fn timestamp(&self) -> NaiveDateTime;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> u64;
    /// Price weighted by volume when this bar is folded into a coarser one.
    fn vwap_price(&self) -> f64;
}

/// One simulated minute.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub typical_price: f64,
}

/// A bucket of bars collapsed into one, with its volume-weighted average price.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub vwap: f64,
}

impl PriceBar for Bar {
    fn timestamp(&self) -> NaiveDateTime { self.timestamp }
    fn open(&self) -> f64 { self.open }
    fn high(&self) -> f64 { self.high }
    fn low(&self) -> f64 { self.low }
    fn close(&self) -> f64 { self.close }
    fn volume(&self) -> u64 { self.volume }
    fn vwap_price(&self) -> f64 { self.typical_price }
}

impl PriceBar for AggregatedBar {
    fn timestamp(&self) -> NaiveDateTime { self.timestamp }
    fn open(&self) -> f64 { self.open }
    fn high(&self) -> f64 { self.high }
    fn low(&self) -> f64 { self.low }
    fn close(&self) -> f64 { self.close }
    fn volume(&self) -> u64 { self.volume }
    // A bucket of buckets must weight each child by its own VWAP.
    fn vwap_price(&self) -> f64 { self.vwap }
}

impl CsvRecord for Bar {
    fn headers() -> &'static [&'static str] {
        &["dt", "open", "high", "low", "close", "volume", "typical_price"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
            self.typical_price.to_string(),
        ]
    }
}

impl CsvRecord for AggregatedBar {
    fn headers() -> &'static [&'static str] {
        &["dt", "open", "high", "low", "close", "volume", "vwap"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
            self.vwap.to_string(),
        ]
    }
}

/// A named value per bar, `None` where the statistic is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct StatColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Time-ordered bars plus any statistic columns derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries<T> {
    pub bars: Vec<T>,
    pub columns: Vec<StatColumn>,
}

impl<T> BarSeries<T> {
    pub fn new(bars: Vec<T>) -> Self {
        BarSeries { bars, columns: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&StatColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl<T: PriceBar> BarSeries<T> {
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(PriceBar::close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(PriceBar::close)
    }
}

/// Write a series with a header row; statistic columns follow the bar fields.
pub fn write_csv<T: CsvRecord, P: AsRef<Path>>(series: &BarSeries<T>, file_path: P) -> Result<()> {
    let file_path = file_path.as_ref();
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(file_path)?;

    let mut header: Vec<&str> = T::headers().to_vec();
    header.extend(series.columns.iter().map(|c| c.name.as_str()));
    writer.write_record(&header)?;

    for (i, bar) in series.bars.iter().enumerate() {
        let mut row = bar.record();
        for column in &series.columns {
            row.push(match column.values.get(i).copied().flatten() {
                Some(v) => v.to_string(),
                None => String::new(),
            });
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    info!(path = %file_path.display(), rows = series.len(), "saved bar series");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawBarRow {
    dt: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    typical_price: f64,
}

/// Read a one-minute export back into memory, ordered by timestamp.
pub fn read_bars_csv<P: AsRef<Path>>(path: P) -> Result<BarSeries<Bar>> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path.as_ref())?;

    let mut bars = Vec::new();
    for row in rdr.deserialize::<RawBarRow>() {
        let row = row?;
        let timestamp = parse_ts_to_naive(&row.dt).ok_or_else(|| EngineError::Timestamp(row.dt.clone()))?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            typical_price: row.typical_price,
        });
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(BarSeries::new(bars))
}

pub fn parse_ts_to_naive(ts: &str) -> Option<NaiveDateTime> {
    let s = ts.trim();

    let fmts = [
        TIMESTAMP_FORMAT,
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M",
        "%Y.%m.%d %H:%M:%S", "%Y.%m.%dT%H:%M:%S",
    ];
    for f in &fmts {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

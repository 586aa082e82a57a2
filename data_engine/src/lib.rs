pub mod config;
pub mod daily_series;
pub mod data_engine;
pub mod error;
pub mod minute_bar;
pub mod resample;
pub mod rolling;
pub mod session;
pub mod tick;

pub use crate::config::{load_config, ConfigError, SimulationConfig};
pub use crate::daily_series::{generate_day, generate_days};
pub use crate::data_engine::{read_bars_csv, write_csv, AggregatedBar, Bar, BarSeries, CsvRecord, PriceBar, StatColumn};
pub use crate::error::{EngineError, Result};
pub use crate::minute_bar::{generate_minute_ticks, get_ohlc_from_ticks, Ohlc};
pub use crate::resample::{agg_to_1day, agg_to_30min, agg_to_5min, aggregate, Period};
pub use crate::rolling::{add_moving_average, add_moving_median, calculate_bar_window};
pub use crate::tick::{generate_tick, ShiftParams};

use chrono::NaiveDateTime;
use rand::Rng;

use crate::config::SimulationConfig;
use crate::data_engine::Bar;
use crate::tick::{generate_tick, ShiftParams};

/// OHLC summary of one minute of ticks, not yet placed in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub typical_price: f64,
}

impl Ohlc {
    /// Attach the minute this summary belongs to.
    pub fn stamp(self, timestamp: NaiveDateTime) -> Bar {
        Bar {
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            typical_price: self.typical_price,
        }
    }
}

/// Most decimal places an `f64` price can meaningfully carry.
pub const MAX_ROUND_PRECISION: u32 = 15;

/// Round to `precision` decimal places, ties to even.
///
/// Precision above [`MAX_ROUND_PRECISION`] is treated as that maximum.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision.min(MAX_ROUND_PRECISION) as i32);
    (value * scale).round_ties_even() / scale
}

/// Random walk of ticks starting from `base_value`.
///
/// Each tick is perturbed from the previous one. When `num_ticks` is `None`
/// the count is drawn from the configured `ticks_per_minute` range.
pub fn generate_minute_ticks<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    base_value: f64,
    num_ticks: Option<usize>,
    params: &ShiftParams,
) -> Vec<f64> {
    let num_ticks = num_ticks.unwrap_or_else(|| {
        rng.gen_range(config.ticks_per_minute_min..=config.ticks_per_minute_max)
    });

    let mut ticks = Vec::with_capacity(num_ticks);
    let mut last = base_value;
    for _ in 0..num_ticks {
        last = generate_tick(rng, last, params);
        ticks.push(last);
    }
    ticks
}

/// Reduce a minute of ticks to one OHLC summary with a random volume.
///
/// Returns `None` for an empty tick set: no bar can be produced for that minute.
pub fn get_ohlc_from_ticks<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
    ticks: &[f64],
) -> Option<Ohlc> {
    let (&first, &last) = (ticks.first()?, ticks.last()?);
    let high = ticks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = ticks.iter().copied().fold(f64::INFINITY, f64::min);

    let p = config.round_precision;
    let (high, low, close) = (round_to(high, p), round_to(low, p), round_to(last, p));

    Some(Ohlc {
        open: round_to(first, p),
        high,
        low,
        close,
        volume: rng.gen_range(config.volume_min..=config.volume_max),
        typical_price: round_to((high + low + close) / 3.0, p),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case(&[100.0, 101.0, 102.0, 103.0, 104.0], 100.0, 104.0, 100.0, 104.0, 102.67)]
    #[case(&[50.0, 55.0, 53.0, 52.0, 54.0], 50.0, 55.0, 50.0, 54.0, 53.0)]
    #[case(&[200.0, 198.0, 202.0, 202.0], 200.0, 202.0, 198.0, 202.0, 200.67)]
    #[case(&[100.0], 100.0, 100.0, 100.0, 100.0, 100.0)]
    fn ohlc_from_ticks(
        #[case] ticks: &[f64],
        #[case] open: f64,
        #[case] high: f64,
        #[case] low: f64,
        #[case] close: f64,
        #[case] typical_price: f64,
    ) {
        let cfg = test_config();
        let mut rng = StdRng::seed_from_u64(1);
        let ohlc = get_ohlc_from_ticks(&mut rng, &cfg, ticks).unwrap();
        assert_eq!(ohlc.open, open);
        assert_eq!(ohlc.high, high);
        assert_eq!(ohlc.low, low);
        assert_eq!(ohlc.close, close);
        assert!((ohlc.typical_price - typical_price).abs() < 1e-9);
        assert!((cfg.volume_min..=cfg.volume_max).contains(&ohlc.volume));
    }

    #[test]
    fn empty_ticks_produce_no_bar() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(get_ohlc_from_ticks(&mut rng, &test_config(), &[]).is_none());
    }

    #[test]
    fn prices_are_rounded_to_precision() {
        let mut cfg = test_config();
        cfg.round_precision = 1;
        let mut rng = StdRng::seed_from_u64(1);
        let ohlc = get_ohlc_from_ticks(&mut rng, &cfg, &[10.04, 10.26, 9.92]).unwrap();
        assert_eq!(ohlc.open, 10.0);
        assert_eq!(ohlc.high, 10.3);
        assert_eq!(ohlc.low, 9.9);
        assert_eq!(ohlc.close, 9.9);
        assert_eq!(ohlc.typical_price, 10.0);
    }

    #[test]
    fn round_to_zero_places() {
        assert_eq!(round_to(102.666, 0), 103.0);
        assert_eq!(round_to(102.666, 2), 102.67);
    }

    #[test]
    fn round_to_breaks_ties_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(2.5, 0), 2.0);
    }

    #[test]
    fn oversized_precision_stays_finite() {
        let v = round_to(101.234, 400);
        assert!(v.is_finite());
        assert!((v - 101.234).abs() < 1e-9);
        assert!(round_to(101.234, u32::MAX).is_finite());
    }

    #[test]
    fn ticks_form_a_walk_from_base() {
        let cfg = test_config();
        let params = ShiftParams {
            shift_min: 0.01,
            shift_max: 0.01,
            surge_probability: 0.0,
            surge_limit: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(8);
        let ticks = generate_minute_ticks(&mut rng, &cfg, 100.0, Some(10), &params);
        assert_eq!(ticks.len(), 10);

        let mut prev = 100.0;
        for t in ticks {
            let step = (t - prev).abs() / prev;
            assert!((step - 0.01).abs() < 1e-12);
            prev = t;
        }
    }

    #[test]
    fn unspecified_count_uses_configured_range() {
        let mut cfg = test_config();
        cfg.ticks_per_minute_min = 3;
        cfg.ticks_per_minute_max = 4;
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..50 {
            let n = generate_minute_ticks(&mut rng, &cfg, 100.0, None, &ShiftParams::FLAT).len();
            assert!((3..=4).contains(&n));
        }
    }

    proptest! {
        #[test]
        fn ohlc_matches_tick_extremes(ticks in prop::collection::vec(1.0f64..1_000.0, 1..40)) {
            let cfg = test_config();
            let p = cfg.round_precision;
            let mut rng = StdRng::seed_from_u64(0);
            let ohlc = get_ohlc_from_ticks(&mut rng, &cfg, &ticks).unwrap();

            let max = ticks.iter().copied().fold(f64::MIN, f64::max);
            let min = ticks.iter().copied().fold(f64::MAX, f64::min);
            prop_assert_eq!(ohlc.open, round_to(ticks[0], p));
            prop_assert_eq!(ohlc.close, round_to(ticks[ticks.len() - 1], p));
            prop_assert_eq!(ohlc.high, round_to(max, p));
            prop_assert_eq!(ohlc.low, round_to(min, p));
            prop_assert_eq!(ohlc.typical_price, round_to((ohlc.high + ohlc.low + ohlc.close) / 3.0, p));
        }
    }
}

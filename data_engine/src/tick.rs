//! Single-tick price perturbation.
//!
//! A tick moves the base value by a random relative amount in either
//! direction, then occasionally applies a multiplicative surge on top:
//!
//! ```text
//! m     ~ U[shift_min, shift_max]
//! sign  ~ {-1, +1}
//! value = base + sign * m * base
//! with probability surge_probability:
//!     s ~ U[0, surge_limit]
//!     value *= s          if s > 1
//!     value *= 1 + s      otherwise
//! ```

use rand::Rng;

/// Random-walk parameters for one family of ticks (overnight gap or intra-minute).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftParams {
    pub shift_min: f64,
    pub shift_max: f64,
    pub surge_probability: f64,
    pub surge_limit: f64,
}

#[cfg(test)]
impl ShiftParams {
    /// Parameters that leave the base value untouched.
    pub const FLAT: ShiftParams = ShiftParams {
        shift_min: 0.0,
        shift_max: 0.0,
        surge_probability: 0.0,
        surge_limit: 0.0,
    };
}

/// Uniform draw from the closed interval spanned by `a` and `b`, in either order.
fn uniform<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.gen_range(lo..=hi)
}

/// Multiply `value` by a random surge factor with the given probability.
pub fn apply_surge<R: Rng + ?Sized>(
    rng: &mut R,
    value: f64,
    surge_probability: f64,
    surge_limit: f64,
) -> f64 {
    if surge_probability > 0.0 && rng.gen::<f64>() < surge_probability {
        let surge = uniform(rng, 0.0, surge_limit);
        let factor = if surge > 1.0 { surge } else { 1.0 + surge };
        return value * factor;
    }
    value
}

/// Produce one perturbed, unrounded price from `base_value`.
pub fn generate_tick<R: Rng + ?Sized>(rng: &mut R, base_value: f64, params: &ShiftParams) -> f64 {
    let shift = uniform(rng, params.shift_min, params.shift_max);
    let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let value = base_value + sign * shift * base_value;
    apply_surge(rng, value, params.surge_probability, params.surge_limit)
}

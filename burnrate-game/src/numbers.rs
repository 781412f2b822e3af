//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Truncate a f64 toward zero and clamp it to the i32 range, returning 0 for non-finite values.
#[must_use]
pub fn trunc_f64_to_i32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).trunc();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Split an accumulated amount into its whole part and the fractional remainder.
///
/// The whole part is truncated toward zero so that negative accumulations
/// carry a negative remainder forward instead of overshooting.
#[must_use]
pub fn split_whole(value: f64) -> (i32, f64) {
    if !value.is_finite() {
        return (0, 0.0);
    }
    let whole = trunc_f64_to_i32(value);
    (whole, value - f64::from(whole))
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Add a signed delta to a stat value, saturating instead of wrapping, then clamp to `[0, max]`.
#[must_use]
pub const fn saturating_clamp(value: i32, delta: i32, max: i32) -> i32 {
    let sum = value.saturating_add(delta);
    if sum < 0 {
        0
    } else if sum > max {
        max
    } else {
        sum
    }
}

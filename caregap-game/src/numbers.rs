//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a length or index to f64, saturating on the (theoretical) overflow path.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Floor a f64 into a usize, returning 0 for NaN or negative values.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.floor()).unwrap_or(usize::MAX)
}

/// Round a f64 into an i64 clamped to the representable range, 0 for NaN.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    cast::<f64, i64>(value.clamp(min, max).round()).unwrap_or(0)
}

/// Clamp a signed severity into `[0, max]` and narrow it to u32.
#[must_use]
pub fn clamp_to_u32(value: i64, max: u32) -> u32 {
    let clamped = value.clamp(0, i64::from(max));
    u32::try_from(clamped).unwrap_or(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_handles_nan_and_negatives() {
        assert_eq!(floor_f64_to_usize(f64::NAN), 0);
        assert_eq!(floor_f64_to_usize(-3.2), 0);
        assert_eq!(floor_f64_to_usize(12.99), 12);
    }

    #[test]
    fn clamp_to_u32_respects_bounds() {
        assert_eq!(clamp_to_u32(-4, 30), 0);
        assert_eq!(clamp_to_u32(12, 30), 12);
        assert_eq!(clamp_to_u32(44, 30), 30);
    }

    #[test]
    fn rounding_covers_edges() {
        assert_eq!(round_f64_to_i64(1.6), 2);
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
        assert!((i64_to_f64(-6_000) + 6_000.0).abs() < f64::EPSILON);
        assert!((usize_to_f64(13) - 13.0).abs() < f64::EPSILON);
    }
}

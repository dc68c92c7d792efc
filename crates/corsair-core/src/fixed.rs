//! Fixed-point magnitudes for attributes and resource pools.

use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Every attribute magnitude and resource pool is stored in this type so that
/// adding and then removing equipment restores the exact previous value.
pub type Fixed64 = I32F32;

/// For fixture builders and trusted constants. Panics on values outside the
/// Q32.32 range.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Conversion for untrusted input. `None` for NaN, infinities, and values
/// outside the Q32.32 range.
#[inline]
pub fn checked_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

/// Used where attributes feed kinematics.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Multiply an attribute by an outfit count, saturating instead of wrapping.
#[inline]
pub fn scale(v: Fixed64, count: i32) -> Fixed64 {
    v.saturating_mul_int(count as i64)
}

/// `value / total` clamped to `[0, 1]`. A zero total yields zero.
#[inline]
pub fn fraction(value: Fixed64, total: Fixed64) -> f64 {
    if total <= Fixed64::ZERO {
        return 0.0;
    }
    (fixed64_to_f64(value) / fixed64_to_f64(total)).clamp(0.0, 1.0)
}

//! Deterministic float ordering.
//!
//! Distances are compared on every frame; NaN and signed zero must never make
//! the winner depend on evaluation order.

use core::cmp::Ordering;

/// Canonicalize a float before comparison.
///
/// `-0.0` becomes `0.0`; every NaN becomes the same NaN.
fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Total ordering for floats, stable across NaN payloads and zero signs.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

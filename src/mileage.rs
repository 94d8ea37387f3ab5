//! Cumulative arc length ("mileage") along a strip.
//!
//! Mileage lets a shader place dashes or other along-the-line patterns at
//! consistent screen distances. With non-uniform axis scaling, the y delta is
//! divided by the pixels-per-value aspect ratio so that the measure follows
//! what is drawn rather than raw data units.

use crate::types::{LineFlags, Position};

/// Euclidean distance between two points.
pub fn distance(a: Position, b: Position) -> f64 {
    distance_with_aspect(a, b, 1.0)
}

/// Distance with the y delta divided by `ppv_aspect_ratio`.
pub fn distance_with_aspect(a: Position, b: Position, ppv_aspect_ratio: f64) -> f64 {
    let dx = f64::from(b.x) - f64::from(a.x);
    let dy = (f64::from(b.y) - f64::from(a.y)) / ppv_aspect_ratio;
    dx.hypot(dy)
}

/// Ratio of x pixels-per-value to y pixels-per-value for the current view.
pub fn ppv_aspect_ratio(x_pixels_per_value: f64, y_pixels_per_value: f64) -> f64 {
    x_pixels_per_value / y_pixels_per_value
}

/// Recompute mileage over one window of slots.
///
/// `xy`, `flags` and `mileage` cover the same slots. Slots before
/// `first_write` are read but not written: when `first_write > 0`, the slot
/// at `first_write - 1` provides the position and mileage to chain from.
/// When `first_write == 0` or `reset_at_start` is set, the chain starts at
/// zero.
///
/// A slot without [`LineFlags::CONNECT`] adds no distance, so its mileage
/// equals its predecessor's and accumulation resumes from there at the next
/// connected slot.
///
/// # Panics
///
/// Panics if the three slices differ in length or `first_write` exceeds it.
pub fn update_mileage(
    xy: &[Position],
    flags: &[u8],
    mileage: &mut [f32],
    first_write: usize,
    reset_at_start: bool,
    ppv_aspect_ratio: f64,
) {
    assert_eq!(xy.len(), flags.len(), "xy/flags window mismatch");
    assert_eq!(xy.len(), mileage.len(), "xy/mileage window mismatch");
    assert!(first_write <= xy.len(), "first_write past end of window");

    if first_write == xy.len() {
        return;
    }

    let (mut prev, mut total) = if first_write == 0 || reset_at_start {
        let start = first_write.saturating_sub(1);
        (xy[start], 0.0_f64)
    } else {
        (xy[first_write - 1], f64::from(mileage[first_write - 1]))
    };

    for i in first_write..xy.len() {
        let here = xy[i];
        if LineFlags::from_bits_truncate(flags[i]).contains(LineFlags::CONNECT) {
            total += distance_with_aspect(prev, here, ppv_aspect_ratio);
        }
        #[expect(clippy::cast_possible_truncation)]
        let value = total as f32;
        mileage[i] = value;
        prev = here;
    }
}

use std::f64::consts::{PI, TAU};

/// Cubic Hermite ease `3t² − 2t³`, with `t` clamped to `[0, 1]`.
///
/// Point-symmetric around one half: `smoothstep(1 − t) == 1 − smoothstep(t)`.
/// The lane transition reversal relies on that to keep the blended target
/// continuous.
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Like `f64::signum`, except that zero maps to zero.
#[inline]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Wraps an unbounded angle into `(−π, π]`.
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

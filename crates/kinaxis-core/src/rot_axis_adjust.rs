//! Rotary axis alignment from two probe points.
//!
//! Two points are probed on a surface that should be level when the rotary
//! axis is at zero. The tilt between them, seen along the axis, is the
//! correction to apply before re-zeroing the axis.

use thiserror::Error;

/// Corrections larger than this are refused rather than moved.
pub const MAX_CORRECTION: f64 = 3.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RotAxisError {
    #[error("rot_axis_adjust: must have exactly two positions, got {0}")]
    PointCount(usize),
    #[error(
        "correction of {correction:.3} deg exceeds {max} deg, not moving axis",
        max = MAX_CORRECTION
    )]
    CorrectionTooLarge { correction: f64 },
}

/// A probed point across the rotary axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbePoint {
    pub y: f64,
    pub z: f64,
}

/// Outcome of an alignment: the axis moves from `before` to `after` and is
/// then re-zeroed by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotAxisCorrection {
    pub correction: f64,
    pub before: f64,
    pub after: f64,
}

/// Tilt between two probe points in degrees, folded into [-90, 90] so the
/// probe order does not matter.
pub fn tilt_angle(p0: ProbePoint, p1: ProbePoint) -> f64 {
    let y_diff = p0.y - p1.y;
    let z_diff = p0.z - p1.z;
    let angle = z_diff.atan2(y_diff).to_degrees();
    if angle > 90.0 {
        angle - 180.0
    } else if angle < -90.0 {
        angle + 180.0
    } else {
        angle
    }
}

/// Compute the correction for the axis currently at `position`.
pub fn plan_correction(
    points: &[ProbePoint],
    position: f64,
) -> Result<RotAxisCorrection, RotAxisError> {
    let &[p0, p1] = points else {
        return Err(RotAxisError::PointCount(points.len()));
    };
    let correction = tilt_angle(p0, p1);
    tracing::info!(correction, "rotary axis tilt measured");
    if correction.abs() > MAX_CORRECTION {
        return Err(RotAxisError::CorrectionTooLarge { correction });
    }
    Ok(RotAxisCorrection {
        correction,
        before: position,
        after: position - correction,
    })
}

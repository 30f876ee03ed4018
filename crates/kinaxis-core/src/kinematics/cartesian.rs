// Cartesian kinematics - each stepper follows one axis of the move
//
// The x, y, z and auxiliary a axes are linear and pass their coordinate
// straight through. The b axis is a rotary axis in degrees whose position
// is unwrapped against the last commanded position, so the step solver
// always sees a continuous position even when the angle wraps at +/-180.

use crate::{
    kinematics::{ActiveFlags, CalcPositionCallback, KinematicsError, MoveCoord, PostCallback},
    trap_queue::Coord,
};
use std::fmt;

const HALF_TURN: f64 = 180.0;
const FULL_TURN: f64 = 360.0;

/// Which axis this stepper controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
    /// Auxiliary linear axis
    A,
    /// Rotary axis, degrees
    B,
}

impl Axis {
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::Z, Axis::A, Axis::B];

    /// Parse axis from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, KinematicsError> {
        match s.to_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            "a" => Ok(Axis::A),
            "b" => Ok(Axis::B),
            _ => Err(KinematicsError::UnknownAxis(s.to_string())),
        }
    }

    pub fn from_char(c: char) -> Result<Self, KinematicsError> {
        Self::parse(c.encode_utf8(&mut [0; 4]))
    }

    pub const fn as_char(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
            Axis::A => 'a',
            Axis::B => 'b',
        }
    }

    pub const fn is_rotary(self) -> bool {
        matches!(self, Axis::B)
    }

    pub const fn active_flags(self) -> ActiveFlags {
        match self {
            Axis::X => ActiveFlags::new().with_x(),
            Axis::Y => ActiveFlags::new().with_y(),
            Axis::Z => ActiveFlags::new().with_z(),
            Axis::A => ActiveFlags::new().with_a(),
            Axis::B => ActiveFlags::new().with_b(),
        }
    }

    /// The coordinate this axis follows
    pub fn project(self, c: &Coord) -> f64 {
        match self {
            Axis::X => c.x,
            Axis::Y => c.y,
            Axis::Z => c.z,
            Axis::A => c.a,
            Axis::B => c.b,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Reduce any angle to its representative in (-180, 180].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(FULL_TURN);
    if wrapped > HALF_TURN {
        wrapped - FULL_TURN
    } else {
        wrapped
    }
}

/// Pick the representative of `angle + 360k` closest to `commanded_pos`.
///
/// Only a single turn is added or removed, so `angle` must be within one
/// turn of the half-open window around `commanded_pos`.
pub fn unwrap_angle(angle: f64, commanded_pos: f64) -> f64 {
    let delta = angle - commanded_pos;
    if delta > HALF_TURN {
        angle - FULL_TURN
    } else if delta < -HALF_TURN {
        angle + FULL_TURN
    } else {
        angle
    }
}

/// Fold a commanded angle back towards [-180, 180] by at most one turn.
pub fn fold_angle(pos: f64) -> f64 {
    if pos < -HALF_TURN {
        pos + FULL_TURN
    } else if pos > HALF_TURN {
        pos - FULL_TURN
    } else {
        pos
    }
}

/// Cartesian kinematics - each stepper directly controls one axis
#[derive(Debug, Clone)]
pub struct CartesianKin {
    axis: Axis,
    commanded_pos: f64,
}

impl CartesianKin {
    pub fn new(axis: Axis) -> Self {
        tracing::debug!(%axis, rotary = axis.is_rotary(), "allocated cartesian stepper kinematics");
        Self {
            axis,
            commanded_pos: 0.0,
        }
    }

    /// Allocate the kinematics for an axis named by a single character.
    ///
    /// Unknown axes are rejected here, at configuration time, instead of
    /// producing a stepper that never moves.
    pub fn alloc(axis: char) -> Result<Self, KinematicsError> {
        Axis::from_char(axis).map(Self::new)
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn active_flags(&self) -> ActiveFlags {
        self.axis.active_flags()
    }

    /// Whether this axis needs `post_step` to keep its commanded position bounded
    pub fn has_post_step(&self) -> bool {
        self.axis.is_rotary()
    }

    pub fn commanded_pos(&self) -> f64 {
        self.commanded_pos
    }

    /// Record the position the solver last committed for this stepper.
    pub fn set_commanded_pos(&mut self, pos: f64) {
        self.commanded_pos = pos;
    }
}

impl CalcPositionCallback for CartesianKin {
    fn calc_position<M: MoveCoord + ?Sized>(&self, m: &M, move_time: f64) -> f64 {
        let pos = self.axis.project(&m.coord_at(move_time));
        if self.axis.is_rotary() {
            unwrap_angle(pos, self.commanded_pos)
        } else {
            pos
        }
    }
}

// Only called at a cadence where the commanded angle has drifted by
// less than a turn since the previous call. The sampler calls it after
// every committed position.
impl PostCallback for CartesianKin {
    fn post_step(&mut self) {
        if self.axis.is_rotary() {
            self.commanded_pos = fold_angle(self.commanded_pos);
        }
    }
}

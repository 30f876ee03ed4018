// Stepper kinematics: mapping a move onto a single stepper's position

use crate::trap_queue::{Coord, Move};
use thiserror::Error;

pub mod cartesian;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KinematicsError {
    #[error("unknown axis '{0}', expected one of x, y, z, a, b")]
    UnknownAxis(String),
}

// Active flags for axis filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveFlags(u8);

impl ActiveFlags {
    const X: u8 = 1 << 0;
    const Y: u8 = 1 << 1;
    const Z: u8 = 1 << 2;
    const A: u8 = 1 << 3;
    const B: u8 = 1 << 4;

    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn with_x(mut self) -> Self {
        self.0 |= Self::X;
        self
    }

    pub const fn with_y(mut self) -> Self {
        self.0 |= Self::Y;
        self
    }

    pub const fn with_z(mut self) -> Self {
        self.0 |= Self::Z;
        self
    }

    pub const fn with_a(mut self) -> Self {
        self.0 |= Self::A;
        self
    }

    pub const fn with_b(mut self) -> Self {
        self.0 |= Self::B;
        self
    }

    pub const fn has_x(&self) -> bool {
        self.0 & Self::X != 0
    }

    pub const fn has_y(&self) -> bool {
        self.0 & Self::Y != 0
    }

    pub const fn has_z(&self) -> bool {
        self.0 & Self::Z != 0
    }

    pub const fn has_a(&self) -> bool {
        self.0 & Self::A != 0
    }

    pub const fn has_b(&self) -> bool {
        self.0 & Self::B != 0
    }
}

/// Source of coordinates along a move.
///
/// The kinematics only ever borrow a move to evaluate it; storage and
/// interpolation belong to the move queue.
pub trait MoveCoord {
    fn coord_at(&self, move_time: f64) -> Coord;
}

impl MoveCoord for Move {
    fn coord_at(&self, move_time: f64) -> Coord {
        move_get_coord(self, move_time)
    }
}

// Position callback trait - calculates position at a given time in a move
pub trait CalcPositionCallback {
    fn calc_position<M: MoveCoord + ?Sized>(&self, m: &M, move_time: f64) -> f64;
}

// Post-step callback trait - called after a position is committed
pub trait PostCallback {
    fn post_step(&mut self);
}

/// Calculate the distance traveled in a move at a given time
pub fn move_get_distance(m: &Move, move_time: f64) -> f64 {
    (m.start_v + m.half_accel * move_time) * move_time
}

/// Calculate the coordinate at a given time in a move
pub fn move_get_coord(m: &Move, move_time: f64) -> Coord {
    let move_dist = move_get_distance(m, move_time);
    Coord {
        x: m.start_pos.x + m.axes_r.x * move_dist,
        y: m.start_pos.y + m.axes_r.y * move_dist,
        z: m.start_pos.z + m.axes_r.z * move_dist,
        a: m.start_pos.a + m.axes_r.a * move_dist,
        b: m.start_pos.b + m.axes_r.b * move_dist,
    }
}

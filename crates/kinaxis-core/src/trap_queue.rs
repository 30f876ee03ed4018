//! Trapezoidal velocity movement queue.
//!
//! Tracks active trapezoid segments (accel/cruise/decel) for the five
//! machine axes and fills gaps with null moves so that every instant up to
//! the last queued move is covered by exactly one segment.

use crate::kinematics::{ActiveFlags, move_get_coord};
use std::collections::VecDeque;

const NEVER_TIME: f64 = 9_999_999_999_999_999.9;
const MAX_NULL_MOVE: f64 = 1.0;

/// Coordinate tuple: three cartesian axes, the linear auxiliary axis `a`
/// and the rotary axis `b` (degrees).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub a: f64,
    pub b: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64, z: f64, a: f64, b: f64) -> Self {
        Self { x, y, z, a, b }
    }
}

impl From<[f64; 5]> for Coord {
    fn from([x, y, z, a, b]: [f64; 5]) -> Self {
        Self { x, y, z, a, b }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Move {
    pub print_time: f64,
    pub move_t: f64,
    pub start_v: f64,
    pub half_accel: f64,
    pub start_pos: Coord,
    pub axes_r: Coord,
}

impl Move {
    /// A move that holds `pos` for `move_t` seconds.
    pub fn stationary(print_time: f64, move_t: f64, pos: Coord) -> Self {
        Self {
            print_time,
            move_t,
            start_pos: pos,
            ..Self::default()
        }
    }

    pub fn end_time(&self) -> f64 {
        self.print_time + self.move_t
    }

    /// Check if this move is likely to cause movement on a stepper with `flags`
    pub fn is_active(&self, flags: ActiveFlags) -> bool {
        (flags.has_x() && self.axes_r.x != 0.0)
            || (flags.has_y() && self.axes_r.y != 0.0)
            || (flags.has_z() && self.axes_r.z != 0.0)
            || (flags.has_a() && self.axes_r.a != 0.0)
            || (flags.has_b() && self.axes_r.b != 0.0)
    }
}

pub struct TrapQueue {
    moves: VecDeque<Move>, // includes head and tail sentinels
}

impl Default for TrapQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TrapQueue {
    pub fn new() -> Self {
        let mut moves = VecDeque::new();
        // Head sentinel
        moves.push_back(Move {
            print_time: -1.0,
            ..Move::default()
        });
        // Tail sentinel
        moves.push_back(Move {
            print_time: NEVER_TIME,
            move_t: NEVER_TIME,
            ..Move::default()
        });
        Self { moves }
    }

    fn tail_index(&self) -> usize {
        self.moves.len() - 1
    }

    /// Add a fully-prepared move, filling gaps with a null move when necessary.
    pub fn add_move(&mut self, m: Move) {
        let prev = self.moves[self.tail_index() - 1];
        if prev.end_time() < m.print_time {
            let null_start = if prev.print_time <= 0.0 && m.print_time > MAX_NULL_MOVE {
                m.print_time - MAX_NULL_MOVE
            } else {
                prev.end_time()
            };
            let null_move =
                Move::stationary(null_start, m.print_time - null_start, m.start_pos);
            let insert_at = self.tail_index();
            self.moves.insert(insert_at, null_move);
        }
        let insert_at = self.tail_index();
        self.moves.insert(insert_at, m);
    }

    /// Queue a trapezoidal move, split into its accel, cruise and decel
    /// segments. `axes_r` is the unit direction of travel.
    #[allow(clippy::too_many_arguments)]
    pub fn append(
        &mut self,
        print_time: f64,
        accel_t: f64,
        cruise_t: f64,
        decel_t: f64,
        start_pos: Coord,
        axes_r: Coord,
        start_v: f64,
        cruise_v: f64,
        accel: f64,
    ) {
        let mut cur_time = print_time;
        let mut cur_pos = start_pos;

        if accel_t > 0.0 {
            let m = Move {
                print_time: cur_time,
                move_t: accel_t,
                start_v,
                half_accel: 0.5 * accel,
                start_pos: cur_pos,
                axes_r,
            };
            self.add_move(m);
            cur_time += accel_t;
            cur_pos = move_get_coord(&m, accel_t);
        }

        if cruise_t > 0.0 {
            let m = Move {
                print_time: cur_time,
                move_t: cruise_t,
                start_v: cruise_v,
                half_accel: 0.0,
                start_pos: cur_pos,
                axes_r,
            };
            self.add_move(m);
            cur_time += cruise_t;
            cur_pos = move_get_coord(&m, cruise_t);
        }

        if decel_t > 0.0 {
            self.add_move(Move {
                print_time: cur_time,
                move_t: decel_t,
                start_v: cruise_v,
                half_accel: -0.5 * accel,
                start_pos: cur_pos,
                axes_r,
            });
        }
    }

    /// Drop any moves that end at or before `print_time`.
    pub fn finalize_moves(&mut self, print_time: f64) {
        while self.moves.len() > 2 {
            if self.moves[1].end_time() > print_time {
                break;
            }
            self.moves.remove(1);
        }
    }

    /// Moves between the head and tail sentinels, in time order.
    pub fn active_moves(&self) -> impl Iterator<Item = &Move> {
        let end = self.tail_index();
        self.moves.range(1..end)
    }

    /// Number of queued moves, null moves included.
    pub fn active_len(&self) -> usize {
        self.moves.len().saturating_sub(2)
    }
}

// Position sampler: drives one stepper's kinematics over the move queue

use crate::{
    kinematics::{
        CalcPositionCallback, MoveCoord, PostCallback,
        cartesian::{CartesianKin, wrap_angle},
    },
    trap_queue::{Coord, Move, TrapQueue},
};
use std::iter;
use thiserror::Error;

// Samples closer than this to a move's end are replaced by the end sample
const TIME_EPSILON: f64 = 0.000_000_001;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleError {
    #[error("sample interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),
}

/// A committed stepper position at an absolute print time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub print_time: f64,
    pub position: f64,
}

// The queued rotary coordinate is a cumulative angle; the kinematics
// expect it as an angle in (-180, 180].
struct WrappedMove<'a>(&'a Move);

impl MoveCoord for WrappedMove<'_> {
    fn coord_at(&self, move_time: f64) -> Coord {
        let coord = self.0.coord_at(move_time);
        Coord {
            b: wrap_angle(coord.b),
            ..coord
        }
    }
}

/// Move-relative sample times: a grid every `interval` from `start`,
/// then `end` itself.
fn sample_times(start: f64, end: f64, interval: f64) -> impl Iterator<Item = f64> {
    (0u64..)
        .map(move |step| start + step as f64 * interval)
        .take_while(move |&t| t < end - TIME_EPSILON)
        .chain(iter::once(end))
}

/// Evaluates a stepper's position along queued moves and commits each
/// result as the stepper's commanded position, the way the step solver
/// consumes the kinematics.
///
/// The fixup runs after every committed position, so a rotary stepper's
/// commanded angle stays within [-180, 180] however far a move turns.
/// Positions after a fold continue in the folded frame.
#[derive(Debug)]
pub struct Sampler {
    kin: CartesianKin,
    sample_time: f64,
    last_flush_time: f64,
    last_sample_time: Option<f64>,
}

impl Sampler {
    pub fn new(kin: CartesianKin, sample_time: f64) -> Result<Self, SampleError> {
        if !sample_time.is_finite() || sample_time <= 0.0 {
            return Err(SampleError::InvalidInterval(sample_time));
        }
        Ok(Self {
            kin,
            sample_time,
            last_flush_time: 0.0,
            last_sample_time: None,
        })
    }

    pub fn commanded_pos(&self) -> f64 {
        self.kin.commanded_pos()
    }

    pub fn last_flush_time(&self) -> f64 {
        self.last_flush_time
    }

    /// Reset the commanded position to that of a stationary toolhead at `pos`.
    pub fn set_position(&mut self, pos: Coord) {
        let pos = self.calc_position_from_coord(pos);
        self.kin.set_commanded_pos(pos);
        self.kin.post_step();
        tracing::debug!(
            axis = %self.kin.axis(),
            commanded_pos = self.kin.commanded_pos(),
            "stepper position reset"
        );
    }

    pub fn calc_position_from_coord(&self, pos: Coord) -> f64 {
        // A dummy move parked at the given position
        let m = Move::stationary(0.0, 1000.0, pos);
        self.kin.calc_position(&WrappedMove(&m), 500.0)
    }

    // Sample one move between move-relative times start and end
    fn sample_range(&mut self, m: &Move, start: f64, end: f64, out: &mut Vec<Sample>) {
        for t in sample_times(start, end, self.sample_time) {
            self.commit(m, t, out);
        }
        tracing::trace!(
            print_time = m.print_time,
            start,
            end,
            commanded_pos = self.kin.commanded_pos(),
            "sampled move"
        );
    }

    fn commit(&mut self, m: &Move, move_time: f64, out: &mut Vec<Sample>) {
        let print_time = m.print_time + move_time;
        if self
            .last_sample_time
            .is_some_and(|last| print_time <= last + TIME_EPSILON)
        {
            return;
        }
        let position = self.kin.calc_position(&WrappedMove(m), move_time);
        self.kin.set_commanded_pos(position);
        if self.kin.has_post_step() {
            self.kin.post_step();
        }
        self.last_sample_time = Some(print_time);
        out.push(Sample {
            print_time,
            position,
        });
    }

    /// Sample every move this stepper is active on, from the previous
    /// flush time up to `flush_time`.
    pub fn sample(&mut self, trapq: &TrapQueue, flush_time: f64) -> Vec<Sample> {
        let last_flush_time = self.last_flush_time;
        self.last_flush_time = flush_time;

        let flags = self.kin.active_flags();
        let mut out = Vec::new();
        for m in trapq.active_moves() {
            if m.end_time() <= last_flush_time {
                continue;
            }
            if m.print_time > flush_time {
                break;
            }
            if !m.is_active(flags) {
                // This move doesn't impact this stepper - skip it
                continue;
            }
            let start = (last_flush_time - m.print_time).max(0.0);
            let end = (flush_time - m.print_time).min(m.move_t);
            if end < start {
                continue;
            }
            self.sample_range(m, start, end, &mut out);
        }
        out
    }
}

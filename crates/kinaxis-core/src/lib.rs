//! Per-axis position extraction for stepper motion planning.
//!
//! This crate intentionally avoids any transport- or MCU-specific
//! dependencies.

pub mod kinematics;
pub mod rot_axis_adjust;
pub mod sampler;
pub mod trap_queue;

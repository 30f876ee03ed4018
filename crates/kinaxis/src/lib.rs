//! Configuration and command line front end for the kinaxis stepper
//! kinematics.

pub mod cli;
pub mod config;

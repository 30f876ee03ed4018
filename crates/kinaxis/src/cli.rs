pub mod rot_adjust;
pub mod sample;

use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use kinaxis_core::rot_axis_adjust::{ProbePoint, RotAxisError, plan_correction};
use std::path::PathBuf;

#[derive(Args)]
pub struct RotAdjustArgs {
    /// Path to the configuration file (TOML or JSON).
    pub config: PathBuf,

    /// Probed z height at each configured point, in order.
    #[arg(long = "z", required = true, allow_negative_numbers = true)]
    pub heights: Vec<f64>,

    /// Current rotary axis position in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub position: f64,
}

impl RotAdjustArgs {
    pub fn run(&self) -> Result<()> {
        let config = Config::from_file(&self.config)?;
        config.validate()?;

        let adjust = config
            .rot_axis_adjust
            .as_ref()
            .context("config has no [rot_axis_adjust] section")?;
        let points = adjust.probe_points(&self.heights)?;

        println!("{}", report(&points, self.position)?);
        Ok(())
    }
}

/// Describe the correction for the given probe results.
///
/// A correction that is too large is reported, not treated as a failure.
pub fn report(points: &[ProbePoint], position: f64) -> Result<String> {
    let mut lines: Vec<String> = points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("pos{} : y={:.1}, z={:.5}", i + 1, p.y, p.z))
        .collect();

    match plan_correction(points, position) {
        Ok(c) => {
            lines.push(format!("rotary correction: {:.3} deg", c.correction));
            lines.push(format!("axis before: {:.3}", c.before));
            lines.push(format!("axis after: {:.3}", c.after));
            lines.push("re-zero the rotary axis at this position".to_string());
        }
        Err(err @ RotAxisError::CorrectionTooLarge { .. }) => {
            tracing::warn!("{err}");
            lines.push(err.to_string());
        }
        Err(err) => return Err(err.into()),
    }

    Ok(lines.join("\n"))
}

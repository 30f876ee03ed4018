use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use kinaxis_core::{
    sampler::{Sample, Sampler},
    trap_queue::Coord,
};
use std::path::PathBuf;

/// Prints each stepper's committed positions along the configured moves.
///
/// Rotary positions are continuous relative to the stepper's commanded
/// angle, which is folded back into [-180, 180] after every sample. Once
/// a fold happens the printed positions continue in the new frame, so the
/// output can show an apparent jump of a whole turn less the step taken.
#[derive(Args)]
pub struct SampleArgs {
    /// Path to the configuration file (TOML or JSON).
    pub config: PathBuf,

    /// Sample up to this print time.
    ///
    /// Defaults to the end of the last configured move.
    #[arg(long)]
    pub flush_time: Option<f64>,
}

impl SampleArgs {
    pub fn run(&self) -> Result<()> {
        let config = Config::from_file(&self.config)?;
        config.validate()?;

        let flush_time = self.flush_time.unwrap_or_else(|| config.end_time());
        tracing::info!(
            "Sampling {} steppers over {} moves up to {flush_time}",
            config.steppers.len(),
            config.moves.len()
        );

        for (name, samples) in sample_config(&config, flush_time)? {
            if !samples.is_empty() {
                println!("{}", render_samples(&name, &samples));
            }
        }

        Ok(())
    }
}

/// Run every configured stepper over the configured moves
pub fn sample_config(config: &Config, flush_time: f64) -> Result<Vec<(String, Vec<Sample>)>> {
    let mut trapq = config.build_trap_queue();
    let start = Coord::from(config.toolhead.position);

    let runs = config
        .build_steppers()?
        .into_iter()
        .map(|(name, kin)| {
            let mut sampler = Sampler::new(kin, config.sampling.interval)
                .with_context(|| format!("failed to set up sampling for {name}"))?;
            sampler.set_position(start);
            let samples = sampler.sample(&trapq, flush_time);
            tracing::debug!(
                stepper = %name,
                samples = samples.len(),
                commanded_pos = sampler.commanded_pos(),
                "sampled stepper"
            );
            Ok((name, samples))
        })
        .collect::<Result<Vec<_>>>()?;

    trapq.finalize_moves(flush_time);
    tracing::debug!(pending = trapq.active_len(), "finalized moves up to {flush_time}");

    Ok(runs)
}

/// One `name time position` line per sample
pub fn render_samples(name: &str, samples: &[Sample]) -> String {
    samples
        .iter()
        .map(|s| format!("{name} {:.3} {:.3}", s.print_time, s.position))
        .collect::<Vec<_>>()
        .join("\n")
}

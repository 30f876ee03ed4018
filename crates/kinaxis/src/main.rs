use anyhow::Result;
use clap::{Parser, Subcommand};
use kinaxis::cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Sample(args) => args.run(),
        Command::RotAdjust(args) => args.run(),
    }
}

#[derive(Parser)]
#[command(name = "kinaxis", about = "Per-axis stepper kinematics tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample every configured stepper's position along the configured moves.
    ///
    /// A rotary stepper's commanded angle is folded into [-180, 180] after
    /// every sample, and later positions are printed in the folded frame.
    /// Consecutive lines can therefore differ by nearly a whole turn while
    /// the stepper itself only moved by the sampled step.
    Sample(cli::sample::SampleArgs),
    /// Compute the rotary axis alignment from two probed heights.
    RotAdjust(cli::rot_adjust::RotAdjustArgs),
}

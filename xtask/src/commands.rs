use anyhow::Result;
use clap::{Args, Subcommand};
use xshell::{Shell, cmd};

#[derive(Subcommand)]
pub enum Command {
    /// Check formatting, run clippy and run the test suite
    Ci,
    /// Apply rustfmt to all files, or only check with `--check`
    Fmt(Fmt),
    /// Run clippy with warnings denied
    Clippy,
    /// Run the workspace tests
    Test(Test),
}

#[derive(Args)]
pub struct Fmt {
    #[arg(long)]
    check: bool,
}

#[derive(Args, Default)]
pub struct Test {
    /// Only test this package
    #[arg(long, short)]
    package: Option<String>,

    /// Additional arguments to pass to cargo test
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Command {
    pub fn run(self, sh: &Shell) -> Result<()> {
        match self {
            Command::Ci => {
                Fmt { check: true }.run(sh)?;
                clippy(sh)?;
                Test::default().run(sh)?;
                eprintln!("CI checks passed!");
                Ok(())
            }
            Command::Fmt(cmd) => cmd.run(sh),
            Command::Clippy => clippy(sh),
            Command::Test(cmd) => cmd.run(sh),
        }
    }
}

impl Fmt {
    fn run(&self, sh: &Shell) -> Result<()> {
        if self.check {
            eprintln!("Running cargo fmt check...");
            cmd!(sh, "cargo fmt --all -- --check").run()?;
        } else {
            eprintln!("Applying cargo fmt...");
            cmd!(sh, "cargo fmt --all").run()?;
        }
        Ok(())
    }
}

impl Test {
    fn run(&self, sh: &Shell) -> Result<()> {
        eprintln!("Running cargo test...");
        let scope = match &self.package {
            Some(package) => vec!["--package".to_string(), package.clone()],
            None => vec!["--workspace".to_string()],
        };
        let args = &self.args;
        cmd!(sh, "cargo test {scope...} {args...}").run()?;
        Ok(())
    }
}

fn clippy(sh: &Shell) -> Result<()> {
    eprintln!("Running cargo clippy...");
    cmd!(
        sh,
        "cargo clippy --all-features --all-targets --workspace -- -D warnings"
    )
    .run()?;
    Ok(())
}

//! SLS constraint generation CLI.
//!
//! Provides two modes of operation:
//! - `generate`: Load a synthesis config, run its generators and print a
//!   summary of the resulting problem
//! - `info`: Print workspace crate versions

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use sls_constraints::{ConstraintGenerator, SlsConstraint, SupportPattern, apply_all};
use sls_core::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Localized System Level Synthesis constraint generator.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the problem described by a config file and report what each
    /// generator contributed.
    Generate {
        /// Path to a TOML synthesis config.
        #[arg(short, long)]
        config: PathBuf,

        /// Override the configured horizon.
        #[arg(short = 't', long)]
        horizon: Option<usize>,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_generate(path: &Path, horizon: Option<usize>) -> Result<(), SlsError> {
    let mut config = SynthesisConfig::from_file(path)?;
    if let Some(horizon) = horizon {
        config.horizon = horizon;
        config.validate()?;
    }

    let model = config.system.to_model()?;
    let mut problem = SlsProblem::new(model, config.horizon)?;
    info!(
        nx = problem.nx(),
        nu = problem.nu(),
        horizon = problem.horizon(),
        generators = config.constraints.len(),
        "Loaded synthesis config"
    );

    let mut generators = config
        .constraints
        .iter()
        .map(SlsConstraint::from_config)
        .collect::<Result<Vec<_>, _>>()?;

    let (objective, constraints) =
        apply_all(&mut generators, &mut problem, ConvexExpr::zero(), Vec::new())?;

    println!(
        "plant: nx={}, nu={}, horizon={}",
        problem.nx(),
        problem.nu(),
        problem.horizon()
    );
    for (i, g) in generators.iter().enumerate() {
        let params = match g {
            SlsConstraint::Base(_) => None,
            SlsConstraint::Localized(l) => Some(*l.params()),
            SlsConstraint::ApproxLocalized(a) => Some(*a.params()),
        };
        match params {
            Some(p) => {
                let pattern = SupportPattern::compute(problem.model(), problem.horizon(), &p);
                let densities: Vec<String> = (0..pattern.horizon())
                    .map(|t| format!("{:.2}", pattern.x_density(t)))
                    .collect();
                println!(
                    "  [{i}] {}: d={}, delay={}, speed={}, support_x density=[{}]",
                    g.name(),
                    p.locality(),
                    p.act_delay(),
                    p.comm_speed(),
                    densities.join(", ")
                );
            }
            None => println!("  [{i}] {}", g.name()),
        }
    }

    let scalar_rows: usize = constraints.iter().map(Constraint::scalar_count).sum();
    let entry_zeros = constraints
        .iter()
        .filter(|c| matches!(c, Constraint::EntryZero(_)))
        .count();
    println!(
        "constraints: total={}, entry_zero={entry_zeros}, scalar_rows={scalar_rows}",
        constraints.len()
    );
    println!(
        "objective: terms={}, variables={}",
        objective.term_count(),
        problem.variable_count()
    );
    if let Some(last) = generators.iter().rev().find_map(SlsConstraint::stability_margin) {
        println!("stability margin: {} term(s)", last.term_count());
    }
    Ok(())
}

fn run_info() {
    println!("sls v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  sls-core        {}", env!("CARGO_PKG_VERSION"));
    println!("  sls-constraints {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config, horizon } => match run_generate(&config, horizon) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(config = %config.display(), "{e}");
                ExitCode::FAILURE
            }
        },
        Commands::Info => {
            run_info();
            ExitCode::SUCCESS
        }
    }
}

//! wavemix-fit CLI
//!
//! Fit the combined-waveform model to tables sampled from real chips.
//!
//! # Usage
//!
//! ```bash
//! # Search for chip D, sawtooth+triangle, printing paste-ready seed lines
//! wavemix-fit fit 3 D --format snippet
//!
//! # Reproducible bounded run on 4 threads, saving a JSON report
//! wavemix-fit fit pst E --seed 1 --iterations 100000 --jobs 4 --report out/E-7.json
//!
//! # Score the catalog seed, overriding one parameter, with a per-counter dump
//! wavemix-fit score 6 G --distance 0.02 --dump
//!
//! # Write the built-in seed catalog for editing, then list it
//! wavemix-fit --seeds seeds.yaml init
//! wavemix-fit --seeds seeds.yaml seeds
//! ```

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wavemix::{CombinationCode, PerturbationPolicy};
use wavemix_fit::{
    config::SeedCatalog,
    reference::ChipId,
    report::{catalog_table, trace_lines, ReportFormat},
    runner::{FitRunner, ParameterOverrides, RunnerConfig},
};

#[derive(Parser)]
#[command(name = "wavemix-fit")]
#[command(about = "Fit the combined-waveform mixing model to sampled chip tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory containing WAVE3.CSV .. WAVE7.CSV
    #[arg(long, default_value = "sidwaves", global = true)]
    data_dir: PathBuf,

    /// Seed catalog YAML (built-in seeds when absent)
    #[arg(long, global = true)]
    seeds: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for better parameters
    Fit {
        /// Combination code (3, 5, 6, 7 or st, pt, ps, pst)
        code: CombinationCode,

        /// Chip letter selecting the CSV column
        chip: ChipId,

        /// Perturbation policy
        #[arg(long, default_value = "discrete")]
        policy: PerturbationPolicy,

        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this many candidates (default: run until interrupted)
        #[arg(long)]
        iterations: Option<u64>,

        /// Worker threads
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Output JSON report path, written when the search ends
        #[arg(long)]
        report: Option<PathBuf>,

        /// Improvement stream format
        #[arg(long, default_value = "text")]
        format: ReportFormat,
    },

    /// Score the seed once against the measured table
    Score {
        code: CombinationCode,
        chip: ChipId,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Print one line per counter value
        #[arg(long, short = 'd')]
        dump: bool,
    },

    /// Write the simulated table of the seed as a CSV
    Render {
        code: CombinationCode,
        chip: ChipId,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// Output CSV path
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// List the seed catalog
    Seeds,

    /// Write the built-in seed catalog to --seeds
    Init,
}

#[derive(Args)]
struct OverrideArgs {
    #[arg(long)]
    bias: Option<f32>,
    #[arg(long)]
    pulse_strength: Option<f32>,
    #[arg(long)]
    top_bit: Option<f32>,
    #[arg(long)]
    distance: Option<f32>,
    #[arg(long)]
    stmix: Option<f32>,
}

impl From<&OverrideArgs> for ParameterOverrides {
    fn from(args: &OverrideArgs) -> Self {
        Self {
            bias: args.bias,
            pulse_strength: args.pulse_strength,
            top_bit: args.top_bit,
            distance: args.distance,
            stmix: args.stmix,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Fit {
            code,
            chip,
            policy,
            seed,
            iterations,
            jobs,
            report,
            format,
        } => {
            let config = RunnerConfig {
                data_dir: cli.data_dir.clone(),
                seeds_path: cli.seeds.clone(),
                policy: *policy,
                rng_seed: *seed,
                max_iterations: *iterations,
                jobs: *jobs,
                format: *format,
                echo: true,
            };
            run_fit(config, *code, *chip, report.as_ref())?;
        }
        Commands::Score {
            code,
            chip,
            overrides,
            dump,
        } => {
            score_seed(&cli, *code, *chip, &overrides.into(), *dump)?;
        }
        Commands::Render {
            code,
            chip,
            overrides,
            out,
        } => {
            let runner = FitRunner::new(base_config(&cli))?;
            runner.render(*code, *chip, &overrides.into(), out)?;
            println!("{} Wrote {}", "✓".green(), out.display());
        }
        Commands::Seeds => {
            let catalog = SeedCatalog::load_or_builtin(cli.seeds.as_deref())?;
            println!("{}", catalog_table(&catalog));
        }
        Commands::Init => {
            let path = cli
                .seeds
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("init needs --seeds <path> to write to"))?;
            if path.exists() {
                println!("{} {} already exists", "⚠".yellow(), path.display());
                return Ok(());
            }
            SeedCatalog::builtin().save(path)?;
            println!("{} Created {}", "✓".green(), path.display());
        }
    }

    Ok(())
}

fn setup_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn base_config(cli: &Cli) -> RunnerConfig {
    RunnerConfig {
        data_dir: cli.data_dir.clone(),
        seeds_path: cli.seeds.clone(),
        ..RunnerConfig::default()
    }
}

fn run_fit(
    config: RunnerConfig,
    code: CombinationCode,
    chip: ChipId,
    report_path: Option<&PathBuf>,
) -> anyhow::Result<()> {
    println!(
        "{} Fitting chip {} combination {} ({} policy)...\n",
        "▶".blue(),
        chip,
        code,
        config.policy
    );
    let runner = FitRunner::new(config)?;
    let report = runner.fit(code, chip)?;
    report.print_summary();

    if let Some(path) = report_path {
        report.save_json(path)?;
        println!("{} Report saved to {}", "✓".green(), path.display());
    }
    Ok(())
}

fn score_seed(
    cli: &Cli,
    code: CombinationCode,
    chip: ChipId,
    overrides: &ParameterOverrides,
    dump: bool,
) -> anyhow::Result<()> {
    let runner = FitRunner::new(base_config(cli))?;
    let outcome = runner.score(code, chip, overrides, dump)?;

    if let Some(rows) = &outcome.trace {
        print!("{}", trace_lines(rows));
    }
    println!(
        "{} Chip {} combination {}: score {}",
        "▶".blue(),
        chip,
        code,
        outcome.score.to_string().bold()
    );
    println!("  {}", outcome.params);
    Ok(())
}

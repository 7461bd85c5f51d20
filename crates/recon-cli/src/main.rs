use std::error::Error;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use commands::describe::{self, DescribeArgs};
use recon_report::{load_config, EvalContext, ReconConfig, ResultSource};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "recon", about = "Reconfiguration benchmark evaluation datasets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the dataset of a single evaluation.
    Run(RunArgs),
    /// Build the datasets of every evaluation.
    All(SourceArgs),
    /// Print the descriptor driving an evaluation.
    Describe(DescribeArgs),
}

/// Options selecting the result set and configuration.
#[derive(ClapArgs, Debug)]
pub struct SourceArgs {
    /// Read the precomputed results instead of a fresh benchmark run.
    #[arg(long)]
    pub pre: bool,
    /// YAML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Evaluation root holding the `result_<N>` folders.
    #[arg(long)]
    pub root: Option<PathBuf>,
    /// Fixed number of decimals in the exported table.
    #[arg(long)]
    pub precision: Option<usize>,
}

impl SourceArgs {
    /// Builds the run context: config file first, then command-line overrides.
    pub fn context(&self) -> Result<EvalContext, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ReconConfig::default(),
        };
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if self.precision.is_some() {
            config.output.precision = self.precision;
        }
        let source = if self.pre {
            ResultSource::Precomputed
        } else {
            ResultSource::Fresh
        };
        Ok(EvalContext::new(&config, source)?)
    }
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// Evaluation identifier (1, 2, 3, 5, 6, 7, 8, 9, 10, 11).
    evaluation: String,
    #[command(flatten)]
    source: SourceArgs,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => commands::run::run_one(&args.evaluation, &args.source),
        Command::All(args) => commands::run::run_every(&args),
        Command::Describe(args) => describe::run(&args),
    }
}

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use fragment_cli::{Pipeline, PipelineConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fragments")]
#[command(about = "Extract inline test fragments into loadable modules", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: <root>/fragments.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root (overrides the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every test file and update the registry
    Extract(ExtractArgs),

    /// Analyze one file and print the result as JSON
    Inspect(InspectArgs),

    /// Recreate an empty registry
    Reset,

    /// Print the effective configuration as TOML
    #[command(name = "show-config")]
    ShowConfig,
}

#[derive(Args)]
struct ExtractArgs {
    /// Reset the registry before extracting
    #[arg(long)]
    reset: bool,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Test file to analyze
    file: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let mut config = PipelineConfig::discover(&root, cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.project_root = root;
    }

    match cli.command {
        Commands::ShowConfig => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Reset => {
            Pipeline::new(config)?.prepare(true)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inspect(args) => {
            let analysis = Pipeline::new(config)?.inspect(&args.file)?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Extract(args) => {
            let report = Pipeline::new(config)?.extract_all(args.reset)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

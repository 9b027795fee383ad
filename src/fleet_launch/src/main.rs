//! fleet_launch CLI

use clap::{Parser, Subcommand, ValueEnum};
use fleet_launch::{compose_program, launch_record, load_configuration};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    process,
};

#[derive(Parser)]
#[command(name = "fleet_launch")]
#[command(about = "Compose multi-robot Gazebo simulation bringups for ROS 2", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(clap::Args)]
struct FleetArgs {
    /// Number of robots (default: from the config file, else 2)
    #[arg(short, long, allow_negative_numbers = true)]
    robots: Option<i64>,

    /// YAML file with the shared settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bringup package share directory (default: $(find-pkg-share multirobots_gazebo))
    #[arg(long)]
    share_dir: Option<PathBuf>,

    /// Launch arguments (key:=value)
    #[arg(value_parser = parse_launch_arg)]
    args: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the composed, unevaluated launch description
    Plan {
        #[command(flatten)]
        fleet: FleetArgs,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate the composition into records for the launcher
    Record {
        #[command(flatten)]
        fleet: FleetArgs,

        /// Output file path (default: record.json)
        #[arg(short, long, default_value = "record.json")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn parse_launch_arg(s: &str) -> Result<(String, String), String> {
    match s.split_once(":=") {
        Some((key, value)) if !key.is_empty() && !value.contains(":=") => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid launch argument format: {}", s)),
    }
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Plan {
            fleet,
            format,
            output,
        } => plan(fleet, format, output.as_deref()),
        Commands::Record { fleet, output } => record(fleet, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn plan(
    fleet: FleetArgs,
    format: Format,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_configuration(fleet.config.as_deref(), fleet.share_dir, &fleet.args)?;
    let count = fleet.robots.unwrap_or(config.robots);
    let program = compose_program(count, &config)?;

    let text = match format {
        Format::Json => serde_json::to_string_pretty(&program)?,
        Format::Yaml => serde_yaml::to_string(&program)?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            log::info!("Wrote launch plan for {} robot(s): {}", count, path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn record(fleet: FleetArgs, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_configuration(fleet.config.as_deref(), fleet.share_dir, &fleet.args)?;
    let count = fleet.robots.unwrap_or(config.robots);

    // Every launch argument reaches the evaluator, shared setting or not
    let launch_args: HashMap<String, String> = fleet.args.into_iter().collect();
    let record = launch_record(count, &config, launch_args)?;

    let json = record.to_json()?;
    std::fs::write(output, json)?;

    log::info!("Generated record.json: {}", output.display());
    log::info!(
        "  {} processes, {} external includes, {} log messages",
        record.node.len(),
        record.include.len(),
        record.log.len()
    );

    Ok(())
}

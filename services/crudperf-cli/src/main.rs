use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod run;
mod template;

use run::{check_target, run_suite, RunArgs};

#[derive(Parser, Debug)]
#[command(name = "crudperf")]
#[command(about = "Resource-monitored performance harness for CRUD REST services", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the workload matrix against the target and export the results
    Run(RunArgs),

    /// Check whether the target service responds
    Check {
        /// Configuration file (TOML, YAML or JSON)
        #[arg(long, env = "CRUDPERF_CONFIG")]
        config: Option<PathBuf>,

        /// Base URL of the target REST API
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Write a configuration template
    GenerateConfig {
        /// Output file path
        #[arg(short, long, default_value = "crudperf.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_suite(args).await,
        Commands::Check { config, base_url } => check_target(config, base_url).await,
        Commands::GenerateConfig { output } => {
            std::fs::write(&output, template::CONFIG_TEMPLATE)?;
            println!("Configuration template written to: {}", output.display());
            println!("\nEdit the file and use it with:");
            println!("  crudperf run --config {}", output.display());

            Ok(())
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).with_target(false).init();
}

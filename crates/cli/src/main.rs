mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Content staging: export snapshots and compile migration plans.
#[derive(Parser)]
#[command(
    name = "staging",
    version,
    about = "Content staging: export snapshots and compile migration plans"
)]
struct Cli {
    /// Staging configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export repository content into the snapshot tree
    Export {
        /// Host schema JSON document
        #[arg(long)]
        schema: PathBuf,
        /// Repository dump JSON file
        #[arg(long)]
        repository: PathBuf,
        /// Only export this bundle
        #[arg(long)]
        bundle: Option<String>,
        /// Directory holding asset binaries (overrides the dump's files_root)
        #[arg(long)]
        files_root: Option<PathBuf>,
    },

    /// Discard and rebuild the migration plan from the snapshot tree
    Plan {
        /// Host schema JSON document
        #[arg(long)]
        schema: PathBuf,
        /// Directory receiving one JSON record per migration unit
        #[arg(long)]
        plan_dir: PathBuf,
    },

    /// Print the normalized rows of a snapshot file
    Normalize {
        /// Snapshot JSON file
        snapshot: PathBuf,
        /// Directory assets were copied to (default: <staging>/files)
        #[arg(long)]
        files_dir: Option<PathBuf>,
    },

    /// Print the effective staging configuration
    ShowConfig,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let loaded = match config::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Export {
            schema,
            repository,
            bundle,
            files_root,
        } => {
            commands::export::cmd_export(
                &loaded,
                commands::export::ExportArgs {
                    schema: &schema,
                    repository: &repository,
                    bundle: bundle.as_deref(),
                    files_root: files_root.as_deref(),
                },
                cli.output,
                cli.quiet,
            );
        }
        Commands::Plan { schema, plan_dir } => {
            commands::plan::cmd_plan(&loaded, &schema, &plan_dir, cli.output, cli.quiet);
        }
        Commands::Normalize {
            snapshot,
            files_dir,
        } => {
            commands::normalize::cmd_normalize(
                &loaded,
                &snapshot,
                files_dir.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::ShowConfig => {
            commands::show_config::cmd_show_config(&loaded, cli.output);
        }
    }
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "staging=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pulseops_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "pulseops",
    about = "PulseOps operator CLI",
    long_about = "Inspect configuration, prepare the client database, report portfolio health, and query the dashboard assistant.",
    after_help = "Examples:\n  pulseops doctor --json\n  pulseops seed\n  pulseops report\n  pulseops ask --role it how do I add users"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a pulseops.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate config, database connectivity, and store readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Replace database contents with the demo client portfolio")]
    Seed,
    #[command(about = "Summarize portfolio health, risk, and active alerts")]
    Report {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Ask the dashboard assistant a question")]
    Ask {
        #[arg(long, default_value = "msp", help = "Dashboard role: msp or it")]
        role: String,
        #[arg(trailing_var_arg = true)]
        question: Vec<String>,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            ..LoadOptions::default()
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();
    init_logging(&options);

    let result = match cli.command {
        Command::Doctor { json } => commands::doctor::run(&options, json),
        Command::Config => commands::config::run(&options),
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed => commands::seed::run(&options),
        Command::Report { json } => commands::report::run(&options, json),
        Command::Ask { role, question } => commands::ask::run(&role, &question.join(" ")),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays parseable. A config that fails to load
/// falls back to warn-level compact output; the command reports the failure.
fn init_logging(options: &LoadOptions) {
    use tracing::Level;

    let (level, format) = match AppConfig::load(options.clone()) {
        Ok(config) => {
            (config.logging.level.parse::<Level>().unwrap_or(Level::WARN), config.logging.format)
        }
        Err(_) => (Level::WARN, LogFormat::Compact),
    };

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level);
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

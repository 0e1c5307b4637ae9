use anyhow::Result;
use cambio::core::log::init_logging;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for cambio::AppCommand {
    fn from(cmd: Commands) -> cambio::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                cambio::AppCommand::Convert { amount, from, to }
            }
            Commands::Rate { from, to } => cambio::AppCommand::Rate { from, to },
            Commands::List => cambio::AppCommand::List,
            Commands::Interactive => cambio::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount, with comma or period as decimal separator
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Source currency code (defaults to the configured one)
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency code (defaults to the configured one)
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Display the exchange rate between two currencies
    Rate {
        #[arg(short, long)]
        from: String,
        #[arg(short, long)]
        to: String,
    },
    /// List available currencies
    List,
    /// Start the interactive converter (default)
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Interactive);
    let result = match command {
        Commands::Setup => cambio::cli::setup::setup(),
        cmd => cambio::run_command(cmd.into(), cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

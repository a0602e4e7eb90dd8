use anyhow::Result;
use cambio::core::currency::Currency;
use cambio::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

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
            Commands::Rates => cambio::AppCommand::Rates,
            Commands::Convert {
                amount,
                from,
                to,
                save,
            } => cambio::AppCommand::Convert {
                amount,
                from,
                to,
                save,
            },
            Commands::History { limit } => cambio::AppCommand::History { limit },
            Commands::Interactive => cambio::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display current exchange rates
    Rates,
    /// Convert an amount between currencies
    Convert {
        /// Amount in the source currency
        amount: String,
        /// Source currency (BRL, USD or EUR)
        #[arg(short, long)]
        from: Option<Currency>,
        /// Target currency (BRL, USD or EUR)
        #[arg(short, long)]
        to: Option<Currency>,
        /// Record the conversion in the history
        #[arg(short, long)]
        save: bool,
    },
    /// Display recent conversions
    History {
        /// Maximum number of conversions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Start an interactive converter session
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cambio::cli::setup::setup(),
        Some(cmd) => cambio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "washday", version, about = "Washday laundry tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wash and dry countdowns
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Wardrobe management
    Item {
        #[command(subcommand)]
        action: commands::item::ItemAction,
    },
    /// Supply inventory
    Supply {
        #[command(subcommand)]
        action: commands::supply::SupplyAction,
    },
    /// Completed cycles, most recent first
    History(commands::history::HistoryArgs),
    /// Wash statistics and achievements
    Stats,
    /// Pending completion alerts
    Alerts,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Delete all items, supplies, history and timer state
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    // Logs go to stderr; stdout carries JSON.
    let filter = EnvFilter::try_from_env("WASHDAY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("washday_core=warn,washday_cli=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Item { action } => commands::item::run(action),
        Commands::Supply { action } => commands::supply::run(action),
        Commands::History(args) => commands::history::run(args),
        Commands::Stats => commands::stats::run(),
        Commands::Alerts => commands::alerts::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reset { yes } => commands::reset::run(yes),
        Commands::Completions { shell } => {
            commands::completions::run::<Cli>(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

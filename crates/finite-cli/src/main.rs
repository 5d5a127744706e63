use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod notifier;

#[derive(Parser)]
#[command(name = "finite-cli", version, about = "Finite life countdown CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the life countdown and every saved event as JSON
    Status,
    /// Live countdown, one JSON line per second
    Watch {
        /// Event ID to watch (default: the life countdown)
        #[arg(long)]
        event: Option<String>,
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Countdown event management
    Event {
        #[command(subcommand)]
        action: commands::event::EventAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Life progress reminders
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FINITE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status => commands::status::run(),
        Commands::Watch { event, ticks } => commands::watch::run(event, ticks),
        Commands::Event { action } => commands::event::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

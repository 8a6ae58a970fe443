use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "timewell-cli", version, about = "Timewell CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Running timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Pomodoro phase machine
    Pomodoro {
        #[command(subcommand)]
        action: commands::pomodoro::PomodoroAction,
    },
    /// Daily log management
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Streak statistics
    Streaks(commands::streaks::StreaksArgs),
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Pomodoro { action } => commands::pomodoro::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Streaks(args) => commands::streaks::run(args),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

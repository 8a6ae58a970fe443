use clap::Subcommand;
use timewell_core::{Clock, Config, Database, DayKey, SystemClock};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Session totals for the rollover-adjusted today
    Today,
    /// Session totals for a specific day key (YYYY-MM-DD)
    Day {
        /// Day key
        date: String,
    },
    /// All-time session totals
    All,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today => {
            let rollover = Config::load()?.rollover_hour();
            let today = DayKey::resolve_ms(SystemClock.now_ms(), rollover);
            let stats = db.day_stats(today)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Day { date } => {
            let day: DayKey = date.parse()?;
            let stats = db.day_stats(day)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::All => {
            let stats = db.total_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

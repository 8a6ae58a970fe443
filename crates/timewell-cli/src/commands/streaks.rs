use clap::Args;
use timewell_core::{compute_streaks, Clock, Config, Database, DayKey, SubjectId, SystemClock};

#[derive(Args)]
pub struct StreaksArgs {
    /// Trackable subject
    pub subject: String,
    /// Window length in days
    #[arg(long, default_value = "30")]
    pub window: u32,
    /// Window end day key (YYYY-MM-DD); defaults to the rollover-adjusted
    /// today
    #[arg(long)]
    pub end: Option<String>,
}

pub fn run(args: StreaksArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;

    let end: DayKey = match args.end {
        Some(raw) => raw.parse()?,
        None => DayKey::resolve_ms(SystemClock.now_ms(), config.rollover_hour()),
    };
    let from = end.back(args.window.saturating_sub(1).into());
    let logs = db.daily_logs(&SubjectId::new(args.subject), from, end)?;
    let result = compute_streaks(&logs, end, args.window);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

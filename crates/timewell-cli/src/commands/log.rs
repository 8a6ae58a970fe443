use clap::Subcommand;
use timewell_core::{
    Clock, Config, DailyLog, Database, DayKey, LogOutcome, SubjectId, SystemClock,
};

#[derive(Subcommand)]
pub enum LogAction {
    /// Record (or overwrite) a daily log entry
    Record {
        /// Trackable subject
        subject: String,
        /// Day key (YYYY-MM-DD); defaults to the rollover-adjusted today
        #[arg(long)]
        date: Option<String>,
        /// Explicit completion flag
        #[arg(long)]
        done: Option<bool>,
        /// Numeric progress value (takes precedence over --done)
        #[arg(long)]
        value: Option<f64>,
        /// Target the value is compared against
        #[arg(long)]
        target: Option<f64>,
    },
    /// List a subject's logs over a trailing window
    List {
        /// Trackable subject
        subject: String,
        /// Window length in days
        #[arg(long, default_value = "30")]
        window: u32,
    },
}

fn today(rollover: timewell_core::RolloverHour) -> DayKey {
    DayKey::resolve_ms(SystemClock.now_ms(), rollover)
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;

    match action {
        LogAction::Record {
            subject,
            date,
            done,
            value,
            target,
        } => {
            let date_key = match date {
                Some(raw) => raw.parse()?,
                None => today(config.rollover_hour()),
            };
            let outcome = match value {
                Some(value) => LogOutcome::Measured {
                    value,
                    target: target.unwrap_or(value),
                },
                None => LogOutcome::Done {
                    done: done.unwrap_or(true),
                },
            };
            let log = DailyLog { date_key, outcome };
            db.upsert_daily_log(&SubjectId::new(subject), &log)?;
            println!("{}", serde_json::to_string_pretty(&log)?);
        }
        LogAction::List { subject, window } => {
            let end = today(config.rollover_hour());
            let from = end.back(window.saturating_sub(1).into());
            let logs = db.daily_logs(&SubjectId::new(subject), from, end)?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
    }
    Ok(())
}

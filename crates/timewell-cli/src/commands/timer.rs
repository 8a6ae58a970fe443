use clap::Subcommand;
use timewell_core::{
    Config, Database, RunningTimer, SubjectId, SystemClock, TimerId, TimerLedger, TimerMode,
};

use super::{kv_load, kv_store, print_events};

const LEDGER_KEY: &str = "running_timers";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a timer for a subject
    Start {
        /// Subject to time
        subject: String,
        /// Link this timer to the pomodoro machine
        #[arg(long)]
        pomodoro: bool,
    },
    /// Pause a running timer
    Pause {
        /// Timer id
        id: String,
    },
    /// Resume a paused timer
    Resume {
        /// Timer id
        id: String,
    },
    /// Stop a timer and commit it as a session
    Stop {
        /// Timer id
        id: String,
    },
    /// Drop a timer without recording a session
    Discard {
        /// Timer id
        id: String,
    },
    /// Print all running timers as JSON
    Status,
}

fn load_ledger(db: &Database) -> TimerLedger {
    let timers: Vec<RunningTimer> = kv_load(db, LEDGER_KEY, Vec::new());
    let mut ledger = TimerLedger::new(SystemClock::shared());
    ledger.restore(timers);
    ledger
}

fn save_ledger(db: &Database, ledger: &TimerLedger) -> Result<(), Box<dyn std::error::Error>> {
    kv_store(db, LEDGER_KEY, &ledger.snapshot())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut ledger = load_ledger(&db);

    match action {
        TimerAction::Start { subject, pomodoro } => {
            let mode = if pomodoro {
                TimerMode::Pomodoro
            } else {
                TimerMode::Normal
            };
            let id = ledger.start(SubjectId::new(subject), mode)?;
            print_events(&ledger.drain_events())?;
            println!("{}", serde_json::json!({ "timer_id": id }));
        }
        TimerAction::Pause { id } => {
            let id: TimerId = id.parse()?;
            ledger.pause(id)?;
            print_events(&ledger.drain_events())?;
        }
        TimerAction::Resume { id } => {
            let id: TimerId = id.parse()?;
            ledger.resume(id)?;
            print_events(&ledger.drain_events())?;
        }
        TimerAction::Stop { id } => {
            let id: TimerId = id.parse()?;
            let rollover = Config::load()?.rollover_hour();
            // The timer stays in the ledger if the insert fails.
            let session = ledger.stop_with(id, rollover, |s| {
                db.insert_session(s).map_err(Into::into)
            })?;
            print_events(&ledger.drain_events())?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        TimerAction::Discard { id } => {
            let id: TimerId = id.parse()?;
            ledger.discard(id)?;
            println!("{{\"type\": \"TIMER_DISCARDED\"}}");
        }
        TimerAction::Status => {
            println!("{}", serde_json::to_string_pretty(&ledger.status())?);
        }
    }

    save_ledger(&db, &ledger)?;
    Ok(())
}

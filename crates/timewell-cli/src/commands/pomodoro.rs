use clap::Subcommand;
use timewell_core::{Config, Database, PomodoroMachine, PomodoroState, SubjectId, SystemClock};

use super::{kv_load, kv_store, print_events};

const MACHINE_KEY: &str = "pomodoro";

#[derive(Subcommand)]
pub enum PomodoroAction {
    /// Start a pomodoro run for a subject
    Start {
        /// Subject the run is linked to
        subject: String,
    },
    /// Suspend ticking (phase and remaining time stay put)
    Pause,
    /// Resume ticking
    Resume,
    /// Complete the current phase immediately
    Skip,
    /// Return to idle and reset the session counter
    Stop,
    /// Advance the machine by one second (call from a 1s scheduler)
    Tick,
    /// Print machine state as JSON
    Status,
}

fn load_machine(db: &Database) -> PomodoroMachine {
    let state: PomodoroState = kv_load(db, MACHINE_KEY, PomodoroState::default());
    PomodoroMachine::from_state(SystemClock::shared(), state)
}

fn save_machine(db: &Database, machine: &PomodoroMachine) -> Result<(), Box<dyn std::error::Error>> {
    kv_store(db, MACHINE_KEY, machine.state())
}

pub fn run(action: PomodoroAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut machine = load_machine(&db);

    match action {
        PomodoroAction::Start { subject } => {
            let config = Config::load()?.pomodoro;
            machine.start(SubjectId::new(subject), Some(config))?;
            print_events(&machine.drain_events())?;
        }
        PomodoroAction::Pause => {
            machine.pause();
        }
        PomodoroAction::Resume => {
            machine.resume();
        }
        PomodoroAction::Skip => {
            machine.skip();
            print_events(&machine.drain_events())?;
        }
        PomodoroAction::Stop => {
            machine.stop();
            print_events(&machine.drain_events())?;
        }
        PomodoroAction::Tick => {
            machine.tick();
            print_events(&machine.drain_events())?;
        }
        PomodoroAction::Status => {
            println!("{}", serde_json::to_string_pretty(machine.state())?);
        }
    }

    save_machine(&db, &machine)?;
    Ok(())
}

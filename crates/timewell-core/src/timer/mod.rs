mod ledger;
mod session;

pub use ledger::{
    RunState, RunningTimer, SubjectId, TimerId, TimerLedger, TimerMode, TimerStatus,
};
pub use session::{SessionId, TimeSession};

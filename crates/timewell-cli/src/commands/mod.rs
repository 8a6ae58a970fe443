pub mod config;
pub mod log;
pub mod pomodoro;
pub mod stats;
pub mod streaks;
pub mod timer;

use timewell_core::{Database, Event};

/// Print drained events as pretty JSON, one object per event.
pub fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}

/// Load a JSON value from the kv store, falling back to a default on a
/// missing key or an unreadable payload.
pub fn kv_load<T: serde::de::DeserializeOwned>(db: &Database, key: &str, fallback: T) -> T {
    if let Ok(Some(raw)) = db.kv_get(key) {
        if let Ok(value) = serde_json::from_str(&raw) {
            return value;
        }
    }
    fallback
}

/// Persist a JSON value into the kv store.
pub fn kv_store<T: serde::Serialize>(
    db: &Database,
    key: &str,
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    db.kv_set(key, &serde_json::to_string(value)?)?;
    Ok(())
}

//! Schedule module for Dayplan
//!
//! Tasks indexed by date, with half-open interval overlap detection.

mod store;
mod task;

pub use store::{Insertion, ScheduleStore};
pub use task::{parse_time, Priority, Task, TaskStatus, MAX_DESCRIPTION_CHARS, TIME_FORMAT};

use std::sync::{Arc, Mutex};

/// Schedule handle shared between the CLI and the executors.
/// Each action holds the lock for its whole check-then-insert sequence.
pub type SharedSchedule = Arc<Mutex<ScheduleStore>>;

pub fn shared(store: ScheduleStore) -> SharedSchedule {
    Arc::new(Mutex::new(store))
}

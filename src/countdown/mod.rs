pub mod clock;
pub mod remaining;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use remaining::{tick, RemainingTime};
pub use scheduler::{CountdownEntry, CountdownScheduler};

//! Countdown timer.
//!
//! - `engine`: synchronous phase state machine emitting `TimerEvent`s
//! - `controller`: async tick driver owning the periodic task
//! - `pipeline`: routes terminal events to the recorder and dispatcher
//! - `clock`: wall-clock source for run timestamps

mod clock;
mod controller;
mod engine;
mod pipeline;

pub use clock::{Clock, MockClock, SystemClock};
pub use controller::{TimerController, TICK_PERIOD};
pub use engine::{TerminalRun, TimerEngine, TimerEvent};
pub use pipeline::SessionPipeline;

//! Session recording.
//!
//! While recording, a periodic tick checks the canvas changed flag and, when
//! set, appends one page to the running multi-page PDF. File work can run on
//! a tokio blocking task so the UI loop never waits on disk.

mod options;
mod recorder;
mod timer;
mod worker;

pub use options::{Preferences, SessionOptions, options_from_config};
pub use recorder::{RECORD_INDICATOR_DURATION, SessionRecorder, TickOutcome};
pub use timer::{ManualTicker, TickScheduler, TokioTicker};
pub use worker::{ExportDone, ExportJob, ExportWorker};

#[cfg(test)]
mod tests;

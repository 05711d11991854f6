//! # Recorder - estimator diagnostic logging
//!
//! Records the estimator's state, variances and heading diagnostics as a
//! delimited text table, one row per simulated epoch, plus a one-shot
//! textual dump of the active tuning-parameter set. The recorder never
//! touches the filter itself; it only reads through the
//! [`estimator::EstimatorQuery`] interface.
//!
//! The column layout of the table is fixed by the first row written and
//! consumed by downstream spreadsheet/plotting tooling, so it must stay
//! stable for the lifetime of a file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

mod format;
pub mod state_logger;

pub use state_logger::StateLogger;

/// Errors that can occur while recording.
///
/// Every variant is fatal for the simulation run: a hole in the recorded
/// data invalidates the run, so the driver is expected to report the
/// error and terminate instead of continuing without the log.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// The log destination could not be opened.
    #[error("can not open log destination {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A write to the already-open destination failed.
    #[error("can not write to output file: {0}")]
    Write(#[from] io::Error),
}

impl RecorderError {
    /// Whether the caller must stop the run. All recorder errors are
    /// fatal; the method keeps that contract explicit at call sites.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

/// Result type for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;

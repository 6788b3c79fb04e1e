//! Execution controller.
//!
//! A [`Model`] declares how many workers it needs and what each one runs.
//! [`Api`] launches them, and every worker reports to the controller through
//! its [`PerThread`] at checkpoints, where pause, breakpoint and abort
//! requests take effect.

pub mod api;
pub mod control;
pub mod model_base;
pub mod per_thread;
pub mod status;

pub use api::Api;
pub use control::{AbortReason, ControlState, MAXIMUM_NUMBER_THREADS};
pub use model_base::ModelBase;
pub use per_thread::PerThread;
pub use status::{NullStatus, RecordedEvent, RecordingStatus, Status, StatusEvent, StatusFanout, TracingStatus};

use crate::runtime::error::RuntimeResult;

/// A compiled model.
pub trait Model: Send + Sync + 'static {
    /// Worker count, between 1 and [`MAXIMUM_NUMBER_THREADS`].
    fn number_threads(&self) -> usize;

    /// Body of worker `thread_id`. Returning `Err(RuntimeError::Aborted)`
    /// from a checkpoint ends the worker as aborted; any other error aborts
    /// the whole run.
    fn run_thread(&self, thread_id: u32, per_thread: &mut PerThread) -> RuntimeResult<()>;
}

#[cfg(test)]
mod controller_test;

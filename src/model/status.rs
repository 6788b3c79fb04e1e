//! Status callbacks.
//!
//! Callbacks run on worker threads, one at a time and in the order the
//! transitions happened. No controller
//! lock is held while a callback runs, so a callback may query the [`Api`]
//! or issue control requests. Blocking on [`Api::wait_complete`] from a
//! callback never returns.

use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{api::Api, control::AbortReason};

pub trait Status: Send + Sync {
    fn started(&self, _api: &Api) {}

    fn finished(&self, _api: &Api) {}

    fn aborted(&self, _api: &Api, _reason: AbortReason, _operation: u64) {}

    fn paused_on_user_request(&self, _api: &Api, _operation: u64) {}

    fn paused_at_operation(&self, _api: &Api, _operation: u64) {}

    fn paused_on_variable_update(&self, _api: &Api, _operation: u64, _identifier: u64) {}

    fn resumed(&self, _api: &Api) {}

    fn thread_started(&self, _api: &Api, _thread_id: u32) {}

    fn thread_finished(&self, _api: &Api, _thread_id: u32) {}

    fn thread_paused(&self, _api: &Api, _thread_id: u32) {}

    fn thread_aborted(&self, _api: &Api, _thread_id: u32) {}
}

/// One status callback, as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    Started,
    Finished,
    Aborted { reason: AbortReason, operation: u64 },
    PausedOnUserRequest { operation: u64 },
    PausedAtOperation { operation: u64 },
    PausedOnVariableUpdate { operation: u64, identifier: u64 },
    Resumed,
    ThreadStarted { thread_id: u32 },
    ThreadFinished { thread_id: u32 },
    ThreadPaused { thread_id: u32 },
    ThreadAborted { thread_id: u32 },
}

impl StatusEvent {
    /// Invokes the matching callback on `status`.
    pub fn deliver(&self, status: &dyn Status, api: &Api) {
        match *self {
            StatusEvent::Started => status.started(api),
            StatusEvent::Finished => status.finished(api),
            StatusEvent::Aborted { reason, operation } => status.aborted(api, reason, operation),
            StatusEvent::PausedOnUserRequest { operation } => {
                status.paused_on_user_request(api, operation)
            }
            StatusEvent::PausedAtOperation { operation } => status.paused_at_operation(api, operation),
            StatusEvent::PausedOnVariableUpdate {
                operation,
                identifier,
            } => status.paused_on_variable_update(api, operation, identifier),
            StatusEvent::Resumed => status.resumed(api),
            StatusEvent::ThreadStarted { thread_id } => status.thread_started(api, thread_id),
            StatusEvent::ThreadFinished { thread_id } => status.thread_finished(api, thread_id),
            StatusEvent::ThreadPaused { thread_id } => status.thread_paused(api, thread_id),
            StatusEvent::ThreadAborted { thread_id } => status.thread_aborted(api, thread_id),
        }
    }
}

/// Status sink that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatus;

impl Status for NullStatus {}

/// Logs every callback through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatus;

impl Status for TracingStatus {
    fn started(&self, _api: &Api) {
        info!("run started");
    }

    fn finished(&self, _api: &Api) {
        info!("run finished");
    }

    fn aborted(&self, _api: &Api, reason: AbortReason, operation: u64) {
        warn!(%reason, operation, "run aborted");
    }

    fn paused_on_user_request(&self, _api: &Api, operation: u64) {
        info!(operation, "paused on user request");
    }

    fn paused_at_operation(&self, _api: &Api, operation: u64) {
        info!(operation, "paused at operation");
    }

    fn paused_on_variable_update(&self, _api: &Api, operation: u64, identifier: u64) {
        info!(operation, identifier, "paused on variable update");
    }

    fn resumed(&self, _api: &Api) {
        info!("resumed");
    }

    fn thread_started(&self, _api: &Api, thread_id: u32) {
        debug!(thread_id, "thread started");
    }

    fn thread_finished(&self, _api: &Api, thread_id: u32) {
        debug!(thread_id, "thread finished");
    }

    fn thread_paused(&self, _api: &Api, thread_id: u32) {
        debug!(thread_id, "thread paused");
    }

    fn thread_aborted(&self, _api: &Api, thread_id: u32) {
        debug!(thread_id, "thread aborted");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Microseconds since the recorder was created.
    pub elapsed_micros: u64,
    #[serde(flatten)]
    pub event: StatusEvent,
}

/// Collects every callback with a timestamp.
#[derive(Debug)]
pub struct RecordingStatus {
    origin: Instant,
    events: Mutex<Vec<RecordedEvent>>,
}

impl Default for RecordingStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, event: StatusEvent) {
        let elapsed_micros = self.origin.elapsed().as_micros() as u64;
        self.events.lock().push(RecordedEvent {
            elapsed_micros,
            event,
        });
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().iter().map(|r| r.event).collect()
    }

    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&StatusEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|r| matches(&r.event)).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.events.lock())
    }
}

impl Status for RecordingStatus {
    fn started(&self, _api: &Api) {
        self.record(StatusEvent::Started);
    }

    fn finished(&self, _api: &Api) {
        self.record(StatusEvent::Finished);
    }

    fn aborted(&self, _api: &Api, reason: AbortReason, operation: u64) {
        self.record(StatusEvent::Aborted { reason, operation });
    }

    fn paused_on_user_request(&self, _api: &Api, operation: u64) {
        self.record(StatusEvent::PausedOnUserRequest { operation });
    }

    fn paused_at_operation(&self, _api: &Api, operation: u64) {
        self.record(StatusEvent::PausedAtOperation { operation });
    }

    fn paused_on_variable_update(&self, _api: &Api, operation: u64, identifier: u64) {
        self.record(StatusEvent::PausedOnVariableUpdate {
            operation,
            identifier,
        });
    }

    fn resumed(&self, _api: &Api) {
        self.record(StatusEvent::Resumed);
    }

    fn thread_started(&self, _api: &Api, thread_id: u32) {
        self.record(StatusEvent::ThreadStarted { thread_id });
    }

    fn thread_finished(&self, _api: &Api, thread_id: u32) {
        self.record(StatusEvent::ThreadFinished { thread_id });
    }

    fn thread_paused(&self, _api: &Api, thread_id: u32) {
        self.record(StatusEvent::ThreadPaused { thread_id });
    }

    fn thread_aborted(&self, _api: &Api, thread_id: u32) {
        self.record(StatusEvent::ThreadAborted { thread_id });
    }
}

/// Forwards every callback to several sinks in order.
pub struct StatusFanout(pub Vec<std::sync::Arc<dyn Status>>);

impl Status for StatusFanout {
    fn started(&self, api: &Api) {
        self.0.iter().for_each(|s| s.started(api));
    }

    fn finished(&self, api: &Api) {
        self.0.iter().for_each(|s| s.finished(api));
    }

    fn aborted(&self, api: &Api, reason: AbortReason, operation: u64) {
        self.0.iter().for_each(|s| s.aborted(api, reason, operation));
    }

    fn paused_on_user_request(&self, api: &Api, operation: u64) {
        self.0
            .iter()
            .for_each(|s| s.paused_on_user_request(api, operation));
    }

    fn paused_at_operation(&self, api: &Api, operation: u64) {
        self.0.iter().for_each(|s| s.paused_at_operation(api, operation));
    }

    fn paused_on_variable_update(&self, api: &Api, operation: u64, identifier: u64) {
        self.0
            .iter()
            .for_each(|s| s.paused_on_variable_update(api, operation, identifier));
    }

    fn resumed(&self, api: &Api) {
        self.0.iter().for_each(|s| s.resumed(api));
    }

    fn thread_started(&self, api: &Api, thread_id: u32) {
        self.0.iter().for_each(|s| s.thread_started(api, thread_id));
    }

    fn thread_finished(&self, api: &Api, thread_id: u32) {
        self.0.iter().for_each(|s| s.thread_finished(api, thread_id));
    }

    fn thread_paused(&self, api: &Api, thread_id: u32) {
        self.0.iter().for_each(|s| s.thread_paused(api, thread_id));
    }

    fn thread_aborted(&self, api: &Api, thread_id: u32) {
        self.0.iter().for_each(|s| s.thread_aborted(api, thread_id));
    }
}

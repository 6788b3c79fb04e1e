//! Controller core shared by the host-facing [`Api`] and every worker.
//!
//! State transitions happen under one mutex. Status events are queued under
//! that mutex and delivered after it is released by whichever worker finds
//! the queue idle, so callbacks observe transitions in order without any
//! controller lock held. Events queued by the host (`resumed`) raise
//! [`DELIVER`] and wait for the next worker to wake or reach a checkpoint.

use std::{
    any::Any,
    collections::{BTreeSet, VecDeque},
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};

use parking_lot::{Condvar, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, info_span, trace, warn};

use crate::{
    model::{
        Model,
        api::Api,
        control::{
            ABORT, AbortReason, CHECKPOINT_BITS, ControlState, ControlWord, DELIVER,
            MAXIMUM_NUMBER_THREADS, PAUSE, RUN_TO, SINGLE_STEP, WATCH,
        },
        per_thread::PerThread,
        status::{NullStatus, Status, StatusEvent},
    },
    runtime::{
        error::{RuntimeError, RuntimeResult},
        identifier::IdentifierDatabase,
        rng::{PerThreadRng, RngSeed, RngType},
    },
};

/// What sent a worker into [`ModelBase::park`].
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Request,
    Operation,
    Variable(u64),
}

#[derive(Debug, Default)]
struct Breakpoints {
    operations: BTreeSet<u64>,
    run_to: Option<u64>,
    variables: BTreeSet<u64>,
}

impl Breakpoints {
    fn control_bits(&self) -> u64 {
        let mut bits = 0;
        if self.run_to.is_some() || !self.operations.is_empty() {
            bits |= RUN_TO;
        }
        if !self.variables.is_empty() {
            bits |= WATCH;
        }
        bits
    }
}

struct Inner {
    state: ControlState,
    status: Arc<dyn Status>,
    events: VecDeque<StatusEvent>,
    draining: bool,
    /// Whether the current pause has been announced.
    announced: bool,
    /// Bumped whenever parked workers must re-check the control word.
    generation: u64,
    started_workers: usize,
    abort_reason: Option<AbortReason>,
    abort_operation: Option<u64>,
    run_complete: bool,
}

pub struct ModelBase {
    model: Arc<dyn Model>,
    thread_count: usize,
    control: ControlWord,
    inner: Mutex<Inner>,
    condition: Condvar,
    breakpoints: RwLock<Breakpoints>,
    identifiers: RwLock<IdentifierDatabase>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl ModelBase {
    pub fn new(model: Arc<dyn Model>, identifiers: IdentifierDatabase) -> RuntimeResult<Self> {
        let thread_count = model.number_threads();
        if thread_count == 0 || thread_count > MAXIMUM_NUMBER_THREADS {
            return Err(RuntimeError::invalid_parameter(format!(
                "a model must use between 1 and {} threads, not {}",
                MAXIMUM_NUMBER_THREADS, thread_count
            )));
        }
        Ok(Self {
            model,
            thread_count,
            control: ControlWord::default(),
            inner: Mutex::new(Inner {
                state: ControlState::Idle,
                status: Arc::new(NullStatus),
                events: VecDeque::new(),
                draining: false,
                announced: false,
                generation: 0,
                started_workers: 0,
                abort_reason: None,
                abort_operation: None,
                run_complete: false,
            }),
            condition: Condvar::new(),
            breakpoints: RwLock::new(Breakpoints::default()),
            identifiers: RwLock::new(identifiers),
            workers: Mutex::new(Vec::new()),
        })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn state(&self) -> ControlState {
        self.inner.lock().state
    }

    pub fn identifiers(&self) -> RwLockReadGuard<'_, IdentifierDatabase> {
        self.identifiers.read()
    }

    pub fn identifiers_mut(&self) -> RwLockWriteGuard<'_, IdentifierDatabase> {
        self.identifiers.write()
    }

    #[inline]
    pub(crate) fn control_word(&self) -> u64 {
        self.control.load()
    }

    /// Delivers queued events unless another thread is already doing so.
    fn publish(self: &Arc<Self>, mut inner: MutexGuard<'_, Inner>) {
        if inner.draining {
            return;
        }
        inner.draining = true;
        let api = Api::from_base(Arc::clone(self));
        while let Some(event) = inner.events.pop_front() {
            let status = Arc::clone(&inner.status);
            MutexGuard::unlocked(&mut inner, || event.deliver(status.as_ref(), &api));
        }
        inner.draining = false;
        self.condition.notify_all();
    }

    /// Takes over delivery of events the host queued.
    fn deliver_queued(self: &Arc<Self>, inner: MutexGuard<'_, Inner>) {
        self.control.clear(DELIVER);
        self.publish(inner);
    }

    pub(crate) fn start(
        self: &Arc<Self>,
        rng_type: RngType,
        seed: RngSeed,
        status: Arc<dyn Status>,
    ) -> RuntimeResult<()> {
        let state = self.state();
        if !state.can_start() {
            return Err(RuntimeError::invalid_parameter(format!(
                "can not start a run while {}",
                state
            )));
        }
        self.join_workers();
        let mut inner = self.inner.lock();
        if !inner.state.can_start() {
            return Err(RuntimeError::invalid_parameter(format!(
                "can not start a run while {}",
                inner.state
            )));
        }

        let breakpoints = self.breakpoints.read();
        let paused_at_start = breakpoints.run_to.is_some();
        let mut word = breakpoints.control_bits();
        drop(breakpoints);

        inner.status = status;
        inner.events.clear();
        inner.generation += 1;
        inner.started_workers = 0;
        inner.abort_reason = None;
        inner.abort_operation = None;
        inner.run_complete = false;
        inner.events.push_back(StatusEvent::Started);
        if paused_at_start {
            word |= PAUSE;
            inner.state = ControlState::PausedOnUserRequest;
            inner.announced = true;
            inner.events.push_back(StatusEvent::PausedOnUserRequest { operation: 0 });
        } else {
            inner.state = ControlState::Active;
            inner.announced = false;
        }
        self.control.reset(word);
        self.control.mark_workers(self.thread_count);
        info!(threads = self.thread_count, %rng_type, paused_at_start, "starting run");
        drop(inner);

        let mut handles = Vec::with_capacity(self.thread_count);
        let mut spawn_error = None;
        for thread_id in 0..self.thread_count as u32 {
            let rng = PerThreadRng::for_thread(rng_type, &seed, thread_id);
            let base = Arc::clone(self);
            let spawned = thread::Builder::new()
                .name(format!("ferrite-worker-{}", thread_id))
                .spawn(move || base.run_worker(thread_id, rng));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(error) => {
                    spawn_error = Some((thread_id, error));
                    break;
                }
            }
        }
        let spawned = handles.len();
        self.workers.lock().extend(handles);

        if let Some((first_missing, error)) = &spawn_error {
            warn!(thread_id = first_missing, %error, "could not spawn worker");
            self.request_abort(AbortReason::Exception, None);
            for thread_id in *first_missing..self.thread_count as u32 {
                self.retire_unspawned(thread_id);
            }
        }

        let mut inner = self.inner.lock();
        while inner.started_workers < spawned {
            self.condition.wait(&mut inner);
        }
        if spawn_error.is_some() {
            // Too few workers may remain to report `started`.
            self.publish(inner);
        }

        match spawn_error {
            Some((thread_id, error)) => Err(RuntimeError::invalid_parameter(format!(
                "could not spawn worker {}: {}",
                thread_id, error
            ))),
            None => Ok(()),
        }
    }

    fn retire_unspawned(self: &Arc<Self>, thread_id: u32) {
        let mut inner = self.inner.lock();
        if self.control.worker_exited(thread_id) == 0 {
            self.finish_run(&mut inner);
        }
        self.publish(inner);
    }

    fn run_worker(self: Arc<Self>, thread_id: u32, rng: PerThreadRng) {
        let span = info_span!("worker", thread_id);
        let _entered = span.enter();

        let mut inner = self.inner.lock();
        inner.events.push_back(StatusEvent::ThreadStarted { thread_id });
        inner.started_workers += 1;
        self.condition.notify_all();
        self.publish(inner);
        debug!("worker started");

        let mut per_thread = PerThread::new(Arc::clone(&self), thread_id, rng);
        let model = Arc::clone(&self.model);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            per_thread.settle()?;
            model.run_thread(thread_id, &mut per_thread)
        }));
        let last_operation = per_thread.last_operation();

        let event = match outcome {
            Ok(Ok(())) => StatusEvent::ThreadFinished { thread_id },
            Ok(Err(error)) if error.is_abort() => {
                debug!(operation = last_operation, "worker observed abort");
                self.request_abort(AbortReason::UserRequest, Some(last_operation));
                StatusEvent::ThreadAborted { thread_id }
            }
            Ok(Err(error)) => {
                warn!(%error, operation = last_operation, "worker failed");
                self.request_abort(AbortReason::Exception, Some(last_operation));
                StatusEvent::ThreadAborted { thread_id }
            }
            Err(payload) => {
                warn!(
                    panic = %panic_message(payload.as_ref()),
                    operation = last_operation,
                    "worker panicked"
                );
                self.request_abort(AbortReason::Exception, Some(last_operation));
                StatusEvent::ThreadAborted { thread_id }
            }
        };
        self.retire(thread_id, event, last_operation);
    }

    /// Reports a worker's exit. A finishing worker first honours any pending
    /// pause, so nothing but `thread_paused` is reported while paused.
    fn retire(self: &Arc<Self>, thread_id: u32, mut event: StatusEvent, operation: u64) {
        loop {
            let inner = self.inner.lock();
            let word = self.control.load();
            let pending = word & (PAUSE | SINGLE_STEP) != 0 && word & ABORT == 0;
            if matches!(event, StatusEvent::ThreadFinished { .. }) && pending {
                drop(inner);
                if self.park(thread_id, operation, Trigger::Request).is_err() {
                    event = StatusEvent::ThreadAborted { thread_id };
                }
                continue;
            }

            let mut inner = inner;
            debug!(?event, "worker exiting");
            inner.events.push_back(event);
            if self.control.worker_exited(thread_id) == 0 {
                self.finish_run(&mut inner);
            }
            self.publish(inner);
            return;
        }
    }

    fn finish_run(&self, inner: &mut Inner) {
        if self.control.load() & ABORT != 0 {
            let reason = inner.abort_reason.unwrap_or(AbortReason::UserRequest);
            let operation = inner.abort_operation.unwrap_or(0);
            inner.state = ControlState::Aborted;
            inner.events.push_back(StatusEvent::Aborted { reason, operation });
            info!(%reason, operation, "run aborted");
        } else {
            inner.state = ControlState::Stopped;
            inner.events.push_back(StatusEvent::Finished);
            info!("run finished");
        }
        self.control.reset(0);
        inner.run_complete = true;
        inner.generation += 1;
        self.condition.notify_all();
    }

    fn join_workers(&self) {
        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread panicked outside the model");
            }
        }
    }

    /// Blocks until the current run has ended and its events are delivered.
    pub(crate) fn wait_complete(&self) -> ControlState {
        let mut inner = self.inner.lock();
        while inner.state != ControlState::Idle
            && !(inner.run_complete && inner.events.is_empty() && !inner.draining)
        {
            self.condition.wait(&mut inner);
        }
        let state = inner.state;
        drop(inner);
        self.join_workers();
        state
    }

    /// Requests an abort. Returns `false` when no run is in progress.
    pub(crate) fn request_abort(&self, reason: AbortReason, operation: Option<u64>) -> bool {
        let mut inner = self.inner.lock();
        if inner.state.can_start() {
            return false;
        }
        if inner.abort_reason.is_none() {
            inner.abort_reason = Some(reason);
            info!(%reason, "abort requested");
        }
        if inner.abort_operation.is_none() {
            inner.abort_operation = operation;
        }
        self.control.set(ABORT);
        inner.generation += 1;
        self.condition.notify_all();
        true
    }

    pub(crate) fn pause(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != ControlState::Active {
            return false;
        }
        inner.state = ControlState::PausedOnUserRequest;
        inner.announced = false;
        self.control.clear(SINGLE_STEP);
        self.control.set(PAUSE);
        debug!("pause requested");
        true
    }

    fn release(self: &Arc<Self>, single_step: bool) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.is_paused() {
            return false;
        }
        if single_step {
            self.control.set(SINGLE_STEP);
        } else {
            self.control.clear(SINGLE_STEP);
        }
        self.control.clear(PAUSE);
        inner.state = ControlState::Active;
        inner.generation += 1;
        inner.events.push_back(StatusEvent::Resumed);
        self.control.set(DELIVER);
        debug!(single_step, "resuming");
        self.condition.notify_all();
        true
    }

    pub(crate) fn resume(self: &Arc<Self>) -> bool {
        self.release(false)
    }

    pub(crate) fn single_step(self: &Arc<Self>) -> bool {
        self.release(true)
    }

    fn update_breakpoints(&self, edit: impl FnOnce(&mut Breakpoints)) {
        let mut breakpoints = self.breakpoints.write();
        edit(&mut breakpoints);
        let bits = breakpoints.control_bits();
        self.control.assign(RUN_TO, bits & RUN_TO != 0);
        self.control.assign(WATCH, bits & WATCH != 0);
    }

    pub(crate) fn set_operation_breakpoint(&self, operation: u64, enabled: bool) {
        self.update_breakpoints(|b| {
            if enabled {
                b.operations.insert(operation);
            } else {
                b.operations.remove(&operation);
            }
        });
    }

    pub(crate) fn set_variable_update_breakpoint(&self, identifier: u64, enabled: bool) {
        self.update_breakpoints(|b| {
            if enabled {
                b.variables.insert(identifier);
            } else {
                b.variables.remove(&identifier);
            }
        });
    }

    pub(crate) fn set_run_to_location(&self, operation: u64) {
        self.update_breakpoints(|b| b.run_to = (operation != 0).then_some(operation));
    }

    pub(crate) fn run_to_location(&self) -> Option<u64> {
        self.breakpoints.read().run_to
    }

    /// Slow path of a checkpoint, entered when any request bit is set.
    pub(crate) fn checkpoint(self: &Arc<Self>, thread_id: u32, operation: u64, word: u64) -> RuntimeResult<()> {
        debug_assert!(word & CHECKPOINT_BITS != 0);
        if word & ABORT != 0 {
            return Err(RuntimeError::Aborted);
        }
        if word & DELIVER != 0 {
            self.deliver_queued(self.inner.lock());
        }
        if word & RUN_TO != 0 {
            let breakpoints = self.breakpoints.read();
            let hit = breakpoints.run_to == Some(operation) || breakpoints.operations.contains(&operation);
            drop(breakpoints);
            if hit {
                trace!(operation, "breakpoint reached");
                return self.park(thread_id, operation, Trigger::Operation);
            }
        }
        if word & (PAUSE | SINGLE_STEP) != 0 {
            trace!(operation, "pause request observed");
            return self.park(thread_id, operation, Trigger::Request);
        }
        Ok(())
    }

    /// Honours a pending pause or abort without consulting breakpoints.
    pub(crate) fn settle(self: &Arc<Self>, thread_id: u32, operation: u64) -> RuntimeResult<()> {
        let word = self.control.load();
        if word & ABORT != 0 {
            return Err(RuntimeError::Aborted);
        }
        if word & (PAUSE | SINGLE_STEP) != 0 {
            return self.park(thread_id, operation, Trigger::Request);
        }
        Ok(())
    }

    /// Slow path of a variable-update report.
    pub(crate) fn variable_updated(
        self: &Arc<Self>,
        thread_id: u32,
        operation: u64,
        identifier: u64,
        word: u64,
    ) -> RuntimeResult<()> {
        if word & ABORT != 0 {
            return Err(RuntimeError::Aborted);
        }
        if word & WATCH != 0 && self.breakpoints.read().variables.contains(&identifier) {
            trace!(operation, identifier, "watched variable updated");
            return self.park(thread_id, operation, Trigger::Variable(identifier));
        }
        Ok(())
    }

    /// Moves the run into a paused state if needed, reports the worker as
    /// paused and blocks until resumed or aborted.
    fn park(self: &Arc<Self>, thread_id: u32, operation: u64, trigger: Trigger) -> RuntimeResult<()> {
        let mut inner = self.inner.lock();
        let word = self.control.load();
        if word & ABORT != 0 {
            return Err(RuntimeError::Aborted);
        }

        match inner.state {
            ControlState::Active => {
                let (state, announcement) = match trigger {
                    Trigger::Operation => {
                        let mut breakpoints = self.breakpoints.write();
                        if breakpoints.run_to == Some(operation) {
                            breakpoints.run_to = None;
                            let bits = breakpoints.control_bits();
                            self.control.assign(RUN_TO, bits & RUN_TO != 0);
                        }
                        (
                            ControlState::PausedAtOperation,
                            StatusEvent::PausedAtOperation { operation },
                        )
                    }
                    Trigger::Variable(identifier) => (
                        ControlState::PausedOnVariableUpdate,
                        StatusEvent::PausedOnVariableUpdate {
                            operation,
                            identifier,
                        },
                    ),
                    Trigger::Request if word & SINGLE_STEP != 0 => {
                        self.control.clear(SINGLE_STEP);
                        (
                            ControlState::PausedOnUserRequest,
                            StatusEvent::PausedOnUserRequest { operation },
                        )
                    }
                    // Resumed between the checkpoint's read and this lock.
                    Trigger::Request => return Ok(()),
                };
                debug!(operation, %state, "run paused by worker");
                inner.state = state;
                inner.announced = true;
                self.control.set(PAUSE);
                inner.events.push_back(announcement);
            }
            state if state.is_paused() => {
                if !inner.announced {
                    inner.announced = true;
                    inner.events.push_back(StatusEvent::PausedOnUserRequest { operation });
                }
            }
            _ => return Ok(()),
        }

        inner.events.push_back(StatusEvent::ThreadPaused { thread_id });
        let generation = inner.generation;
        self.publish(inner);

        let mut inner = self.inner.lock();
        while inner.generation == generation {
            self.condition.wait(&mut inner);
        }
        if self.control.load() & DELIVER != 0 {
            self.deliver_queued(inner);
        } else {
            drop(inner);
        }
        if self.control.load() & ABORT != 0 {
            return Err(RuntimeError::Aborted);
        }
        trace!(operation, "worker resumed");
        Ok(())
    }
}

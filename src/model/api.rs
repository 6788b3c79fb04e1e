use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::{
    model::{
        Model,
        control::{AbortReason, ControlState},
        model_base::ModelBase,
        status::Status,
    },
    runtime::{
        error::RuntimeResult,
        identifier::IdentifierDatabase,
        rng::{RngSeed, RngType},
    },
};

/// Host-side handle to a model's controller. Clones share the controller.
///
/// Control requests are meant to come from one host thread; status
/// callbacks receive an `Api` too and may query state or issue requests.
#[derive(Clone)]
pub struct Api {
    base: Arc<ModelBase>,
}

impl Api {
    /// Wraps `model`. Fails when it declares no threads or more than
    /// [`MAXIMUM_NUMBER_THREADS`](crate::model::MAXIMUM_NUMBER_THREADS).
    pub fn new(model: Arc<dyn Model>) -> RuntimeResult<Self> {
        Self::with_identifiers(model, IdentifierDatabase::new())
    }

    pub fn with_identifiers(model: Arc<dyn Model>, identifiers: IdentifierDatabase) -> RuntimeResult<Self> {
        Ok(Self::from_base(Arc::new(ModelBase::new(model, identifiers)?)))
    }

    pub(crate) fn from_base(base: Arc<ModelBase>) -> Self {
        Self { base }
    }

    pub fn thread_count(&self) -> usize {
        self.base.thread_count()
    }

    /// Starts a run and blocks until it ends.
    pub fn run(&self, rng_type: RngType, seed: RngSeed, status: Arc<dyn Status>) -> RuntimeResult<ControlState> {
        self.start(rng_type, seed, status)?;
        Ok(self.wait_complete())
    }

    /// Launches the workers and returns once each has reported
    /// `thread_started`. Fails while a run is in progress.
    pub fn start(&self, rng_type: RngType, seed: RngSeed, status: Arc<dyn Status>) -> RuntimeResult<()> {
        self.base.start(rng_type, seed, status)
    }

    /// Blocks until the run is STOPPED or ABORTED and every callback has been
    /// delivered. Returns immediately when no run was ever started.
    pub fn wait_complete(&self) -> ControlState {
        self.base.wait_complete()
    }

    /// Requests an abort and returns without waiting. Workers unwind at their
    /// next checkpoint, paused workers at once. `false` when no run is in
    /// progress.
    pub fn abort(&self) -> bool {
        self.base.request_abort(AbortReason::UserRequest, None)
    }

    /// `true` iff the run was ACTIVE. The first worker to reach a checkpoint
    /// announces `paused_on_user_request`.
    pub fn pause(&self) -> bool {
        self.base.pause()
    }

    /// `true` iff the run was paused.
    pub fn resume(&self) -> bool {
        self.base.resume()
    }

    /// Resumes until the next checkpoint in any worker, then pauses again.
    /// `true` iff the run was paused.
    pub fn single_step(&self) -> bool {
        self.base.single_step()
    }

    /// Arms a one-shot breakpoint at `operation`; 0 disarms it. Armed before
    /// [`Api::start`], the run begins paused on user request.
    pub fn set_run_to_location(&self, operation: u64) {
        self.base.set_run_to_location(operation)
    }

    pub fn run_to_location(&self) -> Option<u64> {
        self.base.run_to_location()
    }

    pub fn set_operation_breakpoint(&self, operation: u64, enabled: bool) {
        self.base.set_operation_breakpoint(operation, enabled)
    }

    pub fn set_variable_update_breakpoint(&self, identifier: u64, enabled: bool) {
        self.base.set_variable_update_breakpoint(identifier, enabled)
    }

    pub fn state(&self) -> ControlState {
        self.base.state()
    }

    /// Identifier storage may be read while paused. Pause before writing.
    pub fn identifiers(&self) -> RwLockReadGuard<'_, IdentifierDatabase> {
        self.base.identifiers()
    }

    pub fn identifiers_mut(&self) -> RwLockWriteGuard<'_, IdentifierDatabase> {
        self.base.identifiers_mut()
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("threads", &self.thread_count())
            .field("state", &self.state())
            .finish()
    }
}

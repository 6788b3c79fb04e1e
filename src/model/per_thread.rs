use std::sync::Arc;

use parking_lot::RwLockReadGuard;
use rand::RngCore;

use crate::{
    model::{
        control::{ABORT, CHECKPOINT_BITS, WATCH},
        model_base::ModelBase,
    },
    runtime::{
        error::RuntimeResult,
        identifier::IdentifierDatabase,
        rng::{PerThreadRng, RngType},
    },
};

/// Per-worker context: the worker's generator and its checkpoint entry
/// points.
///
/// `PerThread` implements [`RngCore`], so every
/// [`Sampling`](crate::runtime::rng::Sampling) draw is available on it
/// directly.
pub struct PerThread {
    base: Arc<ModelBase>,
    thread_id: u32,
    rng: PerThreadRng,
    last_operation: u64,
}

impl PerThread {
    pub(crate) fn new(base: Arc<ModelBase>, thread_id: u32, rng: PerThreadRng) -> Self {
        Self {
            base,
            thread_id,
            rng,
            last_operation: 0,
        }
    }

    pub fn thread_id(&self) -> u32 {
        self.thread_id
    }

    pub fn rng_type(&self) -> RngType {
        self.rng.rng_type()
    }

    pub fn rng(&mut self) -> &mut PerThreadRng {
        &mut self.rng
    }

    /// Handle of the most recent checkpoint.
    pub fn last_operation(&self) -> u64 {
        self.last_operation
    }

    pub fn identifiers(&self) -> RwLockReadGuard<'_, IdentifierDatabase> {
        self.base.identifiers()
    }

    /// Checkpoint at `operation`. Returns `Err(RuntimeError::Aborted)` once
    /// an abort is requested; blocks while the run is paused.
    #[inline]
    pub fn c(&mut self, operation: u64) -> RuntimeResult<()> {
        self.last_operation = operation;
        let word = self.base.control_word();
        if word & CHECKPOINT_BITS == 0 {
            return Ok(());
        }
        self.base.checkpoint(self.thread_id, operation, word)
    }

    /// Reports a write to `identifier` at `operation`; pauses when the
    /// identifier is watched.
    #[inline]
    pub fn variable_updated(&mut self, operation: u64, identifier: u64) -> RuntimeResult<()> {
        self.last_operation = operation;
        let word = self.base.control_word();
        if word & (ABORT | WATCH) == 0 {
            return Ok(());
        }
        self.base
            .variable_updated(self.thread_id, operation, identifier, word)
    }

    pub(crate) fn settle(&mut self) -> RuntimeResult<()> {
        self.base.settle(self.thread_id, self.last_operation)
    }
}

impl RngCore for PerThread {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }
}

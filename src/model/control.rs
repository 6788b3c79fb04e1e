//! Control states and the atomic control word.
//!
//! The control word packs pending requests into the high bits and one
//! "running" bit per worker into the low 32 bits, which is what bounds the
//! worker count at [`MAXIMUM_NUMBER_THREADS`].

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

pub const MAXIMUM_NUMBER_THREADS: usize = 32;

pub(crate) const ABORT: u64 = 1 << 63;
pub(crate) const PAUSE: u64 = 1 << 62;
/// Operation breakpoints or a run-to location are armed.
pub(crate) const RUN_TO: u64 = 1 << 61;
pub(crate) const SINGLE_STEP: u64 = 1 << 60;
/// Variable-update breakpoints are armed.
pub(crate) const WATCH: u64 = 1 << 59;
/// The host queued status events for a worker to deliver.
pub(crate) const DELIVER: u64 = 1 << 58;
pub(crate) const WORKER_MASK: u64 = 0xFFFF_FFFF;

/// Bits that send a checkpoint down the slow path.
pub(crate) const CHECKPOINT_BITS: u64 = ABORT | PAUSE | RUN_TO | SINGLE_STEP | DELIVER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    Idle,
    Active,
    PausedOnUserRequest,
    PausedAtOperation,
    PausedOnVariableUpdate,
    Stopped,
    Aborted,
}

impl ControlState {
    pub fn is_paused(self) -> bool {
        matches!(
            self,
            ControlState::PausedOnUserRequest
                | ControlState::PausedAtOperation
                | ControlState::PausedOnVariableUpdate
        )
    }

    /// `true` for states that end a run.
    pub fn is_terminal(self) -> bool {
        matches!(self, ControlState::Stopped | ControlState::Aborted)
    }

    /// `true` when a new run may be started.
    pub fn can_start(self) -> bool {
        matches!(self, ControlState::Idle) || self.is_terminal()
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlState::Idle => "IDLE",
            ControlState::Active => "ACTIVE",
            ControlState::PausedOnUserRequest => "PAUSED_ON_USER_REQUEST",
            ControlState::PausedAtOperation => "PAUSED_AT_OPERATION",
            ControlState::PausedOnVariableUpdate => "PAUSED_ON_VARIABLE_UPDATE",
            ControlState::Stopped => "STOPPED",
            ControlState::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    UserRequest,
    /// A worker returned an error or panicked.
    Exception,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::UserRequest => f.write_str("USER_REQUEST"),
            AbortReason::Exception => f.write_str("EXCEPTION"),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ControlWord(AtomicU64);

impl ControlWord {
    #[inline]
    pub fn load(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, bits: u64) -> u64 {
        self.0.fetch_or(bits, Ordering::AcqRel)
    }

    pub fn clear(&self, bits: u64) -> u64 {
        self.0.fetch_and(!bits, Ordering::AcqRel)
    }

    pub fn assign(&self, bit: u64, on: bool) {
        if on {
            self.set(bit);
        } else {
            self.clear(bit);
        }
    }

    pub fn reset(&self, word: u64) {
        self.0.store(word, Ordering::Release);
    }

    /// Marks every worker below `count` as running.
    pub fn mark_workers(&self, count: usize) {
        let mask = if count >= MAXIMUM_NUMBER_THREADS {
            WORKER_MASK
        } else {
            (1u64 << count) - 1
        };
        self.set(mask);
    }

    /// Clears the worker's running bit, returning how many workers are still
    /// running.
    pub fn worker_exited(&self, thread_id: u32) -> u32 {
        let previous = self.clear(1 << thread_id);
        (previous & WORKER_MASK & !(1 << thread_id)).count_ones()
    }

    pub fn running_workers(&self) -> u32 {
        (self.load() & WORKER_MASK).count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_bits_stay_below_the_request_bits() {
        let word = ControlWord::default();
        word.mark_workers(MAXIMUM_NUMBER_THREADS);
        assert_eq!(word.load(), WORKER_MASK);
        assert_eq!(word.load() & CHECKPOINT_BITS, 0);
        assert_eq!(word.worker_exited(31), 31);
    }

    #[test]
    fn exit_counts_remaining_workers() {
        let word = ControlWord::default();
        word.mark_workers(3);
        word.set(PAUSE);
        assert_eq!(word.running_workers(), 3);
        assert_eq!(word.worker_exited(1), 2);
        assert_eq!(word.worker_exited(0), 1);
        assert_eq!(word.worker_exited(2), 0);
        assert_eq!(word.load(), PAUSE);
    }

    #[test]
    fn state_predicates() {
        assert!(ControlState::PausedAtOperation.is_paused());
        assert!(!ControlState::Active.is_paused());
        assert!(ControlState::Aborted.is_terminal());
        assert!(ControlState::Idle.can_start());
        assert!(ControlState::Stopped.can_start());
        assert!(!ControlState::PausedOnUserRequest.can_start());
        assert_eq!(ControlState::PausedOnVariableUpdate.to_string(), "PAUSED_ON_VARIABLE_UPDATE");
    }
}

//! Process-wide error enable flags.
//!
//! Reads are relaxed and changes are not retroactive: an operation that has
//! already consulted the policy keeps its decision. Flags default to enabled.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::runtime::error::{ErrorClass, RuntimeError, RuntimeResult};

const ALL_ENABLED: u32 = (1 << ErrorClass::ALL.len()) - 1;

pub struct ErrorPolicy {
    flags: AtomicU32,
}

static POLICY: ErrorPolicy = ErrorPolicy::new();

/// Returns the process-wide policy.
pub fn policy() -> &'static ErrorPolicy {
    &POLICY
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorPolicy {
    pub const fn new() -> Self {
        Self {
            flags: AtomicU32::new(ALL_ENABLED),
        }
    }

    pub fn is_enabled(&self, class: ErrorClass) -> bool {
        self.flags.load(Ordering::Relaxed) & class.bit() != 0
    }

    /// Enables or disables a class, returning the previous setting.
    pub fn set_enabled(&self, class: ErrorClass, enabled: bool) -> bool {
        let previous = if enabled {
            self.flags.fetch_or(class.bit(), Ordering::Relaxed)
        } else {
            self.flags.fetch_and(!class.bit(), Ordering::Relaxed)
        };
        previous & class.bit() != 0
    }

    pub fn enable_all(&self) {
        self.flags.store(ALL_ENABLED, Ordering::Relaxed);
    }

    pub fn disable_all(&self) {
        self.flags.store(0, Ordering::Relaxed);
    }

    /// Returns `Err(error)` if the error's class is enabled (or the error is
    /// ungated), otherwise `Ok(fallback)`.
    pub fn gate<T>(&self, error: RuntimeError, fallback: T) -> RuntimeResult<T> {
        match error.class() {
            Some(class) if !self.is_enabled(class) => Ok(fallback),
            _ => Err(error),
        }
    }

    /// Same as [`Self::gate`] with a lazily built fallback.
    pub fn gate_with<T>(&self, error: RuntimeError, fallback: impl FnOnce() -> T) -> RuntimeResult<T> {
        match error.class() {
            Some(class) if !self.is_enabled(class) => Ok(fallback()),
            _ => Err(error),
        }
    }
}

/// Shorthand for `policy().gate(error, fallback)`.
pub fn raise<T>(error: RuntimeError, fallback: T) -> RuntimeResult<T> {
    POLICY.gate(error, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_policy_gates_by_class() {
        let local = ErrorPolicy::new();
        assert!(local.is_enabled(ErrorClass::NaN));
        assert_eq!(
            local.gate(RuntimeError::ResultIsNaN, f64::NAN),
            Err(RuntimeError::ResultIsNaN)
        );

        assert!(local.set_enabled(ErrorClass::NaN, false));
        let value = local.gate(RuntimeError::ResultIsNaN, 0.5).unwrap();
        assert_eq!(value, 0.5);
        assert!(local.is_enabled(ErrorClass::Infinity));
    }

    #[test]
    fn ungated_errors_always_raise() {
        let local = ErrorPolicy::new();
        local.disable_all();
        let err = RuntimeError::incompatible_dimensions((1, 2), (3, 4));
        assert_eq!(local.gate(err.clone(), ()), Err(err));
        assert_eq!(local.gate(RuntimeError::Aborted, 1), Err(RuntimeError::Aborted));
    }

    #[test]
    fn enable_all_restores_every_class() {
        let local = ErrorPolicy::new();
        local.disable_all();
        for class in ErrorClass::ALL {
            assert!(!local.is_enabled(class));
        }
        local.enable_all();
        for class in ErrorClass::ALL {
            assert!(local.is_enabled(class));
        }
    }
}

//! Runtime core: values, containers, conversions and the services compiled
//! models call into.
//!
//! # No-Cycle Invariant
//! Runtime values form trees. Container payloads are shared through `Arc`
//! with copy-on-write, and containers hold their elements by value, so no
//! operation can introduce a back-edge into an already reachable value.
//!
//! Any future container that stores references instead of values must come
//! with cycle-aware memory management.

pub mod containers;
pub mod conversion;
pub mod error;
pub mod file_io;
pub mod identifier;
pub mod matrix;
pub mod policy;
pub mod rng;
pub mod scalar;
pub mod summation;
pub mod variant;

//! Nullable infrastructure for deterministic testing.
//!
//! The peer selector and the proof pool reach the outside world through two
//! seams: a source of random slots and a callback receiving rescanned proofs.
//! This crate provides test-friendly implementations of both that:
//! - Return scripted values
//! - Record every call so tests can assert on them
//!
//! Usage: swap real implementations for nullables in tests.

pub mod random;
pub mod registrar;

pub use random::NullRandom;
pub use registrar::NullRegistrar;

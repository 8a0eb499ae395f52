//! End-to-end test support for the strata memory engine.

pub mod harness;

pub use harness::{episodic_event, perceptual_event, working_event, TestSystem};

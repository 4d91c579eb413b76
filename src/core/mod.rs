//! Core monitoring functionality
//!
//! The sampling loop and the run object that wraps it with process
//! lifecycle and output handling.

pub mod sampler;
pub mod session;

// Re-export main types
pub use sampler::{Sampler, SamplingConfig, SamplingOutcome, Termination};
pub use session::{Report, Session, SpawnedProcess};

//! The workflow orchestration core: phase scheduling, the step-approval
//! state machine with revision fan-out/fan-in, and the read-side status
//! aggregator.
//!
//! All mutating operations here execute as a single transaction against
//! the backing store; callers (HTTP handlers, CLI tooling, background
//! tasks) invoke these functions verbatim and never touch approval state
//! directly.

pub mod approval;
pub mod error;
pub mod scheduler;
pub mod status;

pub use error::{WorkflowError, WorkflowResult};

//! Support modules for the batch run BDD tests.

#[path = "../support/runtime.rs"]
pub(crate) mod runtime;
pub(crate) mod state;

pub(crate) use state::{BatchState, ensure_runtime, locator, thread_id};

//! Reconciliation pipeline.
//!
//! Merged pages flow through the checkpoint filter into the engine, one
//! reviewer call at a time. The retry controller paces calls and halts the
//! run after a streak of failures; every result is appended to the
//! consolidated store immediately so an interrupted run can resume.

mod controller;
mod engine;
mod pipeline;
mod prompt;
mod response;

pub use controller::{FailureAction, PipelineConfig, RetryController};
pub use engine::ReconciliationEngine;
pub use pipeline::{
    load_variant_stores, select_pending, PageEvent, Pipeline, PipelineError, RunOptions,
    RunSummary,
};
pub use prompt::{build_prompt, decode_variant, encode_variant, EMPTY_VARIANT};
pub use response::{parse_response, strip_code_fence, ReviewedPage, ENTITY_SEPARATOR};

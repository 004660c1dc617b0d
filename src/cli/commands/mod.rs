//! CLI command implementations.

pub mod config_cmd;
pub mod reconcile;
pub mod search;
pub mod serve;
pub mod status;

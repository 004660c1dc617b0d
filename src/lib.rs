//! ocrjudge - multi-engine OCR reconciliation and search.
//!
//! Several OCR engines transcribe the same scanned pages. This crate merges
//! their per-page output, asks an LLM reviewer for one canonical transcription
//! per page, and serves keyword search over both the raw variants and the
//! reconciled corpus.

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod llm;
pub mod merge;
pub mod models;
pub mod reconcile;
pub mod search;
pub mod server;
pub mod store;

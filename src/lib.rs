//! triage — a command-line client for a crash-analytics backend.
//!
//! A single invocation builds one structured query (filters, grouping,
//! aggregation folds), issues it over the blocking transport, unpacks the
//! grouped response into typed aggregate values, and renders each group to
//! the terminal: scalar folds, two histogram styles, time-range bars, and
//! wrapped call-stack traces.
//!
//! The pipeline is strictly sequential and invocation-scoped; the only
//! persistent state is the login session on disk.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod query;
pub mod render;
pub mod response;
pub mod sort;

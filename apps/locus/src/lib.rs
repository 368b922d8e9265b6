//! # locus
//!
//! The async half of Locus: the localization coordinator that drives the
//! recognition engine, the search-localize-guide workflow, configuration,
//! the HTTP API and the CLI. Search, pose resolution and guidance live in
//! `locus-core`.

pub mod api;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod workflow;

//! # CIPA Common Library
//!
//! Shared code for the CIPA governance service including:
//! - Domain models (terms, members, candidates, meetings, certificates)
//! - NR-5 dimensioning tables
//! - Sick-leave accumulation risk evaluation
//! - Election calendar generation and progress tracking
//! - Candidate registration state machine
//! - Office document rendering
//! - Event types, configuration loading and database bootstrap

pub mod candidacy;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod documents;
pub mod election;
pub mod error;
pub mod events;
pub mod models;
pub mod nr5;
pub mod sick_leave;
pub mod sse;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};

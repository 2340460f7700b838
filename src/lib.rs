// src/lib.rs

//! jobfeed library
//!
//! Watches markdown job tables for changes, parses their rows, and tracks
//! per-subscriber application status.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

// src/lib.rs

//! Market Feeds Library
//!
//! Turns saved marketplace searches into RSS feeds that are rebuilt on a
//! schedule and whenever the saved queries file changes.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(feature = "serve")]
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

//! Media matcher
//!
//! Pairs media files with episode or movie metadata: season/episode and date
//! recognition in file names, a small algebra of similarity metrics, and a
//! disjoint matcher that resolves all candidate pairs into one-to-one
//! matches.

pub mod cli;
pub mod config;
pub mod error;
pub mod services;

pub use error::{MatchError, MetricError, Result};

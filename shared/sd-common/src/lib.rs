//! `SignDeck` Common Library
//!
//! Shared types for the remote training, prediction and sample storage API.

pub mod types;

pub use types::*;

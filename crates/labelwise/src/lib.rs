//! Core library for resolving scanned products against external catalogs and
//! evaluating their ingredient lists against a user's health profile.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;

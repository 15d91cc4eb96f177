//! quadbatch core
//!
//! Shared utilities for the quadbatch sprite batcher: logging setup, profiling hooks,
//! matrix helpers and small geometry types.

pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;

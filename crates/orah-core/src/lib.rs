//! Configuration loading and secret handling for the ORAH notes pipeline.

pub mod config;
pub mod vault;

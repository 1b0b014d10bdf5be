//! Command implementations for the runbucket CLI.

pub mod configs;
pub mod epochs;
pub mod fetch;
pub mod mirror;
mod report;

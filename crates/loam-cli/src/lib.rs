//! Library side of the `loam` binary, exposed for integration tests

pub mod cli;
pub mod commands;
pub mod config;
pub mod workspace;

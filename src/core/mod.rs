//! Configuration, errors and project detection

pub mod config;
pub mod error;
pub mod project;

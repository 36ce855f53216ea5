// Domain module - Errors and configuration model
pub mod config;
pub mod error;

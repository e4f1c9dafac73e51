//! Shared configuration and error types for Unidata.
//!
//! This crate provides the pieces every other crate leans on:
//! - Layered configuration loading (files + environment)
//! - Application-wide error taxonomy with HTTP status mapping

pub mod config;
pub mod error;

pub use config::{AppConfig, LoggingConfig, ServerConfig, load_section};
pub use error::{AppError, AppResult};

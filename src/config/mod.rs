//! Configuration management for the POT provider
//!
//! This module handles loading and managing configuration settings,
//! merged from defaults, an optional TOML file, environment variables,
//! and command line arguments.

pub mod settings;

pub use settings::{ExtractorSettings, LoggingSettings, ServerSettings, Settings};

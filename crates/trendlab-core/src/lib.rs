// Shared configuration for the trend lab crates.

pub mod config;

pub use config::{Config, ConfigError};

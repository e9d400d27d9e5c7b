/// Environment-based configuration loading and validation.
pub mod config;

//! Settings for the ratewin CLI
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from embedded defaults, files, and environment

pub mod config;
mod loader;

pub use config::{AppConfig, SimulationConfig};
pub use loader::load_config;

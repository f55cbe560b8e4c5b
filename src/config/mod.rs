//! Configuration management module
//!
//! Precedence, lowest to highest: built-in defaults, `.env` file,
//! process environment, command-line arguments.

pub mod env;
pub mod parser;
pub mod validation;

pub use env::EnvManager;
pub use parser::{display_config_summary, load_config, ConfigParser};
pub use validation::{validate_config, ConfigValidator, ValidationLevel, ValidationWarning};

pub use crate::models::Config;

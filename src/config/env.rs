//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env from the current directory if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file; variables already set in the process win
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Example .env file content
    pub fn create_example_env_content() -> String {
        r#"# httping configuration
#
# Values here are defaults; environment variables and command-line
# arguments override them.

# Destination URL
# HTTPING_DESTINATION=https://example.com

# HTTP method
# HTTPING_METHOD=GET

# Number of requests
# HTTPING_COUNT=5

# Seconds between requests
# HTTPING_INTERVAL=1.0

# Per-request timeout in seconds (1-300)
# HTTPING_TIMEOUT=10

# Do not follow redirects (true/false)
# HTTPING_DISABLE_REDIRECT=false

# Skip TLS certificate verification (true/false)
# HTTPING_INSECURE=false

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#.to_string()
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("HTTPING_DESTINATION", "Destination URL", "https://example.com"),
            ("HTTPING_METHOD", "HTTP method", "HEAD"),
            ("HTTPING_COUNT", "Number of requests", "5"),
            ("HTTPING_INTERVAL", "Seconds between requests", "0.5"),
            ("HTTPING_TIMEOUT", "Per-request timeout in seconds (1-300)", "10"),
            ("HTTPING_DISABLE_REDIRECT", "Do not follow redirects", "true"),
            ("HTTPING_INSECURE", "Skip TLS certificate verification", "false"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n\n");
        help.push_str("Example .env file:\n\n");
        help.push_str(&Self::create_example_env_content());

        help
    }
}

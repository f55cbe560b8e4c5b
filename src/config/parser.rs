//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::{self, Cli},
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(ref destination) = self.cli.destination {
            config.destination = destination.trim().to_string();
        }

        if let Some(ref method) = self.cli.method {
            config.method = method.trim().to_string();
        }

        if let Some(count) = self.cli.count {
            config.count = count;
        }

        if let Some(interval) = self.cli.interval {
            config.interval_seconds = interval;
        }

        if let Some(timeout) = self.cli.timeout {
            config.timeout_seconds = timeout;
        }

        // Boolean switches only ever turn their behavior on
        if self.cli.disable_redirect {
            config.follow_redirects = false;
        }

        if self.cli.insecure {
            config.verify_tls = false;
        }

        if self.cli.zero_fill_stats {
            config.zero_fill_stats = true;
        }

        config.json_output = self.cli.json;
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        config.enable_color = match self.cli.color_override() {
            Some(forced) => forced,
            None => config.enable_color && cli::supports_color(),
        };

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: destination={}, method={}, count={}, interval={}s, timeout={}s",
                config.destination, config.method, config.count, config.interval_seconds, config.timeout_seconds
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Destination: {}", config.destination));
    summary.push(format!("Method: {}", config.method));
    summary.push(format!("Count: {}", config.count));
    summary.push(format!("Interval: {}s", config.interval_seconds));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!("Follow Redirects: {}", config.follow_redirects));
    summary.push(format!("Verify TLS: {}", config.verify_tls));
    summary.push(format!("Aggregation: {}", config.aggregation_mode()));
    summary.push(format!("Color Output: {}", config.enable_color));

    summary.join("\n")
}

//! Configuration validation utilities and rules
//!
//! [`Config::validate`] rejects configurations that cannot run. The checks
//! here only produce advisories about configurations that run but may not
//! measure what the user expects.

use crate::{error::Result, models::Config};
use std::net::IpAddr;

/// Methods hyper knows by name; anything else is sent as an extension method
const STANDARD_METHODS: [&str; 9] = ["GET", "HEAD", "POST", "PUT", "DELETE", "OPTIONS", "PATCH", "TRACE", "CONNECT"];

/// Configuration validator with advisory rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration, returning advisories when it is runnable
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_destination(config));
        warnings.extend(Self::validate_method(&config.method));
        warnings.extend(Self::validate_pacing(config));

        Ok(warnings)
    }

    fn validate_destination(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let Ok(parsed) = url::Url::parse(&config.destination) else {
            return warnings;
        };

        if parsed.scheme() == "http" && !config.verify_tls {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "--insecure has no effect on a plain HTTP destination".to_string(),
            ));
        }

        if parsed.scheme() == "https" {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "TLS handshake time is counted as request time, not connection time".to_string(),
            ));
        }

        let private_host = match parsed.host() {
            Some(url::Host::Ipv4(ip)) => Self::is_local(&IpAddr::V4(ip)),
            Some(url::Host::Ipv6(ip)) => Self::is_local(&IpAddr::V6(ip)),
            Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            None => false,
        };
        if private_host {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Destination '{}' targets private/local network", config.destination),
            ));
        }

        warnings
    }

    fn validate_method(method: &str) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if !STANDARD_METHODS.iter().any(|standard| standard.eq_ignore_ascii_case(method)) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Method '{}' is not a standard HTTP method and will be sent as-is", method),
            ));
        } else if method != method.to_ascii_uppercase() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Method '{}' is case-sensitive on the wire; most servers expect '{}'", method, method.to_ascii_uppercase()),
            ));
        }

        warnings
    }

    fn validate_pacing(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let interval = config.interval();

        if interval.is_zero() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Zero interval: requests are sent back to back with no time budget".to_string(),
            ));
        } else if config.timeout() >= interval {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}s is not shorter than the {}s interval; slow requests can end the run before {} are sent",
                    config.timeout_seconds, config.interval_seconds, config.count
                ),
            ));
        }

        if config.count > 1000 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("High count of {} will take a long time", config.count),
            ));
        }

        warnings
    }

    fn is_local(ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(ipv4) => ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local(),
            IpAddr::V6(ipv6) => ipv6.is_loopback(),
        }
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Get color for terminal display
    pub fn color(&self) -> colored::Color {
        match self {
            Self::Info => colored::Color::Blue,
            Self::Warning => colored::Color::Yellow,
            Self::Error => colored::Color::Red,
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            format!("[{}] {}", self.level.as_str().color(self.level.color()).bold(), self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

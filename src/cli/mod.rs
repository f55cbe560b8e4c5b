//! Command-line interface

use clap::Parser;

/// httping - ping-style round-trip timing over fresh HTTP connections
///
/// Every value left unset on the command line falls back to the matching
/// HTTPING_* environment variable (also read from a .env file), then to the
/// built-in default.
#[derive(Parser, Debug, Clone)]
#[command(name = "httping")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Destination URL, e.g. 'http://localhost'
    #[arg(short = 'd', long)]
    pub destination: Option<String>,

    /// HTTP method [default: GET]
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Number of requests to send [default: 5]
    #[arg(short = 'c', long)]
    pub count: Option<u32>,

    /// Do not follow redirects
    #[arg(short = 'r', long)]
    pub disable_redirect: bool,

    /// Seconds between requests [default: 1.0]
    #[arg(short = 'i', long, value_parser = parse_interval)]
    pub interval: Option<f64>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Per-request timeout in seconds, 1-300 [default: 10]
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Compute rtt min/avg/max over every slot, counting failed and unsent
    /// requests as 0ms
    #[arg(long)]
    pub zero_fill_stats: bool,

    /// Print the summary as JSON instead of ping lines
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Show connection/request split per request
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// List supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let Some(method) = &self.method {
            if method.trim().is_empty() {
                return Err("HTTP method cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Color decision from the flags alone; `None` leaves it to configuration
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 300 {
                Err("Duration cannot exceed 300 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Parse a non-negative, finite number of seconds
fn parse_interval(s: &str) -> Result<f64, String> {
    let seconds: f64 = s.parse().map_err(|_| format!("Invalid interval: {}", s))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("Interval must be a non-negative number of seconds: {}", s));
    }
    Ok(seconds)
}

/// Check if the terminal supports color output
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    // Default to true on Unix-like systems, false on Windows
    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

//! Error handling for the HTTP latency probe

use crate::client::TransportError;
use thiserror::Error;

/// Custom error types for the probe
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request could not be constructed (bad method or URL)
    #[error("Request construction error: {0}")]
    RequestBuild(String),

    /// Dial, connection or TLS handshake failures
    #[error("Network error: {0}")]
    Network(String),

    /// Per-attempt or dial timeouts
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Other HTTP exchange errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Response body could not be read
    #[error("Response body error: {0}")]
    ResponseBody(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, numbers, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Statistics calculation errors
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new request construction error
    pub fn request_build<S: Into<String>>(message: S) -> Self {
        Self::RequestBuild(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new response body error
    pub fn response_body<S: Into<String>>(message: S) -> Self {
        Self::ResponseBody(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new statistics error
    pub fn statistics<S: Into<String>>(message: S) -> Self {
        Self::Statistics(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::RequestBuild(_) => "REQUEST",
            Self::Network(_) => "NETWORK",
            Self::Timeout(_) => "TIMEOUT",
            Self::HttpRequest(_) => "HTTP",
            Self::ResponseBody(_) => "BODY",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Statistics(_) => "STATS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// The message without the category prefix added by `Display`
    pub fn reason(&self) -> &str {
        match self {
            Self::Config(msg)
            | Self::Validation(msg)
            | Self::RequestBuild(msg)
            | Self::Network(msg)
            | Self::Timeout(msg)
            | Self::HttpRequest(msg)
            | Self::ResponseBody(msg)
            | Self::Io(msg)
            | Self::Parse(msg)
            | Self::Statistics(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// Whether this error belongs to a single probe attempt rather than the run
    pub fn is_attempt_error(&self) -> bool {
        matches!(
            self,
            Self::RequestBuild(_) | Self::Network(_) | Self::Timeout(_) | Self::HttpRequest(_) | Self::ResponseBody(_)
        )
    }

    /// Check if error is recoverable (a later attempt may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::HttpRequest(_) | Self::ResponseBody(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::RequestBuild(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::Statistics(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file, HTTPING_* variables or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the destination URL, count and interval values.", msg)
            }
            Self::RequestBuild(msg) => {
                format!("Request could not be built: {}\n\nSuggestion: Check the HTTP method (-X) and destination URL (-d).", msg)
            }
            Self::Network(msg) => {
                format!("Network connectivity issue: {}\n\nSuggestion: Check that the destination is reachable, or use -k for self-signed certificates.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase the timeout with --timeout or check your network connection.", msg)
            }
            Self::HttpRequest(msg) => {
                format!("HTTP request failed: {}\n\nSuggestion: The server may be rejecting requests, or redirecting in a loop (try -r).", msg)
            }
            Self::ResponseBody(msg) => {
                format!("Response body could not be read: {}\n\nSuggestion: The server closed the connection early. Try again.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input values.", msg)
            }
            Self::Statistics(msg) => {
                format!("Statistics calculation failed: {}\n\nSuggestion: This usually means no probe was sent.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,  // Invalid configuration/usage
            Self::RequestBuild(_) | Self::Network(_) | Self::HttpRequest(_) | Self::ResponseBody(_) => 2,  // Network issues
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::Statistics(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::RequestBuild(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::HttpRequest(_) | Self::ResponseBody(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) | Self::Statistics(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

/// Render an error and all of its sources as `outer: inner: root`
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // hyper often repeats the inner message verbatim
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON error: {}", error))
    }
}

impl From<TransportError> for AppError {
    fn from(error: TransportError) -> Self {
        let message = error_chain(&error);
        match &error {
            TransportError::Timeout(_) => Self::timeout(message),
            TransportError::Client(inner) if inner.is_connect() => {
                if caused_by_timeout(inner) {
                    Self::timeout(message)
                } else {
                    Self::network(message)
                }
            }
            TransportError::Body(_) => Self::response_body(message),
            TransportError::Client(_) | TransportError::TooManyRedirects(_) | TransportError::Redirect(_) => {
                Self::http_request(message)
            }
        }
    }
}

/// True when an I/O timeout sits anywhere in the source chain
fn caused_by_timeout(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(error);
    while let Some(cause) = source {
        if cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
        {
            return true;
        }
        source = cause.source();
    }
    false
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for fatal errors shown to the user
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let network_error = AppError::network("Connection refused");
        assert_eq!(network_error.category(), "NETWORK");
        assert!(network_error.is_recoverable());
        assert_eq!(network_error.exit_code(), 2);
    }

    #[test]
    fn test_error_display_and_reason() {
        let error = AppError::timeout("operation timed out");
        assert_eq!(error.to_string(), "Timeout error: operation timed out");
        assert_eq!(error.reason(), "operation timed out");
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::validation("validation"),
            AppError::request_build("request"),
            AppError::network("network"),
            AppError::timeout("timeout"),
            AppError::http_request("http"),
            AppError::response_body("body"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::statistics("stats"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG", "VALIDATION", "REQUEST", "NETWORK", "TIMEOUT",
            "HTTP", "BODY", "IO", "PARSE", "STATS", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_attempt_errors() {
        assert!(AppError::request_build("bad method").is_attempt_error());
        assert!(AppError::network("refused").is_attempt_error());
        assert!(AppError::timeout("slow").is_attempt_error());
        assert!(AppError::response_body("eof").is_attempt_error());

        assert!(!AppError::config("x").is_attempt_error());
        assert!(!AppError::statistics("x").is_attempt_error());
        // construction errors repeat identically on every attempt
        assert!(!AppError::request_build("bad method").is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::network("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::statistics("test").exit_code(), 6);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_user_friendly_messages() {
        let error = AppError::config("count must be greater than 0");
        let message = error.user_friendly_message();
        assert!(message.contains("Configuration problem"));
        assert!(message.contains("Suggestion:"));
        assert!(message.contains("count must be greater than 0"));
    }

    #[test]
    fn test_error_chain_joins_sources() {
        #[derive(Debug, Error)]
        #[error("outer")]
        struct Outer(#[source] std::io::Error);

        let error = Outer(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"));
        assert_eq!(error_chain(&error), "outer: connection refused");
    }

    #[test]
    fn test_error_chain_skips_repeated_message() {
        #[derive(Debug, Error)]
        #[error("dial failed: connection refused")]
        struct Outer(#[source] std::io::Error);

        let error = Outer(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"));
        assert_eq!(error_chain(&error), "dial failed: connection refused");
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<u32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let float_error = "fast".parse::<f64>().unwrap_err();
        let app_error: AppError = float_error.into();
        assert!(app_error.to_string().contains("Float parse error"));
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let url_error = url::Url::parse("not-a-valid-url").unwrap_err();
        let app_error: AppError = url_error.into();
        assert_eq!(app_error.category(), "PARSE");
        assert!(app_error.to_string().contains("URL parse error"));
    }

    #[test]
    fn test_dotenv_error_conversion() {
        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
        assert!(app_error.to_string().contains("Environment file error"));
    }

    #[test]
    fn test_bool_parse_error_conversion() {
        let bool_error = "not-a-bool".parse::<bool>().unwrap_err();
        let app_error: AppError = bool_error.into();
        assert_eq!(app_error.category(), "PARSE");
        assert!(app_error.to_string().contains("Boolean parse error"));
    }

    #[test]
    fn test_transport_error_conversion() {
        let timeout: AppError = TransportError::Timeout(Duration::from_millis(500)).into();
        assert_eq!(timeout.category(), "TIMEOUT");
        assert!(timeout.to_string().contains("500ms"));

        let redirects: AppError = TransportError::TooManyRedirects(10).into();
        assert_eq!(redirects.category(), "HTTP");

        let redirect: AppError = TransportError::Redirect("unsupported scheme".to_string()).into();
        assert_eq!(redirect.category(), "HTTP");
    }

    #[test]
    fn test_timeout_found_in_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("connect failed")]
        struct Wrapper(#[source] std::io::Error);

        let timed_out = Wrapper(std::io::Error::new(std::io::ErrorKind::TimedOut, "dial timed out"));
        assert!(caused_by_timeout(&timed_out));

        let refused = Wrapper(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"));
        assert!(!caused_by_timeout(&refused));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::config("Test error");
        let formatted_no_color = error.format_for_console(false);
        let formatted_color = error.format_for_console(true);

        assert_eq!(formatted_no_color, "[CONFIG] Configuration error: Test error");
        assert!(formatted_color.contains("CONFIG"));
        assert!(formatted_color.contains("Test error"));
    }

    #[test]
    fn test_error_reporter_default() {
        let reporter = ErrorReporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.verbose);

        // Just test that it doesn't panic
        ErrorReporter::new(false, true).report_error(&AppError::validation("count"));
    }
}

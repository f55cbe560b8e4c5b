//! Structured run logging
//!
//! Records carry a level, the emitting component, an optional run ID and a
//! sorted set of JSON fields. They render either as one human-readable line
//! or as one JSON object. Everything goes to stderr so stdout stays free for
//! ping lines and the summary.

use crate::error::AppError;
use crate::models::{AttemptOutcome, Config, ProbeConfig};
use crate::types::Termination;
use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn color(self) -> Color {
        match self {
            LogLevel::Debug => Color::Cyan,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    /// `--debug` shows everything, `--verbose` shows info, otherwise warnings only
    pub fn from_flags(debug: bool, verbose: bool) -> Self {
        match (debug, verbose) {
            (true, _) => LogLevel::Debug,
            (false, true) => LogLevel::Info,
            (false, false) => LogLevel::Warn,
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub fields: BTreeMap<String, Value>,
    /// `file:line` of the call site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// How records are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Human { color: bool, show_origin: bool },
    Json,
}

impl LogSink {
    /// Debug runs log JSON with call sites; everything else logs readable lines
    pub fn for_config(config: &Config) -> Self {
        if config.debug {
            LogSink::Json
        } else {
            LogSink::Human {
                color: config.enable_color,
                show_origin: false,
            }
        }
    }

    pub fn render(&self, record: &LogRecord) -> String {
        match *self {
            LogSink::Json => serde_json::to_string(record)
                .unwrap_or_else(|e| format!("{{\"level\":\"error\",\"message\":\"unserializable log record: {}\"}}", e)),
            LogSink::Human { color, show_origin } => render_human(record, color, show_origin),
        }
    }
}

fn render_human(record: &LogRecord, color: bool, show_origin: bool) -> String {
    let label = format!("{:>5}", record.level.label());
    let label = if color {
        label.color(record.level.color()).to_string()
    } else {
        label
    };

    let mut line = format!(
        "{} {} {}",
        record.at.format("%Y-%m-%d %H:%M:%S%.3f"),
        label,
        record.component
    );
    if let Some(run) = &record.run {
        line.push('[');
        line.extend(run.chars().take(8));
        line.push(']');
    }
    line.push_str(": ");
    line.push_str(&record.message);

    if !record.fields.is_empty() {
        let fields: Vec<String> = record.fields.iter().map(|(key, value)| format!("{}={}", key, value)).collect();
        line.push_str(&format!(" {{{}}}", fields.join(" ")));
    }
    if show_origin {
        if let Some(origin) = &record.origin {
            line.push_str(" @ ");
            line.push_str(origin);
        }
    }
    line
}

/// Named logger with a level threshold
#[derive(Debug, Clone)]
pub struct Logger {
    component: String,
    threshold: LogLevel,
    sink: LogSink,
    session: Option<Arc<str>>,
}

impl Logger {
    pub fn new(component: impl Into<String>, threshold: LogLevel, sink: LogSink) -> Self {
        Self {
            component: component.into(),
            threshold,
            sink,
            session: None,
        }
    }

    pub fn for_config(component: impl Into<String>, config: &Config) -> Self {
        Self::new(
            component,
            LogLevel::from_flags(config.debug, config.verbose),
            LogSink::for_config(config),
        )
    }

    fn with_session(mut self, session: Arc<str>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.threshold
    }

    pub fn record(&self, level: LogLevel, message: impl Into<String>) -> RecordBuilder<'_> {
        RecordBuilder {
            logger: self,
            record: LogRecord {
                at: Utc::now(),
                level,
                component: self.component.clone(),
                message: message.into(),
                session: self.session.as_deref().map(String::from),
                run: None,
                fields: BTreeMap::new(),
                origin: None,
            },
        }
    }

    pub fn debug(&self, message: impl Into<String>) -> RecordBuilder<'_> {
        self.record(LogLevel::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> RecordBuilder<'_> {
        self.record(LogLevel::Info, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> RecordBuilder<'_> {
        self.record(LogLevel::Warn, message)
    }

    fn write(&self, record: &LogRecord) {
        if self.enabled(record.level) {
            let _ = writeln!(io::stderr().lock(), "{}", self.sink.render(record));
        }
    }
}

/// Accumulates fields for one record before it is emitted
pub struct RecordBuilder<'a> {
    logger: &'a Logger,
    record: LogRecord,
}

impl RecordBuilder<'_> {
    pub fn run(mut self, run: &str) -> Self {
        self.record.run = Some(run.to_string());
        self
    }

    /// Values that fail to serialize are skipped
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.record.fields.insert(key.to_string(), value);
        }
        self
    }

    pub fn origin(mut self, file: &str, line: u32) -> Self {
        self.record.origin = Some(format!("{}:{}", file, line));
        self
    }

    /// Attempt fields; the record takes the attempt's completion time
    pub fn outcome(mut self, outcome: &AttemptOutcome) -> Self {
        self.record.at = outcome.timestamp();
        match outcome {
            AttemptOutcome::Success {
                status_code,
                body_bytes,
                timing,
                ..
            } => self
                .field("status_code", status_code)
                .field("body_bytes", body_bytes)
                .field("rtt_ms", timing.rtt_ms())
                .field("connection_ms", timing.connection_ms())
                .field("request_ms", timing.request_ms())
                .field("dial_count", timing.dial_count),
            AttemptOutcome::Failure { error, .. } => self.error(error),
        }
    }

    pub fn error(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_reason", error.reason())
            .field("recoverable", error.is_recoverable())
    }

    pub fn build(self) -> LogRecord {
        self.record
    }

    pub fn emit(self) {
        let logger = self.logger;
        logger.write(&self.build());
    }
}

/// Logs the lifecycle of one probe run under a single run ID
pub struct ProbeLogger {
    logger: Logger,
    run_id: String,
}

impl ProbeLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn log_probe_start(&self, probe: &ProbeConfig) {
        self.start_record(probe).emit();
    }

    /// Successes log at debug, failures at warn
    pub fn log_attempt(&self, sequence: u32, outcome: &AttemptOutcome) {
        self.attempt_record(sequence, outcome).emit();
    }

    pub fn log_termination(&self, termination: Termination, attempts: u32) {
        self.termination_record(termination, attempts).emit();
    }

    fn start_record(&self, probe: &ProbeConfig) -> RecordBuilder<'_> {
        self.logger
            .info(format!("{} {} x{}", probe.method, probe.destination, probe.count))
            .run(&self.run_id)
            .field("destination", &probe.destination)
            .field("method", &probe.method)
            .field("count", probe.count)
            .field("interval_ms", probe.interval.as_millis() as u64)
            .field("budget_ms", probe.time_budget().map(|budget| budget.as_millis() as u64))
            .field("timeout_ms", probe.transport.timeout.as_millis() as u64)
            .field("follow_redirects", probe.transport.follow_redirects)
            .field("verify_tls", probe.transport.verify_tls)
    }

    fn attempt_record(&self, sequence: u32, outcome: &AttemptOutcome) -> RecordBuilder<'_> {
        let builder = match outcome {
            AttemptOutcome::Success { status_code, timing, .. } => self
                .logger
                .debug(format!("seq {}: {} in {}ms", sequence, status_code, timing.rtt_ms())),
            AttemptOutcome::Failure { error, .. } => self
                .logger
                .warn(format!("seq {}: {}", sequence, error.reason())),
        };
        builder.run(&self.run_id).field("sequence", sequence).outcome(outcome)
    }

    fn termination_record(&self, termination: Termination, attempts: u32) -> RecordBuilder<'_> {
        self.logger
            .info(format!("stopped after {} attempt(s): {}", attempts, termination))
            .run(&self.run_id)
            .field("termination", termination)
            .field("attempts", attempts)
    }
}

/// Hands out loggers that share one session ID per process
pub struct LoggerFactory {
    config: Config,
    session: Arc<str>,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: Arc::from(Uuid::new_v4().to_string()),
        }
    }

    pub fn create_logger(&self, component: &str) -> Logger {
        Logger::for_config(component, &self.config).with_session(Arc::clone(&self.session))
    }

    pub fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger::new(self.create_logger("probe"))
    }
}

/// Debug record tagged with its call site
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format!($($arg)*)).origin(file!(), line!()).emit()
    };
}

/// Info record tagged with its call site
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format!($($arg)*)).origin(file!(), line!()).emit()
    };
}

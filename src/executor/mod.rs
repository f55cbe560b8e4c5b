//! Probe loop
//!
//! Drives sequential attempts against one destination:
//! - a fresh [`TimedTransport`] per attempt, so no connection is ever reused
//! - outcomes recorded into [`ProbeStatistics`] and handed to an [`AttemptReporter`]
//! - fixed pacing between attempts
//! - stops on cancellation, exhausted count, or exhausted `count × interval` budget

use crate::{
    client::TimedTransport,
    error::Result,
    logging::ProbeLogger,
    models::{AttemptOutcome, AttemptTiming, ProbeConfig},
    stats::ProbeStatistics,
    types::Termination,
};
use std::sync::Arc;
use tokio::{sync::watch, time::Instant};

/// Receives every attempt as soon as it completes
pub trait AttemptReporter: Send {
    /// Called once before the first attempt
    fn on_start(&mut self, _destination: &str) {}

    fn on_attempt(&mut self, sequence: u32, outcome: &AttemptOutcome);
}

/// Create a connected cancellation handle and token
pub fn cancellation_pair() -> (CancellationHandle, CancellationToken) {
    let (tx, rx) = watch::channel(false);
    (CancellationHandle { tx: Arc::new(tx) }, CancellationToken { rx })
}

/// Triggers cancellation; cheap to clone into signal handlers
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by the probe loop between attempts
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped first.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Sequential HTTP probe against a single destination
pub struct ProbeLoop {
    config: ProbeConfig,
    cancellation: CancellationToken,
    logger: Option<ProbeLogger>,
}

impl ProbeLoop {
    pub fn new(config: ProbeConfig, cancellation: CancellationToken) -> Self {
        Self {
            config,
            cancellation,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: ProbeLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Run attempts until cancelled, out of slots, or out of time.
    ///
    /// Checks happen at the top of every iteration; an attempt in flight is
    /// never interrupted.
    pub async fn run<R>(&self, stats: &mut ProbeStatistics, reporter: &mut R) -> Termination
    where
        R: AttemptReporter + ?Sized,
    {
        reporter.on_start(&self.config.destination);
        if let Some(logger) = &self.logger {
            logger.log_probe_start(&self.config);
        }

        let budget = self.config.time_budget();
        let started = Instant::now();

        let termination = loop {
            if self.cancellation.is_cancelled() {
                break Termination::Cancelled;
            }
            if !stats.has_capacity() {
                break Termination::CountExhausted;
            }
            if budget.is_some_and(|budget| started.elapsed() >= budget) {
                break Termination::BudgetExhausted;
            }

            let outcome = self.attempt().await;
            let sequence = stats.record(&outcome);

            if let Some(logger) = &self.logger {
                logger.log_attempt(sequence, &outcome);
            }
            reporter.on_attempt(sequence, &outcome);

            self.pace().await;
        };

        if let Some(logger) = &self.logger {
            logger.log_termination(termination, stats.attempts());
        }

        termination
    }

    /// One full attempt: build transport and request, exchange, read the body
    pub async fn attempt(&self) -> AttemptOutcome {
        match self.try_attempt().await {
            Ok(outcome) => outcome,
            Err(error) => AttemptOutcome::failure(error),
        }
    }

    async fn try_attempt(&self) -> Result<AttemptOutcome> {
        let transport = TimedTransport::new(&self.config.transport)?;
        let request = transport.request(&self.config.method, &self.config.destination)?;

        let response = transport.exchange(request).await?;
        let timing = AttemptTiming::from_transport(&transport.timings());
        let status_code = response.status().as_u16();

        let body = transport.read_body(response).await?;

        Ok(AttemptOutcome::success(status_code, body.len(), timing))
    }

    /// Sleep for the interval, cut short by cancellation
    async fn pace(&self) {
        tokio::select! {
            _ = tokio::time::sleep(self.config.interval) => {}
            _ = self.cancellation.cancelled() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::TransportOptions, types::AggregationMode};
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    /// Keeps (sequence, status or error category) of every attempt
    #[derive(Default)]
    struct RecordingReporter {
        destination: Option<String>,
        attempts: Vec<(u32, std::result::Result<u16, &'static str>)>,
        cancel_after: Option<(u32, CancellationHandle)>,
    }

    impl AttemptReporter for RecordingReporter {
        fn on_start(&mut self, destination: &str) {
            self.destination = Some(destination.to_string());
        }

        fn on_attempt(&mut self, sequence: u32, outcome: &AttemptOutcome) {
            let entry = match outcome {
                AttemptOutcome::Success { status_code, .. } => Ok(*status_code),
                AttemptOutcome::Failure { error, .. } => Err(error.category()),
            };
            self.attempts.push((sequence, entry));

            if let Some((after, handle)) = &self.cancel_after {
                if sequence == *after {
                    handle.cancel();
                }
            }
        }
    }

    fn loop_config(destination: String, count: u32, interval: Duration) -> ProbeConfig {
        ProbeConfig::new(destination, "GET", count)
            .with_interval(interval)
            .with_transport(TransportOptions::default().with_timeout(Duration::from_millis(500)))
    }

    async fn run(config: ProbeConfig) -> (ProbeStatistics, Termination, RecordingReporter) {
        let (_handle, token) = cancellation_pair();
        let mut stats = ProbeStatistics::new(config.destination.clone(), config.count);
        let mut reporter = RecordingReporter::default();
        let termination = ProbeLoop::new(config, token).run(&mut stats, &mut reporter).await;
        (stats, termination, reporter)
    }

    async fn ok_server(delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong").set_delay(delay))
            .mount(&server)
            .await;
        server
    }

    /// First `failures` requests time out, the rest answer after 20ms
    async fn flaky_server(failures: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .up_to_n_times(failures)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong").set_delay(Duration::from_millis(20)))
            .with_priority(2)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_cancellation_pair() {
        let (handle, token) = cancellation_pair();
        let observer = token.clone();
        assert!(!token.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(observer.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves() {
        let (handle, token) = cancellation_pair();
        let waiter = tokio::spawn(async move { token.cancelled().await });
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_runs_exactly_count_attempts_without_interval() {
        let server = ok_server(Duration::ZERO).await;
        let (stats, termination, reporter) = run(loop_config(format!("{}/", server.uri()), 5, Duration::ZERO)).await;

        assert_eq!(termination, Termination::CountExhausted);
        assert_eq!(stats.sequence_number(), 6);
        assert_eq!(stats.success_count(), 5);
        assert_eq!(stats.failure_count(), 0);
        assert_eq!(server.received_requests().await.unwrap().len(), 5);

        let sequences: Vec<u32> = reporter.attempts.iter().map(|(sequence, _)| *sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
        assert_eq!(reporter.destination.as_deref(), Some(format!("{}/", server.uri()).as_str()));
    }

    #[tokio::test]
    async fn test_all_success_rtt_ordering() {
        let server = ok_server(Duration::from_millis(15)).await;
        let (stats, _, _) = run(loop_config(format!("{}/", server.uri()), 3, Duration::ZERO)).await;

        let summary = stats.summarize(AggregationMode::SuccessfulOnly, Termination::CountExhausted).unwrap();
        assert!(summary.rtt.min_ms > 0);
        assert!(summary.rtt.min_ms as f64 <= summary.rtt.avg_ms);
        assert!(summary.rtt.avg_ms <= summary.rtt.max_ms as f64);
        assert_eq!(summary.success_rate_percent, 100);
    }

    #[tokio::test]
    async fn test_failed_slot_keeps_zero_minimum() {
        let server = flaky_server(1).await;
        let (stats, termination, reporter) = run(loop_config(server.uri(), 3, Duration::ZERO)).await;

        assert_eq!(termination, Termination::CountExhausted);
        assert_eq!(reporter.attempts[0], (1, Err("TIMEOUT")));
        assert_eq!(stats.success_count() + stats.failure_count(), 3);

        // legacy aggregation keeps the failed slot's zero
        let legacy = stats.rtt_summary(AggregationMode::ZeroFilled);
        assert_eq!(legacy.min_ms, 0);

        let redesigned = stats.rtt_summary(AggregationMode::SuccessfulOnly);
        assert!(redesigned.min_ms >= 20);
    }

    #[tokio::test]
    async fn test_success_rate_three_of_four() {
        let server = flaky_server(1).await;
        let (stats, _, _) = run(loop_config(server.uri(), 4, Duration::ZERO)).await;

        let summary = stats.summarize(AggregationMode::default(), Termination::CountExhausted).unwrap();
        assert_eq!(summary.transmitted, 4);
        assert_eq!(summary.received, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.success_rate_percent, 75);
    }

    #[tokio::test]
    async fn test_cancel_after_second_attempt() {
        let server = ok_server(Duration::ZERO).await;
        let config = loop_config(format!("{}/", server.uri()), 5, Duration::from_millis(50));

        let (handle, token) = cancellation_pair();
        let mut stats = ProbeStatistics::new(config.destination.clone(), config.count);
        let mut reporter = RecordingReporter {
            cancel_after: Some((2, handle)),
            ..Default::default()
        };
        let termination = ProbeLoop::new(config, token).run(&mut stats, &mut reporter).await;

        assert_eq!(termination, Termination::Cancelled);
        assert_eq!(stats.sequence_number(), 3);
        assert_eq!(reporter.attempts.len(), 2);

        let summary = stats.summarize(AggregationMode::default(), termination).unwrap();
        assert_eq!(summary.transmitted, 2);
        assert_eq!(summary.received, 2);
    }

    #[tokio::test]
    async fn test_cancel_cuts_pacing_sleep_short() {
        let server = ok_server(Duration::ZERO).await;
        let config = loop_config(format!("{}/", server.uri()), 3, Duration::from_secs(30));

        let (handle, token) = cancellation_pair();
        let mut stats = ProbeStatistics::new(config.destination.clone(), config.count);
        let mut reporter = RecordingReporter {
            cancel_after: Some((1, handle)),
            ..Default::default()
        };

        let started = std::time::Instant::now();
        let termination = ProbeLoop::new(config, token).run(&mut stats, &mut reporter).await;

        assert_eq!(termination, Termination::Cancelled);
        assert_eq!(stats.attempts(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let server = ok_server(Duration::ZERO).await;
        let config = loop_config(format!("{}/", server.uri()), 3, Duration::ZERO);

        let (handle, token) = cancellation_pair();
        handle.cancel();
        let mut stats = ProbeStatistics::new(config.destination.clone(), config.count);
        let termination = ProbeLoop::new(config, token)
            .run(&mut stats, &mut RecordingReporter::default())
            .await;

        assert_eq!(termination, Termination::Cancelled);
        assert_eq!(stats.attempts(), 0);
        assert!(stats.summarize(AggregationMode::default(), termination).is_err());
    }

    #[tokio::test]
    async fn test_budget_stops_slow_run() {
        let server = ok_server(Duration::from_millis(300)).await;
        // budget = 10 × 100ms, each attempt takes ~400ms
        let (stats, termination, _) = run(loop_config(format!("{}/", server.uri()), 10, Duration::from_millis(100))).await;

        assert_eq!(termination, Termination::BudgetExhausted);
        assert!(stats.attempts() >= 1);
        assert!(stats.attempts() < 10);
        assert_eq!(stats.rtt_samples().len(), 10);
    }

    #[tokio::test]
    async fn test_invalid_method_fails_every_attempt() {
        let mut config = loop_config("http://127.0.0.1:9/".to_string(), 2, Duration::ZERO);
        config.method = "BAD METHOD".to_string();
        let (stats, termination, reporter) = run(config).await;

        assert_eq!(termination, Termination::CountExhausted);
        assert_eq!(stats.failure_count(), 2);
        assert_eq!(stats.sequence_number(), 3);
        assert!(reporter.attempts.iter().all(|(_, entry)| *entry == Err("REQUEST")));
    }

    #[tokio::test]
    async fn test_redirect_status_recorded_when_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
            .mount(&server)
            .await;

        let mut config = loop_config(format!("{}/old", server.uri()), 1, Duration::ZERO);
        config.transport = config.transport.with_redirects(false);
        let (_, _, reporter) = run(config).await;

        assert_eq!(reporter.attempts, vec![(1, Ok(302))]);
    }

    #[tokio::test]
    async fn test_refused_connection_is_counted() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (stats, termination, reporter) =
            run(loop_config(format!("http://127.0.0.1:{}/", port), 2, Duration::ZERO)).await;

        assert_eq!(termination, Termination::CountExhausted);
        assert_eq!(stats.failure_count(), 2);
        assert!(reporter.attempts.iter().all(|(_, entry)| *entry == Err("NETWORK")));
    }

    /// Answers every connection with a Content-Length the body never reaches
    async fn truncated_body_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                    .await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://127.0.0.1:{}/", port)
    }

    #[tokio::test]
    async fn test_short_body_is_a_failure_and_run_continues() {
        let destination = truncated_body_server().await;
        let (stats, termination, reporter) = run(loop_config(destination, 2, Duration::ZERO)).await;

        assert_eq!(termination, Termination::CountExhausted);
        assert_eq!(stats.failure_count(), 2);
        assert_eq!(stats.success_count(), 0);
        assert_eq!(stats.sequence_number(), 3);
        assert_eq!(reporter.attempts, vec![(1, Err("BODY")), (2, Err("BODY"))]);
    }
}

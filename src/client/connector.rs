//! Connector layer that times every TCP dial

use super::{lock_timings, TransportTimings};
use futures::future::BoxFuture;
use std::{
    io,
    sync::{Arc, Mutex},
    task::{Context, Poll},
    time::{Duration, Instant},
};
use tower::{Layer, Service};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Wraps the plain TCP connector in a [`TimedConnector`]
#[derive(Debug, Clone)]
pub struct TimedConnectLayer {
    timings: Arc<Mutex<TransportTimings>>,
    dial_timeout: Duration,
}

impl TimedConnectLayer {
    pub fn new(timings: Arc<Mutex<TransportTimings>>, dial_timeout: Duration) -> Self {
        Self { timings, dial_timeout }
    }
}

impl<S> Layer<S> for TimedConnectLayer {
    type Service = TimedConnector<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimedConnector {
            inner,
            timings: Arc::clone(&self.timings),
            dial_timeout: self.dial_timeout,
        }
    }
}

/// Records dial start before delegating and dial end once the inner
/// connector returns, fails, or runs past the dial timeout
#[derive(Debug, Clone)]
pub struct TimedConnector<S> {
    inner: S,
    timings: Arc<Mutex<TransportTimings>>,
    dial_timeout: Duration,
}

impl<S, R> Service<R> for TimedConnector<S>
where
    S: Service<R>,
    S::Response: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, destination: R) -> Self::Future {
        let timings = Arc::clone(&self.timings);
        let dial_timeout = self.dial_timeout;

        lock_timings(&timings).mark_dial_start(Instant::now());
        let connecting = self.inner.call(destination);

        Box::pin(async move {
            let result = tokio::time::timeout(dial_timeout, connecting).await;
            lock_timings(&timings).mark_dial_end(Instant::now());

            match result {
                Ok(connected) => connected.map_err(Into::into),
                Err(_) => Err(Box::new(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("dial timed out after {}ms", dial_timeout.as_millis()),
                )) as BoxError),
            }
        })
    }
}

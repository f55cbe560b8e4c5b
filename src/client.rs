//! Timed HTTP transport
//!
//! Every probe attempt gets its own [`TimedTransport`]: a hyper client with
//! connection pooling disabled. Its connector stack is a plain TCP
//! `HttpConnector` wrapped by [`connector::TimedConnector`], with TLS layered
//! outside by hyper-rustls, so a dial covers name resolution and the TCP
//! connect but never the TLS handshake. The transport records when the
//! exchange starts and when the final response headers arrive. From those
//! four instants it derives total, connection and request-only durations.

pub mod connector;
mod tls;


use crate::error::{AppError, Result};
use connector::TimedConnectLayer;
use http_body_util::{BodyExt, Empty};
use hyper::{
    body::{Bytes, Incoming},
    header::{LOCATION, USER_AGENT},
    Method, Request, Response, StatusCode, Uri,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use thiserror::Error;
use tower::Layer;
use url::Url;

type TimedHttpsConnector = HttpsConnector<connector::TimedConnector<HttpConnector>>;

/// Errors surfaced by [`TimedTransport::exchange`] and [`TimedTransport::read_body`]
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error(transparent)]
    Client(#[from] hyper_util::client::legacy::Error),

    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),

    #[error("invalid redirect: {0}")]
    Redirect(String),

    #[error("failed to read response body")]
    Body(#[source] hyper::Error),
}

/// Per-attempt transport settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub follow_redirects: bool,
    pub max_redirects: usize,
    pub verify_tls: bool,
    /// Whole-attempt timeout (dial, exchange and body)
    pub timeout: Duration,
    /// Upper bound for a single TCP dial
    pub dial_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            max_redirects: crate::defaults::DEFAULT_MAX_REDIRECTS,
            verify_tls: true,
            timeout: crate::defaults::DEFAULT_TIMEOUT,
            dial_timeout: crate::defaults::DEFAULT_DIAL_TIMEOUT,
            user_agent: format!("{}/{}", crate::PKG_NAME, crate::VERSION),
        }
    }
}

impl TransportOptions {
    /// Set follow redirects behavior
    pub fn with_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_tls_verification(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Set per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_dial_timeout(mut self, dial_timeout: Duration) -> Self {
        self.dial_timeout = dial_timeout;
        self
    }
}

/// The four instants recorded around one exchange, plus the dial counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportTimings {
    dial_start: Option<Instant>,
    dial_end: Option<Instant>,
    exchange_start: Option<Instant>,
    exchange_end: Option<Instant>,
    dial_count: u32,
}

impl TransportTimings {
    /// Begin a new exchange window. Dial data from earlier exchanges is dropped.
    pub fn mark_exchange_start(&mut self, at: Instant) {
        *self = Self {
            exchange_start: Some(at),
            ..Self::default()
        };
    }

    pub fn mark_exchange_end(&mut self, at: Instant) {
        self.exchange_end = Some(at);
    }

    /// A new dial overwrites the previous one; only the last dial is kept
    pub fn mark_dial_start(&mut self, at: Instant) {
        self.dial_start = Some(at);
        self.dial_end = None;
        self.dial_count = self.dial_count.saturating_add(1);
    }

    pub fn mark_dial_end(&mut self, at: Instant) {
        self.dial_end = Some(at);
    }

    /// Exchange start to response headers; zero until both are recorded
    pub fn total_duration(&self) -> Duration {
        span(self.exchange_start, self.exchange_end)
    }

    /// Duration of the last dial; zero if no dial completed
    pub fn connection_duration(&self) -> Duration {
        span(self.dial_start, self.dial_end)
    }

    pub fn request_only_duration(&self) -> Duration {
        self.total_duration().saturating_sub(self.connection_duration())
    }

    pub fn dial_count(&self) -> u32 {
        self.dial_count
    }

    /// Only a single dial can be subtracted meaningfully from the total
    pub fn is_decomposable(&self) -> bool {
        self.dial_count == 1
    }
}

fn span(start: Option<Instant>, end: Option<Instant>) -> Duration {
    match (start, end) {
        (Some(start), Some(end)) => end.saturating_duration_since(start),
        _ => Duration::ZERO,
    }
}

/// One-shot HTTP transport that records dial and exchange timings
pub struct TimedTransport {
    client: Client<TimedHttpsConnector, Empty<Bytes>>,
    options: TransportOptions,
    timings: Arc<Mutex<TransportTimings>>,
}

impl TimedTransport {
    /// Build a fresh transport. Nothing is shared with earlier transports.
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let timings = Arc::new(Mutex::new(TransportTimings::default()));

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        let timed = TimedConnectLayer::new(Arc::clone(&timings), options.dial_timeout).layer(http);

        let https = HttpsConnectorBuilder::new()
            .with_tls_config(tls::client_config(options.verify_tls)?)
            .https_or_http()
            .enable_http1()
            .wrap_connector(timed);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(https);

        Ok(Self {
            client,
            options: options.clone(),
            timings,
        })
    }

    /// Build a request for `method` and `url` without sending it
    pub fn request(&self, method: &str, url: &str) -> Result<Request<Empty<Bytes>>> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| AppError::request_build(format!("invalid method {:?}: {}", method, e)))?;
        let url = Url::parse(url)
            .map_err(|e| AppError::request_build(format!("invalid URL {:?}: {}", url, e)))?;
        self.build(method, &url)
            .map_err(|e| AppError::request_build(e.to_string()))
    }

    /// Send the request and wait for the final response headers, following
    /// redirects when enabled.
    ///
    /// The result is returned unchanged; the body is left to the caller.
    pub async fn exchange(
        &self,
        request: Request<Empty<Bytes>>,
    ) -> std::result::Result<Response<Incoming>, TransportError> {
        self.lock().mark_exchange_start(Instant::now());
        let result = tokio::time::timeout(self.options.timeout, self.send(request)).await;
        self.lock().mark_exchange_end(Instant::now());

        result.unwrap_or_else(|_| Err(TransportError::Timeout(self.options.timeout)))
    }

    /// Drain the response body within what is left of the attempt timeout
    pub async fn read_body(&self, response: Response<Incoming>) -> std::result::Result<Bytes, TransportError> {
        let elapsed = self
            .timings()
            .exchange_start
            .map_or(Duration::ZERO, |start| start.elapsed());
        let remaining = self.options.timeout.saturating_sub(elapsed);

        match tokio::time::timeout(remaining, response.into_body().collect()).await {
            Ok(Ok(collected)) => Ok(collected.to_bytes()),
            Ok(Err(error)) => Err(TransportError::Body(error)),
            Err(_) => Err(TransportError::Timeout(self.options.timeout)),
        }
    }

    async fn send(
        &self,
        mut request: Request<Empty<Bytes>>,
    ) -> std::result::Result<Response<Incoming>, TransportError> {
        let mut redirects = 0;
        loop {
            let method = request.method().clone();
            let uri = request.uri().clone();
            let response = self.client.request(request).await?;

            let Some((method, target)) = self.redirect_target(method, &uri, &response)? else {
                return Ok(response);
            };
            if redirects == self.options.max_redirects {
                return Err(TransportError::TooManyRedirects(redirects));
            }
            redirects += 1;

            request = self
                .build(method, &target)
                .map_err(|e| TransportError::Redirect(e.to_string()))?;
        }
    }

    /// Where a redirect response points, or `None` if it should be returned as is
    fn redirect_target(
        &self,
        method: Method,
        uri: &Uri,
        response: &Response<Incoming>,
    ) -> std::result::Result<Option<(Method, Url)>, TransportError> {
        let status = response.status();
        let followed = matches!(
            status,
            StatusCode::MOVED_PERMANENTLY
                | StatusCode::FOUND
                | StatusCode::SEE_OTHER
                | StatusCode::TEMPORARY_REDIRECT
                | StatusCode::PERMANENT_REDIRECT
        );
        if !self.options.follow_redirects || !followed {
            return Ok(None);
        }
        let Some(location) = response.headers().get(LOCATION) else {
            return Ok(None);
        };

        let location = location
            .to_str()
            .map_err(|_| TransportError::Redirect("Location header is not valid text".to_string()))?;
        let target = Url::parse(&uri.to_string())
            .and_then(|base| base.join(location))
            .map_err(|e| TransportError::Redirect(format!("{:?}: {}", location, e)))?;
        if !matches!(target.scheme(), "http" | "https") {
            return Err(TransportError::Redirect(format!("unsupported scheme in {}", target)));
        }

        // 303 always becomes GET; 301/302 only rewrite POST
        let method = match status {
            StatusCode::SEE_OTHER if method != Method::HEAD => Method::GET,
            StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND if method == Method::POST => Method::GET,
            _ => method,
        };

        Ok(Some((method, target)))
    }

    fn build(&self, method: Method, url: &Url) -> http::Result<Request<Empty<Bytes>>> {
        let uri: Uri = url.as_str().parse()?;
        Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_AGENT, self.options.user_agent.as_str())
            .body(Empty::new())
    }

    /// Snapshot of the recorded instants
    pub fn timings(&self) -> TransportTimings {
        *self.lock()
    }

    pub fn total_duration(&self) -> Duration {
        self.timings().total_duration()
    }

    pub fn connection_duration(&self) -> Duration {
        self.timings().connection_duration()
    }

    pub fn request_only_duration(&self) -> Duration {
        self.timings().request_only_duration()
    }

    pub fn dial_count(&self) -> u32 {
        self.timings().dial_count()
    }

    pub fn is_decomposable(&self) -> bool {
        self.timings().is_decomposable()
    }

    fn lock(&self) -> MutexGuard<'_, TransportTimings> {
        lock_timings(&self.timings)
    }
}

/// A panic while holding the lock leaves plain timestamps behind, still usable
pub(crate) fn lock_timings(timings: &Mutex<TransportTimings>) -> MutexGuard<'_, TransportTimings> {
    timings.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

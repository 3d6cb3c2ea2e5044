use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sonic_rs::from_slice;
use thiserror::Error;

pub type TransportFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type HttpResult<T> = Result<T, HttpError>;

/// Where a transport sits between requests. Callers never need this; the
/// mock transport tracks it so tests can assert on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Idle,
    Busy,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpErrorKind {
    Connect,
    Send,
    Receive,
    Timeout,
    Rejected,
    Parse,
    Internal,
}

/// Every fault below the status-code level: connection setup, request send,
/// body receive, timeouts, and payload decoding. Responses carrying an error
/// status are not an `HttpError`; callers branch on [`HttpResponse::status`].
#[derive(Clone, Debug, Error)]
#[error("http error {kind:?} status={status:?} retryable={retryable} {message}")]
pub struct HttpError {
    kind: HttpErrorKind,
    status: Option<u16>,
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn new(
        kind: HttpErrorKind,
        status: Option<u16>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            retryable,
        }
    }

    pub fn connect(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::new(HttpErrorKind::Connect, status, message, retryable)
    }

    pub fn send(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::new(HttpErrorKind::Send, status, message, retryable)
    }

    pub fn receive(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::new(HttpErrorKind::Receive, status, message, retryable)
    }

    pub fn timeout(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::new(HttpErrorKind::Timeout, status, message, retryable)
    }

    pub fn rejected(status: u16, message: impl Into<String>, retryable: bool) -> Self {
        Self::new(HttpErrorKind::Rejected, Some(status), message, retryable)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Parse, None, message, false)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Internal, None, message, false)
    }

    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    fn from_reqwest(phase: HttpErrorKind, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            HttpErrorKind::Timeout
        } else if err.is_connect() {
            HttpErrorKind::Connect
        } else {
            phase
        };
        Self::new(
            kind,
            err.status().map(|code| code.as_u16()),
            err.to_string(),
            err.is_timeout() || err.is_connect() || err.is_request(),
        )
    }
}

impl From<sonic_rs::Error> for HttpError {
    fn from(err: sonic_rs::Error) -> Self {
        Self::parse(err.to_string())
    }
}

fn find_header<'a>(headers: &'a [(String, Bytes)], name: &str) -> Option<&'a [u8]> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_ref())
}

/// A request under construction. Bodies and header values are [`Bytes`] so a
/// queued mock fixture and a real wire payload share storage.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    method: Method,
    url: String,
    headers: Vec<(String, Bytes)>,
    body: Option<Bytes>,
    timeout: Duration,
}

impl HttpRequest {
    /// Applied to every request not overridden with [`HttpRequest::with_timeout`].
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        find_header(&self.headers, name)
    }

    pub fn headers(&self) -> &[(String, Bytes)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// A completed exchange. The body stays in the [`Bytes`] the transport
/// produced it in; [`HttpResponse::json`] decodes without copying it out.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    status: u16,
    headers: Vec<(String, Bytes)>,
    body: Bytes,
    elapsed: Duration,
}

impl HttpResponse {
    pub fn new(
        status: u16,
        headers: Vec<(String, Bytes)>,
        body: impl Into<Bytes>,
        elapsed: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            elapsed,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        find_header(&self.headers, name)
    }

    pub fn headers(&self) -> &[(String, Bytes)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn json<T: DeserializeOwned>(&self) -> HttpResult<T> {
        from_slice(&self.body).map_err(HttpError::from)
    }
}

/// The injected HTTP capability. Production uses [`ReqwestTransport`]; tests
/// swap in [`crate::mock::MockTransport`].
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> TransportFuture<HttpResult<HttpResponse>>;
}

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn HttpTransport>,
}

impl Client {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    pub fn with_transport<T>(transport: T) -> Self
    where
        T: HttpTransport + 'static,
    {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        self.transport.execute(request).await
    }

    pub async fn execute_json<T>(&self, request: HttpRequest) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        self.execute(request).await?.json::<T>()
    }

    pub async fn get_url(&self, url: impl Into<String>) -> HttpResult<HttpResponse> {
        self.execute(HttpRequest::get(url)).await
    }

    pub async fn post_json<T: Serialize>(
        &self,
        url: impl Into<String>,
        payload: &T,
    ) -> HttpResult<HttpResponse> {
        let body = sonic_rs::to_vec(payload)?;
        self.execute(HttpRequest::post(url).with_body(body)).await
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: ReqwestClient::new(),
        }
    }

    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }

    fn assemble(
        client: &ReqwestClient,
        request: HttpRequest,
    ) -> HttpResult<reqwest::RequestBuilder> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;

        let mut builder = client.request(method, url).timeout(timeout);
        for (key, value) in headers {
            let value = HeaderValue::from_bytes(value.as_ref()).map_err(|err| {
                HttpError::internal(format!("header {key} carries an invalid value: {err}"))
            })?;
            builder = builder.header(key, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        Ok(builder)
    }

    fn collect_headers(map: &HeaderMap) -> Vec<(String, Bytes)> {
        map.iter()
            .map(|(name, value)| (name.to_string(), Bytes::copy_from_slice(value.as_bytes())))
            .collect()
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> TransportFuture<HttpResult<HttpResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let start = Instant::now();

            let upstream = Self::assemble(&client, request)?
                .send()
                .await
                .map_err(|err| HttpError::from_reqwest(HttpErrorKind::Send, err))?;

            let status = upstream.status().as_u16();
            let headers = Self::collect_headers(upstream.headers());
            let body = upstream
                .bytes()
                .await
                .map_err(|err| HttpError::from_reqwest(HttpErrorKind::Receive, err))?;

            Ok(HttpResponse::new(status, headers, body, start.elapsed()))
        })
    }
}

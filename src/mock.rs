use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Method;

use crate::form::UiBindings;
use crate::http::{
    HttpError, HttpRequest, HttpResponse, HttpResult, HttpTransport, TransportFuture,
    TransportState,
};

/// One scripted step, consumed per request in FIFO order. An exhausted script
/// keeps passing requests through. `Fail` carries the exact error the
/// transport will return, built with the [`HttpError`] constructors.
#[derive(Clone, Debug, Default)]
pub enum ScriptStep {
    #[default]
    Pass,
    Delay(Duration),
    Reject {
        status: u16,
        reason: String,
    },
    Fail(HttpError),
    Drop,
}

impl ScriptStep {
    pub fn delay(ms: u64) -> Self {
        Self::Delay(Duration::from_millis(ms))
    }

    pub fn reject(status: u16, reason: impl Into<String>) -> Self {
        Self::Reject {
            status,
            reason: reason.into(),
        }
    }

    pub fn fail(error: HttpError) -> Self {
        Self::Fail(error)
    }
}

#[derive(Clone, Debug, Default)]
pub struct TransportScript {
    steps: VecDeque<ScriptStep>,
}

impl TransportScript {
    pub fn push(&mut self, step: ScriptStep) {
        self.steps.push_back(step);
    }

    fn next(&mut self) -> ScriptStep {
        self.steps.pop_front().unwrap_or_default()
    }

    fn remaining(&self) -> usize {
        self.steps.len()
    }
}

/// A stubbed response body. Most fixtures are a status and a body; headers
/// are there for the tests that read them back off [`HttpResponse`].
#[derive(Clone, Debug)]
pub struct CannedResponse {
    status: u16,
    headers: Vec<(String, Bytes)>,
    body: Bytes,
}

impl CannedResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Point-in-time copy of the mock's bookkeeping.
#[derive(Clone, Debug)]
pub struct TransportSnapshot {
    pub state: TransportState,
    pub request_count: usize,
    pub response_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
    pub script_remaining: usize,
    pub stub_remaining: usize,
}

#[derive(Debug, Default)]
struct MockTransportState {
    state: TransportState,
    last_url: Option<String>,
    last_status: Option<u16>,
    last_error: Option<String>,
    script: TransportScript,
    stubs: HashMap<(Method, String), VecDeque<CannedResponse>>,
    sent: Vec<HttpRequest>,
    received: Vec<HttpResponse>,
}

impl MockTransportState {
    fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            state: self.state,
            request_count: self.sent.len(),
            response_count: self.received.len(),
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            last_error: self.last_error.clone(),
            script_remaining: self.script.remaining(),
            stub_remaining: self.stubs.values().map(VecDeque::len).sum(),
        }
    }

    fn note_request(&mut self, request: &HttpRequest) {
        self.sent.push(request.clone());
        self.last_url = Some(request.url().to_string());
        self.state = TransportState::Busy;
        self.last_error = None;
    }

    fn note_failure(&mut self, error: &HttpError) {
        self.state = TransportState::Error;
        self.last_error = Some(error.message().to_string());
        self.last_status = error.status();
    }

    fn note_response(&mut self, response: &HttpResponse) {
        self.state = TransportState::Idle;
        self.last_status = Some(response.status());
        self.received.push(response.clone());
    }
}

/// In-memory transport: responses come from per-route stub queues (an
/// unstubbed route answers an empty 200), failures from a scripted step
/// queue. Every request and response is retained for assertions.
#[derive(Clone, Debug)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportState::default())),
        }
    }

    pub fn scripted(script: TransportScript) -> Self {
        let transport = Self::new();
        transport.lock("installing script").script = script;
        transport
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        self.lock("taking snapshot").snapshot()
    }

    pub fn stub(&self, method: Method, url: impl Into<String>, response: CannedResponse) {
        self.lock("stubbing route")
            .stubs
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    pub fn stub_post(&self, url: impl Into<String>, response: CannedResponse) {
        self.stub(Method::POST, url, response);
    }

    pub fn stub_get(&self, url: impl Into<String>, response: CannedResponse) {
        self.stub(Method::GET, url, response);
    }

    /// Clones of every request this transport saw, oldest first.
    pub fn sent_requests(&self) -> Vec<HttpRequest> {
        self.lock("reading sent requests").sent.clone()
    }

    fn lock(&self, while_doing: &str) -> MutexGuard<'_, MockTransportState> {
        self.inner
            .lock()
            .unwrap_or_else(|_| panic!("mock transport mutex poisoned while {while_doing}"))
    }

    fn fail(&self, error: HttpError) -> HttpError {
        self.lock("recording failure").note_failure(&error);
        error
    }

    fn next_stub(&self, request: &HttpRequest) -> Option<CannedResponse> {
        let key = (request.method().clone(), request.url().to_string());
        self.lock("selecting stub")
            .stubs
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for MockTransport {
    fn execute(&self, request: HttpRequest) -> TransportFuture<HttpResult<HttpResponse>> {
        let transport = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let step = transport.lock("advancing script").script.next();
            if let ScriptStep::Delay(duration) = step {
                // Blocking on purpose: the mock must not depend on a runtime.
                std::thread::sleep(duration);
            }

            transport.lock("recording request").note_request(&request);

            let fault = match step {
                ScriptStep::Pass | ScriptStep::Delay(_) => None,
                ScriptStep::Fail(error) => Some(error),
                ScriptStep::Reject { status, reason } => {
                    Some(HttpError::rejected(status, reason, true))
                }
                ScriptStep::Drop => Some(HttpError::timeout(
                    "mock transport dropped response",
                    None,
                    false,
                )),
            };
            if let Some(error) = fault {
                return Err(transport.fail(error));
            }

            let response = match transport.next_stub(&request) {
                Some(canned) => {
                    HttpResponse::new(canned.status, canned.headers, canned.body, start.elapsed())
                }
                // An unstubbed route answers an empty success rather than
                // failing the test setup.
                None => HttpResponse::new(200, Vec::new(), Bytes::new(), start.elapsed()),
            };
            transport.lock("recording response").note_response(&response);
            Ok(response)
        })
    }
}

/// One UI mutation, in the order the form performed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Display(String),
    ErrorFlag,
    Alert(String),
}

#[derive(Debug, Default)]
struct UiState {
    display: Option<String>,
    error_flag: bool,
    alerts: Vec<String>,
    events: Vec<UiEvent>,
}

/// Recording stand-in for the reactive values a browser page would own:
/// the display value, the error flag, and the blocking alert.
#[derive(Clone, Debug, Default)]
pub struct MockUiBindings {
    state: Arc<Mutex<UiState>>,
}

impl MockUiBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> Option<String> {
        self.lock().display.clone()
    }

    pub fn error_flag(&self) -> bool {
        self.lock().error_flag
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock().alerts.clone()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.lock().events.clone()
    }

    fn lock(&self) -> MutexGuard<'_, UiState> {
        self.state.lock().expect("ui bindings mutex poisoned")
    }
}

impl UiBindings for MockUiBindings {
    fn set_display(&self, message: &str) {
        let mut state = self.lock();
        state.display = Some(message.to_string());
        state.events.push(UiEvent::Display(message.to_string()));
    }

    fn raise_error_flag(&self) {
        let mut state = self.lock();
        state.error_flag = true;
        state.events.push(UiEvent::ErrorFlag);
    }

    fn notify(&self, text: &str) {
        let mut state = self.lock();
        state.alerts.push(text.to_string());
        state.events.push(UiEvent::Alert(text.to_string()));
    }
}

//! Model submission over HTTP: a zero-copy reqwest client whose form-side
//! status dispatch drives UI bindings, plus the axum service and file store
//! it talks to. An in-memory mock transport keeps tests fully deterministic.

pub mod api;
pub mod config;
pub mod form;
pub mod http;
pub mod mock;
pub mod model;
pub mod service;
pub mod store;

pub use bytes::Bytes;
pub use reqwest::Method;

pub use form::{ModelForm, ModelPayload, ScalarValue, SubmitOutcome, UiBindings};
pub use http::{
    Client, HttpError, HttpErrorKind, HttpRequest, HttpResponse, HttpResult, HttpTransport,
    ReqwestTransport, TransportFuture, TransportState,
};
pub use mock::{
    CannedResponse, MockTransport, MockUiBindings, ScriptStep, TransportScript, TransportSnapshot,
    UiEvent,
};
pub use model::{ErrorReply, MessageReply, ModelDraft, ModelRecord, ValidationErrors};

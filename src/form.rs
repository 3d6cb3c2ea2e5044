//! The model-creation form flow: build `{name, value}`, POST it to the fixed
//! `/model1` endpoint, and route the status-coded outcome to injected UI
//! bindings.

use serde::Serialize;
use tracing::debug;

use crate::http::{Client, HttpRequest, HttpResponse, HttpResult};
use crate::model::{ErrorReply, MessageReply};

/// Fixed endpoint path the form posts to.
pub const MODEL_ENDPOINT: &str = "/model1";

/// Exact content type the form sends.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Any JSON-serializable scalar a form value may carry. The server only
/// accepts integers; the other forms exist so a caller can submit what a
/// browser form would, and see the 422 the server answers with.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The request payload. Built fresh per call, discarded after; serializes to
/// exactly `{"name": <name>, "value": <value>}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelPayload {
    pub name: String,
    pub value: ScalarValue,
}

/// The externally owned reactive surface the form mutates: a display value
/// for successful results, an error flag it only ever raises, and a blocking
/// notification. Implementations own their interior mutability.
pub trait UiBindings: Send + Sync {
    fn set_display(&self, message: &str);
    fn raise_error_flag(&self);
    fn notify(&self, text: &str);
}

/// What a submission did, beyond its UI side effects. `Unhandled` covers
/// every status outside {200, 400, 422}: the bindings stay untouched and no
/// notification fires, but the caller can see what came back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { message: String },
    Rejected { detail: String },
    Invalid { body: String },
    Unhandled { status: u16 },
}

/// A model-creation form bound to one server. Transport faults and
/// undecodable branch bodies come back as `Err`, never as silent UI state.
pub struct ModelForm {
    client: Client,
    base_url: String,
}

impl ModelForm {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), MODEL_ENDPOINT)
    }

    /// Submit `{name, value}` and dispatch on the response status:
    /// 200 sets the display value from `message`, 400 raises the error flag
    /// and notifies with `detail`, 422 raises the flag and notifies with the
    /// whole body re-stringified, anything else touches nothing.
    pub async fn create(
        &self,
        ui: &dyn UiBindings,
        name: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> HttpResult<SubmitOutcome> {
        let payload = ModelPayload {
            name: name.into(),
            value: value.into(),
        };
        let body = sonic_rs::to_vec(&payload)?;

        let response = self
            .client
            .execute(
                HttpRequest::post(self.endpoint())
                    .with_header("Content-Type", JSON_CONTENT_TYPE)
                    .with_body(body),
            )
            .await?;

        debug!(status = response.status(), "model form response");
        self.dispatch(ui, &response)
    }

    fn dispatch(&self, ui: &dyn UiBindings, response: &HttpResponse) -> HttpResult<SubmitOutcome> {
        match response.status() {
            200 => {
                let reply: MessageReply = response.json()?;
                ui.set_display(&reply.message);
                Ok(SubmitOutcome::Accepted {
                    message: reply.message,
                })
            }
            400 => {
                let reply: ErrorReply = response.json()?;
                ui.raise_error_flag();
                ui.notify(&reply.detail);
                Ok(SubmitOutcome::Rejected {
                    detail: reply.detail,
                })
            }
            422 => {
                let value: sonic_rs::Value = response.json()?;
                let body = sonic_rs::to_string(&value)?;
                ui.raise_error_flag();
                ui.notify(&body);
                Ok(SubmitOutcome::Invalid { body })
            }
            status => Ok(SubmitOutcome::Unhandled { status }),
        }
    }
}

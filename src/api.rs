use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::model::{ErrorReply, MessageReply, ModelDraft, ModelRecord, ValidationErrors};
use crate::service::{self, ServiceError};
use crate::store::ModelStore;

pub struct ApiContext {
    store: ModelStore,
}

type HandlerContext = Arc<ApiContext>;

pub fn router(store: ModelStore) -> Router {
    let ctx = Arc::new(ApiContext { store });
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health))
        .route("/info", get(app_info))
        .route("/model1", post(create_model1))
        .route("/model1/stored", get(stored_models))
        .route("/model1/{name}", patch(add_model_value))
        .with_state(ctx)
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_user_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "request failed on storage");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (
            status,
            Json(ErrorReply {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Undecodable request bodies, FastAPI-shaped: a body that parses but does
/// not fit the draft answers 422 with an `errors` array; malformed JSON
/// answers 400 with a `detail`.
fn undecodable_body(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let text = rejection.body_text();
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        (status, Json(ValidationErrors { errors: vec![text] })).into_response()
    } else {
        (status, Json(ErrorReply { detail: text })).into_response()
    }
}

async fn create_model1(
    State(ctx): State<HandlerContext>,
    draft: Result<Json<ModelDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(draft) = match draft {
        Ok(draft) => draft,
        Err(rejection) => return Ok(undecodable_body(rejection)),
    };

    info!(name = %draft.name, value = draft.value, "create model request");
    service::create_model(&ctx.store, draft)?;
    Ok((
        StatusCode::OK,
        Json(MessageReply {
            message: "Model created".to_string(),
        }),
    )
        .into_response())
}

async fn stored_models(
    State(ctx): State<HandlerContext>,
) -> Result<Json<Vec<ModelRecord>>, ApiError> {
    Ok(Json(service::list_models(&ctx.store)?))
}

#[derive(Debug, Deserialize)]
pub struct AddValue {
    pub value: i64,
}

async fn add_model_value(
    State(ctx): State<HandlerContext>,
    Path(name): Path<String>,
    Query(params): Query<AddValue>,
) -> Result<Response, ApiError> {
    info!(name = %name, delta = params.value, "add value request");
    service::add_value(&ctx.store, &name, params.value)?;
    Ok((
        StatusCode::OK,
        Json(MessageReply {
            message: "Model updated".to_string(),
        }),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
struct HelloReply {
    message: &'static str,
    timestamp: String,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthReply {
    status: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct InfoReply {
    app: &'static str,
    version: &'static str,
    timestamp: String,
}

async fn hello() -> Json<HelloReply> {
    Json(HelloReply {
        message: "Hello from model-store",
        timestamp: now(),
        status: "healthy",
    })
}

async fn health() -> Json<HealthReply> {
    Json(HealthReply {
        status: "healthy",
        timestamp: now(),
    })
}

async fn app_info() -> Json<InfoReply> {
    Json(InfoReply {
        app: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now(),
    })
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

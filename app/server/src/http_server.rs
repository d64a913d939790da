//! HTTP server exposing the query pipeline as a JSON chat endpoint

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

use disaster_qa::{Dispatcher, QueryError, Route};

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    answer: String,
    route: Route,
}

#[derive(Debug, Serialize)]
struct ErrorReply {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorReply>);

fn reject(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorReply { error: error.into() }))
}

fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::NotFound(_) | QueryError::MalformedQuery(_) => StatusCode::BAD_REQUEST,
        QueryError::UpstreamError(_) | QueryError::GenerativeError(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        QueryError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A handler panic becomes an `InternalError` reply instead of a dropped connection.
fn handle_panic(payload: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let err = QueryError::InternalError(detail);
    tracing::error!(error = %err, "Handler panicked");
    reject(status_for(&err), err.public_message()).into_response()
}

async fn handle_chat(
    AxumState(dispatcher): AxumState<Arc<Dispatcher>>,
    body: Bytes,
) -> Result<Json<ChatReply>, ApiError> {
    // Content-Type is not enforced; any body that parses as JSON is accepted.
    let payload: IncomingMessage = serde_json::from_slice(&body)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e)))?;

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "message field is required"));
    }

    tracing::info!(chars = message.len(), "📨 Received chat message");

    match dispatcher.dispatch(message).await {
        Ok(outcome) => Ok(Json(ChatReply {
            answer: outcome.answer,
            route: outcome.route,
        })),
        Err(err) => {
            if matches!(err, QueryError::InternalError(_)) {
                tracing::error!(error = %err, "Unhandled failure while answering");
            }
            Err(reject(status_for(&err), err.public_message()))
        }
    }
}

async fn handle_health(AxumState(dispatcher): AxumState<Arc<Dispatcher>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "records": dispatcher.dataset().len(),
    }))
}

fn with_middleware(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
}

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    with_middleware(
        Router::new()
            .route("/chat", post(handle_chat))
            .route("/health", get(handle_health))
            .with_state(dispatcher),
    )
}

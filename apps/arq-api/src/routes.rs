use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use arq_service::{Error as ServiceError, ResolveRequest, ResolveResponse};

use crate::state::AppState;

/// Shown for any unrecovered pipeline error. Internals are logged, never
/// returned to the user.
const GENERIC_ERROR_TEXT: &str =
	"No pude procesar tu pregunta en este momento. Por favor intenta reformularla.";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/resolve", post(resolve))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn resolve(
	State(state): State<AppState>,
	Json(payload): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ApiError> {
	let request_id = uuid::Uuid::new_v4();
	let tenant = payload.tenant.clone();
	let response = state.service.resolve(payload).await.map_err(|err| {
		tracing::error!(%request_id, tenant = tenant.as_str(), error = %err, "Resolution failed.");

		ApiError::from(err)
	})?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::UnknownTenant { .. } => {
				ApiError::new(StatusCode::NOT_FOUND, "unknown_tenant", "Unknown tenant.")
			},
			ServiceError::InvalidRequest { .. } => {
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", GENERIC_ERROR_TEXT)
			},
			ServiceError::Provider { .. } | ServiceError::Selector { .. } => ApiError::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"resolution_failed",
				GENERIC_ERROR_TEXT,
			),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

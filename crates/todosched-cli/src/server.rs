//! HTTP service: JSON in, JSON out.
//!
//! Request-level failures are reported as `{"detail": message}` with 400 for
//! bad input, 502 for task service failures and 500 for configuration
//! problems.

use std::convert::Infallible;
use std::sync::Arc;

use chrono_tz::Tz;
use serde::Serialize;
use serde_json::json;
use todosched_core::{
    find_free_slots, run_query, Config, ConfigError, CoreError, FreeSlotDefaults, FreeSlotRequest,
    ImportRequest, Importer, TaskApi, TaskQuery,
};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Largest accepted request body.
const MAX_BODY_BYTES: u64 = 4 * 1024 * 1024;

pub struct AppState {
    api: Box<dyn TaskApi>,
    default_timezone: Tz,
    free_slot_defaults: FreeSlotDefaults,
}

impl AppState {
    pub fn new(api: Box<dyn TaskApi>, config: Config) -> Result<Self, ConfigError> {
        Ok(Self {
            api,
            default_timezone: config.default_timezone()?,
            free_slot_defaults: FreeSlotDefaults::from_config(&config)?,
        })
    }
}

fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Api(_) | CoreError::ReplaceAborted { .. } => StatusCode::BAD_GATEWAY,
        CoreError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({ "detail": message.into() });
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

fn respond<T: Serialize>(result: Result<T, CoreError>) -> Response {
    match result {
        Ok(value) => warp::reply::json(&value).into_response(),
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                tracing::error!(%status, error = %err, "request failed");
            } else {
                tracing::warn!(%status, error = %err, "request rejected");
            }
            detail(status, err.to_string())
        }
    }
}

async fn import_schedule(state: Arc<AppState>, request: ImportRequest) -> Response {
    let result = Importer::new(state.api.as_ref(), state.default_timezone)
        .run(request)
        .await;
    respond(result)
}

async fn query_tasks(state: Arc<AppState>, query: TaskQuery) -> Response {
    respond(run_query(state.api.as_ref(), &query, state.default_timezone).await)
}

async fn free_slots(state: Arc<AppState>, request: FreeSlotRequest) -> Response {
    respond(find_free_slots(state.api.as_ref(), &request, &state.free_slot_defaults).await)
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let response = if err.is_not_found() {
        detail(StatusCode::NOT_FOUND, "Not Found")
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        detail(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        detail(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        detail(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    } else {
        tracing::error!(?err, "unhandled rejection");
        detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    };
    Ok(response)
}

/// All routes, with rejections rendered as JSON.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let import = warp::path!("import_schedule_to_todoist")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .then(import_schedule);

    let query = warp::path!("tasks" / "query")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .then(query_tasks);

    let slots = warp::path!("free_slots")
        .and(warp::post())
        .and(with_state(state))
        .and(json_body())
        .then(free_slots);

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })).into_response());

    import
        .or(query)
        .unify()
        .or(slots)
        .unify()
        .or(health)
        .unify()
        .recover(handle_rejection)
        .unify()
        .with(warp::trace::request())
}

//! # API REST
//!
//! REST API for the symptom intake engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! The engine itself lives in `intake-core`; handlers only translate between HTTP and core
//! calls. Sessions are held by the client and sent with every request, so the server keeps no
//! per-user state.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use intake_core::{
    AnswerEvent, CoreConfig, Evaluation, FormSession, IntakeError, IntakeForm, StoredSubmission,
    SubmissionService, Symptom, SymptomCatalog, SymptomId, SymptomSummary,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server.
///
/// The catalog is loaded once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    catalog: Arc<SymptomCatalog>,
    submissions: Arc<SubmissionService>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, catalog: SymptomCatalog) -> Self {
        Self {
            submissions: Arc::new(SubmissionService::new(cfg.clone())),
            catalog: Arc::new(catalog),
            cfg,
        }
    }

    fn form(&self, id: SymptomId) -> ApiResult<IntakeForm> {
        self.catalog
            .form(id, self.cfg.phrasing())
            .map_err(|e| error_response("Load form", e))
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct SymptomListRes {
    #[schema(value_type = Vec<Object>)]
    pub symptoms: Vec<SymptomSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct SymptomRes {
    /// Active projection of the symptom definition.
    #[schema(value_type = Object)]
    pub symptom: Symptom,
}

#[derive(Deserialize, ToSchema)]
pub struct SessionReq {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub session: FormSession,
}

#[derive(Deserialize, ToSchema)]
pub struct EventReq {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub session: FormSession,
    #[schema(value_type = Object)]
    pub event: AnswerEvent,
}

#[derive(Serialize, ToSchema)]
pub struct EvaluationRes {
    #[schema(value_type = Object)]
    pub evaluation: Evaluation,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRes {
    pub submission_id: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct SubmissionRes {
    #[schema(value_type = Object)]
    pub submission: StoredSubmission,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_symptoms,
        get_symptom,
        evaluate,
        apply_event,
        submit,
        get_submission,
    ),
    components(schemas(
        HealthRes,
        SymptomListRes,
        SymptomRes,
        SessionReq,
        EventReq,
        EvaluationRes,
        SubmitRes,
        SubmissionRes,
    ))
)]
pub struct ApiDoc;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Map a core error onto an HTTP status.
///
/// Client mistakes carry the error message; system failures are logged and reported as a bare
/// internal error.
fn error_response(context: &str, err: IntakeError) -> (StatusCode, String) {
    let status = match &err {
        IntakeError::InvalidInput(_)
        | IntakeError::UnknownQuestion(_)
        | IntakeError::UnknownOption { .. }
        | IntakeError::AnswerTypeMismatch { .. }
        | IntakeError::Uuid(_) => StatusCode::BAD_REQUEST,
        IntakeError::UnknownSymptom(_) | IntakeError::SubmissionNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => {
            tracing::error!("{} error: {:?}", context, err);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into());
        }
    };

    tracing::debug!("{} rejected: {}", context, err);
    (status, err.to_string())
}

/// Build the application router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/symptoms", get(list_symptoms))
        .route("/symptoms/:id", get(get_symptom))
        .route("/symptoms/:id/evaluate", post(evaluate))
        .route("/symptoms/:id/events", post(apply_event))
        .route("/symptoms/:id/submissions", post(submit))
        .route("/submissions/:id", get(get_submission))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Intake REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/symptoms",
    responses(
        (status = 200, description = "Active symptoms in display order", body = SymptomListRes)
    )
)]
#[axum::debug_handler]
async fn list_symptoms(State(state): State<AppState>) -> Json<SymptomListRes> {
    Json(SymptomListRes {
        symptoms: state.catalog.list_active(),
    })
}

#[utoipa::path(
    get,
    path = "/symptoms/{id}",
    params(("id" = i64, Path, description = "Symptom id")),
    responses(
        (status = 200, description = "Active symptom definition", body = SymptomRes),
        (status = 404, description = "Unknown or inactive symptom")
    )
)]
#[axum::debug_handler]
async fn get_symptom(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<SymptomId>,
) -> ApiResult<Json<SymptomRes>> {
    let symptom = state
        .catalog
        .active(id)
        .map_err(|e| error_response("Get symptom", e))?;
    Ok(Json(SymptomRes { symptom }))
}

#[utoipa::path(
    post,
    path = "/symptoms/{id}/evaluate",
    params(("id" = i64, Path, description = "Symptom id")),
    request_body = SessionReq,
    responses(
        (
            status = 200,
            description = "Visible questions, pruned session and summary",
            body = EvaluationRes
        ),
        (status = 404, description = "Unknown or inactive symptom")
    )
)]
/// Evaluate a session without changing it.
///
/// The returned session has answers of hidden questions removed; clients should replace their
/// copy with it.
#[axum::debug_handler]
async fn evaluate(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<SymptomId>,
    Json(req): Json<SessionReq>,
) -> ApiResult<Json<EvaluationRes>> {
    let form = state.form(id)?;
    Ok(Json(EvaluationRes {
        evaluation: form.evaluate(&req.session),
    }))
}

#[utoipa::path(
    post,
    path = "/symptoms/{id}/events",
    params(("id" = i64, Path, description = "Symptom id")),
    request_body = EventReq,
    responses(
        (status = 200, description = "Evaluation after applying the event", body = EvaluationRes),
        (status = 400, description = "Event does not fit the form"),
        (status = 404, description = "Unknown or inactive symptom")
    )
)]
/// Apply one user input to a session and evaluate the result.
#[axum::debug_handler]
async fn apply_event(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<SymptomId>,
    Json(req): Json<EventReq>,
) -> ApiResult<Json<EvaluationRes>> {
    let form = state.form(id)?;
    let mut session = req.session;
    form.apply(&mut session, req.event)
        .map_err(|e| error_response("Apply event", e))?;

    Ok(Json(EvaluationRes {
        evaluation: form.evaluate(&session),
    }))
}

#[utoipa::path(
    post,
    path = "/symptoms/{id}/submissions",
    params(("id" = i64, Path, description = "Symptom id")),
    request_body = SessionReq,
    responses(
        (status = 201, description = "Submission stored", body = SubmitRes),
        (status = 404, description = "Unknown or inactive symptom"),
        (status = 422, description = "Required questions unanswered or summary empty"),
        (status = 500, description = "Internal server error")
    )
)]
/// Validate a finished session and store it.
///
/// # Errors
/// Returns `422 Unprocessable Entity` if:
/// - visible required questions are unanswered (the message names how many), or
/// - no template renders, leaving the summary empty.
///
/// Returns `500 Internal Server Error` if the submission cannot be written.
#[axum::debug_handler]
async fn submit(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<SymptomId>,
    Json(req): Json<SessionReq>,
) -> ApiResult<(StatusCode, Json<SubmitRes>)> {
    let form = state.form(id)?;
    let payload = form
        .prepare_submission(&req.session)
        .map_err(|e| error_response("Prepare submission", e))?;
    let stored = state
        .submissions
        .store(&payload)
        .map_err(|e| error_response("Store submission", e))?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRes {
            submission_id: stored.id.to_string(),
            message: "Submission saved".into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    params(("id" = String, Path, description = "Canonical submission UUID")),
    responses(
        (status = 200, description = "Stored submission", body = SubmissionRes),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "No such submission")
    )
)]
#[axum::debug_handler]
async fn get_submission(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<SubmissionRes>> {
    let submission = state
        .submissions
        .read(&id)
        .map_err(|e| error_response("Read submission", e))?;
    Ok(Json(SubmissionRes { submission }))
}

//! REST API endpoint handlers.
//!
//! Every LLM-backed endpoint runs the same way: check the credential, copy
//! what it needs out of the session store, await the consultant with no lock
//! held, then record the result. A failed call records nothing.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cdss::clinical::{ClinicalInput, Severity, SymptomCategory};
use cdss::config::Settings;
use cdss::consult::{Consultant, HistoryEntry, SECTION_LABELS, Section};
use cdss::error::{ConfigurationError, ConsultError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::sessions::SessionStore;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    consultant: Option<Arc<Consultant>>,
    /// Operator-facing reason the LLM endpoints are blocked.
    blocked: Option<String>,
    sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn ready(consultant: Consultant) -> Self {
        Self {
            consultant: Some(Arc::new(consultant)),
            blocked: None,
            sessions: Arc::new(SessionStore::new()),
        }
    }

    /// State that serves the form and catalog but refuses every LLM call.
    pub fn blocked(error: &ConfigurationError) -> Self {
        Self {
            consultant: None,
            blocked: Some(error.to_string()),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        match Consultant::from_settings(settings) {
            Ok(consultant) => Self::ready(consultant),
            Err(e) => {
                warn!("LLM calls disabled: {e}");
                Self::blocked(&e)
            }
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn consultant(&self) -> Result<Arc<Consultant>, ApiError> {
        self.consultant
            .clone()
            .ok_or_else(|| ApiError::Blocked(self.blocked.clone().unwrap_or_default()))
    }
}

/// Error responses, rendered as `{"error": ..., "kind": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Blocked(String),
    UnknownSession(String),
    /// The request body did not parse (bad JSON, unknown category, ...).
    InvalidBody(String),
    Consult(ConsultError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<ConsultError> for ApiError {
    fn from(e: ConsultError) -> Self {
        match e {
            ConsultError::Configuration(c) => ApiError::Blocked(c.to_string()),
            other => ApiError::Consult(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Blocked(msg) => (StatusCode::SERVICE_UNAVAILABLE, "configuration", msg.clone()),
            ApiError::UnknownSession(id) => (
                StatusCode::NOT_FOUND,
                "unknown_session",
                format!("No session with id '{id}'."),
            ),
            ApiError::InvalidBody(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_body",
                format!("The submitted form could not be read: {detail}"),
            ),
            ApiError::Consult(e @ ConsultError::Validation(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation", e.user_message())
            }
            ApiError::Consult(e) => (StatusCode::BAD_GATEWAY, "external_call", e.user_message()),
        };
        (status, Json(json!({ "error": message, "kind": kind }))).into_response()
    }
}

#[derive(Serialize)]
pub struct StatusBody {
    pub ready: bool,
    pub model: Option<String>,
    /// Persistent banner text when `ready` is false.
    pub message: Option<String>,
    pub sessions: usize,
}

/// GET /api/status — Whether LLM calls are possible.
pub async fn get_status(State(app): State<AppState>) -> Json<StatusBody> {
    Json(StatusBody {
        ready: app.consultant.is_some(),
        model: app.consultant.as_ref().map(|c| c.config().model.clone()),
        message: app.blocked.clone(),
        sessions: app.sessions.len(),
    })
}

#[derive(Serialize)]
pub struct CategoryBody {
    pub name: &'static str,
    pub symptoms: &'static [&'static str],
}

#[derive(Serialize)]
pub struct CatalogBody {
    pub categories: Vec<CategoryBody>,
    pub severities: Vec<&'static str>,
    pub sections: Vec<&'static str>,
}

/// GET /api/catalog — Categories, symptoms, severities and section labels.
pub async fn get_catalog() -> Json<CatalogBody> {
    Json(CatalogBody {
        categories: SymptomCategory::ALL
            .into_iter()
            .map(|c| CategoryBody {
                name: c.label(),
                symptoms: c.symptoms(),
            })
            .collect(),
        severities: Severity::ALL.into_iter().map(Severity::label).collect(),
        sections: SECTION_LABELS.to_vec(),
    })
}

/// POST /api/sessions — Open a session. Returns 201 with its id.
pub async fn post_session(State(app): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let id = app.sessions.create();
    (StatusCode::CREATED, Json(json!({ "id": id })))
}

/// DELETE /api/sessions/{id} — End a session and drop its log. Returns 204.
pub async fn delete_session(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if app.sessions.remove(&id) {
        info!("Session {id}: ended");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::UnknownSession(id))
    }
}

/// GET /api/sessions/{id}/history — The conversation log, oldest first.
pub async fn get_history(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    app.sessions
        .history(&id)
        .map(Json)
        .ok_or(ApiError::UnknownSession(id))
}

#[derive(Serialize)]
pub struct RecommendationBody {
    pub text: String,
    pub sections: Vec<Section>,
}

/// POST /api/sessions/{id}/recommendations — Submit the form.
pub async fn post_recommendation(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ClinicalInput>, JsonRejection>,
) -> Result<Json<RecommendationBody>, ApiError> {
    let consultant = app.consultant()?;
    let Json(input) = body?;
    if !app.sessions.contains(&id) {
        return Err(ApiError::UnknownSession(id));
    }

    let rec = consultant.recommend(&input).await?;

    if !app.sessions.record_recommendation(&id, &input, rec.text()) {
        return Err(ApiError::UnknownSession(id));
    }
    info!("Session {id}: recommendation recorded");
    Ok(Json(RecommendationBody {
        sections: rec.sections(),
        text: rec.into_text(),
    }))
}

#[derive(Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct AnswerBody {
    pub answer: String,
    pub history_len: usize,
}

/// POST /api/sessions/{id}/questions — Ask a follow-up question.
pub async fn post_question(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<AnswerBody>, ApiError> {
    let consultant = app.consultant()?;
    let Json(body) = body?;
    let snapshot = app
        .sessions
        .snapshot(&id)
        .ok_or_else(|| ApiError::UnknownSession(id.clone()))?;

    let answer = consultant
        .answer(snapshot.context.as_ref(), &snapshot.history, &body.question)
        .await?;

    if !app
        .sessions
        .record_exchange(&id, body.question.trim(), &answer)
    {
        return Err(ApiError::UnknownSession(id));
    }
    let history_len = app.sessions.history(&id).map_or(0, |h| h.len());
    info!("Session {id}: follow-up recorded ({history_len} entries)");
    Ok(Json(AnswerBody {
        answer,
        history_len,
    }))
}

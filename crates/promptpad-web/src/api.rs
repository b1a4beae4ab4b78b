//! REST API endpoint handlers.
//!
//! Every session-bound endpoint takes the page's id as `?session=<id>`.
//! Action endpoints answer with the session snapshot taken after the action
//! finished, plus a status code derived from the outcome.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use promptpad::GenerationFailure;
use promptpad::prompt::Preset;
use promptpad::session::{Mode, Selection, Session, SessionSnapshot};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::sessions::{RegistryError, SessionRegistry};

/// The single page served at `/`.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}

/// Query string naming the page session a request acts on.
#[derive(Deserialize)]
pub struct PageQuery {
    pub session: String,
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = match self {
            RegistryError::InvalidId => StatusCode::BAD_REQUEST,
            RegistryError::Full => StatusCode::SERVICE_UNAVAILABLE,
        };
        let error = self.to_string();
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// GET / — The front-end page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /api/state — Full state snapshot.
pub async fn get_state(
    State(app): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<SessionSnapshot>, RegistryError> {
    let page = app.sessions.get_or_create(&page.session)?;
    Ok(Json(page.session.snapshot()))
}

/// GET /api/presets — The fixed template list, in display order.
pub async fn get_presets() -> Json<&'static [Preset]> {
    Json(Preset::all())
}

/// Request body for POST /api/mode.
#[derive(Deserialize)]
pub struct ModeRequest {
    pub mode: Mode,
}

/// POST /api/mode — Switch between preset and custom templates.
pub async fn post_mode(
    State(app): State<AppState>,
    Query(page): Query<PageQuery>,
    Json(body): Json<ModeRequest>,
) -> Result<StatusCode, RegistryError> {
    let page = app.sessions.get_or_create(&page.session)?;
    page.session.set_mode(body.mode);
    Ok(StatusCode::NO_CONTENT)
}

/// Request body for POST /api/generate.
#[derive(Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    /// Preset id; the first preset when omitted.
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub custom_prompt: String,
}

/// Request body for POST /api/regenerate.
#[derive(Deserialize)]
pub struct RegenerateRequest {
    pub text: String,
}

/// Error body for requests rejected before reaching the session.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// POST /api/generate — Build a prompt and send it.
///
/// Returns 200 on success, 400 for an unknown preset id, and otherwise the
/// status from [`status_for`].
pub async fn post_generate(
    State(app): State<AppState>,
    Query(page): Query<PageQuery>,
    Json(body): Json<GenerateRequest>,
) -> Result<Response, RegistryError> {
    let page = app.sessions.get_or_create(&page.session)?;
    let preset = match body.preset.as_deref() {
        None => Preset::default(),
        Some(id) => match Preset::find(id) {
            Some(p) => p,
            None => {
                let error = format!("unknown preset '{id}'");
                return Ok((StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response());
            }
        },
    };
    let text = body.text;
    let selection = Selection {
        preset,
        custom_prompt: body.custom_prompt,
    };

    // Own task: a client disconnect must not cancel the in-flight request.
    let session = page.session.clone();
    let outcome = tokio::spawn(async move { session.generate(&text, &selection).await }).await;
    Ok(respond(&page.session, outcome))
}

/// POST /api/regenerate — Re-send using the last prompt as the template.
pub async fn post_regenerate(
    State(app): State<AppState>,
    Query(page): Query<PageQuery>,
    Json(body): Json<RegenerateRequest>,
) -> Result<Response, RegistryError> {
    let page = app.sessions.get_or_create(&page.session)?;
    let text = body.text;
    let session = page.session.clone();
    let outcome = tokio::spawn(async move { session.regenerate(&text).await }).await;
    Ok(respond(&page.session, outcome))
}

/// HTTP status for a failed action.
pub fn status_for(failure: GenerationFailure) -> StatusCode {
    match failure {
        GenerationFailure::EmptyInput | GenerationFailure::EmptyCustomPrompt => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        GenerationFailure::NothingToRegenerate | GenerationFailure::Busy => StatusCode::CONFLICT,
        GenerationFailure::MalformedResponse | GenerationFailure::TransportError => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// Pair the post-action snapshot with the outcome's status code.
fn respond(
    session: &Session,
    outcome: Result<promptpad::GenerationResult, tokio::task::JoinError>,
) -> Response {
    let status = match outcome {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(failure)) => status_for(failure),
        Err(e) => {
            error!("Generation task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(session.snapshot())).into_response()
}

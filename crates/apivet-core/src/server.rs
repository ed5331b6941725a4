//! HTTP surface: `POST /validate`, the editor page and a health check.

use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::render::{EditorPage, ResultView};
use crate::response::StructuredResponse;
use crate::validate::Validator;
use crate::Error;

/// Body of `POST /validate` and of the editor form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub content: String,
}

#[derive(Clone)]
pub struct AppState {
    validator: Arc<Validator>,
    page: Arc<EditorPage>,
}

impl AppState {
    pub fn new(validator: Validator) -> crate::Result<Self> {
        Ok(Self {
            validator: Arc::new(validator),
            page: Arc::new(EditorPage::new()?),
        })
    }
}

/// Build the router; `max_body_bytes` caps every request body.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(editor).post(submit_form))
        .route("/validate", post(validate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: Config) -> crate::Result<()> {
    let validator = Validator::new(&config);
    log::info!(
        "Staging strategy: {}, validation timeout: {:?}",
        validator.staging(),
        config.validation_timeout()
    );
    let app = router(AppState::new(validator)?, config.max_body_bytes);

    let listener = TcpListener::bind(config.socket_addr()).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> StructuredResponse {
    match payload {
        Ok(Json(request)) => state.validator.submit(&request.content).await.into(),
        Err(rejection) => payload_error(rejection.body_text()),
    }
}

async fn editor(State(state): State<AppState>) -> Response {
    render_page(&state, "", None)
}

async fn submit_form(
    State(state): State<AppState>,
    form: Result<Form<SubmitRequest>, FormRejection>,
) -> Response {
    let (content, response) = match form {
        Ok(Form(request)) => {
            let response = StructuredResponse::from(state.validator.submit(&request.content).await);
            (request.content, response)
        }
        Err(rejection) => (String::new(), payload_error(rejection.body_text())),
    };
    let view = ResultView::from_response(&response);
    let mut page = render_page(&state, &content, Some(&view));
    if page.status() == StatusCode::OK {
        *page.status_mut() = response.status();
    }
    page
}

async fn health() -> &'static str {
    "ok"
}

fn payload_error(detail: String) -> StructuredResponse {
    let error = Error::payload(detail);
    log::info!("Rejected submission [{}]: {}", error.kind(), error);
    StructuredResponse::invalid(error.to_string())
}

fn render_page(state: &AppState, content: &str, view: Option<&ResultView>) -> Response {
    match state.page.render(content, view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            log::error!("Failed to render editor page [{}]: {}", e.kind(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    }
}

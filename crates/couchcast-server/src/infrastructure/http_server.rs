//! HTTP front end: the poster grid and the play endpoint.
//!
//! ```text
//! GET /                 → HTML grid of the catalog (cached 5 min by browsers)
//! GET /play/{video_id}  → {"status": "success" | "error", "message": ...}
//!                         200 / 400 / 403 / 429 / 500
//! ```
//!
//! The page is rendered with Handlebars, which HTML-escapes every `{{...}}`
//! value, so titles and poster URLs from the catalog cannot inject markup.
//!
//! # Shutdown
//!
//! [`run_server`] serves until the `shutdown` future completes (Ctrl+C in
//! `main.rs`), then lets in-flight requests finish.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use couchcast_core::{CatalogEntry, PlayResponse};
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::application::PlayService;

/// `Cache-Control` value for the grid page.
pub const INDEX_CACHE_CONTROL: &str = "public, max-age=300";

const INDEX_TEMPLATE_NAME: &str = "index";
const INDEX_TEMPLATE: &str = include_str!("../../templates/index.hbs");

/// Errors preparing or rendering the page.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid page template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("could not render page: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// One tile of the grid.
#[derive(Debug, Serialize)]
struct Tile<'a> {
    title: &'a str,
    id: &'a str,
    poster: &'a str,
    playable: bool,
}

#[derive(Debug, Serialize)]
struct IndexPage<'a> {
    movies: Vec<Tile<'a>>,
}

/// Shared state for every request.
#[derive(Clone)]
pub struct HttpState {
    service: Arc<PlayService>,
    library: Arc<Vec<CatalogEntry>>,
    templates: Arc<Handlebars<'static>>,
}

impl HttpState {
    /// # Errors
    ///
    /// [`HttpError::Template`] if the built-in page template does not parse.
    pub fn new(service: Arc<PlayService>, library: Vec<CatalogEntry>) -> Result<Self, HttpError> {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(true);
        templates
            .register_template_string(INDEX_TEMPLATE_NAME, INDEX_TEMPLATE)
            .map_err(Box::new)?;

        Ok(Self {
            service,
            library: Arc::new(library),
            templates: Arc::new(templates),
        })
    }

    /// Renders the grid page for the current library.
    pub fn render_index(&self) -> Result<String, HttpError> {
        let page = IndexPage {
            movies: self
                .library
                .iter()
                .map(|entry| Tile {
                    title: &entry.title,
                    id: &entry.id,
                    poster: &entry.poster,
                    playable: entry.is_playable(),
                })
                .collect(),
        };
        Ok(self.templates.render(INDEX_TEMPLATE_NAME, &page)?)
    }
}

/// Builds the application router.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/play/{video_id}", get(play))
        .with_state(state)
}

async fn index(State(state): State<HttpState>) -> Response {
    match state.render_index() {
        Ok(html) => ([(header::CACHE_CONTROL, INDEX_CACHE_CONTROL)], Html(html)).into_response(),
        Err(e) => {
            error!("{e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "could not render page").into_response()
        }
    }
}

async fn play(
    State(state): State<HttpState>,
    Path(video_id): Path<String>,
) -> (StatusCode, Json<PlayResponse>) {
    info!("play request for {video_id:?}");
    let reply = state.service.play(&video_id).await;
    let status = StatusCode::from_u16(reply.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.body))
}

/// Binds `addr` and serves until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run_server<F>(addr: SocketAddr, state: HttpState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;

    info!("serving on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

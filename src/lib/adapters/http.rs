use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Form, Router, middleware};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::error::{AppError, INTERNAL_ERROR_BODY};
use crate::adapters::session::{FlashStore, SessionId, ensure_session};
use crate::adapters::websocket;
use crate::core::{Broadcaster, ConnectionRegistry, NewTodoForm, Todo, UpdateTodoForm};
use crate::storage::{TodoStore, parse_id};
use crate::views;

const INDEX_TITLE: &str = "Todos";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub broadcaster: Broadcaster,
    pub flashes: Arc<FlashStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            broadcaster: Broadcaster::new(registry, store.clone()),
            store,
            flashes: Arc::new(FlashStore::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.broadcaster.registry()
    }
}

/// A todo resolved from the `{id}` path segment.
///
/// Rejects with [`AppError::TodoNotFound`] before the handler body runs, so
/// a missing todo never reaches the store mutations or the broadcaster.
pub struct ExistingTodo(pub Todo);

impl FromRequestParts<AppState> for ExistingTodo {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::TodoNotFound)?;
        let id = parse_id(&raw).ok_or(AppError::TodoNotFound)?;
        state
            .store
            .get_by_id(id)
            .await?
            .map(Self)
            .ok_or(AppError::TodoNotFound)
    }
}

/// Path and query of the `Referer`, if it points back into this site.
fn back_target(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uri>().ok())
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_string()))
        .filter(|path| {
            // "//host" and "/\host" both leave the site in a browser
            path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
        })
        .unwrap_or_else(|| fallback.to_string())
}

async fn announce_list(broadcaster: &Broadcaster) {
    if let Err(e) = broadcaster.notify_list_changed().await {
        tracing::warn!(error = %e, "Failed to push todo list");
    }
}

async fn announce_detail(broadcaster: &Broadcaster, id: i64) {
    if let Err(e) = broadcaster.notify_detail_changed(id).await {
        tracing::warn!(id, error = %e, "Failed to push todo detail");
    }
}

async fn announce_removal(broadcaster: &Broadcaster, id: i64) {
    if let Err(e) = broadcaster.notify_removed(id).await {
        tracing::warn!(id, error = %e, "Failed to push todo removal");
    }
}

pub async fn list_todos(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Result<Html<String>, AppError> {
    let todos = state.store.list_all().await?;
    let flashes = state.flashes.take(session).await;
    Ok(Html(views::render_index(INDEX_TITLE, &todos, &flashes)))
}

pub async fn todo_detail(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    ExistingTodo(todo): ExistingTodo,
) -> Html<String> {
    let flashes = state.flashes.take(session).await;
    Html(views::render_detail(&todo, &flashes))
}

pub async fn add_todo(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<NewTodoForm>,
) -> Result<Redirect, AppError> {
    let title = match form.validate() {
        Ok(title) => title,
        Err(errors) => {
            state.flashes.push_errors(session, errors).await;
            return Ok(Redirect::to("/"));
        }
    };

    let todo = state.store.insert(&title).await?;
    tracing::info!(id = todo.id, "Todo created");
    announce_list(&state.broadcaster).await;
    Ok(Redirect::to("/"))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    ExistingTodo(todo): ExistingTodo,
    headers: HeaderMap,
    Form(form): Form<UpdateTodoForm>,
) -> Result<Redirect, AppError> {
    let detail_path = format!("/todo/{}", todo.id);
    let changes = match form.validate() {
        Ok(changes) => changes,
        Err(errors) => {
            state.flashes.push_errors(session, errors).await;
            return Ok(Redirect::to(&back_target(&headers, &detail_path)));
        }
    };

    state.store.update_fields(todo.id, &changes).await?;
    tracing::info!(id = todo.id, "Todo updated");
    announce_list(&state.broadcaster).await;
    announce_detail(&state.broadcaster, todo.id).await;
    Ok(Redirect::to(&back_target(&headers, "/")))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    ExistingTodo(todo): ExistingTodo,
    headers: HeaderMap,
) -> Result<Redirect, AppError> {
    // read-modify-write without a transaction; concurrent toggles may collapse
    state.store.set_done(todo.id, !todo.done).await?;
    tracing::info!(id = todo.id, done = !todo.done, "Todo toggled");
    announce_list(&state.broadcaster).await;
    announce_detail(&state.broadcaster, todo.id).await;
    Ok(Redirect::to(&back_target(&headers, "/")))
}

pub async fn remove_todo(
    State(state): State<AppState>,
    ExistingTodo(todo): ExistingTodo,
) -> Result<Redirect, AppError> {
    state.store.delete(todo.id).await?;
    tracing::info!(id = todo.id, "Todo removed");
    announce_list(&state.broadcaster).await;
    announce_removal(&state.broadcaster, todo.id).await;
    Ok(Redirect::to("/"))
}

async fn fallback() -> AppError {
    AppError::PageNotFound
}

fn panic_response(_: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

/// Session, request tracing and panic-to-500, in that order from the inside.
fn with_layers(routes: Router<AppState>) -> Router<AppState> {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request<_>| {
        let uri = request.uri().to_string();
        tracing::info_span!("http_request", method = ?request.method(), uri)
    });

    routes
        .layer(middleware::from_fn(ensure_session))
        .layer(trace_layer)
        .layer(CatchPanicLayer::custom(panic_response))
}

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(list_todos))
        .route("/todo/{id}", get(todo_detail))
        .route("/add-todo", post(add_todo))
        .route("/update-todo/{id}", post(update_todo))
        .route("/remove-todo/{id}", get(remove_todo))
        .route("/toggle-todo/{id}", get(toggle_todo))
        .route("/ws", get(websocket::ws_handler))
        .fallback(fallback);
    with_layers(routes).with_state(state)
}

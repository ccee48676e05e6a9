use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;

use libris_authz::{authenticate, require_admin, Identity};
use libris_catalog::{Book, CatalogError, DEFAULT_RECOMMENDATIONS};
use libris_http::AppError;
use libris_kernel::settings::AuthSettings;

use super::models::{CheckoutRequest, CreateBook, RecommendParams, SearchParams, UpdateBook};
use super::SharedCatalog;

#[derive(Clone)]
struct CatalogState {
    catalog: SharedCatalog,
}

/// Catalog routes. Every route sits behind `authenticate`; the mutating
/// admin routes additionally sit behind `require_admin`.
pub fn router(catalog: SharedCatalog, auth: AuthSettings) -> Router {
    let admin = Router::new()
        .route("/", post(add_book))
        .route("/{id}", patch(edit_book).delete(delete_book))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/", get(list_books))
        .route("/health", get(health_check))
        .route("/search", get(search_books))
        .route("/checked-out", get(list_checked_out))
        .route("/available", get(list_available))
        .route("/{id}", get(get_book))
        .route("/{id}/checkout", post(check_out_book))
        .route("/{id}/checkin", post(check_in_book))
        .route("/{id}/recommendations", get(recommend_books))
        .merge(admin)
        .layer(middleware::from_fn_with_state(auth, authenticate))
        .with_state(CatalogState { catalog })
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "catalog module is healthy"
}

async fn list_books(State(state): State<CatalogState>) -> Json<Vec<Book>> {
    let catalog = state.catalog.lock().await;
    Json(catalog.books().to_vec())
}

async fn list_checked_out(State(state): State<CatalogState>) -> Json<Vec<Book>> {
    let catalog = state.catalog.lock().await;
    Json(catalog.checked_out().into_iter().cloned().collect())
}

async fn list_available(State(state): State<CatalogState>) -> Json<Vec<Book>> {
    let catalog = state.catalog.lock().await;
    Json(catalog.available().into_iter().cloned().collect())
}

async fn search_books(
    State(state): State<CatalogState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Book>> {
    // The empty query is resolved at this boundary, not in the core.
    let query = params.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Json(Vec::new());
    }
    let catalog = state.catalog.lock().await;
    Json(catalog.search(&query).into_iter().cloned().collect())
}

async fn get_book(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let catalog = state.catalog.lock().await;
    catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no book with id {id}")))
}

async fn add_book(
    State(state): State<CatalogState>,
    identity: Identity,
    Json(body): Json<CreateBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let mut catalog = state.catalog.lock().await;
    let book = catalog
        .add(&body.title, &body.author, &body.genre, body.publication_year)
        .map_err(into_app_error)?;
    tracing::info!(user = %identity.username, book = %book.id, "book added");
    Ok((StatusCode::CREATED, Json(book)))
}

async fn edit_book(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBook>,
) -> Result<Json<Book>, AppError> {
    let mut catalog = state.catalog.lock().await;
    let book = catalog.edit(&id, body.into()).map_err(into_app_error)?;
    Ok(Json(book))
}

async fn delete_book(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<StatusCode, AppError> {
    let mut catalog = state.catalog.lock().await;
    catalog.delete(&id).map_err(into_app_error)?;
    tracing::info!(user = %identity.username, book = %id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn check_out_book(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    identity: Identity,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<Book>, AppError> {
    let mut catalog = state.catalog.lock().await;
    let book = catalog
        .check_out(&id, &body.borrower)
        .map_err(into_app_error)?;
    tracing::info!(
        user = %identity.username,
        book = %book.id,
        borrower = %body.borrower,
        "book checked out"
    );
    Ok(Json(book))
}

async fn check_in_book(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<Json<Book>, AppError> {
    let mut catalog = state.catalog.lock().await;
    let book = catalog.check_in(&id).map_err(into_app_error)?;
    tracing::info!(user = %identity.username, book = %book.id, "book checked in");
    Ok(Json(book))
}

async fn recommend_books(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<Vec<Book>>, AppError> {
    let count = params.count.unwrap_or(DEFAULT_RECOMMENDATIONS);
    let catalog = state.catalog.lock().await;
    if catalog.get(&id).is_none() {
        return Err(AppError::not_found(format!("no book with id {id}")));
    }
    Ok(Json(catalog.recommend(&id, count).into_iter().cloned().collect()))
}

/// Map core result values onto the HTTP error taxonomy: unknown ids to 404,
/// empty required fields to 422, checkout preconditions to 409, and
/// persistence failures to 500.
fn into_app_error(err: CatalogError) -> AppError {
    match err {
        CatalogError::NotFound { id } => AppError::not_found(format!("no book with id {id}")),
        CatalogError::InvalidField { field } => AppError::validation(
            vec![json!({"field": field, "error": "must not be empty"})],
            "invalid book fields",
        ),
        CatalogError::AlreadyCheckedOut { .. } | CatalogError::NotCheckedOut { .. } => {
            AppError::conflict(vec![], err.to_string())
        }
        CatalogError::Store(err) => {
            AppError::Internal(anyhow::Error::new(err).context("failed to persist catalog"))
        }
    }
}

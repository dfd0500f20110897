//! Catalog page endpoints, mounted at `/api/home`.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    routing::{get, post},
    Form, Router,
};
use bookshelf_http::{
    error::AppError,
    response::{Ack, Data},
};
use serde::Serialize;

use super::actions::{ActionError, BookActions, BookForm};
use crate::modules::books::models::Book;
use crate::modules::books::query::{unique_tags, SortKey};
use crate::modules::books::routes::{require_id, ListParams, SharedGateway};

#[derive(Clone)]
pub struct HomeState {
    pub gateway: SharedGateway,
    pub actions: BookActions,
}

/// What the list page renders.
#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub books: Vec<Book>,
    /// Filter choices derived from `books`
    pub tags: Vec<String>,
    pub count: usize,
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        AppError::bad_request(err.0, None)
    }
}

pub fn router(state: HomeState) -> Router {
    Router::new()
        .route("/", get(catalog).post(create))
        .route("/health", get(health_check))
        .route("/{id}", get(detail).post(update))
        .route("/{id}/delete", post(delete))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "home module is healthy"
}

async fn catalog(
    State(state): State<HomeState>,
    params: ListParams,
) -> Result<Data<CatalogView>, AppError> {
    let query = params.to_query(SortKey::Newest);
    let books = state.gateway.list(&query).await?;
    let tags = unique_tags(&books);
    Ok(Data::new(CatalogView {
        count: books.len(),
        books,
        tags,
    }))
}

async fn detail(
    State(state): State<HomeState>,
    Path(id): Path<String>,
) -> Result<Data<Book>, AppError> {
    let id = require_id(&id)?;
    state
        .gateway
        .get(id)
        .await
        .map(Data::new)
        .map_err(|err| AppError::not_found(err.to_string()))
}

async fn create(
    State(state): State<HomeState>,
    form: Result<Form<BookForm>, FormRejection>,
) -> Result<Ack, AppError> {
    let Form(form) = form?;
    let id = state.actions.create_book(form).await?;
    Ok(Ack::created(id))
}

async fn update(
    State(state): State<HomeState>,
    Path(id): Path<String>,
    form: Result<Form<BookForm>, FormRejection>,
) -> Result<Ack, AppError> {
    let id = require_id(&id)?;
    let Form(form) = form?;
    state.actions.update_book(id, form).await?;
    Ok(Ack::ok())
}

async fn delete(
    State(state): State<HomeState>,
    Path(id): Path<String>,
) -> Result<Ack, AppError> {
    let id = require_id(&id)?;
    state.actions.delete_book(id).await?;
    Ok(Ack::ok())
}

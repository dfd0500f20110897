//! REST surface over the book gateway, mounted at `/api/book`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequestParts, Path, Query, State},
    http::request::Parts,
    routing::get,
    Router,
};
use bookshelf_http::{
    error::AppError,
    response::{Ack, Data},
};
use serde_json::Value;

use super::gateway::{BookGateway, GatewayError};
use super::models::{Book, BookFields};
use super::query::{BookQuery, SortKey};

pub type SharedGateway = Arc<dyn BookGateway>;

/// `?q=&tag=&sort=`. A repeated key keeps its first value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListParams {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "q" => &mut params.q,
                "tag" => &mut params.tag,
                "sort" => &mut params.sort,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    pub fn to_query(&self, default_sort: SortKey) -> BookQuery {
        BookQuery::new(
            self.q.as_deref(),
            self.tag.as_deref(),
            SortKey::parse_or(self.sort.as_deref(), default_sort),
        )
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ListParams {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)?;
        Ok(Self::from_pairs(pairs))
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(message) => AppError::validation(message),
            GatewayError::NotFound(message) => AppError::not_found(message),
            GatewayError::Store { message, code } => AppError::bad_request(message, code),
            GatewayError::Transport(message) => AppError::bad_request(message, None),
        }
    }
}

pub fn router(gateway: SharedGateway) -> Router {
    Router::new()
        .route(
            "/",
            get(list_books)
                .post(create_book)
                .put(missing_id)
                .delete(missing_id),
        )
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(gateway)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "book module is healthy"
}

async fn list_books(
    State(gateway): State<SharedGateway>,
    params: ListParams,
) -> Result<Data<Vec<Book>>, AppError> {
    let query = params.to_query(SortKey::TitleAsc);
    let books = gateway.list(&query).await?;
    Ok(Data::new(books))
}

async fn get_book(
    State(gateway): State<SharedGateway>,
    Path(id): Path<String>,
) -> Result<Data<Book>, AppError> {
    let id = require_id(&id)?;
    gateway
        .get(id)
        .await
        .map(Data::new)
        .map_err(|err| AppError::not_found(err.to_string()))
}

async fn create_book(
    State(gateway): State<SharedGateway>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Ack, AppError> {
    let fields = parse_fields(&body?)?;
    let id = gateway.insert(fields).await?;
    Ok(Ack::created(id))
}

async fn update_book(
    State(gateway): State<SharedGateway>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Ack, AppError> {
    let id = require_id(&id)?;
    let fields = parse_fields(&body?)?;
    gateway.update(id, fields).await?;
    Ok(Ack::ok())
}

async fn delete_book(
    State(gateway): State<SharedGateway>,
    Path(id): Path<String>,
) -> Result<Ack, AppError> {
    let id = require_id(&id)?;
    gateway.delete(id).await?;
    Ok(Ack::ok())
}

async fn missing_id() -> AppError {
    AppError::bad_request("Missing id", None)
}

pub(crate) fn require_id(id: &str) -> Result<&str, AppError> {
    let id = id.trim();
    if id.is_empty() {
        Err(AppError::bad_request("Missing id", None))
    } else {
        Ok(id)
    }
}

/// Unreadable or non-object JSON counts as `{}` and then fails validation.
fn parse_fields(body: &[u8]) -> Result<BookFields, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => {
            BookFields::from_json_object(object).map_err(|err| AppError::validation(err.to_string()))
        }
        _ => Ok(BookFields::default()),
    }
}

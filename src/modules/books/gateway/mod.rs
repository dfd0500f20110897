//! Data access: the only code that talks to the book store.

mod invalidating;
mod memory;
mod remote;

pub use invalidating::{detail_page, InvalidatingGateway, LIST_PAGE};
pub use memory::MemoryBookGateway;
pub use remote::RemoteBookGateway;

use async_trait::async_trait;
use bookshelf_db::StoreError;
use thiserror::Error;

use super::models::{Book, BookFields};
use super::query::BookQuery;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Title and author are required";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Rejected before reaching the store.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// The store refused the operation.
    #[error("{message}")]
    Store {
        message: String,
        code: Option<String>,
    },

    /// The store could not be reached.
    #[error("{0}")]
    Transport(String),
}

impl GatewayError {
    pub fn code(&self) -> Option<&str> {
        match self {
            GatewayError::Store { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transport(e) => GatewayError::Transport(e.to_string()),
            StoreError::Rejected { message, code, .. } => GatewayError::Store { message, code },
            other => GatewayError::Store {
                message: other.to_string(),
                code: None,
            },
        }
    }
}

#[async_trait]
pub trait BookGateway: Send + Sync {
    /// Books matching `query`, in its order.
    async fn list(&self, query: &BookQuery) -> Result<Vec<Book>, GatewayError>;

    /// One book; any failure reads as not found.
    async fn get(&self, id: &str) -> Result<Book, GatewayError>;

    /// Store a new book, returning the assigned id.
    async fn insert(&self, fields: BookFields) -> Result<String, GatewayError>;

    /// Replace the writable fields of `id`. An unknown id is not an error.
    async fn update(&self, id: &str, fields: BookFields) -> Result<(), GatewayError>;

    /// Remove `id`. An unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<(), GatewayError>;
}

pub(crate) fn validate(fields: &BookFields) -> Result<(), GatewayError> {
    if fields.is_complete() {
        Ok(())
    } else {
        Err(GatewayError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()))
    }
}

pub(crate) fn log_failure(operation: &'static str, err: &GatewayError) {
    tracing::error!(
        component = "gateway",
        operation,
        code = err.code().unwrap_or("-"),
        error = %err,
        "book gateway operation failed"
    );
}

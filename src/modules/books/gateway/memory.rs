use async_trait::async_trait;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{log_failure, validate, BookGateway, GatewayError};
use crate::modules::books::models::{Book, BookFields};
use crate::modules::books::query::BookQuery;

/// Process-local book store.
#[derive(Debug, Default)]
pub struct MemoryBookGateway {
    books: RwLock<Vec<Book>>,
}

impl MemoryBookGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing rows, as if they had been inserted earlier.
    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books: RwLock::new(books),
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

fn now_rfc3339() -> Result<String, GatewayError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| GatewayError::Store {
            message: format!("failed to stamp created_at: {e}"),
            code: None,
        })
}

#[async_trait]
impl BookGateway for MemoryBookGateway {
    async fn list(&self, query: &BookQuery) -> Result<Vec<Book>, GatewayError> {
        let books = self.books.read().await;
        Ok(query.apply(books.iter().cloned()))
    }

    async fn get(&self, id: &str) -> Result<Book, GatewayError> {
        let books = self.books.read().await;
        books
            .iter()
            .find(|book| book.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound("Not found".to_string()))
    }

    async fn insert(&self, fields: BookFields) -> Result<String, GatewayError> {
        validate(&fields).inspect_err(|e| log_failure("insert", e))?;

        let id = Uuid::now_v7().to_string();
        let created_at = now_rfc3339().inspect_err(|e| log_failure("insert", e))?;

        self.books.write().await.push(Book {
            id: id.clone(),
            title: fields.title,
            author: fields.author,
            tags: fields.tags,
            cover_url: fields.cover_url,
            created_at: Some(created_at),
        });

        tracing::debug!(component = "gateway", operation = "insert", %id, "book stored");
        Ok(id)
    }

    async fn update(&self, id: &str, fields: BookFields) -> Result<(), GatewayError> {
        validate(&fields).inspect_err(|e| log_failure("update", e))?;

        let mut books = self.books.write().await;
        match books.iter_mut().find(|book| book.id == id) {
            Some(book) => {
                book.title = fields.title;
                book.author = fields.author;
                book.tags = fields.tags;
                book.cover_url = fields.cover_url;
            }
            None => {
                tracing::warn!(component = "gateway", operation = "update", %id, "update matched no book");
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|book| book.id != id);
        if books.len() == before {
            tracing::debug!(component = "gateway", operation = "delete", %id, "delete matched no book");
        }
        Ok(())
    }
}

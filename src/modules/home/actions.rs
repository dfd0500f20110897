//! Form-submission procedures for the catalog pages.
//!
//! Each action turns a submitted form into [`BookFields`], calls the gateway
//! and reduces any failure to a single message.

use serde::Deserialize;
use thiserror::Error;

use crate::modules::books::models::{split_tags, BookFields};
use crate::modules::books::routes::SharedGateway;

/// A failed action, already reduced to what the page should show.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ActionError(pub String);

/// Fields of the create/edit form. Missing fields read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    /// Comma-separated
    pub tags: String,
    pub cover_url: String,
}

impl BookForm {
    pub fn into_fields(self) -> BookFields {
        let cover_url = Some(self.cover_url.trim().to_string()).filter(|url| !url.is_empty());
        BookFields {
            title: self.title,
            author: self.author,
            tags: split_tags(&self.tags),
            cover_url,
        }
    }
}

#[derive(Clone)]
pub struct BookActions {
    gateway: SharedGateway,
}

impl BookActions {
    pub fn new(gateway: SharedGateway) -> Self {
        Self { gateway }
    }

    pub async fn create_book(&self, form: BookForm) -> Result<String, ActionError> {
        self.gateway
            .insert(form.into_fields())
            .await
            .map_err(|e| failed("create_book", e))
    }

    pub async fn update_book(&self, id: &str, form: BookForm) -> Result<(), ActionError> {
        self.gateway
            .update(id, form.into_fields())
            .await
            .map_err(|e| failed("update_book", e))
    }

    pub async fn delete_book(&self, id: &str) -> Result<(), ActionError> {
        self.gateway
            .delete(id)
            .await
            .map_err(|e| failed("delete_book", e))
    }
}

fn failed(action: &'static str, err: impl std::fmt::Display) -> ActionError {
    let message = err.to_string();
    tracing::error!(action, error = %message, "book action failed");
    ActionError(message)
}

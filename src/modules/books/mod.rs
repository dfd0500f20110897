pub mod gateway;
pub mod models;
pub mod query;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use routes::SharedGateway;

pub const MODULE_NAME: &str = "book";

/// The `book` resource: CRUD plus search over the catalog
pub struct BooksModule {
    gateway: SharedGateway,
}

impl BooksModule {
    pub fn new(gateway: SharedGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.store.backend,
            "book module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.gateway.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = json!({
            "description": "Error",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let ack_response = json!({
            "description": "OK",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Ack" }
                }
            }
        });
        let book_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookFields" }
                }
            }
        });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Search books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "q", "in": "query", "required": false, "schema": { "type": "string" },
                              "description": "Case-insensitive title substring" },
                            { "name": "tag", "in": "query", "required": false, "schema": { "type": "string" },
                              "description": "Exact tag" },
                            { "name": "sort", "in": "query", "required": false,
                              "schema": { "type": "string", "enum": ["title_asc", "title_desc", "newest"], "default": "title_asc" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "data": {
                                                    "type": "array",
                                                    "items": { "$ref": "#/components/schemas/Book" }
                                                }
                                            }
                                        }
                                    }
                                }
                            },
                            "400": error_response.clone()
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_body.clone(),
                        "responses": {
                            "200": ack_response.clone(),
                            "400": error_response.clone()
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "data": { "$ref": "#/components/schemas/Book" }
                                            }
                                        }
                                    }
                                }
                            },
                            "404": error_response.clone()
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "requestBody": book_body,
                        "responses": {
                            "200": ack_response.clone(),
                            "400": error_response.clone()
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": ack_response,
                            "400": error_response
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "Store-assigned identifier" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "tags": { "type": "array", "items": { "type": "string" } },
                            "cover_url": { "type": ["string", "null"] },
                            "created_at": { "type": ["string", "null"], "format": "date-time" }
                        },
                        "required": ["id", "title", "author", "tags"]
                    },
                    "BookFields": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "tags": {
                                "oneOf": [
                                    { "type": "array", "items": { "type": "string" } },
                                    { "type": "string", "description": "Comma-separated" }
                                ]
                            },
                            "cover_url": { "type": ["string", "null"] }
                        },
                        "required": ["title", "author"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module stopped");
        Ok(())
    }
}

/// Schema of the `books` table on the managed store.
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS books (
                id         uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                title      text NOT NULL CHECK (btrim(title) <> ''),
                author     text NOT NULL CHECK (btrim(author) <> ''),
                tags       text[] NOT NULL DEFAULT '{}',
                cover_url  text,
                created_at timestamptz NOT NULL DEFAULT now()
            );
            CREATE INDEX IF NOT EXISTS books_tags_idx ON books USING gin (tags);
            CREATE INDEX IF NOT EXISTS books_created_at_idx ON books (created_at DESC);
            "#,
    }]
}

/// Create a new instance of the book module
pub fn create_module(gateway: SharedGateway) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(gateway))
}

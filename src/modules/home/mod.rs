pub mod actions;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

use crate::modules::books::routes::SharedGateway;
use actions::BookActions;
use routes::HomeState;

/// Backing endpoints for the catalog pages: the list view, the detail view
/// and the create/edit/delete forms
pub struct HomeModule {
    state: HomeState,
}

impl HomeModule {
    pub fn new(gateway: SharedGateway) -> Self {
        Self {
            state: HomeState {
                actions: BookActions::new(gateway.clone()),
                gateway,
            },
        }
    }
}

#[async_trait]
impl Module for HomeModule {
    fn name(&self) -> &'static str {
        "home"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "home module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let form_body = json!({
            "required": true,
            "content": {
                "application/x-www-form-urlencoded": {
                    "schema": { "$ref": "#/components/schemas/BookForm" }
                }
            }
        });
        let ack = json!({
            "description": "OK",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/Ack" } }
            }
        });
        let failure = json!({
            "description": "Action failed",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
            }
        });
        let id_param = json!({ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Catalog list view (default sort: newest)",
                        "tags": ["Home"],
                        "parameters": [
                            { "name": "q", "in": "query", "required": false, "schema": { "type": "string" } },
                            { "name": "tag", "in": "query", "required": false, "schema": { "type": "string" } },
                            { "name": "sort", "in": "query", "required": false,
                              "schema": { "type": "string", "enum": ["title_asc", "title_desc", "newest"], "default": "newest" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Books, their tag set and count",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "data": { "$ref": "#/components/schemas/CatalogView" }
                                            }
                                        }
                                    }
                                }
                            },
                            "400": failure.clone()
                        }
                    },
                    "post": {
                        "summary": "Create form submission",
                        "tags": ["Home"],
                        "requestBody": form_body.clone(),
                        "responses": { "200": ack.clone(), "400": failure.clone() }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Detail view",
                        "tags": ["Home"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "data": { "$ref": "#/components/schemas/Book" } }
                                        }
                                    }
                                }
                            },
                            "404": failure.clone()
                        }
                    },
                    "post": {
                        "summary": "Edit form submission",
                        "tags": ["Home"],
                        "parameters": [id_param.clone()],
                        "requestBody": form_body,
                        "responses": { "200": ack.clone(), "400": failure.clone() }
                    }
                },
                "/{id}/delete": {
                    "post": {
                        "summary": "Delete form submission",
                        "tags": ["Home"],
                        "parameters": [id_param],
                        "responses": { "200": ack, "400": failure }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookForm": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "tags": { "type": "string", "description": "Comma-separated" },
                            "cover_url": { "type": "string" }
                        }
                    },
                    "CatalogView": {
                        "type": "object",
                        "properties": {
                            "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                            "tags": { "type": "array", "items": { "type": "string" } },
                            "count": { "type": "integer" }
                        },
                        "required": ["books", "tags", "count"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "home module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "home module stopped");
        Ok(())
    }
}

/// Create a new instance of the home module
pub fn create_module(gateway: SharedGateway) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(HomeModule::new(gateway))
}

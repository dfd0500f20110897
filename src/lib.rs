//! Bookshelf application library
//!
//! The book catalog modules and the bootstrap that wires them to a store.

pub mod modules;

pub use modules::*;

use std::sync::Arc;

use anyhow::Context;
use bookshelf_db::StoreClient;
use bookshelf_events::EventBus;
use bookshelf_kernel::settings::{Environment, Settings, StoreBackend};
use bookshelf_kernel::{InitCtx, Migration, ModuleRegistry};

use modules::books::gateway::{InvalidatingGateway, MemoryBookGateway, RemoteBookGateway};
use modules::books::routes::SharedGateway;

/// Build the gateway selected by `[store]`, wrapped so mutations publish page
/// invalidations on `events`.
pub fn build_gateway(settings: &Settings, events: &EventBus) -> anyhow::Result<SharedGateway> {
    let gateway: SharedGateway = match settings.store.backend {
        StoreBackend::Memory => {
            if settings.environment == Environment::Production {
                tracing::warn!("in-memory book store in production; data will not survive a restart");
            }
            tracing::info!(backend = "memory", "book store ready");
            Arc::new(InvalidatingGateway::new(
                MemoryBookGateway::new(),
                events.clone(),
            ))
        }
        StoreBackend::Rest => {
            let client = StoreClient::from_settings(&settings.store)
                .context("failed to build store client")?;
            let remote = RemoteBookGateway::new(client, settings.store.table.clone());
            tracing::info!(backend = "rest", table = remote.table(), "book store ready");
            Arc::new(InvalidatingGateway::new(remote, events.clone()))
        }
    };
    Ok(gateway)
}

/// Registry with every application module mounted on `gateway`.
pub fn build_registry(gateway: SharedGateway) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, gateway);
    registry
}

/// Every module's schema migrations, keyed by module name. Needs no store.
pub fn schema_migrations() -> Vec<(String, Migration)> {
    let mut migrations: Vec<(String, Migration)> = modules::books::migrations()
        .into_iter()
        .map(|migration| (modules::books::MODULE_NAME.to_string(), migration))
        .collect();
    migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));
    migrations
}

/// Run the service until a shutdown signal arrives.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let events = EventBus::default();
    let gateway = build_gateway(&settings, &events)?;
    let registry = build_registry(gateway);

    let ctx = InitCtx {
        settings: &settings,
        events: &events,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[test]
    fn rest_backend_without_url_fails_to_build() {
        let mut settings = Settings::default();
        settings.store.backend = StoreBackend::Rest;
        assert!(build_gateway(&settings, &EventBus::default()).is_err());
    }

    #[test]
    fn rest_backend_with_url_builds() {
        let mut settings = Settings::default();
        settings.store.backend = StoreBackend::Rest;
        settings.store.url = Some("https://demo.supabase.co".to_string());
        assert!(build_gateway(&settings, &EventBus::default()).is_ok());
    }

    #[test]
    fn registry_mounts_book_and_home() {
        let settings = Settings::default();
        let gateway = build_gateway(&settings, &EventBus::default()).unwrap();
        let registry = build_registry(gateway);

        let names: Vec<_> = registry.modules().map(|m| m.name()).collect();
        assert_eq!(names, vec!["book", "home"]);
        assert_eq!(registry.collect_migrations().len(), 1);
    }

    #[test]
    fn package_metadata_comes_from_the_workspace() {
        assert_eq!(env!("CARGO_PKG_LICENSE"), "Apache-2.0");
        assert_eq!(env!("CARGO_PKG_VERSION"), "0.1.0");
    }

    #[test]
    fn schema_migrations_match_the_registry() {
        let gateway = build_gateway(&Settings::default(), &EventBus::default()).unwrap();
        let from_registry: Vec<_> = build_registry(gateway)
            .collect_migrations()
            .into_iter()
            .map(|(module, migration)| (module, migration.id))
            .collect();
        let standalone: Vec<_> = schema_migrations()
            .into_iter()
            .map(|(module, migration)| (module, migration.id))
            .collect();

        assert_eq!(standalone, from_registry);
        assert_eq!(standalone, vec![("book".to_string(), "001_init")]);
    }

    #[tokio::test]
    async fn full_router_serves_both_surfaces_from_one_store() {
        let settings = Settings::default();
        let gateway = build_gateway(&settings, &EventBus::default()).unwrap();
        let registry = build_registry(gateway);
        let app = bookshelf_http::build_router(&registry, &settings);

        let create = Request::builder()
            .method("POST")
            .uri("/api/book")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"title":"Clean Code","author":"Robert C. Martin","tags":["IT"]}"#,
            ))
            .unwrap();
        let response = app.clone().oneshot(create).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/home").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["tags"], serde_json::json!(["IT"]));

        for uri in ["/healthz", "/api/book/health", "/api/home/health", "/docs/openapi.json"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[test]
    fn openapi_lists_module_paths() {
        let gateway = build_gateway(&Settings::default(), &EventBus::default()).unwrap();
        let registry = build_registry(gateway);
        let spec = bookshelf_http::router::merge_openapi(&registry);

        assert!(spec["paths"]["/api/book"]["get"].is_object());
        assert!(spec["paths"]["/api/book/{id}"]["put"].is_object());
        assert!(spec["paths"]["/api/home/{id}/delete"]["post"].is_object());
        assert!(spec["components"]["schemas"]["Book"].is_object());
    }
}

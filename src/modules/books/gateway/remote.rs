use async_trait::async_trait;
use bookshelf_db::{Filter, Query, StoreClient};
use serde::Deserialize;

use super::{log_failure, validate, BookGateway, GatewayError};
use crate::modules::books::models::{Book, BookFields};
use crate::modules::books::query::BookQuery;

#[derive(Debug, Deserialize)]
struct IdRow {
    #[serde(deserialize_with = "id_as_string")]
    id: String,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Gateway backed by the managed store.
#[derive(Debug, Clone)]
pub struct RemoteBookGateway {
    client: StoreClient,
    table: String,
}

impl RemoteBookGateway {
    pub fn new(client: StoreClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl BookGateway for RemoteBookGateway {
    async fn list(&self, query: &BookQuery) -> Result<Vec<Book>, GatewayError> {
        let rows: Vec<Book> = self
            .client
            .select(&self.table, &query.to_store_query())
            .await
            .map_err(GatewayError::from)
            .inspect_err(|e| log_failure("list", e))?;

        // The store's collation decides its own order; settle it here.
        Ok(query.apply(rows))
    }

    async fn get(&self, id: &str) -> Result<Book, GatewayError> {
        let query = Query::select("*").filter(Filter::eq("id", id));
        let rows: Vec<Book> = self
            .client
            .select(&self.table, &query)
            .await
            .map_err(|e| GatewayError::NotFound(e.to_string()))
            .inspect_err(|e| log_failure("get", e))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound("Not found".to_string()))
    }

    async fn insert(&self, fields: BookFields) -> Result<String, GatewayError> {
        validate(&fields).inspect_err(|e| log_failure("insert", e))?;

        let row: IdRow = self
            .client
            .insert(&self.table, &fields, "id")
            .await
            .map_err(GatewayError::from)
            .inspect_err(|e| log_failure("insert", e))?;

        Ok(row.id)
    }

    async fn update(&self, id: &str, fields: BookFields) -> Result<(), GatewayError> {
        validate(&fields).inspect_err(|e| log_failure("update", e))?;

        let touched: Vec<IdRow> = self
            .client
            .update(&self.table, &[Filter::eq("id", id)], &fields, "id")
            .await
            .map_err(GatewayError::from)
            .inspect_err(|e| log_failure("update", e))?;

        if touched.is_empty() {
            tracing::warn!(component = "gateway", operation = "update", %id, "update matched no book");
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.client
            .delete(&self.table, &[Filter::eq("id", id)])
            .await
            .map_err(GatewayError::from)
            .inspect_err(|e| log_failure("delete", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::query::SortKey;

    // Nothing listens on the discard port; any request would fail as transport.
    fn offline_gateway() -> RemoteBookGateway {
        let client = StoreClient::new("http://127.0.0.1:9", "/rest/v1", Some("anon")).unwrap();
        RemoteBookGateway::new(client, "books")
    }

    #[tokio::test]
    async fn blank_fields_fail_before_any_store_call() {
        let gateway = offline_gateway();

        let err = gateway
            .insert(BookFields::new("", "Martin"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));

        let err = gateway
            .update("1", BookFields::new("Clean Code", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn unreachable_store_fails_list_as_transport() {
        let err = offline_gateway()
            .list(&BookQuery::all(SortKey::Newest))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn get_collapses_store_failures_into_not_found() {
        let err = offline_gateway().get("1").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn id_rows_accept_numeric_keys() {
        let row: IdRow = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(row.id, "42");
        let row: IdRow = serde_json::from_str(r#"{"id": "3f1c"}"#).unwrap();
        assert_eq!(row.id, "3f1c");
    }

    #[test]
    fn store_rows_are_settled_into_the_in_memory_order() {
        // A case-sensitive collation would put "CODEX" before "atomic".
        let store_order: Vec<Book> = serde_json::from_value(serde_json::json!([
            {"id": "3", "title": "CODEX", "author": "A", "tags": ["IT"], "created_at": "2024-02-01T00:00:00Z"},
            {"id": "1", "title": "atomic", "author": "A", "tags": ["IT"], "created_at": null},
            {"id": "2", "title": "Clean Code", "author": "A", "tags": ["IT"], "created_at": "2024-03-01T00:00:00Z"}
        ]))
        .unwrap();

        let query = BookQuery::new(None, Some("IT"), SortKey::TitleAsc);
        let mut memory_input = store_order.clone();
        memory_input.reverse();

        assert_eq!(query.apply(store_order), query.apply(memory_input));
    }
}

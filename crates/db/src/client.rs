use bookshelf_kernel::settings::StoreSettings;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::query::{Filter, Query};

/// Handle on a PostgREST endpoint. Cheap to clone; shares the connection pool.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: Client,
    base_url: String,
}

impl StoreClient {
    /// Build a client for `url` + `schema_path`, authenticating with `api_key`
    /// when one is configured.
    pub fn new(url: &str, schema_path: &str, api_key: Option<&str>) -> Result<Self, StoreError> {
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(StoreError::Config("store url is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let apikey = HeaderValue::from_str(key)
                .map_err(|_| StoreError::Config("api key is not a valid header".to_string()))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| StoreError::Config("api key is not a valid header".to_string()))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let http = Client::builder().default_headers(headers).build()?;

        let schema_path = schema_path.trim_matches('/');
        let base_url = if schema_path.is_empty() {
            url.to_string()
        } else {
            format!("{url}/{schema_path}")
        };

        Ok(Self { http, base_url })
    }

    /// Build a client from the `[store]` settings section.
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, StoreError> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Config("store.url is not set".to_string()))?;
        Self::new(url, &settings.schema_path, settings.api_key.as_deref())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    /// Fetch the rows matching `query`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, StoreError> {
        let request = self
            .http
            .request(Method::GET, self.table_url(table))
            .query(&query.to_params());
        self.send_json(request, "select", table).await
    }

    /// Insert one row and return the columns named in `returning`.
    pub async fn insert<B, T>(&self, table: &str, row: &B, returning: &str) -> Result<T, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .http
            .request(Method::POST, self.table_url(table))
            .query(&[("select", returning)])
            .header("Prefer", "return=representation")
            .json(row);
        let mut rows: Vec<T> = self.send_json(request, "insert", table).await?;
        if rows.is_empty() {
            return Err(StoreError::Rejected {
                status: 200,
                message: "insert returned no row".to_string(),
                code: None,
            });
        }
        Ok(rows.swap_remove(0))
    }

    /// Patch the rows matching `filters`; returns the `returning` columns of
    /// every row that was touched.
    pub async fn update<B, T>(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &B,
        returning: &str,
    ) -> Result<Vec<T>, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let params = Self::filter_params(filters, returning)?;
        let request = self
            .http
            .request(Method::PATCH, self.table_url(table))
            .query(&params)
            .header("Prefer", "return=representation")
            .json(patch);
        self.send_json(request, "update", table).await
    }

    /// Delete the rows matching `filters`.
    pub async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), StoreError> {
        let mut params = Self::filter_params(filters, "")?;
        params.retain(|(key, _)| key != "select");
        let request = self
            .http
            .request(Method::DELETE, self.table_url(table))
            .query(&params)
            .header("Prefer", "return=minimal");
        self.send(request, "delete", table).await.map(|_| ())
    }

    // Mutations without a filter would hit the whole table.
    fn filter_params(filters: &[Filter], returning: &str) -> Result<Vec<(String, String)>, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::Config(
                "refusing to mutate without a filter".to_string(),
            ));
        }
        let query = filters
            .iter()
            .cloned()
            .fold(Query::select(returning), Query::filter);
        Ok(query.to_params())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
        table: &str,
    ) -> Result<T, StoreError> {
        let body = self.send(request, operation, table).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        operation: &'static str,
        table: &str,
    ) -> Result<String, StoreError> {
        tracing::debug!(target: "bookshelf-db", operation, table, "store request");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = StoreError::from_body(status.as_u16(), &body);
            tracing::warn!(
                target: "bookshelf-db",
                operation,
                table,
                status = status.as_u16(),
                error = %err,
                "store rejected request"
            );
            return Err(err);
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_kernel::settings::StoreBackend;

    #[test]
    fn base_url_joins_schema_path() {
        let client = StoreClient::new("https://demo.supabase.co/", "/rest/v1", Some("anon")).unwrap();
        assert_eq!(client.base_url(), "https://demo.supabase.co/rest/v1");
        assert_eq!(client.table_url("books"), "https://demo.supabase.co/rest/v1/books");
    }

    #[test]
    fn empty_url_is_a_config_error() {
        assert!(matches!(
            StoreClient::new("  ", "/rest/v1", None),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn from_settings_requires_url() {
        let settings = StoreSettings {
            backend: StoreBackend::Rest,
            ..StoreSettings::default()
        };
        assert!(matches!(
            StoreClient::from_settings(&settings),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn unfiltered_mutations_are_refused() {
        assert!(matches!(
            StoreClient::filter_params(&[], "id"),
            Err(StoreError::Config(_))
        ));
        let params = StoreClient::filter_params(&[Filter::eq("id", "7")], "id").unwrap();
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "id".to_string()),
                ("id".to_string(), "eq.7".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn unreachable_store_is_a_transport_error() {
        let client = StoreClient::new("http://127.0.0.1:9", "/rest/v1", None).unwrap();
        let result: Result<Vec<serde_json::Value>, _> =
            client.select("books", &Query::select("*")).await;
        assert!(matches!(result, Err(StoreError::Transport(_))));
    }
}

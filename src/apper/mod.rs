pub mod dto;
pub mod memory;

use std::env;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub use dto::{
    BatchResponse, DeleteParams, FetchParams, FetchResponse, FieldError, RecordResponse,
    RecordResult, RecordsParams, Row, WhereClause,
};
pub use memory::InMemoryRecordClient;

pub const DEFAULT_BASE_URL: &str = "https://api.apper.io";

const PROJECT_ID_HEADER: &str = "x-apper-project-id";
const PUBLIC_KEY_HEADER: &str = "x-apper-public-key";

#[derive(Clone, Debug)]
pub struct ApperConfig {
    pub project_id: String,
    pub public_key: String,
    pub base_url: String,
}

impl ApperConfig {
    pub fn new(project_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            public_key: public_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let project_id = env::var("APPER_PROJECT_ID")
            .map_err(|_| AppError::Config("APPER_PROJECT_ID is not set".to_string()))?;
        let public_key = env::var("APPER_PUBLIC_KEY")
            .map_err(|_| AppError::Config("APPER_PUBLIC_KEY is not set".to_string()))?;
        let base_url = env::var("APPER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            project_id,
            public_key,
            base_url,
        })
    }
}

/// Access to the remote record store. Every method maps to one remote call;
/// a response with `success: false` is returned as data, not as an error.
#[async_trait]
pub trait RecordClient: Send + Sync {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse, AppError>;
    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse, AppError>;
    async fn create_record(&self, table: &str, params: &RecordsParams) -> Result<BatchResponse, AppError>;
    async fn update_record(&self, table: &str, params: &RecordsParams) -> Result<BatchResponse, AppError>;
    async fn delete_record(&self, table: &str, params: &DeleteParams) -> Result<BatchResponse, AppError>;
}

pub struct ApperHttpClient {
    client: Client,
    config: ApperConfig,
}

impl ApperHttpClient {
    pub fn new(config: ApperConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str, suffix: &str) -> String {
        format!(
            "{}/tables/{}{}",
            self.config.base_url.trim_end_matches('/'),
            table,
            suffix
        )
    }

    async fn send<B, R>(&self, method: Method, url: &str, body: &B) -> Result<R, AppError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!("Apper request: {} {}", method, url);

        let response = self
            .client
            .request(method, url)
            .header(PROJECT_ID_HEADER, &self.config.project_id)
            .header(PUBLIC_KEY_HEADER, &self.config.public_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = nested_message(&body_text)
                .unwrap_or_else(|| format!("Apper API error {}: {}", status, body_text));
            return Err(AppError::Transport(message));
        }

        let body_text = response.text().await?;
        serde_json::from_str::<R>(&body_text).map_err(|e| {
            tracing::error!("Failed to parse: {}", e);
            AppError::Transport(format!("Failed to parse Apper response: {}", e))
        })
    }
}

/// Pulls `message` or `data.message` out of an error body, if it is JSON.
fn nested_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| value.pointer("/data/message").and_then(|m| m.as_str()))
        .map(str::to_string)
}

#[async_trait]
impl RecordClient for ApperHttpClient {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse, AppError> {
        let url = self.table_url(table, "/fetch");
        self.send(Method::POST, &url, params).await
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse, AppError> {
        let url = self.table_url(table, &format!("/records/{}", id));
        self.send(Method::POST, &url, params).await
    }

    async fn create_record(&self, table: &str, params: &RecordsParams) -> Result<BatchResponse, AppError> {
        let url = self.table_url(table, "/records");
        self.send(Method::POST, &url, params).await
    }

    async fn update_record(&self, table: &str, params: &RecordsParams) -> Result<BatchResponse, AppError> {
        let url = self.table_url(table, "/records");
        self.send(Method::PATCH, &url, params).await
    }

    async fn delete_record(&self, table: &str, params: &DeleteParams) -> Result<BatchResponse, AppError> {
        let url = self.table_url(table, "/records");
        self.send(Method::DELETE, &url, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_message_prefers_top_level() {
        let body = r#"{"message":"Invalid key","data":{"message":"inner"}}"#;
        assert_eq!(nested_message(body).as_deref(), Some("Invalid key"));
    }

    #[test]
    fn nested_message_reads_data_message() {
        let body = r#"{"data":{"message":"Table not found"}}"#;
        assert_eq!(nested_message(body).as_deref(), Some("Table not found"));
    }

    #[test]
    fn nested_message_ignores_plain_text() {
        assert_eq!(nested_message("Bad Gateway"), None);
    }
}

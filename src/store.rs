use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SupabaseConfig;
use crate::todo::{NewTodo, Todo};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to the todo store failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("todo store returned {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("todo store response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("todo store returned no row for the insert")]
    EmptyInsert,
}

/// One network round trip per call; no retries or paging.
pub trait TodoStore: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<Todo>, StoreError>;
    fn insert(&self, todo: &NewTodo) -> Result<Todo, StoreError>;
    fn set_completed(&self, id: &str, is_completed: bool) -> Result<(), StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// PostgREST client for a Supabase project, authenticated with the anon key.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    table_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            table_url: table_url(&config.url, &config.table),
            anon_key: config.anon_key.clone(),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    fn id_filter(id: &str) -> [(&'static str, String); 1] {
        [("id", format!("eq.{id}"))]
    }
}

impl TodoStore for SupabaseStore {
    fn fetch_all(&self) -> Result<Vec<Todo>, StoreError> {
        debug!(url = %self.table_url, "fetching todos");
        let response = self
            .authed(self.client.get(&self.table_url))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()?;
        let todos: Vec<Todo> = decode_json(response)?;
        debug!(count = todos.len(), "fetched todos");
        Ok(todos)
    }

    fn insert(&self, todo: &NewTodo) -> Result<Todo, StoreError> {
        debug!(title = %todo.title, priority = %todo.priority, "inserting todo");
        let response = self
            .authed(self.client.post(&self.table_url))
            .header("Prefer", "return=representation")
            .json(&[todo])
            .send()?;
        let rows: Vec<Todo> = decode_json(response)?;
        rows.into_iter().next().ok_or(StoreError::EmptyInsert)
    }

    fn set_completed(&self, id: &str, is_completed: bool) -> Result<(), StoreError> {
        debug!(id, is_completed, "updating todo completion");
        let response = self
            .authed(self.client.patch(&self.table_url))
            .query(&Self::id_filter(id))
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "is_completed": is_completed }))
            .send()?;
        ensure_success(response).map(|_| ())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        debug!(id, "deleting todo");
        let response = self
            .authed(self.client.delete(&self.table_url))
            .query(&Self::id_filter(id))
            .send()?;
        ensure_success(response).map(|_| ())
    }
}

fn table_url(base: &str, table: &str) -> String {
    let table = table.trim().trim_matches('/');
    let table = if table.is_empty() { "todos" } else { table };
    format!("{}/rest/v1/{table}", base.trim().trim_end_matches('/'))
}

fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let message = api_error_message(&body);
    warn!(%status, %message, "todo store request rejected");
    Err(StoreError::Api { status, message })
}

fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let body = ensure_success(response)?.text()?;
    Ok(serde_json::from_str(&body)?)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<PostgrestError>(body)
        .ok()
        .and_then(|err| err.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
#[path = "../tests/unit/store_tests.rs"]
mod tests;

//! This module provides a client to connect to a planner REST service

use std::error::Error;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use reqwest::header::USER_AGENT;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config;
use crate::error::RemoteError;
use crate::store::{TaskMap, TaskStore};
use crate::task::{DayKey, NotifyRequest, Task, TaskDraft, TaskId, TaskUpdate};
use crate::traits::PlannerRemote;


/// The body of a task creation: a draft, that is neither completed nor notified yet
#[derive(Serialize)]
struct CreateBody<'a> {
    #[serde(flatten)]
    draft: &'a TaskDraft,
    completed: bool,
    notified: bool,
}

#[derive(Serialize)]
struct MoveBody<'a> {
    #[serde(rename = "newDate")]
    new_date: &'a DayKey,
}


/// A planner source that talks to a planner REST service
pub struct Client {
    base_url: Url,
    token: Option<String>,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>>(base_url: S) -> Result<Self, Box<dyn Error>> {
        let base_url = Url::parse(base_url.as_ref())?;
        if base_url.cannot_be_a_base() {
            return Err(format!("{} cannot be used as a base URL", base_url).into());
        }

        Ok(Self{
            base_url,
            token: None,
            http: reqwest::Client::new(),
        })
    }

    /// Create a client from the [`API_URL_ENV_VAR`](config::API_URL_ENV_VAR) and [`API_TOKEN_ENV_VAR`](config::API_TOKEN_ENV_VAR) environment variables
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let url = std::env::var(config::API_URL_ENV_VAR)
            .map_err(|err| format!("Unable to read {}: {}", config::API_URL_ENV_VAR, err))?;
        let client = Self::new(url)?;
        Ok(match std::env::var(config::API_TOKEN_ENV_VAR) {
            Ok(token) => client.with_token(token),
            Err(_) => client,
        })
    }

    /// Set the bearer token sent along every request
    pub fn with_token<T: ToString>(mut self, token: T) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Replace the bearer token, e.g. after the identity provider refreshed it
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL of an endpoint, by appending (percent-encoded) path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot be used as a base URL", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http
            .request(method, url)
            .header(USER_AGENT, config::app_name());
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder.send().await?;
        if response.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?} for {}", response.status(), response.url()).into());
        }
        Ok(response)
    }
}

#[async_trait]
impl PlannerRemote for Client {
    async fn list_all(&self) -> Result<TaskMap, RemoteError> {
        let url = self.endpoint(&["planner"])?;
        log::debug!("Fetching every task from {}", url);
        let response = self.send(self.request(Method::GET, url)).await?;

        let value: Value = response.json().await?;
        if value.is_null() {
            return Ok(TaskMap::new());
        }
        let store = TaskStore::from_json_value(value)?;
        Ok(store.into())
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, RemoteError> {
        let url = self.endpoint(&["planner"])?;
        let body = CreateBody{ draft, completed: false, notified: false };
        let response = self.send(self.request(Method::POST, url).json(&body)).await?;
        let task: Task = response.json().await?;
        Ok(task)
    }

    async fn update(&self, date: &DayKey, id: &TaskId, fields: &TaskUpdate) -> Result<Task, RemoteError> {
        let url = self.endpoint(&["planner", &date.to_string(), &id.to_string()])?;
        let response = self.send(self.request(Method::PUT, url).json(fields)).await?;
        let task: Task = response.json().await?;
        Ok(task)
    }

    async fn delete(&self, date: &DayKey, id: &TaskId) -> Result<(), RemoteError> {
        let url = self.endpoint(&["planner", &date.to_string(), &id.to_string()])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn move_task(&self, id: &TaskId, destination: &DayKey) -> Result<(), RemoteError> {
        let url = self.endpoint(&["planner", "move", &id.to_string()])?;
        let body = MoveBody{ new_date: destination };
        self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(())
    }

    async fn notify(&self, id: &TaskId, request: &NotifyRequest) -> Result<(), RemoteError> {
        let url = self.endpoint(&["planner", "notify", &id.to_string()])?;
        self.send(self.request(Method::POST, url).json(request)).await?;
        Ok(())
    }

    async fn export_all(&self) -> Result<Vec<u8>, RemoteError> {
        let url = self.endpoint(&["planner", "export"])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn import_all(&self, tasks: &TaskMap) -> Result<(), RemoteError> {
        let url = self.endpoint(&["planner", "import"])?;
        self.send(self.request(Method::POST, url).json(tasks)).await?;
        Ok(())
    }
}

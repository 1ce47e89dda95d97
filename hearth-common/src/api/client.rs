//! HTTP client for hosted functions

use super::auth::{apply_auth, AuthScheme, Credentials};
use super::types::{ErrorBody, JobState, StartedJob, StatusRequest};
use crate::config::FunctionsConfig;
use crate::polling::JobSource;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const USER_AGENT: &str = concat!("hearth/", env!("CARGO_PKG_VERSION"));

/// One hosted function and the credential scheme it expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub scheme: AuthScheme,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, scheme: AuthScheme) -> Self {
        Self {
            name: name.into(),
            scheme,
        }
    }
}

/// Client for the hosted backend functions
#[derive(Debug, Clone)]
pub struct FunctionsClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl FunctionsClient {
    pub fn new(config: &FunctionsConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.name.trim_start_matches('/'))
    }

    /// POST `body` as JSON and decode the JSON response
    pub async fn call<Req, Resp>(&self, endpoint: &Endpoint, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url(endpoint);
        debug!(function = %endpoint.name, url = %url, "Calling function");

        let request = apply_auth(
            self.http_client.post(&url).json(body),
            endpoint.scheme,
            self.credentials.as_ref(),
        );
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!(function = %endpoint.name, error = %e, "Failed to read error body");
                    String::new()
                }
            };
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or(text);
            return Err(Error::Remote {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Start an asynchronous job, returning its `operationId`
    pub async fn start_job<Req>(&self, endpoint: &Endpoint, body: &Req) -> Result<String>
    where
        Req: Serialize + ?Sized,
    {
        let started: StartedJob = self.call(endpoint, body).await?;
        if started.operation_id.is_empty() {
            return Err(Error::Internal(format!(
                "{} returned an empty operationId",
                endpoint.name
            )));
        }
        Ok(started.operation_id)
    }

    /// Fetch the state of job `operation_id` from a status function
    pub async fn job_state(&self, endpoint: &Endpoint, operation_id: &str) -> Result<JobState> {
        let request = StatusRequest {
            operation_id: operation_id.to_string(),
        };
        let mut state: JobState = self.call(endpoint, &request).await?;
        if state.operation_id.is_empty() {
            state.operation_id = operation_id.to_string();
        }
        Ok(state)
    }

    /// Bind this client to a status function for polling
    pub fn status_endpoint(&self, endpoint: Endpoint) -> StatusEndpoint {
        StatusEndpoint {
            client: self.clone(),
            endpoint,
        }
    }
}

/// A status function that a [`crate::polling::JobPoller`] can poll
#[derive(Debug, Clone)]
pub struct StatusEndpoint {
    client: FunctionsClient,
    endpoint: Endpoint,
}

#[async_trait]
impl JobSource for StatusEndpoint {
    async fn fetch(&self, operation_id: &str) -> Result<JobState> {
        self.client.job_state(&self.endpoint, operation_id).await
    }
}

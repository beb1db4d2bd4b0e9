// ABOUTME: HTTP client for the orchestration service built on reqwest.
// ABOUTME: Explicitly constructed and injected; no process-wide singleton.

use super::error::{ApiError, classify_error_body};
use super::pipeline::{
    CONFIG_LOCATION_HEADER, Event, EventPage, MEDIA_TYPE_PIPELINE_V2, MEDIA_TYPE_PIPELINE_V2_LINK,
    Pipeline, PipelineBackend, PipelineDescriptor, Submission,
};
use crate::types::PipelineId;
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How many blocked-by hops to keep from a fetched pipeline snapshot.
const RELATION_DEPTH: usize = 1;

/// Client for the pipeline orchestration API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// An authorized GET builder for sibling endpoint modules.
    pub(crate) fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(url))
    }

    /// Create a pipeline from the given submission.
    ///
    /// Structured submissions send the full request body under the pipeline
    /// media type; reference submissions send only override fields under the
    /// link media type, with the config source named in a location header.
    pub async fn submit_pipeline(
        &self,
        submission: &Submission,
    ) -> Result<PipelineDescriptor, ApiError> {
        let url = self.url("/pipelines");
        debug!("POST {url}");

        let request = match submission {
            Submission::Structured(body) => {
                let body = serde_json::to_vec(body)
                    .map_err(|source| ApiError::Encode { source })?;
                self.authorize(self.http.post(&url))
                    .header(header::CONTENT_TYPE, MEDIA_TYPE_PIPELINE_V2)
                    .header(header::ACCEPT, "application/json")
                    .body(body)
            }
            Submission::Reference {
                location,
                overrides,
            } => {
                let body = serde_json::to_vec(overrides)
                    .map_err(|source| ApiError::Encode { source })?;
                self.authorize(self.http.post(&url))
                    .header(header::CONTENT_TYPE, MEDIA_TYPE_PIPELINE_V2_LINK)
                    .header(header::ACCEPT, "application/json")
                    .header(CONFIG_LOCATION_HEADER, location.header_value())
                    .body(body)
            }
        };

        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

        read_body(url, response).await
    }

    pub async fn fetch_pipeline(&self, id: &PipelineId) -> Result<Pipeline, ApiError> {
        let url = self.url(&format!("/pipelines/{}", urlencoding::encode(id.as_str())));
        debug!("GET {url}");

        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::PipelineNotFound { id: id.clone() });
        }

        let pipeline: Pipeline = read_body(url, response).await?;
        Ok(pipeline.pruned(RELATION_DEPTH))
    }

    pub async fn fetch_events(
        &self,
        id: &PipelineId,
        after: u64,
    ) -> Result<EventPage, ApiError> {
        let url = self.url(&format!(
            "/pipelines/{}/events?afterId={after}",
            urlencoding::encode(id.as_str())
        ));
        debug!("GET {url}");

        #[derive(Deserialize)]
        struct EventsResponse {
            #[serde(default)]
            events: Vec<Event>,
        }

        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let parsed: EventsResponse = read_body(url, response).await?;
        let cursor = parsed
            .events
            .iter()
            .map(|event| event.cursor)
            .max()
            .unwrap_or(after);

        Ok(EventPage {
            events: parsed.events,
            cursor,
        })
    }
}

/// Decode a 2xx body, or classify a failure body into a structured or raw
/// error.
pub(crate) async fn read_body<T: DeserializeOwned>(
    url: String,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

    if status.is_success() {
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { url, source })
    } else {
        Err(classify_error_body(url, status.as_u16(), body))
    }
}

#[async_trait]
impl PipelineBackend for ApiClient {
    async fn fetch_pipeline(&self, id: &PipelineId) -> Result<Pipeline, ApiError> {
        ApiClient::fetch_pipeline(self, id).await
    }

    async fn fetch_events(&self, id: &PipelineId, after: u64) -> Result<EventPage, ApiError> {
        ApiClient::fetch_events(self, id, after).await
    }
}

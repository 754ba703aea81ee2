// src/api_client.rs
use crate::credentials::CredentialStore;
use crate::errors::ApiError;
use crate::podcast::{AddUrlRequest, Item, Podcast, PodcastID, Usage};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://ytrss.xyz/api/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ===== api
#[async_trait]
pub trait PodcastApi: Send + Sync {
    async fn list_podcasts(&self) -> Result<Vec<Podcast>, ApiError>;

    async fn add_url(&self, podcast_id: &PodcastID, url: &str) -> Result<Item, ApiError>;

    async fn get_items(&self, podcast_id: &PodcastID) -> Result<Vec<Item>, ApiError>;

    async fn get_usage(&self) -> Result<Usage, ApiError>;
}

// ===== Live http client
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpApiClient {
    pub fn new(base_url: Url, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        const APP_USER_AGENT: &str = concat!("ytrss-cli/", env!("CARGO_PKG_VERSION"));

        let client: Client =
            Client::builder().user_agent(APP_USER_AGENT).timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { client, base_url, credentials })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url: Url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("invalid API base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// The store may hit the filesystem, so the read runs on the blocking pool.
    async fn api_key(&self) -> Result<String, ApiError> {
        let credentials: Arc<dyn CredentialStore> = self.credentials.clone();
        let read = tokio::task::spawn_blocking(move || credentials.get())
            .await
            .map_err(|e| ApiError::Credential(e.to_string()))?;
        match read {
            Ok(Some(key)) => Ok(key),
            Ok(None) => Err(ApiError::Unauthenticated),
            Err(e) => {
                warn!("HttpApiClient: credential store unreadable: {}", e);
                Err(ApiError::Credential(e.to_string()))
            }
        }
    }

    /// Reads the credential, builds the request and decodes a JSON answer.
    /// A missing credential short-circuits before any network traffic.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<String>,
    ) -> Result<T, ApiError> {
        let api_key: String = self.api_key().await?;

        let url: Url = self.endpoint(segments)?;
        debug!("HttpApiClient: {} {}", method, url);

        let mut request: RequestBuilder = self
            .client
            .request(method, url)
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let response: Response = request.send().await?;
        let status: StatusCode = response.status();
        let text: String = response.text().await?;

        if !status.is_success() {
            info!("HttpApiClient: request failed with {}", status);
            return Err(ApiError::Http { status: status.to_string(), body: text });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            status: status.as_u16(),
            message: e.to_string(),
            body: text.clone(),
        })
    }
}

#[async_trait]
impl PodcastApi for HttpApiClient {
    async fn list_podcasts(&self) -> Result<Vec<Podcast>, ApiError> {
        self.call(Method::GET, &["list-podcasts"], None).await
    }

    async fn add_url(&self, podcast_id: &PodcastID, url: &str) -> Result<Item, ApiError> {
        let body = AddUrlRequest { podcast_id: podcast_id.as_str(), url };
        let json: String = encode_body(&body)?;
        self.call(Method::POST, &["podcasts", "add-url"], Some(json)).await
    }

    async fn get_items(&self, podcast_id: &PodcastID) -> Result<Vec<Item>, ApiError> {
        self.call(Method::GET, &["get-items", podcast_id.as_str()], None).await
    }

    async fn get_usage(&self) -> Result<Usage, ApiError> {
        self.call(Method::GET, &["get-usage"], None).await
    }
}

fn encode_body<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Encode(e.to_string()))
}

// ===== Fake api for testing
/// Canned answers for every endpoint. Item fetches are served from a queue; the
/// last queued answer repeats once the queue is down to one entry.
pub struct FakeApi {
    podcasts: Result<Vec<Podcast>, ApiError>,
    added: Result<Item, ApiError>,
    items: Mutex<VecDeque<Result<Vec<Item>, ApiError>>>,
    usage: Result<Usage, ApiError>,
    calls: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            podcasts: Ok(Vec::new()),
            added: Ok(Item::new(crate::podcast::JobStatus::Created, None, None, None)),
            items: Mutex::new(VecDeque::new()),
            usage: Ok(Usage { usage: 0, limit: 0 }),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_podcasts(mut self, podcasts: Result<Vec<Podcast>, ApiError>) -> Self {
        self.podcasts = podcasts;
        self
    }

    pub fn with_added(mut self, added: Result<Item, ApiError>) -> Self {
        self.added = added;
        self
    }

    pub fn with_items(self, items: Result<Vec<Item>, ApiError>) -> Self {
        if let Ok(mut queue) = self.items.lock() {
            queue.push_back(items);
        }
        self
    }

    pub fn with_usage(mut self, usage: Result<Usage, ApiError>) -> Self {
        self.usage = usage;
        self
    }

    /// Endpoint names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl PodcastApi for FakeApi {
    async fn list_podcasts(&self) -> Result<Vec<Podcast>, ApiError> {
        self.record("list_podcasts".to_string());
        self.podcasts.clone()
    }

    async fn add_url(&self, podcast_id: &PodcastID, url: &str) -> Result<Item, ApiError> {
        self.record(format!("add_url {} {}", podcast_id, url));
        self.added.clone()
    }

    async fn get_items(&self, podcast_id: &PodcastID) -> Result<Vec<Item>, ApiError> {
        self.record(format!("get_items {}", podcast_id));
        let mut queue = match self.items.lock() {
            Ok(queue) => queue,
            Err(_) => return Ok(Vec::new()),
        };
        match queue.len() {
            0 => Ok(Vec::new()),
            1 => queue[0].clone(),
            _ => queue.pop_front().unwrap_or_else(|| Ok(Vec::new())),
        }
    }

    async fn get_usage(&self) -> Result<Usage, ApiError> {
        self.record("get_usage".to_string());
        self.usage.clone()
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{Url, form_urlencoded};

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";

// ── Wire types ────────────────────────────────────────────────────────────────

/// Backend primary key of a stored article. Opaque to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Some article payloads omit the id and short title
    #[serde(default)]
    pub id: Option<ArticleId>,
    pub title: String,
    #[serde(default)]
    pub short_title: Option<String>,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub sentiment: String,
    #[serde(default)]
    pub summary: String,
    pub url: String,
    #[serde(default)]
    pub top_image: Option<String>,
}

impl ArticleRecord {
    /// Chat title for this article: the backend's short title, or one derived the same way.
    pub fn display_title(&self) -> String {
        match &self.short_title {
            Some(t) if !t.trim().is_empty() => t.clone(),
            _ => crate::format::short_title(&self.title),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: ArticleId,
    pub short_title: String,
    /// Pre-formatted by the backend per bucket ("14:05", "Feb 23", "Feb 23, 2025")
    #[serde(default)]
    pub created_at: Option<String>,
}

/// History as bucketed by the backend. Never re-bucketed client-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryGroups {
    #[serde(default)]
    pub today: Vec<HistoryEntry>,
    #[serde(default)]
    pub week: Vec<HistoryEntry>,
    #[serde(default)]
    pub older: Vec<HistoryEntry>,
}

/// Body of `POST /process-article/`: `{"url": …}` or `{"query": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessPayload {
    Url(String),
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchAnswer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessReply {
    Article { article: ArticleRecord, from_cache: bool },
    /// Plain queries may be answered directly
    Search(SearchAnswer),
}

/// `{success, data|error, type?, from_cache?}`
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    from_cache: bool,
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete, or the reply was not an envelope.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The backend answered `success: false`.
    #[error("{0}")]
    Application(String),
}

impl ApiError {
    fn transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Transport("request timed out".to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

// ── Backend seam ──────────────────────────────────────────────────────────────

/// The five backend calls. One request, one response; no retries, no streaming.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn process_article_or_query(&self, payload: &ProcessPayload) -> Result<ProcessReply, ApiError>;
    async fn search_with_context(&self, query: &str) -> Result<SearchAnswer, ApiError>;
    async fn get_history(&self) -> Result<HistoryGroups, ApiError>;
    async fn get_article(&self, id: ArticleId) -> Result<ArticleRecord, ApiError>;
    async fn delete_article(&self, id: ArticleId) -> Result<(), ApiError>;
}

// ── Client ────────────────────────────────────────────────────────────────────

pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    jar: Arc<Jar>,
}

impl ApiClient {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| anyhow::anyhow!("invalid endpoint {endpoint:?}: {e}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let jar = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(concat!("quicknews/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self { http: builder.build()?, base, jar })
    }

    pub fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    /// Put a known anti-forgery token into the cookie store.
    pub fn seed_csrf_token(&self, token: &str) {
        self.jar
            .add_cookie_str(&format!("{CSRF_COOKIE}={token}; Path=/"), &self.base);
    }

    /// Load the index page so the backend can issue its session cookies.
    /// Failure is not fatal; state-changing calls will report it.
    pub async fn bootstrap(&self) {
        match self.http.get(self.base.clone()).send().await {
            Ok(resp) => tracing::debug!(status = %resp.status(), "bootstrap request done"),
            Err(e) => tracing::warn!("bootstrap request failed: {e}"),
        }
        if self.csrf_token().is_none() {
            tracing::debug!("no {CSRF_COOKIE} cookie after bootstrap");
        }
    }

    /// Current anti-forgery token, read from the cookie store.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        cookie_value(header.to_str().ok()?, CSRF_COOKIE)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Transport(format!("bad request path {path:?}: {e}")))
    }

    fn with_csrf(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.csrf_token() {
            Some(token) => req.header(CSRF_HEADER, token),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Envelope, ApiError> {
        let resp = req.send().await.map_err(ApiError::transport)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(ApiError::transport)?;

        match serde_json::from_slice::<Envelope>(&body) {
            Ok(env) if env.success => Ok(env),
            Ok(env) => Err(ApiError::Application(
                env.error.unwrap_or_else(|| "Unknown error".to_string()),
            )),
            // Non-JSON error pages (e.g. a rejected CSRF token) still carry a status
            Err(_) if !status.is_success() => {
                Err(ApiError::Application(format!("server responded with {status}")))
            }
            Err(e) => Err(ApiError::Transport(format!("malformed response: {e}"))),
        }
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Envelope, ApiError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "POST");
        self.send(self.with_csrf(self.http.post(url).json(body))).await
    }

    async fn get(&self, path: &str) -> Result<Envelope, ApiError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "GET");
        self.send(self.http.get(url)).await
    }
}

fn data<T: DeserializeOwned>(env: Envelope) -> Result<T, ApiError> {
    let value = env
        .data
        .ok_or_else(|| ApiError::Transport("reply has no data".to_string()))?;
    serde_json::from_value(value).map_err(|e| ApiError::Transport(format!("malformed data: {e}")))
}

#[async_trait]
impl Backend for ApiClient {
    async fn process_article_or_query(&self, payload: &ProcessPayload) -> Result<ProcessReply, ApiError> {
        let env = self.post_json("process-article/", payload).await?;
        match env.kind.as_deref() {
            Some("article") => {
                let from_cache = env.from_cache;
                Ok(ProcessReply::Article { article: data(env)?, from_cache })
            }
            Some("search") => Ok(ProcessReply::Search(data(env)?)),
            other => Err(ApiError::Transport(format!("unexpected reply type {other:?}"))),
        }
    }

    async fn search_with_context(&self, query: &str) -> Result<SearchAnswer, ApiError> {
        let env = self
            .post_json("search_with_context/", &serde_json::json!({ "query": query }))
            .await?;
        data(env)
    }

    async fn get_history(&self) -> Result<HistoryGroups, ApiError> {
        data(self.get("get-history/").await?)
    }

    async fn get_article(&self, id: ArticleId) -> Result<ArticleRecord, ApiError> {
        data(self.get(&format!("get-article/{id}/")).await?)
    }

    async fn delete_article(&self, id: ArticleId) -> Result<(), ApiError> {
        let url = self.url(&format!("delete-article/{id}/"))?;
        tracing::debug!(%url, "DELETE");
        self.send(self.with_csrf(self.http.delete(url))).await.map(|_| ())
    }
}

// ── Cookies ───────────────────────────────────────────────────────────────────

/// Value of `name` in a `Cookie:` header string, percent-decoded.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let (key, value) = form_urlencoded::parse(pair.as_bytes()).next()?;
        (key == name).then(|| value.into_owned())
    })
}

use async_trait::async_trait;
use isolang::Language;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::app_config::DownloadConfig;
use crate::errors::ProviderError;
use crate::language_utils::short_code;
use crate::providers::{SubtitleProvider, movie_hash};

static CREDENTIALS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^username=(?P<username>[^,]*),password=(?P<password>.*)$").unwrap()
});

/// OpenSubtitles account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Parse `username=<name>,password=<secret>`
    pub fn parse(value: &str) -> Option<Self> {
        let captures = CREDENTIALS_REGEX.captures(value.trim())?;
        Some(Self {
            username: captures["username"].to_string(),
            password: captures["password"].to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchResult>,
}

/// One subtitle entry of a search
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub attributes: SubtitleAttributes,
}

#[derive(Debug, Deserialize)]
pub struct SubtitleAttributes {
    #[serde(default)]
    pub language: Option<String>,
    /// Whether the entry was matched through the movie hash
    #[serde(default)]
    pub moviehash_match: Option<bool>,
    #[serde(default)]
    pub files: Vec<SubtitleFile>,
}

#[derive(Debug, Deserialize)]
pub struct SubtitleFile {
    pub file_id: u64,
}

#[derive(Debug, Serialize)]
struct DownloadRequest {
    file_id: u64,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
}

/// Client of the OpenSubtitles REST API
pub struct OpenSubtitles {
    /// HTTP client for API requests
    client: Client,
    /// API base URL without trailing slash
    endpoint: String,
    api_key: String,
    credentials: Option<Credentials>,
    /// Bearer token of the logged-in account
    token: Mutex<Option<String>>,
}

impl fmt::Debug for OpenSubtitles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenSubtitles")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl OpenSubtitles {
    /// Create a new OpenSubtitles client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(concat!("extractsubs v", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            credentials,
            token: Mutex::new(None),
        }
    }

    pub fn from_config(config: &DownloadConfig) -> Self {
        let credentials = (!config.username.is_empty()).then(|| Credentials {
            username: config.username.clone(),
            password: config.password.clone(),
        });

        Self::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            credentials,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Replace the HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    async fn login(&self, credentials: &Credentials) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.url("login"))
            .header("Api-Key", &self.api_key)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let login: LoginResponse = decode(check_status(response).await?).await?;
        debug!("Logged in to OpenSubtitles as {}", credentials.username);
        Ok(login.token)
    }

    /// Token for authenticated downloads; `None` for anonymous use
    async fn bearer_token(&self) -> Result<Option<String>, ProviderError> {
        let Some(credentials) = &self.credentials else {
            return Ok(None);
        };

        let mut token = self.token.lock().await;
        if token.is_none() {
            *token = Some(self.login(credentials).await?);
        }
        Ok(token.clone())
    }

    /// Search subtitles of `language` for the video at `video`
    pub async fn search(&self, video: &Path, language: Language) -> Result<Vec<SearchResult>, ProviderError> {
        let path = video.to_path_buf();
        let (hash, size) = tokio::task::spawn_blocking(move || movie_hash(&path))
            .await
            .map_err(|e| ProviderError::Io(io::Error::other(e.to_string())))??;

        let query_name = video
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let query = [
            ("languages", short_code(language)),
            ("moviebytesize", size.to_string()),
            ("moviehash", hash),
            ("query", query_name),
        ];

        let response = self
            .client
            .get(self.url("subtitles"))
            .header("Api-Key", &self.api_key)
            .query(&query)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let search: SearchResponse = decode(check_status(response).await?).await?;
        Ok(search.data)
    }

    /// Download the subtitle file `file_id` and return its content
    pub async fn download(&self, file_id: u64) -> Result<String, ProviderError> {
        let mut request = self
            .client
            .post(self.url("download"))
            .header("Api-Key", &self.api_key)
            .json(&DownloadRequest { file_id });

        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let download: DownloadResponse = decode(check_status(response).await?).await?;

        let content = self
            .client
            .get(&download.link)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        check_status(content)
            .await?
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }
}

/// First file of the first hash-matched result, else of the first result
pub fn pick_file(results: &[SearchResult]) -> Option<u64> {
    let first_file = |result: &SearchResult| result.attributes.files.first().map(|file| file.file_id);

    results
        .iter()
        .filter(|result| result.attributes.moviehash_match == Some(true))
        .find_map(first_file)
        .or_else(|| results.iter().find_map(first_file))
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        status_code => ProviderError::ApiError { status_code, message },
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::ParseError(e.to_string()))
}

#[async_trait]
impl SubtitleProvider for OpenSubtitles {
    fn name(&self) -> &str {
        "OpenSubtitles"
    }

    async fn fetch(&self, video: &Path, language: Language) -> Result<Option<String>, ProviderError> {
        let results = self.search(video, language).await?;
        let Some(file_id) = pick_file(&results) else {
            return Ok(None);
        };

        debug!("Downloading OpenSubtitles file {} for {:?}", file_id, video);
        self.download(file_id).await.map(Some)
    }
}

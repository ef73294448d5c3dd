use crate::catalog::{PodcastLength, DEFAULT_GUEST, DEFAULT_HOST};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Error as ReqwestError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

const TRANSCRIPT_MISSING_MARKER: &str = "Could not find any English transcript";
const NO_SUBTITLES_MESSAGE: &str =
    "This YouTube video does not have English subtitles. Please try another video or content source.";
const GENERIC_SERVICE_MESSAGE: &str = "Error generating podcast";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select host and guest before generating.")]
    MissingVoices,
    #[error("Please provide at least one content source (file, YouTube URL, web URL, or text).")]
    MissingContent,
    #[error("File must be a PDF document")]
    NotPdf,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),
    #[error("Generation service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("No audio URL in response")]
    MissingAudioUrl,
    #[error("Invalid response from generation service: {0}")]
    InvalidResponse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    /// Message shown in the error toast
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Service { message, .. } => message.clone(),
            GenerationError::MissingAudioUrl => self.to_string(),
            GenerationError::Request(_) => GENERIC_SERVICE_MESSAGE.to_string(),
            GenerationError::InvalidResponse(_) | GenerationError::Io(_) => {
                "An unexpected error occurred".to_string()
            }
        }
    }
}

/// A local file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub name: String,
}

impl UploadFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }

    pub fn is_pdf(&self) -> bool {
        Path::new(&self.name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSources {
    pub file: Option<UploadFile>,
    pub youtube_url: String,
    pub web_url: String,
    pub text_content: String,
}

impl ContentSources {
    pub fn is_empty(&self) -> bool {
        self.file.is_none()
            && self.youtube_url.trim().is_empty()
            && self.web_url.trim().is_empty()
            && self.text_content.trim().is_empty()
    }
}

/// Everything the user chose on the generation screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub content: ContentSources,
    pub host: Option<String>,
    pub guest: Option<String>,
    pub length: PodcastLength,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            content: ContentSources::default(),
            host: Some(DEFAULT_HOST.to_string()),
            guest: Some(DEFAULT_GUEST.to_string()),
            length: PodcastLength::default(),
        }
    }
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let selected = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !selected(&self.host) || !selected(&self.guest) {
            return Err(ValidationError::MissingVoices);
        }
        if self.content.is_empty() {
            return Err(ValidationError::MissingContent);
        }
        if let Some(file) = &self.content.file {
            if !file.is_pdf() {
                return Err(ValidationError::NotPdf);
            }
        }
        Ok(())
    }
}

/// Submits generation requests and yields a playable audio URL
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct PodcastResponse {
    #[allow(dead_code)]
    #[serde(default)]
    script: Option<serde_json::Value>,
    #[serde(default)]
    audio_url: Option<String>,
}

/// Talks to the generation service over HTTP
#[derive(Clone)]
pub struct HttpGenerationClient {
    client: Client,
    config: Config,
    endpoint: String,
}

impl HttpGenerationClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            endpoint: config.generate_endpoint(),
            config: config.clone(),
        }
    }

    async fn build_form(request: &GenerationRequest) -> Result<Form, GenerationError> {
        let mut form = Form::new();

        if let Some(file) = &request.content.file {
            let bytes = tokio::fs::read(&file.path).await?;
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str("application/pdf")?;
            form = form.part("file", part);
        }

        let text_fields = [
            ("youtube_url", request.content.youtube_url.trim()),
            ("web_url", request.content.web_url.trim()),
            ("text_content", request.content.text_content.as_str()),
            ("host_name", request.host.as_deref().unwrap_or_default()),
            ("guest_name", request.guest.as_deref().unwrap_or_default()),
        ];
        for (name, value) in text_fields {
            if !value.trim().is_empty() {
                form = form.text(name, value.to_string());
            }
        }

        Ok(form.text("length", request.length.as_str()))
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        info!("Requesting podcast generation from {}", self.endpoint);
        let form = Self::build_form(request).await?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Generation failed with {}: {}", status, body);
            return Err(GenerationError::Service {
                status: status.as_u16(),
                message: service_message(&body),
            });
        }

        let parsed: PodcastResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        let audio_url = parsed
            .audio_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(GenerationError::MissingAudioUrl)?;

        let resolved = self.config.resolve_audio_url(&audio_url);
        info!("Podcast ready at {}", resolved);
        Ok(resolved)
    }
}

/// Turn an error body from the service into something a user can act on
pub fn service_message(body: &str) -> String {
    if body.contains(TRANSCRIPT_MISSING_MARKER) {
        return NO_SUBTITLES_MESSAGE.to_string();
    }

    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Object(map) => ["detail", "msg"].iter().find_map(|key| {
                map.get(*key)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            }),
            _ => None,
        });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() || body.trim_start().starts_with('{') => {
            GENERIC_SERVICE_MESSAGE.to_string()
        }
        None => body.trim().to_string(),
    }
}

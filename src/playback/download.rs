use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, Url};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// File name used when the resource URL has no usable trailing segment
pub const FALLBACK_FILE_NAME: &str = "podcast.mp3";

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),
    #[error("Download failed with status {0}")]
    Status(u16),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Save cancelled")]
    Cancelled,
}

/// Retrieves the bytes behind a resource URL
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Persists a materialized download under a user-facing name
#[async_trait]
pub trait SaveTarget: Send + Sync {
    async fn save(&self, temp: &TempObject, file_name: &str) -> Result<PathBuf, DownloadError>;
}

/// Fetches resources over HTTP
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Temporary local copy of downloaded bytes
///
/// The backing file is removed when the value is dropped, on every path.
pub struct TempObject {
    file: NamedTempFile,
}

impl TempObject {
    pub fn materialize(bytes: &[u8]) -> Result<Self, DownloadError> {
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        debug!("Materialized temporary download object {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for TempObject {
    fn drop(&mut self) {
        debug!("Releasing temporary download object {}", self.path().display());
    }
}

/// Saves into a fixed directory, never overwriting an existing file
#[derive(Clone, Debug)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SaveTarget for DirectorySaver {
    async fn save(&self, temp: &TempObject, file_name: &str) -> Result<PathBuf, DownloadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let destination = unique_destination(&self.dir, file_name).await?;
        tokio::fs::copy(temp.path(), &destination).await?;
        Ok(destination)
    }
}

/// Asks the user where to save with a native dialog
#[derive(Clone, Debug)]
pub struct DialogSaver {
    default_dir: PathBuf,
}

impl DialogSaver {
    pub fn new(default_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_dir: default_dir.into(),
        }
    }
}

#[async_trait]
impl SaveTarget for DialogSaver {
    async fn save(&self, temp: &TempObject, file_name: &str) -> Result<PathBuf, DownloadError> {
        let default_dir = self.default_dir.clone();
        let suggested = file_name.to_string();
        // The blocking dialog keeps this future Send
        let destination = tokio::task::spawn_blocking(move || {
            rfd::FileDialog::new()
                .set_title("Save podcast")
                .set_directory(default_dir)
                .set_file_name(suggested)
                .save_file()
        })
        .await
        .map_err(|e| DownloadError::Io(std::io::Error::other(e)))?
        .ok_or(DownloadError::Cancelled)?;

        tokio::fs::copy(temp.path(), &destination).await?;
        Ok(destination)
    }
}

/// Fetch, materialize, save, release
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn ResourceFetcher>,
    saver: Arc<dyn SaveTarget>,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, saver: Arc<dyn SaveTarget>) -> Self {
        Self { fetcher, saver }
    }

    pub async fn download(&self, source: &str) -> Result<PathBuf, DownloadError> {
        let file_name = derive_file_name(source);
        info!("Downloading {} as {}", source, file_name);

        let bytes = self.fetcher.fetch(source).await?;
        let temp = TempObject::materialize(&bytes)?;
        let saved = self.saver.save(&temp, &file_name).await;
        drop(temp);

        saved
    }
}

/// File name for a download: the URL's trailing path segment, decoded
pub fn derive_file_name(source: &str) -> String {
    let segment = match Url::parse(source) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => source
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };

    let decoded = segment
        .map(|s| match urlencoding::decode(&s) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => s.clone(),
        })
        .map(|s| s.replace(['/', '\\'], "_"))
        .unwrap_or_default();

    match decoded.trim() {
        "" | "." | ".." => FALLBACK_FILE_NAME.to_string(),
        name => name.to_string(),
    }
}

/// `name`, or `stem (n).ext` for the first n that doesn't exist yet
async fn unique_destination(dir: &Path, file_name: &str) -> Result<PathBuf, DownloadError> {
    let candidate = dir.join(file_name);
    if !tokio::fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut n = 1u32;
    loop {
        let numbered = match &extension {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        };
        if !tokio::fs::try_exists(&numbered).await? {
            return Ok(numbered);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSaver, StaticFetcher};
    use tempfile::TempDir;

    #[test]
    fn file_name_is_trailing_segment() {
        assert_eq!(
            derive_file_name("http://localhost:8000/podcasts/abc123/podcast_final.mp3"),
            "podcast_final.mp3"
        );
        assert_eq!(
            derive_file_name("http://localhost:8000/podcasts/episode.mp3?token=1#t=10"),
            "episode.mp3"
        );
    }

    #[test]
    fn file_name_is_decoded() {
        assert_eq!(
            derive_file_name("http://localhost:8000/podcasts/my%20show.mp3"),
            "my show.mp3"
        );
        assert_eq!(
            derive_file_name("http://localhost:8000/podcasts/a%2Fb.mp3"),
            "a_b.mp3"
        );
    }

    #[test]
    fn missing_segment_uses_fallback() {
        assert_eq!(derive_file_name("http://localhost:8000/"), FALLBACK_FILE_NAME);
        assert_eq!(derive_file_name("http://localhost:8000/podcasts/"), FALLBACK_FILE_NAME);
        assert_eq!(derive_file_name(""), FALLBACK_FILE_NAME);
        assert_eq!(derive_file_name("relative/take.mp3"), "take.mp3");
    }

    #[tokio::test]
    async fn existing_files_are_not_overwritten() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("show.mp3"), b"old").unwrap();
        std::fs::write(dir.path().join("show (1).mp3"), b"old").unwrap();
        std::fs::write(dir.path().join("notes"), b"old").unwrap();

        assert_eq!(
            unique_destination(dir.path(), "show.mp3").await.unwrap(),
            dir.path().join("show (2).mp3")
        );
        assert_eq!(
            unique_destination(dir.path(), "fresh.mp3").await.unwrap(),
            dir.path().join("fresh.mp3")
        );
        assert_eq!(
            unique_destination(dir.path(), "notes").await.unwrap(),
            dir.path().join("notes (1)")
        );
    }

    #[tokio::test]
    async fn saves_fetched_bytes_and_releases_temp_object() {
        let dir = TempDir::new().unwrap();
        let saver = Arc::new(RecordingSaver::new(DirectorySaver::new(dir.path())));
        let downloader = Downloader::new(
            Arc::new(StaticFetcher::ok(b"ID3 audio bytes".to_vec())),
            saver.clone(),
        );

        let saved = downloader
            .download("http://localhost:8000/podcasts/x/show.mp3")
            .await
            .unwrap();

        assert_eq!(saved, dir.path().join("show.mp3"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"ID3 audio bytes");
        let temps = saver.temp_paths();
        assert_eq!(temps.len(), 1);
        assert!(!temps[0].exists());
    }

    #[tokio::test]
    async fn failed_save_still_releases_temp_object() {
        let saver = Arc::new(RecordingSaver::failing());
        let downloader = Downloader::new(Arc::new(StaticFetcher::ok(vec![1, 2, 3])), saver.clone());

        let result = downloader.download("http://localhost:8000/podcasts/show.mp3").await;

        assert!(matches!(result, Err(DownloadError::Cancelled)));
        let temps = saver.temp_paths();
        assert_eq!(temps.len(), 1);
        assert!(!temps[0].exists());
    }

    #[tokio::test]
    async fn failed_fetch_never_reaches_saver() {
        let saver = Arc::new(RecordingSaver::failing());
        let downloader = Downloader::new(Arc::new(StaticFetcher::status(404)), saver.clone());

        let result = downloader.download("http://localhost:8000/podcasts/show.mp3").await;

        assert!(matches!(result, Err(DownloadError::Status(404))));
        assert!(saver.temp_paths().is_empty());
    }
}

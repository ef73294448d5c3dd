mod support;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use minicast::config::Config;
use minicast::generation::{
    ContentSources, GenerationClient, GenerationError, GenerationRequest, HttpGenerationClient,
    UploadFile,
};
use minicast::playback::{
    DirectorySaver, DownloadError, Downloader, HttpFetcher, ResourceFetcher, SaveTarget,
};
use std::sync::{Arc, Mutex};
use support::tracing_init;
use tempfile::TempDir;

const PODCAST_BYTES: &[u8] = b"RIFF fake generated audio";

/// Multipart bodies the fake service received
type Received = Arc<Mutex<Vec<String>>>;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config_for(api_url: &str) -> Config {
    Config {
        api_url: api_url.to_string(),
        ..Config::default()
    }
}

fn text_request(text: &str) -> GenerationRequest {
    GenerationRequest {
        content: ContentSources {
            text_content: text.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn generation_service(status: StatusCode, body: &'static str, received: Received) -> Router {
    Router::new().route(
        "/generate-podcast",
        post(move |headers: HeaderMap, payload: Bytes| {
            let received = received.clone();
            async move {
                let content_type = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                assert!(content_type.starts_with("multipart/form-data"));
                received
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&payload).into_owned());
                (status, body)
            }
        }),
    )
}

#[tokio::test]
async fn relative_audio_url_is_resolved_against_the_service() {
    tracing_init();
    let received = Received::default();
    let base = serve(generation_service(
        StatusCode::OK,
        r#"{"script": [{"speaker": "Host", "text": "Hi"}], "audio_url": "/audio/abc.mp3"}"#,
        received.clone(),
    ))
    .await;
    let client = HttpGenerationClient::new(reqwest::Client::new(), &config_for(&base));

    let mut request = text_request("Rust ownership in five minutes");
    request.content.web_url = "https://example.com/post".to_string();
    let url = client.generate(&request).await.unwrap();

    assert_eq!(url, format!("{}/audio/abc.mp3", base));

    let bodies = received.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    for field in ["text_content", "web_url", "host_name", "guest_name", "length"] {
        assert!(body.contains(&format!("name=\"{}\"", field)), "missing {}", field);
    }
    assert!(!body.contains("name=\"youtube_url\""));
    assert!(!body.contains("name=\"file\""));
    assert!(body.contains("Rust ownership in five minutes"));
    assert!(body.contains("Adaptive"));
}

#[tokio::test]
async fn pdf_upload_is_sent_as_a_file_part() {
    tracing_init();
    let received = Received::default();
    let base = serve(generation_service(
        StatusCode::OK,
        r#"{"audio_url": "https://cdn.example.com/p.mp3"}"#,
        received.clone(),
    ))
    .await;
    let client = HttpGenerationClient::new(reqwest::Client::new(), &config_for(&base));

    let dir = TempDir::new().unwrap();
    let pdf = dir.path().join("paper.pdf");
    std::fs::write(&pdf, b"%PDF-1.4 minimal").unwrap();
    let request = GenerationRequest {
        content: ContentSources {
            file: Some(UploadFile::from_path(&pdf)),
            ..Default::default()
        },
        ..Default::default()
    };

    let url = client.generate(&request).await.unwrap();

    assert_eq!(url, "https://cdn.example.com/p.mp3");
    let bodies = received.lock().unwrap();
    assert!(bodies[0].contains("name=\"file\"; filename=\"paper.pdf\""));
    assert!(bodies[0].contains("application/pdf"));
    assert!(bodies[0].contains("%PDF-1.4 minimal"));
}

#[tokio::test]
async fn service_detail_becomes_the_error_message() {
    tracing_init();
    let base = serve(generation_service(
        StatusCode::BAD_REQUEST,
        r#"{"detail": "Could not extract text from the web page"}"#,
        Received::default(),
    ))
    .await;
    let client = HttpGenerationClient::new(reqwest::Client::new(), &config_for(&base));

    let err = client.generate(&text_request("notes")).await.unwrap_err();

    match &err {
        GenerationError::Service { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Could not extract text from the web page");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Could not extract text from the web page");
}

#[tokio::test]
async fn missing_transcript_suggests_another_source() {
    tracing_init();
    let base = serve(generation_service(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"detail": "Could not find any English transcript for this video"}"#,
        Received::default(),
    ))
    .await;
    let client = HttpGenerationClient::new(reqwest::Client::new(), &config_for(&base));

    let err = client.generate(&text_request("notes")).await.unwrap_err();

    assert!(err.user_message().contains("does not have English subtitles"));
}

#[tokio::test]
async fn response_without_audio_url_is_an_error() {
    tracing_init();
    let base = serve(generation_service(
        StatusCode::OK,
        r#"{"script": []}"#,
        Received::default(),
    ))
    .await;
    let client = HttpGenerationClient::new(reqwest::Client::new(), &config_for(&base));

    let err = client.generate(&text_request("notes")).await.unwrap_err();

    assert!(matches!(err, GenerationError::MissingAudioUrl));
    assert_eq!(err.user_message(), "No audio URL in response");
}

#[tokio::test]
async fn unreachable_service_gives_the_generic_message() {
    tracing_init();
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let client = HttpGenerationClient::new(reqwest::Client::new(), &config_for(&base));

    let err = client.generate(&text_request("notes")).await.unwrap_err();

    assert!(matches!(err, GenerationError::Request(_)));
    assert_eq!(err.user_message(), "Error generating podcast");
}

fn audio_server() -> Router {
    Router::new().route(
        "/audio/:name",
        get(|| async { ([(header::CONTENT_TYPE, "audio/mpeg")], PODCAST_BYTES) }),
    )
}

#[tokio::test]
async fn http_fetcher_reads_bytes_and_reports_status() {
    tracing_init();
    let base = serve(audio_server()).await;
    let fetcher = HttpFetcher::new(reqwest::Client::new());

    let bytes = fetcher
        .fetch(&format!("{}/audio/episode.mp3", base))
        .await
        .unwrap();
    assert_eq!(bytes, PODCAST_BYTES);

    let missing = fetcher.fetch(&format!("{}/nothing-here", base)).await;
    assert!(matches!(missing, Err(DownloadError::Status(404))));
}

#[tokio::test]
async fn downloader_saves_under_the_url_file_name() {
    tracing_init();
    let base = serve(audio_server()).await;
    let dir = TempDir::new().unwrap();
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(HttpFetcher::new(reqwest::Client::new()));
    let saver: Arc<dyn SaveTarget> = Arc::new(DirectorySaver::new(dir.path()));
    let downloader = Downloader::new(fetcher, saver);
    let url = format!("{}/audio/my%20episode.mp3", base);

    let first = downloader.download(&url).await.unwrap();
    let second = downloader.download(&url).await.unwrap();

    assert_eq!(first, dir.path().join("my episode.mp3"));
    assert_ne!(first, second);
    assert_eq!(std::fs::read(&first).unwrap(), PODCAST_BYTES);
    assert_eq!(std::fs::read(&second).unwrap(), PODCAST_BYTES);
}

#[tokio::test]
async fn failed_fetch_saves_nothing() {
    tracing_init();
    let base = serve(audio_server()).await;
    let dir = TempDir::new().unwrap();
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(HttpFetcher::new(reqwest::Client::new()));
    let saver: Arc<dyn SaveTarget> = Arc::new(DirectorySaver::new(dir.path()));
    let downloader = Downloader::new(fetcher, saver);

    let result = downloader.download(&format!("{}/gone.mp3", base)).await;

    assert!(matches!(result, Err(DownloadError::Status(404))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

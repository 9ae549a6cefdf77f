use std::fs;
use std::time::Duration;

use bookgen_core::{
    build_request, AgeGroup, BookSpecs, GenerationRequest, HumorLevel, JobEvent, JobHandle,
    Segmentation, SourceDocument,
};
use bookgen_engine::{ChannelSettings, FailureKind, JobChannel, ReqwestJobChannel};
use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn channel(server: &MockServer) -> ReqwestJobChannel {
    let origin = Url::parse(&server.uri()).unwrap();
    ReqwestJobChannel::new(ChannelSettings::new(origin)).expect("client")
}

fn request_for(dir: &TempDir) -> GenerationRequest {
    let file = dir.path().join("Stories.pdf");
    fs::write(&file, b"%PDF-1.4 fake").unwrap();
    build_request(
        Some(SourceDocument::from_path(&file)),
        Segmentation {
            section_description: "Prophet Yusuf".to_string(),
            additional_context: String::new(),
            page_start: Some(2),
            page_end: Some(5),
        },
        BookSpecs {
            theme: "patience".to_string(),
            humor: HumorLevel::clamped(7),
            age_group: AgeGroup::NineToTwelve,
        },
    )
    .unwrap()
}

fn sse(events: &[&str]) -> ResponseTemplate {
    let body: String = events.iter().map(|e| format!("data: {e}\n\n")).collect();
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

async fn collect(channel: &ReqwestJobChannel, id: &str) -> Vec<JobEvent> {
    let stream = channel
        .subscribe(&JobHandle::new(id))
        .await
        .expect("stream opens");
    stream.collect().await
}

#[tokio::test]
async fn submit_posts_multipart_form_and_returns_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_string_contains("name=\"sectionDescription\""))
        .and(body_string_contains("Prophet Yusuf"))
        .and(body_string_contains("name=\"pageStart\""))
        .and(body_string_contains("name=\"ageGroup\""))
        .and(body_string_contains("9-12"))
        .and(body_string_contains("filename=\"Stories.pdf\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"job_id": "abc", "status": "submitted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let handle = channel(&server)
        .submit(&request_for(&dir))
        .await
        .expect("submit ok");
    assert_eq!(handle, JobHandle::new("abc"));
}

#[tokio::test]
async fn submit_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let err = channel(&server).submit(&request_for(&dir)).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(422));
}

#[tokio::test]
async fn submit_fails_without_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let err = channel(&server).submit(&request_for(&dir)).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn submit_fails_before_network_when_document_is_unreadable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut request = request_for(&dir);
    request.document = SourceDocument::from_path(dir.path().join("missing.pdf"));

    let err = channel(&server).submit(&request).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Document);
}

#[tokio::test]
async fn submit_times_out_on_slow_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(serde_json::json!({"job_id": "late"})),
        )
        .mount(&server)
        .await;

    let mut settings = ChannelSettings::new(Url::parse(&server.uri()).unwrap());
    settings.request_timeout = Duration::from_millis(50);
    let channel = ReqwestJobChannel::new(settings).unwrap();

    let dir = TempDir::new().unwrap();
    let err = channel.submit(&request_for(&dir)).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn stream_yields_progress_then_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/abc"))
        .respond_with(sse(&[
            r#"{"progress": 10, "message": "Parsing"}"#,
            r#"{"progress": 60, "message": "Writing"}"#,
            r#"{"status": "completed", "result_url": "/files/abc.pdf", "book_title": "Yusuf Tale"}"#,
            r#"{"progress": 99, "message": "after terminal"}"#,
        ]))
        .mount(&server)
        .await;

    let events = collect(&channel(&server), "abc").await;
    let location = Url::parse(&format!("{}/files/abc.pdf", server.uri())).unwrap();
    assert_eq!(
        events,
        vec![
            JobEvent::Progress {
                percent: Some(10),
                message: Some("Parsing".to_string()),
            },
            JobEvent::Progress {
                percent: Some(60),
                message: Some("Writing".to_string()),
            },
            JobEvent::Completed {
                result_location: location,
                title: Some("Yusuf Tale".to_string()),
                percent: None,
                message: None,
            },
        ]
    );
}

#[tokio::test]
async fn error_payload_becomes_failed_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/abc"))
        .respond_with(sse(&[r#"{"error": "backend crashed"}"#]))
        .mount(&server)
        .await;

    let events = collect(&channel(&server), "abc").await;
    assert_eq!(
        events,
        vec![JobEvent::Failed {
            message: "Error: backend crashed".to_string()
        }]
    );
}

#[tokio::test]
async fn stream_ending_early_reports_stream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/abc"))
        .respond_with(sse(&[r#"{"status": "processing", "progress": 20, "message": "Analyzing content..."}"#]))
        .mount(&server)
        .await;

    let events = collect(&channel(&server), "abc").await;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], JobEvent::Progress { percent: Some(20), .. }));
    assert!(matches!(events[1], JobEvent::StreamError { .. }));
}

#[tokio::test]
async fn subscribe_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = match channel(&server).subscribe(&JobHandle::new("gone")).await {
        Ok(_) => panic!("expected subscribe to fail"),
        Err(err) => err,
    };
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn subscribe_encodes_reserved_characters_in_handle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/job%237%3Fx%2Fy"))
        .respond_with(sse(&[r#"{"error": "backend crashed"}"#]))
        .expect(1)
        .mount(&server)
        .await;

    let events = collect(&channel(&server), "job#7?x/y").await;
    assert_eq!(
        events,
        vec![JobEvent::Failed {
            message: "Error: backend crashed".to_string()
        }]
    );
}

#[tokio::test]
async fn fetch_artifact_saves_fixed_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-book", "application/pdf"))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let location = Url::parse(&format!("{}/download/abc", server.uri())).unwrap();
    let saved = channel(&server)
        .fetch_artifact(&location, &out.path().join("books"))
        .await
        .expect("download ok");

    assert_eq!(saved.file_name().unwrap(), "my_islamic_book.pdf");
    assert_eq!(fs::read(&saved).unwrap(), b"%PDF-book");
}

#[tokio::test]
async fn fetch_artifact_fails_on_missing_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/abc"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let out = TempDir::new().unwrap();
    let location = Url::parse(&format!("{}/download/abc", server.uri())).unwrap();
    let err = channel(&server)
        .fetch_artifact(&location, out.path())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert!(!out.path().join("my_islamic_book.pdf").exists());
}

use std::time::Duration;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::json;
use swap_engine::{HostSettings, HttpImageHost, ImageHost, UploadError};
use wiremock::matchers::{body_string_contains, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn host(server: &MockServer, max_bytes: u64) -> HttpImageHost {
    HttpImageHost::new(HostSettings {
        upload_url: format!("{}/upload", server.uri()),
        api_key: Some("host-key".to_string()),
        expiry: Duration::from_secs(900),
        max_bytes,
        ..HostSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn upload_sends_image_form_field_and_reads_nested_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(query_param("expiration", "900"))
        .and(query_param("key", "host-key"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"image\""))
        .and(body_string_contains("B1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"url": "https://img.example/U1.png"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = host(&server, 1024)
        .upload(Bytes::from_static(b"B1"))
        .await
        .unwrap();

    assert_eq!(url.as_str(), "https://img.example/U1.png");
}

#[tokio::test]
async fn upload_accepts_top_level_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "https://img.example/U2.png"})),
        )
        .mount(&server)
        .await;

    let url = host(&server, 1024)
        .upload(Bytes::from_static(b"B2"))
        .await
        .unwrap();

    assert_eq!(url.as_str(), "https://img.example/U2.png");
}

#[tokio::test]
async fn oversized_and_empty_images_never_reach_the_host() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let host = host(&server, 4);

    assert_eq!(
        host.upload(Bytes::new()).await.unwrap_err(),
        UploadError::Empty
    );
    assert_eq!(
        host.upload(Bytes::from_static(b"too big")).await.unwrap_err(),
        UploadError::TooLarge {
            max_bytes: 4,
            actual: 7
        }
    );
}

#[tokio::test]
async fn host_errors_are_descriptive() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let err = host(&server, 1024)
        .upload(Bytes::from_static(b"B1"))
        .await
        .unwrap_err();
    assert_eq!(err, UploadError::Rejected(413));
    assert_eq!(err.to_string(), "image host rejected the upload (http 413)");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;
    let err = host(&server, 1024)
        .upload(Bytes::from_static(b"B1"))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::BadResponse(_)));
}

use pretty_assertions::assert_eq;
use serde_json::json;
use swap_engine::{ClientSettings, HttpSwapClient, JobStatus, StatusError, SubmitError, SwapApi};
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpSwapClient {
    HttpSwapClient::new(ClientSettings {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        ..ClientSettings::default()
    })
    .unwrap()
}

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

#[tokio::test]
async fn submit_posts_both_images_and_returns_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/faceswap/image/run"))
        .and(header("x-magicapi-key", "test-key"))
        .and(body_json(json!({
            "input": {
                "swap_image": "https://img.example/U1",
                "target_image": "https://img.example/U2",
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-42"})))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = client(&server)
        .submit(&url("https://img.example/U1"), &url("https://img.example/U2"))
        .await
        .unwrap();

    assert_eq!(job_id, "job-42");
}

#[tokio::test]
async fn submit_classifies_http_status() {
    let cases = [
        (401, SubmitError::Unauthorized(401)),
        (403, SubmitError::Unauthorized(403)),
    ];
    for (code, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(code))
            .mount(&server)
            .await;

        let err = client(&server)
            .submit(&url("https://a/1"), &url("https://a/2"))
            .await
            .unwrap_err();
        assert_eq!(err, expected);
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("swap_image is required"))
        .mount(&server)
        .await;
    let err = client(&server)
        .submit(&url("https://a/1"), &url("https://a/2"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::InvalidPayload(ref msg) if msg.contains("swap_image")));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let err = client(&server)
        .submit(&url("https://a/1"), &url("https://a/2"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Unreachable(_)));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let err = client(&server)
        .submit(&url("https://a/1"), &url("https://a/2"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Unknown(_)));
}

#[tokio::test]
async fn submit_without_job_id_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "queued"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit(&url("https://a/1"), &url("https://a/2"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmitError::Unknown("response carried no job id".to_string())
    );
}

#[tokio::test]
async fn submit_to_closed_port_is_unreachable() {
    let client = HttpSwapClient::new(ClientSettings {
        base_url: "http://127.0.0.1:1".to_string(),
        ..ClientSettings::default()
    })
    .unwrap();

    let err = client
        .submit(&url("https://a/1"), &url("https://a/2"))
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::Unreachable(_)));
}

#[tokio::test]
async fn status_read_decodes_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/faceswap/image/status/job-42"))
        .and(header("x-magicapi-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "job-42", "status": "IN_PROGRESS"})),
        )
        .mount(&server)
        .await;

    let payload = client(&server).status("job-42").await.unwrap();

    assert_eq!(payload.status, JobStatus::Running);
    assert_eq!(payload.status_raw, "IN_PROGRESS");
    assert_eq!(payload.body["id"], "job-42");
}

#[tokio::test]
async fn status_read_errors_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/faceswap/image/status/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/faceswap/image/status/broken"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/faceswap/image/status/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/faceswap/image/status/statusless"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(
        client.status("forbidden").await.unwrap_err(),
        StatusError::Unauthorized(403)
    );
    assert_eq!(
        client.status("broken").await.unwrap_err(),
        StatusError::HttpStatus(502)
    );
    assert!(matches!(
        client.status("garbled").await.unwrap_err(),
        StatusError::Decode(_)
    ));
    assert!(matches!(
        client.status("statusless").await.unwrap_err(),
        StatusError::Decode(_)
    ));
}

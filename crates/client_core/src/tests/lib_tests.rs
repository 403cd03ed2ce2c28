use super::*;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use futures::StreamExt;
use serde_json::json;
use tokio::net::TcpListener;

const FAKE_JPEG: &[u8] = b"\xff\xd8fake-jpeg-bytes\xff\xd9";

#[derive(Clone, Default)]
struct StubBackend {
    inner: Arc<Mutex<StubInner>>,
}

#[derive(Default)]
struct StubInner {
    camera_on: bool,
    recognition_on: bool,
    next_id: i64,
    faces: Vec<FaceRecord>,
    received_uploads: Vec<(String, String, usize)>,
    fail_delete_with: Option<String>,
}

impl StubBackend {
    fn failing_delete(message: &str) -> Self {
        let stub = Self::default();
        stub.inner.lock().unwrap().fail_delete_with = Some(message.to_string());
        stub
    }
}

async fn start_camera(State(stub): State<StubBackend>) -> Json<serde_json::Value> {
    stub.inner.lock().unwrap().camera_on = true;
    Json(json!({"success": true, "message": "Camera started"}))
}

async fn stop_camera(State(stub): State<StubBackend>) -> Json<serde_json::Value> {
    stub.inner.lock().unwrap().camera_on = false;
    Json(json!({"success": true, "message": "Camera stopped"}))
}

// Deliberately answers in the older status-string convention so the
// envelope tolerance is exercised end to end.
async fn toggle_recognition(State(stub): State<StubBackend>) -> Json<serde_json::Value> {
    let mut inner = stub.inner.lock().unwrap();
    inner.recognition_on = !inner.recognition_on;
    Json(json!({
        "status": "success",
        "enabled": inner.recognition_on,
        "message": if inner.recognition_on { "Face recognition enabled" } else { "Face recognition disabled" },
    }))
}

async fn capture_face(State(stub): State<StubBackend>) -> Response {
    if stub.inner.lock().unwrap().camera_on {
        ([(header::CONTENT_TYPE, "image/jpeg")], FAKE_JPEG.to_vec()).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Camera is not active"})),
        )
            .into_response()
    }
}

async fn register_face(State(stub): State<StubBackend>, mut multipart: Multipart) -> Response {
    let mut name = String::new();
    let mut upload: Option<(String, String, usize)> = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name().unwrap_or_default() {
            "name" => name = field.text().await.unwrap(),
            "face_image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.unwrap();
                upload = Some((filename, mime, bytes.len()));
            }
            _ => {}
        }
    }

    if name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Person name is required"})),
        )
            .into_response();
    }
    let Some(upload) = upload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "No face image provided"})),
        )
            .into_response();
    };

    let mut inner = stub.inner.lock().unwrap();
    inner.next_id += 1;
    let id = inner.next_id;
    inner.faces.push(FaceRecord {
        id: FaceId(id),
        name,
        image_path: format!("/face_image/{id}"),
    });
    inner.received_uploads.push(upload);
    Json(json!({"success": true, "message": "Face registered successfully"})).into_response()
}

async fn get_registered_faces(State(stub): State<StubBackend>) -> Json<serde_json::Value> {
    let inner = stub.inner.lock().unwrap();
    Json(json!({"success": true, "faces": inner.faces}))
}

async fn delete_face(State(stub): State<StubBackend>, Path(id): Path<i64>) -> Response {
    let mut inner = stub.inner.lock().unwrap();
    if let Some(message) = &inner.fail_delete_with {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": message})),
        )
            .into_response();
    }
    let before = inner.faces.len();
    inner.faces.retain(|face| face.id != FaceId(id));
    if inner.faces.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "File not found"})),
        )
            .into_response();
    }
    Json(json!({"success": true, "message": "Face deleted successfully"})).into_response()
}

async fn reset_database(State(stub): State<StubBackend>) -> Json<serde_json::Value> {
    stub.inner.lock().unwrap().faces.clear();
    Json(json!({"success": true, "message": "Face database has been reset"}))
}

async fn video_feed() -> Response {
    let mut body = Vec::new();
    for frame in [&b"frame-one"[..], &b"frame-two"[..]] {
        body.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(frame);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(b"--frame\r\n");
    (
        [(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )],
        body,
    )
        .into_response()
}

async fn spawn_stub(stub: StubBackend) -> String {
    let app = Router::new()
        .route("/start_camera", post(start_camera))
        .route("/stop_camera", post(stop_camera))
        .route("/toggle_recognition", post(toggle_recognition))
        .route("/capture_face", get(capture_face))
        .route("/register_face", post(register_face))
        .route("/get_registered_faces", get(get_registered_faces))
        .route("/delete_face/:id", delete(delete_face))
        .route("/reset_database", post(reset_database))
        .route("/video_feed", get(video_feed))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[test]
fn rejects_unparseable_base_url() {
    let result = FaceApiClient::new("not a url");
    assert!(matches!(result, Err(ClientError::InvalidBaseUrl { .. })));
}

#[tokio::test]
async fn camera_start_and_stop_report_server_messages() {
    let server_url = spawn_stub(StubBackend::default()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    let started = client.start_camera().await.unwrap();
    assert!(started.success);
    assert_eq!(started.message_or(""), "Camera started");

    let stopped = client.stop_camera().await.unwrap();
    assert_eq!(stopped.message_or(""), "Camera stopped");
}

#[tokio::test]
async fn recognition_toggle_mirrors_server_flag_across_conventions() {
    let server_url = spawn_stub(StubBackend::default()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    let on = client.toggle_recognition().await.unwrap();
    assert!(on.enabled);
    let off = client.toggle_recognition().await.unwrap();
    assert!(!off.enabled);
}

#[tokio::test]
async fn capture_returns_jpeg_bytes_while_camera_is_on() {
    let server_url = spawn_stub(StubBackend::default()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    client.start_camera().await.unwrap();
    let frame = client.capture_frame().await.unwrap();
    assert_eq!(frame, FAKE_JPEG);
}

#[tokio::test]
async fn capture_with_camera_off_surfaces_server_message_verbatim() {
    let server_url = spawn_stub(StubBackend::default()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    let err = client.capture_frame().await.unwrap_err();
    match err {
        ClientError::Api(api) => assert_eq!(api.message, "Camera is not active"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn register_sends_multipart_fields_and_listing_reflects_it() {
    let stub = StubBackend::default();
    let server_url = spawn_stub(stub.clone()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    let ack = client
        .register_face(
            "Alice",
            RegistrationImage::captured_frame(FAKE_JPEG.to_vec()),
        )
        .await
        .unwrap();
    assert!(ack.success);

    let faces = client.list_faces().await.unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].name, "Alice");

    let inner = stub.inner.lock().unwrap();
    assert_eq!(
        inner.received_uploads,
        vec![(
            "captured_face.jpg".to_string(),
            "image/jpeg".to_string(),
            FAKE_JPEG.len()
        )]
    );
}

#[tokio::test]
async fn server_side_name_validation_travels_verbatim() {
    let server_url = spawn_stub(StubBackend::default()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    let err = client
        .register_face("  ", RegistrationImage::captured_frame(FAKE_JPEG.to_vec()))
        .await
        .unwrap_err();
    match err {
        ClientError::Api(api) => assert_eq!(api.message, "Person name is required"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_failure_keeps_listing_and_carries_message() {
    let stub = StubBackend::failing_delete("File not found");
    let server_url = spawn_stub(stub).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    client
        .register_face("Bob", RegistrationImage::captured_frame(FAKE_JPEG.to_vec()))
        .await
        .unwrap();

    let err = client.delete_face(FaceId(1)).await.unwrap_err();
    match err {
        ClientError::Api(api) => {
            assert_eq!(api.message, "File not found");
            assert_eq!(api.code, ErrorCode::NotFound);
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    let faces = client.list_faces().await.unwrap();
    assert_eq!(faces.len(), 1, "failed delete must not change the listing");
}

#[tokio::test]
async fn delete_then_list_shows_remaining_faces_only() {
    let server_url = spawn_stub(StubBackend::default()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    for name in ["Alice", "Bob"] {
        client
            .register_face(name, RegistrationImage::captured_frame(FAKE_JPEG.to_vec()))
            .await
            .unwrap();
    }
    client.delete_face(FaceId(1)).await.unwrap();

    let faces = client.list_faces().await.unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].name, "Bob");
}

#[tokio::test]
async fn reset_clears_the_listing() {
    let server_url = spawn_stub(StubBackend::default()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    client
        .register_face(
            "Carol",
            RegistrationImage::captured_frame(FAKE_JPEG.to_vec()),
        )
        .await
        .unwrap();
    client.reset_database().await.unwrap();

    assert!(client.list_faces().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    // Bind then drop to get a port with nothing listening on it.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = FaceApiClient::new(&format!("http://{addr}")).unwrap();
    let err = client.start_camera().await.unwrap_err();
    assert!(err.is_transport(), "got {err:?}");
}

#[tokio::test]
async fn video_feed_url_carries_cache_buster() {
    let client = FaceApiClient::new("http://127.0.0.1:5001").unwrap();
    assert!(client
        .video_feed_url()
        .starts_with("http://127.0.0.1:5001/video_feed?ts="));
}

#[tokio::test]
async fn video_feed_yields_individual_frames() {
    let server_url = spawn_stub(StubBackend::default()).await;
    let client = FaceApiClient::new(&server_url).unwrap();

    let feed = client.open_video_feed().await.unwrap();
    let frames: Vec<_> = feed.map(|frame| frame.unwrap()).collect().await;
    assert_eq!(frames, vec![b"frame-one".to_vec(), b"frame-two".to_vec()]);
}

//! HTTP camera and detector clients against a local stand-in service

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use domain_capture::*;
use serde_json::json;

#[derive(Clone, Default)]
struct Upstream {
    detector_ready: Arc<AtomicBool>,
    camera_locked: Arc<AtomicBool>,
}

async fn healthz(State(upstream): State<Upstream>) -> StatusCode {
    if upstream.detector_ready.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn detect(mut multipart: Multipart) -> impl IntoResponse {
    let mut image_len = 0;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            image_len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        }
    }

    if image_len == 0 {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "no image" })));
    }

    (
        StatusCode::OK,
        Json(json!({
            "predictions": [
                { "class": "bottle", "score": 0.88, "bbox": [12.0, 8.0, 40.0, 90.0] },
                { "class": "cup", "score": 0.35, "bbox": [60.0, 20.0, 30.0, 30.0] }
            ]
        })),
    )
}

async fn snapshot(State(upstream): State<Upstream>) -> impl IntoResponse {
    if upstream.camera_locked.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Vec::<u8>::new()).into_response();
    }
    (
        [(header::CONTENT_TYPE, "image/jpeg")],
        vec![0xFF_u8, 0xD8, 0xFF, 0xE0, 0x00],
    )
        .into_response()
}

async fn spawn_upstream(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/detect", post(detect))
        .route("/snapshot.jpg", get(snapshot))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_detector_round_trip_preserves_order() {
    let upstream = Upstream::default();
    upstream.detector_ready.store(true, Ordering::SeqCst);
    let base = spawn_upstream(upstream).await;

    let model = HttpModelLoader::new(&base).unwrap().load().await.unwrap();
    let detections = model.detect(&Frame::jpeg(vec![1, 2, 3])).await.unwrap();

    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].label, "bottle");
    assert_eq!(detections[0].bounding_box.height, 90.0);
    assert_eq!(detections[1].label, "cup");
}

#[tokio::test]
async fn test_unready_detector_is_model_load_error() {
    let base = spawn_upstream(Upstream::default()).await;

    let result = HttpModelLoader::new(&base).unwrap().load().await;
    assert!(matches!(result, Err(CaptureError::ModelLoad(_))));
}

#[tokio::test]
async fn test_detector_rejection_is_detection_error() {
    let upstream = Upstream::default();
    upstream.detector_ready.store(true, Ordering::SeqCst);
    let base = spawn_upstream(upstream).await;

    let model = HttpModelLoader::new(&base).unwrap().load().await.unwrap();
    let result = model.detect(&Frame::jpeg(Vec::new())).await;
    assert!(matches!(result, Err(CaptureError::Detection(_))));
}

#[tokio::test]
async fn test_snapshot_camera_is_exclusive_until_stopped() {
    let base = spawn_upstream(Upstream::default()).await;
    let camera = SnapshotCamera::new(format!("{base}/snapshot.jpg")).unwrap();

    let stream = StreamGuard::new(camera.acquire().await.unwrap());
    let frame = stream.snapshot().await.unwrap();
    assert_eq!(frame.content_type, "image/jpeg");
    assert_eq!(&frame.data[..2], &[0xFF_u8, 0xD8]);

    assert!(matches!(camera.acquire().await, Err(CameraError::Busy)));

    stream.release();
    let again = camera.acquire().await;
    assert!(again.is_ok());
}

#[tokio::test]
async fn test_snapshot_camera_auth_failure_is_permission_denied() {
    let upstream = Upstream::default();
    upstream.camera_locked.store(true, Ordering::SeqCst);
    let base = spawn_upstream(upstream).await;
    let camera = SnapshotCamera::new(format!("{base}/snapshot.jpg")).unwrap();

    assert!(matches!(
        camera.acquire().await,
        Err(CameraError::PermissionDenied(_))
    ));

    // The failed probe must not leave the device marked as taken
    assert!(!matches!(camera.acquire().await, Err(CameraError::Busy)));
}

/// Accepts connections and never answers
async fn spawn_stalled_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_clients_give_up_after_configured_timeout() {
    let base = spawn_stalled_upstream().await;
    let timeout = std::time::Duration::from_millis(200);
    let deadline = std::time::Duration::from_secs(5);

    let camera = SnapshotCamera::with_timeout(format!("{base}/snapshot.jpg"), timeout).unwrap();
    let acquired = tokio::time::timeout(deadline, camera.acquire())
        .await
        .expect("camera probe should time out on its own");
    assert!(matches!(acquired, Err(CameraError::Unavailable(_))));

    let loader = HttpModelLoader::with_timeout(&base, timeout).unwrap();
    let loaded = tokio::time::timeout(deadline, loader.load())
        .await
        .expect("detector probe should time out on its own");
    assert!(matches!(loaded, Err(CaptureError::ModelLoad(_))));
}

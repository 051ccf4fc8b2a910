//! Fakes for the camera, model and store boundaries

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use domain_capture::*;
use domain_inventory::models::InventoryDocument;
use domain_inventory::{
    InMemoryInventoryRepository, InventoryRepository, InventoryResult, InventoryService,
    InventoryViewModel,
};

#[derive(Clone, Copy, Default, PartialEq)]
pub enum CameraBehaviour {
    #[default]
    Works,
    Denied,
    SnapshotFails,
}

/// Counts acquisitions and releases
#[derive(Default)]
pub struct FakeCamera {
    pub behaviour: CameraBehaviour,
    pub acquired: AtomicUsize,
    pub stopped: Arc<AtomicUsize>,
}

impl FakeCamera {
    pub fn new(behaviour: CameraBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            ..Default::default()
        })
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

struct FakeStream {
    fail_snapshot: bool,
    stopped: Arc<AtomicUsize>,
}

#[async_trait]
impl Camera for FakeCamera {
    async fn acquire(&self) -> Result<Box<dyn VideoStream>, CameraError> {
        if self.behaviour == CameraBehaviour::Denied {
            return Err(CameraError::PermissionDenied("user said no".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            fail_snapshot: self.behaviour == CameraBehaviour::SnapshotFails,
            stopped: self.stopped.clone(),
        }))
    }
}

#[async_trait]
impl VideoStream for FakeStream {
    async fn snapshot(&self) -> Result<Frame, CameraError> {
        if self.fail_snapshot {
            return Err(CameraError::Capture("sensor timeout".to_string()));
        }
        Ok(Frame::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0]))
    }

    fn stop(&mut self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Model returning a fixed list, optionally after a delay
pub struct FakeModel {
    detections: Vec<Detection>,
    delay: Duration,
}

#[async_trait]
impl DetectionModel for FakeModel {
    async fn detect(&self, _frame: &Frame) -> CaptureResult<Vec<Detection>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.detections.clone())
    }
}

pub struct FakeLoader {
    pub detections: Vec<Detection>,
    pub fail: bool,
    pub delay: Duration,
    pub loads: Arc<AtomicUsize>,
}

impl FakeLoader {
    pub fn returning(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            fail: false,
            delay: Duration::ZERO,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(vec![])
        }
    }
}

#[async_trait]
impl ModelLoader for FakeLoader {
    async fn load(&self) -> CaptureResult<Arc<dyn DetectionModel>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CaptureError::ModelLoad("weights unreachable".to_string()));
        }
        Ok(Arc::new(FakeModel {
            detections: self.detections.clone(),
            delay: self.delay,
        }))
    }
}

/// In-memory store that records every write it receives
#[derive(Clone, Default)]
pub struct RecordingRepository {
    pub inner: InMemoryInventoryRepository,
    pub writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingRepository {
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn record(&self, name: &str) {
        self.writes.lock().unwrap().push(name.to_string());
    }
}

#[async_trait]
impl InventoryRepository for RecordingRepository {
    async fn get(&self, name: &str) -> InventoryResult<Option<InventoryDocument>> {
        self.inner.get(name).await
    }

    async fn list(&self) -> InventoryResult<Vec<InventoryDocument>> {
        self.inner.list().await
    }

    async fn set(&self, name: &str, quantity: i64) -> InventoryResult<()> {
        self.record(name);
        self.inner.set(name, quantity).await
    }

    async fn delete(&self, name: &str) -> InventoryResult<bool> {
        self.record(name);
        self.inner.delete(name).await
    }

    async fn set_if(
        &self,
        name: &str,
        quantity: i64,
        expected_revision: Option<i64>,
    ) -> InventoryResult<bool> {
        self.record(name);
        self.inner.set_if(name, quantity, expected_revision).await
    }

    async fn delete_if(&self, name: &str, expected_revision: i64) -> InventoryResult<bool> {
        self.record(name);
        self.inner.delete_if(name, expected_revision).await
    }
}

pub fn detection(label: &str, confidence: f32) -> Detection {
    Detection {
        label: label.to_string(),
        confidence,
        bounding_box: BoundingBox::default(),
    }
}

pub struct Harness {
    pub camera: Arc<FakeCamera>,
    pub repo: RecordingRepository,
    pub inventory: Arc<InventoryViewModel<RecordingRepository>>,
    pub pipeline: Arc<CapturePipeline<RecordingRepository>>,
}

impl Harness {
    pub fn new(camera: Arc<FakeCamera>, loader: FakeLoader) -> Self {
        Self::with_adapter(camera, DetectionAdapter::new(loader))
    }

    pub fn with_adapter(camera: Arc<FakeCamera>, adapter: DetectionAdapter) -> Self {
        let repo = RecordingRepository::default();
        let inventory = Arc::new(InventoryViewModel::new(InventoryService::new(repo.clone())));
        let pipeline = Arc::new(CapturePipeline::new(
            camera.clone(),
            adapter,
            LabelResolver::new(),
            inventory.clone(),
        ));

        Self {
            camera,
            repo,
            inventory,
            pipeline,
        }
    }
}

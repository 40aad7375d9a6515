//! In-memory collaborators shared by the core integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use gridplace_contracts::{
    CanvasCapabilities, CanvasHost, CollaboratorError, EventSink,
    KeyValueStore, NodeId, RectangleSpec,
};
use gridplace_core::{
    Collaborators, FetchError, ImageSource, PlacementConfig,
    PlacementPipeline,
};
use gridplace_model::{
    ContentHandle, ImageDimensions, Point, PluginEvent, SourceUrl,
};

pub const HOST: &str = "cdn.example.com";

pub fn url(path: &str) -> String {
    format!("https://{HOST}/{path}")
}

pub fn dims(width: u32, height: u32) -> ImageDimensions {
    ImageDimensions::try_from((width, height)).unwrap()
}

/// Canvas host double that records everything it is asked to do.
pub struct FakeCanvas {
    capabilities: CanvasCapabilities,
    center: Point,
    /// URL -> intrinsic size reported after remote registration.
    remote_sizes: Mutex<HashMap<String, ImageDimensions>>,
    /// URLs whose remote registration is refused.
    remote_failures: Mutex<Vec<String>>,
    reject_bytes: bool,
    fail_commit: bool,
    next_id: AtomicUsize,
    pub registered_bytes: Mutex<Vec<Vec<u8>>>,
    pub remote_registrations: Mutex<Vec<String>>,
    handle_sizes: Mutex<HashMap<String, ImageDimensions>>,
    pub committed: Mutex<Vec<RectangleSpec>>,
    pub selection: Mutex<Vec<NodeId>>,
}

impl FakeCanvas {
    pub fn bytes_only() -> Self {
        Self::with_capabilities(CanvasCapabilities::NONE)
    }

    pub fn with_capabilities(capabilities: CanvasCapabilities) -> Self {
        Self {
            capabilities,
            center: Point::new(0.0, 0.0),
            remote_sizes: Mutex::new(HashMap::new()),
            remote_failures: Mutex::new(Vec::new()),
            reject_bytes: false,
            fail_commit: false,
            next_id: AtomicUsize::new(1),
            registered_bytes: Mutex::new(Vec::new()),
            remote_registrations: Mutex::new(Vec::new()),
            handle_sizes: Mutex::new(HashMap::new()),
            committed: Mutex::new(Vec::new()),
            selection: Mutex::new(Vec::new()),
        }
    }

    pub fn centered_at(mut self, center: Point) -> Self {
        self.center = center;
        self
    }

    pub fn rejecting_bytes(mut self) -> Self {
        self.reject_bytes = true;
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn with_remote_size(self, url: &str, size: ImageDimensions) -> Self {
        self.remote_sizes
            .lock()
            .unwrap()
            .insert(url.to_string(), size);
        self
    }

    pub fn refusing_remote(self, url: &str) -> Self {
        self.remote_failures.lock().unwrap().push(url.to_string());
        self
    }

    fn mint(&self, prefix: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}-{id}")
    }

    pub fn committed_names(&self) -> Vec<String> {
        self.committed
            .lock()
            .unwrap()
            .iter()
            .map(|rect| rect.name.clone())
            .collect()
    }
}

#[async_trait]
impl CanvasHost for FakeCanvas {
    fn capabilities(&self) -> CanvasCapabilities {
        self.capabilities
    }

    async fn register_image_bytes(
        &self,
        bytes: Vec<u8>,
    ) -> Result<ContentHandle, CollaboratorError> {
        if self.reject_bytes {
            return Err(CollaboratorError::Rejected(
                "unsupported image data".into(),
            ));
        }
        self.registered_bytes.lock().unwrap().push(bytes);
        Ok(ContentHandle::new(self.mint("bytes")))
    }

    async fn register_image_remote(
        &self,
        url: &SourceUrl,
    ) -> Result<ContentHandle, CollaboratorError> {
        if !self.capabilities.remote_registration {
            return Err(CollaboratorError::Unsupported("remote registration"));
        }
        self.remote_registrations
            .lock()
            .unwrap()
            .push(url.to_string());
        if self
            .remote_failures
            .lock()
            .unwrap()
            .iter()
            .any(|failing| failing == url.as_str())
        {
            return Err(CollaboratorError::Rejected("remote fetch failed".into()));
        }

        let handle = self.mint("remote");
        if let Some(size) =
            self.remote_sizes.lock().unwrap().get(url.as_str()).copied()
        {
            self.handle_sizes
                .lock()
                .unwrap()
                .insert(handle.clone(), size);
        }
        Ok(ContentHandle::new(handle))
    }

    async fn query_intrinsic_size(
        &self,
        handle: &ContentHandle,
    ) -> Result<ImageDimensions, CollaboratorError> {
        self.handle_sizes
            .lock()
            .unwrap()
            .get(handle.as_str())
            .copied()
            .ok_or_else(|| CollaboratorError::Rejected("size unknown".into()))
    }

    async fn commit_rectangles(
        &self,
        rectangles: Vec<RectangleSpec>,
    ) -> Result<Vec<NodeId>, CollaboratorError> {
        if self.fail_commit {
            return Err(CollaboratorError::Backend("surface is locked".into()));
        }
        let ids = rectangles
            .iter()
            .map(|_| NodeId::new(self.mint("node")))
            .collect();
        self.committed.lock().unwrap().extend(rectangles);
        Ok(ids)
    }

    async fn set_selection(
        &self,
        nodes: &[NodeId],
    ) -> Result<(), CollaboratorError> {
        *self.selection.lock().unwrap() = nodes.to_vec();
        Ok(())
    }

    async fn viewport_center(&self) -> Point {
        self.center
    }
}

#[derive(Debug, Clone)]
pub enum Scripted {
    Bytes(Vec<u8>),
    Status(u16),
}

/// Image source that answers from a fixed script, one entry per URL.
#[derive(Default)]
pub struct ScriptedSource {
    script: HashMap<String, Scripted>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, bytes: &[u8]) -> Self {
        self.script
            .insert(url.to_string(), Scripted::Bytes(bytes.to_vec()));
        self
    }

    pub fn fail(mut self, url: &str, status: u16) -> Self {
        self.script.insert(url.to_string(), Scripted::Status(status));
        self
    }
}

#[async_trait]
impl ImageSource for ScriptedSource {
    async fn fetch(&self, url: &SourceUrl) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.script.get(url.as_str()) {
            Some(Scripted::Bytes(bytes)) => Ok(bytes.clone()),
            Some(Scripted::Status(status)) => Err(FetchError::Status {
                status: *status,
                url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError> {
        Ok(self.value(key))
    }

    async fn set(
        &self,
        key: &str,
        value: String,
    ) -> Result<(), CollaboratorError> {
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PluginEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PluginEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PluginEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn test_config() -> PlacementConfig {
    let mut config = PlacementConfig::default();
    config.allow_list.host_fragment = HOST.to_string();
    config
}

/// Everything a pipeline test needs to inspect after a run.
pub struct Harness {
    pub pipeline: PlacementPipeline,
    pub canvas: Arc<FakeCanvas>,
    pub source: Arc<ScriptedSource>,
    pub store: Arc<InMemoryStore>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(canvas: FakeCanvas, source: ScriptedSource) -> Self {
        Self::with_store(canvas, source, InMemoryStore::new())
    }

    pub fn with_store(
        canvas: FakeCanvas,
        source: ScriptedSource,
        store: InMemoryStore,
    ) -> Self {
        let canvas = Arc::new(canvas);
        let source = Arc::new(source);
        let store = Arc::new(store);
        let sink = Arc::new(RecordingSink::default());

        let pipeline = PlacementPipeline::new(
            &test_config(),
            Collaborators {
                canvas: canvas.clone(),
                source: source.clone(),
                store: store.clone(),
                events: sink.clone(),
            },
        )
        .expect("valid test config");

        Self {
            pipeline,
            canvas,
            source,
            store,
            sink,
        }
    }
}

//! In-process canvas that keeps everything in memory.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use gridplace_contracts::{
    CanvasCapabilities, CanvasHost, CollaboratorError, NodeId, RectangleSpec,
};
use gridplace_model::{ContentHandle, Point};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Canvas host without a renderer.
///
/// Byte payloads are accepted as-is under fresh UUID handles and committed
/// rectangles are only recorded, so a run can be inspected afterwards with
/// [`HeadlessCanvas::scene`]. It cannot fetch URLs itself, so every image
/// goes through the download path.
#[derive(Debug)]
pub struct HeadlessCanvas {
    center: Point,
    payloads: Mutex<HashMap<ContentHandle, usize>>,
    nodes: Mutex<Vec<(NodeId, RectangleSpec)>>,
    selection: Mutex<HashSet<NodeId>>,
}

/// Snapshot of every rectangle committed so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    #[serde(rename = "type")]
    kind: &'static str,
    pub nodes: Vec<SceneNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: u32,
    pub height: u32,
    pub fill: String,
    pub payload_bytes: usize,
    pub selected: bool,
}

impl HeadlessCanvas {
    pub fn new(center: Point) -> Self {
        Self {
            center,
            payloads: Mutex::new(HashMap::new()),
            nodes: Mutex::new(Vec::new()),
            selection: Mutex::new(HashSet::new()),
        }
    }

    pub fn scene(&self) -> Scene {
        let payloads = lock(&self.payloads);
        let selection = lock(&self.selection);
        let nodes = lock(&self.nodes)
            .iter()
            .map(|(id, rect)| SceneNode {
                id: id.to_string(),
                name: rect.name.clone(),
                x: rect.position.x,
                y: rect.position.y,
                width: rect.size.width_u32(),
                height: rect.size.height_u32(),
                fill: rect.fill.as_str().to_string(),
                payload_bytes: payloads.get(&rect.fill).copied().unwrap_or(0),
                selected: selection.contains(id),
            })
            .collect();

        Scene {
            kind: "scene",
            nodes,
        }
    }
}

/// The guarded data stays consistent even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CanvasHost for HeadlessCanvas {
    fn capabilities(&self) -> CanvasCapabilities {
        CanvasCapabilities::NONE
    }

    async fn register_image_bytes(
        &self,
        bytes: Vec<u8>,
    ) -> Result<ContentHandle, CollaboratorError> {
        if bytes.is_empty() {
            return Err(CollaboratorError::Rejected("empty image data".into()));
        }
        let handle = ContentHandle::new(Uuid::new_v4().to_string());
        debug!(
            "[headless] Registered {} bytes as {}",
            bytes.len(),
            handle.as_str()
        );
        lock(&self.payloads).insert(handle.clone(), bytes.len());
        Ok(handle)
    }

    async fn commit_rectangles(
        &self,
        rectangles: Vec<RectangleSpec>,
    ) -> Result<Vec<NodeId>, CollaboratorError> {
        {
            let payloads = lock(&self.payloads);
            if let Some(unknown) = rectangles
                .iter()
                .find(|rect| !payloads.contains_key(&rect.fill))
            {
                return Err(CollaboratorError::Rejected(format!(
                    "unknown content handle {}",
                    unknown.fill.as_str()
                )));
            }
        }

        let mut nodes = lock(&self.nodes);
        let ids: Vec<_> = rectangles
            .into_iter()
            .map(|rect| {
                let id = NodeId::new(Uuid::new_v4().to_string());
                nodes.push((id.clone(), rect));
                id
            })
            .collect();
        Ok(ids)
    }

    async fn set_selection(
        &self,
        nodes: &[NodeId],
    ) -> Result<(), CollaboratorError> {
        let mut selection = lock(&self.selection);
        selection.clear();
        selection.extend(nodes.iter().cloned());
        Ok(())
    }

    async fn viewport_center(&self) -> Point {
        self.center
    }
}

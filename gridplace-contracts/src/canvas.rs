//! Rendering surface contract.

use std::fmt;

use async_trait::async_trait;
use gridplace_model::{ContentHandle, ImageDimensions, Point, SourceUrl};

use crate::CollaboratorError;

/// Optional features a canvas host may offer on top of the required ones.
///
/// Callers branch on these flags instead of probing for methods; the default
/// trait methods for an unsupported capability return
/// [`CollaboratorError::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasCapabilities {
    /// The host can register an image straight from its remote URL.
    pub remote_registration: bool,
    /// The host can report the intrinsic size of a registered image.
    pub intrinsic_size: bool,
}

impl CanvasCapabilities {
    /// Only the required byte-registration path.
    pub const NONE: Self = Self {
        remote_registration: false,
        intrinsic_size: false,
    };

    /// Remote registration and size queries.
    pub const ALL: Self = Self {
        remote_registration: true,
        intrinsic_size: true,
    };
}

/// Id of a node created on the canvas surface.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an id minted by the host.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The host's raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.0).finish()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image-filled rectangle to create on the current surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangleSpec {
    /// Layer name shown in the host's UI.
    pub name: String,
    /// Top-left corner.
    pub position: Point,
    /// Width and height in canvas units.
    pub size: ImageDimensions,
    /// Registered image the rectangle is filled with.
    pub fill: ContentHandle,
}

/// Rendering surface the placed images end up on.
#[async_trait]
pub trait CanvasHost: Send + Sync {
    /// Optional paths this host supports. Must not change between calls.
    fn capabilities(&self) -> CanvasCapabilities;

    /// Register raw encoded image bytes.
    async fn register_image_bytes(
        &self,
        bytes: Vec<u8>,
    ) -> Result<ContentHandle, CollaboratorError>;

    /// Register an image by URL, letting the host fetch it.
    async fn register_image_remote(
        &self,
        _url: &SourceUrl,
    ) -> Result<ContentHandle, CollaboratorError> {
        Err(CollaboratorError::Unsupported("remote registration"))
    }

    /// Report the intrinsic size of a previously registered image.
    async fn query_intrinsic_size(
        &self,
        _handle: &ContentHandle,
    ) -> Result<ImageDimensions, CollaboratorError> {
        Err(CollaboratorError::Unsupported("intrinsic size"))
    }

    /// Create every rectangle, append them to the current surface and
    /// return their node ids in the same order. All or nothing.
    async fn commit_rectangles(
        &self,
        rectangles: Vec<RectangleSpec>,
    ) -> Result<Vec<NodeId>, CollaboratorError>;

    /// Replace the current selection with `nodes`.
    async fn set_selection(
        &self,
        nodes: &[NodeId],
    ) -> Result<(), CollaboratorError>;

    /// Center of the user's current viewport; the grid is centered here.
    async fn viewport_center(&self) -> Point;
}

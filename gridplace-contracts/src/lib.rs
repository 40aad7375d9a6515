//! Trait surfaces for the collaborators the placement pipeline talks to.
//!
//! The pipeline never touches a rendering surface, a storage backend or a
//! UI transport directly; it goes through these narrow contracts so hosts
//! can plug in whatever they have.

pub mod canvas;
pub mod error;
pub mod events;
pub mod storage;

pub use canvas::{CanvasCapabilities, CanvasHost, NodeId, RectangleSpec};
pub use error::CollaboratorError;
pub use events::EventSink;
pub use storage::KeyValueStore;

/// Frequently used contracts for pipeline and host crates.
pub mod prelude {
    pub use super::canvas::{CanvasCapabilities, CanvasHost};
    pub use super::error::CollaboratorError;
    pub use super::events::EventSink;
    pub use super::storage::KeyValueStore;
}

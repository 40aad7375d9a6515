//! Core data model definitions shared across gridplace crates.
#![allow(missing_docs)]

pub mod content;
pub mod dimensions;
pub mod messages;
pub mod placement;
pub mod sizing;
pub mod source_url;

pub use content::{ContentHandle, RawImageResult};
pub use dimensions::{ImageDimensions, ImageDimensionsError};
pub use messages::{
    InboundMessage, PlaceImagesRequest, PluginEvent, ProgressEvent,
};
pub use placement::{GridCell, Layout, PlacementEntry, Point};
pub use sizing::{SizeMode, SizeSource};
pub use source_url::{SourceUrl, UrlAllowList};

use std::fmt;

use crate::ImageDimensions;

/// Opaque id the canvas host hands back for a registered image.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHandle").field(&self.0).finish()
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of registering one image with the canvas host.
///
/// `intrinsic` is only populated when the host could report the image's own
/// metadata; byte registrations never carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageResult {
    pub content_handle: ContentHandle,
    pub intrinsic: Option<ImageDimensions>,
}

impl RawImageResult {
    pub fn without_dimensions(content_handle: ContentHandle) -> Self {
        Self {
            content_handle,
            intrinsic: None,
        }
    }
}

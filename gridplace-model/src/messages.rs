//! Messages exchanged with the presentation layer.
//!
//! The JSON shapes are fixed by the UI side: every message is tagged by
//! `type`, progress messages are additionally tagged by `stage`.

use std::num::NonZeroU32;

/// Inbound messages accepted from the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum InboundMessage {
    #[cfg_attr(feature = "serde", serde(rename = "place-images"))]
    PlaceImages(PlaceImagesRequest),
}

/// Request to fetch, size and lay out a batch of remote images.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PlaceImagesRequest {
    #[cfg_attr(feature = "serde", serde(default))]
    pub urls: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default = "default_use_original"))]
    pub use_original_size: bool,
    /// Cap applied when `use_original_size` is false; the configured
    /// default is used when absent.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub max_size: Option<NonZeroU32>,
}

#[cfg(feature = "serde")]
fn default_use_original() -> bool {
    true
}

impl PlaceImagesRequest {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            use_original_size: true,
            max_size: None,
        }
    }

    pub fn scaled(mut self, max_size: Option<NonZeroU32>) -> Self {
        self.use_original_size = false;
        self.max_size = max_size;
        self
    }
}

/// Outbound events reported back to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "kebab-case")
)]
pub enum PluginEvent {
    /// Terminal failure: invalid input, or nothing could be placed.
    Error { message: String },
    Progress(ProgressEvent),
    /// Final success count.
    Placed { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "stage", rename_all = "camelCase"))]
pub enum ProgressEvent {
    /// The run accepted `total` URLs.
    Received { total: usize },
    /// Emitted before and after each URL.
    Download {
        done: usize,
        total: usize,
        #[cfg_attr(
            feature = "serde",
            serde(
                rename = "currentFile",
                default,
                skip_serializing_if = "Option::is_none"
            )
        )]
        current_file: Option<String>,
    },
    /// A single URL failed; the run continues.
    Error { url: String, error: String },
}

impl PluginEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn received(total: usize) -> Self {
        Self::Progress(ProgressEvent::Received { total })
    }

    pub fn download(
        done: usize,
        total: usize,
        current_file: Option<String>,
    ) -> Self {
        Self::Progress(ProgressEvent::Download {
            done,
            total,
            current_file,
        })
    }

    pub fn url_failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Progress(ProgressEvent::Error {
            url: url.into(),
            error: error.into(),
        })
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, Self::Progress(_))
    }
}

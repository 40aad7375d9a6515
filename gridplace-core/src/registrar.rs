use std::{any::type_name_of_val, fmt, sync::Arc};

use gridplace_contracts::CanvasHost;
use gridplace_model::{RawImageResult, SourceUrl};
use tracing::{debug, warn};

use crate::{
    error::{PlacementError, Result},
    fetch::ImageSource,
};

/// Turns a URL into a canvas content handle.
///
/// Prefers the host's own remote registration, which can also report
/// intrinsic dimensions; falls back to downloading the bytes and
/// registering those.
#[derive(Clone)]
pub struct ImageRegistrar {
    canvas: Arc<dyn CanvasHost>,
    source: Arc<dyn ImageSource>,
}

impl fmt::Debug for ImageRegistrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRegistrar")
            .field("canvas", &type_name_of_val(self.canvas.as_ref()))
            .field("source", &type_name_of_val(self.source.as_ref()))
            .field("capabilities", &self.canvas.capabilities())
            .finish()
    }
}

impl ImageRegistrar {
    pub fn new(
        canvas: Arc<dyn CanvasHost>,
        source: Arc<dyn ImageSource>,
    ) -> Self {
        Self { canvas, source }
    }

    /// Register through the host's remote path, if it has one.
    ///
    /// `None` means the path is unsupported or failed and the caller should
    /// fall back to [`Self::register_from_bytes`]. A failed size query only
    /// leaves the dimensions empty.
    pub async fn register_from_handle(
        &self,
        url: &SourceUrl,
    ) -> Option<RawImageResult> {
        let capabilities = self.canvas.capabilities();
        if !capabilities.remote_registration {
            return None;
        }

        let content_handle = match self.canvas.register_image_remote(url).await
        {
            Ok(handle) => handle,
            Err(err) => {
                warn!(
                    "[registrar] Remote registration failed for {}, falling back to download: {}",
                    url, err
                );
                return None;
            }
        };

        let intrinsic = if capabilities.intrinsic_size {
            match self.canvas.query_intrinsic_size(&content_handle).await {
                Ok(size) => Some(size),
                Err(err) => {
                    debug!(
                        "[registrar] Intrinsic size unavailable for {}: {}",
                        url, err
                    );
                    None
                }
            }
        } else {
            None
        };

        Some(RawImageResult {
            content_handle,
            intrinsic,
        })
    }

    /// Download the image and register its bytes. Never yields dimensions.
    pub async fn register_from_bytes(
        &self,
        url: &SourceUrl,
    ) -> Result<RawImageResult> {
        let bytes = self.source.fetch(url).await?;
        if bytes.is_empty() {
            return Err(PlacementError::EmptyPayload {
                url: url.to_string(),
            });
        }

        let content_handle = self
            .canvas
            .register_image_bytes(bytes)
            .await
            .map_err(PlacementError::Registration)?;

        Ok(RawImageResult::without_dimensions(content_handle))
    }

    /// Remote path first, byte path second.
    pub async fn register(&self, url: &SourceUrl) -> Result<RawImageResult> {
        if let Some(result) = self.register_from_handle(url).await {
            return Ok(result);
        }
        self.register_from_bytes(url).await
    }
}

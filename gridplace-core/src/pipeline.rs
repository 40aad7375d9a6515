//! End-to-end placement run: validate, register and size each URL in
//! order, pack the survivors and commit them to the canvas in one batch.

use std::{
    any::type_name_of_val, fmt, num::NonZeroU32, sync::Arc, time::Duration,
};

use gridplace_contracts::{
    CanvasHost, EventSink, KeyValueStore, NodeId, RectangleSpec,
};
use gridplace_model::{
    InboundMessage, Layout, PlaceImagesRequest, PlacementEntry, PluginEvent,
    Point, SizeMode, SourceUrl, UrlAllowList,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    config::PlacementConfig,
    error::{PlacementError, Result},
    fetch::ImageSource,
    packer::GridPacker,
    registrar::ImageRegistrar,
    resolver::DimensionResolver,
    size_cache::SizeCache,
};

/// Host-provided services a pipeline runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub canvas: Arc<dyn CanvasHost>,
    pub source: Arc<dyn ImageSource>,
    pub store: Arc<dyn KeyValueStore>,
    pub events: Arc<dyn EventSink>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("canvas", &type_name_of_val(self.canvas.as_ref()))
            .field("source", &type_name_of_val(self.source.as_ref()))
            .field("store", &type_name_of_val(self.store.as_ref()))
            .field("events", &type_name_of_val(self.events.as_ref()))
            .finish()
    }
}

/// A URL that could not be placed, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFailure {
    pub url: String,
    pub error: String,
}

/// An entry as it was committed to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub node_id: NodeId,
    pub entry: PlacementEntry,
    /// Top-left corner on the canvas.
    pub position: Point,
}

/// How a run that got past input validation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    /// At least one image was placed. Failures, if any, were skipped.
    Committed {
        placed: Vec<PlacedNode>,
        failures: Vec<UrlFailure>,
        layout: Layout,
    },
    /// Every URL failed; nothing was committed.
    Empty { failures: Vec<UrlFailure> },
}

impl PlacementOutcome {
    pub fn placed_count(&self) -> usize {
        match self {
            Self::Committed { placed, .. } => placed.len(),
            Self::Empty { .. } => 0,
        }
    }

    pub fn failures(&self) -> &[UrlFailure] {
        match self {
            Self::Committed { failures, .. } | Self::Empty { failures } => {
                failures
            }
        }
    }
}

/// Drives one placement run at a time.
///
/// URLs are processed strictly one after another with a fixed pause in
/// between, so the canvas host and the image CDN never see more than one
/// registration in flight. Overlapping calls to [`Self::run`] queue up
/// behind each other.
pub struct PlacementPipeline {
    allow_list: UrlAllowList,
    canvas: Arc<dyn CanvasHost>,
    events: Arc<dyn EventSink>,
    registrar: ImageRegistrar,
    cache: SizeCache,
    resolver: DimensionResolver,
    packer: GridPacker,
    pacing: Duration,
    default_max_size: NonZeroU32,
    run_lock: Mutex<()>,
}

impl fmt::Debug for PlacementPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacementPipeline")
            .field("allow_list", &self.allow_list)
            .field("registrar", &self.registrar)
            .field("cache", &self.cache)
            .field("resolver", &self.resolver)
            .field("packer", &self.packer)
            .field("pacing", &self.pacing)
            .field("default_max_size", &self.default_max_size)
            .finish()
    }
}

impl PlacementPipeline {
    /// Build a pipeline. Must be called inside a Tokio runtime: the size
    /// cache spawns its writer task here.
    pub fn new(
        config: &PlacementConfig,
        collaborators: Collaborators,
    ) -> Result<Self> {
        config.validate()?;

        let Collaborators {
            canvas,
            source,
            store,
            events,
        } = collaborators;

        Ok(Self {
            allow_list: config.allow_list(),
            registrar: ImageRegistrar::new(Arc::clone(&canvas), source),
            cache: SizeCache::spawn(
                store,
                config.cache_key_prefix.clone(),
                config.cache_queue_capacity,
            ),
            resolver: DimensionResolver::new(config.fallback_dimensions()?),
            packer: GridPacker::new(config.layout.padding),
            pacing: config.pacing(),
            default_max_size: config.default_max_size()?,
            canvas,
            events,
            run_lock: Mutex::new(()),
        })
    }

    pub fn size_cache(&self) -> &SizeCache {
        &self.cache
    }

    pub async fn handle_message(
        &self,
        message: InboundMessage,
    ) -> Option<PlacementOutcome> {
        match message {
            InboundMessage::PlaceImages(request) => {
                self.handle_request(request).await
            }
        }
    }

    /// Outermost boundary: any error that escapes [`Self::run`] becomes a
    /// single `error` event.
    pub async fn handle_request(
        &self,
        request: PlaceImagesRequest,
    ) -> Option<PlacementOutcome> {
        match self.run(request).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!("[pipeline] Placement run failed: {}", err);
                self.events.emit(PluginEvent::error(err.to_string()));
                None
            }
        }
    }

    pub async fn run(
        &self,
        request: PlaceImagesRequest,
    ) -> Result<PlacementOutcome> {
        let _running = self.run_lock.lock().await;

        let urls = self.accept_urls(&request.urls)?;
        let mode = self.size_mode(&request);
        let total = urls.len();

        info!(
            "[pipeline] Received {} URLs ({} accepted), mode={:?}",
            request.urls.len(),
            total,
            mode
        );
        self.events.emit(PluginEvent::received(total));

        let mut entries = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (index, url) in urls.iter().enumerate() {
            let name = url.display_name();
            self.events
                .emit(PluginEvent::download(index, total, Some(name.clone())));

            match self.place_one(url, name.clone(), mode).await {
                Ok(entry) => {
                    debug!(
                        "[pipeline] {} sized {} from {}",
                        url,
                        entry.final_size,
                        entry.size_source.as_str()
                    );
                    entries.push(entry);
                }
                Err(err) => {
                    warn!("[pipeline] Skipping {}: {}", url, err);
                    self.events.emit(PluginEvent::url_failed(
                        url.as_str(),
                        err.to_string(),
                    ));
                    failures.push(UrlFailure {
                        url: url.to_string(),
                        error: err.to_string(),
                    });
                }
            }

            self.events
                .emit(PluginEvent::download(index + 1, total, Some(name)));

            if index + 1 < total {
                tokio::time::sleep(self.pacing).await;
            }
        }

        if entries.is_empty() {
            warn!("[pipeline] None of the {} images could be placed", total);
            self.events.emit(PluginEvent::error(format!(
                "None of the {total} images could be placed"
            )));
            return Ok(PlacementOutcome::Empty { failures });
        }

        let (placed, layout) = self.commit(entries).await?;
        info!(
            "[pipeline] Placed {} images ({} failed) in a {}x{} grid",
            placed.len(),
            failures.len(),
            layout.columns(),
            layout.rows()
        );
        self.events.emit(PluginEvent::Placed {
            count: placed.len(),
        });

        Ok(PlacementOutcome::Committed {
            placed,
            failures,
            layout,
        })
    }

    fn accept_urls(&self, candidates: &[String]) -> Result<Vec<SourceUrl>> {
        if candidates.is_empty() {
            return Err(PlacementError::InvalidInput(
                "no image URLs were provided".into(),
            ));
        }

        let accepted: Vec<_> = candidates
            .iter()
            .filter_map(|candidate| {
                let accepted = self.allow_list.accept(candidate);
                if accepted.is_none() {
                    warn!(
                        "[pipeline] Rejecting URL outside allow-list: {}",
                        candidate
                    );
                }
                accepted
            })
            .collect();

        if accepted.is_empty() {
            return Err(PlacementError::InvalidInput(format!(
                "none of the {} URLs are allowed image sources",
                candidates.len()
            )));
        }
        Ok(accepted)
    }

    fn size_mode(&self, request: &PlaceImagesRequest) -> SizeMode {
        if request.use_original_size {
            SizeMode::Original
        } else {
            SizeMode::Scaled {
                max_size: request.max_size.unwrap_or(self.default_max_size),
            }
        }
    }

    async fn place_one(
        &self,
        url: &SourceUrl,
        display_name: String,
        mode: SizeMode,
    ) -> Result<PlacementEntry> {
        let raw = self.registrar.register(url).await?;

        let cached = match raw.intrinsic {
            Some(_) => None,
            None => self.cache.get(url).await,
        };
        let resolved = self.resolver.resolve(raw.intrinsic, cached, mode);
        if resolved.should_persist() {
            self.cache.remember(url, resolved.original_size);
        }

        Ok(PlacementEntry {
            content_handle: raw.content_handle,
            source_url: url.clone(),
            display_name,
            final_size: resolved.final_size,
            original_size: resolved.original_size,
            size_source: resolved.source,
        })
    }

    async fn commit(
        &self,
        entries: Vec<PlacementEntry>,
    ) -> Result<(Vec<PlacedNode>, Layout)> {
        let center = self.canvas.viewport_center().await;
        let sizes: Vec<_> =
            entries.iter().map(|entry| entry.final_size).collect();
        let packed = self.packer.pack(&sizes, center);

        let rectangles = entries
            .iter()
            .zip(&packed.positions)
            .map(|(entry, &position)| RectangleSpec {
                name: entry.display_name.clone(),
                position,
                size: entry.final_size,
                fill: entry.content_handle.clone(),
            })
            .collect();

        let node_ids = self
            .canvas
            .commit_rectangles(rectangles)
            .await
            .map_err(PlacementError::Commit)?;

        if let Err(err) = self.canvas.set_selection(&node_ids).await {
            warn!("[pipeline] Failed to select placed nodes: {}", err);
        }

        let placed = node_ids
            .into_iter()
            .zip(entries)
            .zip(packed.positions)
            .map(|((node_id, entry), position)| PlacedNode {
                node_id,
                entry,
                position,
            })
            .collect();

        Ok((placed, packed.layout))
    }
}

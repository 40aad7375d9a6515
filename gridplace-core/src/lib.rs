//! Fetch remote images, settle their display sizes and lay them out on a
//! canvas host in a non-overlapping grid.
//!
//! The flow for one run is:
//!
//! 1. [`pipeline::PlacementPipeline`] filters the request's URLs through
//!    the allow-list.
//! 2. Each URL is registered by [`registrar::ImageRegistrar`], either
//!    through the host's remote path or by downloading it with an
//!    [`fetch::ImageSource`].
//! 3. [`resolver::DimensionResolver`] picks the final size from intrinsic
//!    metadata, the [`size_cache::SizeCache`] or a fallback.
//! 4. [`packer::GridPacker`] arranges the survivors and the pipeline
//!    commits them to the host in one batch.
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod packer;
pub mod pipeline;
pub mod registrar;
pub mod resolver;
pub mod size_cache;

pub use config::PlacementConfig;
pub use error::{FetchError, PlacementError, Result};
pub use fetch::{HttpImageFetcher, ImageSource, RetryPolicy};
pub use packer::{GridPacker, PackedGrid};
pub use pipeline::{
    Collaborators, PlacedNode, PlacementOutcome, PlacementPipeline,
    UrlFailure,
};
pub use registrar::ImageRegistrar;
pub use resolver::{DimensionResolver, ResolvedSize, scale_to_max};
pub use size_cache::SizeCache;

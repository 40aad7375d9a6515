//! Retrieving raw image bytes for a URL.

use async_trait::async_trait;
use gridplace_model::SourceUrl;

use crate::error::FetchError;

pub mod http;
pub mod retry;

pub use http::HttpImageFetcher;
pub use retry::RetryPolicy;

/// Anything that can produce the encoded bytes behind an image URL.
///
/// Implementations own their retry behaviour; a returned error is final.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &SourceUrl) -> Result<Vec<u8>, FetchError>;
}

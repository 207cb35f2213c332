//! Artwork image loading.
//!
//! [`UrlLoader`] resolves plain paths, `file://` URLs, base64 `data:` URIs
//! and, with the `http` feature, `http(s)://` URLs. [`MemoryLoader`] serves
//! pre-decoded images by key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use drape_export::decode_data_uri;
use drape_pipeline::{RgbaImage, decode_image};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::StudioError;

/// Source of decoded artwork.
pub trait ImageLoader: Send + Sync {
    /// Load and decode the image at `url`.
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RgbaImage, StudioError>>;
}

const URL_LOG_LIMIT: usize = 64;

/// `url` shortened for log fields; data URIs are long.
pub(crate) fn loggable(url: &str) -> &str {
    url.char_indices()
        .nth(URL_LOG_LIMIT)
        .map_or(url, |(end, _)| &url[..end])
}

/// Loads artwork from the filesystem, `data:` URIs and (feature `http`)
/// the network.
#[derive(Debug, Clone, Default)]
pub struct UrlLoader {
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl UrlLoader {
    /// A loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StudioError> {
        if url.starts_with("data:") {
            let (_, bytes) = decode_data_uri(url)?;
            return Ok(bytes);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_remote(url).await;
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        if path.contains("://") {
            return Err(StudioError::UnsupportedSource(url.to_string()));
        }
        tokio::fs::read(path)
            .await
            .map_err(|source| StudioError::Io {
                path: path.to_string(),
                source,
            })
    }

    #[cfg(feature = "http")]
    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, StudioError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    #[cfg(not(feature = "http"))]
    #[allow(clippy::unused_async, clippy::unused_self)]
    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, StudioError> {
        Err(StudioError::UnsupportedSource(url.to_string()))
    }
}

impl ImageLoader for UrlLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RgbaImage, StudioError>> {
        async move {
            let bytes = self.fetch(url).await?;
            let image = decode_image(&bytes)?;
            debug!(
                url = loggable(url),
                width = image.width(),
                height = image.height(),
                "decoded artwork"
            );
            Ok(image)
        }
        .boxed()
    }
}

/// Serves images registered under arbitrary keys.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    images: Mutex<HashMap<String, Arc<RgbaImage>>>,
}

impl MemoryLoader {
    /// An empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` under `url`, replacing any previous entry.
    pub fn insert(&self, url: impl Into<String>, image: RgbaImage) {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), Arc::new(image));
    }

    fn get(&self, url: &str) -> Option<Arc<RgbaImage>> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }
}

impl ImageLoader for MemoryLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RgbaImage, StudioError>> {
        let result = self
            .get(url)
            .map(|image| (*image).clone())
            .ok_or_else(|| StudioError::Io {
                path: url.to_string(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        futures_util::future::ready(result).boxed()
    }
}

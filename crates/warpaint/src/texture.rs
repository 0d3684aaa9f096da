//! Texture handles, async providers, and the shared fetch cache.
//!
//! Textures are opaque: the crate moves handles between the provider and the
//! engine without ever reading pixels. [TextureCache] deduplicates concurrent
//! fetches per path and forgets failed fetches so a later combine can retry.
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// Opaque texture handle. Contents live engine-side.
pub trait Texture: Debug + Send + Sync {}

pub type TextureRef = Arc<dyn Texture>;

/// Asynchronous texture source, implemented by the host.
#[async_trait]
pub trait TextureProvider: Send + Sync {
    /// Resolves a texture by path. `default` is what an absent path should
    /// resolve to when the caller has a stand-in; `None` means absence is
    /// reported as `None`.
    async fn texture(&self, path: &str, default: Option<TextureRef>) -> Option<TextureRef>;
}

type Entry = Arc<OnceCell<Option<TextureRef>>>;

/// Shared, cloneable fetch cache in front of a [TextureProvider].
///
/// Concurrent requests for the same path share one in-flight fetch; whichever
/// call created the entry supplies the default for it. A fetch that resolves
/// empty drops its entry, so the path stays retryable.
#[derive(Clone)]
pub struct TextureCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    provider: Arc<dyn TextureProvider>,
    specular_fallback: Option<TextureRef>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl TextureCache {
    pub fn new(provider: Arc<dyn TextureProvider>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                provider,
                specular_fallback: None,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Sets the stand-in texture for specular lookups, typically flat black.
    pub fn with_specular_fallback(self, texture: TextureRef) -> Self {
        let inner = CacheInner {
            provider: Arc::clone(&self.inner.provider),
            specular_fallback: Some(texture),
            entries: Mutex::new(HashMap::new()),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Fetches a texture by path.
    pub async fn texture(&self, path: &str) -> Option<TextureRef> {
        self.fetch(path, None).await
    }

    /// Fetches a specular texture by path, resolving to the configured
    /// fallback when the path is absent.
    pub async fn specular_texture(&self, path: &str) -> Option<TextureRef> {
        self.fetch(path, self.inner.specular_fallback.clone()).await
    }

    async fn fetch(&self, path: &str, default: Option<TextureRef>) -> Option<TextureRef> {
        let cell = {
            let mut entries = self.inner.entries.lock().await;
            entries
                .entry(path.to_owned())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        let provider = Arc::clone(&self.inner.provider);
        let result = cell
            .get_or_init(|| async move { provider.texture(path, default).await })
            .await
            .clone();
        if result.is_none() {
            debug!("Texture fetch for '{}' resolved empty; entry dropped.", path);
            let mut entries = self.inner.entries.lock().await;
            // A retry may have installed a fresh cell already; only drop ours.
            if let Some(existing) = entries.get(path) {
                if Arc::ptr_eq(existing, &cell) {
                    entries.remove(path);
                }
            }
        }
        result
    }
}

//! Thumbnail bookkeeping.
//!
//! Rendering is delegated to a [`ThumbnailRenderer`]; this module only makes
//! sure each `(file, page, rotation)` is rendered once, that concurrent
//! requests for the same key share one render, and that rotating a page
//! forgets its stale previews.

use futures::channel::oneshot;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::error::{Result, StudioError};
use crate::model::Rotation;
use crate::services::ThumbnailRenderer;

/// Identity of one rendered preview.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    /// Source file.
    pub path: PathBuf,
    /// 0-based page index in the source file.
    pub source_page_index: usize,
    /// Rotation the preview is drawn with.
    pub rotation: Rotation,
}

impl ThumbnailKey {
    /// Create a key.
    pub fn new(path: impl Into<PathBuf>, source_page_index: usize, rotation: Rotation) -> Self {
        Self {
            path: path.into(),
            source_page_index,
            rotation,
        }
    }

    fn same_page(&self, path: &Path, source_page_index: usize) -> bool {
        self.path == path && self.source_page_index == source_page_index
    }
}

/// Opaque reference to a rendered image (a URL, a cache file name, ...).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailHandle(Arc<str>);

impl ThumbnailHandle {
    /// Wrap a renderer-specific reference.
    pub fn new(reference: impl Into<Arc<str>>) -> Self {
        Self(reference.into())
    }

    /// Renderer-specific reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ThumbnailHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ThumbnailHandle").field(&self.as_str()).finish()
    }
}

enum Slot {
    Ready(ThumbnailHandle),
    InFlight {
        ticket: u64,
        waiters: Vec<oneshot::Sender<ThumbnailHandle>>,
    },
}

/// Render-once cache with request coalescing.
#[derive(Default)]
pub struct ThumbnailCache {
    slots: Mutex<HashMap<ThumbnailKey, Slot>>,
    next_ticket: AtomicU64,
}

enum Claim {
    Ready(ThumbnailHandle),
    Wait(oneshot::Receiver<ThumbnailHandle>),
    Render(u64),
}

/// Owns the in-flight slot of one render. Dropping it before
/// [`finish`](RenderGuard::finish) (the caller was cancelled) frees the slot
/// and fails the waiters, so the next request renders again.
struct RenderGuard<'a> {
    cache: &'a ThumbnailCache,
    key: &'a ThumbnailKey,
    ticket: u64,
    finished: bool,
}

impl RenderGuard<'_> {
    fn finish(mut self, handle: Option<&ThumbnailHandle>) {
        self.finished = true;
        self.cache.finish(self.key, self.ticket, handle);
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                path = %self.key.path.display(),
                index = self.key.source_page_index,
                "thumbnail render abandoned"
            );
            self.cache.finish(self.key, self.ticket, None);
        }
    }
}

impl ThumbnailCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached preview for `key`, rendering it if needed.
    ///
    /// If a render for `key` is already running, this waits for it instead of
    /// starting another one.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's error to the caller that started the render.
    /// Callers that were waiting get [`StudioError::RenderFailed`], also when
    /// the caller that started the render is dropped before it completes.
    pub async fn get_or_render<R: ThumbnailRenderer>(
        &self,
        renderer: &R,
        key: ThumbnailKey,
    ) -> Result<ThumbnailHandle> {
        match self.claim(&key) {
            Claim::Ready(handle) => Ok(handle),
            Claim::Wait(rx) => rx.await.map_err(|_| render_failed(&key, "render abandoned")),
            Claim::Render(ticket) => {
                let guard = RenderGuard {
                    cache: self,
                    key: &key,
                    ticket,
                    finished: false,
                };
                let result = renderer.render(&key).await;
                guard.finish(result.as_ref().ok());
                result
            }
        }
    }

    /// Cached preview for `key`, if rendered.
    pub fn get(&self, key: &ThumbnailKey) -> Option<ThumbnailHandle> {
        match self.lock().get(key) {
            Some(Slot::Ready(handle)) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Whether a render for `key` is running.
    pub fn is_in_flight(&self, key: &ThumbnailKey) -> bool {
        matches!(self.lock().get(key), Some(Slot::InFlight { .. }))
    }

    /// Forget every preview of one page, whatever its rotation.
    ///
    /// A render still running for that page is detached: its result reaches
    /// the caller that started it but is not cached.
    pub fn invalidate(&self, path: &Path, source_page_index: usize) {
        let mut slots = self.lock();
        let before = slots.len();
        slots.retain(|key, _| !key.same_page(path, source_page_index));
        if slots.len() != before {
            debug!(path = %path.display(), source_page_index, "thumbnail invalidated");
        }
    }

    /// Forget every preview of a file.
    pub fn invalidate_file(&self, path: &Path) {
        self.lock().retain(|key, _| key.path != path);
    }

    /// Number of cached or running entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn claim(&self, key: &ThumbnailKey) -> Claim {
        let mut slots = self.lock();
        match slots.get_mut(key) {
            Some(Slot::Ready(handle)) => Claim::Ready(handle.clone()),
            Some(Slot::InFlight { waiters, .. }) => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Claim::Wait(rx)
            }
            None => {
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                slots.insert(
                    key.clone(),
                    Slot::InFlight {
                        ticket,
                        waiters: Vec::new(),
                    },
                );
                Claim::Render(ticket)
            }
        }
    }

    fn finish(&self, key: &ThumbnailKey, ticket: u64, handle: Option<&ThumbnailHandle>) {
        let mut slots = self.lock();
        match slots.get(key) {
            Some(Slot::InFlight { ticket: current, .. }) if *current == ticket => {}
            // Invalidated while rendering, possibly with a newer render running.
            _ => return,
        }
        let Some(Slot::InFlight { waiters, .. }) = slots.remove(key) else {
            return;
        };
        // Without a handle the senders are dropped, which wakes the waiters
        // with an error.
        let Some(handle) = handle else {
            return;
        };
        slots.insert(key.clone(), Slot::Ready(handle.clone()));
        drop(slots);

        for waiter in waiters {
            let _ = waiter.send(handle.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ThumbnailKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("entries", &self.len())
            .finish()
    }
}

fn render_failed(key: &ThumbnailKey, reason: &str) -> StudioError {
    StudioError::RenderFailed {
        path: key.path.clone(),
        index: key.source_page_index,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ThumbnailRenderer for CountingRenderer {
        async fn render(&self, key: &ThumbnailKey) -> Result<ThumbnailHandle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail {
                return Err(render_failed(key, "boom"));
            }
            Ok(ThumbnailHandle::new(format!(
                "{}#{}@{}",
                key.path.display(),
                key.source_page_index,
                key.rotation.as_degrees()
            )))
        }
    }

    /// Never finishes its first render.
    #[derive(Default)]
    struct StallingRenderer {
        calls: AtomicUsize,
    }

    impl ThumbnailRenderer for StallingRenderer {
        async fn render(&self, key: &ThumbnailKey) -> Result<ThumbnailHandle> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok(ThumbnailHandle::new(key.path.display().to_string()))
        }
    }

    fn key(rotation: Rotation) -> ThumbnailKey {
        ThumbnailKey::new("a.pdf", 0, rotation)
    }

    #[tokio::test]
    async fn test_renders_once_and_caches() {
        let cache = ThumbnailCache::new();
        let renderer = CountingRenderer::default();

        let first = cache.get_or_render(&renderer, key(Rotation::Deg0)).await.unwrap();
        let second = cache.get_or_render(&renderer, key(Rotation::Deg0)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_str(), "a.pdf#0@0");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_coalesced() {
        let cache = ThumbnailCache::new();
        let renderer = CountingRenderer::default();

        let (a, b, c) = tokio::join!(
            cache.get_or_render(&renderer, key(Rotation::Deg0)),
            cache.get_or_render(&renderer, key(Rotation::Deg0)),
            cache.get_or_render(&renderer, key(Rotation::Deg0)),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert!(c.is_ok());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rotation_is_part_of_the_key() {
        let cache = ThumbnailCache::new();
        let renderer = CountingRenderer::default();

        cache.get_or_render(&renderer, key(Rotation::Deg0)).await.unwrap();
        let rotated = cache.get_or_render(&renderer, key(Rotation::Deg90)).await.unwrap();

        assert_eq!(rotated.as_str(), "a.pdf#0@90");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forgets_all_rotations() {
        let cache = ThumbnailCache::new();
        let renderer = CountingRenderer::default();
        cache.get_or_render(&renderer, key(Rotation::Deg0)).await.unwrap();
        cache.get_or_render(&renderer, key(Rotation::Deg90)).await.unwrap();
        cache
            .get_or_render(&renderer, ThumbnailKey::new("a.pdf", 1, Rotation::Deg0))
            .await
            .unwrap();

        cache.invalidate(Path::new("a.pdf"), 0);

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(Rotation::Deg0)).is_none());
    }

    #[tokio::test]
    async fn test_failed_render_is_not_cached() {
        let cache = ThumbnailCache::new();
        let renderer = CountingRenderer {
            fail: true,
            ..Default::default()
        };

        let (a, b) = tokio::join!(
            cache.get_or_render(&renderer, key(Rotation::Deg0)),
            cache.get_or_render(&renderer, key(Rotation::Deg0)),
        );

        assert!(matches!(a, Err(StudioError::RenderFailed { .. })));
        assert!(matches!(b, Err(StudioError::RenderFailed { .. })));
        assert!(cache.is_empty());
        assert!(!cache.is_in_flight(&key(Rotation::Deg0)));
    }

    #[tokio::test]
    async fn test_cancelled_render_frees_the_key() {
        let cache = ThumbnailCache::new();
        let renderer = StallingRenderer::default();

        let mut first = Box::pin(cache.get_or_render(&renderer, key(Rotation::Deg0)));
        assert!(futures::poll!(first.as_mut()).is_pending());
        let mut waiter = Box::pin(cache.get_or_render(&renderer, key(Rotation::Deg0)));
        assert!(futures::poll!(waiter.as_mut()).is_pending());
        assert!(cache.is_in_flight(&key(Rotation::Deg0)));

        drop(first);

        assert!(!cache.is_in_flight(&key(Rotation::Deg0)));
        assert!(matches!(waiter.await, Err(StudioError::RenderFailed { .. })));

        let handle = cache.get_or_render(&renderer, key(Rotation::Deg0)).await.unwrap();
        assert_eq!(handle.as_str(), "a.pdf");
        assert_eq!(cache.get(&key(Rotation::Deg0)), Some(handle));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_render_detached_by_invalidate_does_not_touch_newer_render() {
        let cache = ThumbnailCache::new();
        let renderer = StallingRenderer::default();

        let mut stale = Box::pin(cache.get_or_render(&renderer, key(Rotation::Deg0)));
        assert!(futures::poll!(stale.as_mut()).is_pending());
        cache.invalidate(Path::new("a.pdf"), 0);

        let fresh = cache.get_or_render(&renderer, key(Rotation::Deg0)).await.unwrap();
        drop(stale);

        assert_eq!(cache.get(&key(Rotation::Deg0)), Some(fresh));
    }
}

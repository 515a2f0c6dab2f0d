// ── Reactive entry streams ──
//
// Subscription handles for consuming cache entry changes. Query consumers
// hold one of these and re-render on `changed()`; dropping the stream is
// the unsubscribe.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::cache::CacheEntry;

/// A subscription to one cache key.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via the `changed()` method or by converting to a `Stream`.
pub struct EntryStream {
    current: CacheEntry,
    receiver: watch::Receiver<CacheEntry>,
}

impl EntryStream {
    pub(crate) fn new(receiver: watch::Receiver<CacheEntry>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time (or the last `changed()`).
    pub fn current(&self) -> &CacheEntry {
        &self.current
    }

    /// Get the latest entry (may have changed since creation).
    pub fn latest(&self) -> CacheEntry {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new entry.
    /// Returns `None` if the cache has been dropped.
    pub async fn changed(&mut self) -> Option<CacheEntry> {
        self.receiver.changed().await.ok()?;
        let entry = self.receiver.borrow_and_update().clone();
        self.current = entry.clone();
        Some(entry)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> EntryWatchStream {
        EntryWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields a new `CacheEntry` each time the underlying key is written.
pub struct EntryWatchStream {
    inner: WatchStream<CacheEntry>,
}

impl Stream for EntryWatchStream {
    type Item = CacheEntry;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use tokio::sync::Mutex;
use tokio::task;

use crate::error::{IterCacheError, Result};

/// A single-pass producer whose pull may suspend the caller.
#[allow(async_fn_in_trait)]
pub trait AsyncSource {
    type Item;

    async fn pull(&mut self) -> Result<Option<Self::Item>>;
}

/// Every stream is an infallible suspending source.
impl<S: Stream + Unpin> AsyncSource for S {
    type Item = S::Item;

    async fn pull(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.next().await)
    }
}

/// Adapter turning a stream of `Result`s into a fallible [`AsyncSource`].
pub struct TryStream<S> {
    stream: S,
}

impl<S> TryStream<S> {
    pub fn new(stream: S) -> Self {
        TryStream { stream }
    }
}

impl<S, T, E> AsyncSource for TryStream<S>
where
    S: Stream<Item = std::result::Result<T, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = T;

    async fn pull(&mut self) -> Result<Option<Self::Item>> {
        match self.stream.next().await {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(e)) => Err(IterCacheError::Source(e.into())),
            None => Ok(None),
        }
    }
}

struct Shared<S: AsyncSource> {
    source: S,
    values: Vec<S::Item>,
    done: bool,
}

impl<S: AsyncSource> Shared<S>
where
    S::Item: Clone,
{
    fn read(&self, position: usize) -> Option<S::Item> {
        self.values.get(position).cloned()
    }

    async fn realize(&mut self) -> Result<Option<S::Item>> {
        match self.source.pull().await? {
            Some(value) => {
                log::trace!("realized position {}", self.values.len());
                self.values.push(value.clone());
                Ok(Some(value))
            }
            None => {
                log::debug!(
                    "source exhausted after {} values",
                    self.values.len()
                );
                self.done = true;
                Ok(None)
            }
        }
    }
}

/// The suspending twin of [`IterCache`](crate::cache::IterCache).
///
/// Cursors from concurrently scheduled tasks share one cache; the lock
/// is held across the pull, so each position is realized at most once
/// no matter how the tasks interleave.
pub struct StreamCache<S: AsyncSource> {
    shared: Arc<Mutex<Shared<S>>>,
}

impl<S: AsyncSource> StreamCache<S>
where
    S::Item: Clone,
{
    pub fn new(source: S) -> Self {
        StreamCache {
            shared: Arc::new(Mutex::new(Shared {
                source,
                values: Vec::new(),
                done: false,
            })),
        }
    }

    /// Return a new cursor positioned at the start; a cheap replay-only
    /// cursor once the source is known to be exhausted.
    pub async fn stream(&self) -> StreamCursor<S> {
        if self.shared.lock().await.done {
            StreamCursor::Replay(ReplayStreamCursor {
                shared: Arc::clone(&self.shared),
                position: 0,
            })
        } else {
            StreamCursor::Pull(PullStreamCursor {
                shared: Arc::clone(&self.shared),
                position: 0,
            })
        }
    }

    /// Number of values realized so far.
    pub async fn realized(&self) -> usize {
        self.shared.lock().await.values.len()
    }

    /// Whether the source has been fully consumed into the cache.
    pub async fn is_complete(&self) -> bool {
        self.shared.lock().await.done
    }
}

/// An independent read position into a [`StreamCache`].
///
/// `next` suspends while the source is pulled and yields to the
/// scheduler once after each produced value, so sibling tasks make
/// progress between elements.
pub enum StreamCursor<S: AsyncSource> {
    Replay(ReplayStreamCursor<S>),
    Pull(PullStreamCursor<S>),
}

impl<S: AsyncSource> StreamCursor<S>
where
    S::Item: Clone,
{
    pub async fn next(&mut self) -> Option<Result<S::Item>> {
        match self {
            StreamCursor::Replay(cursor) => cursor.next().await,
            StreamCursor::Pull(cursor) => cursor.next().await,
        }
    }

    /// Adapt the cursor into a [`Stream`] so the whole `StreamExt`
    /// combinator surface applies.
    pub fn into_stream(self) -> impl Stream<Item = Result<S::Item>> {
        futures::stream::unfold(self, |mut cursor| async move {
            cursor.next().await.map(|item| (item, cursor))
        })
    }
}

pub struct ReplayStreamCursor<S: AsyncSource> {
    shared: Arc<Mutex<Shared<S>>>,
    position: usize,
}

impl<S: AsyncSource> ReplayStreamCursor<S>
where
    S::Item: Clone,
{
    pub async fn next(&mut self) -> Option<Result<S::Item>> {
        let value = self.shared.lock().await.read(self.position)?;
        self.position += 1;
        task::yield_now().await;
        Some(Ok(value))
    }
}

pub struct PullStreamCursor<S: AsyncSource> {
    shared: Arc<Mutex<Shared<S>>>,
    position: usize,
}

impl<S: AsyncSource> PullStreamCursor<S>
where
    S::Item: Clone,
{
    pub async fn next(&mut self) -> Option<Result<S::Item>> {
        // The lock spans check and pull: two cursors at the same
        // frontier cannot both realize one position.
        let step = {
            let mut shared = self.shared.lock().await;

            if let Some(value) = shared.read(self.position) {
                self.position += 1;
                Some(Ok(value))
            } else if shared.done {
                None
            } else {
                match shared.realize().await {
                    Ok(Some(value)) => {
                        self.position += 1;
                        Some(Ok(value))
                    }
                    Ok(None) => None,
                    // Position stays put: the next call retries.
                    Err(e) => Some(Err(e)),
                }
            }
        };

        // Cooperative yield between elements, after the lock is gone.
        if let Some(Ok(_)) = &step {
            task::yield_now().await;
        }
        step
    }
}

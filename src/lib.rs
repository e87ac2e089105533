//! Memoizing wrappers that turn single-pass sequences into replayable
//! ones: the source is pulled at most once per position, values are kept
//! in a growing cache, and any number of independent cursors read from
//! it. Comes in a blocking flavor built on [`Iterator`] and a suspending
//! flavor built on [`futures::Stream`].

pub mod adapt;
pub mod cache;
pub mod error;
pub mod source;
pub mod stream;

pub use adapt::{cacheable, cacheable_stream, CachedIterExt, CachedStreamExt};
pub use cache::{Cursor, IterCache, PullCursor, ReplayCursor};
pub use error::{IterCacheError, Result};
pub use source::{Source, TryIter};
pub use stream::{
    AsyncSource, PullStreamCursor, ReplayStreamCursor, StreamCache,
    StreamCursor, TryStream,
};

use futures::stream::Stream;

use crate::cache::IterCache;
use crate::source::Source;
use crate::stream::{AsyncSource, StreamCache};

/// Wrap a sequence-producing function so that it returns a replayable
/// [`IterCache`] instead of the bare sequence.
///
/// Functions of several arguments take them as one tuple.
pub fn cacheable<A, S, F>(factory: F) -> impl Fn(A) -> IterCache<S>
where
    F: Fn(A) -> S,
    S: Source,
    S::Item: Clone,
{
    move |args| IterCache::new(factory(args))
}

/// The suspending twin of [`cacheable`].
pub fn cacheable_stream<A, S, F>(factory: F) -> impl Fn(A) -> StreamCache<S>
where
    F: Fn(A) -> S,
    S: AsyncSource,
    S::Item: Clone,
{
    move |args| StreamCache::new(factory(args))
}

pub trait CachedIterExt: Iterator + Sized {
    /// Move the iterator into a replayable [`IterCache`].
    fn cached(self) -> IterCache<Self>
    where
        Self::Item: Clone,
    {
        IterCache::new(self)
    }
}

impl<I: Iterator> CachedIterExt for I {}

pub trait CachedStreamExt: Stream + Unpin + Sized {
    /// Move the stream into a replayable [`StreamCache`].
    fn cached(self) -> StreamCache<Self>
    where
        Self::Item: Clone,
    {
        StreamCache::new(self)
    }
}

impl<S: Stream + Unpin> CachedStreamExt for S {}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    #[test]
    fn test_cacheable_factory() {
        let ranges = cacheable(|n: i32| 0..n);
        let cache = ranges(3);

        let first: Vec<i32> =
            cache.iter().map(|value| value.unwrap()).collect();
        let second: Vec<i32> =
            cache.iter().map(|value| value.unwrap()).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(second, first);
    }

    #[test]
    fn test_iterator_extension() {
        let cache = (0..4).cached();
        let values: Vec<i32> =
            cache.iter().map(|value| value.unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stream_extension() {
        let cache = stream::iter(vec!["x", "y"]).cached();

        let mut cursor = cache.stream().await;
        assert_eq!(cursor.next().await.unwrap().unwrap(), "x");
        assert_eq!(cursor.next().await.unwrap().unwrap(), "y");
        assert!(cursor.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cacheable_stream_factory() {
        let sources = cacheable_stream(|n: usize| {
            stream::iter(std::iter::repeat(1).take(n))
        });
        let cache = sources(2);

        let mut cursor = cache.stream().await;
        assert_eq!(cursor.next().await.unwrap().unwrap(), 1);
        assert_eq!(cursor.next().await.unwrap().unwrap(), 1);
        assert!(cursor.next().await.is_none());
        assert!(cache.is_complete().await);
    }
}

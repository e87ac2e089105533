use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::source::Source;

/// The cache store shared by all cursors of one [`IterCache`]:
/// the realized prefix of the source plus the completion flag.
struct Shared<S: Source> {
    source: S,
    values: Vec<S::Item>,
    done: bool,
}

impl<S: Source> Shared<S>
where
    S::Item: Clone,
{
    fn read(&self, position: usize) -> Option<S::Item> {
        self.values.get(position).cloned()
    }

    /// Pull one value from the source and append it to the cache.
    ///
    /// Clean exhaustion sets the completion flag. A failed pull leaves
    /// both the cache and the flag untouched, so the same position can
    /// be re-attempted by a later call.
    fn realize(&mut self) -> Result<Option<S::Item>> {
        match self.source.pull()? {
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

/// A memoizing wrapper that makes a single-pass source replayable.
///
/// The source is pulled at most once per position; every value is kept
/// in an append-only cache and served to any number of independent
/// cursors. The handle is single-threaded; cursors interleave only by
/// the order of their `next` calls, and each call checks the cache and
/// pulls under one `RefCell` borrow, so no position is ever realized
/// twice.
pub struct IterCache<S: Source> {
    shared: Rc<RefCell<Shared<S>>>,
}

impl<S: Source> IterCache<S>
where
    S::Item: Clone,
{
    pub fn new(source: S) -> Self {
        IterCache {
            shared: Rc::new(RefCell::new(Shared {
                source,
                values: Vec::new(),
                done: false,
            })),
        }
    }

    /// Return a new cursor positioned at the start.
    ///
    /// Once the source is known to be exhausted the cursor is a cheap
    /// replay over the cache, without any pull machinery behind it.
    pub fn iter(&self) -> Cursor<S> {
        if self.shared.borrow().done {
            Cursor::Replay(ReplayCursor {
                shared: Rc::clone(&self.shared),
                position: 0,
            })
        } else {
            Cursor::Pull(PullCursor {
                shared: Rc::clone(&self.shared),
                position: 0,
            })
        }
    }

    /// Number of values realized so far.
    pub fn realized(&self) -> usize {
        self.shared.borrow().values.len()
    }

    /// Whether the source has been fully consumed into the cache.
    pub fn is_complete(&self) -> bool {
        self.shared.borrow().done
    }
}

impl<'a, S: Source> IntoIterator for &'a IterCache<S>
where
    S::Item: Clone,
{
    type Item = Result<S::Item>;
    type IntoIter = Cursor<S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An independent read position into an [`IterCache`].
///
/// Yields `Err` only when the underlying source fails; end-of-sequence
/// is the ordinary `None`, and stays `None` on every later call.
pub enum Cursor<S: Source> {
    /// Replays a fully realized cache; never touches the source.
    Replay(ReplayCursor<S>),
    /// May extend the cache by pulling the source.
    Pull(PullCursor<S>),
}

impl<S: Source> Iterator for Cursor<S>
where
    S::Item: Clone,
{
    type Item = Result<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Cursor::Replay(cursor) => cursor.next(),
            Cursor::Pull(cursor) => cursor.next(),
        }
    }
}

pub struct ReplayCursor<S: Source> {
    shared: Rc<RefCell<Shared<S>>>,
    position: usize,
}

impl<S: Source> Iterator for ReplayCursor<S>
where
    S::Item: Clone,
{
    type Item = Result<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.shared.borrow().read(self.position)?;
        self.position += 1;
        Some(Ok(value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // The cache no longer grows once a replay cursor exists.
        let remaining = self
            .shared
            .borrow()
            .values
            .len()
            .saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

pub struct PullCursor<S: Source> {
    shared: Rc<RefCell<Shared<S>>>,
    position: usize,
}

impl<S: Source> Iterator for PullCursor<S>
where
    S::Item: Clone,
{
    type Item = Result<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        // Single borrow across check and pull: two cursors at the same
        // frontier cannot both realize one position.
        let mut shared = self.shared.borrow_mut();

        if let Some(value) = shared.read(self.position) {
            self.position += 1;
            return Some(Ok(value));
        }
        if shared.done {
            return None;
        }
        match shared.realize() {
            Ok(Some(value)) => {
                self.position += 1;
                Some(Ok(value))
            }
            Ok(None) => None,
            // Position stays put: the next call retries this pull.
            Err(e) => Some(Err(e)),
        }
    }
}

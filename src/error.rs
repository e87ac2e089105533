use thiserror::Error;

pub type Result<T> = std::result::Result<T, IterCacheError>;

#[derive(Error, Debug)]
pub enum IterCacheError {
    /// A failure raised by the underlying source during a pull.
    ///
    /// The failed position is not considered realized: the cache is left
    /// unchanged and the next read of that position pulls the source again.
    #[error("source failure: {0}")]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

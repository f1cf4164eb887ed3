use kn_core::CoreError;
use kn_kdtree::KdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid point count {0}: must be between 0 and u32::MAX")]
    InvalidCount(i64),

    #[error("index configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("spatial index error: {0}")]
    Tree(#[from] KdError),
}

pub type IndexResult<T> = Result<T, IndexError>;

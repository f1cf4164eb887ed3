use kn_index::IndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("failed to spawn motion loop: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("motion loop panicked")]
    LoopPanicked,
}

pub type SimResult<T> = Result<T, SimError>;

//! Spatial-index error type.

use thiserror::Error;

use kn_core::PointId;

/// Errors produced by `kn-kdtree`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KdError {
    #[error("coordinates for {0} contain a non-finite component")]
    NonFinite(PointId),

    #[error("{0} is not live in this index")]
    UnknownPoint(PointId),
}

pub type KdResult<T> = Result<T, KdError>;

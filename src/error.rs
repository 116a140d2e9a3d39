//! Error taxonomy for the Large Structure Engine.
//!
//! One variant per failure kind named in the engine's design document; every
//! suspending operation on [`crate::StructureApi`]/[`crate::LargeStructureApi`]
//! resolves to [`Result<T>`].

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, LseError>;

#[derive(thiserror::Error, Debug)]
pub enum LseError {
    #[error("region axis exceeds the single-piece limit of {limit} blocks (got {size})")]
    OversizedPiece { size: i32, limit: i32 },

    #[error("rotation {0} is not one of the accepted cardinal angles {{0, 90, 180, 270, -90}}")]
    InvalidRotation(i32),

    #[error("name '{0}' resolves outside the structures root")]
    PathTraversal(String),

    #[error("no structure found at '{0}'")]
    NotFound(PathBuf),

    #[error("archive is corrupt: {0}")]
    CorruptArchive(String),

    #[error("large structure '{0}' is missing valid grid metadata in piece 0.0.0")]
    MissingMetadata(String),

    #[error("dimension '{0}' could not be resolved by the world adapter")]
    UnknownDimension(String),

    #[error("world adapter call failed: {0}")]
    AdapterFailure(String),

    #[error("operation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("nbt error: {0}")]
    Nbt(#[from] quartz_nbt::NbtReprError),

    #[error("nbt io error: {0}")]
    NbtIo(#[from] quartz_nbt::io::NbtIoError),
}

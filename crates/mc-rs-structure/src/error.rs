//! Errors escalated by the structure engine.
//!
//! Failing to place a piece is never an error; generation reports it as a
//! missing result. Only bad registrations, bad documents and bad config
//! files surface here.

use mc_rs_nbt::NbtError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid piece geometry for {kind}: {reason}")]
    InvalidGeometry { kind: String, reason: String },

    #[error("unknown piece kind: {0}")]
    UnknownPieceKind(String),

    #[error("piece {kind} is missing field {field}")]
    MissingField { kind: String, field: &'static str },

    #[error("piece {kind} has a malformed bounding box")]
    InvalidBoundingBox { kind: String },

    #[error("unknown structure type: {0}")]
    UnknownStructure(String),

    #[error("NBT error: {0}")]
    Nbt(#[from] NbtError),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),
}

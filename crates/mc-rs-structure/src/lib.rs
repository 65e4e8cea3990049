//! Structure generation: pieces, placement, room grids and realization.

pub mod allocator;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod direction;
pub mod error;
pub mod families;
pub mod geometry;
pub mod graph;
pub mod grid;
pub mod persist;
pub mod piece;
pub mod random;
pub mod realize;
pub mod room_graph;
pub mod structure;

pub use config::GenerationConfig;
pub use direction::{Axis, Direction};
pub use error::StructureError;
pub use geometry::{BlockPos, BoundingBox};
pub use graph::StructureGraph;
pub use piece::{Piece, PieceData, PieceId};
pub use realize::{MemoryWorld, RealizeStats, StructureWorld};
pub use structure::{generate, generate_seeded, StructureType};

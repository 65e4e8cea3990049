//! The piece record shared by every family.

use crate::direction::Direction;
use crate::families::corridor_tree::CorridorPiece;
use crate::families::desert_pyramid::DesertPyramidPiece;
use crate::families::end_city::EndCityPiece;
use crate::families::fortress::FortressPiece;
use crate::families::mansion::MansionPiece;
use crate::families::mineshaft::MineshaftPiece;
use crate::families::monument::MonumentPiece;
use crate::families::stronghold::StrongholdPiece;
use crate::geometry::BoundingBox;
use crate::realize::{Painter, StructureWorld};

/// Index of a piece inside its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub usize);

/// Kind-specific state, one variant per family.
#[derive(Debug, Clone, PartialEq)]
pub enum PieceData {
    Fortress(FortressPiece),
    Stronghold(StrongholdPiece),
    Mineshaft(MineshaftPiece),
    Mansion(MansionPiece),
    Monument(MonumentPiece),
    Corridor(CorridorPiece),
    EndCity(EndCityPiece),
    DesertPyramid(DesertPyramidPiece),
}

/// One placed volume of a structure.
///
/// The box never changes after placement. Orientation is `None` for pieces
/// authored directly in world space (mineshaft rooms and crossings).
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub data: PieceData,
    pub bbox: BoundingBox,
    pub orientation: Option<Direction>,
    pub depth: u32,
}

impl Piece {
    pub fn new(
        data: PieceData,
        bbox: BoundingBox,
        orientation: Option<Direction>,
        depth: u32,
    ) -> Self {
        Self {
            data,
            bbox,
            orientation,
            depth,
        }
    }

    /// The persisted kind tag.
    pub fn id(&self) -> &'static str {
        match &self.data {
            PieceData::Fortress(p) => p.id(),
            PieceData::Stronghold(p) => p.id(),
            PieceData::Mineshaft(p) => p.id(),
            PieceData::Mansion(p) => p.id(),
            PieceData::Monument(p) => p.id(),
            PieceData::Corridor(p) => p.id(),
            PieceData::EndCity(p) => p.id(),
            PieceData::DesertPyramid(p) => p.id(),
        }
    }

    /// Enclosures contain other pieces of the same graph and are left out
    /// of the overlap checks.
    pub fn is_enclosure(&self) -> bool {
        matches!(&self.data, PieceData::Monument(p) if p.is_enclosure())
    }

    /// Paints the part of this piece inside `region` and returns the number
    /// of blocks written. Repeating a call writes the same blocks and fires
    /// no side effect twice.
    pub fn realize(&mut self, region: &BoundingBox, world: &mut dyn StructureWorld) -> usize {
        let Some(mut painter) = Painter::new(world, self.bbox, self.orientation, region) else {
            return 0;
        };
        match &mut self.data {
            PieceData::Fortress(p) => p.paint(&mut painter),
            PieceData::Stronghold(p) => p.paint(&mut painter),
            PieceData::Mineshaft(p) => p.paint(&mut painter),
            PieceData::Mansion(p) => p.paint(&mut painter),
            PieceData::Monument(p) => p.paint(&mut painter),
            PieceData::Corridor(p) => p.paint(&mut painter),
            PieceData::EndCity(p) => p.paint(&mut painter),
            PieceData::DesertPyramid(p) => p.paint(&mut painter),
        }
        painter.writes
    }
}

//! A generated structure: its piece arena plus the few lookups callers need
//! after generation.

use std::collections::HashMap;

use mc_rs_nbt::{gzip, NbtCompound, NbtRoot, NbtTag};
use tracing::{debug, warn};

use crate::error::StructureError;
use crate::families::stronghold;
use crate::geometry::{BlockPos, BoundingBox};
use crate::persist::{self, PieceRegistry};
use crate::piece::{Piece, PieceId};
use crate::realize::{RealizeStats, StructureWorld};
use crate::structure::StructureType;

pub const KEY_STRUCTURE: &str = "Structure";
pub const KEY_CHILDREN: &str = "Children";
pub const KEY_PORTAL_ROOM: &str = "PortalRoom";

#[derive(Debug, Clone, PartialEq)]
pub struct StructureGraph {
    structure: StructureType,
    pieces: Vec<Piece>,
    portal_room: Option<PieceId>,
}

impl StructureGraph {
    /// Wraps freshly generated pieces; the start piece comes first.
    pub fn new(structure: StructureType, pieces: Vec<Piece>) -> Self {
        let portal_room = match structure {
            StructureType::Stronghold => stronghold::portal_room(&pieces),
            _ => None,
        };
        Self {
            structure,
            pieces,
            portal_room,
        }
    }

    pub fn structure(&self) -> StructureType {
        self.structure
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn get(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.0)
    }

    pub fn start(&self) -> Option<&Piece> {
        self.pieces.first()
    }

    pub fn portal_room(&self) -> Option<&Piece> {
        self.portal_room.and_then(|id| self.get(id))
    }

    pub fn portal_room_id(&self) -> Option<PieceId> {
        self.portal_room
    }

    /// Smallest box holding every piece.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::encapsulating(self.pieces.iter().map(|p| &p.bbox))
    }

    /// Pieces reaching into `region`.
    pub fn pieces_in<'a>(&'a self, region: &'a BoundingBox) -> impl Iterator<Item = (PieceId, &'a Piece)> + 'a {
        self.pieces
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.bbox.intersects(region))
            .map(|(i, p)| (PieceId(i), p))
    }

    /// Number of pieces saved under kind tag `id`.
    pub fn count_kind(&self, id: &str) -> usize {
        self.pieces.iter().filter(|p| p.id() == id).count()
    }

    pub fn max_depth(&self) -> u32 {
        self.pieces.iter().map(|p| p.depth).max().unwrap_or(0)
    }

    /// The point a locator should report: the portal room for strongholds,
    /// the start piece otherwise.
    pub fn locate(&self) -> Option<BlockPos> {
        self.portal_room()
            .or_else(|| self.start())
            .map(|p| p.bbox.center())
    }

    /// Pairs of pieces whose boxes overlap. Enclosures are skipped. Empty
    /// for every well-formed graph.
    pub fn verify(&self) -> Vec<(PieceId, PieceId)> {
        let mut overlaps = Vec::new();
        for (i, a) in self.pieces.iter().enumerate() {
            if a.is_enclosure() {
                continue;
            }
            for (j, b) in self.pieces.iter().enumerate().skip(i + 1) {
                if !b.is_enclosure() && a.bbox.intersects(&b.bbox) {
                    overlaps.push((PieceId(i), PieceId(j)));
                }
            }
        }
        overlaps
    }

    /// Paints every piece reaching into `region`.
    ///
    /// A piece whose centre lies in one of `disallowed_biomes` is left
    /// unpainted.
    pub fn realize_region(
        &mut self,
        region: &BoundingBox,
        world: &mut dyn StructureWorld,
        disallowed_biomes: &[String],
    ) -> RealizeStats {
        let mut stats = RealizeStats::default();
        for piece in self.pieces.iter_mut() {
            if !piece.bbox.intersects(region) {
                continue;
            }
            let vetoed = world
                .biome_at(piece.bbox.center())
                .is_some_and(|biome| disallowed_biomes.iter().any(|b| b == biome));
            if vetoed {
                stats.skipped_by_biome += 1;
                continue;
            }
            stats.writes += piece.realize(region, world);
            stats.pieces += 1;
        }
        debug!(
            structure = %self.structure,
            pieces = stats.pieces,
            skipped = stats.skipped_by_biome,
            writes = stats.writes,
            "realized region"
        );
        stats
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn save(&self) -> NbtCompound {
        let mut tag = NbtCompound::new();
        tag.put_string(KEY_STRUCTURE, self.structure.name());
        let children = self
            .pieces
            .iter()
            .map(|p| NbtTag::Compound(persist::save_piece(p)))
            .collect();
        tag.put_list(KEY_CHILDREN, children);
        if let Some(PieceId(index)) = self.portal_room {
            tag.put_int(KEY_PORTAL_ROOM, index as i32);
        }
        tag
    }

    /// Reads a graph back. Pieces that fail to load are logged and
    /// dropped; the rest of the graph survives.
    pub fn load(tag: &NbtCompound) -> Result<Self, StructureError> {
        Self::load_with(tag, PieceRegistry::standard())
    }

    pub fn load_with(tag: &NbtCompound, registry: &PieceRegistry) -> Result<Self, StructureError> {
        let name = tag.get_str(KEY_STRUCTURE).ok_or_else(|| StructureError::MissingField {
            kind: "structure".into(),
            field: KEY_STRUCTURE,
        })?;
        let structure: StructureType = name.parse()?;
        let children = tag.get_list(KEY_CHILDREN).ok_or_else(|| StructureError::MissingField {
            kind: name.to_string(),
            field: KEY_CHILDREN,
        })?;

        let mut pieces = Vec::with_capacity(children.len());
        let mut remap = HashMap::new();
        for (index, child) in children.iter().enumerate() {
            let loaded = match child.as_compound() {
                Some(compound) => registry.load_piece(compound),
                None => Err(StructureError::InvalidGeometry {
                    kind: name.to_string(),
                    reason: format!("child {index} is not a compound"),
                }),
            };
            match loaded {
                Ok(piece) => {
                    remap.insert(index, pieces.len());
                    pieces.push(piece);
                }
                Err(e) => warn!(%structure, index, error = %e, "dropping unreadable piece"),
            }
        }

        let portal_room = tag
            .get_int(KEY_PORTAL_ROOM)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| remap.get(&index).copied())
            .map(PieceId);
        Ok(Self {
            structure,
            pieces,
            portal_room,
        })
    }

    /// Gzipped NBT file contents.
    pub fn to_gzip(&self) -> Result<Vec<u8>, StructureError> {
        let root = NbtRoot::new("", self.save());
        Ok(gzip::compress(&root)?)
    }

    pub fn from_gzip(data: &[u8]) -> Result<Self, StructureError> {
        let root = gzip::decompress(data)?;
        Self::load(&root.compound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use crate::families::corridor_tree::CorridorPiece;
    use crate::piece::PieceData;
    use crate::realize::{Material, MaterialSink, MemoryWorld};

    fn corridor(data: CorridorPiece, bbox: BoundingBox, depth: u32) -> Piece {
        Piece::new(PieceData::Corridor(data), bbox, Some(Direction::North), depth)
    }

    fn small_graph() -> StructureGraph {
        StructureGraph::new(
            StructureType::CorridorTree,
            vec![
                corridor(CorridorPiece::Junction, BoundingBox::new(0, 64, 0, 8, 68, 8), 0),
                corridor(CorridorPiece::Straight, BoundingBox::new(2, 64, -7, 6, 68, -1), 1),
                corridor(
                    CorridorPiece::TerminalRoom { chest_placed: false },
                    BoundingBox::new(0, 64, -16, 8, 70, -8),
                    2,
                ),
            ],
        )
    }

    #[test]
    fn queries() {
        let graph = small_graph();
        assert_eq!(graph.bounding_box(), Some(BoundingBox::new(0, 64, -16, 8, 70, 8)));
        assert_eq!(graph.max_depth(), 2);
        assert_eq!(graph.count_kind("CTRoom"), 1);
        assert_eq!(graph.locate(), Some(BoundingBox::new(0, 64, 0, 8, 68, 8).center()));
        let region = BoundingBox::new(0, 0, -20, 8, 100, -10);
        let hits: Vec<PieceId> = graph.pieces_in(&region).map(|(id, _)| id).collect();
        assert_eq!(hits, vec![PieceId(2)]);
        assert!(graph.verify().is_empty());
    }

    #[test]
    fn verify_reports_overlaps() {
        let mut graph = small_graph();
        graph.pieces.push(corridor(CorridorPiece::Stub, BoundingBox::new(4, 66, 4, 10, 68, 10), 1));
        assert_eq!(graph.verify(), vec![(PieceId(0), PieceId(3))]);
    }

    #[test]
    fn unreadable_pieces_are_dropped() {
        let graph = small_graph();
        let mut tag = graph.save();
        let mut children = tag.get_list(KEY_CHILDREN).unwrap().to_vec();
        let mut broken = NbtCompound::new();
        broken.put_string(persist::KEY_ID, "NoSuchPiece");
        children.insert(1, NbtTag::Compound(broken));
        tag.put_list(KEY_CHILDREN, children);

        let loaded = StructureGraph::load(&tag).unwrap();
        assert_eq!(loaded.pieces(), graph.pieces());
    }

    #[test]
    fn portal_index_follows_dropped_pieces() {
        let mut graph = small_graph();
        graph.portal_room = Some(PieceId(2));
        let mut tag = graph.save();
        let mut children = tag.get_list(KEY_CHILDREN).unwrap().to_vec();
        children[1] = NbtTag::Int(7);
        tag.put_list(KEY_CHILDREN, children);

        let loaded = StructureGraph::load(&tag).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.portal_room_id(), Some(PieceId(1)));
        assert_eq!(loaded.portal_room().map(|p| p.id()), Some("CTRoom"));
    }

    #[test]
    fn unknown_structure_fails_to_load() {
        let mut tag = small_graph().save();
        tag.put_string(KEY_STRUCTURE, "end_city");
        assert!(matches!(
            StructureGraph::load(&tag),
            Err(StructureError::UnknownStructure(_))
        ));
    }

    #[test]
    fn gzip_file_roundtrip() {
        let graph = small_graph();
        let bytes = graph.to_gzip().unwrap();
        assert_eq!(StructureGraph::from_gzip(&bytes).unwrap(), graph);
    }

    #[test]
    fn biome_veto_skips_pieces() {
        let mut graph = small_graph();
        let mut world = MemoryWorld::default().with_default_biome("plains");
        world.set_biome_area(BoundingBox::new(-50, 0, -50, 50, 100, -8), "ocean");
        let region = graph.bounding_box().unwrap();

        let stats = graph.realize_region(&region, &mut world, &["ocean".to_string()]);
        assert_eq!(stats.pieces, 2);
        assert_eq!(stats.skipped_by_biome, 1);
        assert!(world.loot.is_empty());
        assert_eq!(world.get_material(BlockPos::new(0, 64, -16)), Material::Air);
    }
}

//! A configurable branching corridor tree.
//!
//! The tree grows from a junction at the origin. Straight corridors lead
//! on, junctions fork left and right, terminal rooms end a branch and hold
//! a chest. When the table has nothing that fits, a short stub caps the
//! branch.

use mc_rs_nbt::NbtCompound;
use rand::RngCore;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::builder::{exit_anchor, select_piece, BuildContext, Exit, Limits, Selection};
use crate::catalog::{Catalog, PieceWeight, WeightTable};
use crate::config::CorridorTreeConfig;
use crate::direction::Direction;
use crate::error::StructureError;
use crate::geometry::{BlockPos, BoundingBox};
use crate::persist;
use crate::piece::{Piece, PieceData, PieceId};
use crate::realize::{loot, Material, Painter};

pub const IDS: &[&str] = &["CTStraight", "CTJunction", "CTRoom", "CTStub"];

const STUB_LENGTH: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorKind {
    Straight,
    Junction,
    TerminalRoom,
}

impl CorridorKind {
    fn default_size(self) -> [i32; 3] {
        match self {
            CorridorKind::Straight => [5, 5, 7],
            CorridorKind::Junction => [9, 5, 9],
            CorridorKind::TerminalRoom => [9, 7, 9],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorridorPiece {
    Straight,
    Junction,
    TerminalRoom { chest_placed: bool },
    Stub,
}

impl CorridorPiece {
    fn of_kind(kind: CorridorKind) -> Self {
        match kind {
            CorridorKind::Straight => CorridorPiece::Straight,
            CorridorKind::Junction => CorridorPiece::Junction,
            CorridorKind::TerminalRoom => CorridorPiece::TerminalRoom {
                chest_placed: false,
            },
        }
    }

    pub fn kind(&self) -> Option<CorridorKind> {
        match self {
            CorridorPiece::Straight => Some(CorridorKind::Straight),
            CorridorPiece::Junction => Some(CorridorKind::Junction),
            CorridorPiece::TerminalRoom { .. } => Some(CorridorKind::TerminalRoom),
            CorridorPiece::Stub => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            CorridorPiece::Straight => "CTStraight",
            CorridorPiece::Junction => "CTJunction",
            CorridorPiece::TerminalRoom { .. } => "CTRoom",
            CorridorPiece::Stub => "CTStub",
        }
    }

    pub fn save(&self, tag: &mut NbtCompound) {
        if let CorridorPiece::TerminalRoom { chest_placed } = self {
            tag.put_bool("Chest", *chest_placed);
        }
    }

    pub fn load(id: &str, tag: &NbtCompound) -> Result<Self, StructureError> {
        Ok(match id {
            "CTStraight" => CorridorPiece::Straight,
            "CTJunction" => CorridorPiece::Junction,
            "CTRoom" => CorridorPiece::TerminalRoom {
                chest_placed: persist::flag(tag, "Chest"),
            },
            "CTStub" => CorridorPiece::Stub,
            other => return Err(persist::unknown(other)),
        })
    }

    pub fn paint(&mut self, painter: &mut Painter<'_>) {
        let (w, h, d) = painter.local_size();
        let mid = w / 2;
        match self {
            CorridorPiece::Straight | CorridorPiece::Stub => {
                painter.hollow(Material::StoneBricks, Material::Air);
                painter.fill(Material::Air, mid - 1, 1, 0, mid + 1, 3.min(h - 2), 0);
                if matches!(self, CorridorPiece::Straight) {
                    painter.fill(Material::Air, mid - 1, 1, d - 1, mid + 1, 3.min(h - 2), d - 1);
                }
            }
            CorridorPiece::Junction => {
                painter.hollow(Material::StoneBricks, Material::Air);
                let top = 3.min(h - 2);
                painter.fill(Material::Air, mid - 1, 1, 0, mid + 1, top, 0);
                painter.fill(Material::Air, mid - 1, 1, d - 1, mid + 1, top, d - 1);
                painter.fill(Material::Air, 0, 1, d / 2 - 1, 0, top, d / 2 + 1);
                painter.fill(Material::Air, w - 1, 1, d / 2 - 1, w - 1, top, d / 2 + 1);
            }
            CorridorPiece::TerminalRoom { chest_placed } => {
                painter.hollow(Material::MossyStoneBricks, Material::Air);
                painter.fill(Material::Air, mid - 1, 1, 0, mid + 1, 3.min(h - 2), 0);
                *chest_placed = painter.chest(mid, 1, d - 2, loot::CORRIDOR_TREE, *chest_placed);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

struct CorridorTree {
    catalog: Catalog<CorridorKind>,
    sizes: Vec<(CorridorKind, [i32; 3])>,
}

impl CorridorTree {
    fn from_config(config: &CorridorTreeConfig) -> Result<Self, StructureError> {
        let mut entries = Vec::with_capacity(config.catalog.len());
        let mut sizes = Vec::with_capacity(config.catalog.len());
        for entry in &config.catalog {
            let size = entry.size.unwrap_or_else(|| entry.kind.default_size());
            if size.iter().any(|&v| v <= 0) {
                return Err(StructureError::InvalidGeometry {
                    kind: format!("{:?}", entry.kind),
                    reason: format!("size {size:?} must be positive"),
                });
            }
            let mut weight = PieceWeight::new(entry.kind, entry.weight, entry.max_placements);
            weight.allow_in_row = entry.allow_in_row;
            weight.min_depth = entry.min_depth;
            entries.push(weight);
            sizes.push((entry.kind, size));
        }
        Ok(Self {
            catalog: Catalog::new(entries)?,
            sizes,
        })
    }

    fn size(&self, kind: CorridorKind) -> [i32; 3] {
        self.sizes
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or_else(|| kind.default_size(), |(_, size)| *size)
    }

    fn grow(
        &self,
        rng: &mut dyn RngCore,
        limits: Limits,
        origin: BlockPos,
        facing: Direction,
    ) -> Vec<Piece> {
        let [w, h, d] = self.size(CorridorKind::Junction);
        let bbox = BoundingBox::orient_box(origin.x, origin.y, origin.z, -(w / 2), 0, 0, w, h, d, facing);
        let start = Piece::new(PieceData::Corridor(CorridorPiece::Junction), bbox, Some(facing), 0);

        let mut ctx = BuildContext::new(rng, limits, start);
        let mut table = self.catalog.instantiate();
        // the start counts against the junction quota
        table.record_kind(CorridorKind::Junction);
        let mut previous = None;

        self.add_children(&mut ctx, &mut table, &mut previous, PieceId(0));
        while let Some(id) = ctx.pop_random_pending() {
            self.add_children(&mut ctx, &mut table, &mut previous, id);
        }
        ctx.into_pieces()
    }

    fn add_children(
        &self,
        ctx: &mut BuildContext<'_>,
        table: &mut WeightTable<CorridorKind>,
        previous: &mut Option<CorridorKind>,
        id: PieceId,
    ) {
        let parent = ctx.piece(id);
        let (bbox, depth) = (parent.bbox, parent.depth);
        let Some(facing) = parent.orientation else {
            return;
        };
        let (w, _, d) = bbox.local_size(Some(facing));
        let exits = match parent.data {
            PieceData::Corridor(CorridorPiece::Straight) => vec![Exit::Forward { x: w / 2, y: 0 }],
            PieceData::Corridor(CorridorPiece::Junction) => vec![
                Exit::Forward { x: w / 2, y: 0 },
                Exit::Left { y: 0, z: d / 2 },
                Exit::Right { y: 0, z: d / 2 },
            ],
            _ => Vec::new(),
        };
        for exit in exits {
            let (anchor, dir) = exit_anchor(&bbox, facing, exit);
            self.add_child(ctx, table, previous, anchor, dir, depth + 1);
        }
    }

    fn add_child(
        &self,
        ctx: &mut BuildContext<'_>,
        table: &mut WeightTable<CorridorKind>,
        previous: &mut Option<CorridorKind>,
        anchor: BlockPos,
        facing: Direction,
        depth: u32,
    ) {
        if depth > ctx.limits.max_depth || !ctx.within_radius(anchor) {
            return;
        }
        let selection = select_piece(ctx, table, previous, anchor, facing, depth, |ctx, kind, anchor, facing, depth| {
            self.create(ctx, kind, anchor, facing, depth)
        });
        let piece = match selection {
            Selection::Placed(piece) => Some(piece),
            Selection::Exhausted | Selection::NoFit => self.stub(ctx, anchor, facing, depth),
        };
        if let Some(piece) = piece {
            ctx.push_pending(piece);
        }
    }

    fn create(
        &self,
        ctx: &mut BuildContext<'_>,
        kind: CorridorKind,
        anchor: BlockPos,
        facing: Direction,
        depth: u32,
    ) -> Option<Piece> {
        let [w, h, d] = self.size(kind);
        let bbox = ctx.accepts(BoundingBox::orient_box(
            anchor.x,
            anchor.y,
            anchor.z,
            -(w / 2),
            0,
            0,
            w,
            h,
            d,
            facing,
        ))?;
        Some(Piece::new(
            PieceData::Corridor(CorridorPiece::of_kind(kind)),
            bbox,
            Some(facing),
            depth,
        ))
    }

    fn stub(&self, ctx: &mut BuildContext<'_>, anchor: BlockPos, facing: Direction, depth: u32) -> Option<Piece> {
        let [w, h, _] = self.size(CorridorKind::Straight);
        let bbox = ctx.accepts(BoundingBox::orient_box(
            anchor.x,
            anchor.y,
            anchor.z,
            -(w / 2),
            0,
            0,
            w,
            h,
            STUB_LENGTH,
            facing,
        ))?;
        Some(Piece::new(PieceData::Corridor(CorridorPiece::Stub), bbox, Some(facing), depth))
    }
}

fn count_kind(pieces: &[Piece], kind: CorridorKind) -> usize {
    pieces
        .iter()
        .filter(|p| matches!(&p.data, PieceData::Corridor(c) if c.kind() == Some(kind)))
        .count()
}

/// Grows a corridor tree, regrowing it until the required kind appears or
/// the restart budget runs out.
pub fn generate(
    config: &CorridorTreeConfig,
    rng: &mut dyn RngCore,
    origin: BlockPos,
    facing: Direction,
) -> Result<Vec<Piece>, StructureError> {
    let tree = CorridorTree::from_config(config)?;
    let limits = config.bounds.limits();
    let mut restarts = 0;
    loop {
        let pieces = tree.grow(rng, limits, origin, facing);
        let satisfied = config
            .required_kind
            .map_or(true, |kind| count_kind(&pieces, kind) > 0);
        if satisfied || restarts >= config.max_restarts {
            if !satisfied {
                warn!(restarts, "corridor tree never placed its required piece");
            }
            debug!(pieces = pieces.len(), restarts, "corridor tree generated");
            return Ok(pieces);
        }
        restarts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorridorEntryConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn non_positive_size_is_rejected() {
        let mut config = CorridorTreeConfig::default();
        config.catalog.push(CorridorEntryConfig {
            kind: CorridorKind::Straight,
            weight: 1,
            max_placements: 0,
            allow_in_row: false,
            min_depth: None,
            size: None,
        });
        config.catalog[0].size = Some([5, 0, 7]);
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate(&config, &mut rng, BlockPos::new(0, 64, 0), Direction::North).unwrap_err();
        assert!(matches!(err, StructureError::InvalidGeometry { .. }));
    }

    #[test]
    fn duplicate_catalog_kind_is_rejected() {
        let mut config = CorridorTreeConfig::default();
        let dup = config.catalog[0].clone();
        config.catalog.push(dup);
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate(&config, &mut rng, BlockPos::new(0, 64, 0), Direction::North).unwrap_err();
        assert!(matches!(err, StructureError::InvalidCatalog(_)));
    }

    #[test]
    fn start_is_a_junction_at_origin() {
        let mut rng = StdRng::seed_from_u64(8);
        let config = CorridorTreeConfig::default();
        let pieces = generate(&config, &mut rng, BlockPos::new(0, 64, 0), Direction::North).unwrap();
        assert_eq!(pieces[0].id(), "CTJunction");
        assert_eq!(pieces[0].depth, 0);
        assert!(pieces[0].bbox.is_inside(BlockPos::new(0, 64, 0)));
    }

    #[test]
    fn start_junction_uses_up_quota() {
        let mut config = CorridorTreeConfig::default();
        for entry in &mut config.catalog {
            if entry.kind == CorridorKind::Junction {
                entry.max_placements = 1;
            }
        }
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pieces = generate(&config, &mut rng, BlockPos::new(0, 64, 0), Direction::East).unwrap();
            let junctions = pieces.iter().filter(|p| p.id() == "CTJunction").count();
            assert_eq!(junctions, 1, "seed {seed}");
        }
    }

    #[test]
    fn room_chest_flag_roundtrip() {
        let piece = CorridorPiece::TerminalRoom { chest_placed: true };
        let mut tag = NbtCompound::new();
        piece.save(&mut tag);
        assert_eq!(CorridorPiece::load("CTRoom", &tag).unwrap(), piece);
    }
}

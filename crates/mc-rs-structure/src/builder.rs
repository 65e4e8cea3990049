//! Depth-bounded recursive expansion shared by the branching families.
//!
//! A [`BuildContext`] owns the growing piece arena for one generation. Each
//! placed piece is queued as pending; the family drains the queue in random
//! order and asks every piece to spawn its children through exit anchors.

use std::fmt::Debug;

use rand::RngCore;
use tracing::trace;

use crate::allocator;
use crate::catalog::{Draw, WeightTable};
use crate::direction::Direction;
use crate::geometry::{BlockPos, BoundingBox};
use crate::piece::{Piece, PieceId};
use crate::random::StructureRng;

/// Per-family generation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: u32,
    /// Horizontal distance from the start piece's min corner.
    pub radius: i32,
    /// Boxes must sit strictly above this Y.
    pub floor_y: i32,
    pub draw_attempts: u32,
}

pub struct BuildContext<'a> {
    pub pieces: Vec<Piece>,
    pending: Vec<PieceId>,
    rng: &'a mut dyn RngCore,
    pub limits: Limits,
}

impl<'a> BuildContext<'a> {
    pub fn new(rng: &'a mut dyn RngCore, limits: Limits, start: Piece) -> Self {
        Self {
            pieces: vec![start],
            pending: Vec::new(),
            rng,
            limits,
        }
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }

    pub fn start_box(&self) -> BoundingBox {
        self.pieces[0].bbox
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    pub fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.0]
    }

    pub fn within_radius(&self, anchor: BlockPos) -> bool {
        let start = self.start_box();
        (anchor.x - start.min_x).abs() <= self.limits.radius
            && (anchor.z - start.min_z).abs() <= self.limits.radius
    }

    /// Whether a candidate box is above the floor and free.
    pub fn accepts(&self, bbox: BoundingBox) -> Option<BoundingBox> {
        allocator::try_place(&self.pieces, bbox, self.limits.floor_y)
    }

    pub fn collides(&self, bbox: &BoundingBox) -> Option<PieceId> {
        allocator::find_collision(&self.pieces, bbox)
    }

    pub fn push(&mut self, piece: Piece) -> PieceId {
        trace!(id = piece.id(), bbox = %piece.bbox, depth = piece.depth, "placed piece");
        self.pieces.push(piece);
        PieceId(self.pieces.len() - 1)
    }

    pub fn push_pending(&mut self, piece: Piece) -> PieceId {
        let id = self.push(piece);
        self.pending.push(id);
        id
    }

    /// Removes a uniformly random pending piece.
    pub fn pop_random_pending(&mut self) -> Option<PieceId> {
        if self.pending.is_empty() {
            return None;
        }
        let index = self.rng.next_int(self.pending.len() as i32) as usize;
        Some(self.pending.remove(index))
    }

    pub fn into_pieces(self) -> Vec<Piece> {
        self.pieces
    }
}

// -----------------------------------------------------------------------
// Exit anchors
// -----------------------------------------------------------------------

/// A doorway in a parent piece, in the parent's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Out of the far end, `x` blocks across and `y` blocks up.
    Forward { x: i32, y: i32 },
    /// Out of the left wall, `y` up and `z` blocks along.
    Left { y: i32, z: i32 },
    Right { y: i32, z: i32 },
}

/// World anchor and facing for a child leaving `bbox` through `exit`.
pub fn exit_anchor(bbox: &BoundingBox, facing: Direction, exit: Exit) -> (BlockPos, Direction) {
    match exit {
        Exit::Forward { x, y } => {
            let pos = match facing {
                Direction::North => BlockPos::new(bbox.min_x + x, bbox.min_y + y, bbox.min_z - 1),
                Direction::West => BlockPos::new(bbox.min_x - 1, bbox.min_y + y, bbox.min_z + x),
                Direction::East => BlockPos::new(bbox.max_x + 1, bbox.min_y + y, bbox.min_z + x),
                _ => BlockPos::new(bbox.min_x + x, bbox.min_y + y, bbox.max_z + 1),
            };
            (pos, facing)
        }
        Exit::Left { y, z } => match facing.axis() {
            crate::direction::Axis::X => (
                BlockPos::new(bbox.min_x + z, bbox.min_y + y, bbox.min_z - 1),
                Direction::North,
            ),
            _ => (
                BlockPos::new(bbox.min_x - 1, bbox.min_y + y, bbox.min_z + z),
                Direction::West,
            ),
        },
        Exit::Right { y, z } => match facing.axis() {
            crate::direction::Axis::X => (
                BlockPos::new(bbox.min_x + z, bbox.min_y + y, bbox.max_z + 1),
                Direction::South,
            ),
            _ => (
                BlockPos::new(bbox.max_x + 1, bbox.min_y + y, bbox.min_z + z),
                Direction::East,
            ),
        },
    }
}

// -----------------------------------------------------------------------
// Weighted selection
// -----------------------------------------------------------------------

/// Result of one child selection.
#[derive(Debug)]
pub enum Selection {
    Placed(Piece),
    /// The table had nothing left to offer.
    Exhausted,
    /// Every attempt was rejected or collided.
    NoFit,
}

/// Picks and builds a child piece at `anchor`.
///
/// An imposed kind is tried first while the table still has quota for it,
/// and is charged like a drawn one. Otherwise up to `draw_attempts` weighted draws are made. When the drawn
/// kind cannot be built, the following entries are tried in table order
/// until one is ineligible. `previous` is the last kind placed by the
/// structure and is updated on success.
pub fn select_piece<K, F>(
    ctx: &mut BuildContext<'_>,
    table: &mut WeightTable<K>,
    previous: &mut Option<K>,
    anchor: BlockPos,
    facing: Direction,
    depth: u32,
    mut factory: F,
) -> Selection
where
    K: Copy + PartialEq + Debug,
    F: FnMut(&mut BuildContext<'_>, K, BlockPos, Direction, u32) -> Option<Piece>,
{
    if table.is_exhausted() {
        return Selection::Exhausted;
    }

    if let Some(kind) = table.take_imposed() {
        if let Some(index) = table.index_of(kind) {
            if let Some(piece) = factory(ctx, kind, anchor, facing, depth) {
                table.record_placement(index);
                *previous = Some(kind);
                return Selection::Placed(piece);
            }
        }
    }

    for _ in 0..ctx.limits.draw_attempts {
        let first = match table.draw(ctx.rng(), *previous, depth) {
            Draw::Picked(index) => index,
            Draw::Rejected => continue,
            Draw::Exhausted => return Selection::Exhausted,
        };
        for index in first..table.entries().len() {
            if index > first && !table.eligible(index, *previous, depth) {
                break;
            }
            let Some(kind) = table.kind_at(index) else {
                break;
            };
            if let Some(piece) = factory(ctx, kind, anchor, facing, depth) {
                table.record_placement(index);
                *previous = Some(kind);
                return Selection::Placed(piece);
            }
        }
    }
    Selection::NoFit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, PieceWeight};
    use crate::families::corridor_tree::CorridorPiece;
    use crate::piece::PieceData;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn limits() -> Limits {
        Limits {
            max_depth: 8,
            radius: 16,
            floor_y: 0,
            draw_attempts: 5,
        }
    }

    fn stub(bbox: BoundingBox) -> Piece {
        Piece::new(PieceData::Corridor(CorridorPiece::Stub), bbox, Some(Direction::South), 0)
    }

    #[test]
    fn forward_exit_per_facing() {
        let bbox = BoundingBox::new(0, 10, 0, 4, 14, 9);
        assert_eq!(
            exit_anchor(&bbox, Direction::North, Exit::Forward { x: 1, y: 1 }),
            (BlockPos::new(1, 11, -1), Direction::North)
        );
        assert_eq!(
            exit_anchor(&bbox, Direction::South, Exit::Forward { x: 1, y: 1 }),
            (BlockPos::new(1, 11, 10), Direction::South)
        );
        assert_eq!(
            exit_anchor(&bbox, Direction::East, Exit::Forward { x: 1, y: 0 }),
            (BlockPos::new(5, 10, 1), Direction::East)
        );
    }

    #[test]
    fn side_exits_turn() {
        let bbox = BoundingBox::new(0, 0, 0, 4, 4, 4);
        let (_, left) = exit_anchor(&bbox, Direction::North, Exit::Left { y: 1, z: 1 });
        let (_, right) = exit_anchor(&bbox, Direction::North, Exit::Right { y: 1, z: 1 });
        assert_eq!((left, right), (Direction::West, Direction::East));
        let (pos, left) = exit_anchor(&bbox, Direction::East, Exit::Left { y: 1, z: 2 });
        assert_eq!(left, Direction::North);
        assert_eq!(pos, BlockPos::new(2, 1, -1));
    }

    #[test]
    fn radius_is_measured_from_start_corner() {
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = BuildContext::new(&mut rng, limits(), stub(BoundingBox::new(0, 5, 0, 4, 9, 4)));
        assert!(ctx.within_radius(BlockPos::new(16, 5, -16)));
        assert!(!ctx.within_radius(BlockPos::new(17, 5, 0)));
    }

    #[test]
    fn pending_drains_every_piece() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = BuildContext::new(&mut rng, limits(), stub(BoundingBox::new(0, 5, 0, 1, 6, 1)));
        for i in 1..6 {
            ctx.push_pending(stub(BoundingBox::new(i * 3, 5, 0, i * 3 + 1, 6, 1)));
        }
        let mut drained: Vec<usize> = std::iter::from_fn(|| ctx.pop_random_pending())
            .map(|id| id.0)
            .collect();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn select_falls_through_after_failed_factory() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Kind {
            Broken,
            Works,
        }
        let catalog = Catalog::new(vec![
            PieceWeight::new(Kind::Broken, 100, 0).repeatable(),
            PieceWeight::new(Kind::Works, 0, 0).repeatable(),
        ])
        .unwrap();
        let mut table = catalog.instantiate();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = BuildContext::new(&mut rng, limits(), stub(BoundingBox::new(0, 5, 0, 1, 6, 1)));
        let mut previous = None;
        let selection = select_piece(
            &mut ctx,
            &mut table,
            &mut previous,
            BlockPos::new(5, 5, 5),
            Direction::South,
            1,
            |_, kind, pos, facing, depth| match kind {
                Kind::Broken => None,
                Kind::Works => Some(Piece::new(
                    PieceData::Corridor(CorridorPiece::Stub),
                    BoundingBox::new(pos.x, pos.y, pos.z, pos.x, pos.y, pos.z),
                    Some(facing),
                    depth,
                )),
            },
        );
        assert!(matches!(selection, Selection::Placed(_)));
        assert_eq!(previous, Some(Kind::Works));
    }

    #[test]
    fn imposed_kind_is_charged() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Kind {
            Hall,
            Only,
        }
        let mut table = Catalog::new(vec![
            PieceWeight::new(Kind::Hall, 1, 0),
            PieceWeight::new(Kind::Only, 1, 1),
        ])
        .unwrap()
        .instantiate();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = BuildContext::new(&mut rng, limits(), stub(BoundingBox::new(0, 5, 0, 1, 6, 1)));
        let mut previous = None;
        fn place(
            ctx: &mut BuildContext<'_>,
            table: &mut WeightTable<Kind>,
            previous: &mut Option<Kind>,
            x: i32,
        ) -> Selection {
            select_piece(
                ctx,
                table,
                previous,
                BlockPos::new(x, 5, 3),
                Direction::South,
                1,
                |_, kind, pos, facing, depth| {
                    (kind == Kind::Only).then(|| {
                        Piece::new(
                            PieceData::Corridor(CorridorPiece::Stub),
                            BoundingBox::new(pos.x, pos.y, pos.z, pos.x, pos.y, pos.z),
                            Some(facing),
                            depth,
                        )
                    })
                },
            )
        }

        table.impose(Kind::Only);
        assert!(matches!(place(&mut ctx, &mut table, &mut previous, 3), Selection::Placed(_)));
        assert_eq!(table.placed(Kind::Only), None);
        assert_eq!(previous, Some(Kind::Only));

        // quota used up: imposing again cannot place a second one
        table.impose(Kind::Only);
        assert!(matches!(place(&mut ctx, &mut table, &mut previous, 6), Selection::NoFit));
    }
}

//! Abandoned mineshafts.
//!
//! A dirt room at the root sends shafts out of its four walls. Every shaft
//! piece expands its own children immediately, so the tree is built depth
//! first with no pending queue. Rooms and crossings live in world space
//! and carry no orientation.

use mc_rs_nbt::{NbtCompound, NbtTag};
use rand::RngCore;
use tracing::debug;

use crate::allocator;
use crate::builder::{BuildContext, Limits};
use crate::config::MineshaftConfig;
use crate::direction::{Axis, Direction};
use crate::error::StructureError;
use crate::geometry::{BlockPos, BoundingBox};
use crate::persist;
use crate::piece::{Piece, PieceData, PieceId};
use crate::random::StructureRng;
use crate::realize::{EntityKind, Material, Painter};

pub const IDS: &[&str] = &["MSCorridor", "MSCrossing", "MSRoom", "MSStairs"];

const SECTION_LENGTH: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineshaftPiece {
    /// The root room. `entrances` are the wall cells opened for each child.
    Room { entrances: Vec<BoundingBox> },
    Corridor {
        rails: bool,
        spider: bool,
        spider_placed: bool,
        sections: i32,
    },
    Crossing { direction: Direction, two_floored: bool },
    Stairs,
}

impl MineshaftPiece {
    pub fn id(&self) -> &'static str {
        match self {
            MineshaftPiece::Room { .. } => "MSRoom",
            MineshaftPiece::Corridor { .. } => "MSCorridor",
            MineshaftPiece::Crossing { .. } => "MSCrossing",
            MineshaftPiece::Stairs => "MSStairs",
        }
    }

    pub fn save(&self, tag: &mut NbtCompound) {
        match self {
            MineshaftPiece::Room { entrances } => {
                let list = entrances
                    .iter()
                    .map(|b| NbtTag::IntArray(b.to_array().to_vec()))
                    .collect();
                tag.put_list("Entrances", list);
            }
            MineshaftPiece::Corridor {
                rails,
                spider,
                spider_placed,
                sections,
            } => {
                tag.put_bool("hr", *rails);
                tag.put_bool("sc", *spider);
                tag.put_bool("hps", *spider_placed);
                tag.put_int("Num", *sections);
            }
            MineshaftPiece::Crossing {
                direction,
                two_floored,
            } => {
                tag.put_bool("tf", *two_floored);
                tag.put_int("D", direction.data_2d().unwrap_or(2));
            }
            MineshaftPiece::Stairs => {}
        }
    }

    pub fn load(id: &str, tag: &NbtCompound) -> Result<Self, StructureError> {
        Ok(match id {
            "MSRoom" => {
                let mut entrances = Vec::new();
                for entry in tag.get_list("Entrances").unwrap_or_default() {
                    let bbox = entry
                        .as_int_array()
                        .and_then(BoundingBox::from_slice)
                        .ok_or_else(|| StructureError::InvalidBoundingBox { kind: id.to_string() })?;
                    entrances.push(bbox);
                }
                MineshaftPiece::Room { entrances }
            }
            "MSCorridor" => MineshaftPiece::Corridor {
                rails: persist::flag(tag, "hr"),
                spider: persist::flag(tag, "sc"),
                spider_placed: persist::flag(tag, "hps"),
                sections: persist::require_int(tag, id, "Num")?,
            },
            "MSCrossing" => MineshaftPiece::Crossing {
                direction: Direction::from_data_2d(persist::int_or(tag, "D", 2)),
                two_floored: persist::flag(tag, "tf"),
            },
            "MSStairs" => MineshaftPiece::Stairs,
            other => return Err(persist::unknown(other)),
        })
    }

    pub fn paint(&mut self, p: &mut Painter<'_>) {
        let (w, h, d) = p.local_size();
        match self {
            MineshaftPiece::Room { entrances } => {
                let frame = p.frame();
                p.fill(Material::Air, 0, 1, 0, w - 1, 3.min(h - 1), d - 1);
                for entrance in entrances.iter() {
                    let local = entrance.moved(-frame.min_x, -frame.min_y, -frame.min_z);
                    p.fill(
                        Material::Air,
                        local.min_x,
                        local.max_y - 2,
                        local.min_z,
                        local.max_x,
                        local.max_y,
                        local.max_z,
                    );
                }
                upper_half_sphere(p, w, h, d);
            }
            MineshaftPiece::Corridor {
                rails,
                spider,
                spider_placed,
                sections,
            } => {
                let length = *sections * SECTION_LENGTH;
                p.fill(Material::Air, 0, 0, 0, 2, 2, length - 1);
                for section in 0..*sections {
                    let z = 2 + section * SECTION_LENGTH;
                    p.fill(Material::OakFence, 0, 0, z, 0, 1, z);
                    p.fill(Material::OakFence, 2, 0, z, 2, 1, z);
                    p.fill(Material::OakPlanks, 0, 2, z, 2, 2, z);
                    if *spider {
                        p.place(Material::Cobweb, 0, 2, z - 1);
                        p.place(Material::Cobweb, 2, 2, z + 1);
                    }
                }
                if *rails {
                    p.fill(Material::Rail, 1, 0, 0, 1, 0, length - 1);
                }
                if *spider {
                    let z = (*sections / 2) * SECTION_LENGTH + 2;
                    *spider_placed = p.spawner(1, 0, z, EntityKind::CaveSpider, *spider_placed);
                }
            }
            MineshaftPiece::Crossing { two_floored, .. } => {
                if *two_floored {
                    p.fill(Material::Air, 1, 0, 0, w - 2, 2, d - 1);
                    p.fill(Material::Air, 0, 0, 1, w - 1, 2, d - 2);
                    p.fill(Material::Air, 1, h - 3, 0, w - 2, h - 1, d - 1);
                    p.fill(Material::Air, 0, h - 3, 1, w - 1, h - 1, d - 2);
                    p.fill(Material::Air, 1, 3, 1, w - 2, 3, d - 2);
                } else {
                    p.fill(Material::Air, 1, 0, 0, w - 2, h - 1, d - 1);
                    p.fill(Material::Air, 0, 0, 1, w - 1, h - 1, d - 2);
                }
                for (x, z) in [(1, 1), (1, d - 2), (w - 2, 1), (w - 2, d - 2)] {
                    p.fill(Material::OakPlanks, x, 0, z, x, h - 1, z);
                }
            }
            MineshaftPiece::Stairs => {
                p.fill(Material::Air, 0, 5, 0, 2, 7, 1);
                p.fill(Material::Air, 0, 0, 7, 2, 2, 8);
                for step in 0..5 {
                    let low = 5 - step - if step < 4 { 1 } else { 0 };
                    p.fill(Material::Air, 0, low, 2 + step, 2, 7 - step, 2 + step);
                }
            }
        }
    }
}

/// Carves the dome above a room's floor band.
fn upper_half_sphere(p: &mut Painter<'_>, w: i32, h: i32, d: i32) {
    let (rx, ry, rz) = (w as f32 / 2.0, (h - 4).max(1) as f32, d as f32 / 2.0);
    for y in 4..h {
        let dy = (y - 4) as f32 / ry;
        for x in 0..w {
            let dx = (x as f32 - rx + 0.5) / rx;
            for z in 0..d {
                let dz = (z as f32 - rz + 0.5) / rz;
                if dx * dx + dy * dy + dz * dz <= 1.05 {
                    p.place(Material::Air, x, y, z);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Rotates a box authored for a north-bound shaft to `facing` and moves it
/// to `anchor`.
fn shaft_box(anchor: BlockPos, facing: Direction, north: [i32; 6]) -> BoundingBox {
    let [x0, y0, z0, x1, y1, z1] = north;
    let local = match facing {
        Direction::South => BoundingBox::new(x0, y0, -z1, x1, y1, -z0),
        Direction::West => BoundingBox::new(z0, y0, x0, z1, y1, x1),
        Direction::East => BoundingBox::new(-z1, y0, x0, -z0, y1, x1),
        _ => BoundingBox::new(x0, y0, z0, x1, y1, z1),
    };
    local.moved(anchor.x, anchor.y, anchor.z)
}

fn random_shaft_piece(
    ctx: &mut BuildContext<'_>,
    anchor: BlockPos,
    facing: Direction,
    depth: u32,
) -> Option<Piece> {
    let roll = ctx.rng().next_int(100);
    if roll >= 80 {
        let height = if ctx.rng().next_int(4) == 0 { 6 } else { 2 };
        let bbox = ctx.accepts(shaft_box(anchor, facing, [-1, 0, -4, 3, height, 0]))?;
        let data = MineshaftPiece::Crossing {
            direction: facing,
            two_floored: bbox.y_span() > 3,
        };
        Some(Piece::new(PieceData::Mineshaft(data), bbox, None, depth))
    } else if roll >= 70 {
        let bbox = ctx.accepts(shaft_box(anchor, facing, [0, -5, -8, 2, 2, 0]))?;
        Some(Piece::new(PieceData::Mineshaft(MineshaftPiece::Stairs), bbox, Some(facing), depth))
    } else {
        let longest = ctx.rng().next_int(3) + 2;
        let lengths = (1..=longest).rev().map(|n| n * SECTION_LENGTH);
        let (length, bbox) = allocator::shrink_to_fit(&ctx.pieces, lengths, ctx.limits.floor_y, |len| {
            shaft_box(anchor, facing, [0, 0, -(len - 1), 2, 2, 0])
        })?;
        let rails = ctx.rng().next_int(3) == 0;
        let spider = !rails && ctx.rng().next_int(23) == 0;
        let data = MineshaftPiece::Corridor {
            rails,
            spider,
            spider_placed: false,
            sections: length / SECTION_LENGTH,
        };
        Some(Piece::new(PieceData::Mineshaft(data), bbox, Some(facing), depth))
    }
}

/// Places a random shaft piece at `anchor` and grows its children right
/// away.
fn add_piece(ctx: &mut BuildContext<'_>, anchor: BlockPos, facing: Direction, depth: u32) -> Option<PieceId> {
    if depth > ctx.limits.max_depth || !ctx.within_radius(anchor) {
        return None;
    }
    let piece = random_shaft_piece(ctx, anchor, facing, depth)?;
    let id = ctx.push(piece);
    add_children(ctx, id);
    Some(id)
}

fn add_children(ctx: &mut BuildContext<'_>, id: PieceId) {
    let piece = ctx.piece(id);
    let (b, depth, orientation) = (piece.bbox, piece.depth, piece.orientation);
    let data = match &piece.data {
        PieceData::Mineshaft(data) => data.clone(),
        _ => return,
    };
    match data {
        MineshaftPiece::Room { .. } => room_children(ctx, id, b, depth),
        MineshaftPiece::Corridor { .. } => {
            if let Some(facing) = orientation {
                corridor_children(ctx, b, facing, depth);
            }
        }
        MineshaftPiece::Crossing {
            direction,
            two_floored,
        } => crossing_children(ctx, b, direction, two_floored, depth),
        MineshaftPiece::Stairs => {
            let Some(facing) = orientation else {
                return;
            };
            let anchor = match facing {
                Direction::South => BlockPos::new(b.min_x, b.min_y, b.max_z + 1),
                Direction::West => BlockPos::new(b.min_x - 1, b.min_y, b.min_z),
                Direction::East => BlockPos::new(b.max_x + 1, b.min_y, b.min_z),
                _ => BlockPos::new(b.min_x, b.min_y, b.min_z - 1),
            };
            add_piece(ctx, anchor, facing, depth + 1);
        }
    }
}

fn room_children(ctx: &mut BuildContext<'_>, id: PieceId, b: BoundingBox, depth: u32) {
    let band = (b.y_span() - 4).max(1);
    let mut entrances = Vec::new();

    // north and south walls walk along x, west and east along z
    for facing in [Direction::North, Direction::South, Direction::West, Direction::East] {
        let span = if facing.axis() == Axis::Z { b.x_span() } else { b.z_span() };
        let mut offset = 0;
        while offset < span {
            offset += ctx.rng().next_int(span);
            if offset + 3 > span {
                break;
            }
            let y = b.min_y + ctx.rng().next_int(band) + 1;
            let anchor = match facing {
                Direction::North => BlockPos::new(b.min_x + offset, y, b.min_z - 1),
                Direction::South => BlockPos::new(b.min_x + offset, y, b.max_z + 1),
                Direction::West => BlockPos::new(b.min_x - 1, y, b.min_z + offset),
                _ => BlockPos::new(b.max_x + 1, y, b.min_z + offset),
            };
            if let Some(child) = add_piece(ctx, anchor, facing, depth + 1) {
                let c = ctx.piece(child).bbox;
                entrances.push(match facing {
                    Direction::North => BoundingBox::new(c.min_x, c.min_y, b.min_z, c.max_x, c.max_y, b.min_z + 1),
                    Direction::South => BoundingBox::new(c.min_x, c.min_y, b.max_z - 1, c.max_x, c.max_y, b.max_z),
                    Direction::West => BoundingBox::new(b.min_x, c.min_y, c.min_z, b.min_x + 1, c.max_y, c.max_z),
                    _ => BoundingBox::new(b.max_x - 1, c.min_y, c.min_z, b.max_x, c.max_y, c.max_z),
                });
            }
            offset += 4;
        }
    }

    if let PieceData::Mineshaft(MineshaftPiece::Room { entrances: slot }) = &mut ctx.piece_mut(id).data {
        *slot = entrances;
    }
}

fn corridor_children(ctx: &mut BuildContext<'_>, b: BoundingBox, facing: Direction, depth: u32) {
    let turn = ctx.rng().next_int(4);
    let y = b.min_y - 1 + ctx.rng().next_int(3);
    let (anchor, dir) = match (facing, turn) {
        (Direction::South, 0 | 1) => (BlockPos::new(b.min_x, y, b.max_z + 1), Direction::South),
        (Direction::South, 2) => (BlockPos::new(b.min_x - 1, y, b.max_z - 3), Direction::West),
        (Direction::South, _) => (BlockPos::new(b.max_x + 1, y, b.max_z - 3), Direction::East),
        (Direction::West, 0 | 1) => (BlockPos::new(b.min_x - 1, y, b.min_z), Direction::West),
        (Direction::West, 2) => (BlockPos::new(b.min_x, y, b.min_z - 1), Direction::North),
        (Direction::West, _) => (BlockPos::new(b.min_x, y, b.max_z + 1), Direction::South),
        (Direction::East, 0 | 1) => (BlockPos::new(b.max_x + 1, y, b.min_z), Direction::East),
        (Direction::East, 2) => (BlockPos::new(b.max_x - 3, y, b.min_z - 1), Direction::North),
        (Direction::East, _) => (BlockPos::new(b.max_x - 3, y, b.max_z + 1), Direction::South),
        (_, 0 | 1) => (BlockPos::new(b.min_x, y, b.min_z - 1), Direction::North),
        (_, 2) => (BlockPos::new(b.min_x - 1, y, b.min_z), Direction::West),
        (_, _) => (BlockPos::new(b.max_x + 1, y, b.min_z), Direction::East),
    };
    add_piece(ctx, anchor, dir, depth + 1);

    if depth >= ctx.limits.max_depth {
        return;
    }
    // side branches every section, one level deeper than the straight on
    if facing.axis() == Axis::X {
        let mut x = b.min_x + 3;
        while x + 3 <= b.max_x {
            match ctx.rng().next_int(5) {
                0 => {
                    add_piece(ctx, BlockPos::new(x, b.min_y, b.min_z - 1), Direction::North, depth + 2);
                }
                1 => {
                    add_piece(ctx, BlockPos::new(x, b.min_y, b.max_z + 1), Direction::South, depth + 2);
                }
                _ => {}
            }
            x += SECTION_LENGTH;
        }
    } else {
        let mut z = b.min_z + 3;
        while z + 3 <= b.max_z {
            match ctx.rng().next_int(5) {
                0 => {
                    add_piece(ctx, BlockPos::new(b.min_x - 1, b.min_y, z), Direction::West, depth + 2);
                }
                1 => {
                    add_piece(ctx, BlockPos::new(b.max_x + 1, b.min_y, z), Direction::East, depth + 2);
                }
                _ => {}
            }
            z += SECTION_LENGTH;
        }
    }
}

fn crossing_children(ctx: &mut BuildContext<'_>, b: BoundingBox, direction: Direction, two_floored: bool, depth: u32) {
    let north = |y| (BlockPos::new(b.min_x + 1, y, b.min_z - 1), Direction::North);
    let south = |y| (BlockPos::new(b.min_x + 1, y, b.max_z + 1), Direction::South);
    let west = |y| (BlockPos::new(b.min_x - 1, y, b.min_z + 1), Direction::West);
    let east = |y| (BlockPos::new(b.max_x + 1, y, b.min_z + 1), Direction::East);

    let ground = b.min_y;
    let exits = match direction {
        Direction::South => [south(ground), west(ground), east(ground)],
        Direction::West => [north(ground), south(ground), west(ground)],
        Direction::East => [north(ground), south(ground), east(ground)],
        _ => [north(ground), west(ground), east(ground)],
    };
    for (anchor, facing) in exits {
        add_piece(ctx, anchor, facing, depth + 1);
    }

    if two_floored {
        let upper = b.min_y + 4;
        for (anchor, facing) in [north(upper), west(upper), east(upper), south(upper)] {
            if ctx.rng().next_bool() {
                add_piece(ctx, anchor, facing, depth + 1);
            }
        }
    }
}

pub fn generate(
    config: &MineshaftConfig,
    rng: &mut dyn RngCore,
    origin: BlockPos,
) -> Result<Vec<Piece>, StructureError> {
    let (x, y, z) = (origin.x, origin.y, origin.z);
    let bbox = BoundingBox::new(
        x,
        y,
        z,
        x + 7 + rng.next_int(6),
        y + 4 + rng.next_int(6),
        z + 7 + rng.next_int(6),
    );
    let room = Piece::new(
        PieceData::Mineshaft(MineshaftPiece::Room { entrances: Vec::new() }),
        bbox,
        None,
        0,
    );
    let limits = Limits {
        max_depth: config.max_depth,
        radius: config.radius,
        floor_y: config.floor_y,
        draw_attempts: 0,
    };
    let mut ctx = BuildContext::new(rng, limits, room);
    add_children(&mut ctx, PieceId(0));
    let pieces = ctx.into_pieces();
    debug!(pieces = pieces.len(), "mineshaft generated");
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mineshaft(seed: u64) -> Vec<Piece> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(&MineshaftConfig::default(), &mut rng, BlockPos::new(0, 50, 0)).unwrap()
    }

    #[test]
    fn shaft_boxes_rotate_around_the_anchor() {
        let anchor = BlockPos::new(10, 40, 10);
        let north = [0, 0, -9, 2, 2, 0];
        assert_eq!(shaft_box(anchor, Direction::North, north), BoundingBox::new(10, 40, 1, 12, 42, 10));
        assert_eq!(shaft_box(anchor, Direction::South, north), BoundingBox::new(10, 40, 10, 12, 42, 19));
        assert_eq!(shaft_box(anchor, Direction::West, north), BoundingBox::new(1, 40, 10, 10, 42, 12));
        assert_eq!(shaft_box(anchor, Direction::East, north), BoundingBox::new(10, 40, 10, 19, 42, 12));
    }

    #[test]
    fn room_is_the_root() {
        let pieces = mineshaft(4);
        assert_eq!(pieces[0].id(), "MSRoom");
        assert!(pieces[0].orientation.is_none());
        assert!(pieces[0].bbox.x_span() >= 8 && pieces[0].bbox.x_span() <= 13);
        assert_eq!(pieces[0].bbox.min_y, 50);
    }

    #[test]
    fn depth_and_radius_are_bounded() {
        for seed in 0..6 {
            let pieces = mineshaft(seed);
            let start = pieces[0].bbox;
            for piece in &pieces {
                assert!(piece.depth <= 8);
                // anchors sit within the radius; boxes may reach one piece past it
                assert!((piece.bbox.min_x - start.min_x).abs() <= 80 + 40);
            }
        }
    }

    #[test]
    fn corridor_lengths_are_whole_sections() {
        for piece in mineshaft(2) {
            if let PieceData::Mineshaft(MineshaftPiece::Corridor { sections, .. }) = piece.data {
                let length = piece.bbox.local_size(piece.orientation).2;
                assert_eq!(length, sections * SECTION_LENGTH);
                assert!((1..=4).contains(&sections));
            }
        }
    }

    #[test]
    fn entrances_roundtrip() {
        let piece = MineshaftPiece::Room {
            entrances: vec![BoundingBox::new(0, 51, 0, 2, 53, 1)],
        };
        let mut tag = NbtCompound::new();
        piece.save(&mut tag);
        assert_eq!(MineshaftPiece::load("MSRoom", &tag).unwrap(), piece);
    }
}

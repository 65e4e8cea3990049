//! Woodland mansions.
//!
//! The room-grid carver lays out three floors; every corridor and start
//! cell becomes a piece and every identified room becomes one piece
//! covering its cells. The grid's south runs along the structure's facing
//! and its east along the facing turned counter-clockwise.

use mc_rs_nbt::NbtCompound;
use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::debug;

use crate::config::MansionConfig;
use crate::direction::Direction;
use crate::error::StructureError;
use crate::geometry::{BlockPos, BoundingBox};
use crate::grid::{cell, room, MansionGrid, SimpleGrid};
use crate::persist;
use crate::piece::{Piece, PieceData};
use crate::realize::{loot, Material, Painter};

pub const IDS: &[&str] = &[
    "WMEntrance",
    "WMCorridor",
    "WMHall",
    "WMRoom1x1",
    "WMRoom1x2",
    "WMRoom2x2",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MansionPiece {
    /// The two-by-two start block on the ground floor.
    Entrance { door: BoundingBox },
    Corridor { floor: i32 },
    /// A start cell above the ground floor.
    Hall { floor: i32 },
    Room1x1 { floor: i32, door: Option<BoundingBox> },
    Room1x2 {
        floor: i32,
        door: Option<BoundingBox>,
        stairs: bool,
    },
    Room2x2 {
        floor: i32,
        door: Option<BoundingBox>,
        chest_placed: bool,
    },
}

fn save_door(tag: &mut NbtCompound, door: &Option<BoundingBox>) {
    if let Some(door) = door {
        tag.put_int_array("Door", door.to_array().to_vec());
    }
}

fn load_door(tag: &NbtCompound, id: &str) -> Result<Option<BoundingBox>, StructureError> {
    match tag.get_int_array("Door") {
        None => Ok(None),
        Some(values) => BoundingBox::from_slice(values)
            .map(Some)
            .ok_or_else(|| StructureError::InvalidBoundingBox { kind: id.to_string() }),
    }
}

impl MansionPiece {
    pub fn id(&self) -> &'static str {
        match self {
            MansionPiece::Entrance { .. } => "WMEntrance",
            MansionPiece::Corridor { .. } => "WMCorridor",
            MansionPiece::Hall { .. } => "WMHall",
            MansionPiece::Room1x1 { .. } => "WMRoom1x1",
            MansionPiece::Room1x2 { .. } => "WMRoom1x2",
            MansionPiece::Room2x2 { .. } => "WMRoom2x2",
        }
    }

    pub fn save(&self, tag: &mut NbtCompound) {
        match self {
            MansionPiece::Entrance { door } => save_door(tag, &Some(*door)),
            MansionPiece::Corridor { floor } | MansionPiece::Hall { floor } => tag.put_int("Floor", *floor),
            MansionPiece::Room1x1 { floor, door } => {
                tag.put_int("Floor", *floor);
                save_door(tag, door);
            }
            MansionPiece::Room1x2 { floor, door, stairs } => {
                tag.put_int("Floor", *floor);
                save_door(tag, door);
                tag.put_bool("Stairs", *stairs);
            }
            MansionPiece::Room2x2 {
                floor,
                door,
                chest_placed,
            } => {
                tag.put_int("Floor", *floor);
                save_door(tag, door);
                tag.put_bool("Chest", *chest_placed);
            }
        }
    }

    pub fn load(id: &str, tag: &NbtCompound) -> Result<Self, StructureError> {
        let floor = persist::int_or(tag, "Floor", 0);
        Ok(match id {
            "WMEntrance" => MansionPiece::Entrance {
                door: load_door(tag, id)?.ok_or_else(|| StructureError::MissingField {
                    kind: id.to_string(),
                    field: "Door",
                })?,
            },
            "WMCorridor" => MansionPiece::Corridor { floor },
            "WMHall" => MansionPiece::Hall { floor },
            "WMRoom1x1" => MansionPiece::Room1x1 {
                floor,
                door: load_door(tag, id)?,
            },
            "WMRoom1x2" => MansionPiece::Room1x2 {
                floor,
                door: load_door(tag, id)?,
                stairs: persist::flag(tag, "Stairs"),
            },
            "WMRoom2x2" => MansionPiece::Room2x2 {
                floor,
                door: load_door(tag, id)?,
                chest_placed: persist::flag(tag, "Chest"),
            },
            other => return Err(persist::unknown(other)),
        })
    }

    pub fn paint(&mut self, p: &mut Painter<'_>) {
        let (w, h, d) = p.local_size();
        let frame = p.frame();
        let carve = |p: &mut Painter<'_>, door: &BoundingBox| {
            let local = door.moved(-frame.min_x, -frame.min_y, -frame.min_z);
            p.fill(Material::Air, local.min_x, local.min_y, local.min_z, local.max_x, local.max_y, local.max_z);
        };
        match self {
            MansionPiece::Entrance { door } => {
                p.hollow(Material::DarkOakPlanks, Material::Air);
                p.fill(Material::Cobblestone, 1, 0, 1, w - 2, 0, d - 2);
                carve(p, door);
            }
            MansionPiece::Corridor { floor } | MansionPiece::Hall { floor } => {
                let boards = if *floor == 0 { Material::OakPlanks } else { Material::DarkOakPlanks };
                p.fill(boards, 0, 0, 0, w - 1, 0, d - 1);
                p.fill(Material::Air, 0, 1, 0, w - 1, h - 2, d - 1);
                p.fill(Material::DarkOakPlanks, 0, h - 1, 0, w - 1, h - 1, d - 1);
            }
            MansionPiece::Room1x1 { door, .. } => {
                p.hollow(Material::DarkOakPlanks, Material::Air);
                match door {
                    Some(door) => carve(p, door),
                    // secret rooms are lined with shelves
                    None => p.fill(Material::Bookshelf, 1, 1, 1, 1, h - 2, d - 2),
                }
            }
            MansionPiece::Room1x2 { door, stairs, .. } => {
                p.hollow(Material::DarkOakPlanks, Material::Air);
                if let Some(door) = door {
                    carve(p, door);
                }
                if *stairs {
                    p.fill(Material::Air, w / 2 - 1, h - 1, d / 2 - 1, w / 2, h - 1, d / 2);
                }
            }
            MansionPiece::Room2x2 {
                door, chest_placed, ..
            } => {
                p.hollow(Material::DarkOakPlanks, Material::Air);
                if let Some(door) = door {
                    carve(p, door);
                }
                *chest_placed = p.chest(2, 1, 2, loot::WOODLAND_MANSION, *chest_placed);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Maps grid cells to world boxes.
struct CellFrame {
    origin: BlockPos,
    south: Direction,
    east: Direction,
    start: (i32, i32),
    cell_size: i32,
    floor_heights: [i32; 3],
}

impl CellFrame {
    fn corner(&self, x: i32, y: i32) -> BlockPos {
        self.origin
            .relative(self.south, self.cell_size * (1 + y - self.start.1))
            .relative(self.east, self.cell_size * (x - self.start.0))
    }

    /// World box of the inclusive cell rectangle on `floor`.
    fn rect(&self, floor: usize, min: (i32, i32), max: (i32, i32)) -> BoundingBox {
        let reach = self.cell_size - 1;
        let first = self.corner(min.0, min.1);
        let last = self
            .corner(max.0, max.1)
            .relative(self.south, reach)
            .relative(self.east, reach);
        let y = self.origin.y + self.floor_heights[floor];
        BoundingBox::new(first.x, y, first.z, last.x, y + reach, last.z)
    }

    /// World direction of a grid direction.
    fn rotate(&self, dir: Direction) -> Direction {
        match dir {
            Direction::South => self.south,
            Direction::North => self.south.opposite(),
            Direction::East => self.east,
            Direction::West => self.east.opposite(),
            other => other,
        }
    }
}

/// A two-wide, three-high opening centred on one face of `bbox`.
fn opening(bbox: &BoundingBox, face: Direction) -> BoundingBox {
    let (y0, y1) = (bbox.min_y + 1, bbox.min_y + 3);
    let mid_x = bbox.min_x + bbox.x_span() / 2;
    let mid_z = bbox.min_z + bbox.z_span() / 2;
    match face {
        Direction::North => BoundingBox::new(mid_x - 1, y0, bbox.min_z, mid_x, y1, bbox.min_z),
        Direction::South => BoundingBox::new(mid_x - 1, y0, bbox.max_z, mid_x, y1, bbox.max_z),
        Direction::West => BoundingBox::new(bbox.min_x, y0, mid_z - 1, bbox.min_x, y1, mid_z),
        _ => BoundingBox::new(bbox.max_x, y0, mid_z - 1, bbox.max_x, y1, mid_z),
    }
}

/// Cell rectangle of every room id on a floor, with its door cell.
struct RoomCells {
    id: i32,
    value: i32,
    min: (i32, i32),
    max: (i32, i32),
    origin: (i32, i32),
}

fn collect_rooms(rooms: &SimpleGrid) -> Vec<RoomCells> {
    let mut found: Vec<RoomCells> = Vec::new();
    for (x, y, v) in rooms.cells() {
        let id = v & room::ID_MASK;
        if id < room::FIRST_ID {
            continue;
        }
        match found.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.min = (r.min.0.min(x), r.min.1.min(y));
                r.max = (r.max.0.max(x), r.max.1.max(y));
                if v & room::ORIGIN != 0 {
                    r.origin = (x, y);
                    r.value = v;
                }
            }
            None => found.push(RoomCells {
                id,
                value: v,
                min: (x, y),
                max: (x, y),
                origin: (x, y),
            }),
        }
    }
    found.sort_by_key(|r| r.id);
    found
}

fn layout_pieces(
    grid: &MansionGrid,
    frame: &CellFrame,
    rng: &mut dyn RngCore,
) -> Vec<Piece> {
    let (ex, ey) = grid.entrance;
    let entrance_box = frame.rect(0, (ex, ey), (ex + 1, ey + 1));
    let entrance = MansionPiece::Entrance {
        door: opening(&entrance_box, frame.rotate(Direction::East)),
    };
    let mut pieces = vec![Piece::new(PieceData::Mansion(entrance), entrance_box, None, 0)];

    for floor in 0..3 {
        let layout = grid.layout(floor);
        let rooms = &grid.floor_rooms[floor];
        let level = floor as i32;

        for (x, y, v) in layout.cells() {
            let data = match v {
                cell::CORRIDOR => MansionPiece::Corridor { floor: level },
                cell::START if floor > 0 => MansionPiece::Hall { floor: level },
                _ => continue,
            };
            let bbox = frame.rect(floor, (x, y), (x, y));
            pieces.push(Piece::new(PieceData::Mansion(data), bbox, None, 1));
        }

        for found in collect_rooms(rooms) {
            let (ox, oy) = found.origin;
            let door = if found.value & room::DOOR != 0 {
                let sides: Vec<Direction> = Direction::HORIZONTAL
                    .into_iter()
                    .filter(|d| layout.get(ox + d.step_x(), oy + d.step_z()) == cell::CORRIDOR)
                    .collect();
                sides.choose(&mut *rng)
                    .map(|&side| opening(&frame.rect(floor, (ox, oy), (ox, oy)), frame.rotate(side)))
            } else {
                None
            };
            let data = match found.value & room::TYPE_MASK {
                room::SIZE_1X2 => MansionPiece::Room1x2 {
                    floor: level,
                    door,
                    stairs: found.value & room::STAIRS != 0,
                },
                room::SIZE_2X2 => MansionPiece::Room2x2 {
                    floor: level,
                    door,
                    chest_placed: false,
                },
                _ => MansionPiece::Room1x1 { floor: level, door },
            };
            let bbox = frame.rect(floor, found.min, found.max);
            pieces.push(Piece::new(PieceData::Mansion(data), bbox, None, 2));
        }
    }
    pieces
}

pub fn generate(
    config: &MansionConfig,
    rng: &mut dyn RngCore,
    origin: BlockPos,
    facing: Direction,
) -> Result<Vec<Piece>, StructureError> {
    let mut grid = MansionGrid::generate(rng);
    if config.repair_doorless {
        for floor in 0..3 {
            grid.repair_doorless(floor);
        }
    }
    for floor in 0..3 {
        let cut_off = grid.unreachable_rooms(floor);
        if !cut_off.is_empty() {
            debug!(floor, rooms = ?cut_off, "mansion rooms without a path");
        }
    }

    let (ex, ey) = grid.entrance;
    let frame = CellFrame {
        origin,
        south: facing,
        east: facing.counter_clockwise(),
        start: (ex + 1, ey + 1),
        cell_size: config.cell_size,
        floor_heights: config.floor_heights,
    };
    let pieces = layout_pieces(&grid, &frame, rng);
    debug!(pieces = pieces.len(), "mansion generated");
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mansion(seed: u64, facing: Direction) -> Vec<Piece> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(&MansionConfig::default(), &mut rng, BlockPos::new(0, 70, 0), facing).unwrap()
    }

    #[test]
    fn entrance_leads() {
        let pieces = mansion(3, Direction::South);
        assert_eq!(pieces[0].id(), "WMEntrance");
        assert_eq!(pieces[0].bbox.x_span(), 16);
        assert_eq!(pieces[0].bbox.z_span(), 16);
        assert_eq!(pieces[0].bbox.min_y, 70);
    }

    #[test]
    fn pieces_are_disjoint_for_every_facing() {
        for facing in Direction::HORIZONTAL {
            let pieces = mansion(11, facing);
            for (i, a) in pieces.iter().enumerate() {
                for b in &pieces[i + 1..] {
                    assert!(!a.bbox.intersects(&b.bbox), "{} overlaps {}", a.id(), b.id());
                }
            }
        }
    }

    #[test]
    fn floors_sit_on_their_heights() {
        for piece in mansion(5, Direction::West) {
            let floor = match piece.data {
                PieceData::Mansion(MansionPiece::Corridor { floor })
                | PieceData::Mansion(MansionPiece::Room1x1 { floor, .. }) => floor,
                _ => continue,
            };
            assert_eq!(piece.bbox.min_y, 70 + [0, 8, 19][floor as usize]);
        }
    }

    #[test]
    fn doors_lie_on_the_room_wall() {
        for piece in mansion(9, Direction::North) {
            let door = match &piece.data {
                PieceData::Mansion(MansionPiece::Room1x1 { door: Some(d), .. })
                | PieceData::Mansion(MansionPiece::Room1x2 { door: Some(d), .. })
                | PieceData::Mansion(MansionPiece::Room2x2 { door: Some(d), .. }) => *d,
                _ => continue,
            };
            assert!(piece.bbox.contains_box(&door));
            let on_wall = door.min_x == piece.bbox.min_x
                || door.max_x == piece.bbox.max_x
                || door.min_z == piece.bbox.min_z
                || door.max_z == piece.bbox.max_z;
            assert!(on_wall);
        }
    }

    #[test]
    fn grid_rotation_keeps_piece_count() {
        let south = mansion(13, Direction::South).len();
        let east = mansion(13, Direction::East).len();
        assert_eq!(south, east);
    }

    #[test]
    fn room_state_roundtrip() {
        let piece = MansionPiece::Room2x2 {
            floor: 1,
            door: Some(BoundingBox::new(3, 79, 0, 4, 81, 0)),
            chest_placed: true,
        };
        let mut tag = NbtCompound::new();
        piece.save(&mut tag);
        assert_eq!(tag.get_bool("Chest"), Some(true));
        assert_eq!(MansionPiece::load("WMRoom2x2", &tag).unwrap(), piece);

        let secret = MansionPiece::Room1x1 { floor: 0, door: None };
        let mut tag = NbtCompound::new();
        secret.save(&mut tag);
        assert!(!tag.contains("Door"));
        assert_eq!(MansionPiece::load("WMRoom1x1", &tag).unwrap(), secret);
    }

    #[test]
    fn entrance_requires_a_door() {
        let tag = NbtCompound::new();
        assert!(matches!(
            MansionPiece::load("WMEntrance", &tag),
            Err(StructureError::MissingField { field: "Door", .. })
        ));
    }
}

//! Ocean monuments.
//!
//! The building piece encloses every room of the monument. Rooms are fitted
//! onto the 3-D room graph, biggest shapes first, then the two wing rooms
//! and the penthouse are added at fixed spots inside the building.

use mc_rs_nbt::NbtCompound;
use rand::RngCore;
use tracing::debug;

use crate::config::MonumentConfig;
use crate::direction::Direction;
use crate::error::StructureError;
use crate::geometry::{BlockPos, BoundingBox};
use crate::persist;
use crate::piece::{Piece, PieceData};
use crate::random::StructureRng;
use crate::realize::{EntityKind, Material, Painter};
use crate::room_graph::{RoomGraph, Slot};

pub const IDS: &[&str] = &[
    "OMB",
    "OMCR",
    "OMDXR",
    "OMDXYR",
    "OMDYR",
    "OMDYZR",
    "OMDZR",
    "OMEntry",
    "OMPenthouse",
    "OMSimple",
    "OMSimpleT",
    "OMWR",
];

const BUILDING_SIZE: (i32, i32, i32) = (58, 23, 58);
/// Where the room lattice starts inside the building.
const LATTICE_ORIGIN: (i32, i32, i32) = (9, 0, 22);
const CELL: (i32, i32, i32) = (8, 4, 8);

/// Room shapes that carry nothing but their openings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomShape {
    Entry,
    DoubleX,
    DoubleXY,
    DoubleY,
    DoubleYZ,
    DoubleZ,
    SimpleTop,
}

impl RoomShape {
    fn id(self) -> &'static str {
        match self {
            RoomShape::Entry => "OMEntry",
            RoomShape::DoubleX => "OMDXR",
            RoomShape::DoubleXY => "OMDXYR",
            RoomShape::DoubleY => "OMDYR",
            RoomShape::DoubleYZ => "OMDYZR",
            RoomShape::DoubleZ => "OMDZR",
            RoomShape::SimpleTop => "OMSimpleT",
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        Some(match id {
            "OMEntry" => RoomShape::Entry,
            "OMDXR" => RoomShape::DoubleX,
            "OMDXYR" => RoomShape::DoubleXY,
            "OMDYR" => RoomShape::DoubleY,
            "OMDYZR" => RoomShape::DoubleYZ,
            "OMDZR" => RoomShape::DoubleZ,
            "OMSimpleT" => RoomShape::SimpleTop,
            _ => return None,
        })
    }

    /// Size in lattice cells.
    fn cells(self) -> (i32, i32, i32) {
        match self {
            RoomShape::DoubleX => (2, 1, 1),
            RoomShape::DoubleXY => (2, 2, 1),
            RoomShape::DoubleY => (1, 2, 1),
            RoomShape::DoubleYZ => (1, 2, 2),
            RoomShape::DoubleZ => (1, 1, 2),
            RoomShape::Entry | RoomShape::SimpleTop => (1, 1, 1),
        }
    }

    /// Local block offset of each covered cell, in the order their
    /// openings are stored.
    fn cell_offsets(self) -> &'static [(i32, i32, i32)] {
        match self {
            RoomShape::DoubleX => &[(0, 0, 0), (8, 0, 0)],
            RoomShape::DoubleY => &[(0, 0, 0), (0, 4, 0)],
            RoomShape::DoubleZ => &[(0, 0, 0), (0, 0, 8)],
            RoomShape::DoubleXY => &[(0, 0, 0), (8, 0, 0), (0, 4, 0), (8, 4, 0)],
            RoomShape::DoubleYZ => &[(0, 0, 0), (0, 0, 8), (0, 4, 0), (0, 4, 8)],
            RoomShape::Entry | RoomShape::SimpleTop => &[(0, 0, 0)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonumentPiece {
    Building,
    Core,
    /// `openings` holds one 3-D face mask per covered cell.
    Room { shape: RoomShape, openings: Vec<i32> },
    Simple { openings: Vec<i32>, design: i32 },
    Wing { design: i32, elder_spawned: bool },
    Penthouse { elder_spawned: bool },
}

impl MonumentPiece {
    pub fn id(&self) -> &'static str {
        match self {
            MonumentPiece::Building => "OMB",
            MonumentPiece::Core => "OMCR",
            MonumentPiece::Room { shape, .. } => shape.id(),
            MonumentPiece::Simple { .. } => "OMSimple",
            MonumentPiece::Wing { .. } => "OMWR",
            MonumentPiece::Penthouse { .. } => "OMPenthouse",
        }
    }

    /// The building contains the other pieces.
    pub fn is_enclosure(&self) -> bool {
        matches!(self, MonumentPiece::Building)
    }

    pub fn save(&self, tag: &mut NbtCompound) {
        match self {
            MonumentPiece::Building | MonumentPiece::Core => {}
            MonumentPiece::Room { openings, .. } => tag.put_int_array("Openings", openings.clone()),
            MonumentPiece::Simple { openings, design } => {
                tag.put_int_array("Openings", openings.clone());
                tag.put_int("Design", *design);
            }
            MonumentPiece::Wing {
                design,
                elder_spawned,
            } => {
                tag.put_int("Design", *design);
                tag.put_bool("Elder", *elder_spawned);
            }
            MonumentPiece::Penthouse { elder_spawned } => tag.put_bool("Elder", *elder_spawned),
        }
    }

    pub fn load(id: &str, tag: &NbtCompound) -> Result<Self, StructureError> {
        let openings = || {
            tag.get_int_array("Openings")
                .map(<[i32]>::to_vec)
                .ok_or_else(|| StructureError::MissingField {
                    kind: id.to_string(),
                    field: "Openings",
                })
        };
        if let Some(shape) = RoomShape::from_id(id) {
            return Ok(MonumentPiece::Room {
                shape,
                openings: openings()?,
            });
        }
        Ok(match id {
            "OMB" => MonumentPiece::Building,
            "OMCR" => MonumentPiece::Core,
            "OMSimple" => MonumentPiece::Simple {
                openings: openings()?,
                design: persist::int_or(tag, "Design", 0),
            },
            "OMWR" => MonumentPiece::Wing {
                design: persist::int_or(tag, "Design", 0),
                elder_spawned: persist::flag(tag, "Elder"),
            },
            "OMPenthouse" => MonumentPiece::Penthouse {
                elder_spawned: persist::flag(tag, "Elder"),
            },
            other => return Err(persist::unknown(other)),
        })
    }

    pub fn paint(&mut self, p: &mut Painter<'_>) {
        let (w, h, d) = p.local_size();
        match self {
            MonumentPiece::Building => {
                // outer walls only; the rooms paint the inside
                for (x0, z0, x1, z1) in [(0, 0, w - 1, 0), (0, d - 1, w - 1, d - 1), (0, 1, 0, d - 2), (w - 1, 1, w - 1, d - 2)] {
                    p.fill(Material::Prismarine, x0, 0, z0, x1, h - 1, z1);
                }
                p.fill(Material::Water, 24, 1, 0, 33, 6, 0);
                for (x, z) in [(0, 0), (w - 1, 0), (0, d - 1), (w - 1, d - 1)] {
                    p.place(Material::SeaLantern, x, h - 1, z);
                }
            }
            MonumentPiece::Core => {
                p.hollow(Material::DarkPrismarine, Material::Water);
                p.fill(Material::PrismarineBricks, 6, 1, 6, 9, 6, 9);
                p.fill(Material::SeaLantern, 7, 3, 7, 8, 4, 8);
            }
            MonumentPiece::Room { shape, openings } => {
                let shape = *shape;
                if shape == RoomShape::Entry {
                    paint_entry(p, openings.first().copied().unwrap_or(0));
                    return;
                }
                room_shell(p, w, h, d);
                for (mask, offset) in openings.iter().zip(shape.cell_offsets()) {
                    carve_openings(p, *mask, *offset);
                }
                if shape == RoomShape::SimpleTop {
                    p.fill(Material::DarkPrismarine, 1, h - 1, 1, w - 2, h - 1, d - 2);
                    p.fill(Material::SeaLantern, 3, h - 1, 3, 4, h - 1, 4);
                }
            }
            MonumentPiece::Simple { openings, design } => {
                room_shell(p, w, h, d);
                for (mask, offset) in openings.iter().zip(RoomShape::Entry.cell_offsets()) {
                    carve_openings(p, *mask, *offset);
                }
                match design {
                    0 => p.fill(Material::SeaLantern, 3, 1, 3, 4, 1, 4),
                    1 => {
                        for (x, z) in [(1, 1), (1, 6), (6, 1), (6, 6)] {
                            p.fill(Material::DarkPrismarine, x, 1, z, x, 2, z);
                        }
                    }
                    _ => p.fill(Material::PrismarineBricks, 2, 1, 2, 5, 1, 5),
                }
            }
            MonumentPiece::Wing {
                design,
                elder_spawned,
            } => {
                p.shell(Material::PrismarineBricks, Material::Water, 0, 0, 0, w - 1, h - 1, d - 1);
                if *design == 0 {
                    for x in [3, w - 4] {
                        for z in (3..d - 3).step_by(4) {
                            p.fill(Material::Prismarine, x, 1, z, x, h - 2, z);
                        }
                    }
                    *elder_spawned = p.spawn_entity(11, 2, 16, EntityKind::ElderGuardian, *elder_spawned);
                } else {
                    p.fill(Material::DarkPrismarine, 5, 1, 5, w - 6, 4, d - 6);
                    p.fill(Material::SeaLantern, 10, 4, 12, 12, 4, 14);
                    *elder_spawned = p.spawn_entity(11, 5, 13, EntityKind::ElderGuardian, *elder_spawned);
                }
            }
            MonumentPiece::Penthouse { elder_spawned } => {
                p.fill(Material::Water, 1, 1, 1, w - 2, h - 1, d - 2);
                p.fill(Material::PrismarineBricks, 0, 0, 0, 0, 0, 13);
                p.fill(Material::PrismarineBricks, 13, 0, 0, 13, 0, 13);
                p.fill(Material::PrismarineBricks, 1, 0, 0, 12, 0, 0);
                p.fill(Material::PrismarineBricks, 1, 0, 13, 12, 0, 13);
                for i in (2..=11).step_by(3) {
                    p.place(Material::SeaLantern, 0, 0, i);
                    p.place(Material::SeaLantern, 13, 0, i);
                    p.place(Material::SeaLantern, i, 0, 0);
                }
                p.fill(Material::PrismarineBricks, 2, 0, 3, 4, 0, 9);
                p.fill(Material::PrismarineBricks, 9, 0, 3, 11, 0, 9);
                p.fill(Material::PrismarineBricks, 4, 0, 9, 9, 0, 11);
                p.fill(Material::DarkPrismarine, 3, 0, 3, 3, 0, 7);
                p.fill(Material::DarkPrismarine, 10, 0, 3, 10, 0, 7);
                p.fill(Material::DarkPrismarine, 6, 0, 10, 7, 0, 10);
                for x in [3, 10] {
                    for z in (2..=8).step_by(3) {
                        p.fill(Material::PrismarineBricks, x, 0, z, x, 2, z);
                    }
                }
                p.fill(Material::PrismarineBricks, 5, 0, 10, 5, 2, 10);
                p.fill(Material::PrismarineBricks, 8, 0, 10, 8, 2, 10);
                *elder_spawned = p.spawn_entity(6, 1, 6, EntityKind::ElderGuardian, *elder_spawned);
            }
        }
    }
}

fn room_shell(p: &mut Painter<'_>, w: i32, h: i32, d: i32) {
    p.shell(Material::PrismarineBricks, Material::Water, 0, 0, 0, w - 1, h - 1, d - 1);
    p.fill(Material::Prismarine, 0, 0, 0, w - 1, 0, d - 1);
}

/// Opens the faces set in `mask` for the cell whose local origin is
/// `offset`. Lattice north runs along local +z.
fn carve_openings(p: &mut Painter<'_>, mask: i32, (ox, oy, oz): (i32, i32, i32)) {
    let open = |dir: Direction| mask & (1 << dir.data_3d()) != 0;
    if open(Direction::North) {
        p.fill(Material::Water, ox + 3, oy + 1, oz + 7, ox + 4, oy + 2, oz + 7);
    }
    if open(Direction::South) {
        p.fill(Material::Water, ox + 3, oy + 1, oz, ox + 4, oy + 2, oz);
    }
    if open(Direction::West) {
        p.fill(Material::Water, ox, oy + 1, oz + 3, ox, oy + 2, oz + 4);
    }
    if open(Direction::East) {
        p.fill(Material::Water, ox + 7, oy + 1, oz + 3, ox + 7, oy + 2, oz + 4);
    }
    if open(Direction::Up) {
        p.fill(Material::Water, ox + 3, oy + 3, oz + 3, ox + 4, oy + 3, oz + 4);
    }
    if open(Direction::Down) {
        p.fill(Material::Water, ox + 3, oy, oz + 3, ox + 4, oy, oz + 4);
    }
}

fn paint_entry(p: &mut Painter<'_>, mask: i32) {
    let light = Material::PrismarineBricks;
    p.fill(light, 0, 3, 0, 2, 3, 7);
    p.fill(light, 5, 3, 0, 7, 3, 7);
    p.fill(light, 0, 2, 0, 1, 2, 7);
    p.fill(light, 6, 2, 0, 7, 2, 7);
    p.fill(light, 0, 1, 0, 0, 1, 7);
    p.fill(light, 7, 1, 0, 7, 1, 7);
    p.fill(light, 0, 1, 7, 7, 3, 7);
    p.fill(light, 1, 1, 0, 2, 3, 0);
    p.fill(light, 5, 1, 0, 6, 3, 0);
    let open = |dir: Direction| mask & (1 << dir.data_3d()) != 0;
    if open(Direction::North) {
        p.fill(Material::Water, 3, 1, 7, 4, 2, 7);
    }
    if open(Direction::West) {
        p.fill(Material::Water, 0, 1, 3, 1, 2, 4);
    }
    if open(Direction::East) {
        p.fill(Material::Water, 6, 1, 3, 7, 2, 4);
    }
}

// ---------------------------------------------------------------------------
// Fitting
// ---------------------------------------------------------------------------

/// Box of a room covering `cells` lattice cells from `slot`'s position.
fn room_box(graph: &RoomGraph, slot: Slot, cells: (i32, i32, i32), facing: Direction, anchor: BlockPos) -> BoundingBox {
    let (x, y, z) = graph.rooms[slot].coords();
    let (sx, sy, sz) = cells;
    let base = BoundingBox::make(0, 0, 0, facing, sx * CELL.0, sy * CELL.1, sz * CELL.2);
    let local = match facing {
        Direction::North => base.moved(x * 8, y * 4, -(z + sz) * 8 + 1),
        Direction::South => base.moved(x * 8, y * 4, z * 8),
        Direction::West => base.moved(-(z + sz) * 8 + 1, y * 4, x * 8),
        _ => base.moved(z * 8, y * 4, x * 8),
    };
    local.moved(anchor.x, anchor.y, anchor.z)
}

/// Walks `path` faces from `slot`; `None` when a link is missing.
fn follow(graph: &RoomGraph, slot: Slot, path: &[Direction]) -> Option<Slot> {
    path.iter().try_fold(slot, |at, dir| graph.neighbour(at, *dir))
}

fn open_and_free(graph: &RoomGraph, slot: Slot, dir: Direction) -> bool {
    graph.rooms[slot].has_opening(dir)
        && graph
            .neighbour(slot, dir)
            .is_some_and(|other| !graph.rooms[other].claimed)
}

/// The first shape that fits at `slot`, with the cells it covers.
fn fit(graph: &RoomGraph, slot: Slot) -> Option<(Option<RoomShape>, Vec<Slot>)> {
    use Direction::{East, North, Up};

    let paths: &[&[Direction]];
    let room = &graph.rooms[slot];
    let shape = if open_and_free(graph, slot, East)
        && open_and_free(graph, slot, Up)
        && follow(graph, slot, &[East]).is_some_and(|e| open_and_free(graph, e, Up))
    {
        paths = &[&[], &[East], &[Up], &[East, Up]];
        Some(RoomShape::DoubleXY)
    } else if open_and_free(graph, slot, North)
        && open_and_free(graph, slot, Up)
        && follow(graph, slot, &[North]).is_some_and(|n| open_and_free(graph, n, Up))
    {
        paths = &[&[], &[North], &[Up], &[North, Up]];
        Some(RoomShape::DoubleYZ)
    } else if open_and_free(graph, slot, North) {
        paths = &[&[], &[North]];
        Some(RoomShape::DoubleZ)
    } else if open_and_free(graph, slot, East) {
        paths = &[&[], &[East]];
        Some(RoomShape::DoubleX)
    } else if open_and_free(graph, slot, Up) {
        paths = &[&[], &[Up]];
        Some(RoomShape::DoubleY)
    } else if [Direction::West, East, North, Direction::South, Up]
        .iter()
        .all(|d| !room.has_opening(*d))
    {
        paths = &[&[]];
        Some(RoomShape::SimpleTop)
    } else {
        paths = &[&[]];
        None
    };
    let cells = paths
        .iter()
        .map(|path| follow(graph, slot, path))
        .collect::<Option<Vec<_>>>()?;
    Some((shape, cells))
}

pub fn generate(
    _config: &MonumentConfig,
    rng: &mut dyn RngCore,
    origin: BlockPos,
    facing: Direction,
) -> Result<Vec<Piece>, StructureError> {
    let (bw, bh, bd) = BUILDING_SIZE;
    let building = BoundingBox::make(origin.x, origin.y, origin.z, facing, bw, bh, bd);
    let orientation = Some(facing);
    let (lx, ly, lz) = LATTICE_ORIGIN;
    let anchor = building.world_pos(orientation, lx, ly, lz);

    let mut graph = RoomGraph::generate(rng);
    let source = graph.source;
    graph.rooms[source].claimed = true;

    let mut pieces = vec![Piece::new(PieceData::Monument(MonumentPiece::Building), building, orientation, 0)];
    let room = |data: MonumentPiece, bbox: BoundingBox| Piece::new(PieceData::Monument(data), bbox, orientation, 1);

    let entry = MonumentPiece::Room {
        shape: RoomShape::Entry,
        openings: vec![graph.rooms[source].opening_mask()],
    };
    pieces.push(room(entry, room_box(&graph, source, (1, 1, 1), facing, anchor)));
    pieces.push(room(MonumentPiece::Core, room_box(&graph, graph.core, (2, 2, 2), facing, anchor)));

    for slot in graph.order.clone() {
        if graph.rooms[slot].claimed || graph.rooms[slot].is_special() {
            continue;
        }
        let Some((shape, cells)) = fit(&graph, slot) else {
            continue;
        };
        for &cell in &cells {
            graph.rooms[cell].claimed = true;
        }
        let openings: Vec<i32> = cells.iter().map(|&c| graph.rooms[c].opening_mask()).collect();
        let (data, size) = match shape {
            Some(shape) => (MonumentPiece::Room { shape, openings }, shape.cells()),
            None => (
                MonumentPiece::Simple {
                    openings,
                    design: rng.next_int(3),
                },
                (1, 1, 1),
            ),
        };
        pieces.push(room(data, room_box(&graph, slot, size, facing, anchor)));
    }

    let local_box = |min: (i32, i32, i32), max: (i32, i32, i32)| building.world_box(orientation, min, max);
    let wing_seed = rng.next_i32();
    for (i, (min, max)) in [((1, 1, 1), (23, 8, 21)), ((34, 1, 1), (56, 8, 21))].into_iter().enumerate() {
        let design = wing_seed.wrapping_add(i as i32) & 1;
        let wing = MonumentPiece::Wing {
            design,
            elder_spawned: false,
        };
        pieces.push(room(wing, local_box(min, max)));
    }
    let penthouse = MonumentPiece::Penthouse { elder_spawned: false };
    pieces.push(room(penthouse, local_box((22, 13, 22), (35, 17, 35))));

    debug!(pieces = pieces.len(), "monument generated");
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn monument(seed: u64, facing: Direction) -> Vec<Piece> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(&MonumentConfig::default(), &mut rng, BlockPos::new(0, 39, 0), facing).unwrap()
    }

    #[test]
    fn building_encloses_every_room() {
        for facing in Direction::HORIZONTAL {
            let pieces = monument(6, facing);
            assert_eq!(pieces[0].id(), "OMB");
            assert!(pieces[0].is_enclosure());
            let building = pieces[0].bbox;
            assert_eq!((building.x_span(), building.y_span(), building.z_span()), (58, 23, 58));
            for piece in &pieces[1..] {
                assert!(building.contains_box(&piece.bbox), "{} escapes the building", piece.id());
            }
        }
    }

    #[test]
    fn rooms_never_overlap() {
        for facing in Direction::HORIZONTAL {
            let pieces = monument(2, facing);
            let rooms = &pieces[1..];
            for (i, a) in rooms.iter().enumerate() {
                for b in &rooms[i + 1..] {
                    assert!(!a.bbox.intersects(&b.bbox), "{} overlaps {}", a.id(), b.id());
                }
            }
        }
    }

    #[test]
    fn fixed_rooms_are_present() {
        let pieces = monument(9, Direction::North);
        let count = |id: &str| pieces.iter().filter(|p| p.id() == id).count();
        assert_eq!(count("OMEntry"), 1);
        assert_eq!(count("OMCR"), 1);
        assert_eq!(count("OMWR"), 2);
        assert_eq!(count("OMPenthouse"), 1);
    }

    #[test]
    fn every_lattice_cell_is_covered_once() {
        // 46 lattice rooms: entry 1 + core 8 + the fitted rest
        let pieces = monument(12, Direction::East);
        let cells: i32 = pieces
            .iter()
            .map(|p| match &p.data {
                PieceData::Monument(MonumentPiece::Room { shape, .. }) => {
                    let (x, y, z) = shape.cells();
                    x * y * z
                }
                PieceData::Monument(MonumentPiece::Simple { .. }) => 1,
                PieceData::Monument(MonumentPiece::Core) => 8,
                _ => 0,
            })
            .sum();
        assert_eq!(cells, 46);
    }

    #[test]
    fn wings_take_consecutive_designs() {
        let pieces = monument(3, Direction::South);
        let designs: Vec<i32> = pieces
            .iter()
            .filter_map(|p| match p.data {
                PieceData::Monument(MonumentPiece::Wing { design, .. }) => Some(design),
                _ => None,
            })
            .collect();
        assert_eq!(designs.len(), 2);
        assert_ne!(designs[0], designs[1]);
    }

    #[test]
    fn room_state_roundtrip() {
        let piece = MonumentPiece::Room {
            shape: RoomShape::DoubleXY,
            openings: vec![0b100100, 0, 3, 0b010000],
        };
        let mut tag = NbtCompound::new();
        piece.save(&mut tag);
        assert_eq!(MonumentPiece::load("OMDXYR", &tag).unwrap(), piece);

        let wing = MonumentPiece::Wing {
            design: 1,
            elder_spawned: true,
        };
        let mut tag = NbtCompound::new();
        wing.save(&mut tag);
        assert_eq!(MonumentPiece::load("OMWR", &tag).unwrap(), wing);
    }

    #[test]
    fn rooms_need_openings() {
        assert!(matches!(
            MonumentPiece::load("OMSimple", &NbtCompound::new()),
            Err(StructureError::MissingField { field: "Openings", .. })
        ));
    }
}

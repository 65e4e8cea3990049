//! Strongholds: stone brick corridors around one end portal room.
//!
//! Generation starts at a spiral staircase that forces a five-way crossing
//! as its first child. Kinds never repeat back to back, libraries and the
//! portal room only appear deep in the tree, and the whole layout is
//! regrown until a portal room has been placed.

use mc_rs_nbt::NbtCompound;
use rand::RngCore;
use tracing::{debug, warn};

use crate::allocator;
use crate::builder::{exit_anchor, select_piece, BuildContext, Exit, Limits, Selection};
use crate::catalog::{Catalog, PieceWeight, WeightTable};
use crate::config::StrongholdConfig;
use crate::direction::Direction;
use crate::error::StructureError;
use crate::geometry::{BlockPos, BoundingBox};
use crate::persist;
use crate::piece::{Piece, PieceData, PieceId};
use crate::random::StructureRng;
use crate::realize::{loot, EntityKind, Material, Painter};

pub const IDS: &[&str] = &[
    "SHCC", "SHFC", "SH5C", "SHLT", "SHLi", "SHPR", "SHPH", "SHRT", "SHRC", "SHSD", "SHStart", "SHS",
    "SHSSD",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrongholdKind {
    Straight,
    PrisonHall,
    LeftTurn,
    RightTurn,
    RoomCrossing,
    StraightStairsDown,
    StairsDown,
    FiveCrossing,
    ChestCorridor,
    Library,
    PortalRoom,
}

impl StrongholdKind {
    /// Local offsets plus width, height and depth of the kind's box.
    fn geometry(self) -> (i32, i32, i32, i32, i32) {
        match self {
            StrongholdKind::Straight | StrongholdKind::ChestCorridor => (-1, -1, 5, 5, 7),
            StrongholdKind::PrisonHall => (-1, -1, 9, 5, 11),
            StrongholdKind::LeftTurn | StrongholdKind::RightTurn => (-1, -1, 5, 5, 5),
            StrongholdKind::RoomCrossing => (-4, -1, 11, 7, 11),
            StrongholdKind::StraightStairsDown => (-1, -7, 5, 11, 8),
            StrongholdKind::StairsDown => (-1, -7, 5, 11, 5),
            StrongholdKind::FiveCrossing => (-4, -3, 10, 9, 11),
            StrongholdKind::Library => (-4, -1, 14, 11, 15),
            StrongholdKind::PortalRoom => (-4, -1, 11, 8, 16),
        }
    }
}

/// The doorway a piece is entered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmallDoor {
    #[default]
    Opening,
    WoodDoor,
    Grates,
    IronDoor,
}

impl SmallDoor {
    fn random(rng: &mut dyn RngCore) -> Self {
        match rng.next_int(5) {
            2 => SmallDoor::WoodDoor,
            3 => SmallDoor::Grates,
            4 => SmallDoor::IronDoor,
            _ => SmallDoor::Opening,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SmallDoor::Opening => "OPENING",
            SmallDoor::WoodDoor => "WOOD_DOOR",
            SmallDoor::Grates => "GRATES",
            SmallDoor::IronDoor => "IRON_DOOR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "OPENING" => SmallDoor::Opening,
            "WOOD_DOOR" => SmallDoor::WoodDoor,
            "GRATES" => SmallDoor::Grates,
            "IRON_DOOR" => SmallDoor::IronDoor,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrongholdPiece {
    /// The source staircase at the root of the tree.
    Start,
    Straight { door: SmallDoor, left: bool, right: bool },
    PrisonHall { door: SmallDoor },
    LeftTurn { door: SmallDoor },
    RightTurn { door: SmallDoor },
    RoomCrossing { door: SmallDoor, room_type: i32, chest_placed: bool },
    StraightStairsDown { door: SmallDoor },
    StairsDown { door: SmallDoor },
    FiveCrossing {
        door: SmallDoor,
        left_low: bool,
        left_high: bool,
        right_low: bool,
        right_high: bool,
    },
    ChestCorridor { door: SmallDoor, chest_placed: bool },
    Library {
        door: SmallDoor,
        tall: bool,
        chest_placed: bool,
        upper_chest_placed: bool,
    },
    PortalRoom { spawner_placed: bool },
    FillerCorridor { steps: i32 },
}

impl StrongholdPiece {
    pub fn kind(&self) -> Option<StrongholdKind> {
        Some(match self {
            StrongholdPiece::Start | StrongholdPiece::FillerCorridor { .. } => return None,
            StrongholdPiece::Straight { .. } => StrongholdKind::Straight,
            StrongholdPiece::PrisonHall { .. } => StrongholdKind::PrisonHall,
            StrongholdPiece::LeftTurn { .. } => StrongholdKind::LeftTurn,
            StrongholdPiece::RightTurn { .. } => StrongholdKind::RightTurn,
            StrongholdPiece::RoomCrossing { .. } => StrongholdKind::RoomCrossing,
            StrongholdPiece::StraightStairsDown { .. } => StrongholdKind::StraightStairsDown,
            StrongholdPiece::StairsDown { .. } => StrongholdKind::StairsDown,
            StrongholdPiece::FiveCrossing { .. } => StrongholdKind::FiveCrossing,
            StrongholdPiece::ChestCorridor { .. } => StrongholdKind::ChestCorridor,
            StrongholdPiece::Library { .. } => StrongholdKind::Library,
            StrongholdPiece::PortalRoom { .. } => StrongholdKind::PortalRoom,
        })
    }

    pub fn id(&self) -> &'static str {
        match self {
            StrongholdPiece::Start => "SHStart",
            StrongholdPiece::Straight { .. } => "SHS",
            StrongholdPiece::PrisonHall { .. } => "SHPH",
            StrongholdPiece::LeftTurn { .. } => "SHLT",
            StrongholdPiece::RightTurn { .. } => "SHRT",
            StrongholdPiece::RoomCrossing { .. } => "SHRC",
            StrongholdPiece::StraightStairsDown { .. } => "SHSSD",
            StrongholdPiece::StairsDown { .. } => "SHSD",
            StrongholdPiece::FiveCrossing { .. } => "SH5C",
            StrongholdPiece::ChestCorridor { .. } => "SHCC",
            StrongholdPiece::Library { .. } => "SHLi",
            StrongholdPiece::PortalRoom { .. } => "SHPR",
            StrongholdPiece::FillerCorridor { .. } => "SHFC",
        }
    }

    pub fn is_portal_room(&self) -> bool {
        matches!(self, StrongholdPiece::PortalRoom { .. })
    }

    pub fn entry_door(&self) -> SmallDoor {
        match *self {
            StrongholdPiece::Straight { door, .. }
            | StrongholdPiece::PrisonHall { door }
            | StrongholdPiece::LeftTurn { door }
            | StrongholdPiece::RightTurn { door }
            | StrongholdPiece::RoomCrossing { door, .. }
            | StrongholdPiece::StraightStairsDown { door }
            | StrongholdPiece::StairsDown { door }
            | StrongholdPiece::FiveCrossing { door, .. }
            | StrongholdPiece::ChestCorridor { door, .. }
            | StrongholdPiece::Library { door, .. } => door,
            StrongholdPiece::Start
            | StrongholdPiece::PortalRoom { .. }
            | StrongholdPiece::FillerCorridor { .. } => SmallDoor::Opening,
        }
    }

    pub fn save(&self, tag: &mut NbtCompound) {
        tag.put_string("EntryDoor", self.entry_door().name());
        match *self {
            StrongholdPiece::Start => tag.put_bool("Source", true),
            StrongholdPiece::StairsDown { .. } => tag.put_bool("Source", false),
            StrongholdPiece::Straight { left, right, .. } => {
                tag.put_bool("Left", left);
                tag.put_bool("Right", right);
            }
            StrongholdPiece::RoomCrossing {
                room_type, chest_placed, ..
            } => {
                tag.put_int("Type", room_type);
                tag.put_bool("Chest", chest_placed);
            }
            StrongholdPiece::FiveCrossing {
                left_low,
                left_high,
                right_low,
                right_high,
                ..
            } => {
                tag.put_bool("leftLow", left_low);
                tag.put_bool("leftHigh", left_high);
                tag.put_bool("rightLow", right_low);
                tag.put_bool("rightHigh", right_high);
            }
            StrongholdPiece::ChestCorridor { chest_placed, .. } => tag.put_bool("Chest", chest_placed),
            StrongholdPiece::Library {
                tall,
                chest_placed,
                upper_chest_placed,
                ..
            } => {
                tag.put_bool("Tall", tall);
                tag.put_bool("Chest", chest_placed);
                tag.put_bool("Chest2", upper_chest_placed);
            }
            StrongholdPiece::PortalRoom { spawner_placed } => tag.put_bool("Mob", spawner_placed),
            StrongholdPiece::FillerCorridor { steps } => tag.put_int("Steps", steps),
            StrongholdPiece::PrisonHall { .. }
            | StrongholdPiece::LeftTurn { .. }
            | StrongholdPiece::RightTurn { .. }
            | StrongholdPiece::StraightStairsDown { .. } => {}
        }
    }

    pub fn load(id: &str, tag: &NbtCompound) -> Result<Self, StructureError> {
        let door = match tag.get_str("EntryDoor") {
            None => SmallDoor::Opening,
            Some(name) => SmallDoor::from_name(name).ok_or_else(|| StructureError::MissingField {
                kind: id.to_string(),
                field: "EntryDoor",
            })?,
        };
        let flag = |key| persist::flag(tag, key);
        Ok(match id {
            "SHStart" => StrongholdPiece::Start,
            "SHS" => StrongholdPiece::Straight {
                door,
                left: flag("Left"),
                right: flag("Right"),
            },
            "SHPH" => StrongholdPiece::PrisonHall { door },
            "SHLT" => StrongholdPiece::LeftTurn { door },
            "SHRT" => StrongholdPiece::RightTurn { door },
            "SHRC" => StrongholdPiece::RoomCrossing {
                door,
                room_type: persist::int_or(tag, "Type", 0),
                chest_placed: flag("Chest"),
            },
            "SHSSD" => StrongholdPiece::StraightStairsDown { door },
            "SHSD" => StrongholdPiece::StairsDown { door },
            "SH5C" => StrongholdPiece::FiveCrossing {
                door,
                left_low: flag("leftLow"),
                left_high: flag("leftHigh"),
                right_low: flag("rightLow"),
                right_high: flag("rightHigh"),
            },
            "SHCC" => StrongholdPiece::ChestCorridor {
                door,
                chest_placed: flag("Chest"),
            },
            "SHLi" => StrongholdPiece::Library {
                door,
                tall: flag("Tall"),
                chest_placed: flag("Chest"),
                upper_chest_placed: flag("Chest2"),
            },
            "SHPR" => StrongholdPiece::PortalRoom {
                spawner_placed: flag("Mob"),
            },
            "SHFC" => StrongholdPiece::FillerCorridor {
                steps: persist::require_int(tag, id, "Steps")?,
            },
            other => return Err(persist::unknown(other)),
        })
    }

    // -----------------------------------------------------------------------
    // Paint
    // -----------------------------------------------------------------------

    pub fn paint(&mut self, p: &mut Painter<'_>) {
        use Material::{Air, StoneBricks as Bricks};

        let door = self.entry_door();
        let left_turn = turns_left(self, p.orientation());
        let (w, h, d) = p.local_size();
        match self {
            StrongholdPiece::Start | StrongholdPiece::StairsDown { .. } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 1, 7, 0);
                small_door(p, SmallDoor::Opening, 1, 1, 4);
                // spiral down from the entry at y 7 to the exit at y 1
                let steps = [(1, 6, 1), (2, 6, 1), (3, 5, 1), (3, 5, 2), (3, 4, 3), (2, 4, 3), (1, 3, 3), (1, 2, 2), (1, 1, 1)];
                for (x, y, z) in steps {
                    p.place(Bricks, x, y, z);
                }
            }
            StrongholdPiece::Straight { left, right, .. } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 1, 1, 0);
                small_door(p, SmallDoor::Opening, 1, 1, d - 1);
                if *left {
                    p.fill(Air, 0, 1, 2, 0, 3, 4);
                }
                if *right {
                    p.fill(Air, w - 1, 1, 2, w - 1, 3, 4);
                }
            }
            StrongholdPiece::PrisonHall { .. } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 1, 1, 0);
                p.fill(Air, 1, 1, d - 1, 3, 3, d - 1);
                p.fill(Bricks, 4, 1, 1, 4, 3, d - 2);
                for z in [3, 5, 7] {
                    p.fill(Material::IronBars, 4, 1, z, 4, 3, z);
                }
                p.fill(Material::IronBars, 5, 1, 4, w - 2, 3, 4);
                p.fill(Material::IronBars, 5, 1, 8, w - 2, 3, 8);
                p.place(Material::IronDoor, 4, 1, 2);
                p.place(Material::IronDoor, 4, 1, 8);
            }
            StrongholdPiece::LeftTurn { .. } | StrongholdPiece::RightTurn { .. } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 1, 1, 0);
                if left_turn {
                    p.fill(Air, 0, 1, 1, 0, 3, 3);
                } else {
                    p.fill(Air, w - 1, 1, 1, w - 1, 3, 3);
                }
            }
            StrongholdPiece::RoomCrossing {
                room_type, chest_placed, ..
            } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 4, 1, 0);
                p.fill(Air, 4, 1, d - 1, 6, 3, d - 1);
                p.fill(Air, 0, 1, 4, 0, 3, 6);
                p.fill(Air, w - 1, 1, 4, w - 1, 3, 6);
                match *room_type {
                    0 => {
                        p.fill(Bricks, 4, 1, 4, 6, 1, 6);
                        p.fill(Bricks, 5, 1, 5, 5, 3, 5);
                    }
                    1 => {
                        p.shell(Bricks, Air, 3, 1, 3, 7, 1, 7);
                        p.fill(Material::Water, 5, 1, 5, 5, 1, 5);
                    }
                    2 => {
                        p.fill(Material::Cobblestone, 1, 1, 1, 1, 1, d - 2);
                        p.fill(Material::Cobblestone, w - 2, 1, 1, w - 2, 1, d - 2);
                        p.fill(Material::OakPlanks, 1, 3, 7, w - 2, 3, d - 2);
                        *chest_placed = p.chest(3, 4, 8, loot::STRONGHOLD_CROSSING, *chest_placed);
                    }
                    _ => {
                        p.fill(Bricks, 5, 1, 3, 5, 4, 7);
                        p.fill(Bricks, 3, 1, 5, 7, 4, 5);
                    }
                }
            }
            StrongholdPiece::StraightStairsDown { .. } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 1, 7, 0);
                small_door(p, SmallDoor::Opening, 1, 1, d - 1);
                for step in 0..6 {
                    p.fill(Bricks, 1, 6 - step, 1 + step, 3, 6 - step, 1 + step);
                }
            }
            StrongholdPiece::FiveCrossing {
                left_low,
                left_high,
                right_low,
                right_high,
                ..
            } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 4, 3, 0);
                p.fill(Air, 4, 1, d - 1, 6, 3, d - 1);
                if *left_low {
                    p.fill(Air, 0, 3, 1, 0, 5, 3);
                }
                if *right_low {
                    p.fill(Air, w - 1, 3, 1, w - 1, 5, 3);
                }
                if *left_high {
                    p.fill(Air, 0, 5, 7, 0, 7, 9);
                }
                if *right_high {
                    p.fill(Air, w - 1, 5, 7, w - 1, 7, 9);
                }
                p.fill(Bricks, 1, 4, 5, w - 2, 4, d - 2);
                p.fill(Air, 4, 4, 5, 6, 4, 6);
            }
            StrongholdPiece::ChestCorridor { chest_placed, .. } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 1, 1, 0);
                small_door(p, SmallDoor::Opening, 1, 1, d - 1);
                p.fill(Bricks, 3, 1, 2, 3, 1, 4);
                *chest_placed = p.chest(3, 2, 3, loot::STRONGHOLD_CORRIDOR, *chest_placed);
            }
            StrongholdPiece::Library {
                tall,
                chest_placed,
                upper_chest_placed,
                ..
            } => {
                p.hollow(Bricks, Air);
                small_door(p, door, 4, 1, 0);
                let shelf_top = if *tall { h - 2 } else { 3 };
                p.fill(Material::Bookshelf, 1, 1, 1, 1, shelf_top, d - 2);
                p.fill(Material::Bookshelf, w - 2, 1, 1, w - 2, shelf_top, d - 2);
                p.fill(Material::Bookshelf, 2, 1, d - 2, w - 3, shelf_top, d - 2);
                *chest_placed = p.chest(3, 3, 5, loot::STRONGHOLD_LIBRARY, *chest_placed);
                if *tall {
                    p.shell(Material::OakPlanks, Air, 2, 5, 2, w - 3, 5, d - 3);
                    p.fill(Air, 3, 5, 3, w - 4, 5, d - 4);
                    p.fill(Material::OakFence, 2, 6, 2, w - 3, 6, 2);
                    *upper_chest_placed =
                        p.chest(12, 9, 1, loot::STRONGHOLD_LIBRARY, *upper_chest_placed);
                }
            }
            StrongholdPiece::PortalRoom { spawner_placed } => {
                p.hollow(Bricks, Air);
                small_door(p, SmallDoor::Grates, 4, 1, 0);
                p.fill(Bricks, 4, 1, 5, 6, 1, 7);
                p.fill(Bricks, 4, 2, 6, 6, 2, 7);
                p.fill(Bricks, 4, 3, 7, 6, 3, 7);
                p.fill(Material::Lava, 4, 1, 9, 6, 1, 11);
                for x in 4..=6 {
                    p.place(Material::EndPortalFrame, x, 3, 8);
                    p.place(Material::EndPortalFrame, x, 3, 12);
                }
                for z in 9..=11 {
                    p.place(Material::EndPortalFrame, 3, 3, z);
                    p.place(Material::EndPortalFrame, 7, 3, z);
                }
                *spawner_placed = p.spawner(5, 3, 6, EntityKind::Silverfish, *spawner_placed);
            }
            StrongholdPiece::FillerCorridor { steps } => {
                for z in 0..*steps {
                    p.fill(Bricks, 0, 0, z, 4, 0, z);
                    p.fill(Bricks, 0, 4, z, 4, 4, z);
                    p.fill(Bricks, 0, 1, z, 0, 3, z);
                    p.fill(Bricks, 4, 1, z, 4, 3, z);
                    p.fill(Air, 1, 1, z, 3, 3, z);
                }
            }
        }
    }
}

/// Whether a turn piece opens through its left wall.
fn turns_left(piece: &StrongholdPiece, facing: Option<Direction>) -> bool {
    let north_or_east = matches!(facing, Some(Direction::North | Direction::East));
    match piece {
        StrongholdPiece::LeftTurn { .. } => north_or_east,
        _ => !north_or_east,
    }
}

fn small_door(p: &mut Painter<'_>, door: SmallDoor, x: i32, y: i32, z: i32) {
    let frame = |p: &mut Painter<'_>| {
        for dy in 0..=2 {
            p.place(Material::StoneBricks, x, y + dy, z);
            p.place(Material::StoneBricks, x + 2, y + dy, z);
        }
        p.place(Material::StoneBricks, x + 1, y + 2, z);
    };
    match door {
        SmallDoor::Opening => p.fill(Material::Air, x, y, z, x + 2, y + 2, z),
        SmallDoor::WoodDoor => {
            frame(p);
            p.fill(Material::OakDoor, x + 1, y, z, x + 1, y + 1, z);
        }
        SmallDoor::Grates => {
            p.fill(Material::IronBars, x, y, z, x + 2, y + 2, z);
            p.fill(Material::Air, x + 1, y, z, x + 1, y + 1, z);
        }
        SmallDoor::IronDoor => {
            frame(p);
            p.fill(Material::IronDoor, x + 1, y, z, x + 1, y + 1, z);
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub fn catalog() -> Result<Catalog<StrongholdKind>, StructureError> {
    use StrongholdKind::*;
    Ok(Catalog::new(vec![
        PieceWeight::new(Straight, 40, 0),
        PieceWeight::new(PrisonHall, 5, 5),
        PieceWeight::new(LeftTurn, 20, 0),
        PieceWeight::new(RightTurn, 20, 0),
        PieceWeight::new(RoomCrossing, 10, 6),
        PieceWeight::new(StraightStairsDown, 5, 5),
        PieceWeight::new(StairsDown, 5, 5),
        PieceWeight::new(FiveCrossing, 5, 4),
        PieceWeight::new(ChestCorridor, 5, 4),
        PieceWeight::new(Library, 10, 2).deeper_than(4),
        PieceWeight::new(PortalRoom, 20, 1).deeper_than(5),
    ])?
    .with_finite_quota_rule())
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

struct StrongholdBuild<'c> {
    table: WeightTable<StrongholdKind>,
    previous: Option<StrongholdKind>,
    config: &'c StrongholdConfig,
}

impl StrongholdBuild<'_> {
    fn add_children(&mut self, ctx: &mut BuildContext<'_>, id: PieceId) {
        let parent = ctx.piece(id);
        let (bbox, depth) = (parent.bbox, parent.depth);
        let Some(facing) = parent.orientation else {
            return;
        };
        let PieceData::Stronghold(data) = &parent.data else {
            return;
        };

        let forward = |x, y| Exit::Forward { x, y };
        let left = |y, z| Exit::Left { y, z };
        let right = |y, z| Exit::Right { y, z };
        let mut exits = Vec::new();
        match *data {
            StrongholdPiece::Start => {
                self.table.impose(StrongholdKind::FiveCrossing);
                exits.push(forward(1, 1));
            }
            StrongholdPiece::Straight {
                left: to_left,
                right: to_right,
                ..
            } => {
                exits.push(forward(1, 1));
                if to_left {
                    exits.push(left(1, 2));
                }
                if to_right {
                    exits.push(right(1, 2));
                }
            }
            StrongholdPiece::PrisonHall { .. }
            | StrongholdPiece::ChestCorridor { .. }
            | StrongholdPiece::StraightStairsDown { .. }
            | StrongholdPiece::StairsDown { .. } => exits.push(forward(1, 1)),
            StrongholdPiece::LeftTurn { .. } | StrongholdPiece::RightTurn { .. } => {
                if turns_left(data, Some(facing)) {
                    exits.push(left(1, 1));
                } else {
                    exits.push(right(1, 1));
                }
            }
            StrongholdPiece::RoomCrossing { .. } => {
                exits.extend([forward(4, 1), left(1, 4), right(1, 4)]);
            }
            StrongholdPiece::FiveCrossing {
                left_low,
                left_high,
                right_low,
                right_high,
                ..
            } => {
                let (low, high) = match facing {
                    Direction::West | Direction::North => (5, 3),
                    _ => (3, 5),
                };
                exits.push(forward(5, 1));
                if left_low {
                    exits.push(left(low, 1));
                }
                if left_high {
                    exits.push(left(high, 7));
                }
                if right_low {
                    exits.push(right(low, 1));
                }
                if right_high {
                    exits.push(right(high, 7));
                }
            }
            StrongholdPiece::Library { .. }
            | StrongholdPiece::PortalRoom { .. }
            | StrongholdPiece::FillerCorridor { .. } => {}
        }

        for exit in exits {
            let (anchor, dir) = exit_anchor(&bbox, facing, exit);
            self.add_child(ctx, anchor, dir, depth + 1);
        }
    }

    fn add_child(&mut self, ctx: &mut BuildContext<'_>, anchor: BlockPos, facing: Direction, depth: u32) {
        if depth > ctx.limits.max_depth || !ctx.within_radius(anchor) {
            return;
        }
        let config: &StrongholdConfig = self.config;
        let Self { table, previous, .. } = self;
        let selection = select_piece(ctx, table, previous, anchor, facing, depth, |ctx, kind, anchor, facing, depth| {
            create(ctx, config, kind, anchor, facing, depth)
        });
        let piece = match selection {
            Selection::Placed(piece) => Some(piece),
            Selection::Exhausted => None,
            Selection::NoFit => filler(ctx, config, anchor, facing, depth),
        };
        if let Some(piece) = piece {
            ctx.push_pending(piece);
        }
    }
}

fn create(
    ctx: &mut BuildContext<'_>,
    config: &StrongholdConfig,
    kind: StrongholdKind,
    anchor: BlockPos,
    facing: Direction,
    depth: u32,
) -> Option<Piece> {
    let (ox, oy, w, h, d) = kind.geometry();
    let oriented = |height| BoundingBox::orient_box(anchor.x, anchor.y, anchor.z, ox, oy, 0, w, height, d, facing);
    let bbox = if kind == StrongholdKind::Library {
        config
            .library_heights
            .iter()
            .find_map(|&height| ctx.accepts(oriented(height)))?
    } else {
        ctx.accepts(oriented(h))?
    };

    let data = match kind {
        StrongholdKind::PortalRoom => StrongholdPiece::PortalRoom {
            spawner_placed: false,
        },
        _ => {
            let door = SmallDoor::random(ctx.rng());
            match kind {
                StrongholdKind::Straight => {
                    let left = ctx.rng().next_int(2) == 0;
                    let right = ctx.rng().next_int(2) == 0;
                    StrongholdPiece::Straight { door, left, right }
                }
                StrongholdKind::PrisonHall => StrongholdPiece::PrisonHall { door },
                StrongholdKind::LeftTurn => StrongholdPiece::LeftTurn { door },
                StrongholdKind::RightTurn => StrongholdPiece::RightTurn { door },
                StrongholdKind::RoomCrossing => StrongholdPiece::RoomCrossing {
                    door,
                    room_type: ctx.rng().next_int(5),
                    chest_placed: false,
                },
                StrongholdKind::StraightStairsDown => StrongholdPiece::StraightStairsDown { door },
                StrongholdKind::StairsDown => StrongholdPiece::StairsDown { door },
                StrongholdKind::FiveCrossing => {
                    let rng = ctx.rng();
                    StrongholdPiece::FiveCrossing {
                        door,
                        left_low: rng.next_bool(),
                        left_high: rng.next_bool(),
                        right_low: rng.next_bool(),
                        right_high: rng.next_int(3) > 0,
                    }
                }
                StrongholdKind::ChestCorridor => StrongholdPiece::ChestCorridor {
                    door,
                    chest_placed: false,
                },
                StrongholdKind::Library => StrongholdPiece::Library {
                    door,
                    tall: bbox.y_span() > 6,
                    chest_placed: false,
                    upper_chest_placed: false,
                },
                StrongholdKind::PortalRoom => return None,
            }
        }
    };
    Some(Piece::new(PieceData::Stronghold(data), bbox, Some(facing), depth))
}

/// Plugs a doorway with the longest corridor that still fits.
fn filler(
    ctx: &mut BuildContext<'_>,
    config: &StrongholdConfig,
    anchor: BlockPos,
    facing: Direction,
    depth: u32,
) -> Option<Piece> {
    let (steps, bbox) = allocator::shrink_to_fit(
        &ctx.pieces,
        config.filler_lengths.iter().copied(),
        config.filler_floor_y,
        |len| BoundingBox::orient_box(anchor.x, anchor.y, anchor.z, -1, -1, 0, 5, 5, len, facing),
    )?;
    Some(Piece::new(
        PieceData::Stronghold(StrongholdPiece::FillerCorridor { steps }),
        bbox,
        Some(facing),
        depth,
    ))
}

fn grow(
    config: &StrongholdConfig,
    catalog: &Catalog<StrongholdKind>,
    rng: &mut dyn RngCore,
    limits: Limits,
    origin: BlockPos,
    facing: Direction,
) -> Vec<Piece> {
    let (_, _, w, h, d) = StrongholdKind::StairsDown.geometry();
    let bbox = BoundingBox::make(origin.x, origin.y, origin.z, facing, w, h, d);
    let start = Piece::new(PieceData::Stronghold(StrongholdPiece::Start), bbox, Some(facing), 0);

    let mut build = StrongholdBuild {
        table: catalog.instantiate(),
        previous: None,
        config,
    };
    let mut ctx = BuildContext::new(rng, limits, start);
    build.add_children(&mut ctx, PieceId(0));
    while let Some(id) = ctx.pop_random_pending() {
        build.add_children(&mut ctx, id);
    }
    ctx.into_pieces()
}

/// Index of the portal room, if one was placed.
pub fn portal_room(pieces: &[Piece]) -> Option<PieceId> {
    pieces
        .iter()
        .position(|p| matches!(&p.data, PieceData::Stronghold(s) if s.is_portal_room()))
        .map(PieceId)
}

pub fn generate(
    config: &StrongholdConfig,
    rng: &mut dyn RngCore,
    origin: BlockPos,
    facing: Direction,
) -> Result<Vec<Piece>, StructureError> {
    let catalog = catalog()?;
    let limits = config.bounds.limits();
    let mut restarts = 0;
    loop {
        let pieces = grow(config, &catalog, rng, limits, origin, facing);
        let found = portal_room(&pieces).is_some();
        if found || restarts >= config.max_restarts {
            if !found {
                warn!(restarts, "stronghold has no portal room");
            }
            debug!(pieces = pieces.len(), restarts, "stronghold generated");
            return Ok(pieces);
        }
        restarts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stronghold(seed: u64) -> Vec<Piece> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(&StrongholdConfig::default(), &mut rng, BlockPos::new(0, 64, 0), Direction::North).unwrap()
    }

    fn kind_of(piece: &Piece) -> Option<StrongholdKind> {
        match &piece.data {
            PieceData::Stronghold(s) => s.kind(),
            _ => None,
        }
    }

    #[test]
    fn start_forces_a_five_crossing() {
        for seed in 0..4 {
            let pieces = stronghold(seed);
            assert_eq!(pieces[0].id(), "SHStart");
            assert_eq!(kind_of(&pieces[1]), Some(StrongholdKind::FiveCrossing));
        }
    }

    #[test]
    fn portal_room_is_placed_once_and_deep() {
        for seed in 0..4 {
            let pieces = stronghold(seed);
            let portal = portal_room(&pieces).expect("portal room");
            assert!(pieces[portal.0].depth > 5);
            let count = pieces
                .iter()
                .filter(|p| kind_of(p) == Some(StrongholdKind::PortalRoom))
                .count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn libraries_respect_depth_and_quota() {
        for seed in 0..4 {
            let pieces = stronghold(seed);
            let libraries: Vec<_> = pieces
                .iter()
                .filter(|p| kind_of(p) == Some(StrongholdKind::Library))
                .collect();
            assert!(libraries.len() <= 2);
            assert!(libraries.iter().all(|p| p.depth > 4));
        }
    }

    #[test]
    fn no_kind_twice_in_a_row() {
        let pieces = stronghold(9);
        let drawn: Vec<_> = pieces.iter().filter_map(kind_of).collect();
        for pair in drawn.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn forced_crossing_counts_against_its_quota() {
        for seed in 0..24 {
            let crossings = stronghold(seed)
                .iter()
                .filter(|p| kind_of(p) == Some(StrongholdKind::FiveCrossing))
                .count();
            assert!((1..=4).contains(&crossings), "seed {seed}: {crossings} five-way crossings");
        }
    }

    #[test]
    fn pieces_sit_above_the_floor() {
        let pieces = stronghold(3);
        for piece in &pieces[1..] {
            let floor = match &piece.data {
                PieceData::Stronghold(StrongholdPiece::FillerCorridor { .. }) => 1,
                _ => 10,
            };
            assert!(piece.bbox.min_y > floor);
        }
    }

    #[test]
    fn library_state_roundtrip() {
        let piece = StrongholdPiece::Library {
            door: SmallDoor::Grates,
            tall: true,
            chest_placed: true,
            upper_chest_placed: false,
        };
        let mut tag = NbtCompound::new();
        piece.save(&mut tag);
        assert_eq!(tag.get_str("EntryDoor"), Some("GRATES"));
        assert_eq!(StrongholdPiece::load("SHLi", &tag).unwrap(), piece);
    }

    #[test]
    fn bad_door_name_is_rejected() {
        let mut tag = NbtCompound::new();
        tag.put_string("EntryDoor", "PORTCULLIS");
        assert!(StrongholdPiece::load("SHS", &tag).is_err());
    }
}

//! Nether fortress: bridges above a lava sea and enclosed castle corridors.
//!
//! Two catalogs feed the expander. Bridge exits draw from the bridge
//! catalog, castle exits from the castle catalog, and both share one
//! "previous piece" so a kind that forbids repeats is never placed twice in
//! a row. Dead ends get a crumbling bridge end.

use mc_rs_nbt::NbtCompound;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::builder::{exit_anchor, select_piece, BuildContext, Exit, Selection};
use crate::catalog::{Catalog, PieceWeight, WeightTable};
use crate::config::FortressConfig;
use crate::direction::Direction;
use crate::error::StructureError;
use crate::geometry::{BlockPos, BoundingBox};
use crate::persist;
use crate::piece::{Piece, PieceData, PieceId};
use crate::random::StructureRng;
use crate::realize::{loot, EntityKind, Material, Painter};

pub const IDS: &[&str] = &[
    "NeBCr", "NeBEF", "NeBS", "NeCCS", "NeCTB", "NeCE", "NeSCSC", "NeSCLT", "NeSC", "NeSCRT",
    "NeCSR", "NeMT", "NeRC", "NeSR", "NeStart",
];

const START_SIZE: (i32, i32, i32) = (19, 10, 19);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FortressKind {
    BridgeStraight,
    BridgeCrossing,
    RoomCrossing,
    StairsRoom,
    MonsterThrone,
    CastleEntrance,
    CastleSmallCorridor,
    CastleSmallCorridorCrossing,
    CastleSmallCorridorRightTurn,
    CastleSmallCorridorLeftTurn,
    CastleCorridorStairs,
    CastleCorridorTBalcony,
    CastleStalkRoom,
}

impl FortressKind {
    /// Local x and y offsets plus width, height and depth.
    fn geometry(self) -> (i32, i32, i32, i32, i32) {
        match self {
            FortressKind::BridgeStraight => (-1, -3, 5, 10, 19),
            FortressKind::BridgeCrossing => (-8, -3, 19, 10, 19),
            FortressKind::RoomCrossing => (-2, 0, 7, 9, 7),
            FortressKind::StairsRoom => (-2, 0, 7, 11, 7),
            FortressKind::MonsterThrone => (-2, 0, 7, 8, 9),
            FortressKind::CastleEntrance => (-5, -3, 13, 14, 13),
            FortressKind::CastleSmallCorridor
            | FortressKind::CastleSmallCorridorCrossing
            | FortressKind::CastleSmallCorridorRightTurn
            | FortressKind::CastleSmallCorridorLeftTurn => (-1, 0, 5, 7, 5),
            FortressKind::CastleCorridorStairs => (-1, -7, 5, 14, 10),
            FortressKind::CastleCorridorTBalcony => (-3, 0, 9, 7, 9),
            FortressKind::CastleStalkRoom => (-5, -3, 13, 14, 13),
        }
    }
}

/// Chest state of a small corridor turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnChest {
    /// The turn was generated with a chest.
    pub chest: bool,
    /// Its loot has been handed out.
    pub chest_placed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FortressPiece {
    Start,
    BridgeCrossing,
    BridgeStraight,
    BridgeEndFiller { seed: i32 },
    RoomCrossing,
    StairsRoom,
    MonsterThrone { spawner_placed: bool },
    CastleEntrance { lava_scheduled: bool },
    CastleSmallCorridor,
    CastleSmallCorridorCrossing,
    CastleSmallCorridorLeftTurn(TurnChest),
    CastleSmallCorridorRightTurn(TurnChest),
    CastleCorridorStairs,
    CastleCorridorTBalcony,
    CastleStalkRoom,
}

impl FortressPiece {
    pub fn kind(&self) -> Option<FortressKind> {
        Some(match self {
            FortressPiece::Start | FortressPiece::BridgeEndFiller { .. } => return None,
            FortressPiece::BridgeCrossing => FortressKind::BridgeCrossing,
            FortressPiece::BridgeStraight => FortressKind::BridgeStraight,
            FortressPiece::RoomCrossing => FortressKind::RoomCrossing,
            FortressPiece::StairsRoom => FortressKind::StairsRoom,
            FortressPiece::MonsterThrone { .. } => FortressKind::MonsterThrone,
            FortressPiece::CastleEntrance { .. } => FortressKind::CastleEntrance,
            FortressPiece::CastleSmallCorridor => FortressKind::CastleSmallCorridor,
            FortressPiece::CastleSmallCorridorCrossing => FortressKind::CastleSmallCorridorCrossing,
            FortressPiece::CastleSmallCorridorLeftTurn(_) => FortressKind::CastleSmallCorridorLeftTurn,
            FortressPiece::CastleSmallCorridorRightTurn(_) => FortressKind::CastleSmallCorridorRightTurn,
            FortressPiece::CastleCorridorStairs => FortressKind::CastleCorridorStairs,
            FortressPiece::CastleCorridorTBalcony => FortressKind::CastleCorridorTBalcony,
            FortressPiece::CastleStalkRoom => FortressKind::CastleStalkRoom,
        })
    }

    pub fn id(&self) -> &'static str {
        match self {
            FortressPiece::Start => "NeStart",
            FortressPiece::BridgeCrossing => "NeBCr",
            FortressPiece::BridgeStraight => "NeBS",
            FortressPiece::BridgeEndFiller { .. } => "NeBEF",
            FortressPiece::RoomCrossing => "NeRC",
            FortressPiece::StairsRoom => "NeSR",
            FortressPiece::MonsterThrone { .. } => "NeMT",
            FortressPiece::CastleEntrance { .. } => "NeCE",
            FortressPiece::CastleSmallCorridor => "NeSC",
            FortressPiece::CastleSmallCorridorCrossing => "NeSCSC",
            FortressPiece::CastleSmallCorridorLeftTurn(_) => "NeSCLT",
            FortressPiece::CastleSmallCorridorRightTurn(_) => "NeSCRT",
            FortressPiece::CastleCorridorStairs => "NeCCS",
            FortressPiece::CastleCorridorTBalcony => "NeCTB",
            FortressPiece::CastleStalkRoom => "NeCSR",
        }
    }

    pub fn save(&self, tag: &mut NbtCompound) {
        match self {
            FortressPiece::BridgeEndFiller { seed } => tag.put_int("Seed", *seed),
            FortressPiece::MonsterThrone { spawner_placed } => tag.put_bool("Mob", *spawner_placed),
            FortressPiece::CastleEntrance { lava_scheduled } => tag.put_bool("Fluid", *lava_scheduled),
            FortressPiece::CastleSmallCorridorLeftTurn(turn)
            | FortressPiece::CastleSmallCorridorRightTurn(turn) => {
                tag.put_bool("Chest", turn.chest);
                tag.put_bool("ChestPlaced", turn.chest_placed);
            }
            _ => {}
        }
    }

    pub fn load(id: &str, tag: &NbtCompound) -> Result<Self, StructureError> {
        let turn = || TurnChest {
            chest: persist::flag(tag, "Chest"),
            chest_placed: persist::flag(tag, "ChestPlaced"),
        };
        Ok(match id {
            "NeStart" => FortressPiece::Start,
            "NeBCr" => FortressPiece::BridgeCrossing,
            "NeBS" => FortressPiece::BridgeStraight,
            "NeBEF" => FortressPiece::BridgeEndFiller {
                seed: persist::require_int(tag, id, "Seed")?,
            },
            "NeRC" => FortressPiece::RoomCrossing,
            "NeSR" => FortressPiece::StairsRoom,
            "NeMT" => FortressPiece::MonsterThrone {
                spawner_placed: persist::flag(tag, "Mob"),
            },
            "NeCE" => FortressPiece::CastleEntrance {
                lava_scheduled: persist::flag(tag, "Fluid"),
            },
            "NeSC" => FortressPiece::CastleSmallCorridor,
            "NeSCSC" => FortressPiece::CastleSmallCorridorCrossing,
            "NeSCLT" => FortressPiece::CastleSmallCorridorLeftTurn(turn()),
            "NeSCRT" => FortressPiece::CastleSmallCorridorRightTurn(turn()),
            "NeCCS" => FortressPiece::CastleCorridorStairs,
            "NeCTB" => FortressPiece::CastleCorridorTBalcony,
            "NeCSR" => FortressPiece::CastleStalkRoom,
            other => return Err(persist::unknown(other)),
        })
    }

    // -----------------------------------------------------------------------
    // Paint
    // -----------------------------------------------------------------------

    pub fn paint(&mut self, p: &mut Painter<'_>) {
        use Material::{Air, NetherBrickFence as Fence, NetherBricks as Bricks};

        let (w, h, d) = p.local_size();
        match self {
            FortressPiece::Start | FortressPiece::BridgeCrossing => {
                p.fill(Bricks, 7, 3, 0, 11, 4, 18);
                p.fill(Bricks, 0, 3, 7, 18, 4, 11);
                p.fill(Air, 8, 5, 0, 10, 7, 18);
                p.fill(Air, 0, 5, 8, 18, 7, 10);
                p.fill(Bricks, 7, 5, 0, 7, 5, 7);
                p.fill(Bricks, 7, 5, 11, 7, 5, 18);
                p.fill(Bricks, 11, 5, 0, 11, 5, 7);
                p.fill(Bricks, 11, 5, 11, 11, 5, 18);
                p.fill(Bricks, 7, 0, 7, 11, 2, 11);
            }
            FortressPiece::BridgeStraight => {
                p.fill(Bricks, 0, 3, 0, 4, 4, d - 1);
                p.fill(Air, 1, 5, 0, 3, 7, d - 1);
                p.fill(Bricks, 0, 5, 0, 0, 5, d - 1);
                p.fill(Bricks, 4, 5, 0, 4, 5, d - 1);
                p.fill(Fence, 0, 6, 1, 0, 6, d - 2);
                p.fill(Fence, 4, 6, 1, 4, 6, d - 2);
                p.fill(Bricks, 1, 0, d / 2 - 1, 3, 2, d / 2 + 1);
            }
            FortressPiece::BridgeEndFiller { seed } => {
                // crumbled deck lengths are a pure function of the seed
                let mut rng = StdRng::seed_from_u64(*seed as u64);
                for x in 0..=4 {
                    for y in 3..=4 {
                        let len = rng.next_int(8);
                        p.fill(Bricks, x, y, 0, x, y, len);
                    }
                }
                let len = rng.next_int(8);
                p.fill(Bricks, 0, 5, 0, 0, 5, len);
                let len = rng.next_int(8);
                p.fill(Bricks, 4, 5, 0, 4, 5, len);
                for x in 0..=4 {
                    let len = rng.next_int(5);
                    p.fill(Bricks, x, 2, 0, x, 2, len);
                }
                for x in 0..=4 {
                    for y in 0..=1 {
                        let len = rng.next_int(3);
                        p.fill(Bricks, x, y, 0, x, y, len);
                    }
                }
            }
            FortressPiece::RoomCrossing => {
                p.shell(Bricks, Air, 0, 0, 0, w - 1, h - 1, d - 1);
                p.fill(Air, 2, 2, 0, 4, 5, 0);
                p.fill(Air, 2, 2, d - 1, 4, 5, d - 1);
                p.fill(Air, 0, 2, 2, 0, 5, 4);
                p.fill(Air, w - 1, 2, 2, w - 1, 5, 4);
                p.fill(Fence, 1, 3, 1, 1, 4, 1);
                p.fill(Fence, w - 2, 3, d - 2, w - 2, 4, d - 2);
            }
            FortressPiece::StairsRoom => {
                p.shell(Bricks, Air, 0, 0, 0, w - 1, h - 1, d - 1);
                p.fill(Air, 2, 2, 0, 4, 5, 0);
                p.fill(Air, w - 1, 6, 2, w - 1, 8, 4);
                for step in 0..4 {
                    p.fill(Bricks, 1, 1 + step, 2 + step.min(3), w - 2, 1 + step, d - 2);
                }
            }
            FortressPiece::MonsterThrone { spawner_placed } => {
                p.fill(Bricks, 0, 2, 0, w - 1, 2, d - 1);
                p.fill(Air, 0, 3, 0, w - 1, h - 1, d - 1);
                p.fill(Bricks, 1, 3, 0, 5, 3, 0);
                p.fill(Fence, 0, 3, 1, 0, 5, d - 1);
                p.fill(Fence, w - 1, 3, 1, w - 1, 5, d - 1);
                p.fill(Fence, 1, 6, d - 1, w - 2, 6, d - 1);
                *spawner_placed = p.spawner(3, 5, 5, EntityKind::Blaze, *spawner_placed);
            }
            FortressPiece::CastleEntrance { lava_scheduled } => {
                p.shell(Bricks, Air, 0, 3, 0, w - 1, h - 1, d - 1);
                p.fill(Air, 5, 4, 0, 7, 7, 0);
                p.fill(Air, 5, 4, d - 1, 7, 7, d - 1);
                p.fill(Bricks, 0, 0, 4, 2, 2, 8);
                p.fill(Bricks, w - 3, 0, 4, w - 1, 2, 8);
                p.fill(Bricks, 5, 4, 5, 7, 4, 7);
                *lava_scheduled = p.fluid_source(Material::Lava, 6, 5, 6, *lava_scheduled);
            }
            FortressPiece::CastleSmallCorridor => {
                castle_corridor(p, w, h, d);
            }
            FortressPiece::CastleSmallCorridorCrossing => {
                castle_corridor(p, w, h, d);
                p.fill(Air, 0, 2, 1, 0, 4, 3);
                p.fill(Air, w - 1, 2, 1, w - 1, 4, 3);
            }
            FortressPiece::CastleSmallCorridorLeftTurn(turn) => {
                castle_corridor(p, w, h, d);
                p.fill(Bricks, 1, 2, d - 1, 3, 4, d - 1);
                p.fill(Air, 0, 2, 1, 0, 4, 3);
                if turn.chest {
                    turn.chest_placed = p.chest(3, 2, 3, loot::NETHER_BRIDGE, turn.chest_placed);
                }
            }
            FortressPiece::CastleSmallCorridorRightTurn(turn) => {
                castle_corridor(p, w, h, d);
                p.fill(Bricks, 1, 2, d - 1, 3, 4, d - 1);
                p.fill(Air, w - 1, 2, 1, w - 1, 4, 3);
                if turn.chest {
                    turn.chest_placed = p.chest(1, 2, 3, loot::NETHER_BRIDGE, turn.chest_placed);
                }
            }
            FortressPiece::CastleCorridorStairs => {
                p.shell(Bricks, Air, 0, 0, 0, w - 1, h - 1, d - 1);
                p.fill(Air, 1, 8, 0, 3, 11, 0);
                p.fill(Air, 1, 1, d - 1, 3, 4, d - 1);
                for step in 0..d - 1 {
                    let floor = (7 - step).max(0);
                    p.fill(Bricks, 1, floor, step, 3, floor, step);
                }
            }
            FortressPiece::CastleCorridorTBalcony => {
                p.shell(Bricks, Air, 0, 0, 0, w - 1, h - 1, d - 1);
                p.fill(Air, 3, 2, 0, 5, 4, 0);
                p.fill(Air, 0, 2, 1, 0, 4, 5);
                p.fill(Air, w - 1, 2, 1, w - 1, 4, 5);
                p.fill(Fence, 1, 3, d - 1, w - 2, 4, d - 1);
            }
            FortressPiece::CastleStalkRoom => {
                p.shell(Bricks, Air, 0, 3, 0, w - 1, h - 1, d - 1);
                p.fill(Air, 5, 4, 0, 7, 7, 0);
                p.fill(Air, 5, 4, d - 1, 7, 7, d - 1);
                p.fill(Air, 5, 12, d - 1, 7, 12, d - 1);
                p.fill(Bricks, 3, 4, 3, w - 4, 4, d - 4);
            }
        }
    }
}

fn castle_corridor(p: &mut Painter<'_>, w: i32, h: i32, d: i32) {
    p.shell(Material::NetherBricks, Material::Air, 0, 0, 0, w - 1, h - 1, d - 1);
    p.fill(Material::Air, 1, 2, 0, 3, 4, 0);
    p.fill(Material::Air, 1, 2, d - 1, 3, 4, d - 1);
    p.fill(Material::NetherBrickFence, 0, 3, 1, 0, 3, d - 2);
    p.fill(Material::NetherBrickFence, w - 1, 3, 1, w - 1, 3, d - 2);
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

pub fn bridge_catalog() -> Result<Catalog<FortressKind>, StructureError> {
    Ok(Catalog::new(vec![
        PieceWeight::new(FortressKind::BridgeStraight, 30, 0).repeatable(),
        PieceWeight::new(FortressKind::BridgeCrossing, 10, 4),
        PieceWeight::new(FortressKind::RoomCrossing, 10, 4),
        PieceWeight::new(FortressKind::StairsRoom, 10, 3),
        PieceWeight::new(FortressKind::MonsterThrone, 5, 2),
        PieceWeight::new(FortressKind::CastleEntrance, 5, 1),
    ])?
    .with_finite_quota_rule())
}

pub fn castle_catalog() -> Result<Catalog<FortressKind>, StructureError> {
    Ok(Catalog::new(vec![
        PieceWeight::new(FortressKind::CastleSmallCorridor, 25, 0).repeatable(),
        PieceWeight::new(FortressKind::CastleSmallCorridorCrossing, 15, 5),
        PieceWeight::new(FortressKind::CastleSmallCorridorRightTurn, 5, 10),
        PieceWeight::new(FortressKind::CastleSmallCorridorLeftTurn, 5, 10),
        PieceWeight::new(FortressKind::CastleCorridorStairs, 10, 3).repeatable(),
        PieceWeight::new(FortressKind::CastleCorridorTBalcony, 7, 2),
        PieceWeight::new(FortressKind::CastleStalkRoom, 5, 2),
    ])?
    .with_finite_quota_rule())
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Which catalog an exit draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Bridge,
    Castle,
    /// Castle seven times in eight, decided when the exit is expanded.
    MostlyCastle,
}

struct FortressBuild {
    bridge: WeightTable<FortressKind>,
    castle: WeightTable<FortressKind>,
    previous: Option<FortressKind>,
}

impl FortressBuild {
    fn add_children(&mut self, ctx: &mut BuildContext<'_>, id: PieceId) {
        let parent = ctx.piece(id);
        let (bbox, depth) = (parent.bbox, parent.depth);
        let Some(facing) = parent.orientation else {
            return;
        };
        let PieceData::Fortress(data) = &parent.data else {
            return;
        };

        use Branch::{Bridge, Castle, MostlyCastle};
        let exits: Vec<(Exit, Branch)> = match data {
            FortressPiece::Start | FortressPiece::BridgeCrossing => vec![
                (Exit::Forward { x: 8, y: 3 }, Bridge),
                (Exit::Left { y: 3, z: 8 }, Bridge),
                (Exit::Right { y: 3, z: 8 }, Bridge),
            ],
            FortressPiece::BridgeStraight => vec![(Exit::Forward { x: 1, y: 3 }, Bridge)],
            FortressPiece::RoomCrossing => vec![
                (Exit::Forward { x: 2, y: 0 }, Bridge),
                (Exit::Left { y: 0, z: 2 }, Bridge),
                (Exit::Right { y: 0, z: 2 }, Bridge),
            ],
            FortressPiece::StairsRoom => vec![(Exit::Right { y: 6, z: 2 }, Bridge)],
            FortressPiece::CastleEntrance { .. } => vec![(Exit::Forward { x: 5, y: 3 }, Castle)],
            FortressPiece::CastleSmallCorridor => vec![(Exit::Forward { x: 1, y: 0 }, Castle)],
            FortressPiece::CastleSmallCorridorCrossing => vec![
                (Exit::Forward { x: 1, y: 0 }, Castle),
                (Exit::Left { y: 0, z: 1 }, Castle),
                (Exit::Right { y: 0, z: 1 }, Castle),
            ],
            FortressPiece::CastleSmallCorridorLeftTurn(_) => vec![(Exit::Left { y: 0, z: 1 }, Castle)],
            FortressPiece::CastleSmallCorridorRightTurn(_) => {
                vec![(Exit::Right { y: 0, z: 1 }, Castle)]
            }
            FortressPiece::CastleCorridorStairs => vec![(Exit::Forward { x: 1, y: 0 }, Castle)],
            FortressPiece::CastleCorridorTBalcony => {
                let z = if matches!(facing, Direction::West | Direction::North) { 5 } else { 1 };
                vec![
                    (Exit::Left { y: 0, z }, MostlyCastle),
                    (Exit::Right { y: 0, z }, MostlyCastle),
                ]
            }
            FortressPiece::CastleStalkRoom => vec![
                (Exit::Forward { x: 5, y: 3 }, Castle),
                (Exit::Forward { x: 5, y: 11 }, Castle),
            ],
            FortressPiece::BridgeEndFiller { .. } | FortressPiece::MonsterThrone { .. } => Vec::new(),
        };

        for (exit, branch) in exits {
            let castle = match branch {
                Bridge => false,
                Castle => true,
                MostlyCastle => ctx.rng().next_int(8) > 0,
            };
            let (anchor, dir) = exit_anchor(&bbox, facing, exit);
            self.add_child(ctx, anchor, dir, depth + 1, castle);
        }
    }

    fn add_child(
        &mut self,
        ctx: &mut BuildContext<'_>,
        anchor: BlockPos,
        facing: Direction,
        depth: u32,
        castle: bool,
    ) {
        if !ctx.within_radius(anchor) || depth > ctx.limits.max_depth {
            return;
        }
        let table = if castle { &mut self.castle } else { &mut self.bridge };
        let piece = match select_piece(ctx, table, &mut self.previous, anchor, facing, depth, create) {
            Selection::Placed(piece) => Some(piece),
            Selection::Exhausted | Selection::NoFit => end_filler(ctx, anchor, facing, depth),
        };
        if let Some(piece) = piece {
            ctx.push_pending(piece);
        }
    }
}

fn create(
    ctx: &mut BuildContext<'_>,
    kind: FortressKind,
    anchor: BlockPos,
    facing: Direction,
    depth: u32,
) -> Option<Piece> {
    let (ox, oy, w, h, d) = kind.geometry();
    let bbox = ctx.accepts(BoundingBox::orient_box(anchor.x, anchor.y, anchor.z, ox, oy, 0, w, h, d, facing))?;
    let data = match kind {
        FortressKind::BridgeStraight => FortressPiece::BridgeStraight,
        FortressKind::BridgeCrossing => FortressPiece::BridgeCrossing,
        FortressKind::RoomCrossing => FortressPiece::RoomCrossing,
        FortressKind::StairsRoom => FortressPiece::StairsRoom,
        FortressKind::MonsterThrone => FortressPiece::MonsterThrone {
            spawner_placed: false,
        },
        FortressKind::CastleEntrance => FortressPiece::CastleEntrance {
            lava_scheduled: false,
        },
        FortressKind::CastleSmallCorridor => FortressPiece::CastleSmallCorridor,
        FortressKind::CastleSmallCorridorCrossing => FortressPiece::CastleSmallCorridorCrossing,
        FortressKind::CastleSmallCorridorRightTurn => {
            FortressPiece::CastleSmallCorridorRightTurn(turn_chest(ctx))
        }
        FortressKind::CastleSmallCorridorLeftTurn => {
            FortressPiece::CastleSmallCorridorLeftTurn(turn_chest(ctx))
        }
        FortressKind::CastleCorridorStairs => FortressPiece::CastleCorridorStairs,
        FortressKind::CastleCorridorTBalcony => FortressPiece::CastleCorridorTBalcony,
        FortressKind::CastleStalkRoom => FortressPiece::CastleStalkRoom,
    };
    Some(Piece::new(PieceData::Fortress(data), bbox, Some(facing), depth))
}

fn turn_chest(ctx: &mut BuildContext<'_>) -> TurnChest {
    TurnChest {
        chest: ctx.rng().next_int(3) == 0,
        chest_placed: false,
    }
}

fn end_filler(ctx: &mut BuildContext<'_>, anchor: BlockPos, facing: Direction, depth: u32) -> Option<Piece> {
    let bbox = ctx.accepts(BoundingBox::orient_box(anchor.x, anchor.y, anchor.z, -1, -3, 0, 5, 10, 8, facing))?;
    let seed = ctx.rng().next_i32();
    Some(Piece::new(
        PieceData::Fortress(FortressPiece::BridgeEndFiller { seed }),
        bbox,
        Some(facing),
        depth,
    ))
}

/// Moves every piece by the same amount so the whole fortress lands inside
/// the inclusive `[min_y, max_y]` band when it fits.
pub fn shift_into_band(pieces: &mut [Piece], rng: &mut dyn RngCore, min_y: i32, max_y: i32) {
    let Some(bounds) = BoundingBox::encapsulating(pieces.iter().map(|p| &p.bbox)) else {
        return;
    };
    let room = max_y - min_y + 1 - bounds.y_span();
    let target = if room > 1 { min_y + rng.next_int(room) } else { min_y };
    let dy = target - bounds.min_y;
    for piece in pieces.iter_mut() {
        piece.bbox = piece.bbox.moved(0, dy, 0);
    }
}

pub fn generate(
    config: &FortressConfig,
    rng: &mut dyn RngCore,
    origin: BlockPos,
    facing: Direction,
) -> Result<Vec<Piece>, StructureError> {
    let (w, h, d) = START_SIZE;
    let bbox = BoundingBox::make(origin.x, origin.y, origin.z, facing, w, h, d);
    let start = Piece::new(PieceData::Fortress(FortressPiece::Start), bbox, Some(facing), 0);

    let mut build = FortressBuild {
        bridge: bridge_catalog()?.instantiate(),
        castle: castle_catalog()?.instantiate(),
        previous: None,
    };
    let mut ctx = BuildContext::new(rng, config.bounds.limits(), start);
    build.add_children(&mut ctx, PieceId(0));
    while let Some(id) = ctx.pop_random_pending() {
        build.add_children(&mut ctx, id);
    }
    let mut pieces = ctx.into_pieces();

    if let Some([min_y, max_y]) = config.height_band {
        shift_into_band(&mut pieces, rng, min_y, max_y);
    }
    debug!(pieces = pieces.len(), "fortress generated");
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fortress(seed: u64) -> Vec<Piece> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(&FortressConfig::default(), &mut rng, BlockPos::new(0, 64, 0), Direction::South).unwrap()
    }

    fn count(pieces: &[Piece], kind: FortressKind) -> usize {
        pieces
            .iter()
            .filter(|p| matches!(&p.data, PieceData::Fortress(f) if f.kind() == Some(kind)))
            .count()
    }

    #[test]
    fn start_is_a_bridge_crossing() {
        let pieces = fortress(11);
        assert_eq!(pieces[0].id(), "NeStart");
        assert_eq!(pieces[0].bbox.x_span(), 19);
        assert_eq!(pieces[0].bbox.y_span(), 10);
        assert!(pieces.len() > 1);
    }

    #[test]
    fn quotas_hold() {
        for seed in 0..8 {
            let pieces = fortress(seed);
            assert!(count(&pieces, FortressKind::CastleEntrance) <= 1);
            assert!(count(&pieces, FortressKind::MonsterThrone) <= 2);
            assert!(count(&pieces, FortressKind::BridgeCrossing) <= 4);
            assert!(count(&pieces, FortressKind::CastleStalkRoom) <= 2);
            assert!(count(&pieces, FortressKind::CastleSmallCorridorCrossing) <= 5);
        }
    }

    #[test]
    fn band_shift_keeps_relative_layout() {
        let mut config = FortressConfig::default();
        config.height_band = None;
        let mut rng = StdRng::seed_from_u64(21);
        let raw = generate(&config, &mut rng, BlockPos::new(0, 64, 0), Direction::East).unwrap();

        let mut shifted = raw.clone();
        let mut rng = StdRng::seed_from_u64(5);
        shift_into_band(&mut shifted, &mut rng, 48, 70);
        let dy = shifted[0].bbox.min_y - raw[0].bbox.min_y;
        for (a, b) in raw.iter().zip(&shifted) {
            assert_eq!(b.bbox, a.bbox.moved(0, dy, 0));
        }
        let bounds = BoundingBox::encapsulating(shifted.iter().map(|p| &p.bbox)).unwrap();
        if bounds.y_span() <= 70 - 48 + 1 {
            assert!(bounds.min_y >= 48 && bounds.max_y <= 70);
        } else {
            assert_eq!(bounds.min_y, 48);
        }
    }

    #[test]
    fn turn_state_roundtrip() {
        let piece = FortressPiece::CastleSmallCorridorLeftTurn(TurnChest {
            chest: true,
            chest_placed: false,
        });
        let mut tag = NbtCompound::new();
        piece.save(&mut tag);
        assert_eq!(tag.get_bool("Chest"), Some(true));
        assert_eq!(FortressPiece::load("NeSCLT", &tag).unwrap(), piece);
    }

    #[test]
    fn filler_requires_seed() {
        let err = FortressPiece::load("NeBEF", &NbtCompound::new()).unwrap_err();
        assert!(matches!(err, StructureError::MissingField { field: "Seed", .. }));
    }
}

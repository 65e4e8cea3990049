//! End cities.
//!
//! A city starts as a house with a tower on its roof. Towers sprout bridges
//! from their sides, a bridge ends in another house or, once per city, in a
//! floating ship, and a tower without bridges may grow into a fat tower.
//!
//! Each section (house, tower, bridge, fat tower) is placed as a unit: when
//! one of its own pieces overlaps anything already built, every piece the
//! section added is dropped again. Sections nested in it succeed or fail on
//! their own.

use mc_rs_nbt::NbtCompound;
use rand::RngCore;
use tracing::{debug, trace, warn};

use crate::builder::BuildContext;
use crate::config::EndCityConfig;
use crate::direction::Direction;
use crate::error::StructureError;
use crate::geometry::{BlockPos, BoundingBox};
use crate::persist;
use crate::piece::{Piece, PieceData, PieceId};
use crate::random::StructureRng;
use crate::realize::{loot, EntityKind, Material, Painter};

pub const IDS: &[&str] = &[
    "ECBase",
    "ECFloor",
    "ECUpper",
    "ECRoof",
    "ECTBase",
    "ECTower",
    "ECTTop",
    "ECBEnd",
    "ECBridge",
    "ECBSteep",
    "ECBGentle",
    "ECFBase",
    "ECFMid",
    "ECFTop",
    "ECShip",
];

/// Free margin the ship keeps around its hull from everything built before it.
const SHIP_CLEARANCE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCityKind {
    HouseBase,
    HouseFloor,
    HouseUpperFloor,
    HouseRoof,
    TowerBase,
    TowerPiece,
    TowerTop,
    BridgeEnd,
    BridgePiece,
    SteepStairs,
    GentleStairs,
    FatTowerBase,
    FatTowerMiddle,
    FatTowerTop,
    Ship,
}

impl EndCityKind {
    const ALL: [EndCityKind; 15] = [
        EndCityKind::HouseBase,
        EndCityKind::HouseFloor,
        EndCityKind::HouseUpperFloor,
        EndCityKind::HouseRoof,
        EndCityKind::TowerBase,
        EndCityKind::TowerPiece,
        EndCityKind::TowerTop,
        EndCityKind::BridgeEnd,
        EndCityKind::BridgePiece,
        EndCityKind::SteepStairs,
        EndCityKind::GentleStairs,
        EndCityKind::FatTowerBase,
        EndCityKind::FatTowerMiddle,
        EndCityKind::FatTowerTop,
        EndCityKind::Ship,
    ];

    pub fn id(self) -> &'static str {
        match self {
            EndCityKind::HouseBase => "ECBase",
            EndCityKind::HouseFloor => "ECFloor",
            EndCityKind::HouseUpperFloor => "ECUpper",
            EndCityKind::HouseRoof => "ECRoof",
            EndCityKind::TowerBase => "ECTBase",
            EndCityKind::TowerPiece => "ECTower",
            EndCityKind::TowerTop => "ECTTop",
            EndCityKind::BridgeEnd => "ECBEnd",
            EndCityKind::BridgePiece => "ECBridge",
            EndCityKind::SteepStairs => "ECBSteep",
            EndCityKind::GentleStairs => "ECBGentle",
            EndCityKind::FatTowerBase => "ECFBase",
            EndCityKind::FatTowerMiddle => "ECFMid",
            EndCityKind::FatTowerTop => "ECFTop",
            EndCityKind::Ship => "ECShip",
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Width, height and length in the piece's own frame.
    pub fn size(self) -> (i32, i32, i32) {
        match self {
            EndCityKind::HouseBase => (9, 4, 9),
            EndCityKind::HouseFloor | EndCityKind::HouseUpperFloor => (11, 4, 11),
            EndCityKind::HouseRoof => (11, 2, 11),
            EndCityKind::TowerBase => (7, 7, 7),
            EndCityKind::TowerPiece => (7, 4, 7),
            EndCityKind::TowerTop => (9, 4, 9),
            EndCityKind::BridgeEnd => (3, 3, 2),
            EndCityKind::BridgePiece => (3, 3, 4),
            EndCityKind::SteepStairs => (3, 7, 4),
            EndCityKind::GentleStairs => (3, 7, 8),
            EndCityKind::FatTowerBase => (13, 4, 13),
            EndCityKind::FatTowerMiddle => (13, 8, 13),
            EndCityKind::FatTowerTop => (17, 6, 17),
            EndCityKind::Ship => (13, 22, 29),
        }
    }

    /// How much higher the next bridge segment starts.
    fn rise(self) -> i32 {
        match self {
            EndCityKind::SteepStairs | EndCityKind::GentleStairs => 4,
            _ => 0,
        }
    }

    fn has_chest(self) -> bool {
        matches!(
            self,
            EndCityKind::HouseUpperFloor | EndCityKind::FatTowerTop | EndCityKind::Ship
        )
    }

    fn has_sentry(self) -> bool {
        matches!(
            self,
            EndCityKind::TowerTop | EndCityKind::FatTowerTop | EndCityKind::Ship
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndCityPiece {
    pub kind: EndCityKind,
    pub chest_placed: bool,
    /// The shulker guarding tower tops and the ship.
    pub sentry_spawned: bool,
    pub elytra_placed: bool,
}

impl EndCityPiece {
    pub fn new(kind: EndCityKind) -> Self {
        Self {
            kind,
            chest_placed: false,
            sentry_spawned: false,
            elytra_placed: false,
        }
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub fn save(&self, tag: &mut NbtCompound) {
        if self.kind.has_chest() {
            tag.put_bool("Chest", self.chest_placed);
        }
        if self.kind.has_sentry() {
            tag.put_bool("Sentry", self.sentry_spawned);
        }
        if self.kind == EndCityKind::Ship {
            tag.put_bool("Elytra", self.elytra_placed);
        }
    }

    pub fn load(id: &str, tag: &NbtCompound) -> Result<Self, StructureError> {
        let kind = EndCityKind::from_id(id).ok_or_else(|| persist::unknown(id))?;
        Ok(Self {
            kind,
            chest_placed: persist::flag(tag, "Chest"),
            sentry_spawned: persist::flag(tag, "Sentry"),
            elytra_placed: persist::flag(tag, "Elytra"),
        })
    }

    pub fn paint(&mut self, p: &mut Painter<'_>) {
        let (w, h, d) = p.local_size();
        match self.kind {
            EndCityKind::HouseBase
            | EndCityKind::HouseFloor
            | EndCityKind::HouseUpperFloor
            | EndCityKind::TowerBase
            | EndCityKind::TowerPiece
            | EndCityKind::FatTowerBase
            | EndCityKind::FatTowerMiddle => {
                p.hollow(Material::Purpur, Material::Air);
                p.fill(Material::EndStoneBricks, 0, 0, 0, w - 1, 0, d - 1);
                // windows on the front and back
                p.fill(Material::Air, w / 2, 2, 0, w / 2, h - 2, 0);
                p.fill(Material::Air, w / 2, 2, d - 1, w / 2, h - 2, d - 1);
                if self.kind == EndCityKind::HouseBase {
                    p.fill(Material::Air, w / 2 - 1, 1, 0, w / 2 + 1, 2, 0);
                }
                if self.kind.has_chest() {
                    self.chest_placed =
                        p.chest(w / 2, 1, d - 2, loot::END_CITY_TREASURE, self.chest_placed);
                }
            }
            EndCityKind::HouseRoof => {
                p.fill(Material::Purpur, 0, 0, 0, w - 1, 0, d - 1);
                p.shell(Material::EndStoneBricks, Material::Air, 0, 1, 0, w - 1, 1, d - 1);
            }
            EndCityKind::TowerTop | EndCityKind::FatTowerTop => {
                p.hollow(Material::Purpur, Material::Air);
                for (x, z) in [(0, 0), (w - 1, 0), (0, d - 1), (w - 1, d - 1)] {
                    p.place(Material::EndRod, x, h - 1, z);
                }
                if self.kind.has_chest() {
                    self.chest_placed =
                        p.chest(w / 2, 1, d / 2, loot::END_CITY_TREASURE, self.chest_placed);
                }
                self.sentry_spawned =
                    p.spawn_entity(1, 1, 1, EntityKind::Shulker, self.sentry_spawned);
            }
            EndCityKind::BridgeEnd | EndCityKind::BridgePiece => {
                p.fill(Material::Purpur, 0, 0, 0, w - 1, 0, d - 1);
                p.fill(Material::EndStoneBricks, 0, 1, 0, 0, 1, d - 1);
                p.fill(Material::EndStoneBricks, w - 1, 1, 0, w - 1, 1, d - 1);
            }
            EndCityKind::SteepStairs | EndCityKind::GentleStairs => {
                let rise = self.kind.rise();
                for z in 0..d {
                    let step = (z + 1) * rise / d;
                    p.fill(Material::Purpur, 0, step, z, w - 1, step, z);
                    p.fill(Material::Air, 0, step + 1, z, w - 1, (step + 2).min(h - 1), z);
                }
            }
            EndCityKind::Ship => {
                let mid = w / 2;
                p.shell(Material::Purpur, Material::Air, 2, 0, 0, w - 3, 5, d - 1);
                p.fill(Material::EndStoneBricks, 3, 5, 1, w - 4, 5, d - 2);
                p.fill(Material::Purpur, mid, 6, d / 2, mid, h - 1, d / 2);
                self.chest_placed =
                    p.chest(mid, 1, d - 3, loot::END_CITY_TREASURE, self.chest_placed);
                self.elytra_placed =
                    p.spawn_entity(mid, 2, d - 2, EntityKind::ElytraFrame, self.elytra_placed);
                self.sentry_spawned =
                    p.spawn_entity(mid, 1, 3, EntityKind::Shulker, self.sentry_spawned);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Section {
    /// A house at the far end of a bridge, `rise` above its last segment.
    HouseTower { facing: Direction, rise: i32 },
    Tower,
    Bridge(Direction),
    FatTower,
}

struct CityBuild {
    ship_odds: i32,
    ship_created: bool,
}

impl CityBuild {
    /// Builds `section` off piece `from`. Returns false, with nothing of the
    /// section left behind, when it could not be placed.
    fn section(&mut self, ctx: &mut BuildContext<'_>, section: Section, depth: u32, from: PieceId) -> bool {
        if depth > ctx.limits.max_depth {
            return false;
        }
        let mark = ctx.pieces.len();
        let built = match section {
            Section::HouseTower { facing, rise } => self.house_tower(ctx, depth, from, facing, rise),
            Section::Tower => self.tower(ctx, depth, from),
            Section::Bridge(facing) => self.bridge(ctx, depth, from, facing),
            Section::FatTower => self.fat_tower(ctx, depth, from),
        }
        .is_some();
        if !built {
            trace!(?section, depth, dropped = ctx.pieces.len() - mark, "section dropped");
            ctx.pieces.truncate(mark);
        }
        built
    }

    fn start_house(&mut self, ctx: &mut BuildContext<'_>) -> Option<()> {
        let floor = stack(ctx, PieceId(0), EndCityKind::HouseFloor, -1, -1, 0)?;
        let upper = stack(ctx, floor, EndCityKind::HouseUpperFloor, 0, 0, 0)?;
        let roof = stack(ctx, upper, EndCityKind::HouseRoof, 0, 0, 0)?;
        self.section(ctx, Section::Tower, 1, roof);
        Some(())
    }

    fn house_tower(
        &mut self,
        ctx: &mut BuildContext<'_>,
        depth: u32,
        from: PieceId,
        facing: Direction,
        rise: i32,
    ) -> Option<()> {
        let prev = ctx.piece(from).bbox;
        let y = prev.min_y + rise;
        if !ctx.within_radius(side_anchor(&prev, facing, y)) {
            return None;
        }
        let base = segment(ctx, &prev, EndCityKind::HouseBase, facing, y, depth)?;
        let roof = match ctx.rng().next_int(3) {
            0 => stack(ctx, base, EndCityKind::HouseRoof, -1, -1, depth)?,
            1 => {
                let floor = stack(ctx, base, EndCityKind::HouseFloor, -1, -1, depth)?;
                stack(ctx, floor, EndCityKind::HouseRoof, 0, 0, depth)?
            }
            _ => {
                let floor = stack(ctx, base, EndCityKind::HouseFloor, -1, -1, depth)?;
                let upper = stack(ctx, floor, EndCityKind::HouseUpperFloor, 0, 0, depth)?;
                stack(ctx, upper, EndCityKind::HouseRoof, 0, 0, depth)?
            }
        };
        self.section(ctx, Section::Tower, depth + 1, roof);
        Some(())
    }

    fn tower(&mut self, ctx: &mut BuildContext<'_>, depth: u32, from: PieceId) -> Option<()> {
        let (dx, dz) = (2 + ctx.rng().next_int(2), 2 + ctx.rng().next_int(2));
        let base = stack(ctx, from, EndCityKind::TowerBase, dx, dz, depth)?;
        let mut top = stack(ctx, base, EndCityKind::TowerPiece, 0, 0, depth)?;
        let mut anchor = (ctx.rng().next_int(3) == 0).then_some(top);
        let storeys = 1 + ctx.rng().next_int(3);
        for storey in 0..storeys {
            top = stack(ctx, top, EndCityKind::TowerPiece, 0, 0, depth)?;
            if storey < storeys - 1 && ctx.rng().next_bool() {
                anchor = Some(top);
            }
        }
        match anchor {
            Some(anchor) => {
                let facing = ctx.piece(anchor).orientation?;
                for side in sides(facing) {
                    if ctx.rng().next_bool() {
                        self.section(ctx, Section::Bridge(side), depth + 1, anchor);
                    }
                }
            }
            None if depth + 1 < ctx.limits.max_depth => {
                return self.section(ctx, Section::FatTower, depth + 1, top).then_some(());
            }
            None => {}
        }
        stack(ctx, top, EndCityKind::TowerTop, -1, -1, depth).map(|_| ())
    }

    fn bridge(&mut self, ctx: &mut BuildContext<'_>, depth: u32, from: PieceId, facing: Direction) -> Option<()> {
        let anchor = ctx.piece(from).bbox;
        let mut last = segment(ctx, &anchor, EndCityKind::BridgeEnd, facing, anchor.min_y, depth)?;
        let mut rise = 0;
        for _ in 0..ctx.rng().next_int(4) + 1 {
            let kind = if ctx.rng().next_bool() {
                EndCityKind::BridgePiece
            } else if ctx.rng().next_bool() {
                EndCityKind::SteepStairs
            } else {
                EndCityKind::GentleStairs
            };
            let prev = ctx.piece(last).bbox;
            last = segment(ctx, &prev, kind, facing, prev.min_y + rise, depth)?;
            rise = kind.rise();
        }
        if !self.ship_created && ctx.rng().next_int(self.ship_odds - depth as i32) == 0 {
            self.ship(ctx, depth, last, facing, rise)
        } else {
            let house = Section::HouseTower { facing, rise };
            self.section(ctx, house, depth + 1, last).then_some(())
        }
    }

    fn ship(
        &mut self,
        ctx: &mut BuildContext<'_>,
        depth: u32,
        from: PieceId,
        facing: Direction,
        rise: i32,
    ) -> Option<()> {
        let prev = ctx.piece(from).bbox;
        let gap = 12 + ctx.rng().next_int(10);
        let lateral = -8 + ctx.rng().next_int(8);
        let anchor = side_anchor(&prev, facing, prev.min_y + rise).relative(facing, gap);
        let (w, h, d) = EndCityKind::Ship.size();
        let bbox = BoundingBox::orient_box(anchor.x, anchor.y, anchor.z, lateral, -6, 0, w, h, d, facing);
        if ctx.collides(&bbox.inflated_by(SHIP_CLEARANCE)).is_some() {
            return None;
        }
        place(ctx, EndCityKind::Ship, bbox, facing, depth)?;
        self.ship_created = true;
        Some(())
    }

    fn fat_tower(&mut self, ctx: &mut BuildContext<'_>, depth: u32, from: PieceId) -> Option<()> {
        let base = stack(ctx, from, EndCityKind::FatTowerBase, -3, -3, depth)?;
        let mut middle = stack(ctx, base, EndCityKind::FatTowerMiddle, 0, 0, depth)?;
        let mut storeys = 0;
        while storeys < 2 && ctx.rng().next_int(3) != 0 {
            storeys += 1;
            middle = stack(ctx, middle, EndCityKind::FatTowerMiddle, 0, 0, depth)?;
            let facing = ctx.piece(middle).orientation?;
            for side in sides(facing) {
                if ctx.rng().next_bool() {
                    self.section(ctx, Section::Bridge(side), depth + 1, middle);
                }
            }
        }
        stack(ctx, middle, EndCityKind::FatTowerTop, -2, -2, depth).map(|_| ())
    }
}

fn place(
    ctx: &mut BuildContext<'_>,
    kind: EndCityKind,
    bbox: BoundingBox,
    facing: Direction,
    depth: u32,
) -> Option<PieceId> {
    let bbox = ctx.accepts(bbox)?;
    let piece = Piece::new(PieceData::EndCity(EndCityPiece::new(kind)), bbox, Some(facing), depth);
    Some(ctx.push(piece))
}

/// Puts `kind` on top of `parent`, shifted by `(dx, dz)` in the parent's frame.
fn stack(
    ctx: &mut BuildContext<'_>,
    parent: PieceId,
    kind: EndCityKind,
    dx: i32,
    dz: i32,
    depth: u32,
) -> Option<PieceId> {
    let parent = ctx.piece(parent);
    let (frame, orientation) = (parent.bbox, parent.orientation);
    let facing = orientation?;
    let (_, height, _) = frame.local_size(orientation);
    let (w, h, d) = kind.size();
    let bbox = frame.world_box(orientation, (dx, height, dz), (dx + w - 1, height + h - 1, dz + d - 1));
    place(ctx, kind, bbox, facing, depth)
}

/// Places `kind` centred on the `facing` side of `from`, leading away from it.
fn segment(
    ctx: &mut BuildContext<'_>,
    from: &BoundingBox,
    kind: EndCityKind,
    facing: Direction,
    y: i32,
    depth: u32,
) -> Option<PieceId> {
    let anchor = side_anchor(from, facing, y);
    let (w, h, d) = kind.size();
    let bbox = BoundingBox::orient_box(anchor.x, anchor.y, anchor.z, -(w / 2), 0, 0, w, h, d, facing);
    place(ctx, kind, bbox, facing, depth)
}

/// The block just outside the middle of `bbox`'s `facing` side.
fn side_anchor(bbox: &BoundingBox, facing: Direction, y: i32) -> BlockPos {
    let center = bbox.center();
    match facing {
        Direction::North => BlockPos::new(center.x, y, bbox.min_z - 1),
        Direction::West => BlockPos::new(bbox.min_x - 1, y, center.z),
        Direction::East => BlockPos::new(bbox.max_x + 1, y, center.z),
        _ => BlockPos::new(center.x, y, bbox.max_z + 1),
    }
}

fn sides(facing: Direction) -> [Direction; 4] {
    [facing, facing.clockwise(), facing.opposite(), facing.counter_clockwise()]
}

pub fn generate(
    config: &EndCityConfig,
    rng: &mut dyn RngCore,
    origin: BlockPos,
    facing: Direction,
) -> Result<Vec<Piece>, StructureError> {
    let (w, h, d) = EndCityKind::HouseBase.size();
    let bbox = BoundingBox::make(origin.x, origin.y, origin.z, facing, w, h, d);
    let start = Piece::new(
        PieceData::EndCity(EndCityPiece::new(EndCityKind::HouseBase)),
        bbox,
        Some(facing),
        0,
    );
    let mut ctx = BuildContext::new(rng, config.bounds.limits(), start);
    let mut city = CityBuild {
        ship_odds: config.ship_odds,
        ship_created: false,
    };
    if city.start_house(&mut ctx).is_none() {
        warn!(%origin, "end city start house does not fit");
    }
    let pieces = ctx.into_pieces();
    debug!(pieces = pieces.len(), ship = city.ship_created, "end city generated");
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn city(seed: u64, facing: Direction) -> Vec<Piece> {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(&EndCityConfig::default(), &mut rng, BlockPos::new(0, 64, 0), facing).unwrap()
    }

    fn count(pieces: &[Piece], id: &str) -> usize {
        pieces.iter().filter(|p| p.id() == id).count()
    }

    #[test]
    fn starts_with_a_house_and_its_tower() {
        for seed in 0..8 {
            let pieces = city(seed, Direction::South);
            let ids: Vec<_> = pieces.iter().take(4).map(Piece::id).collect();
            assert_eq!(ids, ["ECBase", "ECFloor", "ECUpper", "ECRoof"]);
            assert!(count(&pieces, "ECTBase") >= 1, "seed {seed} has no tower");
        }
    }

    #[test]
    fn storeys_sit_on_top_of_each_other() {
        for facing in Direction::HORIZONTAL {
            let pieces = city(3, facing);
            for pair in pieces[..4].windows(2) {
                let (lower, upper) = (pair[0].bbox, pair[1].bbox);
                assert_eq!(upper.min_y, lower.max_y + 1);
                assert!(upper.min_x <= lower.min_x && lower.max_x <= upper.max_x);
                assert!(upper.min_z <= lower.min_z && lower.max_z <= upper.max_z);
            }
        }
    }

    #[test]
    fn pieces_never_overlap() {
        for facing in Direction::HORIZONTAL {
            for seed in 0..12 {
                let pieces = city(seed, facing);
                for (i, a) in pieces.iter().enumerate() {
                    for b in &pieces[i + 1..] {
                        assert!(
                            !a.bbox.intersects(&b.bbox),
                            "seed {seed}: {} overlaps {}",
                            a.id(),
                            b.id()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn section_depth_is_capped() {
        for seed in 0..16 {
            let pieces = city(seed, Direction::North);
            assert!(pieces.iter().all(|p| p.depth <= 8));
            assert!(count(&pieces, "ECShip") <= 1);
            for bridge in pieces.iter().filter(|p| p.id() == "ECBEnd") {
                assert!(bridge.depth >= 2);
            }
        }
    }

    #[test]
    fn blocked_section_leaves_nothing_behind() {
        let mut rng = StdRng::seed_from_u64(1);
        let roof = BoundingBox::make(0, 64, 0, Direction::South, 11, 2, 11);
        let start = Piece::new(
            PieceData::EndCity(EndCityPiece::new(EndCityKind::HouseRoof)),
            roof,
            Some(Direction::South),
            0,
        );
        let config = EndCityConfig::default();
        let mut ctx = BuildContext::new(&mut rng, config.bounds.limits(), start);
        let lid = BoundingBox::new(-4, 66, -4, 14, 90, 14);
        ctx.push(Piece::new(
            PieceData::EndCity(EndCityPiece::new(EndCityKind::BridgePiece)),
            lid,
            Some(Direction::South),
            0,
        ));
        let mut build = CityBuild {
            ship_odds: config.ship_odds,
            ship_created: false,
        };
        assert!(!build.section(&mut ctx, Section::Tower, 1, PieceId(0)));
        assert_eq!(ctx.pieces.len(), 2);
    }

    #[test]
    fn ship_keeps_its_clearance() {
        for seed in 0..40 {
            let pieces = city(seed, Direction::East);
            let Some(index) = pieces.iter().position(|p| p.id() == "ECShip") else {
                continue;
            };
            let clearance = pieces[index].bbox.inflated_by(SHIP_CLEARANCE);
            for other in &pieces[..index] {
                assert!(!clearance.intersects(&other.bbox), "seed {seed}: {} crowds the ship", other.id());
            }
        }
    }

    #[test]
    fn one_shot_flags_survive_save() {
        let mut ship = EndCityPiece::new(EndCityKind::Ship);
        ship.chest_placed = true;
        ship.elytra_placed = true;
        let mut tag = NbtCompound::new();
        ship.save(&mut tag);
        assert_eq!(EndCityPiece::load("ECShip", &tag).unwrap(), ship);

        let mut bridge_tag = NbtCompound::new();
        EndCityPiece::new(EndCityKind::BridgePiece).save(&mut bridge_tag);
        assert!(bridge_tag.is_empty());
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert!(matches!(
            EndCityPiece::load("ECGarden", &NbtCompound::new()),
            Err(StructureError::UnknownPieceKind(_))
        ));
    }
}

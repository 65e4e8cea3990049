//! Writing pieces into a voxel world.
//!
//! The engine never owns world storage. It talks to a [`MaterialSink`] for
//! blocks and scheduled updates and to an [`EntitySink`] for entities,
//! spawners and loot. [`MemoryWorld`] implements both over hash maps;
//! [`SplitWorld`] pairs two separate sinks.
//!
//! Every write is clipped to the piece box intersected with the region
//! being generated, so realizing a piece against several regions in any
//! order paints each cell exactly once per region.

use std::collections::HashMap;
use std::ops::BitOr;

use crate::direction::Direction;
use crate::geometry::{BlockPos, BoundingBox};

// -----------------------------------------------------------------------
// World vocabulary
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Material {
    #[default]
    Air,
    Water,
    Lava,
    NetherBricks,
    NetherBrickFence,
    StoneBricks,
    MossyStoneBricks,
    IronBars,
    OakPlanks,
    OakFence,
    Rail,
    Cobweb,
    Prismarine,
    PrismarineBricks,
    DarkPrismarine,
    SeaLantern,
    DarkOakPlanks,
    Cobblestone,
    Bookshelf,
    Chest,
    Spawner,
    EndPortalFrame,
    OakDoor,
    IronDoor,
    Purpur,
    EndStoneBricks,
    EndRod,
    Sandstone,
    CutSandstone,
    OrangeTerracotta,
    BlueTerracotta,
    Tnt,
    StonePressurePlate,
}

impl Material {
    pub fn is_fluid(self) -> bool {
        matches!(self, Material::Water | Material::Lava)
    }
}

/// Block update flags passed through to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateFlags(pub u8);

impl UpdateFlags {
    pub const NOTIFY_NEIGHBORS: UpdateFlags = UpdateFlags(1);
    pub const SEND_TO_CLIENTS: UpdateFlags = UpdateFlags(2);

    pub fn contains(self, other: UpdateFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Fluids tell their neighbours so the flow can start.
    pub fn for_material(material: Material) -> UpdateFlags {
        if material.is_fluid() {
            UpdateFlags::SEND_TO_CLIENTS | UpdateFlags::NOTIFY_NEIGHBORS
        } else {
            UpdateFlags::SEND_TO_CLIENTS
        }
    }
}

impl BitOr for UpdateFlags {
    type Output = UpdateFlags;

    fn bitor(self, rhs: UpdateFlags) -> UpdateFlags {
        UpdateFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Wake a fluid so it starts flowing.
    FluidTick(Material),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Blaze,
    Silverfish,
    CaveSpider,
    ElderGuardian,
    Shulker,
    ElytraFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u64);

/// Loot table identifiers attached to chests.
pub mod loot {
    pub const NETHER_BRIDGE: &str = "chests/nether_bridge";
    pub const STRONGHOLD_CORRIDOR: &str = "chests/stronghold_corridor";
    pub const STRONGHOLD_CROSSING: &str = "chests/stronghold_crossing";
    pub const STRONGHOLD_LIBRARY: &str = "chests/stronghold_library";
    pub const WOODLAND_MANSION: &str = "chests/woodland_mansion";
    pub const CORRIDOR_TREE: &str = "chests/simple_dungeon";
    pub const END_CITY_TREASURE: &str = "chests/end_city_treasure";
    pub const DESERT_PYRAMID: &str = "chests/desert_pyramid";
}

pub trait MaterialSink {
    fn get_material(&self, pos: BlockPos) -> Material;

    fn set_material(&mut self, pos: BlockPos, material: Material, flags: UpdateFlags);

    fn schedule_effect(&mut self, pos: BlockPos, effect: Effect, delay: u32);

    fn within_vertical_bounds(&self, y: i32) -> bool;

    fn biome_at(&self, pos: BlockPos) -> Option<&str>;
}

pub trait EntitySink {
    fn spawn_entity(&mut self, kind: EntityKind, pos: BlockPos) -> EntityHandle;

    fn configure_spawner(&mut self, pos: BlockPos, kind: EntityKind);

    fn attach_loot_table(&mut self, pos: BlockPos, table: &'static str, seed: i64);
}

/// Anything that can take both blocks and entities.
pub trait StructureWorld: MaterialSink + EntitySink {}

impl<T: MaterialSink + EntitySink + ?Sized> StructureWorld for T {}

/// Joins a separate block sink and entity sink.
pub struct SplitWorld<'a, M: ?Sized, E: ?Sized> {
    pub blocks: &'a mut M,
    pub entities: &'a mut E,
}

impl<M: MaterialSink + ?Sized, E: ?Sized> MaterialSink for SplitWorld<'_, M, E> {
    fn get_material(&self, pos: BlockPos) -> Material {
        self.blocks.get_material(pos)
    }

    fn set_material(&mut self, pos: BlockPos, material: Material, flags: UpdateFlags) {
        self.blocks.set_material(pos, material, flags)
    }

    fn schedule_effect(&mut self, pos: BlockPos, effect: Effect, delay: u32) {
        self.blocks.schedule_effect(pos, effect, delay)
    }

    fn within_vertical_bounds(&self, y: i32) -> bool {
        self.blocks.within_vertical_bounds(y)
    }

    fn biome_at(&self, pos: BlockPos) -> Option<&str> {
        self.blocks.biome_at(pos)
    }
}

impl<M: ?Sized, E: EntitySink + ?Sized> EntitySink for SplitWorld<'_, M, E> {
    fn spawn_entity(&mut self, kind: EntityKind, pos: BlockPos) -> EntityHandle {
        self.entities.spawn_entity(kind, pos)
    }

    fn configure_spawner(&mut self, pos: BlockPos, kind: EntityKind) {
        self.entities.configure_spawner(pos, kind)
    }

    fn attach_loot_table(&mut self, pos: BlockPos, table: &'static str, seed: i64) {
        self.entities.attach_loot_table(pos, table, seed)
    }
}

/// Position-derived seed so loot does not depend on realization order.
pub fn position_seed(pos: BlockPos) -> i64 {
    let mut l = i64::from(pos.x.wrapping_mul(3_129_871))
        ^ i64::from(pos.z).wrapping_mul(116_129_781)
        ^ i64::from(pos.y);
    l = l
        .wrapping_mul(l)
        .wrapping_mul(42_317_861)
        .wrapping_add(l.wrapping_mul(11));
    l >> 16
}

// -----------------------------------------------------------------------
// Painter
// -----------------------------------------------------------------------

/// Writes in a piece's local frame, clipped to the active region.
pub struct Painter<'w> {
    world: &'w mut dyn StructureWorld,
    frame: BoundingBox,
    orientation: Option<Direction>,
    clip: BoundingBox,
    pub writes: usize,
}

impl<'w> Painter<'w> {
    /// Returns `None` when the piece does not reach into `region`.
    pub fn new(
        world: &'w mut dyn StructureWorld,
        frame: BoundingBox,
        orientation: Option<Direction>,
        region: &BoundingBox,
    ) -> Option<Self> {
        let clip = frame.intersection(region)?;
        Some(Self {
            world,
            frame,
            // world-space pieces paint relative to their min corner
            orientation: orientation.or(Some(Direction::South)),
            clip,
            writes: 0,
        })
    }

    /// The piece's world box.
    pub fn frame(&self) -> BoundingBox {
        self.frame
    }

    pub fn orientation(&self) -> Option<Direction> {
        self.orientation
    }

    pub fn world_pos(&self, x: i32, y: i32, z: i32) -> BlockPos {
        self.frame.world_pos(self.orientation, x, y, z)
    }

    /// Whether a local cell may be written: inside the clip region and
    /// within the world's vertical bounds.
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        let pos = self.world_pos(x, y, z);
        self.clip.is_inside(pos) && self.world.within_vertical_bounds(pos.y)
    }

    pub fn get(&self, x: i32, y: i32, z: i32) -> Material {
        self.world.get_material(self.world_pos(x, y, z))
    }

    pub fn place(&mut self, material: Material, x: i32, y: i32, z: i32) {
        if !self.contains(x, y, z) {
            return;
        }
        let pos = self.world_pos(x, y, z);
        self.world.set_material(pos, material, UpdateFlags::for_material(material));
        self.writes += 1;
    }

    /// Fills a local box with one material.
    #[allow(clippy::too_many_arguments)]
    pub fn fill(&mut self, material: Material, x0: i32, y0: i32, z0: i32, x1: i32, y1: i32, z1: i32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                for z in z0..=z1 {
                    self.place(material, x, y, z);
                }
            }
        }
    }

    /// Fills a local box with `wall` on its faces and `inside` elsewhere.
    #[allow(clippy::too_many_arguments)]
    pub fn shell(
        &mut self,
        wall: Material,
        inside: Material,
        x0: i32,
        y0: i32,
        z0: i32,
        x1: i32,
        y1: i32,
        z1: i32,
    ) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                for z in z0..=z1 {
                    let edge = y == y0 || y == y1 || x == x0 || x == x1 || z == z0 || z == z1;
                    self.place(if edge { wall } else { inside }, x, y, z);
                }
            }
        }
    }

    /// Local size of the piece, in its own frame.
    pub fn local_size(&self) -> (i32, i32, i32) {
        self.frame.local_size(self.orientation)
    }

    /// Paints the whole piece as a hollow box.
    pub fn hollow(&mut self, wall: Material, inside: Material) {
        let (w, h, d) = self.local_size();
        self.shell(wall, inside, 0, 0, 0, w - 1, h - 1, d - 1);
    }

    /// Places a chest and, the first time only, its loot table.
    ///
    /// Returns true once the loot has been attached, so callers can store
    /// the result in their one-shot flag.
    pub fn chest(&mut self, x: i32, y: i32, z: i32, table: &'static str, attached: bool) -> bool {
        if !self.contains(x, y, z) {
            return attached;
        }
        self.place(Material::Chest, x, y, z);
        if !attached {
            let pos = self.world_pos(x, y, z);
            self.world.attach_loot_table(pos, table, position_seed(pos));
        }
        true
    }

    pub fn spawner(&mut self, x: i32, y: i32, z: i32, kind: EntityKind, configured: bool) -> bool {
        if !self.contains(x, y, z) {
            return configured;
        }
        self.place(Material::Spawner, x, y, z);
        if !configured {
            let pos = self.world_pos(x, y, z);
            self.world.configure_spawner(pos, kind);
        }
        true
    }

    pub fn spawn_entity(&mut self, x: i32, y: i32, z: i32, kind: EntityKind, spawned: bool) -> bool {
        if spawned || !self.contains(x, y, z) {
            return spawned;
        }
        let pos = self.world_pos(x, y, z);
        self.world.spawn_entity(kind, pos);
        true
    }

    /// Places a fluid source and wakes it once.
    pub fn fluid_source(&mut self, fluid: Material, x: i32, y: i32, z: i32, scheduled: bool) -> bool {
        if !self.contains(x, y, z) {
            return scheduled;
        }
        self.place(fluid, x, y, z);
        if !scheduled {
            let pos = self.world_pos(x, y, z);
            self.world.schedule_effect(pos, Effect::FluidTick(fluid), 0);
        }
        true
    }
}

// -----------------------------------------------------------------------
// In-memory world
// -----------------------------------------------------------------------

/// Hash-map world used by tests and the demo binary.
#[derive(Debug, Clone)]
pub struct MemoryWorld {
    pub blocks: HashMap<BlockPos, Material>,
    pub effects: Vec<(BlockPos, Effect, u32)>,
    pub entities: Vec<(EntityHandle, EntityKind, BlockPos)>,
    pub spawners: Vec<(BlockPos, EntityKind)>,
    pub loot: Vec<(BlockPos, &'static str, i64)>,
    pub min_y: i32,
    pub max_y: i32,
    biomes: Vec<(BoundingBox, String)>,
    default_biome: Option<String>,
    next_entity: u64,
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new(-64, 319)
    }
}

impl MemoryWorld {
    pub fn new(min_y: i32, max_y: i32) -> Self {
        Self {
            blocks: HashMap::new(),
            effects: Vec::new(),
            entities: Vec::new(),
            spawners: Vec::new(),
            loot: Vec::new(),
            min_y,
            max_y,
            biomes: Vec::new(),
            default_biome: None,
            next_entity: 1,
        }
    }

    pub fn with_default_biome(mut self, biome: impl Into<String>) -> Self {
        self.default_biome = Some(biome.into());
        self
    }

    /// Later areas win over earlier ones.
    pub fn set_biome_area(&mut self, area: BoundingBox, biome: impl Into<String>) {
        self.biomes.push((area, biome.into()));
    }

    pub fn non_air_count(&self) -> usize {
        self.blocks.values().filter(|m| **m != Material::Air).count()
    }
}

impl MaterialSink for MemoryWorld {
    fn get_material(&self, pos: BlockPos) -> Material {
        self.blocks.get(&pos).copied().unwrap_or_default()
    }

    fn set_material(&mut self, pos: BlockPos, material: Material, _flags: UpdateFlags) {
        self.blocks.insert(pos, material);
    }

    fn schedule_effect(&mut self, pos: BlockPos, effect: Effect, delay: u32) {
        self.effects.push((pos, effect, delay));
    }

    fn within_vertical_bounds(&self, y: i32) -> bool {
        (self.min_y..=self.max_y).contains(&y)
    }

    fn biome_at(&self, pos: BlockPos) -> Option<&str> {
        self.biomes
            .iter()
            .rev()
            .find(|(area, _)| area.is_inside(pos))
            .map(|(_, biome)| biome.as_str())
            .or(self.default_biome.as_deref())
    }
}

impl EntitySink for MemoryWorld {
    fn spawn_entity(&mut self, kind: EntityKind, pos: BlockPos) -> EntityHandle {
        let handle = EntityHandle(self.next_entity);
        self.next_entity += 1;
        self.entities.push((handle, kind, pos));
        handle
    }

    fn configure_spawner(&mut self, pos: BlockPos, kind: EntityKind) {
        self.spawners.push((pos, kind));
    }

    fn attach_loot_table(&mut self, pos: BlockPos, table: &'static str, seed: i64) {
        self.loot.push((pos, table, seed));
    }
}

/// Counters returned by a region pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RealizeStats {
    pub pieces: usize,
    pub skipped_by_biome: usize,
    pub writes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> BoundingBox {
        BoundingBox::new(10, 64, 10, 14, 68, 16)
    }

    #[test]
    fn writes_are_clipped_to_the_region() {
        let mut world = MemoryWorld::default();
        let region = BoundingBox::new(0, 0, 0, 12, 255, 100);
        let mut painter = Painter::new(&mut world, frame(), Some(Direction::North), &region).unwrap();
        painter.fill(Material::StoneBricks, 0, 0, 0, 4, 0, 6);
        assert_eq!(painter.writes, 3 * 7);
        assert!(world.blocks.keys().all(|p| p.x <= 12));
    }

    #[test]
    fn disjoint_region_gives_no_painter() {
        let mut world = MemoryWorld::default();
        let region = BoundingBox::new(100, 0, 100, 115, 255, 115);
        assert!(Painter::new(&mut world, frame(), Some(Direction::South), &region).is_none());
    }

    #[test]
    fn north_frame_counts_from_max_z() {
        let mut world = MemoryWorld::default();
        let mut painter = Painter::new(&mut world, frame(), Some(Direction::North), &frame()).unwrap();
        painter.place(Material::Cobblestone, 0, 0, 0);
        assert_eq!(world.get_material(BlockPos::new(10, 64, 16)), Material::Cobblestone);
    }

    #[test]
    fn chest_loot_is_attached_once() {
        let mut world = MemoryWorld::default();
        let mut attached = false;
        for _ in 0..2 {
            let mut painter = Painter::new(&mut world, frame(), Some(Direction::East), &frame()).unwrap();
            attached = painter.chest(1, 1, 1, loot::STRONGHOLD_LIBRARY, attached);
        }
        assert!(attached);
        assert_eq!(world.loot.len(), 1);
        let (pos, table, seed) = world.loot[0];
        assert_eq!(world.get_material(pos), Material::Chest);
        assert_eq!(table, loot::STRONGHOLD_LIBRARY);
        assert_eq!(seed, position_seed(pos));
    }

    #[test]
    fn chest_outside_the_region_stays_pending() {
        let mut world = MemoryWorld::default();
        let region = BoundingBox::new(10, 64, 10, 10, 68, 16);
        let mut painter = Painter::new(&mut world, frame(), Some(Direction::South), &region).unwrap();
        assert!(!painter.chest(3, 1, 1, loot::NETHER_BRIDGE, false));
        assert!(world.loot.is_empty());
    }

    #[test]
    fn fluid_sources_schedule_one_tick() {
        let mut world = MemoryWorld::default();
        let mut scheduled = false;
        for _ in 0..3 {
            let mut painter = Painter::new(&mut world, frame(), Some(Direction::South), &frame()).unwrap();
            scheduled = painter.fluid_source(Material::Lava, 2, 1, 2, scheduled);
        }
        assert_eq!(world.effects.len(), 1);
        assert!(matches!(world.effects[0].1, Effect::FluidTick(Material::Lava)));
    }

    #[test]
    fn vertical_bounds_drop_writes() {
        let mut world = MemoryWorld::new(0, 65);
        let mut painter = Painter::new(&mut world, frame(), Some(Direction::South), &frame()).unwrap();
        painter.fill(Material::Prismarine, 0, 0, 0, 0, 4, 0);
        assert_eq!(painter.writes, 2);
    }

    #[test]
    fn one_shots_wait_for_the_vertical_bounds() {
        let mut world = MemoryWorld::new(0, 64);
        let mut painter = Painter::new(&mut world, frame(), Some(Direction::South), &frame()).unwrap();
        assert!(!painter.chest(1, 2, 1, loot::NETHER_BRIDGE, false));
        assert!(!painter.spawner(1, 3, 1, EntityKind::Blaze, false));
        assert!(!painter.fluid_source(Material::Lava, 2, 1, 2, false));
        assert!(!painter.spawn_entity(2, 2, 2, EntityKind::ElderGuardian, false));
        assert!(painter.chest(1, 0, 1, loot::NETHER_BRIDGE, false));
        assert_eq!(world.loot.len(), 1);
        assert!(world.spawners.is_empty());
        assert!(world.effects.is_empty());
        assert!(world.entities.is_empty());
    }

    #[derive(Default)]
    struct FlagLog {
        writes: Vec<(Material, UpdateFlags)>,
    }

    impl MaterialSink for FlagLog {
        fn get_material(&self, _pos: BlockPos) -> Material {
            Material::Air
        }

        fn set_material(&mut self, _pos: BlockPos, material: Material, flags: UpdateFlags) {
            self.writes.push((material, flags));
        }

        fn schedule_effect(&mut self, _pos: BlockPos, _effect: Effect, _delay: u32) {}

        fn within_vertical_bounds(&self, _y: i32) -> bool {
            true
        }

        fn biome_at(&self, _pos: BlockPos) -> Option<&str> {
            None
        }
    }

    #[test]
    fn fluids_notify_their_neighbours() {
        let mut blocks = FlagLog::default();
        let mut entities = MemoryWorld::default();
        let mut world = SplitWorld {
            blocks: &mut blocks,
            entities: &mut entities,
        };
        let mut painter = Painter::new(&mut world, frame(), None, &frame()).unwrap();
        painter.place(Material::NetherBricks, 0, 0, 0);
        painter.place(Material::Water, 1, 0, 0);
        let [(_, solid), (_, water)] = blocks.writes[..] else {
            panic!("expected two writes, got {:?}", blocks.writes);
        };
        assert!(!solid.contains(UpdateFlags::NOTIFY_NEIGHBORS));
        assert!(water.contains(UpdateFlags::NOTIFY_NEIGHBORS));
        assert!(water.contains(UpdateFlags::SEND_TO_CLIENTS));
    }

    #[test]
    fn split_world_routes_entities() {
        let mut blocks = MemoryWorld::default();
        let mut entities = MemoryWorld::default();
        let mut world = SplitWorld {
            blocks: &mut blocks,
            entities: &mut entities,
        };
        let mut painter = Painter::new(&mut world, frame(), None, &frame()).unwrap();
        assert!(painter.spawner(0, 0, 0, EntityKind::Blaze, false));
        assert_eq!(blocks.get_material(BlockPos::new(10, 64, 10)), Material::Spawner);
        assert!(blocks.spawners.is_empty());
        assert_eq!(entities.spawners, vec![(BlockPos::new(10, 64, 10), EntityKind::Blaze)]);
        assert!(entities.blocks.is_empty());
    }

    #[test]
    fn biome_areas_override_the_default() {
        let mut world = MemoryWorld::default().with_default_biome("plains");
        world.set_biome_area(BoundingBox::new(0, 0, 0, 10, 100, 10), "ocean");
        assert_eq!(world.biome_at(BlockPos::new(5, 50, 5)), Some("ocean"));
        assert_eq!(world.biome_at(BlockPos::new(50, 50, 5)), Some("plains"));
        assert_eq!(MemoryWorld::default().biome_at(BlockPos::new(0, 0, 0)), None);
    }
}

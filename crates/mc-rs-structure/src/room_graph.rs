//! The 3-D room graph behind the ocean monument.
//!
//! Room slots sit on a 5x3x5 lattice. Each definition lives in an arena and
//! refers to its neighbours by arena slot, one per face in 3-D data order.
//! After the core room claims its block, rooms close up to two openings
//! each as long as both sides can still reach the entrance.

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::trace;

use crate::direction::Direction;
use crate::random::StructureRng;

pub const GRID_WIDTH: i32 = 5;
pub const GRID_HEIGHT: i32 = 3;
pub const GRID_DEPTH: i32 = 5;
pub const GRID_SIZE: usize = 75;

pub const LEFT_WING_INDEX: i32 = 1001;
pub const RIGHT_WING_INDEX: i32 = 1002;
pub const PENTHOUSE_INDEX: i32 = 1003;

pub fn room_index(x: i32, y: i32, z: i32) -> i32 {
    y * GRID_WIDTH * GRID_DEPTH + z * GRID_WIDTH + x
}

pub const SOURCE_INDEX: i32 = 2;
pub const TOP_CONNECT_INDEX: i32 = 2 * 25 + 2;
pub const LEFT_WING_CONNECT_INDEX: i32 = 25;
pub const RIGHT_WING_CONNECT_INDEX: i32 = 25 + 4;

/// Arena slot of a room definition.
pub type Slot = usize;

#[derive(Debug, Clone)]
pub struct RoomDefinition {
    /// Lattice index, or one of the special indices for rooms off the grid.
    pub index: i32,
    pub connections: [Option<Slot>; 6],
    pub openings: [bool; 6],
    pub claimed: bool,
    pub is_source: bool,
}

impl RoomDefinition {
    fn new(index: i32) -> Self {
        Self {
            index,
            connections: [None; 6],
            openings: [false; 6],
            claimed: false,
            is_source: false,
        }
    }

    pub fn is_special(&self) -> bool {
        self.index >= GRID_SIZE as i32
    }

    pub fn has_opening(&self, dir: Direction) -> bool {
        self.openings[dir.data_3d()]
    }

    /// Lattice coordinates `(x, y, z)`.
    pub fn coords(&self) -> (i32, i32, i32) {
        let i = self.index;
        (i % 5, i / 25, i / 5 % 5)
    }

    /// Openings packed into the low six bits, bit `n` for 3-D value `n`.
    pub fn opening_mask(&self) -> i32 {
        self.openings
            .iter()
            .enumerate()
            .filter(|(_, open)| **open)
            .fold(0, |mask, (i, _)| mask | (1 << i))
    }
}

#[derive(Debug, Clone)]
pub struct RoomGraph {
    pub rooms: Vec<RoomDefinition>,
    pub source: Slot,
    pub core: Slot,
    /// Grid rooms in shuffled order followed by the penthouse and wings.
    pub order: Vec<Slot>,
}

impl RoomGraph {
    pub fn generate(rng: &mut dyn RngCore) -> Self {
        let mut rooms = Vec::new();
        let mut lattice: [Option<Slot>; GRID_SIZE] = [None; GRID_SIZE];
        let mut define = |rooms: &mut Vec<RoomDefinition>, x: i32, y: i32, z: i32| {
            let index = room_index(x, y, z);
            lattice[index as usize] = Some(rooms.len());
            rooms.push(RoomDefinition::new(index));
        };
        for y in 0..2 {
            for x in 0..5 {
                for z in 0..4 {
                    define(&mut rooms, x, y, z);
                }
            }
        }
        for x in 1..4 {
            for z in 0..2 {
                define(&mut rooms, x, 2, z);
            }
        }

        let mut graph = Self {
            rooms,
            source: 0,
            core: 0,
            order: Vec::new(),
        };

        // lattice z grows northwards
        for x in 0..GRID_WIDTH {
            for z in 0..GRID_DEPTH {
                for y in 0..GRID_HEIGHT {
                    let Some(here) = lattice[room_index(x, y, z) as usize] else {
                        continue;
                    };
                    for dir in Direction::ALL {
                        let (nx, ny, nz) = (x + dir.step_x(), y + dir.step_y(), z + dir.step_z());
                        if !(0..GRID_WIDTH).contains(&nx)
                            || !(0..GRID_HEIGHT).contains(&ny)
                            || !(0..GRID_DEPTH).contains(&nz)
                        {
                            continue;
                        }
                        if let Some(there) = lattice[room_index(nx, ny, nz) as usize] {
                            let face = if nz == z { dir } else { dir.opposite() };
                            graph.connect(here, face, there);
                        }
                    }
                }
            }
        }

        let penthouse = graph.push(PENTHOUSE_INDEX);
        let left_wing = graph.push(LEFT_WING_INDEX);
        let right_wing = graph.push(RIGHT_WING_INDEX);
        let slot_of = |index: i32| lattice[index as usize].unwrap_or_default();
        graph.connect(slot_of(TOP_CONNECT_INDEX), Direction::Up, penthouse);
        graph.connect(slot_of(LEFT_WING_CONNECT_INDEX), Direction::South, left_wing);
        graph.connect(slot_of(RIGHT_WING_CONNECT_INDEX), Direction::South, right_wing);
        for special in [penthouse, left_wing, right_wing] {
            graph.rooms[special].claimed = true;
        }

        graph.source = slot_of(SOURCE_INDEX);
        graph.rooms[graph.source].is_source = true;
        graph.core = slot_of(room_index(rng.next_int(4), 0, 2));
        graph.claim_core_block();

        let mut order: Vec<Slot> = lattice.iter().flatten().copied().collect();
        for &slot in &order {
            graph.update_openings(slot);
        }
        graph.update_openings(penthouse);
        order.shuffle(&mut *rng);

        for &slot in &order {
            let mut closed = 0;
            let mut tries = 0;
            while closed < 2 && tries < 5 {
                tries += 1;
                let face = rng.next_int(6) as usize;
                if !graph.rooms[slot].openings[face] {
                    continue;
                }
                let Some(other) = graph.rooms[slot].connections[face] else {
                    continue;
                };
                let back = Direction::from_data_3d(face).opposite().data_3d();
                graph.rooms[slot].openings[face] = false;
                graph.rooms[other].openings[back] = false;
                if graph.find_source(slot) && graph.find_source(other) {
                    closed += 1;
                    trace!(room = graph.rooms[slot].index, face, "closed monument opening");
                } else {
                    graph.rooms[slot].openings[face] = true;
                    graph.rooms[other].openings[back] = true;
                }
            }
        }

        order.extend([penthouse, left_wing, right_wing]);
        graph.order = order;
        graph
    }

    fn push(&mut self, index: i32) -> Slot {
        self.rooms.push(RoomDefinition::new(index));
        self.rooms.len() - 1
    }

    /// Links `a` to `b` through `face` and `b` back through the opposite.
    fn connect(&mut self, a: Slot, face: Direction, b: Slot) {
        self.rooms[a].connections[face.data_3d()] = Some(b);
        self.rooms[b].connections[face.opposite().data_3d()] = Some(a);
    }

    fn update_openings(&mut self, slot: Slot) {
        let room = &mut self.rooms[slot];
        for (open, link) in room.openings.iter_mut().zip(room.connections.iter()) {
            *open = link.is_some();
        }
    }

    /// The neighbour of `slot` through `face`.
    pub fn neighbour(&self, slot: Slot, face: Direction) -> Option<Slot> {
        self.rooms[slot].connections[face.data_3d()]
    }

    /// Claims the core room's 2x2x2 block.
    fn claim_core_block(&mut self) {
        let core = self.core;
        let east = self.neighbour(core, Direction::East);
        let north = self.neighbour(core, Direction::North);
        let east_north = east.and_then(|s| self.neighbour(s, Direction::North));
        let lower = [Some(core), east, north, east_north];
        let upper: Vec<Option<Slot>> = lower
            .iter()
            .map(|s| s.and_then(|s| self.neighbour(s, Direction::Up)))
            .collect();
        for slot in lower.into_iter().chain(upper).flatten() {
            self.rooms[slot].claimed = true;
        }
    }

    /// Whether `start` can still reach the entrance through open faces.
    fn find_source(&self, start: Slot) -> bool {
        let mut seen = vec![false; self.rooms.len()];
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(slot) = stack.pop() {
            let room = &self.rooms[slot];
            if room.is_source {
                return true;
            }
            for face in 0..6 {
                if !room.openings[face] {
                    continue;
                }
                if let Some(next) = room.connections[face] {
                    if !seen[next] {
                        seen[next] = true;
                        stack.push(next);
                    }
                }
            }
        }
        false
    }

    /// Whether every grid room still reaches the entrance.
    pub fn all_reach_source(&self) -> bool {
        self.rooms
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_special())
            .all(|(slot, _)| self.find_source(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn graph(seed: u64) -> RoomGraph {
        RoomGraph::generate(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn lattice_population() {
        let graph = graph(1);
        let grid_rooms = graph.rooms.iter().filter(|r| !r.is_special()).count();
        assert_eq!(grid_rooms, 20 + 20 + 6);
        assert_eq!(graph.rooms.len(), grid_rooms + 3);
        assert_eq!(graph.order.len(), graph.rooms.len());
        assert_eq!(graph.rooms[graph.source].index, SOURCE_INDEX);
    }

    #[test]
    fn connections_are_symmetric() {
        let graph = graph(2);
        for (slot, room) in graph.rooms.iter().enumerate() {
            for dir in Direction::ALL {
                if let Some(other) = graph.neighbour(slot, dir) {
                    assert_eq!(graph.neighbour(other, dir.opposite()), Some(slot));
                }
            }
            for face in 0..6 {
                if room.openings[face] {
                    assert!(room.connections[face].is_some());
                }
            }
        }
    }

    #[test]
    fn core_claims_its_block() {
        for seed in 0..10 {
            let graph = graph(seed);
            let core = &graph.rooms[graph.core];
            let (x, y, z) = core.coords();
            assert!((0..4).contains(&x));
            assert_eq!((y, z), (0, 2));
            assert_eq!(graph.rooms.iter().filter(|r| r.claimed && !r.is_special()).count(), 8);
        }
    }

    #[test]
    fn closing_keeps_every_room_connected() {
        for seed in 0..10 {
            assert!(graph(seed).all_reach_source(), "seed {seed}");
        }
    }

    #[test]
    fn wings_hang_off_the_middle_floor() {
        let graph = graph(4);
        let left = graph.rooms.iter().position(|r| r.index == LEFT_WING_INDEX).unwrap();
        let anchor = graph.neighbour(left, Direction::North).unwrap();
        assert_eq!(graph.rooms[anchor].index, LEFT_WING_CONNECT_INDEX);
    }
}

//! The 2-D room-grid carver behind the woodland mansion.
//!
//! A layout grid is carved with corridor walks from a fixed entrance and
//! cleaned up until stable. Every floor then groups its room cells into
//! 1x1, 1x2 and 2x2 rooms with a door cell that touches a corridor. Grid
//! `y` runs along world south; `x` runs along world east.

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::debug;

use crate::direction::Direction;
use crate::random::StructureRng;

/// Layout cell states.
pub mod cell {
    pub const CLEAR: i32 = 0;
    pub const CORRIDOR: i32 = 1;
    pub const ROOM: i32 = 2;
    pub const START: i32 = 3;
    pub const TEST: i32 = 4;
    pub const BLOCKED: i32 = 5;
}

/// Bit flags of the per-floor room grids.
pub mod room {
    pub const SIZE_1X1: i32 = 0x10000;
    pub const SIZE_1X2: i32 = 0x20000;
    pub const SIZE_2X2: i32 = 0x40000;
    pub const ORIGIN: i32 = 0x100000;
    pub const DOOR: i32 = 0x200000;
    pub const STAIRS: i32 = 0x400000;
    pub const CORRIDOR: i32 = 0x800000;
    pub const TYPE_MASK: i32 = 0xF0000;
    pub const ID_MASK: i32 = 0xFFFF;

    pub const FIRST_ID: i32 = 10;
}

pub const GRID_SIZE: i32 = 11;
pub const ENTRANCE: (i32, i32) = (7, 4);

// ---------------------------------------------------------------------------
// SimpleGrid
// ---------------------------------------------------------------------------

/// Fixed-size int grid that answers reads outside its bounds with a fixed
/// value and ignores writes there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleGrid {
    width: i32,
    height: i32,
    outside: i32,
    cells: Vec<i32>,
}

impl SimpleGrid {
    pub fn new(width: i32, height: i32, outside: i32) -> Self {
        Self {
            width,
            height,
            outside,
            cells: vec![0; (width.max(0) * height.max(0)) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: i32, y: i32) -> i32 {
        self.index(x, y).map_or(self.outside, |i| self.cells[i])
    }

    pub fn set(&mut self, x: i32, y: i32, value: i32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value;
        }
    }

    /// Sets every cell of the inclusive rectangle.
    pub fn set_area(&mut self, min_x: i32, min_y: i32, max_x: i32, max_y: i32, value: i32) {
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                self.set(x, y, value);
            }
        }
    }

    pub fn set_if(&mut self, x: i32, y: i32, old: i32, value: i32) {
        if self.get(x, y) == old {
            self.set(x, y, value);
        }
    }

    /// Whether any of the four neighbours holds `value`.
    pub fn edges_to(&self, x: i32, y: i32, value: i32) -> bool {
        self.get(x - 1, y) == value
            || self.get(x + 1, y) == value
            || self.get(x, y + 1) == value
            || self.get(x, y - 1) == value
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, i32)> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y, self.get(x, y))))
    }
}

pub fn is_house(layout: &SimpleGrid, x: i32, y: i32) -> bool {
    matches!(
        layout.get(x, y),
        cell::CORRIDOR | cell::ROOM | cell::START | cell::TEST
    )
}

fn step(dir: Direction) -> (i32, i32) {
    (dir.step_x(), dir.step_z())
}

// ---------------------------------------------------------------------------
// Carving
// ---------------------------------------------------------------------------

/// Walks a corridor of up to `length` cells from `(x, y)`, marking the
/// cells around it as rooms.
pub fn recursive_corridor(
    layout: &mut SimpleGrid,
    rng: &mut dyn RngCore,
    x: i32,
    y: i32,
    dir: Direction,
    length: i32,
) {
    if length <= 0 {
        return;
    }
    let (dx, dy) = step(dir);
    layout.set(x, y, cell::CORRIDOR);
    layout.set_if(x + dx, y + dy, cell::CLEAR, cell::CORRIDOR);

    for _ in 0..8 {
        let turn = Direction::from_data_2d(rng.next_int(4));
        if turn == dir.opposite() || (turn == Direction::East && rng.next_bool()) {
            continue;
        }
        let (tx, ty) = step(turn);
        let (nx, ny) = (x + dx, y + dy);
        if layout.get(nx + tx, ny + ty) == cell::CLEAR && layout.get(nx + tx * 2, ny + ty * 2) == cell::CLEAR {
            recursive_corridor(layout, rng, nx + tx, ny + ty, turn, length - 1);
            break;
        }
    }

    let (cx, cy) = step(dir.clockwise());
    let (ax, ay) = step(dir.counter_clockwise());
    for (ox, oy) in [
        (cx, cy),
        (ax, ay),
        (dx + cx, dy + cy),
        (dx + ax, dy + ay),
        (dx * 2, dy * 2),
        (cx * 2, cy * 2),
        (ax * 2, ay * 2),
    ] {
        layout.set_if(x + ox, y + oy, cell::CLEAR, cell::ROOM);
    }
}

/// Fills clear cells that are mostly surrounded by the house. Returns
/// whether anything changed.
pub fn clean_edges(layout: &mut SimpleGrid) -> bool {
    let mut changed = false;
    for y in 0..layout.height() {
        for x in 0..layout.width() {
            if layout.get(x, y) != cell::CLEAR {
                continue;
            }
            let sides = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                .iter()
                .filter(|(dx, dy)| is_house(layout, x + dx, y + dy))
                .count();
            let fill = match sides {
                n if n >= 3 => true,
                2 => {
                    let corners = [(1, 1), (-1, 1), (1, -1), (-1, -1)]
                        .iter()
                        .filter(|(dx, dy)| is_house(layout, x + dx, y + dy))
                        .count();
                    corners <= 1
                }
                _ => false,
            };
            if fill {
                layout.set(x, y, cell::ROOM);
                changed = true;
            }
        }
    }
    changed
}

/// Groups the layout's room cells into rooms written to `rooms`.
///
/// Cells are visited in shuffled order. A free cell grows into a 2x2 room
/// when it can, else a 1x2, else stays 1x1. The door cell is a corner of
/// the room that touches a corridor; up to four corners are tried before
/// the room is left doorless.
pub fn identify_rooms(layout: &SimpleGrid, rooms: &mut SimpleGrid, rng: &mut dyn RngCore) {
    let mut candidates: Vec<(i32, i32)> = layout
        .cells()
        .filter(|&(_, _, v)| v == cell::ROOM)
        .map(|(x, y, _)| (x, y))
        .collect();
    candidates.shuffle(&mut *rng);

    let free = |rooms: &SimpleGrid, x: i32, y: i32| rooms.get(x, y) == 0 && layout.get(x, y) == cell::ROOM;

    let mut id = room::FIRST_ID;
    for (a, b) in candidates {
        if rooms.get(a, b) != 0 {
            continue;
        }
        let taken: &SimpleGrid = rooms;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (a, a, b, b);
        let mut size = room::SIZE_1X1;
        if free(taken, a + 1, b) && free(taken, a, b + 1) && free(taken, a + 1, b + 1) {
            max_x = a + 1;
            max_y = b + 1;
            size = room::SIZE_2X2;
        } else if free(taken, a - 1, b) && free(taken, a, b + 1) && free(taken, a - 1, b + 1) {
            min_x = a - 1;
            max_y = b + 1;
            size = room::SIZE_2X2;
        } else if free(taken, a - 1, b) && free(taken, a, b - 1) && free(taken, a - 1, b - 1) {
            min_x = a - 1;
            min_y = b - 1;
            size = room::SIZE_2X2;
        } else if free(taken, a + 1, b) {
            max_x = a + 1;
            size = room::SIZE_1X2;
        } else if free(taken, a, b + 1) {
            max_y = b + 1;
            size = room::SIZE_1X2;
        } else if free(taken, a - 1, b) {
            min_x = a - 1;
            size = room::SIZE_1X2;
        } else if free(taken, a, b - 1) {
            min_y = b - 1;
            size = room::SIZE_1X2;
        }

        let flip = |v: i32, lo: i32, hi: i32| if v == lo { hi } else { lo };
        let mut door_x = if rng.next_bool() { min_x } else { max_x };
        let mut door_y = if rng.next_bool() { min_y } else { max_y };
        let mut door = room::DOOR;
        if !layout.edges_to(door_x, door_y, cell::CORRIDOR) {
            door_x = flip(door_x, min_x, max_x);
            door_y = flip(door_y, min_y, max_y);
            if !layout.edges_to(door_x, door_y, cell::CORRIDOR) {
                door_y = flip(door_y, min_y, max_y);
                if !layout.edges_to(door_x, door_y, cell::CORRIDOR) {
                    door_x = flip(door_x, min_x, max_x);
                    door_y = flip(door_y, min_y, max_y);
                    if !layout.edges_to(door_x, door_y, cell::CORRIDOR) {
                        door = 0;
                        door_x = min_x;
                        door_y = min_y;
                    }
                }
            }
        }

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let value = if x == door_x && y == door_y {
                    room::ORIGIN | door | size | id
                } else {
                    size | id
                };
                rooms.set(x, y, value);
            }
        }
        id += 1;
    }
}

// ---------------------------------------------------------------------------
// Mansion grid
// ---------------------------------------------------------------------------

/// The carved layout of one mansion: the shared layout of the two lower
/// floors, the third floor layout and one room grid per floor.
#[derive(Debug, Clone)]
pub struct MansionGrid {
    pub base: SimpleGrid,
    pub third_floor: SimpleGrid,
    pub floor_rooms: [SimpleGrid; 3],
    pub entrance: (i32, i32),
}

impl MansionGrid {
    pub fn generate(rng: &mut dyn RngCore) -> Self {
        let (ex, ey) = ENTRANCE;
        let mut base = SimpleGrid::new(GRID_SIZE, GRID_SIZE, cell::BLOCKED);
        base.set_area(ex, ey, ex + 1, ey + 1, cell::START);
        base.set_area(ex - 1, ey, ex - 1, ey + 1, cell::ROOM);
        base.set_area(ex + 2, ey - 2, ex + 3, ey + 3, cell::BLOCKED);
        base.set_area(ex + 1, ey - 2, ex + 1, ey - 1, cell::CORRIDOR);
        base.set_area(ex + 1, ey + 2, ex + 1, ey + 3, cell::CORRIDOR);
        base.set(ex - 1, ey - 1, cell::CORRIDOR);
        base.set(ex - 1, ey + 2, cell::CORRIDOR);
        base.set_area(0, 0, GRID_SIZE, 1, cell::BLOCKED);
        base.set_area(0, 9, GRID_SIZE, GRID_SIZE, cell::BLOCKED);

        recursive_corridor(&mut base, rng, ex, ey - 2, Direction::West, 6);
        recursive_corridor(&mut base, rng, ex, ey + 3, Direction::West, 6);
        recursive_corridor(&mut base, rng, ex - 2, ey - 1, Direction::West, 3);
        recursive_corridor(&mut base, rng, ex - 2, ey + 2, Direction::West, 3);
        while clean_edges(&mut base) {}

        let blank = || SimpleGrid::new(GRID_SIZE, GRID_SIZE, cell::BLOCKED);
        let mut floor_rooms = [blank(), blank(), blank()];
        identify_rooms(&base, &mut floor_rooms[0], rng);
        identify_rooms(&base, &mut floor_rooms[1], rng);
        // the shaft behind the entrance hall
        floor_rooms[0].set_area(ex + 1, ey, ex + 1, ey + 1, room::CORRIDOR);
        floor_rooms[1].set_area(ex + 1, ey, ex + 1, ey + 1, room::CORRIDOR);

        let mut grid = Self {
            third_floor: SimpleGrid::new(GRID_SIZE, GRID_SIZE, cell::BLOCKED),
            base,
            floor_rooms,
            entrance: ENTRANCE,
        };
        grid.setup_third_floor(rng);
        identify_rooms(&grid.third_floor, &mut grid.floor_rooms[2], rng);
        debug!(
            rooms = (0..3).map(|f| grid.room_ids(f).len()).sum::<usize>(),
            "mansion grid carved"
        );
        grid
    }

    fn block_third_floor(&mut self) {
        let (w, h) = (self.third_floor.width(), self.third_floor.height());
        self.third_floor.set_area(0, 0, w, h, cell::BLOCKED);
    }

    /// Picks a 1x2 door cell on the second floor to carry the stairs and
    /// grows the third floor from the cell above its other half.
    fn setup_third_floor(&mut self, rng: &mut dyn RngCore) {
        let candidates: Vec<(i32, i32)> = self.floor_rooms[1]
            .cells()
            .filter(|&(_, _, v)| v & room::TYPE_MASK == room::SIZE_1X2 && v & room::DOOR == room::DOOR)
            .map(|(x, y, _)| (x, y))
            .collect();
        let Some(&(sx, sy)) = candidates.choose(&mut *rng) else {
            self.block_third_floor();
            return;
        };

        let value = self.floor_rooms[1].get(sx, sy);
        self.floor_rooms[1].set(sx, sy, value | room::STAIRS);
        let Some(dir) = self.room_direction_1x2(sx, sy, 1, value & room::ID_MASK) else {
            self.floor_rooms[1].set(sx, sy, value);
            self.block_third_floor();
            return;
        };
        let (lx, ly) = (sx + dir.step_x(), sy + dir.step_z());

        for y in 0..self.third_floor.height() {
            for x in 0..self.third_floor.width() {
                if !is_house(&self.base, x, y) {
                    self.third_floor.set(x, y, cell::BLOCKED);
                } else if (x, y) == (sx, sy) {
                    self.third_floor.set(x, y, cell::START);
                } else if (x, y) == (lx, ly) {
                    self.third_floor.set(x, y, cell::START);
                    self.floor_rooms[2].set(x, y, room::CORRIDOR);
                }
            }
        }

        let open: Vec<Direction> = Direction::HORIZONTAL
            .into_iter()
            .filter(|d| self.third_floor.get(lx + d.step_x(), ly + d.step_z()) == cell::CLEAR)
            .collect();
        match open.choose(&mut *rng) {
            None => {
                self.block_third_floor();
                self.floor_rooms[1].set(sx, sy, value);
            }
            Some(&d) => {
                recursive_corridor(&mut self.third_floor, rng, lx + d.step_x(), ly + d.step_z(), d, 4);
                while clean_edges(&mut self.third_floor) {}
            }
        }
    }

    /// The layout a floor's rooms were identified from.
    pub fn layout(&self, floor: usize) -> &SimpleGrid {
        if floor == 2 {
            &self.third_floor
        } else {
            &self.base
        }
    }

    pub fn is_room_id(&self, x: i32, y: i32, floor: usize, id: i32) -> bool {
        self.floor_rooms[floor].get(x, y) & room::ID_MASK == id
    }

    /// Which neighbour holds the other half of a 1x2 room.
    pub fn room_direction_1x2(&self, x: i32, y: i32, floor: usize, id: i32) -> Option<Direction> {
        Direction::HORIZONTAL
            .into_iter()
            .find(|d| self.is_room_id(x + d.step_x(), y + d.step_z(), floor, id))
    }

    /// Distinct room ids of a floor, ascending.
    pub fn room_ids(&self, floor: usize) -> Vec<i32> {
        let mut ids: Vec<i32> = self.floor_rooms[floor]
            .cells()
            .map(|(_, _, v)| v & room::ID_MASK)
            .filter(|&id| id >= room::FIRST_ID)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Ids of rooms on `floor` that cannot be walked to from a start cell.
    pub fn unreachable_rooms(&self, floor: usize) -> Vec<i32> {
        unreachable_rooms(self.layout(floor), &self.floor_rooms[floor])
    }

    /// Gives doorless rooms a door onto a reachable corridor where one
    /// touches them. Returns how many rooms were repaired.
    pub fn repair_doorless(&mut self, floor: usize) -> usize {
        let layout = if floor == 2 { &self.third_floor } else { &self.base };
        repair_doorless(layout, &mut self.floor_rooms[floor])
    }
}

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

fn is_walkable(layout: &SimpleGrid, x: i32, y: i32) -> bool {
    matches!(layout.get(x, y), cell::CORRIDOR | cell::START)
}

/// Corridor and start cells connected to any start cell.
fn reached_cells(layout: &SimpleGrid) -> SimpleGrid {
    let mut reached = SimpleGrid::new(layout.width(), layout.height(), 0);
    let mut queue: Vec<(i32, i32)> = layout
        .cells()
        .filter(|&(_, _, v)| v == cell::START)
        .map(|(x, y, _)| (x, y))
        .collect();
    for &(x, y) in &queue {
        reached.set(x, y, 1);
    }
    while let Some((x, y)) = queue.pop() {
        for d in Direction::HORIZONTAL {
            let (nx, ny) = (x + d.step_x(), y + d.step_z());
            if reached.get(nx, ny) == 0 && is_walkable(layout, nx, ny) {
                reached.set(nx, ny, 1);
                queue.push((nx, ny));
            }
        }
    }
    reached
}

pub fn unreachable_rooms(layout: &SimpleGrid, rooms: &SimpleGrid) -> Vec<i32> {
    let reached = reached_cells(layout);
    let mut all = Vec::new();
    let mut reachable = Vec::new();
    for (x, y, v) in rooms.cells() {
        let id = v & room::ID_MASK;
        if id < room::FIRST_ID {
            continue;
        }
        all.push(id);
        if v & room::DOOR == room::DOOR && reached.edges_to(x, y, 1) {
            reachable.push(id);
        }
    }
    all.sort_unstable();
    all.dedup();
    all.retain(|id| !reachable.contains(id));
    all
}

pub fn repair_doorless(layout: &SimpleGrid, rooms: &mut SimpleGrid) -> usize {
    let reached = reached_cells(layout);
    let mut repaired = Vec::new();
    let doors: Vec<i32> = rooms
        .cells()
        .filter(|&(_, _, v)| v & room::DOOR == room::DOOR)
        .map(|(_, _, v)| v & room::ID_MASK)
        .collect();

    let cells: Vec<(i32, i32, i32)> = rooms.cells().collect();
    for (x, y, v) in cells {
        let id = v & room::ID_MASK;
        if id < room::FIRST_ID || doors.contains(&id) || repaired.contains(&id) {
            continue;
        }
        if !reached.edges_to(x, y, 1) {
            continue;
        }
        // move the origin onto this cell
        let members: Vec<(i32, i32, i32)> = rooms.cells().filter(|c| c.2 & room::ID_MASK == id).collect();
        for (ox, oy, ov) in members {
            rooms.set(ox, oy, ov & !(room::ORIGIN | room::DOOR));
        }
        rooms.set(x, y, (v & !(room::ORIGIN | room::DOOR)) | room::ORIGIN | room::DOOR);
        repaired.push(id);
    }
    if !repaired.is_empty() {
        debug!(rooms = ?repaired, "gave doorless rooms a door");
    }
    repaired.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn outside_reads_the_fill_value() {
        let mut grid = SimpleGrid::new(3, 3, cell::BLOCKED);
        grid.set(-1, 0, cell::ROOM);
        grid.set(1, 1, cell::CORRIDOR);
        assert_eq!(grid.get(-1, 0), cell::BLOCKED);
        assert_eq!(grid.get(3, 3), cell::BLOCKED);
        assert_eq!(grid.get(1, 1), cell::CORRIDOR);
        assert!(grid.edges_to(1, 0, cell::CORRIDOR));
        assert!(!grid.edges_to(0, 0, cell::CORRIDOR));
    }

    #[test]
    fn corridor_walk_west_from_the_entrance() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut layout = SimpleGrid::new(GRID_SIZE, GRID_SIZE, cell::BLOCKED);
        layout.set_area(0, 0, GRID_SIZE, 1, cell::BLOCKED);
        layout.set_area(0, 9, GRID_SIZE, GRID_SIZE, cell::BLOCKED);
        recursive_corridor(&mut layout, &mut rng, 7, 4, Direction::West, 6);

        assert_eq!(layout.get(7, 4), cell::CORRIDOR);
        assert_eq!(layout.get(6, 4), cell::CORRIDOR);
        // the walk stays inside the open band
        for (x, y, v) in layout.cells() {
            if v == cell::CORRIDOR || v == cell::ROOM {
                assert!((2..=8).contains(&y), "house cell at ({x},{y})");
            }
        }
        // every corridor cell connects back to the entrance
        layout.set(7, 4, cell::START);
        let reached = reached_cells(&layout);
        for (x, y, v) in layout.cells() {
            if v == cell::CORRIDOR {
                assert_eq!(reached.get(x, y), 1, "corridor ({x},{y}) cut off");
            }
        }
    }

    #[test]
    fn clean_edges_fills_pockets() {
        let mut layout = SimpleGrid::new(3, 3, cell::BLOCKED);
        layout.set_area(0, 0, 2, 2, cell::ROOM);
        layout.set(1, 1, cell::CLEAR);
        assert!(clean_edges(&mut layout));
        assert_eq!(layout.get(1, 1), cell::ROOM);
        assert!(!clean_edges(&mut layout));
    }

    #[test]
    fn rooms_cover_every_room_cell() {
        let mut rng = StdRng::seed_from_u64(8);
        let grid = MansionGrid::generate(&mut rng);
        for floor in 0..3 {
            let layout = grid.layout(floor);
            let rooms = &grid.floor_rooms[floor];
            for (x, y, v) in layout.cells() {
                if v == cell::ROOM {
                    assert!(rooms.get(x, y) & room::ID_MASK >= room::FIRST_ID);
                }
            }
            for id in grid.room_ids(floor) {
                let cells: Vec<_> = rooms.cells().filter(|&(_, _, v)| v & room::ID_MASK == id).collect();
                let size = cells[0].2 & room::TYPE_MASK;
                let expected = match size {
                    room::SIZE_1X1 => 1,
                    room::SIZE_1X2 => 2,
                    _ => 4,
                };
                assert_eq!(cells.len(), expected, "room {id} on floor {floor}");
                let origins = cells.iter().filter(|c| c.2 & room::ORIGIN != 0).count();
                assert_eq!(origins, 1);
            }
        }
    }

    #[test]
    fn entrance_block_is_fixed() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = MansionGrid::generate(&mut rng);
        for (x, y) in [(7, 4), (8, 4), (7, 5), (8, 5)] {
            assert_eq!(grid.base.get(x, y), cell::START);
        }
        assert_eq!(grid.floor_rooms[0].get(8, 4), room::CORRIDOR);
        assert_eq!(grid.base.get(9, 4), cell::BLOCKED);
    }

    #[test]
    fn carving_is_deterministic() {
        let a = MansionGrid::generate(&mut StdRng::seed_from_u64(77));
        let b = MansionGrid::generate(&mut StdRng::seed_from_u64(77));
        assert_eq!(a.base, b.base);
        assert_eq!(a.third_floor, b.third_floor);
        assert_eq!(a.floor_rooms, b.floor_rooms);
    }

    #[test]
    fn repair_leaves_only_isolated_rooms_doorless() {
        for seed in 0..20 {
            let mut grid = MansionGrid::generate(&mut StdRng::seed_from_u64(seed));
            for floor in 0..3 {
                let before = grid.unreachable_rooms(floor);
                grid.repair_doorless(floor);
                let after = grid.unreachable_rooms(floor);
                assert!(after.iter().all(|id| before.contains(id)), "seed {seed}");

                let reached = reached_cells(grid.layout(floor));
                let rooms = &grid.floor_rooms[floor];
                for id in after {
                    let doorless = rooms
                        .cells()
                        .all(|(_, _, v)| v & room::ID_MASK != id || v & room::DOOR == 0);
                    if doorless {
                        let touches = rooms
                            .cells()
                            .any(|(x, y, v)| v & room::ID_MASK == id && reached.edges_to(x, y, 1));
                        assert!(!touches, "seed {seed}: room {id} could have been opened");
                    }
                }
            }
        }
    }

    #[test]
    fn repair_opens_rooms_next_to_corridors() {
        let mut layout = SimpleGrid::new(3, 1, cell::BLOCKED);
        layout.set(0, 0, cell::START);
        layout.set(1, 0, cell::CORRIDOR);
        layout.set(2, 0, cell::ROOM);
        let mut rooms = SimpleGrid::new(3, 1, cell::BLOCKED);
        rooms.set(2, 0, room::ORIGIN | room::SIZE_1X1 | room::FIRST_ID);

        assert_eq!(unreachable_rooms(&layout, &rooms), vec![room::FIRST_ID]);
        assert_eq!(repair_doorless(&layout, &mut rooms), 1);
        assert!(unreachable_rooms(&layout, &rooms).is_empty());
        assert_eq!(repair_doorless(&layout, &mut rooms), 0);
    }
}

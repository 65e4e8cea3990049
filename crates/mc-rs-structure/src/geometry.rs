//! Integer block positions and inclusive axis-aligned bounding boxes.
//!
//! Boxes are cell-inclusive: a box from 0 to 4 on an axis covers five
//! blocks. Two boxes that merely share a face plane never share a cell, so
//! [`BoundingBox::intersects`] is false for them.

use std::fmt;

use crate::direction::{Axis, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn relative(self, dir: Direction, distance: i32) -> Self {
        self.offset(
            dir.step_x() * distance,
            dir.step_y() * distance,
            dir.step_z() * distance,
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub max_z: i32,
}

impl BoundingBox {
    /// Builds a box from two opposite corners given in any order.
    pub fn new(x0: i32, y0: i32, z0: i32, x1: i32, y1: i32, z1: i32) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            min_z: z0.min(z1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
            max_z: z0.max(z1),
        }
    }

    pub fn from_corners(a: BlockPos, b: BlockPos) -> Self {
        Self::new(a.x, a.y, a.z, b.x, b.y, b.z)
    }

    /// A box of `width` x `height` x `depth` authored for a south-facing
    /// piece and rotated to `facing` around the anchor `(x, y, z)`.
    ///
    /// The offsets shift the box in the piece's local frame before the
    /// rotation, so `(-1, -1, 0)` centres a five-wide corridor on the anchor
    /// and starts it one block below.
    #[allow(clippy::too_many_arguments)]
    pub fn orient_box(
        x: i32,
        y: i32,
        z: i32,
        offset_x: i32,
        offset_y: i32,
        offset_z: i32,
        width: i32,
        height: i32,
        depth: i32,
        facing: Direction,
    ) -> Self {
        let min_y = y + offset_y;
        let max_y = y + height - 1 + offset_y;
        match facing {
            Direction::North => Self::new(
                x + offset_x,
                min_y,
                z - depth + 1 + offset_z,
                x + width - 1 + offset_x,
                max_y,
                z + offset_z,
            ),
            Direction::West => Self::new(
                x - depth + 1 + offset_z,
                min_y,
                z + offset_x,
                x + offset_z,
                max_y,
                z + width - 1 + offset_x,
            ),
            Direction::East => Self::new(
                x + offset_z,
                min_y,
                z + offset_x,
                x + depth - 1 + offset_z,
                max_y,
                z + width - 1 + offset_x,
            ),
            _ => Self::new(
                x + offset_x,
                min_y,
                z + offset_z,
                x + width - 1 + offset_x,
                max_y,
                z + depth - 1 + offset_z,
            ),
        }
    }

    /// A box with its minimum corner at `(x, y, z)`. Width runs along the
    /// facing's perpendicular axis, depth along the facing.
    #[allow(clippy::too_many_arguments)]
    pub fn make(
        x: i32,
        y: i32,
        z: i32,
        facing: Direction,
        width: i32,
        height: i32,
        depth: i32,
    ) -> Self {
        if facing.axis() == Axis::Z {
            Self::new(x, y, z, x + width - 1, y + height - 1, z + depth - 1)
        } else {
            Self::new(x, y, z, x + depth - 1, y + height - 1, z + width - 1)
        }
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.max_x >= other.min_x
            && self.min_x <= other.max_x
            && self.max_z >= other.min_z
            && self.min_z <= other.max_z
            && self.max_y >= other.min_y
            && self.min_y <= other.max_y
    }

    /// The shared cells of two boxes, if any.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            min_z: self.min_z.max(other.min_z),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
            max_z: self.max_z.min(other.max_z),
        })
    }

    pub fn is_inside(&self, pos: BlockPos) -> bool {
        pos.x >= self.min_x
            && pos.x <= self.max_x
            && pos.z >= self.min_z
            && pos.z <= self.max_z
            && pos.y >= self.min_y
            && pos.y <= self.max_y
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.is_inside(other.min()) && self.is_inside(other.max())
    }

    pub fn moved(&self, dx: i32, dy: i32, dz: i32) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            min_z: self.min_z + dz,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
            max_z: self.max_z + dz,
        }
    }

    pub fn inflated_by(&self, amount: i32) -> BoundingBox {
        BoundingBox::new(
            self.min_x - amount,
            self.min_y - amount,
            self.min_z - amount,
            self.max_x + amount,
            self.max_y + amount,
            self.max_z + amount,
        )
    }

    /// Smallest box covering every box in `boxes`.
    pub fn encapsulating<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>) -> Option<Self> {
        boxes.into_iter().copied().reduce(|acc, b| BoundingBox {
            min_x: acc.min_x.min(b.min_x),
            min_y: acc.min_y.min(b.min_y),
            min_z: acc.min_z.min(b.min_z),
            max_x: acc.max_x.max(b.max_x),
            max_y: acc.max_y.max(b.max_y),
            max_z: acc.max_z.max(b.max_z),
        })
    }

    pub fn x_span(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn y_span(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    pub fn z_span(&self) -> i32 {
        self.max_z - self.min_z + 1
    }

    pub fn min(&self) -> BlockPos {
        BlockPos::new(self.min_x, self.min_y, self.min_z)
    }

    pub fn max(&self) -> BlockPos {
        BlockPos::new(self.max_x, self.max_y, self.max_z)
    }

    pub fn center(&self) -> BlockPos {
        BlockPos::new(
            self.min_x + (self.max_x - self.min_x + 1) / 2,
            self.min_y + (self.max_y - self.min_y + 1) / 2,
            self.min_z + (self.max_z - self.min_z + 1) / 2,
        )
    }

    pub fn volume(&self) -> i64 {
        i64::from(self.x_span()) * i64::from(self.y_span()) * i64::from(self.z_span())
    }

    pub fn to_array(&self) -> [i32; 6] {
        [
            self.min_x, self.min_y, self.min_z, self.max_x, self.max_y, self.max_z,
        ]
    }

    pub fn from_slice(values: &[i32]) -> Option<Self> {
        match values {
            [x0, y0, z0, x1, y1, z1] => Some(Self::new(*x0, *y0, *z0, *x1, *y1, *z1)),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Piece-local frame
    // -----------------------------------------------------------------------

    /// World X of the local point `(x, z)` for a piece occupying this box.
    pub fn world_x(&self, orientation: Option<Direction>, x: i32, z: i32) -> i32 {
        match orientation {
            Some(Direction::North) | Some(Direction::South) => self.min_x + x,
            Some(Direction::West) => self.max_x - z,
            Some(Direction::East) => self.min_x + z,
            _ => x,
        }
    }

    pub fn world_y(&self, orientation: Option<Direction>, y: i32) -> i32 {
        match orientation {
            Some(_) => y + self.min_y,
            None => y,
        }
    }

    pub fn world_z(&self, orientation: Option<Direction>, x: i32, z: i32) -> i32 {
        match orientation {
            Some(Direction::North) => self.max_z - z,
            Some(Direction::South) => self.min_z + z,
            Some(Direction::West) | Some(Direction::East) => self.min_z + x,
            _ => z,
        }
    }

    pub fn world_pos(&self, orientation: Option<Direction>, x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos::new(
            self.world_x(orientation, x, z),
            self.world_y(orientation, y),
            self.world_z(orientation, x, z),
        )
    }

    /// Width, height and length of this box seen from a piece facing
    /// `orientation`.
    pub fn local_size(&self, orientation: Option<Direction>) -> (i32, i32, i32) {
        match orientation.map(Direction::axis) {
            Some(Axis::X) => (self.z_span(), self.y_span(), self.x_span()),
            _ => (self.x_span(), self.y_span(), self.z_span()),
        }
    }

    /// Converts a local box into world space.
    pub fn world_box(
        &self,
        orientation: Option<Direction>,
        min: (i32, i32, i32),
        max: (i32, i32, i32),
    ) -> BoundingBox {
        BoundingBox::from_corners(
            self.world_pos(orientation, min.0, min.1, min.2),
            self.world_pos(orientation, max.0, max.1, max.2),
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{},{} -> {},{},{}]",
            self.min_x, self.min_y, self.min_z, self.max_x, self.max_y, self.max_z
        )
    }
}

//! Compass directions and the two data-value encodings used on disk.

use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One of the six block faces. Structure pieces only ever face a
/// horizontal direction; `Up`/`Down` appear in the monument room graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// Horizontal plane in the iteration order used for random picks.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// All faces in 3D data-value order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Direction::Down | Direction::Up => Axis::Y,
            Direction::North | Direction::South => Axis::Z,
            Direction::West | Direction::East => Axis::X,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    /// Rotates a horizontal direction a quarter turn clockwise seen from
    /// above. Vertical directions are returned unchanged.
    pub fn clockwise(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
            vertical => vertical,
        }
    }

    pub fn counter_clockwise(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
            vertical => vertical,
        }
    }

    pub fn step_x(self) -> i32 {
        match self {
            Direction::West => -1,
            Direction::East => 1,
            _ => 0,
        }
    }

    pub fn step_y(self) -> i32 {
        match self {
            Direction::Down => -1,
            Direction::Up => 1,
            _ => 0,
        }
    }

    pub fn step_z(self) -> i32 {
        match self {
            Direction::North => -1,
            Direction::South => 1,
            _ => 0,
        }
    }

    /// Horizontal data value: south 0, west 1, north 2, east 3.
    pub fn data_2d(self) -> Option<i32> {
        match self {
            Direction::South => Some(0),
            Direction::West => Some(1),
            Direction::North => Some(2),
            Direction::East => Some(3),
            _ => None,
        }
    }

    /// Inverse of [`Direction::data_2d`]; wraps like a modulo so any int
    /// decodes to a horizontal direction.
    pub fn from_data_2d(value: i32) -> Direction {
        match value.rem_euclid(4) {
            0 => Direction::South,
            1 => Direction::West,
            2 => Direction::North,
            _ => Direction::East,
        }
    }

    pub fn data_3d(self) -> usize {
        match self {
            Direction::Down => 0,
            Direction::Up => 1,
            Direction::North => 2,
            Direction::South => 3,
            Direction::West => 4,
            Direction::East => 5,
        }
    }

    pub fn from_data_3d(value: usize) -> Direction {
        Self::ALL[value % 6]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_2d_roundtrips_horizontal() {
        for dir in Direction::HORIZONTAL {
            let value = dir.data_2d().unwrap();
            assert_eq!(Direction::from_data_2d(value), dir);
        }
        assert_eq!(Direction::Up.data_2d(), None);
    }

    #[test]
    fn data_3d_order() {
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.data_3d(), i);
            assert_eq!(Direction::from_data_3d(i), *dir);
        }
    }

    #[test]
    fn rotations_are_inverse() {
        for dir in Direction::HORIZONTAL {
            assert_eq!(dir.clockwise().counter_clockwise(), dir);
            assert_eq!(dir.clockwise().clockwise(), dir.opposite());
        }
    }

    #[test]
    fn steps_match_axis() {
        assert_eq!((Direction::North.step_x(), Direction::North.step_z()), (0, -1));
        assert_eq!((Direction::East.step_x(), Direction::East.step_z()), (1, 0));
        assert_eq!(Direction::Up.step_y(), 1);
        assert_eq!(Direction::West.axis(), Axis::X);
    }
}

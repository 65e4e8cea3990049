//! Desert pyramids.
//!
//! One piece: a stepped sandstone pyramid over a buried treasure room with
//! four chests around a pressure-plate trap. The piece box reaches down to
//! the treasure room, so ground level sits `GROUND` blocks above the bottom
//! of the box.

use mc_rs_nbt::NbtCompound;
use tracing::debug;

use crate::config::DesertPyramidConfig;
use crate::direction::Direction;
use crate::error::StructureError;
use crate::geometry::{BlockPos, BoundingBox};
use crate::persist;
use crate::piece::{Piece, PieceData};
use crate::realize::{loot, Material, Painter};

pub const IDS: &[&str] = &["TeDP"];

const SIZE: (i32, i32, i32) = (21, 15, 21);
const GROUND: i32 = 14;
const CHEST_KEYS: [&str; 4] = ["hasPlacedChest0", "hasPlacedChest1", "hasPlacedChest2", "hasPlacedChest3"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesertPyramidPiece {
    /// Treasure chests in south, west, north, east order.
    pub chests: [bool; 4],
}

impl DesertPyramidPiece {
    pub fn id(&self) -> &'static str {
        "TeDP"
    }

    pub fn save(&self, tag: &mut NbtCompound) {
        for (key, placed) in CHEST_KEYS.iter().zip(self.chests) {
            tag.put_bool(key, placed);
        }
    }

    pub fn load(id: &str, tag: &NbtCompound) -> Result<Self, StructureError> {
        if id != "TeDP" {
            return Err(persist::unknown(id));
        }
        Ok(Self {
            chests: CHEST_KEYS.map(|key| persist::flag(tag, key)),
        })
    }

    pub fn paint(&mut self, p: &mut Painter<'_>) {
        let (w, _, d) = p.local_size();
        let g = GROUND;

        p.fill(Material::Sandstone, 0, g - 4, 0, w - 1, g, d - 1);
        for step in 1..=9 {
            p.fill(Material::Sandstone, step, g + step, step, w - 1 - step, g + step, d - 1 - step);
            p.fill(Material::Air, step + 1, g + step, step + 1, w - 2 - step, g + step, d - 2 - step);
        }
        // entrance
        p.fill(Material::CutSandstone, 8, g + 4, 0, 12, g + 6, 0);
        p.place(Material::OrangeTerracotta, 9, g + 5, 0);
        p.place(Material::OrangeTerracotta, 11, g + 5, 0);
        p.fill(Material::Air, 9, g + 1, 0, 11, g + 3, 4);

        p.place(Material::BlueTerracotta, 10, g, 10);
        for (x, z) in [(9, 10), (11, 10), (10, 9), (10, 11)] {
            p.place(Material::OrangeTerracotta, x, g, z);
        }

        // treasure room
        p.fill(Material::CutSandstone, 8, g - 14, 8, 12, g - 9, 12);
        p.fill(Material::Sandstone, 8, g - 8, 8, 12, g - 1, 12);
        p.fill(Material::Air, 9, g - 11, 9, 11, g - 1, 11);
        p.place(Material::StonePressurePlate, 10, g - 11, 10);
        p.fill(Material::Tnt, 9, g - 13, 9, 11, g - 13, 11);
        for (x, z) in [(8, 10), (12, 10), (10, 8), (10, 12)] {
            p.fill(Material::Air, x, g - 11, z, x, g - 10, z);
        }
        for (placed, dir) in self.chests.iter_mut().zip([
            Direction::South,
            Direction::West,
            Direction::North,
            Direction::East,
        ]) {
            let (x, z) = (10 + dir.step_x() * 2, 10 + dir.step_z() * 2);
            *placed = p.chest(x, g - 11, z, loot::DESERT_PYRAMID, *placed);
        }
    }
}

pub fn generate(
    _config: &DesertPyramidConfig,
    origin: BlockPos,
    facing: Direction,
) -> Result<Vec<Piece>, StructureError> {
    let (w, h, d) = SIZE;
    let bbox = BoundingBox::make(origin.x, origin.y - GROUND, origin.z, facing, w, h + GROUND, d);
    let piece = Piece::new(PieceData::DesertPyramid(DesertPyramidPiece::default()), bbox, Some(facing), 0);
    debug!(bbox = %piece.bbox, "desert pyramid generated");
    Ok(vec![piece])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realize::MemoryWorld;

    #[test]
    fn box_reaches_the_treasure_room() {
        let pieces = generate(&DesertPyramidConfig::default(), BlockPos::new(0, 64, 0), Direction::East).unwrap();
        assert_eq!(pieces.len(), 1);
        let bbox = pieces[0].bbox;
        assert_eq!((bbox.min_y, bbox.max_y), (50, 78));
        assert_eq!((bbox.x_span(), bbox.z_span()), (21, 21));
    }

    #[test]
    fn chests_are_filled_once() {
        let mut pieces = generate(&DesertPyramidConfig::default(), BlockPos::new(0, 64, 0), Direction::North).unwrap();
        let mut world = MemoryWorld::new(0, 256);
        let region = pieces[0].bbox;
        pieces[0].realize(&region, &mut world);
        assert_eq!(world.loot.len(), 4);
        assert!(matches!(&pieces[0].data, PieceData::DesertPyramid(p) if p.chests == [true; 4]));

        pieces[0].realize(&region, &mut world);
        assert_eq!(world.loot.len(), 4);
    }

    #[test]
    fn chest_flags_survive_save() {
        let piece = DesertPyramidPiece {
            chests: [true, false, true, false],
        };
        let mut tag = NbtCompound::new();
        piece.save(&mut tag);
        assert_eq!(DesertPyramidPiece::load("TeDP", &tag).unwrap(), piece);
        assert!(DesertPyramidPiece::load("TePyr", &tag).is_err());
    }
}

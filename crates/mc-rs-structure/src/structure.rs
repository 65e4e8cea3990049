//! Entry points: pick a structure type, hand in a seed and an origin, get a
//! finished [`StructureGraph`].

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GenerationConfig;
use crate::direction::Direction;
use crate::error::StructureError;
use crate::families::{
    corridor_tree, desert_pyramid, end_city, fortress, mansion, mineshaft, monument, stronghold,
};
use crate::geometry::BlockPos;
use crate::graph::StructureGraph;
use crate::random::StructureRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    Fortress,
    Stronghold,
    Mineshaft,
    Mansion,
    Monument,
    CorridorTree,
    EndCity,
    DesertPyramid,
}

impl StructureType {
    pub const ALL: [StructureType; 8] = [
        StructureType::Fortress,
        StructureType::Stronghold,
        StructureType::Mineshaft,
        StructureType::Mansion,
        StructureType::Monument,
        StructureType::CorridorTree,
        StructureType::EndCity,
        StructureType::DesertPyramid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StructureType::Fortress => "fortress",
            StructureType::Stronghold => "stronghold",
            StructureType::Mineshaft => "mineshaft",
            StructureType::Mansion => "mansion",
            StructureType::Monument => "monument",
            StructureType::CorridorTree => "corridor_tree",
            StructureType::EndCity => "end_city",
            StructureType::DesertPyramid => "desert_pyramid",
        }
    }

    /// Start height used when the caller has none of its own.
    pub fn default_y(self) -> i32 {
        match self {
            StructureType::Mineshaft => 50,
            StructureType::Monument => 39,
            _ => 64,
        }
    }

    /// Biomes in which this structure's pieces are not painted.
    pub fn disallowed_biomes(self, config: &GenerationConfig) -> &[String] {
        match self {
            StructureType::Fortress => &config.fortress.disallowed_biomes,
            StructureType::Stronghold => &config.stronghold.disallowed_biomes,
            StructureType::Mineshaft => &config.mineshaft.disallowed_biomes,
            StructureType::Mansion => &config.mansion.disallowed_biomes,
            StructureType::Monument => &config.monument.disallowed_biomes,
            StructureType::CorridorTree => &config.corridor_tree.disallowed_biomes,
            StructureType::EndCity => &config.end_city.disallowed_biomes,
            StructureType::DesertPyramid => &config.desert_pyramid.disallowed_biomes,
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StructureType {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StructureType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| StructureError::UnknownStructure(s.to_string()))
    }
}

/// Generates one structure instance.
///
/// Without an orientation a horizontal facing is drawn from `rng` first.
/// Mineshafts are laid out in world space and ignore the facing.
pub fn generate(
    structure: StructureType,
    config: &GenerationConfig,
    rng: &mut dyn RngCore,
    origin: BlockPos,
    orientation: Option<Direction>,
) -> Result<StructureGraph, StructureError> {
    let facing = match orientation {
        Some(facing) => facing,
        None => Direction::HORIZONTAL[rng.next_int(4) as usize],
    };
    let pieces = match structure {
        StructureType::Fortress => fortress::generate(&config.fortress, rng, origin, facing)?,
        StructureType::Stronghold => stronghold::generate(&config.stronghold, rng, origin, facing)?,
        StructureType::Mineshaft => mineshaft::generate(&config.mineshaft, rng, origin)?,
        StructureType::Mansion => mansion::generate(&config.mansion, rng, origin, facing)?,
        StructureType::Monument => monument::generate(&config.monument, rng, origin, facing)?,
        StructureType::CorridorTree => {
            corridor_tree::generate(&config.corridor_tree, rng, origin, facing)?
        }
        StructureType::EndCity => end_city::generate(&config.end_city, rng, origin, facing)?,
        StructureType::DesertPyramid => desert_pyramid::generate(&config.desert_pyramid, origin, facing)?,
    };
    debug!(%structure, ?facing, pieces = pieces.len(), "structure generated");
    Ok(StructureGraph::new(structure, pieces))
}

/// [`generate`] with a fresh `StdRng` seeded from `seed`.
pub fn generate_seeded(
    structure: StructureType,
    config: &GenerationConfig,
    seed: u64,
    origin: BlockPos,
    orientation: Option<Direction>,
) -> Result<StructureGraph, StructureError> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate(structure, config, &mut rng, origin, orientation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for structure in StructureType::ALL {
            assert_eq!(structure.name().parse::<StructureType>().unwrap(), structure);
        }
        assert!(matches!(
            "igloo".parse::<StructureType>(),
            Err(StructureError::UnknownStructure(_))
        ));
    }

    #[test]
    fn every_structure_starts_with_its_root() {
        let config = GenerationConfig::default();
        let roots = [
            (StructureType::Fortress, "NeStart"),
            (StructureType::Stronghold, "SHStart"),
            (StructureType::Mineshaft, "MSRoom"),
            (StructureType::Mansion, "WMEntrance"),
            (StructureType::Monument, "OMB"),
            (StructureType::CorridorTree, "CTJunction"),
            (StructureType::EndCity, "ECBase"),
            (StructureType::DesertPyramid, "TeDP"),
        ];
        for (structure, root) in roots {
            let origin = BlockPos::new(0, structure.default_y(), 0);
            let graph = generate_seeded(structure, &config, 11, origin, None).unwrap();
            assert_eq!(graph.start().map(|p| p.id()), Some(root), "{structure}");
        }
    }

    #[test]
    fn orientation_is_drawn_when_missing() {
        let config = GenerationConfig::default();
        let origin = BlockPos::new(0, 64, 0);
        let a = generate_seeded(StructureType::CorridorTree, &config, 5, origin, None).unwrap();
        let b = generate_seeded(StructureType::CorridorTree, &config, 5, origin, None).unwrap();
        assert_eq!(a.pieces(), b.pieces());
        assert!(a.start().and_then(|p| p.orientation).is_some());
    }
}

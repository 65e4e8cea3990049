use mc_rs_structure::{Direction, GenerationConfig, StructureType};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct StructgenConfig {
    #[serde(default)]
    pub run: RunSection,
    #[serde(flatten)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize)]
pub struct RunSection {
    #[serde(default = "default_structure")]
    pub structure: StructureType,
    #[serde(default)]
    pub seed: u64,
    /// Start position; the structure's usual height at 0,0 when absent.
    #[serde(default)]
    pub origin: Option<[i32; 3]>,
    /// Drawn from the seed when absent.
    #[serde(default)]
    pub facing: Option<Direction>,
    #[serde(default = "default_realize")]
    pub realize: bool,
    /// Gzipped NBT file the graph is written to.
    #[serde(default)]
    pub output: Option<String>,
}

fn default_structure() -> StructureType {
    StructureType::CorridorTree
}

fn default_realize() -> bool {
    true
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            structure: default_structure(),
            seed: 0,
            origin: None,
            facing: None,
            realize: default_realize(),
            output: None,
        }
    }
}

impl StructgenConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let config = StructgenConfig::parse(
            r#"
            [run]
            structure = "stronghold"
            seed = 77
            origin = [100, 40, -20]
            facing = "west"
            output = "stronghold.nbt.gz"

            [stronghold]
            max_restarts = 4

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.run.structure, StructureType::Stronghold);
        assert_eq!(config.run.seed, 77);
        assert_eq!(config.run.origin, Some([100, 40, -20]));
        assert_eq!(config.run.facing, Some(Direction::West));
        assert!(config.run.realize);
        assert_eq!(config.generation.stronghold.max_restarts, 4);
        assert_eq!(config.generation.stronghold.bounds.max_depth, 50);
        assert_eq!(config.generation.logging.level, "debug");
    }

    #[test]
    fn shipped_config_parses() {
        let config = StructgenConfig::parse(include_str!("../../../structgen.toml")).unwrap();
        assert_eq!(config.run.structure, StructureType::CorridorTree);
        assert_eq!(config.generation.corridor_tree.catalog.len(), 3);
        assert_eq!(config.generation.monument.disallowed_biomes, vec!["desert".to_string()]);
        assert_eq!(config.generation.end_city.bounds.max_depth, 8);
        assert!(config.generation.desert_pyramid.disallowed_biomes.is_empty());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = StructgenConfig::parse("").unwrap();
        assert_eq!(config.run.structure, StructureType::CorridorTree);
        assert!(config.run.output.is_none());
        assert_eq!(config.generation.logging.level, "info");
    }
}

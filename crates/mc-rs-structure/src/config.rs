//! Tunable generation constants.
//!
//! Every section falls back to the tuned defaults, so an empty file (or no
//! file at all) reproduces the stock structures.

use std::path::Path;

use serde::Deserialize;

use crate::builder::Limits;
use crate::error::StructureError;
use crate::families::corridor_tree::CorridorKind;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub fortress: FortressConfig,
    #[serde(default)]
    pub stronghold: StrongholdConfig,
    #[serde(default)]
    pub mineshaft: MineshaftConfig,
    #[serde(default)]
    pub mansion: MansionConfig,
    #[serde(default)]
    pub monument: MonumentConfig,
    #[serde(default)]
    pub corridor_tree: CorridorTreeConfig,
    #[serde(default)]
    pub end_city: EndCityConfig,
    #[serde(default)]
    pub desert_pyramid: DesertPyramidConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GenerationConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StructureError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, StructureError> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Shared bounds
// ---------------------------------------------------------------------------

/// Bounds shared by the branching families.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchBounds {
    pub max_depth: u32,
    pub radius: i32,
    pub floor_y: i32,
    #[serde(default = "default_draw_attempts")]
    pub draw_attempts: u32,
}

fn default_draw_attempts() -> u32 {
    5
}

impl BranchBounds {
    pub fn limits(&self) -> Limits {
        Limits {
            max_depth: self.max_depth,
            radius: self.radius,
            floor_y: self.floor_y,
            draw_attempts: self.draw_attempts,
        }
    }
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FortressConfig {
    #[serde(default = "default_fortress_bounds")]
    pub bounds: BranchBounds,
    /// Inclusive Y band the finished fortress is shifted into.
    #[serde(default = "default_fortress_band")]
    pub height_band: Option<[i32; 2]>,
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,
}

fn default_fortress_bounds() -> BranchBounds {
    BranchBounds {
        max_depth: 30,
        radius: 112,
        floor_y: 10,
        draw_attempts: default_draw_attempts(),
    }
}

fn default_fortress_band() -> Option<[i32; 2]> {
    Some([48, 70])
}

impl Default for FortressConfig {
    fn default() -> Self {
        Self {
            bounds: default_fortress_bounds(),
            height_band: default_fortress_band(),
            disallowed_biomes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrongholdConfig {
    #[serde(default = "default_stronghold_bounds")]
    pub bounds: BranchBounds,
    /// Whole-structure retries until a portal room is placed.
    #[serde(default = "default_stronghold_restarts")]
    pub max_restarts: u32,
    #[serde(default = "default_filler_lengths")]
    pub filler_lengths: Vec<i32>,
    /// Filler corridors must start strictly above this Y.
    #[serde(default = "default_filler_floor")]
    pub filler_floor_y: i32,
    #[serde(default = "default_library_heights")]
    pub library_heights: Vec<i32>,
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,
}

fn default_stronghold_bounds() -> BranchBounds {
    BranchBounds {
        max_depth: 50,
        radius: 112,
        floor_y: 10,
        draw_attempts: default_draw_attempts(),
    }
}

fn default_stronghold_restarts() -> u32 {
    64
}

fn default_filler_lengths() -> Vec<i32> {
    vec![3, 2, 1]
}

fn default_filler_floor() -> i32 {
    1
}

fn default_library_heights() -> Vec<i32> {
    vec![11, 6]
}

impl Default for StrongholdConfig {
    fn default() -> Self {
        Self {
            bounds: default_stronghold_bounds(),
            max_restarts: default_stronghold_restarts(),
            filler_lengths: default_filler_lengths(),
            filler_floor_y: default_filler_floor(),
            library_heights: default_library_heights(),
            disallowed_biomes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MineshaftConfig {
    #[serde(default = "default_mineshaft_depth")]
    pub max_depth: u32,
    #[serde(default = "default_mineshaft_radius")]
    pub radius: i32,
    #[serde(default = "default_mineshaft_floor")]
    pub floor_y: i32,
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,
}

fn default_mineshaft_depth() -> u32 {
    8
}

fn default_mineshaft_radius() -> i32 {
    80
}

fn default_mineshaft_floor() -> i32 {
    -64
}

impl Default for MineshaftConfig {
    fn default() -> Self {
        Self {
            max_depth: default_mineshaft_depth(),
            radius: default_mineshaft_radius(),
            floor_y: default_mineshaft_floor(),
            disallowed_biomes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MansionConfig {
    /// Give doorless rooms a door onto a reachable corridor.
    #[serde(default)]
    pub repair_doorless: bool,
    #[serde(default = "default_cell_size")]
    pub cell_size: i32,
    #[serde(default = "default_floor_heights")]
    pub floor_heights: [i32; 3],
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,
}

fn default_cell_size() -> i32 {
    8
}

fn default_floor_heights() -> [i32; 3] {
    [0, 8, 19]
}

impl Default for MansionConfig {
    fn default() -> Self {
        Self {
            repair_doorless: false,
            cell_size: default_cell_size(),
            floor_heights: default_floor_heights(),
            disallowed_biomes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonumentConfig {
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndCityConfig {
    /// `max_depth` caps the section counter; `draw_attempts` is unused.
    #[serde(default = "default_end_city_bounds")]
    pub bounds: BranchBounds,
    /// A bridge at section depth `d` ends in the ship with odds
    /// `1 / (ship_odds - d)`, once per city.
    #[serde(default = "default_ship_odds")]
    pub ship_odds: i32,
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,
}

fn default_end_city_bounds() -> BranchBounds {
    BranchBounds {
        max_depth: 8,
        radius: 128,
        floor_y: 0,
        draw_attempts: default_draw_attempts(),
    }
}

fn default_ship_odds() -> i32 {
    10
}

impl Default for EndCityConfig {
    fn default() -> Self {
        Self {
            bounds: default_end_city_bounds(),
            ship_odds: default_ship_odds(),
            disallowed_biomes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesertPyramidConfig {
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,
}

/// One catalog line of the corridor tree.
#[derive(Debug, Clone, Deserialize)]
pub struct CorridorEntryConfig {
    pub kind: CorridorKind,
    pub weight: i32,
    /// 0 means unlimited.
    #[serde(default)]
    pub max_placements: i32,
    #[serde(default)]
    pub allow_in_row: bool,
    #[serde(default)]
    pub min_depth: Option<u32>,
    /// Width, height and length; the kind's default when absent.
    #[serde(default)]
    pub size: Option<[i32; 3]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorridorTreeConfig {
    #[serde(default = "default_corridor_bounds")]
    pub bounds: BranchBounds,
    #[serde(default = "default_corridor_catalog")]
    pub catalog: Vec<CorridorEntryConfig>,
    /// The tree is regenerated until this kind has been placed.
    #[serde(default = "default_required_kind")]
    pub required_kind: Option<CorridorKind>,
    #[serde(default = "default_corridor_restarts")]
    pub max_restarts: u32,
    #[serde(default)]
    pub disallowed_biomes: Vec<String>,
}

fn default_corridor_bounds() -> BranchBounds {
    BranchBounds {
        max_depth: 8,
        radius: 112,
        floor_y: 10,
        draw_attempts: default_draw_attempts(),
    }
}

fn default_corridor_catalog() -> Vec<CorridorEntryConfig> {
    let entry = |kind, weight, max_placements, allow_in_row| CorridorEntryConfig {
        kind,
        weight,
        max_placements,
        allow_in_row,
        min_depth: None,
        size: None,
    };
    vec![
        entry(CorridorKind::Straight, 40, 0, true),
        entry(CorridorKind::Junction, 10, 4, false),
        entry(CorridorKind::TerminalRoom, 20, 1, false),
    ]
}

fn default_required_kind() -> Option<CorridorKind> {
    Some(CorridorKind::TerminalRoom)
}

fn default_corridor_restarts() -> u32 {
    32
}

impl Default for CorridorTreeConfig {
    fn default() -> Self {
        Self {
            bounds: default_corridor_bounds(),
            catalog: default_corridor_catalog(),
            required_kind: default_required_kind(),
            max_restarts: default_corridor_restarts(),
            disallowed_biomes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

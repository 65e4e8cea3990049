mod config;

use std::collections::BTreeMap;
use std::path::Path;

use config::StructgenConfig;
use mc_rs_structure::{generate_seeded, BlockPos, MemoryWorld, StructureGraph, StructureType};
use serde::Serialize;
use tracing::{info, warn};

const CONFIG_PATH: &str = "structgen.toml";

#[derive(Debug, Serialize)]
struct Summary {
    structure: StructureType,
    seed: u64,
    pieces: usize,
    max_depth: u32,
    bounding_box: Option<[i32; 6]>,
    locate: Option<[i32; 3]>,
    overlaps: usize,
    kinds: BTreeMap<&'static str, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    realized: Option<RealizedSummary>,
}

#[derive(Debug, Serialize)]
struct RealizedSummary {
    pieces: usize,
    skipped_by_biome: usize,
    writes: usize,
    blocks: usize,
    entities: usize,
    spawners: usize,
    loot: usize,
}

fn summarize(graph: &StructureGraph, seed: u64) -> Summary {
    let mut kinds = BTreeMap::new();
    for piece in graph.pieces() {
        *kinds.entry(piece.id()).or_insert(0) += 1;
    }
    Summary {
        structure: graph.structure(),
        seed,
        pieces: graph.len(),
        max_depth: graph.max_depth(),
        bounding_box: graph.bounding_box().map(|b| b.to_array()),
        locate: graph.locate().map(|p| [p.x, p.y, p.z]),
        overlaps: graph.verify().len(),
        kinds,
        realized: None,
    }
}

fn main() {
    let config = if Path::new(CONFIG_PATH).exists() {
        match StructgenConfig::load(CONFIG_PATH) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load {CONFIG_PATH}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        StructgenConfig::default()
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.generation.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&config) {
        eprintln!("structgen failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: &StructgenConfig) -> Result<(), Box<dyn std::error::Error>> {
    let run = &config.run;
    let structure = run.structure;
    let origin = match run.origin {
        Some([x, y, z]) => BlockPos::new(x, y, z),
        None => BlockPos::new(0, structure.default_y(), 0),
    };
    info!(%structure, seed = run.seed, ?origin, "generating");

    let mut graph = generate_seeded(structure, &config.generation, run.seed, origin, run.facing)?;
    let overlaps = graph.verify();
    if !overlaps.is_empty() {
        warn!(count = overlaps.len(), "overlapping pieces");
    }
    let mut summary = summarize(&graph, run.seed);

    if run.realize {
        if let Some(region) = graph.bounding_box() {
            let mut world = MemoryWorld::default();
            let stats = graph.realize_region(&region, &mut world, structure.disallowed_biomes(&config.generation));
            summary.realized = Some(RealizedSummary {
                pieces: stats.pieces,
                skipped_by_biome: stats.skipped_by_biome,
                writes: stats.writes,
                blocks: world.non_air_count(),
                entities: world.entities.len(),
                spawners: world.spawners.len(),
                loot: world.loot.len(),
            });
        }
    }

    if let Some(output) = &run.output {
        std::fs::write(output, graph.to_gzip()?)?;
        info!(path = %output, "wrote structure");
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_rs_structure::{Direction, GenerationConfig};

    #[test]
    fn summary_counts_every_piece() {
        let graph = generate_seeded(
            StructureType::CorridorTree,
            &GenerationConfig::default(),
            4,
            BlockPos::new(0, 64, 0),
            Some(Direction::North),
        )
        .unwrap();
        let summary = summarize(&graph, 4);
        assert_eq!(summary.kinds.values().sum::<usize>(), graph.len());
        assert_eq!(summary.overlaps, 0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["structure"], "corridor_tree");
        assert_eq!(json["kinds"]["CTRoom"], 1);
        assert!(json.get("realized").is_none());
    }
}

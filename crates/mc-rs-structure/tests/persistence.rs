use mc_rs_nbt::NbtTag;
use mc_rs_structure::graph::KEY_CHILDREN;
use mc_rs_structure::{generate_seeded, BlockPos, Direction, GenerationConfig, MemoryWorld, StructureGraph, StructureType};

// ---- Helpers ----

fn build(structure: StructureType, seed: u64) -> StructureGraph {
    let origin = BlockPos::new(0, structure.default_y(), 0);
    generate_seeded(structure, &GenerationConfig::default(), seed, origin, Some(Direction::East)).unwrap()
}

fn realize_all(graph: &mut StructureGraph, world: &mut MemoryWorld) {
    let region = graph.bounding_box().unwrap();
    graph.realize_region(&region, world, &[]);
}

// ---- Round trips ----

#[test]
fn every_structure_survives_a_save() {
    for structure in StructureType::ALL {
        let graph = build(structure, 3);
        let loaded = StructureGraph::load(&graph.save()).unwrap();
        assert_eq!(loaded, graph, "{structure}");
    }
}

#[test]
fn realized_flags_survive_a_gzip_file() {
    for structure in StructureType::ALL {
        let mut graph = build(structure, 8);
        let mut world = MemoryWorld::default();
        realize_all(&mut graph, &mut world);

        let bytes = graph.to_gzip().unwrap();
        let loaded = StructureGraph::from_gzip(&bytes).unwrap();
        assert_eq!(loaded, graph, "{structure}");
    }
}

#[test]
fn reloaded_structures_do_not_repeat_side_effects() {
    let mut graph = build(StructureType::CorridorTree, 1);
    let mut world = MemoryWorld::default();
    realize_all(&mut graph, &mut world);
    assert_eq!(world.loot.len(), 1);

    let mut reloaded = StructureGraph::load(&graph.save()).unwrap();
    let blocks = world.blocks.clone();
    realize_all(&mut reloaded, &mut world);
    assert_eq!(world.loot.len(), 1);
    assert_eq!(world.blocks, blocks);
}

#[test]
fn monument_guardians_spawn_once() {
    let mut graph = build(StructureType::Monument, 4);
    let mut world = MemoryWorld::default();
    realize_all(&mut graph, &mut world);
    assert_eq!(world.entities.len(), 3);

    let mut reloaded = StructureGraph::from_gzip(&graph.to_gzip().unwrap()).unwrap();
    realize_all(&mut reloaded, &mut world);
    assert_eq!(world.entities.len(), 3);
}

#[test]
fn a_corrupt_piece_does_not_sink_the_graph() {
    let graph = build(StructureType::Stronghold, 2);
    let mut tag = graph.save();
    let mut children = tag.get_list(KEY_CHILDREN).unwrap().to_vec();
    children.push(NbtTag::String("not a piece".into()));
    tag.put_list(KEY_CHILDREN, children);

    let loaded = StructureGraph::load(&tag).unwrap();
    assert_eq!(loaded.len(), graph.len());
    assert_eq!(loaded.portal_room_id(), graph.portal_room_id());
}

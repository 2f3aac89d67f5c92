use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use chunkflow::dag::{LogicalDag, LogicalData, PhysicalDag};
use chunkflow::ops::FillGen;
use chunkflow::{ExpandConfig, ExpandEngine, Scale};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Expands a randomly split tensor and checks that its fragments tile it exactly.
fn check_tiling(rng: &mut StdRng) -> Result<()> {
    let num_dims = rng.gen_range(1..=4);
    let size = Scale::new((0..num_dims).map(|_| rng.gen_range(1..=9)));
    let num_parts = size.map(|extent| rng.gen_range(1..=extent.min(4)));

    let engine = ExpandEngine::with_config(ExpandConfig::default());
    let pdag = PhysicalDag::new();
    let mut ldag = LogicalDag::new();
    let x = ldag.new_data_node(
        LogicalData::split(size.clone(), &num_parts).with_gen_fn(Arc::new(FillGen::zeros())),
    );
    engine.process(&ldag, &pdag, &[x])?;

    let pnodes = engine.physical_nodes(x)?;
    assert_eq!(pnodes.size(), &num_parts);

    let mut covered = HashSet::new();
    for (pos, &id) in pnodes.indexed() {
        let fragment = pdag.data(id)?;
        assert_eq!(fragment.offset_index, pos);
        let end = &fragment.offset + &fragment.size;
        for axis in 0..num_dims {
            assert!(end[axis] <= size[axis], "{size}: fragment {pos} ends at {end}");
        }
        for element in Scale::range(&fragment.size) {
            let global = &fragment.offset + &element;
            assert!(covered.insert(global.clone()), "{size}: element {global} covered twice");
        }
    }
    assert_eq!(covered.len(), size.prod());
    Ok(())
}

#[test]
fn random_regular_splits_tile_the_tensor() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..64 {
        check_tiling(&mut rng)?;
    }
    Ok(())
}

#[test]
fn uneven_split_offsets() -> Result<()> {
    let engine = ExpandEngine::with_config(ExpandConfig::default());
    let pdag = PhysicalDag::new();
    let mut ldag = LogicalDag::new();
    let data = LogicalData::split(Scale::new([10]), &Scale::new([4]));
    let x = ldag.new_data_node(data.with_gen_fn(Arc::new(FillGen::zeros())));
    engine.process(&ldag, &pdag, &[x])?;

    let pnodes = engine.physical_nodes(x)?;
    let placed = pnodes
        .iter()
        .map(|&id| pdag.data(id).map(|d| (d.offset[0], d.size[0])))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(placed, vec![(0, 3), (3, 3), (6, 2), (8, 2)]);
    Ok(())
}

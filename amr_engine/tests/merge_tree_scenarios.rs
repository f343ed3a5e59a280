//! Scenario 1 from spec.md §8: a single isolated block needs no
//! neighbours to reach quiescence. The saddle-pairing (scenario 5) and
//! sparsification (scenario 6) scenarios live as unit tests next to
//! `traverse_persistence`/`sparsify` themselves, since building a tree
//! shape by hand needs `MergeTree`'s crate-private node constructors.
use amr_core::DeepOrder;
use amr_engine::{Block, MaskedBox};
use amr_grid::BoxBounds;

/// Scenario 1 (spec.md §8): a single isolated 4x4 block, f(x,y) = x + y,
/// ρ = 0 (keep everything). Expected: one component, deepest = (3,3),
/// value 6.
#[test]
fn single_block_one_component_deepest_in_the_far_corner() {
    let core = BoxBounds::new(vec![0, 0], vec![3, 3]);
    let bounds = core.clone();

    let mut values = vec![0.0; bounds.len() as usize];
    for off in 0..bounds.len() {
        let c = bounds.coords_of(off).unwrap();
        values[off as usize] = (c[0] + c[1]) as f64;
    }

    let mb = MaskedBox::build_absolute(0, 0, 1, core, bounds.clone(), vec![], &values, false, 0.0).unwrap();
    let order = DeepOrder::new(false);
    let mut block = Block::new(mb, &values, order, false);

    assert!(block.foreach_round().is_empty(), "no neighbours, nothing to send");
    block.receive(vec![]).unwrap();
    assert!(block.is_done());

    let winners = block.current_deepest_vertices();
    assert_eq!(winners.len(), 1);
    let coords = bounds.coords_of(winners[0].offset).unwrap();
    assert_eq!(coords, vec![3, 3]);
    assert_eq!(block.components().len(), 1);
    assert_eq!(block.components()[0].global_value, 6.0);
}

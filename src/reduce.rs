/// Sums lane partials with a balanced pairwise tree.
///
/// The split points depend only on `values.len()`, so the rounding is the
/// same on every run for a given lane count.
pub fn pairwise_sum(values: &[f32]) -> f32 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        len => {
            let (left, right) = values.split_at(len / 2);
            pairwise_sum(left) + pairwise_sum(right)
        }
    }
}

/// Adds `rhs` into `acc` lane by lane.
#[inline]
pub fn add_lanes<const LANES: usize>(acc: &mut [f32; LANES], rhs: &[f32; LANES]) {
    for (a, b) in acc.iter_mut().zip(rhs) {
        *a += *b;
    }
}

#[test]
fn empty_and_single() {
    assert_eq!(pairwise_sum(&[]), 0.0);
    assert_eq!(pairwise_sum(&[4.5]), 4.5);
}

#[test]
fn tree_order() {
    // ((1 + 2) + (3 + 4)) for four lanes, (1 + (2 + 3)) for three
    assert_eq!(pairwise_sum(&[1.0, 2.0, 3.0, 4.0]), 10.0);
    assert_eq!(pairwise_sum(&[1.0, 2.0, 3.0]), 6.0);

    // 1e8 + 1 is lost in f32 when folded left to right but survives the tree
    let lanes = [1.0, 1.0, 1e8, -1e8];
    assert_eq!(lanes.iter().fold(0.0f32, |acc, v| acc + v), 0.0);
    assert_eq!(pairwise_sum(&lanes), 2.0);
}

#[test]
fn nan_lane_poisons_sum() {
    assert!(pairwise_sum(&[1.0, f32::NAN, 3.0, 4.0]).is_nan());
}

#[test]
fn add_lanes_elementwise() {
    let mut acc = [1.0, 2.0, 3.0];
    add_lanes(&mut acc, &[0.5, 0.5, 0.5]);
    assert_eq!(acc, [1.5, 2.5, 3.5]);
}

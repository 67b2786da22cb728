//! Causal insertion-point search.

use bubble_ir::CircuitDag;
use tracing::trace;

use super::interaction::InteractionPoint;

/// Find where a gate spanning two wires can be inserted without creating
/// a cycle.
///
/// Returns indices `(i, j)` of the first pair, in `seq0`-major order, of
/// edges `e0 = s0 → t0` from `seq0` and `e1 = s1 → t1` from `seq1` such
/// that neither `t0` reaches `s1` nor `t1` reaches `s0`. A vertex reaches
/// itself. Consumed points, identical edges and pairs on the same wire are
/// never returned.
pub fn valid_insertion_point(
    dag: &CircuitDag,
    seq0: &[InteractionPoint],
    seq1: &[InteractionPoint],
) -> Option<(usize, usize)> {
    for (i, p0) in seq0.iter().enumerate() {
        if p0.consumed {
            continue;
        }
        let Some((s0, t0)) = dag.edge_endpoints(p0.edge) else {
            continue;
        };
        for (j, p1) in seq1.iter().enumerate() {
            if p1.consumed || p1.edge == p0.edge {
                continue;
            }
            if dag.edge_wire(p0.edge) == dag.edge_wire(p1.edge) {
                continue;
            }
            let Some((s1, t1)) = dag.edge_endpoints(p1.edge) else {
                continue;
            };
            if dag.reachable(t0, s1) || dag.reachable(t1, s0) {
                trace!(
                    "insertion pair ({}, {}) is causally entangled",
                    p0.edge.index(),
                    p1.edge.index()
                );
                continue;
            }
            return Some((i, j));
        }
    }
    None
}

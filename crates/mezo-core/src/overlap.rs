//! Overlap closure for removal.
//!
//! Removing a mezo from a shared raster mask also erases pixels of every
//! mezo it overlaps, so those have to be erased and repainted too. The set
//! to erase is the connected component of the removed mezo in the graph
//! linking annotations whose painted footprints can share a pixel.

use crate::id::MezoId;
use crate::model::Mezo;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Dfs;
use smallvec::SmallVec;

/// Ids erased by a removal, removed mezo first.
pub type OverlapSet = SmallVec<[MezoId; 8]>;

/// Every mezo transitively overlapping `removed` on the mask, including
/// `removed`. `dot_radius` is the painted center dot, which can reach past
/// a small circle's rim.
///
/// `remaining` is the annotation list without `removed`; the result is
/// ordered with `removed` first and the rest in `remaining` order.
pub fn overlap_closure(removed: &Mezo, remaining: &[Mezo], dot_radius: f64) -> OverlapSet {
    let mut graph: UnGraph<usize, ()> = UnGraph::with_capacity(remaining.len() + 1, 0);
    let root = graph.add_node(usize::MAX);
    let nodes: Vec<NodeIndex> = (0..remaining.len()).map(|i| graph.add_node(i)).collect();

    for (i, a) in remaining.iter().enumerate() {
        if a.paint_overlaps(removed, dot_radius) {
            graph.add_edge(root, nodes[i], ());
        }
        for (j, b) in remaining.iter().enumerate().skip(i + 1) {
            if a.paint_overlaps(b, dot_radius) {
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }
    }

    let mut reached = vec![false; remaining.len()];
    let mut dfs = Dfs::new(&graph, root);
    while let Some(node) = dfs.next(&graph) {
        if node != root {
            reached[graph[node]] = true;
        }
    }

    let mut set = OverlapSet::new();
    set.push(removed.id);
    set.extend(
        remaining
            .iter()
            .zip(&reached)
            .filter(|(_, hit)| **hit)
            .map(|(m, _)| m.id),
    );
    log::trace!("overlap closure of {}: {} mezos", removed.id, set.len());
    set
}

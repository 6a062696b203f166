use serde::{Deserialize, Serialize};

use super::{Dataset, StructuredData};
use crate::extent::Extent;

/// Position of a leaf inside a composite container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafPath {
    /// Index into a flat multi-block container.
    Block(usize),
    /// `(level, index)` inside a leveled container; level 0 is coarsest.
    Level { level: usize, index: usize },
}

/// A leaf visited by the ordered iterator, together with its priority rank.
/// Lower rank wins during fill-only-empty merging.
#[derive(Debug, Clone, Copy)]
pub struct LeafRef<'a> {
    pub path: LeafPath,
    pub rank: usize,
    pub data: &'a Dataset,
}

/// Dataset aggregating leaf datasets.
///
/// `MultiBlock` is a flat ordered list; `Hierarchical` groups leaves into
/// levels with level 0 the coarsest. Empty slots (`None`) are valid; an
/// entirely empty container means "no data available yet".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompositeData {
    MultiBlock { blocks: Vec<Option<Dataset>> },
    Hierarchical { levels: Vec<Vec<Option<Dataset>>> },
}

impl CompositeData {
    pub fn multi_block(blocks: Vec<Option<Dataset>>) -> Self {
        CompositeData::MultiBlock { blocks }
    }

    pub fn hierarchical(levels: Vec<Vec<Option<Dataset>>>) -> Self {
        CompositeData::Hierarchical { levels }
    }

    pub fn num_leaves(&self) -> usize {
        self.leaves().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves().is_empty()
    }

    /// Leaves in priority order: traversal order for flat containers,
    /// finest level first (reverse level order) for leveled ones. The
    /// returned rank is the position in this order.
    pub fn leaves(&self) -> Vec<LeafRef<'_>> {
        let mut out = Vec::new();
        match self {
            CompositeData::MultiBlock { blocks } => {
                for (index, slot) in blocks.iter().enumerate() {
                    if let Some(data) = slot {
                        out.push(LeafRef {
                            path: LeafPath::Block(index),
                            rank: out.len(),
                            data,
                        });
                    }
                }
            }
            CompositeData::Hierarchical { levels } => {
                for (level, slots) in levels.iter().enumerate().rev() {
                    for (index, slot) in slots.iter().enumerate() {
                        if let Some(data) = slot {
                            out.push(LeafRef {
                                path: LeafPath::Level { level, index },
                                rank: out.len(),
                                data,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    /// A container with the same shape and every slot empty, for mirroring
    /// per-leaf outputs back into the input structure.
    pub fn same_structure_empty(&self) -> CompositeData {
        match self {
            CompositeData::MultiBlock { blocks } => CompositeData::MultiBlock {
                blocks: vec![None; blocks.len()],
            },
            CompositeData::Hierarchical { levels } => CompositeData::Hierarchical {
                levels: levels.iter().map(|l| vec![None; l.len()]).collect(),
            },
        }
    }

    pub fn set_leaf(&mut self, path: LeafPath, data: Dataset) {
        match (self, path) {
            (CompositeData::MultiBlock { blocks }, LeafPath::Block(index)) => {
                if index < blocks.len() {
                    blocks[index] = Some(data);
                }
            }
            (CompositeData::Hierarchical { levels }, LeafPath::Level { level, index }) => {
                if level < levels.len() && index < levels[level].len() {
                    levels[level][index] = Some(data);
                }
            }
            _ => {}
        }
    }

    pub fn leaf(&self, path: LeafPath) -> Option<&Dataset> {
        match (self, path) {
            (CompositeData::MultiBlock { blocks }, LeafPath::Block(index)) => {
                blocks.get(index).and_then(|s| s.as_ref())
            }
            (CompositeData::Hierarchical { levels }, LeafPath::Level { level, index }) => {
                levels.get(level).and_then(|l| l.get(index)).and_then(|s| s.as_ref())
            }
            _ => None,
        }
    }

    /// Union of all structured leaf extents.
    pub fn bounds(&self) -> Extent {
        let mut out = Extent::empty();
        for leaf in self.leaves() {
            if let Dataset::Structured(d) = leaf.data {
                out = out.union(d.extent());
            }
        }
        out
    }
}

/// Merge structured leaves into `target` with fill-only-empty semantics:
/// leaves are applied in ascending rank, and a location resolved by a
/// lower-ranked leaf is never overwritten by a later one. The visit order
/// of `leaves` therefore does not affect the result. Returns the number of
/// leaves actually applied; once the target is fully resolved the rest are
/// skipped.
pub fn merge_fill_empty(target: &mut StructuredData, leaves: &[LeafRef<'_>]) -> usize {
    let mut ordered: Vec<&LeafRef<'_>> = leaves.iter().collect();
    ordered.sort_by_key(|l| l.rank);

    let mut applied = 0;
    for leaf in ordered {
        if target.fully_resolved() {
            break;
        }
        if let Dataset::Structured(d) = leaf.data {
            target.fill_empty_from(d);
            applied += 1;
        }
    }
    applied
}

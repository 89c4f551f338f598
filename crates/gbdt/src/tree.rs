//! Regression trees grown leaf-wise on gradient histograms

use crate::binning::BinnedMatrix;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Hessian floor for a child to be considered
const MIN_CHILD_HESSIAN: f64 = 1e-3;

/// Smallest gain worth a split
const MIN_SPLIT_GAIN: f64 = 1e-12;

/// Tree node; children are indices into [`Tree::nodes`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Terminal node holding its (shrunken) output
    Leaf { value: f64 },
    /// Rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        /// Bin id matching `threshold` in the training bins
        bin: u8,
        left: usize,
        right: usize,
    },
}

/// A single fitted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Output for a raw feature row
    pub fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Output for a training row, using its bin ids
    pub fn predict_binned(&self, binned: &BinnedMatrix, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    bin,
                    left,
                    right,
                    ..
                } => {
                    idx = if binned.bin(row, *feature) <= *bin { *left } else { *right };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Longest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Growth limits for one tree
#[derive(Debug, Clone, Copy)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub num_leaves: usize,
    pub min_child_samples: usize,
    pub lambda_l2: f64,
    pub learning_rate: f64,
}

/// Best split found for a leaf
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

/// Leaf awaiting a decision: split further or finalize
struct OpenLeaf {
    node: usize,
    rows: Vec<usize>,
    depth: usize,
    grad_sum: f64,
    hess_sum: f64,
    best: Option<SplitCandidate>,
}

/// Grows one tree from per-row gradients and hessians
pub struct TreeBuilder<'a> {
    binned: &'a BinnedMatrix,
    grads: &'a [f64],
    hess: &'a [f64],
    limits: TreeLimits,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(binned: &'a BinnedMatrix, grads: &'a [f64], hess: &'a [f64], limits: TreeLimits) -> Self {
        Self {
            binned,
            grads,
            hess,
            limits,
        }
    }

    /// Grow a tree on `rows`; also returns (feature, gain) for every split made
    pub fn build(&self, rows: Vec<usize>) -> (Tree, Vec<(usize, f64)>) {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut splits = Vec::new();
        let mut open = vec![self.open_leaf(0, rows, 0)];
        let mut n_leaves = 1;

        while n_leaves < self.limits.num_leaves {
            let pick = open
                .iter()
                .enumerate()
                .filter_map(|(i, leaf)| leaf.best.map(|b| (i, b.gain)))
                .fold(None, |acc: Option<(usize, f64)>, (i, gain)| match acc {
                    Some((_, best)) if best >= gain => acc,
                    _ => Some((i, gain)),
                });
            let Some((pos, _)) = pick else { break };

            let leaf = open.swap_remove(pos);
            let Some(split) = leaf.best else { break };
            let feature_bins = self.binned.feature_bins(split.feature);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = leaf
                .rows
                .iter()
                .partition(|&&r| usize::from(feature_bins[r]) <= split.bin);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[leaf.node] = Node::Split {
                feature: split.feature,
                threshold: self.binned.mapper(split.feature).threshold(split.bin),
                bin: split.bin as u8,
                left,
                right,
            };
            splits.push((split.feature, split.gain));

            open.push(self.open_leaf(left, left_rows, leaf.depth + 1));
            open.push(self.open_leaf(right, right_rows, leaf.depth + 1));
            n_leaves += 1;
        }

        for leaf in open {
            nodes[leaf.node] = Node::Leaf {
                value: self.leaf_value(leaf.grad_sum, leaf.hess_sum),
            };
        }

        (Tree { nodes }, splits)
    }

    fn open_leaf(&self, node: usize, rows: Vec<usize>, depth: usize) -> OpenLeaf {
        let grad_sum = rows.iter().map(|&r| self.grads[r]).sum();
        let hess_sum = rows.iter().map(|&r| self.hess[r]).sum();
        let best = if depth < self.limits.max_depth && rows.len() >= 2 * self.limits.min_child_samples.max(1) {
            self.best_split(&rows, grad_sum, hess_sum)
        } else {
            None
        };
        OpenLeaf {
            node,
            rows,
            depth,
            grad_sum,
            hess_sum,
            best,
        }
    }

    fn leaf_value(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        -grad_sum / (hess_sum + self.limits.lambda_l2) * self.limits.learning_rate
    }

    fn score(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        grad_sum * grad_sum / (hess_sum + self.limits.lambda_l2)
    }

    /// Scan every feature histogram for the highest-gain threshold
    fn best_split(&self, rows: &[usize], grad_sum: f64, hess_sum: f64) -> Option<SplitCandidate> {
        let parent_score = self.score(grad_sum, hess_sum);
        let min_child = self.limits.min_child_samples.max(1);
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..self.binned.n_features() {
            let n_bins = self.binned.mapper(feature).n_bins();
            if n_bins < 2 {
                continue;
            }
            let bins = self.binned.feature_bins(feature);
            let mut hist_grad = vec![0.0; n_bins];
            let mut hist_hess = vec![0.0; n_bins];
            let mut hist_count = vec![0usize; n_bins];
            for &r in rows {
                let b = usize::from(bins[r]);
                hist_grad[b] += self.grads[r];
                hist_hess[b] += self.hess[r];
                hist_count[b] += 1;
            }

            let (mut left_grad, mut left_hess, mut left_count) = (0.0, 0.0, 0usize);
            for bin in 0..n_bins - 1 {
                left_grad += hist_grad[bin];
                left_hess += hist_hess[bin];
                left_count += hist_count[bin];

                let right_count = rows.len() - left_count;
                if left_count < min_child {
                    continue;
                }
                if right_count < min_child {
                    break;
                }
                let right_grad = grad_sum - left_grad;
                let right_hess = hess_sum - left_hess;
                if left_hess < MIN_CHILD_HESSIAN || right_hess < MIN_CHILD_HESSIAN {
                    continue;
                }

                let gain = 0.5
                    * (self.score(left_grad, left_hess) + self.score(right_grad, right_hess)
                        - parent_score);
                if gain > MIN_SPLIT_GAIN && best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate { feature, bin, gain });
                }
            }
        }
        best
    }
}

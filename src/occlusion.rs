//! Occlusion Tree
//!
//! A KD-tree over the sample points of a bucket. Every node knows the
//! screen area, shutter times, lens cells and detail levels of the samples
//! below it and the farthest opaque depth any of them has seen so far.
//! Anything starting behind that depth over the whole of a node is hidden.
//!
//! Nodes live in an arena. Children of a node are stored next to each
//! other and always after their parent, so a reverse walk over the arena
//! visits children before parents.

use crate::bound::Bound;
use crate::math::Vec2;
use crate::sample::SamplePoint;

/// Children per node
pub const FAN_OUT: usize = 4;

const NO_PARENT: usize = usize::MAX;

/// One node of the occlusion tree
#[derive(Debug,Clone,PartialEq)]
pub struct TreeNode {
    pub min: Vec2,
    pub max: Vec2,
    pub time: (f32, f32),
    /// Inclusive range of lens cell indices
    pub lens: (usize, usize),
    pub detail: (f32, f32),
    /// Farthest opaque depth seen by any sample below
    pub max_z: f32,
    parent: usize,
    first_child: usize,
    num_children: usize,
    sample: Option<usize>,
}

impl TreeNode {
    fn new(parent: usize) -> Self {
        Self { min: Vec2::ZERO, max: Vec2::ZERO, time: (0.0, 0.0), lens: (0, 0),
               detail: (0.0, 0.0), max_z: f32::INFINITY,
               parent, first_child: 0, num_children: 0, sample: None }
    }
    pub fn parent(&self) -> Option<usize> {
        if self.parent == NO_PARENT { None } else { Some(self.parent) }
    }
    pub fn children(&self) -> std::ops::Range<usize> {
        self.first_child .. self.first_child + self.num_children
    }
    /// Sample owned by a leaf
    pub fn sample(&self) -> Option<usize> {
        self.sample
    }
    fn contains_2d(&self, min: Vec2, max: Vec2) -> bool {
        self.min.x <= min.x && self.min.y <= min.y && self.max.x >= max.x && self.max.y >= max.y
    }
    fn overlaps(&self, q: &TreeQuery) -> bool {
        q.bound.intersects_2d(self.min, self.max)
            && self.time.1 >= q.time.0 && self.time.0 < q.time.1
            && self.lens.1 >= q.lens.0 && self.lens.0 <= q.lens.1
            && self.detail.1 >= q.detail.0 && self.detail.0 <= q.detail.1
    }
}

/// Region of sample space a micropolygon may touch
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct TreeQuery {
    pub bound: Bound,
    /// Half open `[t0, t1)`
    pub time: (f32, f32),
    /// Inclusive lens cell range
    pub lens: (usize, usize),
    pub detail: (f32, f32),
}

impl TreeQuery {
    /// Query every sample within `bound`
    pub fn new(bound: Bound) -> Self {
        Self { bound,
               time: (f32::NEG_INFINITY, f32::INFINITY),
               lens: (0, usize::MAX),
               detail: (f32::NEG_INFINITY, f32::INFINITY) }
    }
    pub fn with_time(mut self, t0: f32, t1: f32) -> Self {
        self.time = (t0, t1);
        self
    }
    pub fn with_lens(mut self, index: usize) -> Self {
        self.lens = (index, index);
        self
    }
    pub fn with_detail(mut self, d0: f32, d1: f32) -> Self {
        self.detail = (d0, d1);
        self
    }
}

/// KD-tree of sample points with per-node opaque depth bounds
#[derive(Debug,Clone,Default)]
pub struct OcclusionTree {
    nodes: Vec<TreeNode>,
    leaf_for_sample: Vec<usize>,
}

impl OcclusionTree {
    pub fn new() -> Self {
        Self { nodes: vec![], leaf_for_sample: vec![] }
    }
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// Farthest opaque depth over the whole bucket
    pub fn root_max_z(&self) -> f32 {
        self.nodes.first().map(|n| n.max_z).unwrap_or(f32::INFINITY)
    }
    /// Leaf node holding sample `i`
    pub fn leaf(&self, i: usize) -> usize {
        self.leaf_for_sample[i]
    }

    /// Build the topology over `points` and compute the node bounds
    ///
    /// Groups are split at the median, alternating between x and y, and a
    /// node takes up to [`FAN_OUT`] groups as children by repeatedly
    /// splitting its largest one.
    ///
    /// [`FAN_OUT`]: constant.FAN_OUT.html
    pub fn construct_tree(&mut self, points: &[SamplePoint]) {
        self.nodes.clear();
        self.leaf_for_sample.clear();
        self.leaf_for_sample.resize(points.len(), 0);
        if points.is_empty() {
            return;
        }
        let mut order: Vec<usize> = (0 .. points.len()).collect();
        self.nodes.push(TreeNode::new(NO_PARENT));
        let mut stack = vec![(0, 0, points.len(), false)];
        let mut groups = Vec::with_capacity(FAN_OUT);
        while let Some((node, start, end, axis)) = stack.pop() {
            if end - start == 1 {
                self.nodes[node].sample = Some(order[start]);
                self.leaf_for_sample[order[start]] = node;
                continue;
            }
            groups.clear();
            groups.push((start, end, axis));
            while groups.len() < FAN_OUT {
                let largest = groups.iter().enumerate()
                    .max_by_key(|(_, g)| g.1 - g.0)
                    .map(|(i, _)| i);
                let gi = match largest {
                    Some(gi) if groups[gi].1 - groups[gi].0 >= 2 => gi,
                    _ => break,
                };
                let (s, e, ax) = groups[gi];
                let mid = s + (e - s) / 2;
                let coord = |i: usize| if ax { points[i].position.y } else { points[i].position.x };
                order[s .. e].select_nth_unstable_by(mid - s, |&a, &b| {
                    coord(a).partial_cmp(&coord(b)).unwrap_or(std::cmp::Ordering::Equal)
                });
                groups[gi] = (s, mid, !ax);
                groups.insert(gi + 1, (mid, e, !ax));
            }
            let first = self.nodes.len();
            for _ in 0 .. groups.len() {
                self.nodes.push(TreeNode::new(node));
            }
            self.nodes[node].first_child = first;
            self.nodes[node].num_children = groups.len();
            for (k, g) in groups.iter().enumerate() {
                stack.push((first + k, g.0, g.1, g.2));
            }
        }
        log::debug!("occlusion tree: {} samples, {} nodes", points.len(), self.nodes.len());
        self.update_bounds(points);
    }

    /// Recompute every node's ranges from `points` and reset opaque depths
    ///
    /// Keeps the topology, for a bucket that reuses the previous layout.
    pub fn update_bounds(&mut self, points: &[SamplePoint]) {
        for i in (0 .. self.nodes.len()).rev() {
            let node = &self.nodes[i];
            let mut out = node.clone();
            out.max_z = f32::INFINITY;
            if let Some(s) = node.sample {
                let p = &points[s];
                out.min = p.position;
                out.max = p.position;
                out.time = (p.time, p.time);
                out.lens = (p.lens_offset_index, p.lens_offset_index);
                out.detail = (p.detail_level, p.detail_level);
            } else {
                let inf = f32::INFINITY;
                out.min = Vec2::new(inf, inf);
                out.max = Vec2::new(-inf, -inf);
                out.time = (inf, -inf);
                out.lens = (usize::MAX, 0);
                out.detail = (inf, -inf);
                for c in node.children() {
                    let k = &self.nodes[c];
                    out.min = Vec2::new(out.min.x.min(k.min.x), out.min.y.min(k.min.y));
                    out.max = Vec2::new(out.max.x.max(k.max.x), out.max.y.max(k.max.y));
                    out.time = (out.time.0.min(k.time.0), out.time.1.max(k.time.1));
                    out.lens = (out.lens.0.min(k.lens.0), out.lens.1.max(k.lens.1));
                    out.detail = (out.detail.0.min(k.detail.0), out.detail.1.max(k.detail.1));
                }
            }
            self.nodes[i] = out;
        }
    }

    /// True if everything inside `bound` is known to be hidden
    ///
    /// Walks down through nodes that contain the whole query in screen
    /// space. Malformed bounds are never culled.
    pub fn can_cull(&self, bound: &Bound) -> bool {
        if bound.is_malformed() || self.nodes.is_empty() {
            return false;
        }
        let (qmin, qmax) = (bound.min.xy(), bound.max.xy());
        let mut work = Vec::with_capacity(8);
        work.push(0);
        while let Some(n) = work.pop() {
            let node = &self.nodes[n];
            if bound.min.z > node.max_z {
                return true;
            }
            for c in node.children() {
                if self.nodes[c].contains_2d(qmin, qmax) {
                    work.push(c);
                }
            }
        }
        false
    }

    /// Lower the opaque depth of sample `i` and propagate towards the root
    ///
    /// Stops as soon as a parent's depth does not change.
    pub fn set_max_opaque_z(&mut self, i: usize, z: f32) {
        let leaf = match self.leaf_for_sample.get(i) {
            Some(&leaf) if !self.nodes.is_empty() => leaf,
            _ => return,
        };
        if !(z < self.nodes[leaf].max_z) {
            return;
        }
        self.nodes[leaf].max_z = z;
        let mut n = self.nodes[leaf].parent;
        while n != NO_PARENT {
            let z = self.nodes[n].children()
                .map(|c| self.nodes[c].max_z)
                .fold(f32::NEG_INFINITY, f32::max);
            if z == self.nodes[n].max_z {
                break;
            }
            self.nodes[n].max_z = z;
            n = self.nodes[n].parent;
        }
    }

    /// Visit every sample the query may touch
    ///
    /// Subtrees outside the query's ranges or already hidden at the query's
    /// near depth are skipped. `hit` tests one sample and returns its new
    /// opaque depth when the sample became nearer.
    pub fn sample_mpg<F>(&mut self, query: &TreeQuery, hit: &mut F)
        where F: FnMut(usize) -> Option<f32>
    {
        if self.nodes.is_empty() || query.bound.is_malformed() {
            return;
        }
        self.visit(0, query, hit);
    }

    fn visit<F>(&mut self, n: usize, query: &TreeQuery, hit: &mut F)
        where F: FnMut(usize) -> Option<f32>
    {
        let node = &self.nodes[n];
        if !node.overlaps(query) || query.bound.min.z > node.max_z {
            return;
        }
        if let Some(s) = node.sample {
            if let Some(z) = hit(s) {
                self.set_max_opaque_z(s, z);
            }
            return;
        }
        for c in node.children() {
            self.visit(c, query, hit);
        }
    }
}

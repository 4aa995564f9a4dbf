// This file is part of Neon.
//
// Neon is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Neon is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Neon.  If not, see <http://www.gnu.org/licenses/>.
use geometry::Aabb2;
use nalgebra::Point2;
use smallvec::SmallVec;

pub const DEFAULT_MAX_ITEMS: usize = 10;
pub const DEFAULT_MAX_DEPTH: usize = 8;

// Buckets hold at most max_items + 1 entries before subdividing, so the
// default configuration never spills a bucket to the heap.
type Bucket = SmallVec<[u32; 12]>;

#[derive(Clone, Debug)]
struct QuadItem {
    index: u32,
    center: Point2<f64>,
    side: f64,
}

impl QuadItem {
    fn square(&self) -> Aabb2 {
        Aabb2::from_center_extent(self.center, self.side, self.side)
    }
}

#[derive(Clone, Debug)]
struct Node {
    bounds: Aabb2,
    depth: usize,
    children: Option<[u32; 4]>,
    bucket: Bucket,
}

impl Node {
    fn new(bounds: Aabb2, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            bucket: Bucket::new(),
        }
    }
}

/// A region quadtree over tile centers, flattened into an arena so nodes are
/// indices rather than allocations. Built once at startup, never mutated
/// afterwards.
///
/// Every item is owned by exactly one node: the deepest node whose half-open
/// bounds contain the item's center. An item whose center no child owns (it
/// sits on the outer boundary, or outside the root entirely) stays in the
/// bucket it reached, which for the root means tiles larger than the root
/// are accepted there and always reported.
#[derive(Clone, Debug)]
pub struct QuadTree {
    nodes: Vec<Node>,
    items: Vec<QuadItem>,
    max_items: usize,
    max_depth: usize,
    max_item_side: f64,
}

impl QuadTree {
    pub fn new(bounds: Aabb2) -> Self {
        Self::with_limits(bounds, DEFAULT_MAX_ITEMS, DEFAULT_MAX_DEPTH)
    }

    pub fn with_limits(bounds: Aabb2, max_items: usize, max_depth: usize) -> Self {
        Self {
            nodes: vec![Node::new(bounds, 0)],
            items: Vec::new(),
            max_items: max_items.max(1),
            max_depth,
            max_item_side: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node currently holding at least one item.
    pub fn occupied_depth(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| !n.bucket.is_empty())
            .map(|n| n.depth)
            .max()
            .unwrap_or(0)
    }

    pub fn insert(&mut self, index: u32, center: Point2<f64>, side: f64) {
        debug_assert!(side > 0.0);
        if side > self.max_item_side {
            self.max_item_side = side;
        }
        self.items.push(QuadItem {
            index,
            center,
            side,
        });
        let item = (self.items.len() - 1) as u32;
        self.place(0, item);
    }

    fn place(&mut self, start: u32, item: u32) {
        let center = self.items[item as usize].center;
        let mut ni = start;
        loop {
            if let Some(children) = self.nodes[ni as usize].children {
                match self.owning_child(&children, center) {
                    Some(ci) => ni = ci,
                    // No child owns the center; hold it here.
                    None => {
                        self.nodes[ni as usize].bucket.push(item);
                        return;
                    }
                }
            } else {
                let node = &mut self.nodes[ni as usize];
                node.bucket.push(item);
                if node.bucket.len() > self.max_items && node.depth < self.max_depth {
                    self.subdivide(ni);
                }
                return;
            }
        }
    }

    fn owning_child(&self, children: &[u32; 4], center: Point2<f64>) -> Option<u32> {
        children
            .iter()
            .copied()
            .find(|&ci| self.nodes[ci as usize].bounds.owns(center))
    }

    fn subdivide(&mut self, ni: u32) {
        debug_assert!(self.nodes[ni as usize].children.is_none());
        let bounds = self.nodes[ni as usize].bounds;
        let depth = self.nodes[ni as usize].depth;
        let center = bounds.center();
        let (hw, hh) = (bounds.width() / 2.0, bounds.height() / 2.0);
        let mut children = [0u32; 4];
        for (slot, (dx, dy)) in [(-0.25, -0.25), (0.25, -0.25), (-0.25, 0.25), (0.25, 0.25)]
            .into_iter()
            .enumerate()
        {
            let child_center = Point2::new(
                center.x + dx * bounds.width(),
                center.y + dy * bounds.height(),
            );
            children[slot] = self.nodes.len() as u32;
            self.nodes
                .push(Node::new(Aabb2::from_center_extent(child_center, hw, hh), depth + 1));
        }
        self.nodes[ni as usize].children = Some(children);

        // Re-place everything held here; items no child owns come right back.
        let held = std::mem::take(&mut self.nodes[ni as usize].bucket);
        for item in held {
            self.place(ni, item);
        }
    }

    /// All tiles whose bounding square intersects `rect`, by insertion index.
    pub fn query_range(&self, rect: &Aabb2, out: &mut Vec<u32>) {
        // Bucket items can overhang their node's bounds by half their side,
        // so descent is pruned against an inflated rectangle while hits are
        // confirmed against the true squares.
        let inflated = rect.inflate(self.max_item_side / 2.0);
        // The root bucket is scanned unconditionally: it holds the
        // stragglers whose centers no child owns, including tiles larger
        // than the root.
        self.scan_bucket(0, rect, out);
        if let Some(children) = self.nodes[0].children {
            for ci in children {
                self.query_node(ci, rect, &inflated, out);
            }
        }
    }

    /// All tiles whose bounding square contains the point.
    pub fn query_point(&self, p: Point2<f64>, out: &mut Vec<u32>) {
        self.query_range(&Aabb2::from_bounds(p, p), out);
    }

    fn query_node(&self, ni: u32, rect: &Aabb2, inflated: &Aabb2, out: &mut Vec<u32>) {
        let node = &self.nodes[ni as usize];
        if !node.bounds.overlaps(inflated) {
            return;
        }
        self.scan_bucket(ni, rect, out);
        if let Some(children) = node.children {
            for ci in children {
                self.query_node(ci, rect, inflated, out);
            }
        }
    }

    fn scan_bucket(&self, ni: u32, rect: &Aabb2, out: &mut Vec<u32>) {
        for &ii in &self.nodes[ni as usize].bucket {
            let item = &self.items[ii as usize];
            if item.square().overlaps(rect) {
                out.push(item.index);
            }
        }
    }
}

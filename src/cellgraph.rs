//! Half-edge dual mesh of the planarized similarity graph, its
//! simplification, T-junction resolution and curve emission.
//!
//! Nodes and edges live in arenas and reference each other by dense index.
//! Invalidation flips an entity's id to -1; compaction drops invalidated
//! entities, re-densifies ids and rewrites every cross-reference.

use crate::adjacency::SimilarityGraph;
use crate::geometry::{line_intersection, polygon_area, QuadBezier, Vec2};
use crate::raster::{Pixel, PixelGrid};
use crate::svg::SvgSink;
use rgb::RGBA8;
use std::f64::consts::TAU;
use tracing::{debug, info};

/// Candidate node slots inside a 2x2 grid box:
///
/// ```text
/// . . 5 . .
/// . 1 . 2 .
/// 8 . 0 . 6
/// . 4 . 3 .
/// . . 7 . .
/// ```
///
/// Slot 5 is shared with slot 7 of the box above, slot 8 with slot 6 of the
/// box to the left.
const SLOT_OFFSETS: [Vec2; 9] = [
    Vec2 { x: 0.5, y: 0.5 },
    Vec2 { x: 0.25, y: 0.25 },
    Vec2 { x: 0.75, y: 0.25 },
    Vec2 { x: 0.75, y: 0.75 },
    Vec2 { x: 0.25, y: 0.75 },
    Vec2 { x: 0.5, y: 0.0 },
    Vec2 { x: 1.0, y: 0.5 },
    Vec2 { x: 0.5, y: 1.0 },
    Vec2 { x: 0.0, y: 0.5 },
];

#[derive(Debug, Clone)]
pub struct CellNode {
    /// Dense id; -1 marks an invalidated node awaiting compaction.
    pub id: i32,
    /// Top-left corner of the owning grid box.
    pub position: Vec2,
    /// Slot offset inside the box.
    pub offset: Vec2,
    /// Outgoing half-edges.
    pub edges: Vec<usize>,
}

impl CellNode {
    pub fn coordinates(&self) -> Vec2 {
        self.position + self.offset
    }
}

#[derive(Debug, Clone)]
pub struct CellEdge {
    /// Dense id; -1 marks an invalidated edge awaiting compaction.
    pub id: i32,
    pub start: usize,
    pub end: usize,
    /// The pixel whose color this half-edge fronts on its left.
    pub pixel: Pixel,
    /// Next edge along the region boundary this edge belongs to.
    pub next: Option<usize>,
    /// The twin half-edge on the other side.
    pub opposite: usize,
    /// Set on the interrupted stroke of a T-junction.
    pub dead_end: bool,
}

#[derive(Debug, Clone)]
pub struct CellGraph {
    nodes: Vec<CellNode>,
    edges: Vec<CellEdge>,
    box_rows: usize,
    box_cols: usize,
    frame_color: RGBA8,
}

impl CellGraph {
    /// Build the dual mesh from the planarized adjacency state. Each 2x2
    /// grid box contributes one of three edge templates picked by its
    /// surviving diagonal; a block whose conflict stayed unresolved is
    /// treated as if it had no diagonal at all.
    pub fn build(grid: &PixelGrid, graph: &SimilarityGraph) -> Self {
        let box_rows = grid.height() - 1;
        let box_cols = grid.width() - 1;
        let mut cells = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            box_rows,
            box_cols,
            frame_color: grid.color_at(0, 0),
        };

        let mut boxes: Vec<[usize; 9]> = Vec::with_capacity(box_rows * box_cols);
        for row in 0..box_rows {
            for col in 0..box_cols {
                let mut slots = [0usize; 9];
                for (slot, &offset) in SLOT_OFFSETS.iter().enumerate() {
                    slots[slot] = if slot == 5 && row > 0 {
                        boxes[(row - 1) * box_cols + col][7]
                    } else if slot == 8 && col > 0 {
                        boxes[row * box_cols + col - 1][6]
                    } else {
                        cells.create_node(Vec2::new(col as f64, row as f64), offset)
                    };
                }
                boxes.push(slots);
            }
        }

        for row in 0..box_rows {
            for col in 0..box_cols {
                let slots = boxes[row * box_cols + col];
                let top_left = grid.pixel_at(row, col);
                let top_right = grid.pixel_at(row, col + 1);
                let bottom_left = grid.pixel_at(row + 1, col);
                let bottom_right = grid.pixel_at(row + 1, col + 1);

                let dexter = graph.edge(row, col, 7);
                let sinister = graph.edge(row + 1, col, 2);

                if dexter && !sinister {
                    let e52 = cells.create_edge(slots[5], slots[2], top_left);
                    let e24 = cells.create_edge(slots[2], slots[4], top_left);
                    let e48 = cells.create_edge(slots[4], slots[8], top_left);
                    let e62 = cells.create_edge(slots[6], slots[2], top_right);
                    let e25 = cells.create_edge(slots[2], slots[5], top_right);
                    let e84 = cells.create_edge(slots[8], slots[4], bottom_left);
                    let e47 = cells.create_edge(slots[4], slots[7], bottom_left);
                    let e74 = cells.create_edge(slots[7], slots[4], bottom_right);
                    let e42 = cells.create_edge(slots[4], slots[2], bottom_right);
                    let e26 = cells.create_edge(slots[2], slots[6], bottom_right);

                    cells.link_twins(e52, e25);
                    cells.link_twins(e24, e42);
                    cells.link_twins(e48, e84);
                    cells.link_twins(e62, e26);
                    cells.link_twins(e47, e74);
                } else if sinister && !dexter {
                    let e51 = cells.create_edge(slots[5], slots[1], top_left);
                    let e18 = cells.create_edge(slots[1], slots[8], top_left);
                    let e63 = cells.create_edge(slots[6], slots[3], top_right);
                    let e31 = cells.create_edge(slots[3], slots[1], top_right);
                    let e15 = cells.create_edge(slots[1], slots[5], top_right);
                    let e81 = cells.create_edge(slots[8], slots[1], bottom_left);
                    let e13 = cells.create_edge(slots[1], slots[3], bottom_left);
                    let e37 = cells.create_edge(slots[3], slots[7], bottom_left);
                    let e73 = cells.create_edge(slots[7], slots[3], bottom_right);
                    let e36 = cells.create_edge(slots[3], slots[6], bottom_right);

                    cells.link_twins(e51, e15);
                    cells.link_twins(e18, e81);
                    cells.link_twins(e63, e36);
                    cells.link_twins(e31, e13);
                    cells.link_twins(e37, e73);
                } else {
                    let e50 = cells.create_edge(slots[5], slots[0], top_left);
                    let e08 = cells.create_edge(slots[0], slots[8], top_left);
                    let e60 = cells.create_edge(slots[6], slots[0], top_right);
                    let e05 = cells.create_edge(slots[0], slots[5], top_right);
                    let e80 = cells.create_edge(slots[8], slots[0], bottom_left);
                    let e07 = cells.create_edge(slots[0], slots[7], bottom_left);
                    let e70 = cells.create_edge(slots[7], slots[0], bottom_right);
                    let e06 = cells.create_edge(slots[0], slots[6], bottom_right);

                    cells.link_twins(e50, e05);
                    cells.link_twins(e80, e08);
                    cells.link_twins(e60, e06);
                    cells.link_twins(e70, e07);
                }
            }
        }

        cells.link_next_by_pixel_id();
        info!(
            nodes = cells.nodes.len(),
            edges = cells.edges.len(),
            "constructed cell graph"
        );
        cells
    }

    pub fn nodes(&self) -> &[CellNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CellEdge] {
        &self.edges
    }

    /// Number of outgoing half-edges at `node`.
    pub fn degree(&self, node: usize) -> usize {
        self.nodes[node].edges.len()
    }

    /// Full simplification: collapse degree-2 nodes, then dissolve edges
    /// that separate identically colored pixels.
    pub fn simplify(&mut self) {
        self.collapse_degree_two_nodes();
        self.remove_hidden_boundaries();
    }

    /// A node with exactly two outgoing edges adds no structure: splice its
    /// two incident edge pairs into one and drop the node. The surviving
    /// twins become twins of each other.
    pub fn collapse_degree_two_nodes(&mut self) {
        let mut collapsed = 0usize;
        for node in 0..self.nodes.len() {
            if self.nodes[node].id < 0 || self.nodes[node].edges.len() != 2 {
                continue;
            }
            let e0 = self.nodes[node].edges[0];
            let e1 = self.nodes[node].edges[1];
            let end0 = self.edges[e0].end;
            let end1 = self.edges[e1].end;
            let o0 = self.edges[e0].opposite;
            let o1 = self.edges[e1].opposite;

            self.edges[o0].end = end1;
            self.edges[o1].end = end0;
            self.edges[o0].opposite = o1;
            self.edges[o1].opposite = o0;

            self.edges[e0].id = -1;
            self.edges[e1].id = -1;
            self.nodes[node].edges.clear();
            self.nodes[node].id = -1;
            collapsed += 1;
        }
        self.compact();
        info!(collapsed, "collapsed degree-2 nodes");
    }

    /// An edge whose twin fronts the same color carries no boundary
    /// information; drop both halves and re-couple the remaining boundary
    /// edges into region cycles by color.
    pub fn remove_hidden_boundaries(&mut self) {
        let mut removed = 0usize;
        for edge in 0..self.edges.len() {
            if self.edges[edge].id < 0 {
                continue;
            }
            let opposite = self.edges[edge].opposite;
            if self.edges[edge].pixel.color == self.edges[opposite].pixel.color {
                self.edges[edge].id = -1;
                self.edges[opposite].id = -1;
                removed += 1;
            }
        }
        self.compact();
        self.link_next_by_color();
        info!(removed, edges = self.edges.len(), "removed hidden boundaries");
    }

    /// Flag the interrupted stroke at every degree-3 node. The two outgoing
    /// directions separated by the widest angular gap belong to the stroke
    /// that continues through the junction; the remaining one is the stem,
    /// and its inward half is marked dead-end.
    pub fn resolve_t_junctions(&mut self) {
        let mut junctions = 0usize;
        for node in 0..self.nodes.len() {
            if self.nodes[node].edges.len() != 3 {
                continue;
            }
            let origin = self.nodes[node].coordinates();
            let outgoing = [
                self.nodes[node].edges[0],
                self.nodes[node].edges[1],
                self.nodes[node].edges[2],
            ];
            let angles: Vec<f64> = outgoing
                .iter()
                .map(|&edge| {
                    let target = self.nodes[self.edges[edge].end].coordinates();
                    let direction = target - origin;
                    // y is inverted so "up" is a positive angle
                    let mut angle = (-direction.y).atan2(direction.x);
                    if angle < 0.0 {
                        angle += TAU;
                    }
                    angle
                })
                .collect();

            let pairs = [(0, 1), (0, 2), (1, 2)];
            let mut widest = 0usize;
            let mut widest_gap = -1.0f64;
            for (index, &(i, j)) in pairs.iter().enumerate() {
                let difference = (angles[i] - angles[j]).abs();
                let gap = difference.min(TAU - difference);
                if gap > widest_gap {
                    widest_gap = gap;
                    widest = index;
                }
            }
            let (i, j) = pairs[widest];
            let stem = 3 - i - j;
            let inward = self.edges[outgoing[stem]].opposite;
            self.edges[inward].dead_end = true;
            junctions += 1;
        }
        info!(junctions, "flagged T-junction dead ends");
    }

    /// Closed region boundaries, each a list of edges chained along `next`.
    /// Chains that fail to close (figure-eight boundaries through a shared
    /// node steal each other's continuation) are dropped.
    pub fn region_cycles(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.edges.len()];
        let mut cycles = Vec::new();
        for start in 0..self.edges.len() {
            if visited[start] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut edge = start;
            loop {
                visited[edge] = true;
                cycle.push(edge);
                match self.edges[edge].next {
                    Some(next) if next == start => {
                        cycles.push(cycle);
                        break;
                    }
                    Some(next) if !visited[next] => edge = next,
                    _ => break,
                }
            }
        }
        cycles
    }

    /// Emit each region as a polygon over its node coordinates, largest
    /// first so nested regions paint over their surroundings.
    pub fn render_outline(&self, sink: &mut SvgSink) {
        if self.edges.is_empty() {
            sink.add_polygon(self.frame_corners().to_vec(), self.frame_color);
            return;
        }
        let mut regions: Vec<(f64, Vec<Vec2>, RGBA8)> = self
            .region_cycles()
            .into_iter()
            .map(|cycle| {
                let points: Vec<Vec2> = cycle
                    .iter()
                    .map(|&edge| self.nodes[self.edges[edge].start].coordinates())
                    .collect();
                let color = self.edges[cycle[0]].pixel.color;
                (polygon_area(&points).abs(), points, color)
            })
            .collect();
        regions.sort_by(|a, b| b.0.total_cmp(&a.0));
        debug!(regions = regions.len(), "emitting polygonal regions");
        for (_, points, color) in regions {
            sink.add_polygon(points, color);
        }
    }

    /// Emit each region as a closed piecewise quadratic Bézier outline.
    ///
    /// Every edge contributes one arc from its midpoint through its end node
    /// to the next edge's midpoint. Nodes of degree 4 or more are passed
    /// with straight segments instead, and at flagged T-junctions the wedge
    /// the smoothing leaves open is covered by two triangular fillers drawn
    /// on top of the region fills. Regions of one color merge into a single
    /// even-odd path so enclosed loops become holes.
    pub fn render_smooth(&self, sink: &mut SvgSink) {
        if self.edges.is_empty() {
            let corners = self.frame_corners();
            let curves = (0..4)
                .map(|i| {
                    let from = corners[i];
                    let to = corners[(i + 1) % 4];
                    QuadBezier::new(from, from.midpoint(to), to)
                })
                .collect();
            sink.add_bezier_area(curves, self.frame_color);
            return;
        }

        let mut junction_emitted = vec![false; self.nodes.len()];
        let mut fillers: Vec<(Vec<Vec2>, RGBA8)> = Vec::new();
        // color -> (accumulated |area|, loops)
        let mut groups: Vec<(RGBA8, f64, Vec<Vec<QuadBezier>>)> = Vec::new();

        for cycle in self.region_cycles() {
            let mut curves = Vec::with_capacity(cycle.len());
            for (index, &edge) in cycle.iter().enumerate() {
                let following = cycle[(index + 1) % cycle.len()];
                let end_node = self.edges[edge].end;
                if self.degree(end_node) == 3 && !junction_emitted[end_node] {
                    if let Some(dead) = self.inward_dead_end(end_node) {
                        junction_emitted[end_node] = true;
                        fillers.extend(self.junction_fillers(dead));
                    }
                }
                curves.extend(self.edge_arcs(edge, following));
            }

            let points: Vec<Vec2> = cycle
                .iter()
                .map(|&edge| self.nodes[self.edges[edge].start].coordinates())
                .collect();
            let area = polygon_area(&points).abs();
            let color = self.edges[cycle[0]].pixel.color;
            match groups.iter_mut().find(|(c, _, _)| *c == color) {
                Some((_, total, loops)) => {
                    *total += area;
                    loops.push(curves);
                }
                None => groups.push((color, area, vec![curves])),
            }
        }

        groups.sort_by(|a, b| b.1.total_cmp(&a.1));
        debug!(
            regions = groups.len(),
            fillers = fillers.len(),
            "emitting smoothed regions"
        );
        for (color, _, mut loops) in groups {
            if loops.len() == 1 {
                sink.add_bezier_area(loops.pop().expect("non-empty group"), color);
            } else {
                sink.add_bezier_area_with_holes(loops, color);
            }
        }
        for (points, color) in fillers {
            sink.add_polygon(points, color);
        }
    }

    /// Debug overlay: the smoothed boundary arcs as stroked curves.
    pub fn render_curve_strokes(&self, sink: &mut SvgSink, line_width: u32) {
        const CURVE_COLOR: RGBA8 = RGBA8 { r: 255, g: 0, b: 255, a: 255 };
        for cycle in self.region_cycles() {
            for (index, &edge) in cycle.iter().enumerate() {
                let following = cycle[(index + 1) % cycle.len()];
                for arc in self.edge_arcs(edge, following) {
                    sink.add_quadratic_bezier(arc, CURVE_COLOR, line_width);
                }
            }
        }
    }

    /// Debug overlay: every half-edge as a line.
    pub fn render_debug_edges(&self, sink: &mut SvgSink, line_width: u32) {
        const EDGE_COLOR: RGBA8 = RGBA8 { r: 0, g: 255, b: 0, a: 255 };
        for edge in &self.edges {
            sink.add_line(
                self.nodes[edge.start].coordinates(),
                self.nodes[edge.end].coordinates(),
                EDGE_COLOR,
                line_width,
            );
        }
    }

    /// Debug overlay: dead-end edges only.
    pub fn render_dead_ends(&self, sink: &mut SvgSink, line_width: u32) {
        const DEAD_END_COLOR: RGBA8 = RGBA8 { r: 0, g: 0, b: 255, a: 255 };
        for edge in &self.edges {
            if !edge.dead_end {
                continue;
            }
            sink.add_line(
                self.nodes[edge.start].coordinates(),
                self.nodes[edge.end].coordinates(),
                DEAD_END_COLOR,
                line_width,
            );
        }
    }

    fn create_node(&mut self, position: Vec2, offset: Vec2) -> usize {
        let id = self.nodes.len() as i32;
        self.nodes.push(CellNode {
            id,
            position,
            offset,
            edges: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn create_edge(&mut self, start: usize, end: usize, pixel: Pixel) -> usize {
        let id = self.edges.len() as i32;
        self.edges.push(CellEdge {
            id,
            start,
            end,
            pixel,
            next: None,
            opposite: usize::MAX,
            dead_end: false,
        });
        let index = self.edges.len() - 1;
        self.nodes[start].edges.push(index);
        index
    }

    fn link_twins(&mut self, a: usize, b: usize) {
        self.edges[a].opposite = b;
        self.edges[b].opposite = a;
    }

    /// Couple each edge to the first outgoing edge at its end node owned by
    /// the same pixel, closing every pixel's boundary into a cycle.
    fn link_next_by_pixel_id(&mut self) {
        for edge in 0..self.edges.len() {
            let end = self.edges[edge].end;
            let pixel_id = self.edges[edge].pixel.id;
            let next = self.nodes[end]
                .edges
                .iter()
                .copied()
                .find(|&candidate| self.edges[candidate].pixel.id == pixel_id);
            self.edges[edge].next = next;
        }
    }

    /// After hidden boundaries are gone a region spans many pixels, so the
    /// coupling criterion weakens from pixel identity to color equality.
    fn link_next_by_color(&mut self) {
        for edge in 0..self.edges.len() {
            let end = self.edges[edge].end;
            let color = self.edges[edge].pixel.color;
            let next = self.nodes[end]
                .edges
                .iter()
                .copied()
                .find(|&candidate| self.edges[candidate].pixel.color == color);
            self.edges[edge].next = next;
        }
    }

    /// Drop invalidated entities, re-densify ids and rewrite references.
    fn compact(&mut self) {
        let mut node_map = vec![usize::MAX; self.nodes.len()];
        let mut nodes = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if node.id >= 0 {
                node_map[index] = nodes.len();
                nodes.push(node.clone());
            }
        }
        let mut edge_map = vec![usize::MAX; self.edges.len()];
        let mut edges = Vec::new();
        for (index, edge) in self.edges.iter().enumerate() {
            if edge.id >= 0 {
                edge_map[index] = edges.len();
                edges.push(edge.clone());
            }
        }

        for (index, node) in nodes.iter_mut().enumerate() {
            node.id = index as i32;
            node.edges.retain(|&edge| edge_map[edge] != usize::MAX);
            for edge in node.edges.iter_mut() {
                *edge = edge_map[*edge];
            }
        }
        for (index, edge) in edges.iter_mut().enumerate() {
            edge.id = index as i32;
            edge.start = node_map[edge.start];
            edge.end = node_map[edge.end];
            edge.opposite = edge_map[edge.opposite];
            edge.next = edge
                .next
                .map(|next| edge_map[next])
                .filter(|&next| next != usize::MAX);
        }

        self.nodes = nodes;
        self.edges = edges;
    }

    fn edge_midpoint(&self, edge: usize) -> Vec2 {
        self.nodes[self.edges[edge].start]
            .coordinates()
            .midpoint(self.nodes[self.edges[edge].end].coordinates())
    }

    /// The smoothed arcs one edge contributes: a single quadratic through
    /// its end node, or two degenerate straight halves when the node has
    /// degree 4 or more and the curve must not bend there.
    fn edge_arcs(&self, edge: usize, following: usize) -> Vec<QuadBezier> {
        let end_node = self.edges[edge].end;
        let end_coord = self.nodes[end_node].coordinates();
        let mid_edge = self.edge_midpoint(edge);
        let mid_following = self.edge_midpoint(following);
        if self.degree(end_node) >= 4 {
            vec![
                QuadBezier::new(mid_edge, mid_edge, end_coord),
                QuadBezier::new(end_coord, end_coord, mid_following),
            ]
        } else {
            vec![QuadBezier::new(mid_edge, end_coord, mid_following)]
        }
    }

    /// The flagged inward edge at a degree-3 node, if any.
    fn inward_dead_end(&self, node: usize) -> Option<usize> {
        self.nodes[node]
            .edges
            .iter()
            .map(|&outgoing| self.edges[outgoing].opposite)
            .find(|&inward| self.edges[inward].dead_end)
    }

    /// The two triangles covering the wedge a dead-end stroke leaves open.
    ///
    /// The apex is the intersection of the stroke's own line with the line
    /// joining the midpoints of the two continuing edges, unless that point
    /// overshoots the junction (or the lines are parallel), in which case
    /// the junction node itself is used.
    fn junction_fillers(&self, dead: usize) -> Vec<(Vec<Vec2>, RGBA8)> {
        let junction = self.nodes[self.edges[dead].end].coordinates();
        let mid_dead = self.edge_midpoint(dead);
        let Some(t1) = self.edges[dead].next else {
            return Vec::new();
        };
        let Some(t2) = self.edges[self.edges[t1].opposite].next else {
            return Vec::new();
        };
        let mid_t1 = self.edge_midpoint(t1);
        let mid_t2 = self.edge_midpoint(t2);

        let apex = match line_intersection(mid_dead, junction, mid_t1, mid_t2) {
            Some(point) if (point - mid_dead).length() < (junction - mid_dead).length() => point,
            _ => junction,
        };

        vec![
            (vec![apex, mid_t1, mid_dead], self.edges[dead].pixel.color),
            (
                vec![apex, mid_t2, mid_dead],
                self.edges[self.edges[dead].opposite].pixel.color,
            ),
        ]
    }

    fn frame_corners(&self) -> [Vec2; 4] {
        let width = self.box_cols as f64;
        let height = self.box_rows as f64;
        [
            Vec2::new(0.0, 0.0),
            Vec2::new(width, 0.0),
            Vec2::new(width, height),
            Vec2::new(0.0, height),
        ]
    }
}

#[cfg(test)]
mod tests {
    include!("cellgraph_tests.rs");
}

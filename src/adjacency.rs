//! 8-neighbor similarity graph over the pixel grid, and its planarization.
//!
//! Every pixel starts connected to all in-bounds compass neighbors. Three
//! ordered pruning passes then make the lattice planar: dissimilar-color
//! edges are cut, fully connected 2x2 blocks lose their diagonals, and
//! conflicting "checkerboard" diagonals are resolved by a cascade of local
//! heuristics. A block where every heuristic ties keeps both diagonals and
//! is reported through [`SimilarityGraph::non_planar_mask`].

use crate::geometry::Vec2;
use crate::raster::PixelGrid;
use crate::svg::SvgSink;
use crate::ConversionOptions;
use petgraph::unionfind::UnionFind;
use rayon::prelude::*;
use rgb::RGBA8;
use std::collections::HashSet;
use tracing::{debug, info};

/// Row/column deltas for the 8 edge slots, row-major over the neighborhood:
///
/// ```text
/// 0 1 2
/// 3 . 4
/// 5 6 7
/// ```
///
/// The opposite slot of `k` is `7 - k`.
pub const NEIGHBOR_ROW: [isize; 8] = [-1, -1, -1, 0, 0, 1, 1, 1];
pub const NEIGHBOR_COL: [isize; 8] = [-1, 0, 1, -1, 1, -1, 0, 1];

#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    height: usize,
    width: usize,
    /// One 8-slot adjacency flag array per cell, row-major.
    matrix: Vec<[bool; 8]>,
}

impl SimilarityGraph {
    /// All edges set, except the ones that would point outside the grid.
    pub fn new(grid: &PixelGrid) -> Self {
        let height = grid.height();
        let width = grid.width();
        let mut matrix = vec![[true; 8]; height * width];
        for row in 0..height {
            for col in 0..width {
                let flags = &mut matrix[row * width + col];
                for k in 0..8 {
                    if !in_bounds(row, col, k, height, width) {
                        flags[k] = false;
                    }
                }
            }
        }
        Self {
            height,
            width,
            matrix,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn edge(&self, row: usize, col: usize, k: usize) -> bool {
        self.matrix[row * self.width + col][k]
    }

    /// Symmetric update: also flips the opposite half-edge on the neighbor.
    pub fn set_edge(&mut self, row: usize, col: usize, k: usize, value: bool) {
        let (next_row, next_col) = neighbor(row, col, k);
        self.matrix[row * self.width + col][k] = value;
        self.matrix[next_row * self.width + next_col][7 - k] = value;
    }

    /// Edge slots of `(row, col)` that stay inside the grid.
    pub fn edge_indices(&self, row: usize, col: usize) -> Vec<usize> {
        (0..8)
            .filter(|&k| in_bounds(row, col, k, self.height, self.width))
            .collect()
    }

    pub fn degree(&self, row: usize, col: usize) -> usize {
        self.matrix[row * self.width + col]
            .iter()
            .filter(|&&set| set)
            .count()
    }

    /// Cells participating in an unresolved 2x2 diagonal conflict, row-major.
    pub fn non_planar_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.height * self.width];
        for row in 0..self.height.saturating_sub(1) {
            for col in 0..self.width.saturating_sub(1) {
                if self.edge(row, col, 7) && self.edge(row, col + 1, 5) {
                    mask[row * self.width + col] = true;
                    mask[row * self.width + col + 1] = true;
                    mask[(row + 1) * self.width + col] = true;
                    mask[(row + 1) * self.width + col + 1] = true;
                }
            }
        }
        mask
    }

    /// Run the three pruning passes in order. Planarization is best-effort:
    /// blocks whose conflict no heuristic can decide keep both diagonals.
    pub fn planarize(&mut self, grid: &PixelGrid, options: &ConversionOptions) {
        self.prune_dissimilar_colors(grid);
        self.prune_complete_blocks();
        self.resolve_conflicting_diagonals(grid, options);
        let unresolved = self
            .non_planar_mask()
            .iter()
            .filter(|&&flagged| flagged)
            .count();
        if unresolved > 0 {
            info!(cells = unresolved, "diagonal conflicts left unresolved");
        }
    }

    /// Pass 1: pixels of different colors must not share an edge.
    ///
    /// Color mismatch is symmetric, so each cell can clear its own half of
    /// the edge independently; the rows are processed in parallel.
    fn prune_dissimilar_colors(&mut self, grid: &PixelGrid) {
        let width = self.width;
        self.matrix
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, cells)| {
                for (col, flags) in cells.iter_mut().enumerate() {
                    let own = grid.color_at(row, col);
                    for k in 0..8 {
                        if !flags[k] {
                            continue;
                        }
                        let (next_row, next_col) = neighbor(row, col, k);
                        if grid.color_at(next_row, next_col) != own {
                            flags[k] = false;
                        }
                    }
                }
            });
        debug!("pruned edges between dissimilar colors");
    }

    /// Pass 2: a 2x2 block whose four orthogonal edges and both diagonals
    /// are all set is a clique of one color; drop both diagonals so uniform
    /// regions keep a sparse lattice.
    fn prune_complete_blocks(&mut self) {
        for row in 0..self.height - 1 {
            for col in 0..self.width - 1 {
                if self.edge(row, col, 4)
                    && self.edge(row, col, 6)
                    && self.edge(row, col + 1, 6)
                    && self.edge(row + 1, col, 4)
                    && self.edge(row, col, 7)
                    && self.edge(row + 1, col, 2)
                {
                    self.set_edge(row, col, 7, false);
                    self.set_edge(row + 1, col, 2, false);
                }
            }
        }
        debug!("pruned diagonals of fully connected blocks");
    }

    /// Pass 3: blocks where both diagonals survive form a crossing that
    /// cannot be planar. Visit them in row-major order and cut one diagonal
    /// using the first heuristic that can decide; the state is re-read per
    /// block so earlier resolutions are visible to later ones.
    fn resolve_conflicting_diagonals(&mut self, grid: &PixelGrid, options: &ConversionOptions) {
        let mut resolved = 0usize;
        let mut unresolved = 0usize;
        for row in 0..self.height - 1 {
            for col in 0..self.width - 1 {
                if !(self.edge(row, col, 7) && self.edge(row, col + 1, 5)) {
                    continue;
                }
                let decided = self.resolve_by_chains(row, col)
                    || self.resolve_by_color_prominence(grid, row, col, options)
                    || self.resolve_by_components(row, col);
                if decided {
                    resolved += 1;
                } else {
                    unresolved += 1;
                }
            }
        }
        info!(resolved, unresolved, "resolved conflicting diagonals");
    }

    /// Heuristic 1: preserve the diagonal lying on the longer degree-<=2
    /// chain, cutting the other. Ties fall through.
    fn resolve_by_chains(&mut self, row: usize, col: usize) -> bool {
        let dexter = self.chain_length([(row, col), (row + 1, col + 1)]);
        let sinister = self.chain_length([(row + 1, col), (row, col + 1)]);

        if dexter > sinister {
            self.set_edge(row + 1, col, 2, false);
            return true;
        }
        if sinister > dexter {
            self.set_edge(row, col, 7, false);
            return true;
        }
        false
    }

    /// Heuristic 2: count each diagonal's color inside a window centered on
    /// the block. If one color is at least `color_prominence_threshold`
    /// times more common, cut its diagonal and preserve the sparser color.
    fn resolve_by_color_prominence(
        &mut self,
        grid: &PixelGrid,
        row: usize,
        col: usize,
        options: &ConversionOptions,
    ) -> bool {
        let window = options.color_prominence_window as usize;
        let threshold = options.color_prominence_threshold as usize;
        let margin = window.saturating_sub(2) / 2;
        let top = row.saturating_sub(margin);
        let left = col.saturating_sub(margin);
        let bottom = (top + window).min(self.height);
        let right = (left + window).min(self.width);

        let dexter_color = grid.color_at(row, col);
        let sinister_color = grid.color_at(row, col + 1);
        let dexter_count = count_color(grid, top..bottom, left..right, dexter_color);
        let sinister_count = count_color(grid, top..bottom, left..right, sinister_color);

        if dexter_count > 0 && sinister_count >= threshold * dexter_count {
            self.set_edge(row + 1, col, 2, false);
            return true;
        }
        if sinister_count > 0 && dexter_count >= threshold * sinister_count {
            self.set_edge(row, col, 7, false);
            return true;
        }
        false
    }

    /// Heuristic 3: speculatively remove each diagonal and count 8-connected
    /// components. The diagonal whose removal splits the graph into more
    /// components is the one holding a region together, so it is preserved.
    /// Ties leave the block unresolved.
    fn resolve_by_components(&mut self, row: usize, col: usize) -> bool {
        let mut without_dexter = self.clone();
        without_dexter.set_edge(row, col, 7, false);
        let mut without_sinister = self.clone();
        without_sinister.set_edge(row + 1, col, 2, false);

        let components_without_dexter = without_dexter.connected_components();
        let components_without_sinister = without_sinister.connected_components();

        if components_without_dexter > components_without_sinister {
            self.set_edge(row + 1, col, 2, false);
            return true;
        }
        if components_without_sinister > components_without_dexter {
            self.set_edge(row, col, 7, false);
            return true;
        }
        false
    }

    /// Total length of the degree-<=2 chain reachable from the two seed
    /// cells. Traversal counts a cell only while degrees stay at most 2 and
    /// stops expanding at any higher-degree cell.
    fn chain_length(&self, seeds: [(usize, usize); 2]) -> usize {
        let degrees: Vec<usize> = (0..self.height * self.width)
            .map(|idx| self.degree(idx / self.width, idx % self.width))
            .collect();
        let mut visited = vec![false; self.height * self.width];
        let mut to_visit: Vec<(usize, usize)> = seeds.to_vec();
        for &(row, col) in &to_visit {
            visited[row * self.width + col] = true;
        }

        let mut length = 0;
        while let Some((row, col)) = to_visit.pop() {
            if degrees[row * self.width + col] > 2 {
                continue;
            }
            length += 1;
            for k in self.edge_indices(row, col) {
                if !self.edge(row, col, k) {
                    continue;
                }
                let (next_row, next_col) = neighbor(row, col, k);
                if !visited[next_row * self.width + next_col] {
                    visited[next_row * self.width + next_col] = true;
                    to_visit.push((next_row, next_col));
                }
            }
        }
        length
    }

    /// Number of 8-connected components over the current edge set.
    fn connected_components(&self) -> usize {
        let mut union_find = UnionFind::<usize>::new(self.height * self.width);
        for row in 0..self.height {
            for col in 0..self.width {
                // Forward slots only; the backward half is symmetric.
                for k in 4..8 {
                    if self.edge(row, col, k) {
                        let (next_row, next_col) = neighbor(row, col, k);
                        union_find.union(row * self.width + col, next_row * self.width + next_col);
                    }
                }
            }
        }
        union_find
            .into_labeling()
            .into_iter()
            .collect::<HashSet<_>>()
            .len()
    }

    /// Debug rendering: a circle per cell and a line per edge, with the
    /// cells and diagonals of unresolved blocks highlighted in red.
    pub fn render_debug(&self, sink: &mut SvgSink, line_width: u32) {
        const NODE_COLOR: RGBA8 = RGBA8 { r: 0, g: 255, b: 0, a: 84 };
        const EDGE_COLOR: RGBA8 = RGBA8 { r: 0, g: 255, b: 0, a: 128 };
        const FAILURE_COLOR: RGBA8 = RGBA8 { r: 255, g: 0, b: 0, a: 255 };
        let non_planar = self.non_planar_mask();
        let flagged = |row: usize, col: usize| non_planar[row * self.width + col];

        for row in 0..self.height {
            for col in 0..self.width {
                let color = if flagged(row, col) { FAILURE_COLOR } else { NODE_COLOR };
                let center = Vec2::new(col as f64 + 0.5, row as f64 + 0.5);
                sink.add_circle(center, 0.2, color);
            }
        }

        for row in 0..self.height {
            for col in 0..self.width {
                // Upper slots only, so each edge is drawn once.
                for k in 0..4 {
                    if !self.edge(row, col, k) {
                        continue;
                    }
                    let (next_row, next_col) = neighbor(row, col, k);
                    let mut color = EDGE_COLOR;
                    if (k == 0 || k == 2)
                        && flagged(row, col)
                        && flagged(next_row, next_col)
                        && flagged(row, next_col)
                        && flagged(next_row, col)
                    {
                        color = FAILURE_COLOR;
                    }
                    sink.add_line(
                        Vec2::new(col as f64 + 0.5, row as f64 + 0.5),
                        Vec2::new(next_col as f64 + 0.5, next_row as f64 + 0.5),
                        color,
                        line_width,
                    );
                }
            }
        }
    }
}

/// Neighbor cell along edge slot `k`. Callers guarantee the slot stays in
/// bounds; edges pointing outside the grid are never set.
fn neighbor(row: usize, col: usize, k: usize) -> (usize, usize) {
    (
        (row as isize + NEIGHBOR_ROW[k]) as usize,
        (col as isize + NEIGHBOR_COL[k]) as usize,
    )
}

fn in_bounds(row: usize, col: usize, k: usize, height: usize, width: usize) -> bool {
    let next_row = row as isize + NEIGHBOR_ROW[k];
    let next_col = col as isize + NEIGHBOR_COL[k];
    next_row >= 0 && next_row < height as isize && next_col >= 0 && next_col < width as isize
}

fn count_color(
    grid: &PixelGrid,
    rows: std::ops::Range<usize>,
    cols: std::ops::Range<usize>,
    color: RGBA8,
) -> usize {
    rows.flat_map(|row| cols.clone().map(move |col| (row, col)))
        .filter(|&(row, col)| grid.color_at(row, col) == color)
        .count()
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::raster::ImageData;
    use crate::svg::SvgElement;
    use crate::ConversionOptions;

    const K: RGBA8 = RGBA8 { r: 0, g: 0, b: 0, a: 255 };
    const W: RGBA8 = RGBA8 { r: 255, g: 255, b: 255, a: 255 };
    const T: RGBA8 = RGBA8 { r: 0, g: 0, b: 0, a: 0 };

    /// Pad, planarize and build the dual mesh for a small raster.
    fn build_cells(width: u32, height: u32, colors: &[RGBA8]) -> (PixelGrid, CellGraph) {
        let image = ImageData {
            width,
            height,
            pixels: colors.to_vec(),
        };
        let grid = PixelGrid::new(&image, true).unwrap();
        let mut graph = SimilarityGraph::new(&grid);
        graph.planarize(&grid, &ConversionOptions::default());
        let cells = CellGraph::build(&grid, &graph);
        (grid, cells)
    }

    fn simplified(width: u32, height: u32, colors: &[RGBA8]) -> CellGraph {
        let (_, mut cells) = build_cells(width, height, colors);
        cells.simplify();
        cells.resolve_t_junctions();
        cells
    }

    fn assert_twin_involution(cells: &CellGraph) {
        for (index, edge) in cells.edges().iter().enumerate() {
            assert_eq!(
                cells.edges()[edge.opposite].opposite,
                index,
                "twin involution broken at edge {index}"
            );
        }
    }

    fn assert_dense_ids(cells: &CellGraph) {
        for (index, node) in cells.nodes().iter().enumerate() {
            assert_eq!(node.id, index as i32);
        }
        for (index, edge) in cells.edges().iter().enumerate() {
            assert_eq!(edge.id, index as i32);
        }
    }

    // === Construction Tests ===

    #[test]
    fn test_node_count_and_sharing() {
        let (grid, cells) = build_cells(2, 2, &[T, K, K, W]);
        let box_rows = grid.height() - 1;
        let box_cols = grid.width() - 1;
        // 9 slots per box minus the slots shared with the box above/left
        let expected = 9 * box_rows * box_cols - (box_rows - 1) * box_cols - box_rows * (box_cols - 1);
        assert_eq!(cells.nodes().len(), expected);

        // sharing worked iff no two nodes occupy the same point
        let mut coordinates: Vec<(i64, i64)> = cells
            .nodes()
            .iter()
            .map(|node| {
                let point = node.coordinates();
                ((point.x * 100.0) as i64, (point.y * 100.0) as i64)
            })
            .collect();
        coordinates.sort_unstable();
        let before = coordinates.len();
        coordinates.dedup();
        assert_eq!(coordinates.len(), before, "duplicate node coordinates");
    }

    #[test]
    fn test_twins_and_next_after_construction() {
        let (_, cells) = build_cells(2, 2, &[T, K, K, W]);
        assert_twin_involution(&cells);
        assert_dense_ids(&cells);
        for edge in cells.edges() {
            if let Some(next) = edge.next {
                let next_edge = &cells.edges()[next];
                assert_eq!(next_edge.start, edge.end);
                assert_eq!(next_edge.pixel.id, edge.pixel.id);
            }
        }
    }

    /// A K/W checkerboard block floating in a transparent field; every
    /// conflict heuristic ties, so the block stays non-planar.
    fn embedded_checkerboard() -> Vec<RGBA8> {
        vec![
            T, T, T, T, //
            T, K, W, T, //
            T, W, K, T, //
            T, T, T, T,
        ]
    }

    #[test]
    fn test_unresolved_block_uses_center_template() {
        // the checkerboard block stays non-planar; its grid box must fall
        // back to the no-diagonal template with a degree-4 center node
        let (_, cells) = build_cells(4, 4, &embedded_checkerboard());
        let center = cells
            .nodes()
            .iter()
            .find(|node| node.coordinates() == Vec2::new(2.5, 2.5))
            .expect("center node of the conflicted box");
        assert_eq!(center.edges.len(), 4);
    }

    // === Simplification Tests ===

    #[test]
    fn test_collapse_removes_every_degree_two_node() {
        let (_, mut cells) = build_cells(2, 2, &[T, K, K, W]);
        cells.collapse_degree_two_nodes();
        assert_dense_ids(&cells);
        assert_twin_involution(&cells);
        for node in cells.nodes() {
            assert_ne!(node.edges.len(), 2, "degree-2 node survived collapse");
        }
    }

    #[test]
    fn test_simplified_graph_has_no_hidden_boundaries() {
        let cells = simplified(2, 2, &[T, K, K, W]);
        assert_dense_ids(&cells);
        assert_twin_involution(&cells);
        for edge in cells.edges() {
            let twin = &cells.edges()[edge.opposite];
            assert_ne!(
                edge.pixel.color, twin.pixel.color,
                "edge between identical colors survived"
            );
            let next = edge.next.expect("boundary edges form closed cycles");
            let next_edge = &cells.edges()[next];
            assert_eq!(next_edge.start, edge.end);
            assert_eq!(next_edge.pixel.color, edge.pixel.color);
        }
    }

    #[test]
    fn test_uniform_raster_simplifies_to_nothing() {
        // padding shares the K corner, so the padded grid is one color class
        let cells = simplified(2, 2, &[K, K, K, K]);
        assert!(cells.edges().is_empty());
        assert!(cells.region_cycles().is_empty());
    }

    #[test]
    fn test_transparent_raster_simplifies_to_nothing() {
        let cells = simplified(3, 3, &[T; 9]);
        assert!(cells.edges().is_empty());
    }

    #[test]
    fn test_isolated_pixel_becomes_two_diamond_cycles() {
        // one K pixel on a transparent field: its boundary is a diamond of
        // four corner-to-corner edges, seen once from each side
        let cells = simplified(2, 2, &[T, T, T, K]);
        let cycles = cells.region_cycles();
        assert_eq!(cycles.len(), 2);
        for cycle in &cycles {
            assert_eq!(cycle.len(), 4);
        }
        let mut colors: Vec<RGBA8> = cycles
            .iter()
            .map(|cycle| cells.edges()[cycle[0]].pixel.color)
            .collect();
        colors.sort_by_key(|c| c.a);
        assert_eq!(colors, vec![T, K]);
        // every surviving node on the diamond is a plain degree-2 knot
        for edge in cells.edges() {
            assert_eq!(cells.degree(edge.start), 2);
        }
    }

    // === T-Junction Tests ===

    #[test]
    fn test_t_junctions_flag_exactly_one_inward_edge() {
        // K pair and a W pixel on a transparent field: the K|W boundary is
        // interrupted where it meets the transparent frame, once per end
        let cells = simplified(2, 2, &[T, K, K, W]);
        let junctions: Vec<usize> = (0..cells.nodes().len())
            .filter(|&node| cells.degree(node) == 3)
            .collect();
        assert_eq!(junctions.len(), 2);

        for &node in &junctions {
            let flagged = cells.nodes()[node]
                .edges
                .iter()
                .map(|&outgoing| cells.edges()[outgoing].opposite)
                .filter(|&inward| cells.edges()[inward].dead_end)
                .count();
            assert_eq!(flagged, 1, "exactly one inward dead end per junction");
        }
        let total_dead_ends = cells.edges().iter().filter(|edge| edge.dead_end).count();
        assert_eq!(total_dead_ends, 2);
    }

    #[test]
    fn test_degree_two_knots_are_never_flagged() {
        let cells = simplified(2, 2, &[T, T, T, K]);
        assert!(cells.edges().iter().all(|edge| !edge.dead_end));
    }

    // === Emission Tests ===

    #[test]
    fn test_outline_uniform_raster_emits_frame_polygon() {
        let cells = simplified(2, 2, &[K; 4]);
        let mut sink = SvgSink::new(20);
        cells.render_outline(&mut sink);
        assert_eq!(sink.len(), 1);
        match &sink.elements()[0] {
            SvgElement::Polygon { points, color } => {
                assert_eq!(*color, K);
                assert_eq!(points.len(), 4);
                assert_eq!(points[2], Vec2::new(3.0, 3.0));
            }
            other => panic!("expected frame polygon, found {other:?}"),
        }
    }

    #[test]
    fn test_smooth_uniform_raster_emits_single_area() {
        let cells = simplified(3, 3, &[T; 9]);
        let mut sink = SvgSink::new(20);
        cells.render_smooth(&mut sink);
        assert_eq!(sink.len(), 1);
        assert!(matches!(
            sink.elements()[0],
            SvgElement::BezierArea { .. }
        ));
    }

    #[test]
    fn test_outline_emits_one_polygon_per_cycle() {
        let cells = simplified(2, 2, &[T, T, T, K]);
        let mut sink = SvgSink::new(20);
        cells.render_outline(&mut sink);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_smooth_emits_regions_then_junction_fillers() {
        let cells = simplified(2, 2, &[T, K, K, W]);
        let mut sink = SvgSink::new(20);
        cells.render_smooth(&mut sink);

        let areas = sink
            .elements()
            .iter()
            .filter(|e| matches!(e, SvgElement::BezierArea { .. } | SvgElement::BezierAreaWithHoles { .. }))
            .count();
        let fillers = sink
            .elements()
            .iter()
            .filter(|e| matches!(e, SvgElement::Polygon { .. }))
            .count();
        assert_eq!(areas, 3, "one area per color region");
        assert_eq!(fillers, 4, "two triangles per T-junction");

        // every filler is a triangle drawn after the region fills
        for element in sink.elements().iter().rev().take(fillers) {
            match element {
                SvgElement::Polygon { points, .. } => assert_eq!(points.len(), 3),
                other => panic!("fillers must close the element list, found {other:?}"),
            }
        }
    }

    #[test]
    fn test_smooth_paints_larger_regions_first() {
        let cells = simplified(2, 2, &[T, K, K, W]);
        let mut sink = SvgSink::new(20);
        cells.render_smooth(&mut sink);
        let code = sink.svg_code();
        // the transparent surround owns the largest outline, the lone W
        // pixel the smallest
        let transparent = code.find("rgba(0, 0, 0, 0)").unwrap();
        let black = code.find("rgba(0, 0, 0, 255)").unwrap();
        let white = code.find("rgba(255, 255, 255, 255)").unwrap();
        assert!(transparent < black);
        assert!(black < white);
    }

    #[test]
    fn test_smooth_straight_segments_at_high_degree_nodes() {
        // the unresolved checkerboard keeps its degree-4 center node; curves
        // passing it must degenerate into straight segments through the node
        let cells = simplified(4, 4, &embedded_checkerboard());
        let mut sink = SvgSink::new(20);
        cells.render_smooth(&mut sink);
        let degenerate = sink.elements().iter().any(|element| match element {
            SvgElement::BezierArea { curves, .. } => curves
                .iter()
                .any(|curve| curve.p0 == curve.p1 || curve.p1 == curve.p2),
            SvgElement::BezierAreaWithHoles { loops, .. } => loops.iter().flatten().any(|curve| curve.p0 == curve.p1 || curve.p1 == curve.p2),
            _ => false,
        });
        assert!(degenerate, "no straight-through segment was emitted");
    }

    #[test]
    fn test_curve_strokes_draw_one_quad_per_edge() {
        // the isolated-pixel diamond has two 4-edge cycles, all knots of
        // degree 2, so every edge contributes exactly one stroked arc
        let cells = simplified(2, 2, &[T, T, T, K]);
        let mut sink = SvgSink::new(20);
        cells.render_curve_strokes(&mut sink, 2);
        assert_eq!(sink.len(), 8);
        assert!(sink
            .elements()
            .iter()
            .all(|e| matches!(e, SvgElement::QuadraticBezier { .. })));
    }

    #[test]
    fn test_debug_overlays_draw_edges_and_dead_ends() {
        let cells = simplified(2, 2, &[T, K, K, W]);
        let mut sink = SvgSink::new(20);
        cells.render_debug_edges(&mut sink, 2);
        assert_eq!(sink.len(), cells.edges().len());
        let mut sink = SvgSink::new(20);
        cells.render_dead_ends(&mut sink, 2);
        assert_eq!(sink.len(), 2);
    }
}

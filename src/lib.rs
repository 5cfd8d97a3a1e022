//! pix2svg - depixelizing pixel art into resolution-independent SVG
//!
//! This library converts a small pixel-art raster into a vector rendering in
//! which the hard square boundaries are replaced by smooth curves that follow
//! the artist's intended shapes, in the spirit of Kopf-Lischinski
//! "Depixelizing Pixel Art".
//!
//! ## Pipeline
//!
//! - **Similarity graph** over the padded pixel grid, planarized with local
//!   heuristics (curve continuation, sparse-color preference, component
//!   preservation)
//! - **Cell graph**: a half-edge dual mesh of the color regions
//! - **Simplification** down to the minimal region boundary graph, plus
//!   T-junction resolution
//! - **Curve emission** as closed piecewise quadratic Bézier outlines
//!
//! ## Example
//!
//! ```rust,no_run
//! use pix2svg::{convert, ConversionOptions};
//! use std::path::Path;
//!
//! let options = ConversionOptions {
//!     scale_factor: 10,
//!     ..Default::default()
//! };
//!
//! convert(Path::new("sprite.png"), Path::new("sprite.html"), &options)
//!     .expect("Conversion failed");
//! ```

pub mod adjacency;
pub mod cellgraph;
pub mod color;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod svg;

pub use adjacency::SimilarityGraph;
pub use cellgraph::CellGraph;
pub use error::{Pix2SvgError, Result};
pub use geometry::{QuadBezier, Vec2};
pub use raster::{load_image, reduce_upscaled, save_png, ImageData, PixelGrid};
pub use svg::{SvgElement, SvgSink};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the sink receives for a given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// One square per pixel of the padded grid.
    Pixels,
    /// Pixel squares with the planarized similarity graph drawn on top.
    Graph,
    /// Simplified regions as hard-cornered polygons.
    Outline,
    /// Simplified regions as smooth piecewise Bézier outlines.
    #[default]
    Smooth,
}

/// Options for pixel art to SVG conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// SVG unit scaling (default: 20)
    pub scale_factor: u32,
    /// Stroke width for debug lines and Bézier strokes (default: 2)
    pub line_width: u32,
    /// Ratio at which a color counts as prominent during diagonal-conflict
    /// resolution (default: 4)
    pub color_prominence_threshold: u32,
    /// Side length, in pixels, of the window the prominence heuristic scans
    /// (default: 6)
    pub color_prominence_window: u32,
    /// Rendering mode (default: smooth)
    pub mode: RenderMode,
    /// Shrink inputs that are integer up-scales of the pixel art
    /// (default: false)
    pub reduce_upscaled: bool,
    /// Overlay simplified cell-graph edges and dead-end flags
    /// (default: false)
    pub debug_edges: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            scale_factor: svg::DEFAULT_SCALE_FACTOR,
            line_width: svg::DEFAULT_LINE_WIDTH,
            color_prominence_threshold: 4,
            color_prominence_window: 6,
            mode: RenderMode::Smooth,
            reduce_upscaled: false,
            debug_edges: false,
        }
    }
}

impl ConversionOptions {
    /// All numeric options must be positive integers.
    pub fn validate(&self) -> Result<()> {
        if self.scale_factor == 0 {
            return Err(Pix2SvgError::InvalidOption("scale_factor"));
        }
        if self.line_width == 0 {
            return Err(Pix2SvgError::InvalidOption("line_width"));
        }
        if self.color_prominence_threshold == 0 {
            return Err(Pix2SvgError::InvalidOption("color_prominence_threshold"));
        }
        if self.color_prominence_window == 0 {
            return Err(Pix2SvgError::InvalidOption("color_prominence_window"));
        }
        Ok(())
    }
}

/// Convert a pixel-art image file and write the HTML-wrapped SVG fragment.
pub fn convert(input_path: &Path, output_path: &Path, options: &ConversionOptions) -> Result<()> {
    let image = load_image(input_path)?;
    let html = convert_image(&image, options)?;
    std::fs::write(output_path, html)?;
    Ok(())
}

/// Run the pipeline on in-memory image data and return the HTML-wrapped SVG
/// fragment.
pub fn convert_image(image: &ImageData, options: &ConversionOptions) -> Result<String> {
    options.validate()?;
    let reduced;
    let image = if options.reduce_upscaled {
        reduced = reduce_upscaled(image);
        &reduced
    } else {
        image
    };

    let grid = PixelGrid::new(image, true)?;
    let mut sink = SvgSink::new(options.scale_factor);

    match options.mode {
        RenderMode::Pixels => grid.render_squares(&mut sink),
        RenderMode::Graph => {
            grid.render_squares(&mut sink);
            let mut graph = SimilarityGraph::new(&grid);
            graph.planarize(&grid, options);
            graph.render_debug(&mut sink, options.line_width);
        }
        RenderMode::Outline | RenderMode::Smooth => {
            let mut graph = SimilarityGraph::new(&grid);
            graph.planarize(&grid, options);
            let mut cells = CellGraph::build(&grid, &graph);
            cells.simplify();
            cells.resolve_t_junctions();
            if options.mode == RenderMode::Outline {
                cells.render_outline(&mut sink);
            } else {
                cells.render_smooth(&mut sink);
            }
            if options.debug_edges {
                cells.render_debug_edges(&mut sink, options.line_width);
                if options.mode == RenderMode::Smooth {
                    cells.render_curve_strokes(&mut sink, options.line_width);
                }
                cells.render_dead_ends(&mut sink, options.line_width);
            }
        }
    }

    Ok(sink.html_code())
}

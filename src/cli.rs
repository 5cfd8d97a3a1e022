use clap::Parser;
use pix2svg::RenderMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pix2svg")]
#[command(about = "Depixelize pixel art into a smooth vector SVG")]
#[command(version)]
pub struct Cli {
    /// Input pixel-art image
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (default: input with .html extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rendering mode (default: smooth)
    #[arg(short, long, value_enum)]
    pub mode: Option<RenderMode>,

    /// SVG unit scaling (default: 20)
    #[arg(short, long)]
    pub scale: Option<u32>,

    /// Stroke width for debug lines (default: 2)
    #[arg(long)]
    pub line_width: Option<u32>,

    /// Prominence ratio for the sparse-color diagonal heuristic (default: 4)
    #[arg(long)]
    pub color_threshold: Option<u32>,

    /// Window side, in pixels, for the sparse-color diagonal heuristic (default: 6)
    #[arg(long)]
    pub color_window: Option<u32>,

    /// Shrink an input that is an integer up-scale of the pixel art
    #[arg(short, long)]
    pub reduce: bool,

    /// Also export the (reduced) pixel art as a PNG
    #[arg(long)]
    pub export_png: Option<PathBuf>,

    /// Overlay the simplified cell-graph edges and dead-end flags
    #[arg(long)]
    pub debug_edges: bool,

    /// JSON options file; explicit flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Check if a file extension is a supported image format.
pub fn is_supported_image(path: &std::path::Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        matches!(
            ext.to_lowercase().as_str(),
            "bmp" | "png" | "gif" | "ico" | "tiff" | "tif" | "pnm" | "tga" | "farbfeld"
        )
    } else {
        false
    }
}

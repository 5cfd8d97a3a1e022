mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use pix2svg::{convert_image, load_image, reduce_upscaled, save_png, ConversionOptions};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut options = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str::<ConversionOptions>(&text)?
        }
        None => ConversionOptions::default(),
    };
    if let Some(mode) = cli.mode {
        options.mode = mode;
    }
    if let Some(scale) = cli.scale {
        options.scale_factor = scale;
    }
    if let Some(width) = cli.line_width {
        options.line_width = width;
    }
    if let Some(threshold) = cli.color_threshold {
        options.color_prominence_threshold = threshold;
    }
    if let Some(window) = cli.color_window {
        options.color_prominence_window = window;
    }
    if cli.reduce {
        options.reduce_upscaled = true;
    }
    if cli.debug_edges {
        options.debug_edges = true;
    }

    if !cli::is_supported_image(&cli.input) {
        eprintln!(
            "Warning: {} is not a lossless raster format; pixel colors may not survive decoding",
            cli.input.display()
        );
    }

    let output_path = cli.output.unwrap_or_else(|| {
        let mut path = cli.input.clone();
        path.set_extension("html");
        path
    });

    println!(
        "Depixelizing {} to {}...",
        cli.input.display(),
        output_path.display()
    );

    let image = load_image(&cli.input)?;
    if let Some(png_path) = &cli.export_png {
        let art = if options.reduce_upscaled {
            reduce_upscaled(&image)
        } else {
            image.clone()
        };
        save_png(&art, png_path)?;
    }
    let html = convert_image(&image, &options)?;
    std::fs::write(&output_path, html)?;

    println!("Conversion complete!");
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// Integration tests for pix2svg
use pix2svg::{convert, convert_image, load_image, ConversionOptions, ImageData, RenderMode};
use rgb::RGBA8;
use std::fs;
use std::path::PathBuf;

const K: RGBA8 = RGBA8 { r: 0, g: 0, b: 0, a: 255 };
const W: RGBA8 = RGBA8 { r: 255, g: 255, b: 255, a: 255 };
const T: RGBA8 = RGBA8 { r: 0, g: 0, b: 0, a: 0 };

// Create a small test sprite programmatically
fn create_test_png(path: &PathBuf, width: u32, height: u32, pattern: &str) {
    let mut pixel_data: Vec<u8> = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height {
        for x in 0..width {
            let color = match pattern {
                "checkerboard" => {
                    if (x + y) % 2 == 0 {
                        K
                    } else {
                        W
                    }
                }
                "dot" => {
                    // transparent field with one opaque pixel in the middle
                    if x == width / 2 && y == height / 2 {
                        K
                    } else {
                        T
                    }
                }
                "corner" => {
                    // transparent top-left, K pair on the diagonal, W corner
                    match (x, y) {
                        (0, 0) => T,
                        (1, 1) => W,
                        _ => K,
                    }
                }
                "solid" => K,
                _ => W,
            };
            pixel_data.extend_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    let img: image::RgbaImage = image::ImageBuffer::from_raw(width, height, pixel_data).unwrap();
    img.save(path).expect("Failed to save test image");
}

fn image(width: u32, height: u32, colors: &[RGBA8]) -> ImageData {
    ImageData {
        width,
        height,
        pixels: colors.to_vec(),
    }
}

#[test]
fn test_full_pipeline_smooth_mode() {
    let test_img = PathBuf::from("/tmp/pix2svg_dot.png");
    let test_out = PathBuf::from("/tmp/pix2svg_dot.html");

    create_test_png(&test_img, 3, 3, "dot");

    let options = ConversionOptions::default();
    convert(&test_img, &test_out, &options).expect("conversion failed");

    assert!(test_out.exists());
    let content = fs::read_to_string(&test_out).expect("Failed to read output");
    assert!(content.starts_with("<div"));
    assert!(content.contains("<svg"));
    assert!(content.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
    assert!(content.contains(r#"shape-rendering="crispEdges""#));
    // the lone pixel produces a filled outline in its color
    assert!(content.contains("rgba(0, 0, 0, 255)"));
    assert!(content.contains("<path"));
    assert!(content.contains(" Q "));

    let _ = fs::remove_file(&test_img);
    let _ = fs::remove_file(&test_out);
}

#[test]
fn test_full_pipeline_all_modes_produce_svg() {
    let test_img = PathBuf::from("/tmp/pix2svg_modes.png");
    create_test_png(&test_img, 3, 3, "checkerboard");
    let data = load_image(&test_img).expect("Failed to load image");

    for mode in [
        RenderMode::Pixels,
        RenderMode::Graph,
        RenderMode::Outline,
        RenderMode::Smooth,
    ] {
        let options = ConversionOptions {
            mode,
            ..Default::default()
        };
        let html = convert_image(&data, &options).expect("pipeline failed");
        assert!(html.contains("<svg"), "mode {mode:?} produced no svg");
        assert!(html.contains("</svg>"));
    }

    let _ = fs::remove_file(&test_img);
}

#[test]
fn test_pixels_mode_emits_one_square_per_padded_cell() {
    let data = image(2, 2, &[K, W, W, K]);
    let options = ConversionOptions {
        mode: RenderMode::Pixels,
        ..Default::default()
    };
    let html = convert_image(&data, &options).unwrap();
    assert_eq!(html.matches("<rect").count(), 16);
}

#[test]
fn test_graph_mode_overlays_circles_and_lines() {
    // a checkerboard block in a transparent field ties every conflict
    // heuristic and stays non-planar
    let data = image(
        4,
        4,
        &[
            T, T, T, T, //
            T, K, W, T, //
            T, W, K, T, //
            T, T, T, T,
        ],
    );
    let options = ConversionOptions {
        mode: RenderMode::Graph,
        ..Default::default()
    };
    let html = convert_image(&data, &options).unwrap();
    assert!(html.contains("<circle"));
    assert!(html.contains("<line"));
    // the unresolved checkerboard block is highlighted
    assert!(html.contains("rgba(255, 0, 0, 255)"));
}

#[test]
fn test_outline_mode_emits_polygons() {
    let data = image(2, 2, &[T, T, T, K]);
    let options = ConversionOptions {
        mode: RenderMode::Outline,
        ..Default::default()
    };
    let html = convert_image(&data, &options).unwrap();
    assert_eq!(html.matches("<polygon").count(), 2);
}

#[test]
fn test_uniform_raster_round_trip() {
    // a uniform raster reduces to a single filled region covering the frame
    let data = image(2, 2, &[K; 4]);
    let options = ConversionOptions::default();
    let html = convert_image(&data, &options).unwrap();
    assert_eq!(html.matches("<path").count(), 1);
    assert!(html.contains("rgba(0, 0, 0, 255)"));
    assert!(html.contains(" Z"));
}

#[test]
fn test_transparent_raster_round_trip() {
    let data = image(3, 3, &[T; 9]);
    let options = ConversionOptions::default();
    let html = convert_image(&data, &options).unwrap();
    assert_eq!(html.matches("<path").count(), 1);
    assert!(html.contains("rgba(0, 0, 0, 0)"));
}

#[test]
fn test_corner_sprite_emits_junction_fillers() {
    let test_img = PathBuf::from("/tmp/pix2svg_corner.png");
    create_test_png(&test_img, 2, 2, "corner");
    let data = load_image(&test_img).expect("Failed to load image");

    let html = convert_image(&data, &ConversionOptions::default()).unwrap();
    // three color regions plus two triangles per T-junction
    assert_eq!(html.matches("<path").count(), 3);
    assert_eq!(html.matches("<polygon").count(), 4);

    let _ = fs::remove_file(&test_img);
}

#[test]
fn test_reduce_upscaled_shrinks_before_conversion() {
    let data = image(
        4,
        4,
        &[
            K, K, W, W, //
            K, K, W, W, //
            W, W, K, K, //
            W, W, K, K,
        ],
    );
    let options = ConversionOptions {
        mode: RenderMode::Pixels,
        reduce_upscaled: true,
        ..Default::default()
    };
    let html = convert_image(&data, &options).unwrap();
    // reduced to 2x2 art, then padded to 4x4
    assert_eq!(html.matches("<rect").count(), 16);
}

#[test]
fn test_invalid_options_are_rejected() {
    let data = image(1, 1, &[K]);
    let options = ConversionOptions {
        scale_factor: 0,
        ..Default::default()
    };
    assert!(convert_image(&data, &options).is_err());
}

#[test]
fn test_debug_edges_overlay() {
    let data = image(2, 2, &[T, T, T, K]);
    let options = ConversionOptions {
        mode: RenderMode::Outline,
        debug_edges: true,
        ..Default::default()
    };
    let html = convert_image(&data, &options).unwrap();
    assert!(html.contains("<line"));

    // smooth mode additionally strokes the boundary arcs
    let options = ConversionOptions {
        debug_edges: true,
        ..Default::default()
    };
    let html = convert_image(&data, &options).unwrap();
    assert!(html.contains(r#"fill="none""#));
}

#[test]
fn test_scale_factor_controls_canvas() {
    let data = image(1, 1, &[K]);
    let options = ConversionOptions {
        mode: RenderMode::Pixels,
        scale_factor: 10,
        ..Default::default()
    };
    let html = convert_image(&data, &options).unwrap();
    // padded 3x3 grid at scale 10
    assert!(html.contains(r#"<svg width="30" height="30""#));
}

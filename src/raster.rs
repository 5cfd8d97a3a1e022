//! Raster model: image loading and the padded pixel grid the pipeline runs on.

use crate::color;
use crate::error::{Pix2SvgError, Result};
use crate::geometry::Vec2;
use crate::svg::SvgSink;
use rgb::RGBA8;
use tracing::{debug, info};

/// Decoded RGBA image, row-major.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<RGBA8>,
}

impl ImageData {
    /// Build from raw row-major RGBA bytes. Rejects byte counts that do not
    /// match a `height x width x 4` layout, and zero-sized dimensions.
    pub fn from_raw(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        if width == 0 {
            return Err(Pix2SvgError::EmptyRaster("width"));
        }
        if height == 0 {
            return Err(Pix2SvgError::EmptyRaster("height"));
        }
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(Pix2SvgError::RasterShape {
                width,
                height,
                expected,
                found: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

pub fn load_image(path: &std::path::Path) -> Result<ImageData> {
    let img = image::open(path)?;
    let rgba = img.to_rgba8();
    info!(
        width = rgba.width(),
        height = rgba.height(),
        "loaded input raster"
    );
    ImageData::from_raw(rgba.width(), rgba.height(), rgba.as_raw())
}

/// Write image data back out as a PNG, e.g. after up-scale reduction.
pub fn save_png(image: &ImageData, path: &std::path::Path) -> Result<()> {
    let mut bytes = Vec::with_capacity(image.pixels.len() * 4);
    for pixel in &image.pixels {
        bytes.extend_from_slice(&[pixel.r, pixel.g, pixel.b, pixel.a]);
    }
    let buffer: image::RgbaImage =
        image::ImageBuffer::from_raw(image.width, image.height, bytes)
            .expect("pixel buffer matches image dimensions");
    buffer.save(path)?;
    Ok(())
}

/// Shrink an input raster that is an integer up-scale of the underlying pixel
/// art back to one sample per art pixel.
///
/// The cell size is the GCD of all same-color run lengths, measured along
/// rows and columns. An image with no detectable cell structure (factor 1)
/// is returned unchanged.
pub fn reduce_upscaled(image: &ImageData) -> ImageData {
    let w = image.width as usize;
    let h = image.height as usize;
    let at = |row: usize, col: usize| image.pixels[row * w + col];

    let mut factor = 0usize;
    for row in 0..h {
        let mut run = 1usize;
        for col in 1..w {
            if at(row, col) == at(row, col - 1) {
                run += 1;
            } else {
                factor = gcd(factor, run);
                run = 1;
            }
        }
        factor = gcd(factor, run);
    }
    for col in 0..w {
        let mut run = 1usize;
        for row in 1..h {
            if at(row, col) == at(row - 1, col) {
                run += 1;
            } else {
                factor = gcd(factor, run);
                run = 1;
            }
        }
        factor = gcd(factor, run);
    }

    if factor <= 1 {
        debug!("no up-scale factor detected, raster left unchanged");
        return image.clone();
    }
    info!(factor, "reducing up-scaled input raster");

    let out_w = w / factor;
    let out_h = h / factor;
    let mut pixels = Vec::with_capacity(out_w * out_h);
    for row in 0..out_h {
        for col in 0..out_w {
            pixels.push(at(row * factor, col * factor));
        }
    }
    ImageData {
        width: out_w as u32,
        height: out_h as u32,
        pixels,
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if a == 0 {
        b
    } else {
        gcd(b % a, a)
    }
}

/// A single cell of the pixel grid. Identity is the id, not the color: two
/// pixels are equal iff both ids are non-negative and equal.
#[derive(Debug, Clone, Copy)]
pub struct Pixel {
    pub id: i32,
    pub color: RGBA8,
}

impl PartialEq for Pixel {
    fn eq(&self, other: &Self) -> bool {
        self.id >= 0 && self.id == other.id
    }
}

/// The padded pixel grid the graph stages consume.
///
/// With padding enabled (the normal case) the grid has shape
/// `(H + 2, W + 2)`; rows/columns `1..=H`/`1..=W` hold the source pixels and
/// the synthetic border shares the color of the source top-left pixel
/// (nominally transparent). The border guarantees that region boundaries
/// traced later always close without special cases at the image edge.
#[derive(Debug, Clone)]
pub struct PixelGrid {
    height: usize,
    width: usize,
    pixels: Vec<Pixel>,
    pixel_count: i32,
}

impl PixelGrid {
    pub fn new(image: &ImageData, padding: bool) -> Result<Self> {
        let w = image.width as usize;
        let h = image.height as usize;
        if w == 0 {
            return Err(Pix2SvgError::EmptyRaster("width"));
        }
        if h == 0 {
            return Err(Pix2SvgError::EmptyRaster("height"));
        }
        if image.pixels.len() != w * h {
            return Err(Pix2SvgError::RasterShape {
                width: image.width,
                height: image.height,
                expected: w * h * 4,
                found: image.pixels.len() * 4,
            });
        }

        let mut grid = Self {
            height: h,
            width: w,
            pixels: Vec::with_capacity(w * h),
            pixel_count: 0,
        };
        for &color in &image.pixels {
            let pixel = grid.create_pixel(color);
            grid.pixels.push(pixel);
        }
        debug!(height = h, width = w, "created pixel grid");

        if padding {
            grid.add_padding();
        }
        Ok(grid)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn color_at(&self, row: usize, col: usize) -> RGBA8 {
        self.pixels[row * self.width + col].color
    }

    pub fn pixel_at(&self, row: usize, col: usize) -> Pixel {
        self.pixels[row * self.width + col]
    }

    /// Render every grid cell as a filled unit square, padding included.
    pub fn render_squares(&self, sink: &mut SvgSink) {
        for row in 0..self.height {
            for col in 0..self.width {
                sink.add_square(Vec2::new(col as f64, row as f64), 1.0, self.color_at(row, col));
            }
        }
    }

    fn create_pixel(&mut self, color: RGBA8) -> Pixel {
        let id = self.pixel_count;
        self.pixel_count += 1;
        Pixel { id, color }
    }

    /// Surround the grid with a one-pixel border carrying the top-left color.
    fn add_padding(&mut self) {
        let (old_h, old_w) = (self.height, self.width);
        let (new_h, new_w) = (old_h + 2, old_w + 2);
        let border_color = self.pixels[0].color;
        if border_color != color::TRANSPARENT {
            debug!("top-left pixel is not transparent, padding inherits its color");
        }

        let old_pixels = std::mem::take(&mut self.pixels);
        let mut padded = vec![
            Pixel {
                id: -1,
                color: border_color
            };
            new_h * new_w
        ];
        for row in 0..old_h {
            for col in 0..old_w {
                padded[(row + 1) * new_w + (col + 1)] = old_pixels[row * old_w + col];
            }
        }
        self.height = new_h;
        self.width = new_w;
        self.pixels = padded;

        for row in 0..new_h {
            let left = self.create_pixel(border_color);
            let right = self.create_pixel(border_color);
            self.pixels[row * new_w] = left;
            self.pixels[row * new_w + new_w - 1] = right;
        }
        for col in 1..new_w - 1 {
            let top = self.create_pixel(border_color);
            let bottom = self.create_pixel(border_color);
            self.pixels[col] = top;
            self.pixels[(new_h - 1) * new_w + col] = bottom;
        }
        info!(height = new_h, width = new_w, "added padding to pixel grid");
    }
}

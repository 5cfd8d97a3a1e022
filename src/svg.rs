//! SVG accumulation and serialization.
//!
//! The sink collects primitive elements in world coordinates and applies the
//! scale factor only while serializing. The output is an XML fragment wrapped
//! in an HTML `<div>` so it can be dropped into a page or opened directly.

use crate::color;
use crate::error::Result;
use crate::geometry::{QuadBezier, Vec2};
use rgb::RGBA8;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_SCALE_FACTOR: u32 = 20;
pub const DEFAULT_LINE_WIDTH: u32 = 2;

/// One drawable primitive. Each variant knows its scaled bounding corner and
/// its markup.
#[derive(Debug, Clone)]
pub enum SvgElement {
    Square {
        position: Vec2,
        side: f64,
        color: RGBA8,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: RGBA8,
        width: u32,
    },
    Circle {
        center: Vec2,
        radius: f64,
        color: RGBA8,
    },
    Polygon {
        points: Vec<Vec2>,
        color: RGBA8,
    },
    QuadraticBezier {
        curve: QuadBezier,
        color: RGBA8,
        width: u32,
    },
    /// A closed loop of quadratic Bézier arcs, filled.
    BezierArea {
        curves: Vec<QuadBezier>,
        color: RGBA8,
    },
    /// Several closed loops filled as one path with the even-odd rule, so
    /// inner loops cut holes into outer ones.
    BezierAreaWithHoles {
        loops: Vec<Vec<QuadBezier>>,
        color: RGBA8,
    },
}

impl SvgElement {
    /// Bottom-right corner of the element's bound box, in scaled units.
    pub fn bounds(&self, scale: f64) -> Vec2 {
        let mut corner = Vec2::default();
        let mut grow = |point: Vec2| {
            corner.x = corner.x.max(point.x * scale);
            corner.y = corner.y.max(point.y * scale);
        };
        match self {
            SvgElement::Square { position, side, .. } => {
                grow(*position + Vec2::new(*side, *side));
            }
            SvgElement::Line { from, to, .. } => {
                grow(*from);
                grow(*to);
            }
            SvgElement::Circle { center, radius, .. } => {
                grow(*center + Vec2::new(*radius, *radius));
            }
            SvgElement::Polygon { points, .. } => {
                for &point in points {
                    grow(point);
                }
            }
            SvgElement::QuadraticBezier { curve, .. } => {
                for point in curve.points() {
                    grow(point);
                }
            }
            SvgElement::BezierArea { curves, .. } => {
                for curve in curves {
                    for point in curve.points() {
                        grow(point);
                    }
                }
            }
            SvgElement::BezierAreaWithHoles { loops, .. } => {
                for curves in loops {
                    for curve in curves {
                        for point in curve.points() {
                            grow(point);
                        }
                    }
                }
            }
        }
        corner
    }

    /// Serialize to an SVG tag at the given scale.
    pub fn to_svg(&self, scale: f64) -> String {
        match self {
            SvgElement::Square {
                position,
                side,
                color,
            } => {
                format!(
                    r#"<rect width="{}" height="{}" fill="{}" transform="translate{}"/>"#,
                    side * scale,
                    side * scale,
                    color::css(*color),
                    *position * scale,
                )
            }
            SvgElement::Line {
                from,
                to,
                color,
                width,
            } => {
                format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" />"#,
                    from.x * scale,
                    from.y * scale,
                    to.x * scale,
                    to.y * scale,
                    color::css(*color),
                    width,
                )
            }
            SvgElement::Circle {
                center,
                radius,
                color,
            } => {
                format!(
                    r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                    center.x * scale,
                    center.y * scale,
                    radius * scale,
                    color::css(*color),
                )
            }
            SvgElement::Polygon { points, color } => {
                let points_string = points
                    .iter()
                    .map(|p| format!("{},{}", p.x * scale, p.y * scale))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    r#"<polygon points="{}" fill="{}" />"#,
                    points_string,
                    color::css(*color),
                )
            }
            SvgElement::QuadraticBezier {
                curve,
                color,
                width,
            } => {
                format!(
                    r#"<path d="M {},{} Q {},{} {},{}" fill="none" stroke="{}" stroke-width="{}" />"#,
                    curve.p0.x * scale,
                    curve.p0.y * scale,
                    curve.p1.x * scale,
                    curve.p1.y * scale,
                    curve.p2.x * scale,
                    curve.p2.y * scale,
                    color::css(*color),
                    width,
                )
            }
            SvgElement::BezierArea { curves, color } => {
                format!(
                    r#"<path d="{}" fill="{}" />"#,
                    bezier_loop_path_data(curves, scale),
                    color::css(*color),
                )
            }
            SvgElement::BezierAreaWithHoles { loops, color } => {
                let data = loops
                    .iter()
                    .map(|curves| bezier_loop_path_data(curves, scale))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    r#"<path d="{}" fill="{}" fill-rule="evenodd"/>"#,
                    data,
                    color::css(*color),
                )
            }
        }
    }
}

/// Path data for one closed loop of quadratic arcs: `M`, a `Q` per arc, `Z`.
fn bezier_loop_path_data(curves: &[QuadBezier], scale: f64) -> String {
    let first = match curves.first() {
        Some(curve) => curve,
        None => return String::new(),
    };
    let mut data = format!("M {} {}", first.p0.x * scale, first.p0.y * scale);
    for curve in curves {
        data.push_str(&format!(
            " Q {} {}, {} {}",
            curve.p1.x * scale,
            curve.p1.y * scale,
            curve.p2.x * scale,
            curve.p2.y * scale,
        ));
    }
    data.push_str(" Z");
    data
}

/// Accumulates SVG elements and serializes them with a shared scale factor.
#[derive(Debug, Clone)]
pub struct SvgSink {
    pub scale_factor: u32,
    elements: Vec<SvgElement>,
}

impl Default for SvgSink {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE_FACTOR)
    }
}

impl SvgSink {
    pub fn new(scale_factor: u32) -> Self {
        Self {
            scale_factor,
            elements: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[SvgElement] {
        &self.elements
    }

    pub fn add_square(&mut self, position: Vec2, side: f64, color: RGBA8) {
        self.elements.push(SvgElement::Square {
            position,
            side,
            color,
        });
    }

    pub fn add_line(&mut self, from: Vec2, to: Vec2, color: RGBA8, width: u32) {
        self.elements.push(SvgElement::Line {
            from,
            to,
            color,
            width,
        });
    }

    pub fn add_circle(&mut self, center: Vec2, radius: f64, color: RGBA8) {
        self.elements.push(SvgElement::Circle {
            center,
            radius,
            color,
        });
    }

    pub fn add_polygon(&mut self, points: Vec<Vec2>, color: RGBA8) {
        self.elements.push(SvgElement::Polygon { points, color });
    }

    pub fn add_quadratic_bezier(&mut self, curve: QuadBezier, color: RGBA8, width: u32) {
        self.elements.push(SvgElement::QuadraticBezier {
            curve,
            color,
            width,
        });
    }

    pub fn add_bezier_area(&mut self, curves: Vec<QuadBezier>, color: RGBA8) {
        self.elements.push(SvgElement::BezierArea { curves, color });
    }

    pub fn add_bezier_area_with_holes(&mut self, loops: Vec<Vec<QuadBezier>>, color: RGBA8) {
        self.elements.push(SvgElement::BezierAreaWithHoles { loops, color });
    }

    /// Canvas extent: the max over all element bound corners, scaled.
    pub fn canvas_size(&self) -> Vec2 {
        let scale = self.scale_factor as f64;
        let mut size = Vec2::default();
        for element in &self.elements {
            let bounds = element.bounds(scale);
            size.x = size.x.max(bounds.x);
            size.y = size.y.max(bounds.y);
        }
        size
    }

    /// The `<svg>` block holding every element.
    pub fn svg_code(&self) -> String {
        let scale = self.scale_factor as f64;
        let canvas = self.canvas_size();
        let open = format!(
            r#"<svg width="{}" height="{}" shape-rendering="crispEdges" style="background-color: transparent;" xmlns="http://www.w3.org/2000/svg">"#,
            canvas.x, canvas.y,
        );
        let body = self
            .elements
            .iter()
            .map(|element| format!("\t{}", element.to_svg(scale)))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}\n</svg>", open, body)
    }

    /// The SVG block wrapped in the transparent HTML `<div>` the renderer
    /// embeds.
    pub fn html_code(&self) -> String {
        let indented = self
            .svg_code()
            .lines()
            .map(|line| format!("\t{}", line))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "<div style=\"background-color: transparent; padding: 0px;\">\n{}\n</div>",
            indented
        )
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        debug!(elements = self.elements.len(), "writing SVG output");
        std::fs::write(path, self.html_code())?;
        Ok(())
    }
}

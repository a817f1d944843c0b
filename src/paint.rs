// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Brushes and per-pixel paint evaluation.

use crate::color::{premultiplied, Rgba};
use crate::kurbo::Affine;
use crate::math::{dot, map, Point};
use smallvec::SmallVec;

/// Which of the canvas's two brushes an operation addresses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Style {
    /// The brush used by `fill`, `fill_rectangle`, and `fill_text`.
    Fill,
    /// The brush used by `stroke`, `stroke_rectangle`, and `stroke_text`.
    Stroke,
}

/// How a pattern tiles outside its own extent.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Repetition {
    /// Tile in both directions.
    #[default]
    Repeat,
    /// Tile horizontally only.
    RepeatX,
    /// Tile vertically only.
    RepeatY,
    /// Draw the pattern once.
    NoRepeat,
}

impl Repetition {
    fn blocks_x(self) -> bool {
        matches!(self, Self::RepeatY | Self::NoRepeat)
    }

    fn blocks_y(self) -> bool {
        matches!(self, Self::RepeatX | Self::NoRepeat)
    }
}

/// A gradient stop: color kept linear but *not* premultiplied, so stop
/// interpolation happens in straight-alpha linear space.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

pub(crate) type Stops = SmallVec<[ColorStop; 4]>;

/// A pattern's texel grid, premultiplied linear.
#[derive(Clone, Debug)]
pub(crate) struct Pattern {
    pub colors: Vec<Rgba>,
    pub width: i32,
    pub height: i32,
    pub repetition: Repetition,
    /// Image brushes clamp to the edge texel instead of wrapping; the wrap
    /// bits are ignored.
    pub clamped: bool,
}

/// How a fill or stroke is painted.
#[derive(Clone, Debug)]
pub(crate) enum Brush {
    Solid(Rgba),
    Linear {
        start: Point,
        end: Point,
        stops: Stops,
    },
    Radial {
        start: Point,
        end: Point,
        start_radius: f32,
        end_radius: f32,
        stops: Stops,
    },
    Pattern(Pattern),
}

impl Brush {
    /// Insert a gradient stop, keeping stops sorted by offset. Ignored for
    /// non-gradient brushes.
    pub fn add_stop(&mut self, offset: f32, color: Rgba) {
        match self {
            Self::Linear { stops, .. } | Self::Radial { stops, .. } => {
                let index = stops.partition_point(|stop| stop.offset <= offset);
                stops.insert(index, ColorStop { offset, color });
            }
            Self::Solid(_) | Self::Pattern(_) => {}
        }
    }

    /// The first stored color, as `clear_rectangle` borrows it: the solid
    /// color, a gradient's first stop, or a pattern's first texel.
    pub fn leading_color(&self) -> Rgba {
        match self {
            Self::Solid(color) => *color,
            Self::Linear { stops, .. } | Self::Radial { stops, .. } => {
                stops.first().map_or(Rgba::TRANSPARENT, |stop| stop.color)
            }
            Self::Pattern(pattern) => pattern.colors.first().copied().unwrap_or(Rgba::TRANSPARENT),
        }
    }
}

/// Build a pattern from unpremultiplied sRGB RGBA8 bytes with a caller
/// stride, converting every texel into the pipeline's premultiplied linear
/// form. Returns `None` when the buffer cannot hold the claimed dimensions.
pub(crate) fn pattern_from_bytes(
    image: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    repetition: Repetition,
    clamped: bool,
) -> Option<Pattern> {
    if width == 0 || height == 0 {
        return None;
    }
    let last_row = (height as usize - 1).checked_mul(stride)?;
    if last_row.checked_add(width as usize * 4)? > image.len() {
        return None;
    }
    let mut colors = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height as usize {
        let row = &image[y * stride..];
        for texel in row[..width as usize * 4].chunks_exact(4) {
            let color = Rgba::new(
                f32::from(texel[0]) / 255.0,
                f32::from(texel[1]) / 255.0,
                f32::from(texel[2]) / 255.0,
                f32::from(texel[3]) / 255.0,
            );
            colors.push(premultiplied(crate::color::linearized(color)));
        }
    }
    Some(Pattern {
        colors,
        width: width as i32,
        height: height as i32,
        repetition,
        clamped,
    })
}

/// Evaluate a brush at a canvas-space point, producing a premultiplied
/// linear color.
///
/// Gradients and patterns are defined in user space, so the point first goes
/// through the inverse transform. Patterns are resampled with a separable
/// Keys bicubic (a Catmull-Rom spline, which doubles as a good Lanczos-2
/// stand-in), with the footprint widened by the per-axis scale of the
/// inverse transform so minification stays antialiased.
pub(crate) fn paint_pixel(point: Point, brush: &Brush, inverse: Affine) -> Rgba {
    match brush {
        Brush::Solid(color) => *color,
        Brush::Pattern(pattern) => sample_pattern(map(inverse, point), pattern, inverse),
        Brush::Linear { start, end, stops } => {
            if stops.is_empty() {
                return Rgba::TRANSPARENT;
            }
            let point = map(inverse, point);
            let relative = point - *start;
            let line = *end - *start;
            let span = dot(line, line);
            if span == 0.0 {
                return Rgba::TRANSPARENT;
            }
            gradient_color(stops, dot(relative, line) / span)
        }
        Brush::Radial {
            start,
            end,
            start_radius,
            end_radius,
            stops,
        } => {
            if stops.is_empty() {
                return Rgba::TRANSPARENT;
            }
            let point = map(inverse, point);
            let relative = point - *start;
            let line = *end - *start;
            let gradient = dot(relative, line);
            let span = dot(line, line);
            // Solve for the t whose interpolated circle passes through the
            // point: the quadratic below is |relative − t·line|² = r(t)².
            let initial = *start_radius;
            let change = *end_radius - initial;
            let a = span - change * change;
            let b = -2.0 * (gradient + initial * change);
            let c = dot(relative, relative) - initial * initial;
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 || (span == 0.0 && change == 0.0) {
                return Rgba::TRANSPARENT;
            }
            let root = discriminant.sqrt();
            let reciprocal = 1.0 / (2.0 * a);
            let offset_1 = (-b - root) * reciprocal;
            let offset_2 = (-b + root) * reciprocal;
            let radius_1 = initial + change * offset_1;
            let radius_2 = initial + change * offset_2;
            let offset = if radius_2 >= 0.0 {
                offset_2
            } else if radius_1 >= 0.0 {
                offset_1
            } else {
                return Rgba::TRANSPARENT;
            };
            gradient_color(stops, offset)
        }
    }
}

/// Look up the stop pair around `offset` and interpolate, premultiplying
/// the result. Beyond the first or last stop the end color holds.
fn gradient_color(stops: &Stops, offset: f32) -> Rgba {
    let index = stops.partition_point(|stop| stop.offset <= offset);
    if index == 0 {
        return premultiplied(stops[0].color);
    }
    if index == stops.len() {
        return premultiplied(stops[index - 1].color);
    }
    let below = &stops[index - 1];
    let above = &stops[index];
    let mix = (offset - below.offset) / (above.offset - below.offset);
    premultiplied(below.color + mix * (above.color - below.color))
}

fn sample_pattern(point: Point, pattern: &Pattern, inverse: Affine) -> Rgba {
    if pattern.colors.is_empty() {
        return Rgba::TRANSPARENT;
    }
    let width = pattern.width as f32;
    let height = pattern.height as f32;
    if !pattern.clamped
        && ((pattern.repetition.blocks_x() && (point.x < 0.0 || width <= point.x))
            || (pattern.repetition.blocks_y() && (point.y < 0.0 || height <= point.y)))
    {
        return Rgba::TRANSPARENT;
    }
    let [a, b, c, d, _, _] = inverse.as_coeffs();
    // Footprint radius per axis, from the downstream pixel's size in brush
    // space; capped so heavy minification degrades instead of scanning the
    // whole image.
    let scale_x = ((a.abs() + c.abs()) as f32).min(width * 0.25).max(1.0);
    let scale_y = ((b.abs() + d.abs()) as f32).min(height * 0.25).max(1.0);
    let reciprocal_x = 1.0 / scale_x;
    let reciprocal_y = 1.0 / scale_y;
    let point = point - Point::new(0.5, 0.5);
    let left = (point.x - scale_x * 2.0).ceil() as i32;
    let top = (point.y - scale_y * 2.0).ceil() as i32;
    let right = (point.x + scale_x * 2.0).ceil() as i32;
    let bottom = (point.y + scale_y * 2.0).ceil() as i32;
    let mut total_color = Rgba::TRANSPARENT;
    let mut total_weight = 0.0_f32;
    for pattern_y in top..bottom {
        let y = (reciprocal_y * (pattern_y as f32 - point.y)).abs();
        let weight_y = keys_weight(y);
        let mut wrapped_y = pattern_y % pattern.height;
        if wrapped_y < 0 {
            wrapped_y += pattern.height;
        }
        if pattern.clamped {
            wrapped_y = pattern_y.clamp(0, pattern.height - 1);
        }
        for pattern_x in left..right {
            let x = (reciprocal_x * (pattern_x as f32 - point.x)).abs();
            let weight_x = keys_weight(x);
            let mut wrapped_x = pattern_x % pattern.width;
            if wrapped_x < 0 {
                wrapped_x += pattern.width;
            }
            if pattern.clamped {
                wrapped_x = pattern_x.clamp(0, pattern.width - 1);
            }
            let weight = weight_x * weight_y;
            let index = (wrapped_y * pattern.width + wrapped_x) as usize;
            total_color = total_color + weight * pattern.colors[index];
            total_weight += weight;
        }
    }
    (1.0 / total_weight) * total_color
}

/// The Keys cubic convolution kernel at normalized distance `x`.
#[inline]
fn keys_weight(x: f32) -> f32 {
    if x < 1.0 {
        ((1.5 * x - 2.5) * x) * x + 1.0
    } else {
        ((-0.5 * x + 2.5) * x - 4.0) * x + 2.0
    }
}

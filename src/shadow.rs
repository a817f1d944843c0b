// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow rendering.
//!
//! The shadow pass scan-converts an offset copy of the current polylines,
//! rasterizes the brush's alpha into a working buffer bounded by the shape,
//! approximates a Gaussian blur with three box-filter passes per axis, and
//! composites the colored result under the clip mask. The box filters carry
//! an extra fractional weight on their tails so the accumulated variance
//! matches the requested blur even at non-integer radii; see "Theoretical
//! Foundations of Gaussian Convolution by Extended Box Filtering" by
//! Gwosdek et al.

use crate::color::{Rgba, ALPHA_THRESHOLD};
use crate::fine::{blend, CompositeOperation};
use crate::kurbo::Affine;
use crate::math::Point;
use crate::paint::{paint_pixel, Brush};
use crate::path::Contours;
use crate::run::{lines_to_runs, PixelRun};

/// The shadow portion of the canvas draw state.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ShadowStyle {
    /// Premultiplied linear shadow color.
    pub color: Rgba,
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
}

impl ShadowStyle {
    /// Whether drawing currently casts a shadow at all.
    pub fn enabled(&self) -> bool {
        self.color.a != 0.0
            && (self.blur != 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }
}

/// Render the shadow of `lines` into the bitmap, if one is enabled.
///
/// `runs`, `scratch`, and `buffer` are reused scratch storage owned by the
/// canvas; `buffer` holds the working alpha image plus one row/column of
/// blur scratch at its tail.
#[expect(clippy::too_many_arguments, reason = "bundles the canvas's draw state")]
pub(crate) fn render_shadow(
    bitmap: &mut [Rgba],
    size_x: u16,
    size_y: u16,
    lines: &Contours,
    runs: &mut Vec<PixelRun>,
    scratch: &mut Vec<Point>,
    buffer: &mut Vec<f32>,
    mask: &[PixelRun],
    brush: &Brush,
    inverse: Affine,
    global_alpha: f32,
    operation: CompositeOperation,
    shadow: &ShadowStyle,
) {
    if !shadow.enabled() {
        return;
    }
    let sigma_squared = 0.25 * shadow.blur * shadow.blur;
    let radius = (0.5 * (4.0 * sigma_squared + 1.0).sqrt() - 0.5) as usize;
    let border = 3 * (radius as i32 + 1);
    let offset = Point::new(
        border as f32 + shadow.offset_x,
        border as f32 + shadow.offset_y,
    );
    lines_to_runs(
        runs,
        scratch,
        lines,
        offset,
        2 * border as u32,
        size_x,
        size_y,
    );
    // Bound the covered area, pad by the blur support, and clip to the
    // extended viewport.
    let mut left = i32::from(size_x) + 2 * border;
    let mut right = 0_i32;
    let mut top = i32::from(size_y) + 2 * border;
    let mut bottom = 0_i32;
    for run in runs.iter() {
        left = left.min(run.x.into());
        right = right.max(run.x.into());
        top = top.min(run.y.into());
        bottom = bottom.max(run.y.into());
    }
    let left = (left - border).max(0);
    let right = (right + border).min(i32::from(size_x) + 2 * border) + 1;
    let top = (top - border).max(0);
    let bottom = (bottom + border).min(i32::from(size_y) + 2 * border);
    let width = (right - left).max(0) as usize;
    let height = (bottom - top).max(0) as usize;
    let working = width * height;
    buffer.clear();
    buffer.resize(working + width.max(height), 0.0);
    // Rasterize the brush's alpha, offset back into canvas space so
    // gradients and patterns land where the shape would.
    {
        let mut x = -1_i32;
        let mut y = -1_i32;
        let mut sum = 0.0_f32;
        for next in runs.iter() {
            let coverage = sum.abs().min(1.0);
            let to = if i32::from(next.y) == y {
                i32::from(next.x)
            } else {
                x + 1
            };
            if coverage >= ALPHA_THRESHOLD {
                while x < to {
                    let center = Point::new(x as f32 + 0.5, y as f32 + 0.5) - offset;
                    buffer[(y - top) as usize * width + (x - left) as usize] =
                        coverage * paint_pixel(center, brush, inverse).a;
                    x += 1;
                }
            }
            if i32::from(next.y) != y {
                sum = 0.0;
            }
            x = next.x.into();
            y = next.y.into();
            sum += next.delta;
        }
    }
    // Extended-box weights matching the target variance.
    let alpha = (2 * radius + 1) as f32 * ((radius * (radius + 1)) as f32 - sigma_squared)
        / (2.0 * sigma_squared - (6 * (radius + 1) * (radius + 1)) as f32);
    let divisor = 2.0 * (alpha + radius as f32) + 1.0;
    let weight_1 = alpha / divisor;
    let weight_2 = (1.0 - alpha) / divisor;
    for y in 0..height {
        for _pass in 0..3 {
            for x in 0..width {
                buffer[working + x] = buffer[y * width + x];
            }
            let mut running = weight_1 * buffer[working + radius + 1];
            for x in 0..=radius {
                running += (weight_1 + weight_2) * buffer[working + x];
            }
            buffer[y * width] = running;
            for x in 1..width {
                if x >= radius + 1 {
                    running -= weight_2 * buffer[working + x - radius - 1];
                }
                if x >= radius + 2 {
                    running -= weight_1 * buffer[working + x - radius - 2];
                }
                if x + radius < width {
                    running += weight_2 * buffer[working + x + radius];
                }
                if x + radius + 1 < width {
                    running += weight_1 * buffer[working + x + radius + 1];
                }
                buffer[y * width + x] = running;
            }
        }
    }
    for x in 0..width {
        for _pass in 0..3 {
            for y in 0..height {
                buffer[working + y] = buffer[y * width + x];
            }
            let mut running = weight_1 * buffer[working + radius + 1];
            for y in 0..=radius {
                running += (weight_1 + weight_2) * buffer[working + y];
            }
            buffer[x] = running;
            for y in 1..height {
                if y >= radius + 1 {
                    running -= weight_2 * buffer[working + y - radius - 1];
                }
                if y >= radius + 2 {
                    running -= weight_1 * buffer[working + y - radius - 2];
                }
                if y + radius < height {
                    running += weight_2 * buffer[working + y + radius];
                }
                if y + radius + 1 < height {
                    running += weight_1 * buffer[working + y + radius + 1];
                }
                buffer[y * width + x] = running;
            }
        }
    }
    // Composite the colored alpha through the clip mask.
    let operation = operation.bits();
    let mut x = -1_i32;
    let mut y = -1_i32;
    let mut sum = 0.0_f32;
    for next in mask.iter() {
        let visibility = sum.abs().min(1.0);
        let span_end = if i32::from(next.y) == y {
            i32::from(next.x)
        } else {
            x + 1
        };
        let to = span_end.min(right - border);
        if visibility >= ALPHA_THRESHOLD && top <= y + border && y + border < bottom {
            while x < to {
                let index = y as usize * usize::from(size_x) + x as usize;
                let level = buffer
                    [(y + border - top) as usize * width + (x + border - left) as usize];
                let fore = (global_alpha * level) * shadow.color;
                bitmap[index] = blend(operation, fore, bitmap[index], visibility);
                x += 1;
            }
        }
        if i32::from(next.y) != y {
            sum = 0.0;
        }
        x = i32::from(next.x).max(left - border);
        y = next.y.into();
        sum += next.delta;
    }
}

// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canvas: draw state, path building entry points, and the operations
//! that push geometry down the pipeline.

use crate::clip::{full_mask, intersect_mask};
use crate::color::{clamped, linearized, premultiplied, Rgba};
use crate::fine::{composite, CompositeOperation};
use crate::flatten::{flatten, stroking_angular, FILL_ANGULAR};
use crate::font::{self, FaceData, Font, TextAlign, TextBaseline};
use crate::kurbo::{self, Affine, Cap, Join};
use crate::math::{
    direction, dot, invertible, map, normalized, perpendicular, Point,
};
use crate::paint::{pattern_from_bytes, Brush, Repetition, Style};
use crate::path::Contours;
use crate::run::{lines_to_runs, PixelRun};
use crate::shadow::{render_shadow, ShadowStyle};
use crate::stroke::{stroke_lines, StrokeStyle};
use peniko::color::{AlphaColor, Srgb};
use smallvec::SmallVec;
use std::sync::Arc;

/// Largest supported bitmap extent on either axis.
const MAXIMUM_SIZE: u16 = 32768;

/// All the state that `save` and `restore` cycle: styles, transforms,
/// brushes, the clip mask, and the font. The pixel bitmap and the current
/// path are deliberately not part of it.
#[derive(Clone, Debug)]
struct State {
    global_alpha: f32,
    operation: CompositeOperation,
    shadow: ShadowStyle,
    line_width: f32,
    line_cap: Cap,
    line_join: Join,
    miter_limit: f32,
    line_dash: SmallVec<[f32; 4]>,
    line_dash_offset: f32,
    text_align: TextAlign,
    text_baseline: TextBaseline,
    forward: Affine,
    inverse: Affine,
    fill_brush: Brush,
    stroke_brush: Brush,
    font: Option<Font>,
    mask: Vec<PixelRun>,
}

/// Which brush a rendering pass paints with.
#[derive(Clone, Copy)]
enum BrushChoice {
    Fill,
    Stroke,
    Image,
}

/// A 2D canvas over an owned premultiplied-linear RGBA bitmap.
///
/// The API follows the HTML canvas model: build a path, set styles, then
/// `fill`, `stroke`, or `clip`. Invalid inputs (out-of-range scalars,
/// degenerate transforms, malformed images) are absorbed as no-ops rather
/// than reported, matching canvas semantics; the only fallible call is
/// [`set_font`](Canvas::set_font).
///
/// A canvas is single-threaded; distinct instances share nothing and may be
/// used from different threads freely.
#[derive(Debug)]
pub struct Canvas {
    size_x: u16,
    size_y: u16,
    bitmap: Vec<Rgba>,
    state: State,
    saves: Vec<State>,
    image_brush: Brush,
    path: Contours,
    lines: Contours,
    scratch: Contours,
    runs: Vec<PixelRun>,
    shadow_buffer: Vec<f32>,
}

impl Canvas {
    /// Create a canvas with a transparent black bitmap.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or exceeds 32768.
    pub fn new(width: u16, height: u16) -> Self {
        assert!(
            (1..=MAXIMUM_SIZE).contains(&width) && (1..=MAXIMUM_SIZE).contains(&height),
            "canvas dimensions must be in 1..=32768"
        );
        let black = Rgba::new(0.0, 0.0, 0.0, 1.0);
        Self {
            size_x: width,
            size_y: height,
            bitmap: vec![Rgba::TRANSPARENT; usize::from(width) * usize::from(height)],
            state: State {
                global_alpha: 1.0,
                operation: CompositeOperation::SourceOver,
                shadow: ShadowStyle {
                    color: Rgba::TRANSPARENT,
                    offset_x: 0.0,
                    offset_y: 0.0,
                    blur: 0.0,
                },
                line_width: 1.0,
                line_cap: Cap::Butt,
                line_join: Join::Miter,
                miter_limit: 10.0,
                line_dash: SmallVec::new(),
                line_dash_offset: 0.0,
                text_align: TextAlign::Leftward,
                text_baseline: TextBaseline::Alphabetic,
                forward: Affine::IDENTITY,
                inverse: Affine::IDENTITY,
                fill_brush: Brush::Solid(black),
                stroke_brush: Brush::Solid(black),
                font: None,
                mask: full_mask(width, height),
            },
            saves: Vec::new(),
            image_brush: Brush::Solid(Rgba::TRANSPARENT),
            path: Contours::new(),
            lines: Contours::new(),
            scratch: Contours::new(),
            runs: Vec::new(),
            shadow_buffer: Vec::new(),
        }
    }

    /// Width of the bitmap in pixels.
    pub fn width(&self) -> u16 {
        self.size_x
    }

    /// Height of the bitmap in pixels.
    pub fn height(&self) -> u16 {
        self.size_y
    }

    /// The bitmap as premultiplied-linear RGBA, row-major.
    pub fn data(&self) -> &[Rgba] {
        &self.bitmap
    }

    /// The bitmap as a flat `f32` slice, four components per pixel.
    pub fn data_as_f32_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.bitmap)
    }

    // ==== Transforms ====

    /// Append a scale to the current transform.
    pub fn scale(&mut self, x: f64, y: f64) {
        self.transform(x, 0.0, 0.0, y, 0.0, 0.0);
    }

    /// Append a clockwise rotation in radians to the current transform.
    pub fn rotate(&mut self, angle: f64) {
        let (sine, cosine) = angle.sin_cos();
        self.transform(cosine, sine, -sine, cosine, 0.0, 0.0);
    }

    /// Append a translation to the current transform.
    pub fn translate(&mut self, x: f64, y: f64) {
        self.transform(1.0, 0.0, 0.0, 1.0, x, y);
    }

    /// Append an arbitrary affine matrix to the current transform.
    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let [a, b, c, d, e, f] =
            (self.state.forward * Affine::new([a, b, c, d, e, f])).as_coeffs();
        self.set_transform(a, b, c, d, e, f);
    }

    /// Replace the current transform.
    ///
    /// A non-invertible matrix is accepted but disables all subsequent
    /// drawing until the transform becomes invertible again.
    pub fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.state.forward = Affine::new([a, b, c, d, e, f]);
        self.state.inverse = crate::math::inverse(self.state.forward);
    }

    // ==== Compositing and shadows ====

    /// Set the opacity applied on top of every paint. Values outside
    /// `[0, 1]` are ignored.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    /// The current global alpha.
    pub fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    /// Set how painted pixels combine with the bitmap.
    pub fn set_composite_operation(&mut self, operation: CompositeOperation) {
        self.state.operation = operation;
    }

    /// The current composite operation.
    pub fn composite_operation(&self) -> CompositeOperation {
        self.state.operation
    }

    /// Set the shadow color. Shadows draw whenever this is non-transparent
    /// and the blur or either offset is nonzero.
    pub fn set_shadow_color(&mut self, color: AlphaColor<Srgb>) {
        self.state.shadow.color = Rgba::from_srgb(color);
    }

    /// Set the horizontal shadow offset, in pixels (never transformed).
    pub fn set_shadow_offset_x(&mut self, offset: f32) {
        if offset.is_finite() {
            self.state.shadow.offset_x = offset;
        }
    }

    /// Set the vertical shadow offset, in pixels (never transformed).
    pub fn set_shadow_offset_y(&mut self, offset: f32) {
        if offset.is_finite() {
            self.state.shadow.offset_y = offset;
        }
    }

    /// Set the shadow blur level. Roughly the half-width of the blur skirt;
    /// not a pixel radius. Negative values are ignored.
    pub fn set_shadow_blur(&mut self, level: f32) {
        if level >= 0.0 {
            self.state.shadow.blur = level;
        }
    }

    // ==== Line styles ====

    /// Set the stroke width in user-space units. Non-positive values are
    /// ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if width > 0.0 {
            self.state.line_width = width;
        }
    }

    /// The current stroke width.
    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    /// Set how open strokes end.
    pub fn set_line_cap(&mut self, cap: Cap) {
        self.state.line_cap = cap;
    }

    /// The current line cap.
    pub fn line_cap(&self) -> Cap {
        self.state.line_cap
    }

    /// Set how stroke segments join.
    pub fn set_line_join(&mut self, join: Join) {
        self.state.line_join = join;
    }

    /// The current line join.
    pub fn line_join(&self) -> Join {
        self.state.line_join
    }

    /// Set the miter limit: the largest ratio of miter length to line width
    /// before a miter join falls back to bevel. Non-positive values are
    /// ignored.
    pub fn set_miter_limit(&mut self, limit: f32) {
        if limit > 0.0 {
            self.state.miter_limit = limit;
        }
    }

    /// The current miter limit.
    pub fn miter_limit(&self) -> f32 {
        self.state.miter_limit
    }

    /// Set the dash pattern as alternating on/off lengths in user-space
    /// units. An odd-length pattern is doubled to make it even; an empty
    /// pattern means solid lines. Any negative (or non-finite) entry
    /// rejects the whole call.
    pub fn set_line_dash(&mut self, segments: &[f32]) {
        if segments.iter().any(|&length| !(length >= 0.0) || !length.is_finite()) {
            log::warn!("ignoring dash pattern with negative or non-finite segment");
            return;
        }
        self.state.line_dash.clear();
        self.state.line_dash.extend_from_slice(segments);
        if segments.len() % 2 != 0 {
            self.state.line_dash.extend_from_slice(segments);
        }
    }

    /// Set where in the dash pattern strokes start.
    pub fn set_line_dash_offset(&mut self, offset: f32) {
        if offset.is_finite() {
            self.state.line_dash_offset = offset;
        }
    }

    // ==== Brushes ====

    fn brush_mut(&mut self, style: Style) -> &mut Brush {
        match style {
            Style::Fill => &mut self.state.fill_brush,
            Style::Stroke => &mut self.state.stroke_brush,
        }
    }

    /// Paint fills or strokes with a solid color.
    pub fn set_color(&mut self, style: Style, color: AlphaColor<Srgb>) {
        *self.brush_mut(style) = Brush::Solid(Rgba::from_srgb(color));
    }

    /// Paint fills or strokes with a linear gradient along a line segment.
    /// The gradient starts empty; add stops with
    /// [`add_color_stop`](Canvas::add_color_stop).
    pub fn set_linear_gradient(
        &mut self,
        style: Style,
        start: impl Into<kurbo::Point>,
        end: impl Into<kurbo::Point>,
    ) {
        *self.brush_mut(style) = Brush::Linear {
            start: start.into().into(),
            end: end.into().into(),
            stops: SmallVec::new(),
        };
    }

    /// Paint fills or strokes with a radial gradient between two circles.
    /// Negative radii reject the call. The gradient starts empty; add stops
    /// with [`add_color_stop`](Canvas::add_color_stop).
    pub fn set_radial_gradient(
        &mut self,
        style: Style,
        start: impl Into<kurbo::Point>,
        start_radius: f32,
        end: impl Into<kurbo::Point>,
        end_radius: f32,
    ) {
        if !(start_radius >= 0.0 && end_radius >= 0.0) {
            return;
        }
        *self.brush_mut(style) = Brush::Radial {
            start: start.into().into(),
            end: end.into().into(),
            start_radius,
            end_radius,
            stops: SmallVec::new(),
        };
    }

    /// Add a gradient stop at an offset in `[0, 1]`. Ignored unless the
    /// addressed brush currently holds a gradient.
    pub fn add_color_stop(&mut self, style: Style, offset: f32, color: AlphaColor<Srgb>) {
        if !(0.0..=1.0).contains(&offset) {
            return;
        }
        let [r, g, b, a] = color.components;
        let color = linearized(clamped(Rgba::new(r, g, b, a)));
        self.brush_mut(style).add_stop(offset, color);
    }

    /// Paint fills or strokes with a tiled image. The pixels are copied in
    /// as unpremultiplied sRGB RGBA8 with the given byte stride; a buffer
    /// too small for the claimed dimensions rejects the call.
    pub fn set_pattern(
        &mut self,
        style: Style,
        image: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        repetition: Repetition,
    ) {
        let Some(pattern) = pattern_from_bytes(image, width, height, stride, repetition, false)
        else {
            log::warn!("ignoring pattern whose buffer cannot hold {width}x{height} pixels");
            return;
        };
        *self.brush_mut(style) = Brush::Pattern(pattern);
    }

    // ==== Path building ====

    /// Discard the current path.
    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    /// Start a new subpath at a point.
    pub fn move_to(&mut self, point: impl Into<kurbo::Point>) {
        let point = (self.state.forward * point.into()).into();
        self.path.move_to(point);
    }

    /// Close the current subpath with a line back to where it started, and
    /// begin a new subpath there.
    pub fn close_path(&mut self) {
        self.path.close();
    }

    /// Extend the current subpath with a straight line.
    pub fn line_to(&mut self, point: impl Into<kurbo::Point>) {
        let point = (self.state.forward * point.into()).into();
        self.path.line_to(point);
    }

    /// Extend the current subpath with a quadratic Bezier curve.
    pub fn quadratic_curve_to(
        &mut self,
        control: impl Into<kurbo::Point>,
        point: impl Into<kurbo::Point>,
    ) {
        let control = (self.state.forward * control.into()).into();
        let point = (self.state.forward * point.into()).into();
        self.path.quadratic_to(control, point);
    }

    /// Extend the current subpath with a cubic Bezier curve.
    pub fn bezier_curve_to(
        &mut self,
        control_1: impl Into<kurbo::Point>,
        control_2: impl Into<kurbo::Point>,
        point: impl Into<kurbo::Point>,
    ) {
        let control_1 = (self.state.forward * control_1.into()).into();
        let control_2 = (self.state.forward * control_2.into()).into();
        let point = (self.state.forward * point.into()).into();
        self.path.curve_to(control_1, control_2, point);
    }

    /// Extend the current subpath with an arc of the circle with the given
    /// radius inscribed tangent to the lines from the current point to the
    /// vertex and from the vertex onward. Nearly collinear points degrade to
    /// a straight line to the vertex.
    pub fn arc_to(
        &mut self,
        vertex: impl Into<kurbo::Point>,
        point: impl Into<kurbo::Point>,
        radius: f64,
    ) {
        if !(radius >= 0.0) || !invertible(self.state.forward) {
            return;
        }
        let vertex: kurbo::Point = vertex.into();
        if self.path.subpaths.is_empty() {
            self.move_to(vertex);
        }
        let current = *self.path.points.last().expect("move_to pushed a point");
        let point_1 = map(self.state.inverse, current);
        let vertex = Point::from(vertex);
        let point_2 = Point::from(point.into());
        let edge_1 = normalized(point_1 - vertex);
        let edge_2 = normalized(point_2 - vertex);
        let sine = dot(perpendicular(edge_1), edge_2).abs();
        const EPSILON: f32 = 1.0e-4;
        if sine < EPSILON {
            self.line_to((f64::from(vertex.x), f64::from(vertex.y)));
            return;
        }
        let offset = (radius as f32 / sine) * (edge_1 + edge_2);
        let center = vertex + offset;
        let angle_1 = direction(dot(offset, edge_1) * edge_1 - offset);
        let angle_2 = direction(dot(offset, edge_2) * edge_2 - offset);
        let reverse = ((angle_2 - angle_1) / core::f32::consts::PI).floor() as i32 & 1 != 0;
        self.arc(
            (f64::from(center.x), f64::from(center.y)),
            radius,
            f64::from(angle_1),
            f64::from(angle_2),
            reverse,
        );
    }

    /// Extend the current subpath with a circular arc, preceded by a line to
    /// its start point. Angles are in radians, measured clockwise from the
    /// positive x axis; spans beyond one full turn draw exactly one circle.
    pub fn arc(
        &mut self,
        center: impl Into<kurbo::Point>,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        counter_clockwise: bool,
    ) {
        if !(radius >= 0.0) {
            return;
        }
        const TAU: f32 = 6.283_185_3;
        let center = Point::from(center.into());
        let radius = radius as f32;
        let winding: f32 = if counter_clockwise { -1.0 } else { 1.0 };
        let from = (start_angle as f32) % TAU;
        let mut span = (end_angle as f32) % TAU - from;
        if ((end_angle - start_angle) as f32) * winding >= TAU {
            span = TAU * winding;
        } else if span * winding < 0.0 {
            span += TAU * winding;
        }
        let mut centered_1 = radius * Point::new(from.cos(), from.sin());
        self.line_to((
            f64::from(center.x + centered_1.x),
            f64::from(center.y + centered_1.y),
        ));
        if span == 0.0 {
            return;
        }
        let steps = (16.0 / TAU * span * winding).round().max(1.0);
        let segment = span / steps;
        let alpha = 4.0 / 3.0 * (0.25 * segment).tan();
        for step in 0..steps as i32 {
            let angle = from + (step + 1) as f32 * segment;
            let centered_2 = radius * Point::new(angle.cos(), angle.sin());
            let point_1 = center + centered_1;
            let point_2 = center + centered_2;
            let control_1 = point_1 + alpha * perpendicular(centered_1);
            let control_2 = point_2 - alpha * perpendicular(centered_2);
            self.bezier_curve_to(
                (f64::from(control_1.x), f64::from(control_1.y)),
                (f64::from(control_2.x), f64::from(control_2.y)),
                (f64::from(point_2.x), f64::from(point_2.y)),
            );
            centered_1 = centered_2;
        }
    }

    /// Add a closed rectangular subpath.
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to((x, y));
        self.line_to((x + width, y));
        self.line_to((x + width, y + height));
        self.line_to((x, y + height));
        self.close_path();
    }

    // ==== Drawing ====

    /// Fill the current path with the fill brush, nonzero winding rule.
    pub fn fill(&mut self) {
        self.path_to_lines(false);
        self.render_main(BrushChoice::Fill);
    }

    /// Stroke the current path with the stroke brush and line styles.
    pub fn stroke(&mut self) {
        self.path_to_lines(true);
        self.expand_stroke();
        self.render_main(BrushChoice::Stroke);
    }

    /// Intersect the clip region with the current path. There is no way to
    /// enlarge the clip except `restore`.
    pub fn clip(&mut self) {
        self.path_to_lines(false);
        lines_to_runs(
            &mut self.runs,
            &mut self.scratch.points,
            &self.lines,
            Point::ZERO,
            0,
            self.size_x,
            self.size_y,
        );
        intersect_mask(&mut self.runs, &mut self.state.mask);
    }

    /// Whether a canvas-space point is inside the current path by the
    /// nonzero winding rule. Points exactly on an edge count as inside.
    pub fn is_point_in_path(&mut self, x: f64, y: f64) -> bool {
        self.path_to_lines(false);
        let probe = Point::new(x as f32, y as f32);
        let mut winding = 0_i32;
        let mut subpath = 0;
        let mut beginning = 0;
        let mut ending = 0;
        for index in 0..self.lines.points.len() {
            while index >= ending {
                beginning = ending;
                ending += self.lines.subpaths[subpath].count;
                subpath += 1;
            }
            let from = self.lines.points[index];
            let to = self.lines.points[if index + 1 < ending {
                index + 1
            } else {
                beginning
            }];
            if (from.y < probe.y && probe.y <= to.y) || (to.y < probe.y && probe.y <= from.y) {
                let side = dot(perpendicular(to - from), probe - from);
                if side == 0.0 {
                    return true;
                }
                winding += if side > 0.0 { 1 } else { -1 };
            } else if from.y == probe.y
                && probe.y == to.y
                && ((from.x <= probe.x && probe.x <= to.x)
                    || (to.x <= probe.x && probe.x <= from.x))
            {
                return true;
            }
        }
        winding != 0
    }

    /// Erase a rectangle to transparent black, ignoring shadows, global
    /// alpha, and the composite operation (but not the clip).
    pub fn clear_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let saved_operation = self.state.operation;
        let saved_global_alpha = self.state.global_alpha;
        let saved_shadow_alpha = self.state.shadow.color.a;
        let leading = self.state.fill_brush.leading_color();
        let saved_brush =
            core::mem::replace(&mut self.state.fill_brush, Brush::Solid(leading));
        self.state.operation = CompositeOperation::DestinationOut;
        self.state.global_alpha = 1.0;
        self.state.shadow.color.a = 0.0;
        self.fill_rectangle(x, y, width, height);
        self.state.fill_brush = saved_brush;
        self.state.shadow.color.a = saved_shadow_alpha;
        self.state.global_alpha = saved_global_alpha;
        self.state.operation = saved_operation;
    }

    /// Fill an axis-aligned rectangle with the fill brush, leaving the
    /// current path alone. Zero extent on either axis is a no-op.
    pub fn fill_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if width == 0.0 || height == 0.0 {
            return;
        }
        self.lines.clear();
        let forward = self.state.forward;
        for corner in [
            (x, y),
            (x + width, y),
            (x + width, y + height),
            (x, y + height),
        ] {
            self.lines
                .points
                .push((forward * kurbo::Point::new(corner.0, corner.1)).into());
        }
        self.lines.end_subpath(0, true);
        self.render_main(BrushChoice::Fill);
    }

    /// Stroke an axis-aligned rectangle with the stroke brush, leaving the
    /// current path alone. With exactly one zero extent the degenerate edge
    /// strokes as a line; with both zero nothing draws.
    pub fn stroke_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if width == 0.0 && height == 0.0 {
            return;
        }
        self.lines.clear();
        let forward = self.state.forward;
        if width == 0.0 || height == 0.0 {
            self.lines
                .points
                .push((forward * kurbo::Point::new(x, y)).into());
            self.lines
                .points
                .push((forward * kurbo::Point::new(x + width, y + height)).into());
            self.lines.end_subpath(0, false);
        } else {
            for corner in [
                (x, y),
                (x + width, y),
                (x + width, y + height),
                (x, y + height),
                (x, y),
            ] {
                self.lines
                    .points
                    .push((forward * kurbo::Point::new(corner.0, corner.1)).into());
            }
            self.lines.end_subpath(0, true);
        }
        self.expand_stroke();
        self.render_main(BrushChoice::Stroke);
    }

    // ==== Text ====

    /// Set the horizontal text anchoring.
    pub fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    /// The current text alignment.
    pub fn text_align(&self) -> TextAlign {
        self.state.text_align
    }

    /// Set the vertical text anchoring.
    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    /// The current text baseline.
    pub fn text_baseline(&self) -> TextBaseline {
        self.state.text_baseline
    }

    /// Load a TrueType font for subsequent text calls, sized so `size`
    /// pixels cover one em. Passing an empty byte slice re-sizes the
    /// already-loaded font.
    ///
    /// Returns false (and clears any previous font) if the bytes do not
    /// parse; text calls then do nothing until a font loads successfully.
    pub fn set_font(&mut self, font: &[u8], size: f32) -> bool {
        if !size.is_finite() {
            return false;
        }
        if !font.is_empty() {
            match FaceData::parse(font) {
                Some(face) => {
                    self.state.font = Some(Font {
                        face: Arc::new(face),
                        scale: 0.0,
                    });
                }
                None => {
                    log::warn!("failed to parse font");
                    self.state.font = None;
                    return false;
                }
            }
        }
        let Some(font) = &mut self.state.font else {
            return false;
        };
        let units_per_em = font.face.units_per_em();
        if units_per_em == 0 {
            self.state.font = None;
            return false;
        }
        font.scale = size / units_per_em as f32;
        true
    }

    /// Fill a line of text anchored at a point.
    pub fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.draw_text(text, x, y, None, false);
    }

    /// Fill a line of text, squeezed horizontally to fit a maximum width.
    pub fn fill_text_with_maximum_width(&mut self, text: &str, x: f64, y: f64, maximum_width: f32) {
        self.draw_text(text, x, y, Some(maximum_width), false);
    }

    /// Stroke a line of text anchored at a point.
    pub fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.draw_text(text, x, y, None, true);
    }

    /// Stroke a line of text, squeezed horizontally to fit a maximum width.
    pub fn stroke_text_with_maximum_width(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        maximum_width: f32,
    ) {
        self.draw_text(text, x, y, Some(maximum_width), true);
    }

    /// The advance width of a line of text under the current font, without
    /// drawing it. Zero when no font is set.
    pub fn measure_text(&self, text: &str) -> f32 {
        self.state
            .font
            .as_ref()
            .map_or(0.0, |font| font::measure(font, text))
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, maximum_width: Option<f32>, stroking: bool) {
        let angular = if stroking {
            stroking_angular(self.state.line_width)
        } else {
            FILL_ANGULAR
        };
        match self.state.font.clone() {
            Some(font) => font::text_to_lines(
                &mut self.lines,
                &font,
                text,
                Point::new(x as f32, y as f32),
                maximum_width,
                self.state.text_align,
                self.state.text_baseline,
                self.state.forward,
                angular,
            ),
            None => self.lines.clear(),
        }
        if stroking {
            self.expand_stroke();
            self.render_main(BrushChoice::Stroke);
        } else {
            self.render_main(BrushChoice::Fill);
        }
    }

    // ==== Images and pixels ====

    /// Draw an image scaled into the axis-aligned rectangle from `(x, y)`
    /// extending `to_width` by `to_height` (negative extents flip). Pixels
    /// are unpremultiplied sRGB RGBA8 with a caller byte stride, resampled
    /// bicubically, and composited under the full pipeline (transform,
    /// alpha, shadow, clip, composite operation).
    #[expect(clippy::too_many_arguments, reason = "canvas image signature")]
    pub fn draw_image(
        &mut self,
        image: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        x: f64,
        y: f64,
        to_width: f64,
        to_height: f64,
    ) {
        if to_width == 0.0
            || to_height == 0.0
            || !to_width.is_finite()
            || !to_height.is_finite()
        {
            return;
        }
        let Some(pattern) =
            pattern_from_bytes(image, width, height, stride, Repetition::Repeat, true)
        else {
            return;
        };
        self.image_brush = Brush::Pattern(pattern);
        self.lines.clear();
        let forward = self.state.forward;
        for corner in [
            (x, y),
            (x + to_width, y),
            (x + to_width, y + to_height),
            (x, y + to_height),
        ] {
            self.lines
                .points
                .push((forward * kurbo::Point::new(corner.0, corner.1)).into());
        }
        self.lines.end_subpath(0, true);
        let saved_forward = self.state.forward;
        let saved_inverse = self.state.inverse;
        // The image brush lives in image space; aim the transform at it.
        self.translate(x + to_width.min(0.0), y + to_height.min(0.0));
        self.scale(
            to_width.abs() / f64::from(width),
            to_height.abs() / f64::from(height),
        );
        self.render_main(BrushChoice::Image);
        self.state.forward = saved_forward;
        self.state.inverse = saved_inverse;
    }

    /// Read a rectangle of pixels out as unpremultiplied sRGB RGBA8,
    /// dithered with a 4x4 ordered Bayer matrix to mask banding. Pixels
    /// outside the canvas read as transparent black. Ignores the transform
    /// and clip.
    pub fn get_image_data(
        &self,
        image: &mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        x: i32,
        y: i32,
    ) {
        const BAYER: [[f32; 4]; 4] = [
            [0.03125, 0.53125, 0.15625, 0.65625],
            [0.78125, 0.28125, 0.90625, 0.40625],
            [0.21875, 0.71875, 0.09375, 0.59375],
            [0.96875, 0.46875, 0.84375, 0.34375],
        ];
        for image_y in 0..height as i32 {
            for image_x in 0..width as i32 {
                let index = image_y as usize * stride + image_x as usize * 4;
                let Some(bytes) = image.get_mut(index..index + 4) else {
                    continue;
                };
                let canvas_x = x + image_x;
                let canvas_y = y + image_y;
                let mut color = Rgba::TRANSPARENT;
                if (0..i32::from(self.size_x)).contains(&canvas_x)
                    && (0..i32::from(self.size_y)).contains(&canvas_y)
                {
                    color = self.bitmap
                        [canvas_y as usize * usize::from(self.size_x) + canvas_x as usize];
                }
                let threshold = BAYER[(canvas_y & 3) as usize][(canvas_x & 3) as usize];
                let color = Rgba::new(threshold, threshold, threshold, threshold)
                    + 255.0 * crate::color::delinearized(clamped(crate::color::unpremultiplied(color)));
                bytes[0] = color.r as u8;
                bytes[1] = color.g as u8;
                bytes[2] = color.b as u8;
                bytes[3] = color.a as u8;
            }
        }
    }

    /// Write a rectangle of unpremultiplied sRGB RGBA8 pixels directly into
    /// the bitmap, bypassing the transform, clip, global alpha, and
    /// composite operation. Out-of-canvas pixels are dropped.
    pub fn put_image_data(
        &mut self,
        image: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        x: i32,
        y: i32,
    ) {
        for image_y in 0..height as i32 {
            for image_x in 0..width as i32 {
                let canvas_x = x + image_x;
                let canvas_y = y + image_y;
                if !(0..i32::from(self.size_x)).contains(&canvas_x)
                    || !(0..i32::from(self.size_y)).contains(&canvas_y)
                {
                    continue;
                }
                let index = image_y as usize * stride + image_x as usize * 4;
                let Some(bytes) = image.get(index..index + 4) else {
                    continue;
                };
                let color = Rgba::new(
                    f32::from(bytes[0]) / 255.0,
                    f32::from(bytes[1]) / 255.0,
                    f32::from(bytes[2]) / 255.0,
                    f32::from(bytes[3]) / 255.0,
                );
                self.bitmap[canvas_y as usize * usize::from(self.size_x) + canvas_x as usize] =
                    premultiplied(linearized(color));
            }
        }
    }

    // ==== State ====

    /// Push a snapshot of the style state: transforms, brushes, line and
    /// text settings, shadow settings, the clip mask, and the font. The
    /// bitmap and the current path are not saved.
    pub fn save(&mut self) {
        self.saves.push(self.state.clone());
    }

    /// Pop and restore the most recent snapshot; does nothing when the
    /// stack is empty.
    pub fn restore(&mut self) {
        if let Some(state) = self.saves.pop() {
            self.state = state;
        }
    }

    // ==== Pipeline plumbing ====

    fn path_to_lines(&mut self, stroking: bool) {
        let angular = if stroking {
            stroking_angular(self.state.line_width)
        } else {
            FILL_ANGULAR
        };
        flatten(&self.path, &mut self.lines, angular);
    }

    fn expand_stroke(&mut self) {
        let style = StrokeStyle {
            width: self.state.line_width,
            cap: self.state.line_cap,
            join: self.state.line_join,
            miter_limit: self.state.miter_limit,
            dash: &self.state.line_dash,
            dash_offset: self.state.line_dash_offset,
        };
        stroke_lines(
            &mut self.lines,
            &mut self.scratch,
            &style,
            self.state.forward,
            self.state.inverse,
        );
    }

    fn render_main(&mut self, which: BrushChoice) {
        if !invertible(self.state.forward) {
            log::debug!("skipping draw under a non-invertible transform");
            return;
        }
        let Self {
            size_x,
            size_y,
            bitmap,
            state,
            image_brush,
            lines,
            scratch,
            runs,
            shadow_buffer,
            ..
        } = self;
        let brush = match which {
            BrushChoice::Fill => &state.fill_brush,
            BrushChoice::Stroke => &state.stroke_brush,
            BrushChoice::Image => &*image_brush,
        };
        render_shadow(
            bitmap,
            *size_x,
            *size_y,
            lines,
            runs,
            &mut scratch.points,
            shadow_buffer,
            &state.mask,
            brush,
            state.inverse,
            state.global_alpha,
            state.operation,
            &state.shadow,
        );
        lines_to_runs(
            runs,
            &mut scratch.points,
            lines,
            Point::ZERO,
            0,
            *size_x,
            *size_y,
        );
        composite(
            bitmap,
            *size_x,
            runs,
            &state.mask,
            brush,
            state.inverse,
            state.global_alpha,
            state.operation,
        );
    }
}

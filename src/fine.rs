// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-pixel compositing loop.
//!
//! Drawing ends here: the path's coverage runs and the clip mask's runs are
//! walked together in one merged, sorted pass, maintaining a running
//! coverage sum for each. Spans where both the coverage and the clip
//! visibility are non-negligible get painted and blended; everything else is
//! skipped without touching the bitmap, which is what makes sparse coverage
//! pay off.

use crate::color::{Rgba, ALPHA_THRESHOLD};
use crate::kurbo::Affine;
use crate::math::Point;
use crate::paint::{paint_pixel, Brush};
use crate::run::{order, PixelRun};
use core::cmp::Ordering;

/// Porter-Duff style compositing operations.
///
/// The discriminant doubles as a four-bit mix table: bit 0 selects the
/// destination alpha into the source factor, bit 1 inverts it, bit 2 selects
/// the source alpha into the destination factor, bit 3 inverts that. All
/// twelve canvas operations fall out of those four bits.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u32)]
pub enum CompositeOperation {
    /// Source where the destination was opaque.
    SourceIn = 1,
    /// Source only, replacing the destination.
    SourceCopy = 2,
    /// Source where the destination was transparent.
    SourceOut = 3,
    /// Destination where the source is opaque.
    DestinationIn = 4,
    /// Destination where the source is opaque, over the source.
    DestinationAtop = 7,
    /// Sum of source and destination.
    Lighter = 10,
    /// Destination over the source.
    DestinationOver = 11,
    /// Destination where the source is transparent.
    DestinationOut = 12,
    /// Source where the destination was opaque, over the destination.
    SourceAtop = 13,
    /// Source over the destination.
    #[default]
    SourceOver = 14,
    /// Source and destination where the other is transparent.
    ExclusiveOr = 15,
}

impl CompositeOperation {
    #[inline]
    pub(crate) fn bits(self) -> u32 {
        self as u32
    }
}

/// Mix an incoming premultiplied color into a destination pixel under the
/// operation's bit table, attenuated by the clip visibility.
#[inline]
pub(crate) fn blend(operation: u32, fore: Rgba, back: Rgba, visibility: f32) -> Rgba {
    let mut mix_fore = if operation & 1 != 0 { back.a } else { 0.0 };
    if operation & 2 != 0 {
        mix_fore = 1.0 - mix_fore;
    }
    let mut mix_back = if operation & 4 != 0 { fore.a } else { 0.0 };
    if operation & 8 != 0 {
        mix_back = 1.0 - mix_back;
    }
    let mut blend = mix_fore * fore + mix_back * back;
    blend.a = blend.a.min(1.0);
    visibility * blend + (1.0 - visibility) * back
}

/// Composite a path's coverage runs onto the bitmap through the clip mask.
///
/// Operations whose bit 3 is clear do not preserve the unpainted
/// destination, so for those the zero-coverage spans inside the walk must be
/// visited as well (`source_copy` clears around the shape, for instance);
/// that is the `operation & 8` escape below.
#[expect(clippy::too_many_arguments, reason = "bundles the canvas's draw state")]
pub(crate) fn composite(
    bitmap: &mut [Rgba],
    size_x: u16,
    runs: &[PixelRun],
    mask: &[PixelRun],
    brush: &Brush,
    inverse: Affine,
    global_alpha: f32,
    operation: CompositeOperation,
) {
    let operation = operation.bits();
    let mut x = -1_i32;
    let mut y = -1_i32;
    let mut path_sum = 0.0_f32;
    let mut clip_sum = 0.0_f32;
    let mut path_index = 0;
    let mut clip_index = 0;
    while clip_index < mask.len() {
        let which = path_index < runs.len()
            && order(&runs[path_index], &mask[clip_index]) == Ordering::Less;
        let next = if which {
            runs[path_index]
        } else {
            mask[clip_index]
        };
        let coverage = path_sum.abs().min(1.0);
        let visibility = clip_sum.abs().min(1.0);
        let to = if i32::from(next.y) == y {
            i32::from(next.x)
        } else {
            x + 1
        };
        if (coverage >= ALPHA_THRESHOLD || operation & 8 == 0) && visibility >= ALPHA_THRESHOLD {
            while x < to {
                let index = y as usize * usize::from(size_x) + x as usize;
                let fore = (coverage * global_alpha)
                    * paint_pixel(
                        Point::new(x as f32 + 0.5, y as f32 + 0.5),
                        brush,
                        inverse,
                    );
                bitmap[index] = blend(operation, fore, bitmap[index], visibility);
                x += 1;
            }
        }
        x = i32::from(next.x);
        if i32::from(next.y) != y {
            y = next.y.into();
            path_sum = 0.0;
            clip_sum = 0.0;
        }
        if which {
            path_sum += runs[path_index].delta;
            path_index += 1;
        } else {
            clip_sum += mask[clip_index].delta;
            clip_index += 1;
        }
    }
}

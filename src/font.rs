// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal TrueType support: enough of the font file format to map
//! characters to glyphs, extract glyph outlines into the path pipeline, and
//! measure horizontal advances. No shaping, no kerning, no hinting.
//!
//! Parsing copies just the eight tables the renderer needs into one
//! contiguous buffer and records where each landed. All reads go through
//! bounds-checked accessors that yield zero out of range, so a damaged font
//! renders garbage geometry rather than panicking; thorough validation of
//! hostile fonts is out of scope.

use crate::flatten::add_bezier;
use crate::kurbo::Affine;
use crate::math::{lerp, map, Point};
use crate::path::Contours;
use std::sync::Arc;

/// Horizontal anchoring of a text string.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TextAlign {
    /// Anchor at the left edge of the text.
    #[default]
    Leftward,
    /// Anchor at the right edge of the text.
    Rightward,
    /// Anchor at the center of the text.
    Center,
}

impl TextAlign {
    /// Alias for [`TextAlign::Leftward`], matching the canvas `start` value.
    pub const START: Self = Self::Leftward;
    /// Alias for [`TextAlign::Rightward`], matching the canvas `end` value.
    pub const ENDING: Self = Self::Rightward;
}

/// Vertical anchoring of a text string.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TextBaseline {
    /// Anchor on the ordinary baseline the letters sit on.
    #[default]
    Alphabetic,
    /// Anchor at the typographic ascender.
    Top,
    /// Anchor midway between ascender and descender.
    Middle,
    /// Anchor at the typographic descender.
    Bottom,
    /// Anchor at the hanging baseline, approximated at 60% of an em.
    Hanging,
}

impl TextBaseline {
    /// Alias for [`TextBaseline::Bottom`].
    pub const IDEOGRAPHIC: Self = Self::Bottom;
}

/// Composite glyphs may nest; cap the recursion so a cyclic font cannot
/// overflow the stack.
const COMPOSITE_DEPTH_LIMIT: u32 = 10;

/// The required tables of a parsed font, packed into one buffer.
#[derive(Debug)]
pub(crate) struct FaceData {
    data: Vec<u8>,
    cmap: i32,
    glyf: i32,
    head: i32,
    hhea: i32,
    hmtx: i32,
    loca: i32,
    #[expect(dead_code, reason = "required table, kept for completeness")]
    maxp: i32,
    os_2: i32,
}

/// A face at a specific pixel size.
#[derive(Clone, Debug)]
pub(crate) struct Font {
    pub face: Arc<FaceData>,
    /// Pixels per font unit.
    pub scale: f32,
}

// Big-endian readers over the packed table buffer. Out-of-range reads
// return zero.

fn unsigned_8(data: &[u8], index: i32) -> i32 {
    usize::try_from(index)
        .ok()
        .and_then(|at| data.get(at))
        .map_or(0, |&byte| i32::from(byte))
}

fn signed_8(data: &[u8], index: i32) -> i32 {
    usize::try_from(index)
        .ok()
        .and_then(|at| data.get(at))
        .map_or(0, |&byte| i32::from(byte as i8))
}

fn unsigned_16(data: &[u8], index: i32) -> i32 {
    usize::try_from(index)
        .ok()
        .and_then(|at| data.get(at..at + 2))
        .map_or(0, |bytes| i32::from(bytes[0]) << 8 | i32::from(bytes[1]))
}

fn signed_16(data: &[u8], index: i32) -> i32 {
    i32::from(unsigned_16(data, index) as u16 as i16)
}

fn signed_32(data: &[u8], index: i32) -> i32 {
    usize::try_from(index)
        .ok()
        .and_then(|at| data.get(at..at + 4))
        .map_or(0, |bytes| {
            i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        })
}

impl FaceData {
    /// Parse a TrueType file, copying the eight required tables.
    ///
    /// Returns `None` for unsupported versions, truncated files, or fonts
    /// missing any required table.
    pub fn parse(font: &[u8]) -> Option<Self> {
        if font.len() < 6 {
            return None;
        }
        let version = i32::from_be_bytes([font[0], font[1], font[2], font[3]]);
        let tables = i32::from(font[4]) << 8 | i32::from(font[5]);
        // 0x00010000, or 'true' for old-style Apple fonts.
        if version != 0x0001_0000 && version != 0x7472_7565 {
            return None;
        }
        let directory = tables as usize * 16 + 12;
        if font.len() < directory {
            return None;
        }
        let mut face = Self {
            data: font[..directory].to_vec(),
            cmap: 0,
            glyf: 0,
            head: 0,
            hhea: 0,
            hmtx: 0,
            loca: 0,
            maxp: 0,
            os_2: 0,
        };
        for index in 0..tables {
            let tag = signed_32(&face.data, index * 16 + 12) as u32;
            let offset = signed_32(&face.data, index * 16 + 20);
            let span = signed_32(&face.data, index * 16 + 24);
            if offset < 0 || span < 0 || (font.len() as i64) < i64::from(offset) + i64::from(span)
            {
                return None;
            }
            let place = face.data.len() as i32;
            match tag {
                0x636d_6170 => face.cmap = place,
                0x676c_7966 => face.glyf = place,
                0x6865_6164 => face.head = place,
                0x6868_6561 => face.hhea = place,
                0x686d_7478 => face.hmtx = place,
                0x6c6f_6361 => face.loca = place,
                0x6d61_7870 => face.maxp = place,
                0x4f53_2f32 => face.os_2 = place,
                _ => continue,
            }
            face.data
                .extend_from_slice(&font[offset as usize..offset as usize + span as usize]);
        }
        if face.cmap == 0
            || face.glyf == 0
            || face.head == 0
            || face.hhea == 0
            || face.hmtx == 0
            || face.loca == 0
            || face.maxp == 0
            || face.os_2 == 0
        {
            return None;
        }
        Some(face)
    }

    /// Font units per em, for deriving the pixel scale.
    pub fn units_per_em(&self) -> i32 {
        unsigned_16(&self.data, self.head + 18)
    }
}

/// Map a character to its glyph index, folding low-ASCII whitespace to a
/// plain space first. Sub-tables are tried in order of fidelity: format 12
/// (full Unicode range), format 4 (basic plane), then format 0 as a last
/// resort. Unmapped characters get glyph 0, the "tofu" box.
pub(crate) fn char_to_glyph(face: &FaceData, character: char) -> i32 {
    let codepoint = match character {
        '\t' | '\x0b' | '\x0c' | '\r' | '\n' => ' ' as i32,
        _ => character as i32,
    };
    let data = &face.data;
    let tables = unsigned_16(data, face.cmap + 2);
    let mut format_12 = 0;
    let mut format_4 = 0;
    let mut format_0 = 0;
    for table in 0..tables {
        let platform = unsigned_16(data, face.cmap + table * 8 + 4);
        let encoding = unsigned_16(data, face.cmap + table * 8 + 6);
        let offset = signed_32(data, face.cmap + table * 8 + 8);
        let format = unsigned_16(data, face.cmap + offset);
        if platform == 3 && encoding == 10 && format == 12 {
            format_12 = face.cmap + offset;
        } else if platform == 3 && encoding == 1 && format == 4 {
            format_4 = face.cmap + offset;
        } else if format == 0 {
            format_0 = face.cmap + offset;
        }
    }
    if format_12 != 0 {
        let groups = signed_32(data, format_12 + 12);
        for group in 0..groups {
            let start = signed_32(data, format_12 + 16 + group * 12);
            let end = signed_32(data, format_12 + 20 + group * 12);
            let glyph = signed_32(data, format_12 + 24 + group * 12);
            if start <= codepoint && codepoint <= end {
                return codepoint - start + glyph;
            }
        }
    } else if format_4 != 0 {
        let segments = unsigned_16(data, format_4 + 6);
        let end_array = format_4 + 14;
        let start_array = end_array + 2 + segments;
        let delta_array = start_array + segments;
        let range_array = delta_array + segments;
        let mut segment = 0;
        while segment < segments {
            let start = unsigned_16(data, start_array + segment);
            let end = unsigned_16(data, end_array + segment);
            let delta = signed_16(data, delta_array + segment);
            let range = unsigned_16(data, range_array + segment);
            if start <= codepoint && codepoint <= end {
                return if range != 0 {
                    unsigned_16(
                        data,
                        range_array + segment + (codepoint - start) * 2 + range,
                    )
                } else {
                    (codepoint + delta) & 0xffff
                };
            }
            segment += 2;
        }
    } else if format_0 != 0 && (0..256).contains(&codepoint) {
        return unsigned_8(data, format_0 + 6 + codepoint);
    }
    0
}

/// Append one glyph's outline to the polylines, tessellating as it goes.
///
/// Quadratic B-spline contours collapse to cubics through the same 2/3-lerp
/// elevation the path builder uses, with implied on-curve midpoints between
/// consecutive off-curve points. Composite glyphs recurse with the child's
/// transform stacked on the parent's; components positioned by point
/// matching rather than offsets are skipped.
pub(crate) fn add_glyph(
    face: &FaceData,
    lines: &mut Contours,
    glyph: i32,
    forward: Affine,
    angular: f32,
    depth: u32,
) {
    let data = &face.data;
    let loc_format = unsigned_16(data, face.head + 50);
    let offset = face.glyf
        + if loc_format != 0 {
            signed_32(data, face.loca + glyph * 4)
        } else {
            unsigned_16(data, face.loca + glyph * 2) * 2
        };
    let next = face.glyf
        + if loc_format != 0 {
            signed_32(data, face.loca + glyph * 4 + 4)
        } else {
            unsigned_16(data, face.loca + glyph * 2 + 2) * 2
        };
    if offset == next {
        return;
    }
    let contours = signed_16(data, offset);
    if contours < 0 {
        if depth == 0 {
            return;
        }
        let mut offset = offset + 10;
        loop {
            let flags = unsigned_16(data, offset);
            let component = unsigned_16(data, offset + 2);
            if flags & 2 == 0 {
                // Anchor-point matching is not supported.
                return;
            }
            let e = f64::from(if flags & 1 != 0 {
                signed_16(data, offset + 4)
            } else {
                signed_8(data, offset + 4)
            });
            let f = f64::from(if flags & 1 != 0 {
                signed_16(data, offset + 6)
            } else {
                signed_8(data, offset + 5)
            });
            offset += if flags & 1 != 0 { 8 } else { 6 };
            let a = if flags & (8 | 64 | 128) != 0 {
                f64::from(signed_16(data, offset)) / 16384.0
            } else {
                1.0
            };
            let b = if flags & 128 != 0 {
                f64::from(signed_16(data, offset + 2)) / 16384.0
            } else {
                0.0
            };
            let c = if flags & 128 != 0 {
                f64::from(signed_16(data, offset + 4)) / 16384.0
            } else {
                0.0
            };
            let d = if flags & 8 != 0 {
                a
            } else if flags & 64 != 0 {
                f64::from(signed_16(data, offset + 2)) / 16384.0
            } else if flags & 128 != 0 {
                f64::from(signed_16(data, offset + 6)) / 16384.0
            } else {
                1.0
            };
            offset += if flags & 8 != 0 {
                2
            } else if flags & 64 != 0 {
                4
            } else if flags & 128 != 0 {
                8
            } else {
                0
            };
            let child = forward * Affine::new([a, b, c, d, e, f]);
            add_glyph(face, lines, component, child, angular, depth - 1);
            if flags & 32 == 0 {
                return;
            }
        }
    }
    let hmetrics = unsigned_16(data, face.hhea + 34);
    let left_side_bearing = if glyph < hmetrics {
        signed_16(data, face.hmtx + glyph * 4 + 2)
    } else {
        signed_16(data, face.hmtx + hmetrics * 2 + glyph * 2)
    };
    let x_min = signed_16(data, offset + 2);
    let points = unsigned_16(data, offset + 8 + contours * 2) + 1;
    let instructions = unsigned_16(data, offset + 10 + contours * 2);
    let flags_base = offset + 12 + contours * 2 + instructions;
    // Size the flag run-length table to find where the coordinate deltas
    // start.
    let mut flags_size = 0;
    let mut x_size = 0;
    let mut sized = 0;
    while sized < points {
        let flags = unsigned_8(data, flags_base + flags_size);
        flags_size += 1;
        let repeated = if flags & 8 != 0 {
            let count = unsigned_8(data, flags_base + flags_size);
            flags_size += 1;
            count + 1
        } else {
            1
        };
        x_size += repeated
            * if flags & 2 != 0 {
                1
            } else if flags & 16 != 0 {
                0
            } else {
                2
            };
        sized += repeated;
    }
    let mut flags_array = flags_base;
    let mut x_array = flags_base + flags_size;
    let mut y_array = x_array + x_size;
    let mut x = left_side_bearing - x_min;
    let mut y = 0;
    let mut flags = 0;
    let mut repeated = 0;
    let mut index = 0;
    for contour in 0..contours {
        let beginning = index;
        let ending = unsigned_16(data, offset + 10 + contour * 2);
        let mut begin_point = Point::ZERO;
        let mut begin_on = false;
        let mut end_point = Point::ZERO;
        let mut end_on = false;
        let first = lines.points.len();
        while index <= ending {
            if repeated != 0 {
                repeated -= 1;
            } else {
                flags = unsigned_8(data, flags_array);
                flags_array += 1;
                if flags & 8 != 0 {
                    repeated = unsigned_8(data, flags_array);
                    flags_array += 1;
                }
            }
            if flags & 2 != 0 {
                x += unsigned_8(data, x_array) * if flags & 16 != 0 { 1 } else { -1 };
            } else if flags & 16 == 0 {
                x += signed_16(data, x_array);
            }
            if flags & 4 != 0 {
                y += unsigned_8(data, y_array) * if flags & 32 != 0 { 1 } else { -1 };
            } else if flags & 32 == 0 {
                y += signed_16(data, y_array);
            }
            x_array += if flags & 2 != 0 {
                1
            } else if flags & 16 != 0 {
                0
            } else {
                2
            };
            y_array += if flags & 4 != 0 {
                1
            } else if flags & 32 != 0 {
                0
            } else {
                2
            };
            let point = map(forward, Point::new(x as f32, y as f32));
            let on_curve = flags & 1 != 0;
            if index == beginning {
                begin_point = point;
                begin_on = on_curve;
                if on_curve {
                    lines.points.push(point);
                }
            } else {
                let point_2 = if on_curve {
                    point
                } else {
                    lerp(end_point, point, 0.5)
                };
                if lines.points.len() == first || (end_on && on_curve) {
                    lines.points.push(point_2);
                } else if !end_on || on_curve {
                    let point_1 = lines.points[lines.points.len() - 1];
                    let control_1 = lerp(point_1, end_point, 2.0 / 3.0);
                    let control_2 = lerp(point_2, end_point, 2.0 / 3.0);
                    add_bezier(
                        &mut lines.points,
                        point_1,
                        control_1,
                        control_2,
                        point_2,
                        angular,
                    );
                }
            }
            end_point = point;
            end_on = on_curve;
            index += 1;
        }
        if lines.points.len() == first {
            continue;
        }
        // Close the contour, spending any pending off-curve control.
        if begin_on ^ end_on {
            let point_1 = lines.points[lines.points.len() - 1];
            let point_2 = lines.points[first];
            let control = if end_on { begin_point } else { end_point };
            let control_1 = lerp(point_1, control, 2.0 / 3.0);
            let control_2 = lerp(point_2, control, 2.0 / 3.0);
            add_bezier(&mut lines.points, point_1, control_1, control_2, point_2, angular);
        } else if !begin_on && !end_on {
            let point_1 = lines.points[lines.points.len() - 1];
            let split = lerp(begin_point, end_point, 0.5);
            let point_2 = lines.points[first];
            let left_1 = lerp(point_1, end_point, 2.0 / 3.0);
            let left_2 = lerp(split, end_point, 2.0 / 3.0);
            let right_1 = lerp(split, begin_point, 2.0 / 3.0);
            let right_2 = lerp(point_2, begin_point, 2.0 / 3.0);
            add_bezier(&mut lines.points, point_1, left_1, left_2, split, angular);
            add_bezier(&mut lines.points, split, right_1, right_2, point_2, angular);
        }
        let close = lines.points[first];
        lines.points.push(close);
        lines.end_subpath(first, true);
    }
}

/// The advance width of a string in pixels, whitespace folded, no kerning.
pub(crate) fn measure(font: &Font, text: &str) -> f32 {
    let face = &font.face;
    let hmetrics = unsigned_16(&face.data, face.hhea + 34);
    let mut width = 0;
    for character in text.chars() {
        let glyph = char_to_glyph(face, character);
        let entry = glyph.min(hmetrics - 1);
        width += unsigned_16(&face.data, face.hmtx + entry * 4);
    }
    width as f32 * font.scale
}

/// Lay a string out into the polylines.
///
/// Replaces the previous contents of `lines`. The position is adjusted for
/// the alignment and baseline settings, each glyph is placed by composing a
/// per-glyph font-unit-to-canvas transform onto the canvas transform, and a
/// finite `maximum_width` squeezes the text horizontally to fit. When no
/// maximum is given and the text is left-aligned the measurement pass is
/// skipped entirely.
#[expect(clippy::too_many_arguments, reason = "bundles the canvas's text state")]
pub(crate) fn text_to_lines(
    lines: &mut Contours,
    font: &Font,
    text: &str,
    position: Point,
    maximum_width: Option<f32>,
    align: TextAlign,
    baseline: TextBaseline,
    forward: Affine,
    angular: f32,
) {
    lines.clear();
    let unbounded = maximum_width.is_none();
    let maximum_width = maximum_width.unwrap_or(f32::MAX);
    if !(maximum_width > 0.0) || text.is_empty() {
        return;
    }
    let face = &font.face;
    let width = if unbounded && align == TextAlign::Leftward {
        0.0
    } else {
        measure(font, text)
    };
    let reduction = maximum_width / maximum_width.max(width);
    let mut position = position;
    match align {
        TextAlign::Rightward => position.x -= width * reduction,
        TextAlign::Center => position.x -= 0.5 * width * reduction,
        TextAlign::Leftward => {}
    }
    let scaling = Point::new(font.scale * reduction, font.scale);
    let units_per_em = unsigned_16(&face.data, face.head + 18) as f32;
    let ascender = signed_16(&face.data, face.os_2 + 68) as f32;
    let descender = signed_16(&face.data, face.os_2 + 70) as f32;
    let normalize = font.scale * units_per_em / (ascender - descender);
    match baseline {
        TextBaseline::Alphabetic => {}
        TextBaseline::Top => position.y += ascender * normalize,
        TextBaseline::Middle => position.y += (ascender + descender) * 0.5 * normalize,
        TextBaseline::Bottom => position.y += descender * normalize,
        TextBaseline::Hanging => position.y += 0.6 * font.scale * units_per_em,
    }
    let hmetrics = unsigned_16(&face.data, face.hhea + 34);
    let mut place = 0_i32;
    for character in text.chars() {
        let glyph = char_to_glyph(face, character);
        // Font units are y-up; the canvas is y-down, hence the negated
        // vertical scale.
        let placement = Affine::new([
            f64::from(scaling.x),
            0.0,
            0.0,
            -f64::from(scaling.y),
            f64::from(position.x + place as f32 * scaling.x),
            f64::from(position.y),
        ]);
        add_glyph(
            face,
            lines,
            glyph,
            forward * placement,
            angular,
            COMPOSITE_DEPTH_LIMIT,
        );
        let entry = glyph.min(hmetrics - 1);
        place += unsigned_16(&face.data, face.hmtx + entry * 4);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_default_to_zero_out_of_range() {
        let data = [0x12_u8, 0x34];
        assert_eq!(unsigned_16(&data, 0), 0x1234);
        assert_eq!(unsigned_16(&data, 1), 0);
        assert_eq!(unsigned_16(&data, -1), 0);
        assert_eq!(signed_8(&data, 5), 0);
        assert_eq!(signed_32(&data, 0), 0);
    }

    #[test]
    fn signed_readers_sign_extend() {
        let data = [0xff_u8, 0x38];
        assert_eq!(signed_16(&data, 0), -200);
        assert_eq!(signed_8(&data, 0), -1);
        assert_eq!(unsigned_16(&data, 0), 0xff38);
    }

    #[test]
    fn rejects_wrong_version() {
        let mut font = vec![0_u8; 64];
        font[0] = 0x4f;
        assert!(FaceData::parse(&font).is_none());
    }

    #[test]
    fn rejects_truncated_directory() {
        // Valid version, claims 8 tables, but the file ends early.
        let font = [0x00, 0x01, 0x00, 0x00, 0x00, 0x08];
        assert!(FaceData::parse(&font).is_none());
    }

    #[test]
    fn rejects_table_past_the_end() {
        let mut font = vec![0_u8; 28];
        font[..4].copy_from_slice(&[0x00, 0x01, 0x00, 0x00]);
        font[5] = 1;
        font[12..16].copy_from_slice(b"cmap");
        // Offset 28, length 4: one byte past the end.
        font[22..24].copy_from_slice(&[0, 28]);
        font[26..28].copy_from_slice(&[0, 4]);
        assert!(FaceData::parse(&font).is_none());
    }

    #[test]
    fn rejects_missing_tables() {
        // A well-formed directory containing only cmap.
        let mut font = vec![0_u8; 32];
        font[..4].copy_from_slice(&[0x00, 0x01, 0x00, 0x00]);
        font[5] = 1;
        font[12..16].copy_from_slice(b"cmap");
        font[22..24].copy_from_slice(&[0, 28]);
        font[26..28].copy_from_slice(&[0, 4]);
        assert!(FaceData::parse(&font).is_none());
    }
}

// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color representation and sRGB conversion.
//!
//! Every color inside the pipeline is stored premultiplied in *linear*
//! light-intensity space; the sRGB transfer curve is applied only at the
//! pixel-buffer boundary (image ingestion, `get_image_data`,
//! `put_image_data`). Blending premultiplied linear values is what makes
//! antialiased edges and translucency composite without the darkened fringes
//! that sRGB-space math produces.

use bytemuck::{Pod, Zeroable};
use peniko::color::{AlphaColor, Srgb};

/// Alpha values below this round to zero in 8-bit premultiplied output, so
/// unpremultiplication treats them as fully transparent.
pub(crate) const ALPHA_THRESHOLD: f32 = 1.0 / 8160.0;

/// A premultiplied RGBA color with linear components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    /// Red, multiplied by alpha.
    pub r: f32,
    /// Green, multiplied by alpha.
    pub g: f32,
    /// Blue, multiplied by alpha.
    pub b: f32,
    /// Alpha coverage in `[0, 1]`.
    pub a: f32,
}

impl Rgba {
    /// Transparent black, the identity of `source_over` compositing.
    pub const TRANSPARENT: Self = Self::new(0., 0., 0., 0.);

    /// Create a new color from raw components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Ingest an sRGB color into the pipeline's premultiplied linear form.
    pub fn from_srgb(color: AlphaColor<Srgb>) -> Self {
        let [r, g, b, a] = color.components;
        premultiplied(linearized(clamped(Self::new(r, g, b, a))))
    }
}

impl core::ops::Add for Rgba {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.r + rhs.r,
            self.g + rhs.g,
            self.b + rhs.b,
            self.a + rhs.a,
        )
    }
}

impl core::ops::Sub for Rgba {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.r - rhs.r,
            self.g - rhs.g,
            self.b - rhs.b,
            self.a - rhs.a,
        )
    }
}

impl core::ops::Mul<Rgba> for f32 {
    type Output = Rgba;

    fn mul(self, rhs: Rgba) -> Rgba {
        Rgba::new(self * rhs.r, self * rhs.g, self * rhs.b, self * rhs.a)
    }
}

/// The sRGB electro-optical transfer function for one channel.
#[inline]
pub fn linearize(value: f32) -> f32 {
    if value < 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// The inverse of [`linearize`].
#[inline]
pub fn delinearize(value: f32) -> f32 {
    if value < 0.0031308 {
        12.92 * value
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Apply [`linearize`] to the color channels, leaving alpha alone.
#[inline]
pub fn linearized(that: Rgba) -> Rgba {
    Rgba::new(
        linearize(that.r),
        linearize(that.g),
        linearize(that.b),
        that.a,
    )
}

/// Apply [`delinearize`] to the color channels, leaving alpha alone.
#[inline]
pub fn delinearized(that: Rgba) -> Rgba {
    Rgba::new(
        delinearize(that.r),
        delinearize(that.g),
        delinearize(that.b),
        that.a,
    )
}

/// Multiply the color channels by alpha.
#[inline]
pub fn premultiplied(that: Rgba) -> Rgba {
    Rgba::new(that.r * that.a, that.g * that.a, that.b * that.a, that.a)
}

/// Divide the color channels by alpha, mapping nearly transparent colors to
/// transparent black.
#[inline]
pub fn unpremultiplied(that: Rgba) -> Rgba {
    if that.a < ALPHA_THRESHOLD {
        Rgba::TRANSPARENT
    } else {
        let scale = 1.0 / that.a;
        Rgba::new(scale * that.r, scale * that.g, scale * that.b, that.a)
    }
}

/// Clamp every component to `[0, 1]`.
#[inline]
pub fn clamped(that: Rgba) -> Rgba {
    Rgba::new(
        that.r.clamp(0.0, 1.0),
        that.g.clamp(0.0, 1.0),
        that.b.clamp(0.0, 1.0),
        that.a.clamp(0.0, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_curve_round_trips() {
        for step in 0..=100 {
            let value = step as f32 / 100.0;
            let there_and_back = delinearize(linearize(value));
            assert!(
                (there_and_back - value).abs() < 1.0e-5,
                "{value} round-tripped to {there_and_back}"
            );
        }
    }

    #[test]
    fn transfer_curve_is_continuous_at_the_break() {
        let below = linearize(0.04045 - 1.0e-6);
        let above = linearize(0.04045 + 1.0e-6);
        assert!((above - below).abs() < 1.0e-5);
    }

    #[test]
    fn premultiply_round_trips_above_threshold() {
        let color = Rgba::new(0.25, 0.5, 0.75, 0.5);
        let back = unpremultiplied(premultiplied(color));
        assert!((back.r - color.r).abs() < 1.0e-6);
        assert!((back.g - color.g).abs() < 1.0e-6);
        assert!((back.b - color.b).abs() < 1.0e-6);
        assert_eq!(back.a, color.a);
    }

    #[test]
    fn nearly_transparent_unpremultiplies_to_transparent_black() {
        let color = Rgba::new(0.5, 0.5, 0.5, ALPHA_THRESHOLD / 2.0);
        assert_eq!(unpremultiplied(premultiplied(color)), Rgba::TRANSPARENT);
    }

    #[test]
    fn srgb_ingestion_clamps_and_premultiplies() {
        let color = Rgba::from_srgb(AlphaColor::new([2.0, -1.0, 1.0, 0.5]));
        assert_eq!(color.r, 0.5);
        assert_eq!(color.g, 0.0);
        assert_eq!(color.b, 0.5);
        assert_eq!(color.a, 0.5);
    }
}

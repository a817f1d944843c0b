// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tela is a CPU rasterizer for 2D vector graphics with an API modeled on
//! the HTML canvas element.
//!
//! It renders paths, strokes (with dashes, joins, and caps), gradients,
//! patterns, images, shadows, clipping, and TrueType text into an owned
//! RGBA bitmap, with trapezoidal-coverage antialiasing and all blending
//! done in premultiplied linear color. Everything runs synchronously on the
//! calling thread; there is no GPU involvement and no shared state between
//! canvases.
//!
//! # Usage
//!
//! Build a path, set a brush, draw:
//!
//! ```rust
//! use tela::{Canvas, Rgba, Style};
//! use tela::peniko::color::palette::css;
//!
//! let mut canvas = Canvas::new(4, 4);
//! canvas.set_color(Style::Fill, css::RED);
//! canvas.fill_rectangle(1.0, 1.0, 2.0, 2.0);
//!
//! let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
//! for y in 0..4_usize {
//!     for x in 0..4_usize {
//!         let pixel = canvas.data()[y * 4 + x];
//!         let inside = (1..3).contains(&x) && (1..3).contains(&y);
//!         assert_eq!(pixel, if inside { red } else { Rgba::TRANSPARENT });
//!     }
//! }
//! ```
//!
//! Pixels leave (and enter) the canvas as unpremultiplied sRGB RGBA8
//! through [`Canvas::get_image_data`] and [`Canvas::put_image_data`]; the
//! premultiplied linear working buffer is also available directly through
//! [`Canvas::data`].
//!
//! # Features
//!
//! - `png` (enabled by default): decode [`ImageData`] from PNG bytes.

#![warn(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod clip;
mod color;
mod dash;
mod fine;
mod flatten;
mod font;
mod math;
mod paint;
mod path;
mod pixmap;
mod render;
mod run;
mod shadow;
mod stroke;

pub use peniko;
pub use peniko::color::{AlphaColor, Srgb};
pub use peniko::kurbo;

pub use crate::color::{delinearize, linearize, Rgba};
pub use fine::CompositeOperation;
pub use font::{TextAlign, TextBaseline};
pub use paint::{Repetition, Style};
pub use peniko::kurbo::{Cap, Join};
pub use pixmap::ImageData;
pub use render::Canvas;

// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clipping through the public API.

use tela::peniko::color::palette::css;
use tela::{Canvas, Rgba, Style};

fn pixel(canvas: &Canvas, x: u16, y: u16) -> Rgba {
    canvas.data()[usize::from(y) * usize::from(canvas.width()) + usize::from(x)]
}

const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);

#[test]
fn clip_limits_filling_to_the_region() {
    let mut canvas = Canvas::new(10, 10);
    canvas.set_color(Style::Fill, css::RED);
    canvas.begin_path();
    canvas.rectangle(0.0, 0.0, 5.0, 5.0);
    canvas.clip();
    canvas.fill_rectangle(0.0, 0.0, 10.0, 10.0);
    for y in 0..10 {
        for x in 0..10 {
            let inside = x < 5 && y < 5;
            let expected = if inside { RED } else { Rgba::TRANSPARENT };
            assert_eq!(pixel(&canvas, x, y), expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn successive_clips_intersect() {
    let mut canvas = Canvas::new(10, 10);
    canvas.set_color(Style::Fill, css::RED);
    canvas.begin_path();
    canvas.rectangle(0.0, 0.0, 6.0, 10.0);
    canvas.clip();
    canvas.begin_path();
    canvas.rectangle(3.0, 0.0, 7.0, 10.0);
    canvas.clip();
    canvas.fill_rectangle(0.0, 0.0, 10.0, 10.0);
    assert_eq!(pixel(&canvas, 4, 5), RED);
    assert_eq!(pixel(&canvas, 1, 5), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 8, 5), Rgba::TRANSPARENT);
}

#[test]
fn clip_affects_shadows_too() {
    let mut canvas = Canvas::new(16, 16);
    canvas.set_color(Style::Fill, css::RED);
    canvas.set_shadow_color(css::BLACK);
    canvas.set_shadow_offset_x(6.0);
    canvas.begin_path();
    canvas.rectangle(0.0, 0.0, 8.0, 16.0);
    canvas.clip();
    canvas.fill_rectangle(2.0, 2.0, 4.0, 4.0);
    // The shadow's own pixels at x >= 8 are clipped away.
    assert_eq!(pixel(&canvas, 9, 4), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 3, 3), RED);
}

#[test]
fn restore_reopens_the_clip() {
    let mut canvas = Canvas::new(10, 10);
    canvas.set_color(Style::Fill, css::RED);
    canvas.save();
    canvas.begin_path();
    canvas.rectangle(0.0, 0.0, 3.0, 3.0);
    canvas.clip();
    canvas.restore();
    canvas.fill_rectangle(0.0, 0.0, 10.0, 10.0);
    assert_eq!(pixel(&canvas, 8, 8), RED);
}

#[test]
fn fractional_clip_edges_scale_coverage() {
    let mut canvas = Canvas::new(4, 4);
    canvas.set_color(Style::Fill, css::RED);
    canvas.begin_path();
    canvas.rectangle(0.0, 0.0, 1.5, 4.0);
    canvas.clip();
    canvas.fill_rectangle(0.0, 0.0, 4.0, 4.0);
    assert_eq!(pixel(&canvas, 0, 1), RED);
    let partial = pixel(&canvas, 1, 1);
    assert!((partial.a - 0.5).abs() < 1.0e-5, "got {partial:?}");
    assert_eq!(pixel(&canvas, 2, 1), Rgba::TRANSPARENT);
}

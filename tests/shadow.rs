// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow rendering.

use tela::peniko::color::palette::css;
use tela::{Canvas, Rgba, Style};

fn pixel(canvas: &Canvas, x: u16, y: u16) -> Rgba {
    canvas.data()[usize::from(y) * usize::from(canvas.width()) + usize::from(x)]
}

const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);

#[test]
fn shadows_do_not_draw_without_blur_or_offset() {
    let mut canvas = Canvas::new(8, 8);
    canvas.set_color(Style::Fill, css::RED);
    canvas.set_shadow_color(css::BLACK);
    canvas.fill_rectangle(2.0, 2.0, 2.0, 2.0);
    assert_eq!(pixel(&canvas, 5, 3), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 2, 2), RED);
}

#[test]
fn offset_shadow_lands_beside_the_shape() {
    let mut canvas = Canvas::new(16, 16);
    canvas.set_color(Style::Fill, css::RED);
    canvas.set_shadow_color(css::BLACK);
    canvas.set_shadow_offset_x(4.0);
    canvas.set_shadow_offset_y(0.0);
    canvas.fill_rectangle(2.0, 2.0, 4.0, 4.0);
    // Shape pixels draw over their own shadow.
    assert_eq!(pixel(&canvas, 3, 3), RED);
    // Pixels covered only by the offset copy carry the shadow color.
    let shadow = pixel(&canvas, 8, 3);
    assert!(
        shadow.a > 0.99 && shadow.r < 1.0e-4,
        "expected a black shadow pixel, got {shadow:?}"
    );
    assert_eq!(pixel(&canvas, 12, 3), Rgba::TRANSPARENT);
}

#[test]
fn shadow_alpha_follows_the_brush_alpha() {
    let mut canvas = Canvas::new(16, 16);
    canvas.set_color(Style::Fill, css::RED.with_alpha(0.5));
    canvas.set_shadow_color(css::BLACK);
    canvas.set_shadow_offset_x(6.0);
    canvas.fill_rectangle(2.0, 2.0, 4.0, 4.0);
    let shadow = pixel(&canvas, 10, 3);
    assert!(
        (shadow.a - 0.5).abs() < 1.0e-3,
        "half-opaque shapes cast half shadows, got {shadow:?}"
    );
}

#[test]
fn blurred_shadow_spreads_and_softens() {
    let mut sharp = Canvas::new(24, 24);
    sharp.set_color(Style::Fill, css::RED);
    sharp.set_shadow_color(css::BLACK);
    sharp.set_shadow_offset_x(8.0);
    sharp.fill_rectangle(4.0, 8.0, 4.0, 4.0);

    let mut blurred = Canvas::new(24, 24);
    blurred.set_color(Style::Fill, css::RED);
    blurred.set_shadow_color(css::BLACK);
    blurred.set_shadow_offset_x(8.0);
    blurred.set_shadow_blur(3.0);
    blurred.fill_rectangle(4.0, 8.0, 4.0, 4.0);

    // The sharp shadow's center pixel is fully dark; blurring moves some of
    // that mass outward, past the sharp silhouette.
    let center_sharp = pixel(&sharp, 14, 10).a;
    let center_blurred = pixel(&blurred, 14, 10).a;
    assert!(center_sharp > 0.99);
    assert!(center_blurred < center_sharp);
    assert!(center_blurred > 0.2);
    let outside_sharp = pixel(&sharp, 18, 10).a;
    let outside_blurred = pixel(&blurred, 18, 10).a;
    assert_eq!(outside_sharp, 0.0);
    assert!(outside_blurred > 0.01);
    // Fading monotonically away from the shadow.
    assert!(outside_blurred < center_blurred);
}

#[test]
fn shadow_color_alpha_scales_the_shadow() {
    let mut canvas = Canvas::new(16, 16);
    canvas.set_color(Style::Fill, css::RED);
    canvas.set_shadow_color(css::BLACK.with_alpha(0.5));
    canvas.set_shadow_offset_x(6.0);
    canvas.fill_rectangle(2.0, 2.0, 4.0, 4.0);
    let shadow = pixel(&canvas, 10, 3);
    assert!((shadow.a - 0.5).abs() < 1.0e-3, "got {shadow:?}");
}

#[test]
fn negative_blur_is_rejected() {
    let mut canvas = Canvas::new(8, 8);
    canvas.set_shadow_blur(2.0);
    canvas.set_shadow_blur(-1.0);
    canvas.set_shadow_color(css::BLACK);
    canvas.set_color(Style::Fill, css::RED);
    canvas.fill_rectangle(2.0, 2.0, 2.0, 2.0);
    // Blur 2 still in effect: the shadow skirt reaches past the shape.
    assert!(pixel(&canvas, 5, 3).a > 0.01);
}

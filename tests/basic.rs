// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fills, paths, and the ground rules of the pixel pipeline.

use tela::peniko::color::palette::css;
use tela::{Canvas, Rgba, Style};

fn pixel(canvas: &Canvas, x: u16, y: u16) -> Rgba {
    canvas.data()[usize::from(y) * usize::from(canvas.width()) + usize::from(x)]
}

fn assert_close(actual: Rgba, expected: Rgba, tolerance: f32) {
    for (have, want) in [
        (actual.r, expected.r),
        (actual.g, expected.g),
        (actual.b, expected.b),
        (actual.a, expected.a),
    ] {
        assert!(
            (have - want).abs() <= tolerance,
            "expected {expected:?}, got {actual:?}"
        );
    }
}

const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0, 1.0);

#[test]
fn filled_rectangle_covers_exactly_its_interior() {
    let mut canvas = Canvas::new(4, 4);
    canvas.set_color(Style::Fill, css::RED);
    canvas.fill_rectangle(1.0, 1.0, 2.0, 2.0);
    for y in 0..4 {
        for x in 0..4 {
            let inside = (1..3).contains(&x) && (1..3).contains(&y);
            let expected = if inside { RED } else { Rgba::TRANSPARENT };
            assert_eq!(pixel(&canvas, x, y), expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn filled_triangle_covers_its_interior() {
    let mut canvas = Canvas::new(10, 10);
    canvas.set_color(Style::Fill, css::LIME);
    canvas.begin_path();
    canvas.move_to((5.0, 1.0));
    canvas.line_to((9.0, 9.0));
    canvas.line_to((1.0, 9.0));
    canvas.close_path();
    canvas.fill();
    assert_close(pixel(&canvas, 5, 5), GREEN, 1.0e-4);
    assert_eq!(pixel(&canvas, 0, 0), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 9, 0), Rgba::TRANSPARENT);
}

#[test]
fn fill_uses_the_nonzero_winding_rule() {
    // Two nested same-direction squares both fill; coverage clamps at 1.
    let mut canvas = Canvas::new(10, 10);
    canvas.set_color(Style::Fill, css::RED);
    canvas.begin_path();
    canvas.rectangle(1.0, 1.0, 8.0, 8.0);
    canvas.rectangle(3.0, 3.0, 4.0, 4.0);
    canvas.fill();
    assert_eq!(pixel(&canvas, 5, 5), RED);
    assert_eq!(pixel(&canvas, 2, 2), RED);
}

#[test]
fn zero_extent_fill_rectangle_is_a_no_op() {
    let mut canvas = Canvas::new(4, 4);
    canvas.set_color(Style::Fill, css::RED);
    canvas.fill_rectangle(1.0, 1.0, 0.0, 3.0);
    canvas.fill_rectangle(1.0, 1.0, 3.0, 0.0);
    assert!(canvas.data().iter().all(|&p| p == Rgba::TRANSPARENT));
}

#[test]
fn non_invertible_transform_disables_drawing() {
    let mut canvas = Canvas::new(4, 4);
    canvas.set_color(Style::Fill, css::RED);
    canvas.set_transform(1.0, 0.0, 2.0, 0.0, 0.0, 0.0);
    canvas.fill_rectangle(0.0, 0.0, 4.0, 4.0);
    canvas.begin_path();
    canvas.rectangle(0.0, 0.0, 4.0, 4.0);
    canvas.fill();
    assert!(canvas.data().iter().all(|&p| p == Rgba::TRANSPARENT));
}

#[test]
fn transforms_move_the_geometry() {
    let mut canvas = Canvas::new(8, 8);
    canvas.set_color(Style::Fill, css::RED);
    canvas.translate(4.0, 4.0);
    canvas.fill_rectangle(0.0, 0.0, 2.0, 2.0);
    assert_eq!(pixel(&canvas, 5, 5), RED);
    assert_eq!(pixel(&canvas, 1, 1), Rgba::TRANSPARENT);
}

#[test]
fn scaling_scales_the_geometry() {
    let mut canvas = Canvas::new(8, 8);
    canvas.set_color(Style::Fill, css::RED);
    canvas.scale(2.0, 2.0);
    canvas.fill_rectangle(1.0, 1.0, 2.0, 2.0);
    for (x, y, inside) in [(3, 3, true), (5, 5, true), (1, 1, false), (6, 6, false)] {
        let expected = if inside { RED } else { Rgba::TRANSPARENT };
        assert_eq!(pixel(&canvas, x, y), expected, "pixel ({x}, {y})");
    }
}

#[test]
fn rotation_is_clockwise() {
    let mut canvas = Canvas::new(8, 8);
    canvas.set_color(Style::Fill, css::RED);
    canvas.rotate(std::f64::consts::FRAC_PI_2);
    // Under a quarter-turn clockwise rotation, +x maps to +y.
    canvas.fill_rectangle(2.0, -4.0, 2.0, 2.0);
    assert_eq!(pixel(&canvas, 2, 2), RED);
}

#[test]
fn full_turn_arc_matches_exactly_one_circle() {
    let mut reference = Canvas::new(12, 12);
    reference.set_color(Style::Fill, css::RED);
    reference.begin_path();
    reference.arc((6.0, 6.0), 4.0, 0.0, std::f64::consts::TAU, false);
    reference.fill();

    let mut excessive = Canvas::new(12, 12);
    excessive.set_color(Style::Fill, css::RED);
    excessive.begin_path();
    excessive.arc((6.0, 6.0), 4.0, 0.0, 4.0 * std::f64::consts::TAU, false);
    excessive.fill();

    assert_eq!(reference.data(), excessive.data());
}

#[test]
fn arc_fills_a_disc() {
    let mut canvas = Canvas::new(12, 12);
    canvas.set_color(Style::Fill, css::RED);
    canvas.begin_path();
    canvas.arc((6.0, 6.0), 4.0, 0.0, std::f64::consts::TAU, false);
    canvas.fill();
    assert_close(pixel(&canvas, 6, 6), RED, 1.0e-4);
    assert_close(pixel(&canvas, 6, 3), RED, 1.0e-4);
    assert_eq!(pixel(&canvas, 1, 1), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 11, 11), Rgba::TRANSPARENT);
}

#[test]
fn quadratic_curves_fill_like_their_elevated_cubics() {
    let mut quadratic = Canvas::new(12, 12);
    quadratic.set_color(Style::Fill, css::RED);
    quadratic.begin_path();
    quadratic.move_to((1.0, 10.0));
    quadratic.quadratic_curve_to((6.0, -8.0), (11.0, 10.0));
    quadratic.close_path();
    quadratic.fill();

    let mut cubic = Canvas::new(12, 12);
    cubic.set_color(Style::Fill, css::RED);
    cubic.begin_path();
    cubic.move_to((1.0, 10.0));
    // The exact degree elevation of the quadratic above.
    cubic.bezier_curve_to(
        (1.0 + 2.0 / 3.0 * 5.0, 10.0 - 2.0 / 3.0 * 18.0),
        (11.0 - 2.0 / 3.0 * 5.0, 10.0 - 2.0 / 3.0 * 18.0),
        (11.0, 10.0),
    );
    cubic.close_path();
    cubic.fill();

    // The two constructions round differently in the last float bit, so
    // compare coverage rather than bits.
    for (have, want) in quadratic.data().iter().zip(cubic.data()) {
        assert_close(*have, *want, 1.0e-3);
    }
}

#[test]
fn is_point_in_path_agrees_with_coverage() {
    let mut canvas = Canvas::new(10, 10);
    canvas.begin_path();
    canvas.rectangle(2.0, 2.0, 6.0, 6.0);
    assert!(canvas.is_point_in_path(5.0, 5.0));
    assert!(canvas.is_point_in_path(2.0, 2.0));
    assert!(!canvas.is_point_in_path(1.0, 5.0));
    assert!(!canvas.is_point_in_path(9.0, 9.0));

    canvas.set_color(Style::Fill, css::RED);
    canvas.fill();
    assert_eq!(pixel(&canvas, 5, 5), RED);
    assert_eq!(pixel(&canvas, 1, 5), Rgba::TRANSPARENT);
}

#[test]
fn clear_rectangle_erases_to_transparent() {
    let mut canvas = Canvas::new(6, 6);
    canvas.set_color(Style::Fill, css::RED);
    canvas.fill_rectangle(0.0, 0.0, 6.0, 6.0);
    canvas.set_global_alpha(0.25);
    canvas.clear_rectangle(1.0, 1.0, 2.0, 2.0);
    // The erase ignores global alpha entirely.
    assert_eq!(pixel(&canvas, 1, 1), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 2, 2), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 4, 4), RED);
}

#[test]
fn degenerate_stroke_rectangle_draws_a_line() {
    let mut canvas = Canvas::new(8, 8);
    canvas.set_color(Style::Stroke, css::RED);
    canvas.set_line_width(2.0);
    canvas.stroke_rectangle(2.0, 4.0, 4.0, 0.0);
    assert_eq!(pixel(&canvas, 3, 3), RED);
    assert_eq!(pixel(&canvas, 3, 4), RED);
    assert_eq!(pixel(&canvas, 3, 1), Rgba::TRANSPARENT);

    let mut empty = Canvas::new(8, 8);
    empty.set_color(Style::Stroke, css::RED);
    empty.stroke_rectangle(2.0, 4.0, 0.0, 0.0);
    assert!(empty.data().iter().all(|&p| p == Rgba::TRANSPARENT));
}

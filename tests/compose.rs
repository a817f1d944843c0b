// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite operations over the full pipeline.

use tela::peniko::color::palette::css;
use tela::{Canvas, CompositeOperation, Rgba, Style};

fn pixel(canvas: &Canvas, x: u16, y: u16) -> Rgba {
    canvas.data()[usize::from(y) * usize::from(canvas.width()) + usize::from(x)]
}

const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 1.0);

/// A 2x1 canvas whose left pixel is opaque red and right pixel untouched,
/// then fully covered by a blue fill under the given operation.
fn composed(operation: CompositeOperation) -> Canvas {
    let mut canvas = Canvas::new(2, 1);
    canvas.set_color(Style::Fill, css::RED);
    canvas.fill_rectangle(0.0, 0.0, 1.0, 1.0);
    canvas.set_composite_operation(operation);
    canvas.set_color(Style::Fill, css::BLUE);
    canvas.fill_rectangle(0.0, 0.0, 2.0, 1.0);
    canvas
}

#[test]
fn source_over_covers_both() {
    let canvas = composed(CompositeOperation::SourceOver);
    assert_eq!(pixel(&canvas, 0, 0), BLUE);
    assert_eq!(pixel(&canvas, 1, 0), BLUE);
}

#[test]
fn source_in_keeps_source_only_where_destination_was() {
    let canvas = composed(CompositeOperation::SourceIn);
    assert_eq!(pixel(&canvas, 0, 0), BLUE);
    assert_eq!(pixel(&canvas, 1, 0), Rgba::TRANSPARENT);
}

#[test]
fn source_out_keeps_source_only_where_destination_was_not() {
    let canvas = composed(CompositeOperation::SourceOut);
    assert_eq!(pixel(&canvas, 0, 0), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 1, 0), BLUE);
}

#[test]
fn source_atop_confines_source_to_the_destination() {
    let canvas = composed(CompositeOperation::SourceAtop);
    assert_eq!(pixel(&canvas, 0, 0), BLUE);
    assert_eq!(pixel(&canvas, 1, 0), Rgba::TRANSPARENT);
}

#[test]
fn destination_over_keeps_existing_pixels_on_top() {
    let canvas = composed(CompositeOperation::DestinationOver);
    assert_eq!(pixel(&canvas, 0, 0), RED);
    assert_eq!(pixel(&canvas, 1, 0), BLUE);
}

#[test]
fn destination_in_keeps_destination_where_source_is() {
    let canvas = composed(CompositeOperation::DestinationIn);
    assert_eq!(pixel(&canvas, 0, 0), RED);
    assert_eq!(pixel(&canvas, 1, 0), Rgba::TRANSPARENT);
}

#[test]
fn destination_out_erases_under_the_source() {
    let canvas = composed(CompositeOperation::DestinationOut);
    assert_eq!(pixel(&canvas, 0, 0), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 1, 0), Rgba::TRANSPARENT);
}

#[test]
fn destination_atop_keeps_destination_over_the_source() {
    let canvas = composed(CompositeOperation::DestinationAtop);
    assert_eq!(pixel(&canvas, 0, 0), RED);
    assert_eq!(pixel(&canvas, 1, 0), BLUE);
}

#[test]
fn source_copy_replaces_everything() {
    let canvas = composed(CompositeOperation::SourceCopy);
    assert_eq!(pixel(&canvas, 0, 0), BLUE);
    assert_eq!(pixel(&canvas, 1, 0), BLUE);
}

#[test]
fn lighter_adds_channels() {
    let canvas = composed(CompositeOperation::Lighter);
    assert_eq!(pixel(&canvas, 0, 0), Rgba::new(1.0, 0.0, 1.0, 1.0));
    assert_eq!(pixel(&canvas, 1, 0), BLUE);
}

#[test]
fn exclusive_or_cancels_the_overlap() {
    let canvas = composed(CompositeOperation::ExclusiveOr);
    assert_eq!(pixel(&canvas, 0, 0), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 1, 0), BLUE);
}

#[test]
fn source_copy_clears_beyond_the_shape_on_covered_rows() {
    // Operations that do not preserve the destination visit the
    // zero-coverage spans of every masked row, so a partial-width copy
    // clears the rest of its rows too.
    let mut canvas = Canvas::new(4, 2);
    canvas.set_color(Style::Fill, css::RED);
    canvas.fill_rectangle(0.0, 0.0, 4.0, 2.0);
    canvas.set_composite_operation(CompositeOperation::SourceCopy);
    canvas.set_color(Style::Fill, css::BLUE);
    canvas.fill_rectangle(0.0, 0.0, 1.0, 1.0);
    assert_eq!(pixel(&canvas, 0, 0), BLUE);
    assert_eq!(pixel(&canvas, 3, 0), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 3, 1), Rgba::TRANSPARENT);
}

#[test]
fn semitransparent_source_over_blends_linearly() {
    let mut canvas = Canvas::new(1, 1);
    canvas.set_color(Style::Fill, css::RED);
    canvas.fill_rectangle(0.0, 0.0, 1.0, 1.0);
    canvas.set_color(Style::Fill, css::BLUE.with_alpha(0.5));
    canvas.fill_rectangle(0.0, 0.0, 1.0, 1.0);
    let blended = pixel(&canvas, 0, 0);
    assert!((blended.r - 0.5).abs() < 1.0e-6);
    assert!((blended.b - 0.5).abs() < 1.0e-6);
    assert_eq!(blended.a, 1.0);
}

//! Plotter units to canvas units.

use std::f64::consts::{FRAC_PI_2, PI};

use super::state::PlotterState;
use crate::canvas::{Canvas, FontMatrix};
use crate::hpgl::types::{Coord, ScalingMode};

/// Inset on every side, as a fraction of the rotated canvas dimension
pub const MARGIN: f64 = 0.015;

/// Em-box to stroke-font cell ratios of the monospace font
const FONT_WIDTH_FACTOR: f64 = 2.4;
const FONT_HEIGHT_FACTOR: f64 = 2.0;

fn ratio(n: f64, d: f64) -> f64 {
    if d == 0.0 { 0.0 } else { n / d }
}

/// User units of `p` expressed in plotter units relative to the plotter P1
fn plotter_units(p: Coord, state: &PlotterState, scale_only: bool) -> (f64, f64) {
    let (px, py) = (f64::from(p.x), f64::from(p.y));
    let (in1x, in1y) = (f64::from(state.input_p1.x), f64::from(state.input_p1.y));
    let (in_w, in_h) = (
        f64::from(state.input_p2.x) - in1x,
        f64::from(state.input_p2.y) - in1y,
    );
    let (s1x, s1y) = (f64::from(state.scaled_p1.x), f64::from(state.scaled_p1.y));
    let (s_w, s_h) = (
        f64::from(state.scaled_p2.x) - s1x,
        f64::from(state.scaled_p2.y) - s1y,
    );
    let (origin_x, origin_y) = (
        f64::from(state.plotter_p1.x),
        f64::from(state.plotter_p1.y),
    );

    let (x, y) = match state.scaling {
        ScalingMode::None if scale_only => return (px, py),
        ScalingMode::None => (px, py),
        ScalingMode::Anisotropic => {
            if scale_only {
                return (ratio(px, s_w) * in_w, ratio(py, s_h) * in_h);
            }
            (
                ratio(px - s1x, s_w) * in_w + in1x,
                ratio(py - s1y, s_h) * in_h + in1y,
            )
        }
        ScalingMode::Isotropic | ScalingMode::IsotropicWithOffset => {
            let sx = ratio(in_w, s_w);
            let sy = ratio(in_h, s_h);
            let unit = sx.abs().min(sy.abs());
            let (ux, uy) = (unit.copysign(sx), unit.copysign(sy));
            if scale_only {
                return (px * ux, py * uy);
            }
            let (left, bottom) = if state.scaling == ScalingMode::IsotropicWithOffset {
                (
                    f64::from(state.isotropic_offset.x) / 100.0,
                    f64::from(state.isotropic_offset.y) / 100.0,
                )
            } else {
                (0.5, 0.5)
            };
            let spare_x = in_w - ux * s_w;
            let spare_y = in_h - uy * s_h;
            (
                in1x + spare_x * left + (px - s1x) * ux,
                in1y + spare_y * bottom + (py - s1y) * uy,
            )
        }
        ScalingMode::Point => {
            // P2 holds the plotter units per user unit.
            let (fx, fy) = (
                f64::from(state.scaled_p2.x),
                f64::from(state.scaled_p2.y),
            );
            if scale_only {
                return (px * fx, py * fy);
            }
            (in1x + (px - s1x) * fx, in1y + (py - s1y) * fy)
        }
    };
    (x - origin_x, y - origin_y)
}

/// Canvas position of a point (or of a delta when `scale_only`)
pub fn point_to_canvas(
    p: Coord,
    area_width: f64,
    area_height: f64,
    state: &PlotterState,
    scale_only: bool,
) -> (f64, f64) {
    let factor_x = ratio(area_width, f64::from(state.width_transformed));
    let factor_y = ratio(area_height, f64::from(state.height_transformed));
    let (x, y) = plotter_units(p, state, scale_only);
    (x * factor_x, y * factor_y)
}

/// Font matrix for a character size given in percent of the input rectangle
pub fn font_size_to_canvas(
    width_pct: f32,
    height_pct: f32,
    area_width: f64,
    area_height: f64,
    state: &PlotterState,
) -> FontMatrix {
    let width_pu =
        f64::from(width_pct) * f64::from(state.input_p2.x - state.input_p1.x) / 100.0;
    let height_pu =
        f64::from(height_pct) * f64::from(state.input_p2.y - state.input_p1.y) / 100.0;
    let factor_x = ratio(area_width, f64::from(state.width_transformed));
    let factor_y = ratio(area_height, f64::from(state.height_transformed));
    FontMatrix {
        xx: width_pu * factor_x * FONT_WIDTH_FACTOR,
        yy: -(height_pu * factor_y * FONT_HEIGHT_FACTOR),
    }
}

/// Rebuild the canvas transform for the state's rotation.
///
/// Starts from the pass's initial transform, flips Y so the plot origin sits bottom-left,
/// rotates inside `image_width` x `image_height` and applies the margin. Updates the
/// transformed sheet size and the drawable area on `state`.
pub fn set_surface_rotation(
    canvas: &mut dyn Canvas,
    state: &mut PlotterState,
    image_width: f64,
    image_height: f64,
) {
    let mut t = state
        .initial_transform
        .translate(0.0, image_height)
        .scale(1.0, -1.0);
    let (mut width, mut height) = (image_width, image_height);
    let sheet_w = state.plotter_p2.x - state.plotter_p1.x;
    let sheet_h = state.plotter_p2.y - state.plotter_p1.y;

    let (w_t, h_t) = match state.rotation {
        90 => {
            t = t.rotate(FRAC_PI_2).translate(0.0, -width);
            std::mem::swap(&mut width, &mut height);
            (sheet_h, sheet_w)
        }
        180 => {
            t = t.rotate(PI).translate(-width, -height);
            (sheet_w, sheet_h)
        }
        270 => {
            t = t.rotate(-FRAC_PI_2).translate(-height, 0.0);
            std::mem::swap(&mut width, &mut height);
            (sheet_h, sheet_w)
        }
        _ => (sheet_w, sheet_h),
    };
    state.width_transformed = w_t;
    state.height_transformed = h_t;

    t = t.translate(width * MARGIN, height * MARGIN);
    width *= 1.0 - 2.0 * MARGIN;
    height *= 1.0 - 2.0 * MARGIN;

    canvas.set_transform(t);
    canvas.set_line_width(width / 1000.0 * 0.75);
    state.surface_transform = t;
    state.area_width = width;
    state.area_height = height;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Affine, RecordingCanvas};
    use crate::hpgl::types::Sheet;

    fn state() -> PlotterState {
        PlotterState::new(&Sheet::default(), Affine::IDENTITY)
    }

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6
    }

    #[test]
    fn unscaled_points_scale_with_area() {
        let s = state();
        let p = point_to_canvas(Coord::new(16800, 5940), 1680.0, 1188.0, &s, false);
        assert!(close(p, (1680.0, 594.0)));
    }

    #[test]
    fn anisotropic_maps_far_corner_to_input_p2() {
        let mut s = state();
        s.input_p1 = Coord::new(0, 0);
        s.input_p2 = Coord::new(1000, 1000);
        s.scaling = ScalingMode::Anisotropic;
        s.scaled_p1 = Coord::new(0, 0);
        s.scaled_p2 = Coord::new(10, 10);
        for (w, h) in [(1680.0, 1188.0), (333.0, 777.0)] {
            let p = point_to_canvas(Coord::new(10, 10), w, h, &s, false);
            assert!(close(p, (1000.0 * w / 16800.0, 1000.0 * h / 11880.0)));
        }
    }

    #[test]
    fn relative_deltas_ignore_anchor_offset() {
        let mut s = state();
        s.input_p1 = Coord::new(500, 500);
        s.input_p2 = Coord::new(1500, 1500);
        s.scaling = ScalingMode::Anisotropic;
        s.scaled_p1 = Coord::new(-10, -10);
        s.scaled_p2 = Coord::new(10, 10);
        let d = point_to_canvas(Coord::new(2, 0), 16800.0, 11880.0, &s, true);
        assert!(close(d, (100.0, 0.0)));
    }

    #[test]
    fn isotropic_centres_the_user_area() {
        let mut s = state();
        s.input_p1 = Coord::new(0, 0);
        s.input_p2 = Coord::new(2000, 1000);
        s.scaling = ScalingMode::Isotropic;
        s.scaled_p1 = Coord::new(0, 0);
        s.scaled_p2 = Coord::new(100, 100);
        let p = point_to_canvas(Coord::new(0, 0), 16800.0, 11880.0, &s, false);
        assert!(close(p, (500.0, 0.0)));
        let p = point_to_canvas(Coord::new(100, 100), 16800.0, 11880.0, &s, false);
        assert!(close(p, (1500.0, 1000.0)));
    }

    #[test]
    fn isotropic_offset_uses_left_bottom_percent() {
        let mut s = state();
        s.input_p2 = Coord::new(2000, 1000);
        s.scaling = ScalingMode::IsotropicWithOffset;
        s.scaled_p2 = Coord::new(100, 100);
        s.isotropic_offset = Coord::new(0, 0);
        let p = point_to_canvas(Coord::new(0, 0), 16800.0, 11880.0, &s, false);
        assert!(close(p, (0.0, 0.0)));
    }

    #[test]
    fn point_factor_scaling() {
        let mut s = state();
        s.scaling = ScalingMode::Point;
        s.scaled_p1 = Coord::new(10, 10);
        s.scaled_p2 = Coord::new(4, 2);
        let p = point_to_canvas(Coord::new(20, 20), 16800.0, 11880.0, &s, false);
        assert!(close(p, (40.0, 20.0)));
    }

    #[test]
    fn font_size_uses_input_rectangle() {
        let s = state();
        let m = font_size_to_canvas(1.0, 1.0, 16800.0, 11880.0, &s);
        assert!((m.xx - 168.0 * 2.4).abs() < 1e-6);
        assert!((m.yy + 118.8 * 2.0).abs() < 1e-6);
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let mut canvas = RecordingCanvas::new();
        let mut s = state();
        s.rotation = 90;
        set_surface_rotation(&mut canvas, &mut s, 1000.0, 700.0);
        assert_eq!((s.width_transformed, s.height_transformed), (11880, 16800));
        assert!((s.area_width - 700.0 * 0.97).abs() < 1e-9);
        s.rotation = 0;
        set_surface_rotation(&mut canvas, &mut s, 1000.0, 700.0);
        assert_eq!((s.width_transformed, s.height_transformed), (16800, 11880));
    }

    #[test]
    fn every_rotation_keeps_area_on_canvas() {
        let (w, h) = (1000.0, 700.0);
        for rotation in [0, 90, 180, 270] {
            let mut canvas = RecordingCanvas::new();
            let mut s = state();
            s.rotation = rotation;
            set_surface_rotation(&mut canvas, &mut s, w, h);
            let t = canvas.transform();
            for (ux, uy) in [(0.0, 0.0), (s.area_width, s.area_height)] {
                let (dx, dy) = t.apply(ux, uy);
                assert!((-1e-6..=w + 1e-6).contains(&dx), "rotation {rotation}: x {dx}");
                assert!((-1e-6..=h + 1e-6).contains(&dy), "rotation {rotation}: y {dy}");
            }
        }
    }

    #[test]
    fn origin_lands_bottom_left_after_margin() {
        let mut canvas = RecordingCanvas::new();
        let mut s = state();
        set_surface_rotation(&mut canvas, &mut s, 1000.0, 700.0);
        let (x, y) = canvas.transform().apply(0.0, 0.0);
        assert!(close((x, y), (15.0, 700.0 - 10.5)));
    }
}

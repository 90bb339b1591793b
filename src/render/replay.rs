use log::debug;

use super::label;
use super::state::PlotterState;
use super::transform::{font_size_to_canvas, point_to_canvas, set_surface_rotation};
use crate::bytecode::{Record, Records};
use crate::canvas::{Canvas, FontMatrix, Rgba};
use crate::hpgl::types::Sheet;

/// Default pen when a selected index is outside the palette
const DEFAULT_PEN: usize = 1;

/// Walks compiled records and drives a canvas
pub struct Replayer<'a> {
    pub sheet: &'a Sheet,
    pub pens: &'a [Rgba],
    pub line_feed_scale: f64,
}

struct Pass {
    pen_down: bool,
    first_point: bool,
    /// Set by the first pen-down of the pass
    drawn: bool,
    /// The record after the current one moves the pen
    moves_next: bool,
    dot: f64,
}

impl<'a> Replayer<'a> {
    pub fn new(sheet: &'a Sheet, pens: &'a [Rgba]) -> Self {
        Self { sheet, pens, line_feed_scale: 1.0 }
    }

    fn pen_color(&self, index: usize) -> Rgba {
        self.pens
            .get(index)
            .or_else(|| self.pens.get(DEFAULT_PEN))
            .copied()
            .unwrap_or(Rgba::BLACK)
    }

    /// Replay `bytes` (a whole buffer) onto a `width` x `height` canvas.
    ///
    /// `limit` bounds the walk to a previously captured length so a buffer that keeps
    /// growing can be replayed safely. Returns the plotter state at the end of the pass.
    pub fn replay(
        &self,
        bytes: &[u8],
        limit: Option<usize>,
        canvas: &mut dyn Canvas,
        width: f64,
        height: f64,
    ) -> PlotterState {
        let mut state = PlotterState::new(self.sheet, canvas.transform());
        canvas.save_state();

        let mut records = Records::new(bytes, limit).peekable();
        if records.peek().is_none() {
            debug!("Empty plot, drawing placeholder");
            draw_placeholder(canvas, width, height);
            canvas.restore_state();
            return state;
        }

        set_surface_rotation(canvas, &mut state, width, height);
        let font_size = width / 85.0;
        canvas.set_font_matrix(FontMatrix { xx: font_size, yy: -font_size });
        let mut pass = Pass {
            pen_down: false,
            first_point: true,
            drawn: false,
            moves_next: false,
            dot: state.area_width / 300.0,
        };
        canvas.set_color(self.pen_color(DEFAULT_PEN));
        canvas.set_line_width(state.area_width / 1000.0);
        canvas.move_to(0.0, 0.0);

        while let Some(record) = records.next() {
            pass.moves_next = matches!(
                records.peek(),
                Some(Record::Move(_) | Record::RelativeMove(_))
            );
            self.step(&record, canvas, &mut state, &mut pass, width, height);
        }

        canvas.stroke_path();
        canvas.restore_state();
        state
    }

    fn step(
        &self,
        record: &Record,
        canvas: &mut dyn Canvas,
        state: &mut PlotterState,
        pass: &mut Pass,
        width: f64,
        height: f64,
    ) {
        match record {
            Record::PenUp => {
                pass.pen_down = false;
                state.pen_down = false;
                let (x, y) = canvas.current_point().unwrap_or((0.0, 0.0));
                // A pen-up that only positions the pen before any drawing leaves no mark.
                if pass.first_point && (pass.drawn || !pass.moves_next) {
                    canvas.new_path();
                    canvas.fill_dot(x, y, state.area_width / 1250.0);
                }
                canvas.stroke_path();
                canvas.move_to(x, y);
                pass.first_point = false;
            }
            Record::PenDown => {
                pass.pen_down = true;
                pass.first_point = true;
                pass.drawn = true;
                state.pen_down = true;
            }
            Record::RelativeMove(delta) => {
                let (dx, dy) =
                    point_to_canvas(*delta, state.area_width, state.area_height, state, true);
                match (canvas.current_point(), pass.pen_down) {
                    (Some(_), true) => canvas.rel_line_to(dx, dy),
                    (Some(_), false) => canvas.rel_move_to(dx, dy),
                    (None, true) => canvas.line_to(dx, dy),
                    (None, false) => canvas.move_to(dx, dy),
                }
                if pass.pen_down {
                    pass.first_point = false;
                }
            }
            Record::Move(point) => {
                let (x, y) =
                    point_to_canvas(*point, state.area_width, state.area_height, state, false);
                if pass.pen_down {
                    canvas.line_to(x, y);
                    pass.first_point = false;
                } else {
                    canvas.move_to(x, y);
                }
            }
            Record::SelectPen(index) => {
                if pass.pen_down {
                    // The path so far keeps the previous pen's colour.
                    let current = canvas.current_point();
                    canvas.stroke_path();
                    if let Some((x, y)) = current {
                        canvas.move_to(x, y);
                    }
                }
                state.pen = *index;
                canvas.set_color(self.pen_color(usize::from(*index)));
            }
            Record::LineType(kind) => match kind {
                1 => canvas.set_dash_pattern(&[pass.dot]),
                2 => canvas.set_dash_pattern(&[pass.dot * 5.0, pass.dot * 2.0]),
                _ => canvas.set_dash_pattern(&[]),
            },
            Record::Label(text) => label::show_label(canvas, text, self.line_feed_scale),
            Record::TextSize { width: w, height: h } => {
                state.char_size = (*w, *h);
                let font = font_size_to_canvas(*w, *h, state.area_width, state.area_height, state);
                canvas.set_font_matrix(font);
            }
            Record::OutputPoints { p1, p2 } => {
                state.set_output_points(*p1, *p2);
                set_surface_rotation(canvas, state, width, height);
            }
            Record::InputPoints { p1, p2 } => {
                state.input_p1 = *p1;
                state.input_p2 = *p2;
            }
            Record::Scaling { mode, p1, p2, offset } => {
                state.scaling = *mode;
                state.scaled_p1 = *p1;
                state.scaled_p2 = *p2;
                state.isotropic_offset = *offset;
            }
            Record::Rotation(degrees) => {
                if degrees % 90 != 0 {
                    debug!("Ignoring rotation by {degrees} degrees");
                    return;
                }
                state.rotation = (state.rotation + degrees.rem_euclid(360)).rem_euclid(360);
                set_surface_rotation(canvas, state, width, height);
            }
            Record::UserCharacter(points) => label::draw_user_character(canvas, points),
        }
    }
}

/// Drawn instead of a plot when there is nothing to replay
fn draw_placeholder(canvas: &mut dyn Canvas, width: f64, height: f64) {
    let scale = width / 1000.0;
    let (cx, cy) = (width / 2.0, height * 0.8);
    let radius = 40.0 * scale;
    canvas.set_color(Rgba::rgb(0.75, 0.75, 0.75));
    canvas.set_line_width(4.0 * scale);
    canvas.set_dash_pattern(&[]);
    canvas.new_path();
    for step in 0..=48 {
        let a = f64::from(step) / 48.0 * std::f64::consts::TAU;
        canvas.line_to(cx + radius * a.cos(), cy + radius * a.sin());
    }
    canvas.stroke_path();
    let size = 40.0 * scale;
    canvas.set_font_matrix(FontMatrix { xx: size, yy: size });
    canvas.move_to(cx - canvas.text_advance("hp") / 2.0, cy + size * 0.35);
    canvas.show_text("hp");
    canvas.new_path();
}

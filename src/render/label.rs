//! Label text and user-defined stroke characters.

use crate::canvas::Canvas;
use crate::hpgl::types::{CoordFloat, UC_PEN_DOWN_OFFSET};

/// UC grid units per character advance
const UC_CELL_WIDTH_UNITS: f64 = 6.0;
/// UC grid units per em of font height
const UC_EM_HEIGHT_UNITS: f64 = 12.0;

/// Draw a label at the current point, honouring its control characters.
///
/// Line feed starts the next line at the label's start column, vertical tab moves one
/// line up, carriage return goes back to the start column, backspace steps back one
/// character and NUL ends the label.
pub fn show_label(canvas: &mut dyn Canvas, text: &str, line_feed_scale: f64) {
    let (start_x, start_y) = canvas.current_point().unwrap_or((0.0, 0.0));
    canvas.move_to(start_x, start_y);
    let line_height = canvas.font_matrix().yy * line_feed_scale;
    let advance = canvas.text_advance("0");
    let mut line = 0.0;
    let mut fragment = String::new();

    for c in text.chars() {
        match c {
            '\0' => break,
            '\n' => {
                flush(canvas, &mut fragment);
                line += 1.0;
                canvas.move_to(start_x, start_y + line * line_height);
            }
            '\u{b}' => {
                flush(canvas, &mut fragment);
                line -= 1.0;
                let x = canvas.current_point().map_or(start_x, |p| p.0);
                canvas.move_to(x, start_y + line * line_height);
            }
            '\r' => {
                flush(canvas, &mut fragment);
                canvas.move_to(start_x, start_y + line * line_height);
            }
            '\u{8}' => {
                flush(canvas, &mut fragment);
                canvas.rel_move_to(-advance, 0.0);
            }
            _ => fragment.push(c),
        }
    }
    flush(canvas, &mut fragment);
}

fn flush(canvas: &mut dyn Canvas, fragment: &mut String) {
    if !fragment.is_empty() {
        canvas.show_text(fragment);
        fragment.clear();
    }
}

/// Stroke a user-defined character cell starting at the current point.
///
/// Leaves the current point one character cell to the right of where it started.
pub fn draw_user_character(canvas: &mut dyn Canvas, points: &[CoordFloat]) {
    let (start_x, start_y) = canvas.current_point().unwrap_or((0.0, 0.0));
    let advance = canvas.text_advance("0");
    let unit_x = advance / UC_CELL_WIDTH_UNITS;
    let unit_y = -canvas.font_matrix().yy / UC_EM_HEIGHT_UNITS;

    canvas.move_to(start_x, start_y);
    for p in points {
        let mut dx = f64::from(p.x);
        let pen_down = p.x >= UC_PEN_DOWN_OFFSET / 2.0;
        if pen_down {
            dx -= f64::from(UC_PEN_DOWN_OFFSET);
        }
        let (dx, dy) = (dx * unit_x, f64::from(p.y) * unit_y);
        if pen_down {
            canvas.rel_line_to(dx, dy);
        } else {
            canvas.rel_move_to(dx, dy);
        }
    }
    canvas.stroke_path();
    canvas.move_to(start_x + advance, start_y);
}

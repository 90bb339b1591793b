use super::{Affine, Canvas, Graphics, PathSeg, Rgba};

/// One painted primitive, in device space
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasOp {
    Stroke {
        path: Vec<PathSeg>,
        color: Rgba,
        width: f64,
        dashes: Vec<f64>,
    },
    Dot {
        center: (f64, f64),
        radius: f64,
        color: Rgba,
    },
    Text {
        text: String,
        matrix: Affine,
        color: Rgba,
    },
}

/// Canvas that only logs what it is asked to paint
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    graphics: Graphics,
    pub ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> impl Iterator<Item = &[PathSeg]> {
        self.ops.iter().filter_map(|op| match op {
            CanvasOp::Stroke { path, .. } => Some(path.as_slice()),
            _ => None,
        })
    }

    pub fn dot_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, CanvasOp::Dot { .. })).count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.graphics
    }

    fn paint_stroke(&mut self, path: &[PathSeg]) {
        self.ops.push(CanvasOp::Stroke {
            path: path.to_vec(),
            color: self.graphics.state().color,
            width: self.graphics.device_line_width(),
            dashes: self.graphics.device_dashes(),
        });
    }

    fn paint_dot(&mut self, center: (f64, f64), radius: f64) {
        self.ops.push(CanvasOp::Dot {
            center,
            radius,
            color: self.graphics.state().color,
        });
    }

    fn paint_text(&mut self, text: &str, matrix: &Affine) {
        self.ops.push(CanvasOp::Text {
            text: text.to_string(),
            matrix: *matrix,
            color: self.graphics.state().color,
        });
    }
}

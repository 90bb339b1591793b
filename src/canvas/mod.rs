//! Drawing surface abstraction driven by the replay engine.
//!
//! Backends only paint finished geometry. Path building, the current point and the
//! graphics-state stack live in [`Graphics`], shared by every backend.

pub mod recording;

use serde::{Deserialize, Serialize};

pub use recording::{CanvasOp, RecordingCanvas};

/// Advance width of one monospace character, in em
pub const MONOSPACE_ADVANCE: f64 = 0.6;

/// 2D affine matrix, `x' = xx*x + xy*y + x0`, `y' = yx*x + yy*y + y0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { xx: 1.0, yx: 0.0, xy: 0.0, yy: 1.0, x0: 0.0, y0: 0.0 };

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self { xx: 1.0, yx: 0.0, xy: 0.0, yy: 1.0, x0: tx, y0: ty }
    }

    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self { xx: sx, yx: 0.0, xy: 0.0, yy: sy, x0: 0.0, y0: 0.0 }
    }

    pub fn rotation(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self { xx: c, yx: s, xy: -s, yy: c, x0: 0.0, y0: 0.0 }
    }

    /// `self ∘ inner`: apply `inner` first, then `self`
    pub fn multiply(&self, inner: &Affine) -> Self {
        Self {
            xx: self.xx * inner.xx + self.xy * inner.yx,
            xy: self.xx * inner.xy + self.xy * inner.yy,
            yx: self.yx * inner.xx + self.yy * inner.yx,
            yy: self.yx * inner.xy + self.yy * inner.yy,
            x0: self.xx * inner.x0 + self.xy * inner.y0 + self.x0,
            y0: self.yx * inner.x0 + self.yy * inner.y0 + self.y0,
        }
    }

    /// Translate user space, keeping the existing transform on top
    pub fn translate(&self, tx: f64, ty: f64) -> Self {
        self.multiply(&Self::translation(tx, ty))
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        self.multiply(&Self::scaling(sx, sy))
    }

    pub fn rotate(&self, radians: f64) -> Self {
        self.multiply(&Self::rotation(radians))
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.xx * x + self.xy * y + self.x0,
            self.yx * x + self.yy * y + self.y0,
        )
    }

    pub fn invert(&self) -> Option<Self> {
        let det = self.xx * self.yy - self.xy * self.yx;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let xx = self.yy / det;
        let xy = -self.xy / det;
        let yx = -self.yx / det;
        let yy = self.xx / det;
        Some(Self {
            xx,
            xy,
            yx,
            yy,
            x0: -(xx * self.x0 + xy * self.y0),
            y0: -(yx * self.x0 + yy * self.y0),
        })
    }

    /// Linear part only
    pub fn linear(&self) -> Self {
        Self { x0: 0.0, y0: 0.0, ..*self }
    }

    /// Uniform length scale of the matrix (square root of the determinant)
    pub fn scale_factor(&self) -> f64 {
        (self.xx * self.yy - self.xy * self.yx).abs().sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);

    /// `#rrggbb` form used by the SVG writer
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", channel(self.r), channel(self.g), channel(self.b))
    }
}

/// Text space to user space scale; negative `yy` keeps glyphs upright in a flipped space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMatrix {
    pub xx: f64,
    pub yy: f64,
}

impl Default for FontMatrix {
    fn default() -> Self {
        Self { xx: 10.0, yy: 10.0 }
    }
}

/// Device-space path element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSeg {
    MoveTo(f64, f64),
    LineTo(f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub transform: Affine,
    pub color: Rgba,
    /// User-space units
    pub line_width: f64,
    /// User-space units, empty for solid lines
    pub dashes: Vec<f64>,
    pub font: FontMatrix,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            color: Rgba::BLACK,
            line_width: 2.0,
            dashes: Vec::new(),
            font: FontMatrix::default(),
        }
    }
}

/// Path under construction plus the graphics-state stack
#[derive(Debug, Clone, Default)]
pub struct Graphics {
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    /// Device space
    current: Option<(f64, f64)>,
    path: Vec<PathSeg>,
}

impl Graphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GraphicsState {
        &mut self.state
    }

    pub fn path(&self) -> &[PathSeg] {
        &self.path
    }

    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn to_device(&self, x: f64, y: f64) -> (f64, f64) {
        self.state.transform.apply(x, y)
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = self.to_device(x, y);
        self.path.push(PathSeg::MoveTo(p.0, p.1));
        self.current = Some(p);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.current.is_none() {
            self.move_to(x, y);
            return;
        }
        let p = self.to_device(x, y);
        self.path.push(PathSeg::LineTo(p.0, p.1));
        self.current = Some(p);
    }

    pub fn rel_move_to(&mut self, dx: f64, dy: f64) {
        let (x, y) = self.current_point().unwrap_or((0.0, 0.0));
        self.move_to(x + dx, y + dy);
    }

    pub fn rel_line_to(&mut self, dx: f64, dy: f64) {
        let (x, y) = self.current_point().unwrap_or((0.0, 0.0));
        self.line_to(x + dx, y + dy);
    }

    /// Current point in user space
    pub fn current_point(&self) -> Option<(f64, f64)> {
        let (x, y) = self.current?;
        let inverse = self.state.transform.invert()?;
        Some(inverse.apply(x, y))
    }

    pub fn new_path(&mut self) {
        self.path.clear();
        self.current = None;
    }

    /// Device-space dash lengths for the current transform
    pub fn device_dashes(&self) -> Vec<f64> {
        let scale = self.state.transform.scale_factor();
        self.state.dashes.iter().map(|d| d * scale).collect()
    }

    pub fn device_line_width(&self) -> f64 {
        self.state.line_width * self.state.transform.scale_factor()
    }

    /// Glyph space (em units, y down) to device space, anchored at `origin` (device)
    pub fn text_matrix(&self, origin: (f64, f64)) -> Affine {
        let font = self.state.font;
        let mut m = self
            .state
            .transform
            .linear()
            .multiply(&Affine::scaling(font.xx, font.yy));
        m.x0 = origin.0;
        m.y0 = origin.1;
        m
    }
}

/// Surface the replay engine draws on.
///
/// Implementors expose their [`Graphics`] and paint finished geometry; everything else is
/// provided on top of those hooks.
pub trait Canvas {
    fn graphics(&self) -> &Graphics;
    fn graphics_mut(&mut self) -> &mut Graphics;

    /// Paint `path` (device space) with the current color, width and dashes
    fn paint_stroke(&mut self, path: &[PathSeg]);
    /// Fill a disc (device space)
    fn paint_dot(&mut self, center: (f64, f64), radius: f64);
    /// Draw `text` with glyph space mapped by `matrix` (see [`Graphics::text_matrix`])
    fn paint_text(&mut self, text: &str, matrix: &Affine);

    fn transform(&self) -> Affine {
        self.graphics().state().transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.graphics_mut().state_mut().transform = transform;
    }

    fn save_state(&mut self) {
        self.graphics_mut().save();
    }

    fn restore_state(&mut self) {
        self.graphics_mut().restore();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.graphics_mut().move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.graphics_mut().line_to(x, y);
    }

    fn rel_move_to(&mut self, dx: f64, dy: f64) {
        self.graphics_mut().rel_move_to(dx, dy);
    }

    fn rel_line_to(&mut self, dx: f64, dy: f64) {
        self.graphics_mut().rel_line_to(dx, dy);
    }

    fn current_point(&self) -> Option<(f64, f64)> {
        self.graphics().current_point()
    }

    fn new_path(&mut self) {
        self.graphics_mut().new_path();
    }

    /// Stroke and clear the path
    fn stroke_path(&mut self) {
        self.stroke_preserve();
        self.new_path();
    }

    /// Stroke, keeping the path and current point
    fn stroke_preserve(&mut self) {
        let path = self.graphics().path().to_vec();
        if path.iter().any(|seg| matches!(seg, PathSeg::LineTo(..))) {
            self.paint_stroke(&path);
        }
    }

    /// Filled dot of `radius` (user units) centered on `(x, y)` (user space)
    fn fill_dot(&mut self, x: f64, y: f64, radius: f64) {
        let g = self.graphics();
        let center = g.state().transform.apply(x, y);
        let radius = radius * g.state().transform.scale_factor();
        self.paint_dot(center, radius);
    }

    fn set_color(&mut self, color: Rgba) {
        self.graphics_mut().state_mut().color = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.graphics_mut().state_mut().line_width = width;
    }

    fn set_dash_pattern(&mut self, dashes: &[f64]) {
        self.graphics_mut().state_mut().dashes = dashes.to_vec();
    }

    fn set_font_matrix(&mut self, font: FontMatrix) {
        self.graphics_mut().state_mut().font = font;
    }

    fn font_matrix(&self) -> FontMatrix {
        self.graphics().state().font
    }

    /// User-space advance of `text` along x
    fn text_advance(&self, text: &str) -> f64 {
        text.chars().count() as f64 * MONOSPACE_ADVANCE * self.font_matrix().xx
    }

    /// Draw at the current point and advance it past the text
    fn show_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let (x, y) = self.current_point().unwrap_or((0.0, 0.0));
        let g = self.graphics();
        let origin = g.state().transform.apply(x, y);
        let matrix = g.text_matrix(origin);
        self.paint_text(text, &matrix);
        let advance = self.text_advance(text);
        self.move_to(x + advance, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn translate_applies_in_user_space() {
        let m = Affine::scaling(2.0, 3.0).translate(1.0, 1.0);
        assert!(close(m.apply(0.0, 0.0), (2.0, 3.0)));
    }

    #[test]
    fn flip_then_rotate_keeps_points_on_page() {
        let m = Affine::IDENTITY
            .translate(0.0, 100.0)
            .scale(1.0, -1.0)
            .rotate(std::f64::consts::FRAC_PI_2)
            .translate(0.0, -200.0);
        assert!(close(m.apply(0.0, 0.0), (200.0, 100.0)));
        assert!(close(m.apply(100.0, 200.0), (0.0, 0.0)));
    }

    #[test]
    fn invert_round_trips() {
        let m = Affine::rotation(0.3).translate(5.0, -2.0).scale(2.0, -1.5);
        let inv = m.invert().unwrap();
        let p = m.apply(3.0, 4.0);
        assert!(close(inv.apply(p.0, p.1), (3.0, 4.0)));
        assert!(Affine::scaling(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn current_point_survives_transform_change() {
        let mut g = Graphics::new();
        g.move_to(10.0, 10.0);
        g.state_mut().transform = Affine::scaling(2.0, 2.0);
        assert!(close(g.current_point().unwrap(), (5.0, 5.0)));
    }

    #[test]
    fn line_without_current_point_moves() {
        let mut g = Graphics::new();
        g.line_to(3.0, 4.0);
        assert_eq!(g.path(), &[PathSeg::MoveTo(3.0, 4.0)]);
    }

    #[test]
    fn color_hex() {
        assert_eq!(Rgba::rgb(0.75, 0.0, 1.0).to_hex(), "#bf00ff");
    }
}

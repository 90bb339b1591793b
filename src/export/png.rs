use font_kit::family_name::FamilyName;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use log::warn;
use rusttype::{Font, OutlineBuilder, Scale};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform,
};

use crate::canvas::{Affine, Canvas, Graphics, MONOSPACE_ADVANCE, PathSeg, Rgba};
use crate::error::{PlotError, PlotResult};
use crate::session::PlotSession;

/// First monospace system font, preferring the one the layout constants were tuned on
pub fn load_monospace_font() -> Option<Font<'static>> {
    let handle = SystemSource::new()
        .select_best_match(
            &[
                FamilyName::Title("Noto Sans Mono".to_string()),
                FamilyName::Monospace,
            ],
            &Properties::new(),
        )
        .ok()?;
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    Font::try_from_vec(data.as_ref().clone())
}

/// Collects glyph outlines into a tiny-skia path through a glyph-to-device matrix
struct GlyphOutline<'a> {
    builder: &'a mut PathBuilder,
    matrix: Affine,
    x_offset: f64,
}

impl GlyphOutline<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let (dx, dy) = self.matrix.apply(f64::from(x) + self.x_offset, f64::from(y));
        (dx as f32, dy as f32)
    }
}

impl OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }
    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }
    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }
    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }
    fn close(&mut self) {
        self.builder.close();
    }
}

/// Raster canvas over a tiny-skia pixmap
pub struct RasterCanvas {
    graphics: Graphics,
    pixmap: Pixmap,
    font: Option<Font<'static>>,
}

impl RasterCanvas {
    /// White canvas; `font` is used for labels, which are skipped without one
    pub fn new(width: u32, height: u32, font: Option<Font<'static>>) -> PlotResult<Self> {
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| PlotError::Png(format!("invalid canvas size {width}x{height}")))?;
        pixmap.fill(Color::WHITE);
        Ok(Self { graphics: Graphics::new(), pixmap, font })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn encode_png(&self) -> PlotResult<Vec<u8>> {
        self.pixmap.encode_png().map_err(|e| PlotError::Png(e.to_string()))
    }

    fn paint(&self) -> Paint<'static> {
        let Rgba { r, g, b, a } = self.graphics.state().color;
        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba(r, g, b, a).unwrap_or(Color::BLACK));
        paint.anti_alias = true;
        paint
    }
}

impl Canvas for RasterCanvas {
    fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.graphics
    }

    fn paint_stroke(&mut self, path: &[PathSeg]) {
        let mut pb = PathBuilder::new();
        for seg in path {
            match *seg {
                PathSeg::MoveTo(x, y) => pb.move_to(x as f32, y as f32),
                PathSeg::LineTo(x, y) => pb.line_to(x as f32, y as f32),
            }
        }
        let Some(skia_path) = pb.finish() else { return };
        let mut dashes: Vec<f32> = self.graphics.device_dashes().iter().map(|d| *d as f32).collect();
        if dashes.len() % 2 == 1 {
            // An odd pattern repeats with on and off swapped.
            dashes.extend_from_within(..);
        }
        let stroke = Stroke {
            width: self.graphics.device_line_width().max(0.5) as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            dash: if dashes.is_empty() { None } else { StrokeDash::new(dashes, 0.0) },
            ..Stroke::default()
        };
        let paint = self.paint();
        self.pixmap
            .stroke_path(&skia_path, &paint, &stroke, Transform::identity(), None);
    }

    fn paint_dot(&mut self, center: (f64, f64), radius: f64) {
        let Some(circle) =
            PathBuilder::from_circle(center.0 as f32, center.1 as f32, radius.max(0.5) as f32)
        else {
            return;
        };
        let paint = self.paint();
        self.pixmap
            .fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn paint_text(&mut self, text: &str, matrix: &Affine) {
        let Some(font) = &self.font else { return };
        let mut pb = PathBuilder::new();
        for (i, c) in text.chars().enumerate() {
            let glyph = font.glyph(c).scaled(Scale::uniform(1.0));
            let mut outline = GlyphOutline {
                builder: &mut pb,
                matrix: *matrix,
                x_offset: i as f64 * MONOSPACE_ADVANCE,
            };
            glyph.build_outline(&mut outline);
        }
        let Some(path) = pb.finish() else { return };
        let paint = self.paint();
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Raster the session's plot at the configured width
pub fn render_png(session: &PlotSession) -> PlotResult<Vec<u8>> {
    let width = session.config().png_width.max(1);
    let height = ((f64::from(width) / session.sheet().aspect_ratio).round() as u32).max(1);
    let font = load_monospace_font();
    if font.is_none() {
        warn!("No monospace system font found, labels are left out of the PNG");
    }
    let mut canvas = RasterCanvas::new(width, height, font)?;
    session.replay(&mut canvas, f64::from(width), f64::from(height));
    canvas.encode_png()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlotterConfig;
    use crate::hpgl::NoReplies;

    #[test]
    fn stroke_darkens_pixels() {
        let mut canvas = RasterCanvas::new(50, 50, None).unwrap();
        canvas.set_line_width(4.0);
        canvas.move_to(5.0, 25.0);
        canvas.line_to(45.0, 25.0);
        canvas.stroke_path();
        let pixel = canvas.pixmap().pixel(25, 25).unwrap();
        assert!(pixel.red() < 128);
        let corner = canvas.pixmap().pixel(1, 1).unwrap();
        assert_eq!(corner.red(), 255);
    }

    #[test]
    fn text_without_font_is_skipped() {
        let mut canvas = RasterCanvas::new(20, 20, None).unwrap();
        canvas.move_to(2.0, 10.0);
        canvas.show_text("AB");
        assert!(canvas.pixmap().pixels().iter().all(|p| p.red() == 255));
    }

    #[test]
    fn session_renders_png_bytes() {
        let config = PlotterConfig { png_width: 200, ..PlotterConfig::default() };
        let mut session = PlotSession::new(config);
        session.parse("SP1;PU100,100;PD8000,8000;PU;", &mut NoReplies).unwrap();
        let bytes = render_png(&session).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn zero_size_canvas_is_rejected() {
        assert!(matches!(RasterCanvas::new(0, 10, None), Err(PlotError::Png(_))));
    }
}

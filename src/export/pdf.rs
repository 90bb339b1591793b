use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use super::fit_to_page;
use crate::canvas::{Affine, Canvas, Graphics, PathSeg, Rgba};
use crate::error::{PlotError, PlotResult};
use crate::session::PlotSession;

/// Bezier handle length for a quarter circle
const KAPPA: f64 = 0.552_284_749_8;

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// WinAnsi bytes for the standard Courier font; anything else becomes `?`
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Canvas collecting PDF content-stream operations in device space (points, y down)
pub struct PdfCanvas {
    graphics: Graphics,
    width: f64,
    height: f64,
    operations: Vec<Operation>,
}

impl PdfCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        // Flip the page so device space runs top-down like the other backends.
        let operations = vec![Operation::new(
            "cm",
            vec![real(1.0), real(0.0), real(0.0), real(-1.0), real(0.0), real(height)],
        )];
        Self { graphics: Graphics::new(), width, height, operations }
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn color_operands(color: Rgba) -> Vec<Object> {
        vec![
            real(f64::from(color.r)),
            real(f64::from(color.g)),
            real(f64::from(color.b)),
        ]
    }

    /// Single-page document holding everything painted so far
    pub fn finish(self) -> PlotResult<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content { operations: self.operations };
        let encoded = content.encode().map_err(|e| PlotError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), real(self.width), real(self.height)],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(|e| PlotError::Pdf(e.to_string()))?;
        Ok(out)
    }
}

impl Canvas for PdfCanvas {
    fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.graphics
    }

    fn paint_stroke(&mut self, path: &[PathSeg]) {
        let color = self.graphics.state().color;
        let width = self.graphics.device_line_width();
        let dashes: Vec<Object> = self.graphics.device_dashes().into_iter().map(real).collect();
        self.op("q", vec![]);
        self.op("RG", Self::color_operands(color));
        self.op("w", vec![real(width)]);
        self.op("J", vec![1.into()]);
        self.op("j", vec![1.into()]);
        self.op("d", vec![Object::Array(dashes), 0.into()]);
        for seg in path {
            match *seg {
                PathSeg::MoveTo(x, y) => self.op("m", vec![real(x), real(y)]),
                PathSeg::LineTo(x, y) => self.op("l", vec![real(x), real(y)]),
            }
        }
        self.op("S", vec![]);
        self.op("Q", vec![]);
    }

    fn paint_dot(&mut self, center: (f64, f64), radius: f64) {
        let (cx, cy) = center;
        let k = radius * KAPPA;
        let color = self.graphics.state().color;
        self.op("q", vec![]);
        self.op("rg", Self::color_operands(color));
        self.op("m", vec![real(cx + radius), real(cy)]);
        let quarters = [
            (cx + radius, cy + k, cx + k, cy + radius, cx, cy + radius),
            (cx - k, cy + radius, cx - radius, cy + k, cx - radius, cy),
            (cx - radius, cy - k, cx - k, cy - radius, cx, cy - radius),
            (cx + k, cy - radius, cx + radius, cy - k, cx + radius, cy),
        ];
        for (x1, y1, x2, y2, x3, y3) in quarters {
            self.op("c", vec![real(x1), real(y1), real(x2), real(y2), real(x3), real(y3)]);
        }
        self.op("f", vec![]);
        self.op("Q", vec![]);
    }

    fn paint_text(&mut self, text: &str, matrix: &Affine) {
        // PDF glyph space has y up.
        let m = matrix.multiply(&Affine::scaling(1.0, -1.0));
        let color = self.graphics.state().color;
        self.op("BT", vec![]);
        self.op("rg", Self::color_operands(color));
        self.op("Tf", vec!["F1".into(), 1.into()]);
        self.op(
            "Tm",
            vec![real(m.xx), real(m.yx), real(m.xy), real(m.yy), real(m.x0), real(m.y0)],
        );
        self.op("Tj", vec![Object::string_literal(latin1(text))]);
        self.op("ET", vec![]);
    }
}

/// PDF page of the session's plot on the configured paper
pub fn render_pdf(session: &PlotSession) -> PlotResult<Vec<u8>> {
    let paper = session.config().paper;
    let (page_w, page_h) = paper.page_for(session.sheet());
    let fit = fit_to_page(page_w, page_h, paper.margin(), session.sheet().aspect_ratio);
    let mut canvas = PdfCanvas::new(page_w, page_h);
    canvas.set_transform(fit.transform);
    session.replay(&mut canvas, fit.width, fit.height);
    canvas.finish()
}

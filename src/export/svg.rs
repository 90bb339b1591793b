use std::fmt::Write;

use super::fit_to_page;
use crate::canvas::{Affine, Canvas, Graphics, PathSeg, Rgba};
use crate::session::PlotSession;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Canvas writing SVG elements in device space (points)
pub struct SvgCanvas {
    graphics: Graphics,
    width: f64,
    height: f64,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { graphics: Graphics::new(), width, height, body: String::new() }
    }

    fn color_attrs(color: Rgba, kind: &str) -> String {
        if color.a < 1.0 {
            format!(r#"{kind}="{}" {kind}-opacity="{:.3}""#, color.to_hex(), color.a)
        } else {
            format!(r#"{kind}="{}""#, color.to_hex())
        }
    }

    pub fn finish(self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}pt" height="{h}pt" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

impl Canvas for SvgCanvas {
    fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.graphics
    }

    fn paint_stroke(&mut self, path: &[PathSeg]) {
        let mut d = String::new();
        for seg in path {
            let _ = match *seg {
                PathSeg::MoveTo(x, y) => write!(d, "M{x:.3} {y:.3} "),
                PathSeg::LineTo(x, y) => write!(d, "L{x:.3} {y:.3} "),
            };
        }
        let dashes = self.graphics.device_dashes();
        let dash_attr = if dashes.is_empty() {
            String::new()
        } else {
            let list: Vec<String> = dashes.iter().map(|v| format!("{v:.3}")).collect();
            format!(r#" stroke-dasharray="{}""#, list.join(","))
        };
        let _ = writeln!(
            self.body,
            r#"<path d="{}" fill="none" {} stroke-width="{:.3}" stroke-linecap="round" stroke-linejoin="round"{}/>"#,
            d.trim_end(),
            Self::color_attrs(self.graphics.state().color, "stroke"),
            self.graphics.device_line_width(),
            dash_attr
        );
    }

    fn paint_dot(&mut self, center: (f64, f64), radius: f64) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{:.3}" cy="{:.3}" r="{:.3}" {}/>"#,
            center.0,
            center.1,
            radius,
            Self::color_attrs(self.graphics.state().color, "fill")
        );
    }

    fn paint_text(&mut self, text: &str, matrix: &Affine) {
        let _ = writeln!(
            self.body,
            r#"<text transform="matrix({:.5} {:.5} {:.5} {:.5} {:.3} {:.3})" font-family="Noto Sans Mono, monospace" font-size="1" {} xml:space="preserve">{}</text>"#,
            matrix.xx,
            matrix.yx,
            matrix.xy,
            matrix.yy,
            matrix.x0,
            matrix.y0,
            Self::color_attrs(self.graphics.state().color, "fill"),
            escape(text)
        );
    }
}

/// SVG page of the session's plot on the configured paper
pub fn render_svg(session: &PlotSession) -> String {
    let paper = session.config().paper;
    let (page_w, page_h) = paper.page_for(session.sheet());
    let fit = fit_to_page(page_w, page_h, paper.margin(), session.sheet().aspect_ratio);
    let mut canvas = SvgCanvas::new(page_w, page_h);
    canvas.set_transform(fit.transform);
    session.replay(&mut canvas, fit.width, fit.height);
    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlotterConfig;
    use crate::hpgl::NoReplies;

    #[test]
    fn escape_handles_markup_and_controls() {
        assert_eq!(escape("a<b & \"c\"\u{8}"), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn export_is_valid_svg() {
        let mut session = PlotSession::new(PlotterConfig::default());
        session
            .parse("IN;SP2;PU1000,1000;PD5000,1000,5000,5000;PU;LBV<1>\u{3}", &mut NoReplies)
            .unwrap();
        let svg = render_svg(&session);
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default()).unwrap();
        assert!(tree.size().width() > 800.0);
        assert!(svg.contains(r##"stroke="#bf0000""##));
        assert!(svg.contains("V&lt;1&gt;"));
    }
}

//! File output: PNG, SVG and PDF renderings of a session's plot.

pub mod pdf;
pub mod png;
pub mod svg;

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::canvas::Affine;
use crate::error::{PlotError, PlotResult};
use crate::hpgl::types::Sheet;
use crate::session::PlotSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    A3,
    Tabloid,
}

impl PaperSize {
    /// Portrait width and height in points
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            Self::A4 => (595.0, 842.0),
            Self::Letter => (612.0, 792.0),
            Self::A3 => (842.0, 1190.0),
            Self::Tabloid => (792.0, 1224.0),
        }
    }

    /// Unprintable border in points
    pub fn margin(self) -> f64 {
        match self {
            Self::A4 | Self::A3 => 7.2,
            Self::Letter | Self::Tabloid => 10.0,
        }
    }

    /// Page size in points, turned to match the sheet orientation
    pub fn page_for(self, sheet: &Sheet) -> (f64, f64) {
        let (w, h) = self.dimensions();
        if sheet.is_portrait() { (w, h) } else { (h, w) }
    }
}

/// Placement of the plot on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFit {
    pub transform: Affine,
    pub width: f64,
    pub height: f64,
}

/// Largest `aspect_ratio` box inside the printable page, centred on the spare axis
pub fn fit_to_page(page_width: f64, page_height: f64, margin: f64, aspect_ratio: f64) -> PageFit {
    let avail_w = (page_width - 2.0 * margin).max(1.0);
    let avail_h = (page_height - 2.0 * margin).max(1.0);
    let (width, height) = if avail_w / avail_h > aspect_ratio {
        (avail_h * aspect_ratio, avail_h)
    } else {
        (avail_w, avail_w / aspect_ratio)
    };
    PageFit {
        transform: Affine::translation(
            margin + (avail_w - width) / 2.0,
            margin + (avail_h - height) / 2.0,
        ),
        width,
        height,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn from_name(name: &str) -> PlotResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            other => Err(PlotError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> PlotResult<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_name(&ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }
}

/// Render the session's plot in `format`
pub fn render(session: &PlotSession, format: ExportFormat) -> PlotResult<Vec<u8>> {
    match format {
        ExportFormat::Png => png::render_png(session),
        ExportFormat::Svg => Ok(svg::render_svg(session).into_bytes()),
        ExportFormat::Pdf => pdf::render_pdf(session),
    }
}

/// Write the plot to `path`, choosing the format from its extension
pub fn save_plot(session: &PlotSession, path: &Path) -> PlotResult<()> {
    let format = ExportFormat::from_path(path)?;
    let bytes = render(session, format)?;
    std::fs::write(path, bytes)?;
    info!("Saved plot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_sheet_turns_page() {
        let sheet = Sheet::a3(false);
        assert_eq!(PaperSize::A4.page_for(&sheet), (842.0, 595.0));
        assert_eq!(PaperSize::A4.page_for(&Sheet::a3(true)), (595.0, 842.0));
    }

    #[test]
    fn fit_centres_on_spare_axis() {
        let fit = fit_to_page(300.0, 100.0, 0.0, 2.0);
        assert_eq!((fit.width, fit.height), (200.0, 100.0));
        assert_eq!(fit.transform.apply(0.0, 0.0), (50.0, 0.0));

        let fit = fit_to_page(100.0, 300.0, 10.0, 2.0);
        assert_eq!((fit.width, fit.height), (80.0, 40.0));
        assert_eq!(fit.transform.apply(0.0, 0.0), (10.0, 130.0));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("plot.PDF")).unwrap(), ExportFormat::Pdf);
        assert!(matches!(
            ExportFormat::from_path(Path::new("plot.bmp")),
            Err(PlotError::UnsupportedFormat(_))
        ));
    }
}

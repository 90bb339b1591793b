use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::canvas::Rgba;
use crate::error::PlotResult;
use crate::export::PaperSize;

/// Factory pen colours: white (parked), black, red, green, blue, cyan, magenta, yellow, grey
pub fn default_pens() -> Vec<Rgba> {
    vec![
        Rgba::rgb(1.0, 1.0, 1.0),
        Rgba::rgb(0.0, 0.0, 0.0),
        Rgba::rgb(0.75, 0.0, 0.0),
        Rgba::rgb(0.0, 0.75, 0.0),
        Rgba::rgb(0.0, 0.0, 0.75),
        Rgba::rgb(0.0, 0.75, 0.75),
        Rgba::rgb(0.75, 0.0, 0.75),
        Rgba::rgb(0.75, 0.75, 0.0),
        Rgba::rgb(0.75, 0.75, 0.75),
    ]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotterConfig {
    pub pens: Vec<Rgba>,
    /// Seconds without data after which the next chunk starts a new plot
    pub period_end_secs: f64,
    pub auto_clear: bool,
    pub portrait: bool,
    pub line_feed_scale: f64,
    pub paper: PaperSize,
    pub png_width: u32,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            pens: default_pens(),
            period_end_secs: 0.25,
            auto_clear: true,
            portrait: false,
            line_feed_scale: 1.0,
            paper: PaperSize::A4,
            png_width: 3300,
        }
    }
}

impl PlotterConfig {
    fn json_path() -> PathBuf {
        std::env::current_exe()
            .unwrap_or_default()
            .parent()
            .unwrap_or(Path::new("."))
            .join("hpgl_plotter.json")
    }

    /// Config next to the executable, or defaults when missing or unreadable
    pub fn load() -> Self {
        std::fs::read_to_string(Self::json_path())
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    /// Config from an explicit file; errors are reported
    pub fn load_from(path: &Path) -> PlotResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_has_nine_pens() {
        let config = PlotterConfig::default();
        assert_eq!(config.pens.len(), 9);
        assert_eq!(config.pens[0], Rgba::WHITE);
        assert_eq!(config.pens[1], Rgba::BLACK);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PlotterConfig =
            serde_json::from_str(r#"{ "period_end_secs": 2.0, "paper": "Letter" }"#).unwrap();
        assert_eq!(config.period_end_secs, 2.0);
        assert_eq!(config.paper, PaperSize::Letter);
        assert!(config.auto_clear);
        assert_eq!(config.png_width, 3300);
    }

    #[test]
    fn load_from_missing_file_is_an_error() {
        let result = PlotterConfig::load_from(Path::new("/nonexistent/hpgl_plotter.json"));
        assert!(matches!(result, Err(crate::error::PlotError::Io(_))));
    }
}

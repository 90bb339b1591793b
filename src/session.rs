//! One plot session: parser, compiled plot, raw log and end-of-plot policy.

use std::time::{Duration, Instant};

use log::info;

use crate::bytecode::Bytecode;
use crate::canvas::Canvas;
use crate::config::PlotterConfig;
use crate::error::PlotResult;
use crate::hpgl::types::Sheet;
use crate::hpgl::{ParserSession, ReplySink};
use crate::render::{PlotterState, Replayer};

pub struct PlotSession {
    config: PlotterConfig,
    sheet: Sheet,
    parser: ParserSession,
    code: Bytecode,
    verbatim: String,
    last_chunk: Option<Instant>,
}

impl PlotSession {
    pub fn new(config: PlotterConfig) -> Self {
        let sheet = Sheet::a3(config.portrait);
        Self {
            config,
            sheet,
            parser: ParserSession::new(),
            code: Bytecode::new(),
            verbatim: String::new(),
            last_chunk: None,
        }
    }

    pub fn config(&self) -> &PlotterConfig {
        &self.config
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Switch the sheet orientation; takes effect for later commands and replays
    pub fn set_portrait(&mut self, portrait: bool) {
        self.config.portrait = portrait;
        self.sheet = Sheet::a3(portrait);
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.code
    }

    /// Every raw chunk since the last clear
    pub fn verbatim(&self) -> &str {
        &self.verbatim
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Feed a chunk received now; see [`PlotSession::parse_at`]
    pub fn parse(&mut self, chunk: &str, replies: &mut dyn ReplySink) -> PlotResult<bool> {
        self.parse_at(chunk, Instant::now(), replies)
    }

    /// Feed a chunk received at `now`.
    ///
    /// With auto-clear on, a chunk arriving more than the configured period after the
    /// previous one starts a new plot. Returns the pen-parked flag.
    pub fn parse_at(
        &mut self,
        chunk: &str,
        now: Instant,
        replies: &mut dyn ReplySink,
    ) -> PlotResult<bool> {
        if let Some(last) = self.last_chunk {
            if self.config.auto_clear && now.saturating_duration_since(last) > self.period_end() {
                info!("No data for {:?}, starting a new plot", now - last);
                self.clear();
            }
        }
        self.last_chunk = Some(now);
        self.verbatim.push_str(chunk);
        self.parser.feed(chunk, &mut self.code, &self.sheet, replies)
    }

    /// True once the quiescence period has elapsed since the last chunk
    pub fn is_quiescent(&self, now: Instant) -> bool {
        self.last_chunk
            .is_some_and(|last| now.saturating_duration_since(last) > self.period_end())
    }

    fn period_end(&self) -> Duration {
        Duration::from_secs_f64(self.config.period_end_secs.max(0.0))
    }

    /// Drop the plot, the raw log and any partially received command
    pub fn clear(&mut self) {
        self.code.clear();
        self.verbatim.clear();
        self.parser.reset();
    }

    /// Length to capture before replaying while decoding continues elsewhere
    pub fn snapshot_length(&self) -> usize {
        self.code.len()
    }

    pub fn replay(&self, canvas: &mut dyn Canvas, width: f64, height: f64) -> PlotterState {
        self.replayer().replay(self.code.as_bytes(), None, canvas, width, height)
    }

    /// Replay only the records within a captured [`PlotSession::snapshot_length`]
    pub fn replay_snapshot(
        &self,
        length: usize,
        canvas: &mut dyn Canvas,
        width: f64,
        height: f64,
    ) -> PlotterState {
        self.replayer()
            .replay(self.code.as_bytes(), Some(length), canvas, width, height)
    }

    fn replayer(&self) -> Replayer<'_> {
        Replayer {
            sheet: &self.sheet,
            pens: &self.config.pens,
            line_feed_scale: self.config.line_feed_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpgl::NoReplies;

    #[test]
    fn quiet_gap_starts_new_plot() {
        let mut session = PlotSession::new(PlotterConfig::default());
        let t0 = Instant::now();
        session.parse_at("PU10,10;", t0, &mut NoReplies).unwrap();
        session.parse_at("PD20,20;", t0 + Duration::from_millis(100), &mut NoReplies).unwrap();
        assert_eq!(session.verbatim(), "PU10,10;PD20,20;");
        session.parse_at("PU;", t0 + Duration::from_secs(2), &mut NoReplies).unwrap();
        assert_eq!(session.verbatim(), "PU;");
        assert_eq!(session.bytecode().records().count(), 1);
    }

    #[test]
    fn auto_clear_off_keeps_plot() {
        let config = PlotterConfig { auto_clear: false, ..PlotterConfig::default() };
        let mut session = PlotSession::new(config);
        let t0 = Instant::now();
        session.parse_at("PU;", t0, &mut NoReplies).unwrap();
        session.parse_at("PU;", t0 + Duration::from_secs(5), &mut NoReplies).unwrap();
        assert_eq!(session.bytecode().records().count(), 2);
    }

    #[test]
    fn clear_drops_pending_command() {
        let mut session = PlotSession::new(PlotterConfig::default());
        let t0 = Instant::now();
        session.parse_at("PA100,", t0, &mut NoReplies).unwrap();
        session.clear();
        session.parse_at("200;PU;", t0, &mut NoReplies).unwrap();
        assert_eq!(session.bytecode().records().count(), 1);
        assert!(session.verbatim().starts_with("200"));
    }

    #[test]
    fn quiescence_reported_after_period() {
        let mut session = PlotSession::new(PlotterConfig::default());
        let t0 = Instant::now();
        assert!(!session.is_quiescent(t0));
        session.parse_at("PU;", t0, &mut NoReplies).unwrap();
        assert!(!session.is_quiescent(t0 + Duration::from_millis(100)));
        assert!(session.is_quiescent(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn portrait_sheet_changes_output_points() {
        let mut session = PlotSession::new(PlotterConfig::default());
        session.set_portrait(true);
        let mut replies: Vec<String> = Vec::new();
        session.parse("OP;", &mut replies).unwrap();
        assert_eq!(replies, vec!["0,0,11880,16800;\n"]);
    }
}

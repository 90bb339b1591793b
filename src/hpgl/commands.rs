//! Per-mnemonic argument grammar and record emission.

use log::{debug, trace};

use super::args::ArgScanner;
use super::charset::{self, NUM_CHARACTER_SETS};
use super::types::{
    Coord, CoordFloat, DEFAULT_CHAR_SIZE, ParserState, ScalingMode, Sheet, UC_PEN_DOWN_OFFSET,
};
use crate::bytecode::{Bytecode, Record};
use crate::error::PlotResult;

/// Receives status replies (`OE`, `OS`, `OP`) for the instrument
pub trait ReplySink {
    fn reply(&mut self, reply: &str);
}

impl ReplySink for Vec<String> {
    fn reply(&mut self, reply: &str) {
        self.push(reply.to_string());
    }
}

/// Discards every reply
pub struct NoReplies;

impl ReplySink for NoReplies {
    fn reply(&mut self, _reply: &str) {}
}

/// Everything a command handler may touch besides its arguments
pub struct CommandContext<'a> {
    pub state: &'a mut ParserState,
    pub code: &'a mut Bytecode,
    pub sheet: &'a Sheet,
    pub replies: &'a mut dyn ReplySink,
}

/// UC values at or beyond this magnitude are pen controls, not deltas
const UC_PEN_CONTROL: f32 = 99.0;

/// Compile one complete command
pub fn dispatch(mnemonic: [u8; 2], args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    trace!("{}{} {:?}", mnemonic[0] as char, mnemonic[1] as char, args);
    match &mnemonic {
        b"PA" => {
            ctx.state.absolute = true;
            add_line_points(args, ctx)
        }
        b"PR" => {
            ctx.state.absolute = false;
            add_line_points(args, ctx)
        }
        b"PU" => {
            ctx.code.push(&Record::PenUp)?;
            add_line_points(args, ctx)
        }
        b"PD" => {
            ctx.code.push(&Record::PenDown)?;
            add_line_points(args, ctx)
        }
        b"IN" => {
            ctx.state.absolute = true;
            Ok(())
        }
        b"DT" => {
            if let Some(c) = args.chars().next() {
                ctx.state.label_terminator = c;
            }
            Ok(())
        }
        b"LB" => label(args, ctx),
        b"SR" => character_size(args, ctx),
        b"LT" => line_type(args, ctx),
        b"SP" => select_pen(args, ctx),
        b"IP" => input_points(args, ctx),
        b"RO" => {
            let degrees = ArgScanner::new(args).next_int().unwrap_or(0);
            ctx.code.push(&Record::Rotation(degrees))
        }
        b"CS" => {
            ctx.state.character_set = match ArgScanner::new(args).next_int() {
                Some(set) if (0..NUM_CHARACTER_SETS as i32).contains(&set) => set as usize,
                _ => 0,
            };
            Ok(())
        }
        b"SC" => scale(args, ctx),
        b"UC" => user_character(args, ctx),
        b"OE" => {
            ctx.replies.reply("0\n");
            Ok(())
        }
        b"OS" => {
            ctx.replies.reply("26;\n");
            Ok(())
        }
        b"OP" => {
            let Sheet { p1, p2, .. } = *ctx.sheet;
            ctx.replies.reply(&format!("{},{},{},{};\n", p1.x, p1.y, p2.x, p2.y));
            ctx.code.push(&Record::OutputPoints { p1, p2 })
        }
        _ => {
            debug!(
                "Ignoring {}{} {:?}",
                mnemonic[0] as char, mnemonic[1] as char, args
            );
            Ok(())
        }
    }
}

fn add_line_points(args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    for point in ArgScanner::new(args).points() {
        let record = if ctx.state.absolute {
            Record::Move(point)
        } else {
            Record::RelativeMove(point)
        };
        ctx.code.push(&record)?;
    }
    Ok(())
}

fn label(args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    if args.is_empty() {
        return Ok(());
    }
    let mut text = charset::substitute(ctx.state.character_set, args);
    if text.len() > usize::from(u16::MAX) {
        let mut cut = usize::from(u16::MAX);
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    ctx.code.push(&Record::Label(text))
}

fn character_size(args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    let mut scanner = ArgScanner::new(args);
    if scanner.is_exhausted() {
        ctx.state.char_size = DEFAULT_CHAR_SIZE;
    } else if let [width, height, ..] = scanner.floats()[..] {
        ctx.state.char_size = (width, height);
    }
    let (width, height) = ctx.state.char_size;
    ctx.code.push(&Record::TextSize { width, height })
}

fn line_type(args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    let mut scanner = ArgScanner::new(args);
    if scanner.is_exhausted() {
        ctx.state.line_type = 0;
    } else if let Some(kind) = scanner.next_int().and_then(|v| u8::try_from(v).ok()) {
        ctx.state.line_type = kind;
    }
    ctx.code.push(&Record::LineType(ctx.state.line_type))
}

fn select_pen(args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    let mut scanner = ArgScanner::new(args);
    if scanner.is_exhausted() {
        ctx.state.pen = 0;
    } else if let Some(pen) = scanner.next_int() {
        ctx.state.pen = pen.clamp(0, u8::MAX as i32) as u8;
    }
    ctx.state.pen_parked = ctx.state.pen == 0;
    ctx.code.push(&Record::SelectPen(ctx.state.pen))
}

fn input_points(args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    let sheet = ctx.sheet;
    let (p1, p2) = match ArgScanner::new(args).ints()[..] {
        [x1, y1, x2, y2, ..] => (Coord::new(x1, y1), Coord::new(x2, y2)),
        [x1, y1] => (
            Coord::new(x1, y1),
            Coord::new(
                x1.saturating_add(sheet.p2.x - sheet.p1.x),
                y1.saturating_add(sheet.p2.y - sheet.p1.y),
            ),
        ),
        _ => (sheet.p1, sheet.p2),
    };
    ctx.code.push(&Record::InputPoints { p1, p2 })
}

fn scale(args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    let values = ArgScanner::new(args).ints();
    let (mode, offset) = match values[..] {
        [_, _, _, _] => (ScalingMode::Anisotropic, Coord::default()),
        [_, _, _, _, kind] => {
            let mode = match kind {
                0 => ScalingMode::Anisotropic,
                1 => ScalingMode::Isotropic,
                2 => ScalingMode::Point,
                other => {
                    debug!("Unknown SC scaling type {other}, scaling off");
                    ScalingMode::None
                }
            };
            (mode, Coord::default())
        }
        [_, _, _, _, _, left, bottom] => (ScalingMode::IsotropicWithOffset, Coord::new(left, bottom)),
        _ => (ScalingMode::None, Coord::default()),
    };
    let (p1, p2) = match values[..] {
        [x1, x2, y1, y2, ..] if mode != ScalingMode::None => (Coord::new(x1, y1), Coord::new(x2, y2)),
        _ => (Coord::default(), Coord::default()),
    };
    ctx.code.push(&Record::Scaling { mode, p1, p2, offset })
}

fn user_character(args: &str, ctx: &mut CommandContext<'_>) -> PlotResult<()> {
    let values = ArgScanner::new(args).floats();
    let mut points = Vec::new();
    let mut pen_down = false;
    let mut iter = values.into_iter();
    while let Some(x) = iter.next() {
        if x >= UC_PEN_CONTROL {
            pen_down = true;
        } else if x <= -UC_PEN_CONTROL {
            pen_down = false;
        } else {
            let Some(y) = iter.next() else { break };
            let x = if pen_down { x + UC_PEN_DOWN_OFFSET } else { x };
            points.push(CoordFloat::new(x, y));
        }
    }
    ctx.code.push(&Record::UserCharacter(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(commands: &[(&[u8; 2], &str)]) -> (Vec<Record>, Vec<String>, ParserState) {
        let mut state = ParserState::default();
        let mut code = Bytecode::new();
        let mut replies: Vec<String> = Vec::new();
        let sheet = Sheet::default();
        for (mnemonic, args) in commands {
            let mut ctx = CommandContext {
                state: &mut state,
                code: &mut code,
                sheet: &sheet,
                replies: &mut replies,
            };
            dispatch(**mnemonic, args, &mut ctx).unwrap();
        }
        (code.records().collect(), replies, state)
    }

    #[test]
    fn plot_relative_switches_move_kind() {
        let (records, _, state) = compile(&[(b"PR", "5,5"), (b"PD", "1,2")]);
        assert!(!state.absolute);
        assert_eq!(
            records,
            vec![
                Record::RelativeMove(Coord::new(5, 5)),
                Record::PenDown,
                Record::RelativeMove(Coord::new(1, 2)),
            ]
        );
    }

    #[test]
    fn initialize_restores_absolute_mode() {
        let (records, _, state) = compile(&[(b"PR", ""), (b"IN", ""), (b"PU", "7,8")]);
        assert!(state.absolute);
        assert_eq!(records, vec![Record::PenUp, Record::Move(Coord::new(7, 8))]);
    }

    #[test]
    fn select_pen_without_argument_parks() {
        let (records, _, state) = compile(&[(b"SP", "3"), (b"SP", "")]);
        assert!(state.pen_parked);
        assert_eq!(records, vec![Record::SelectPen(3), Record::SelectPen(0)]);
    }

    #[test]
    fn malformed_pen_keeps_previous() {
        let (records, _, state) = compile(&[(b"SP", "2"), (b"SP", "x")]);
        assert_eq!(state.pen, 2);
        assert!(!state.pen_parked);
        assert_eq!(records[1], Record::SelectPen(2));
    }

    #[test]
    fn character_size_defaults_and_keeps() {
        let (records, _, _) = compile(&[(b"SR", "1.2,2.4"), (b"SR", "oops"), (b"SR", "")]);
        assert_eq!(records[0], Record::TextSize { width: 1.2, height: 2.4 });
        assert_eq!(records[1], Record::TextSize { width: 1.2, height: 2.4 });
        assert_eq!(records[2], Record::TextSize { width: 0.75, height: 1.5 });
    }

    #[test]
    fn empty_label_emits_nothing() {
        let (records, _, _) = compile(&[(b"LB", "")]);
        assert!(records.is_empty());
    }

    #[test]
    fn label_uses_selected_character_set() {
        let (records, _, _) = compile(&[(b"CS", "2"), (b"LB", "#5"), (b"CS", "17"), (b"LB", "#5")]);
        assert_eq!(records, vec![Record::Label("£5".into()), Record::Label("#5".into())]);
    }

    #[test]
    fn define_terminator_takes_first_character() {
        let (_, _, state) = compile(&[(b"DT", "@")]);
        assert_eq!(state.label_terminator, '@');
        let (_, _, state) = compile(&[(b"DT", "")]);
        assert_eq!(state.label_terminator, '\u{3}');
    }

    #[test]
    fn input_points_by_argument_count() {
        let sheet = Sheet::default();
        let (records, _, _) = compile(&[(b"IP", ""), (b"IP", "100,200"), (b"IP", "1,2,3,4")]);
        assert_eq!(records[0], Record::InputPoints { p1: sheet.p1, p2: sheet.p2 });
        assert_eq!(
            records[1],
            Record::InputPoints { p1: Coord::new(100, 200), p2: Coord::new(16900, 12080) }
        );
        assert_eq!(
            records[2],
            Record::InputPoints { p1: Coord::new(1, 2), p2: Coord::new(3, 4) }
        );
    }

    #[test]
    fn scale_modes_follow_argument_count() {
        let (records, _, _) = compile(&[
            (b"SC", "0,1000,0,500"),
            (b"SC", "0,10,0,10,1"),
            (b"SC", "0,10,0,10,1,25,75"),
            (b"SC", ""),
        ]);
        assert_eq!(
            records[0],
            Record::Scaling {
                mode: ScalingMode::Anisotropic,
                p1: Coord::new(0, 0),
                p2: Coord::new(1000, 500),
                offset: Coord::default(),
            }
        );
        match &records[1] {
            Record::Scaling { mode, .. } => assert_eq!(*mode, ScalingMode::Isotropic),
            other => panic!("Unexpected record: {other:?}"),
        }
        match &records[2] {
            Record::Scaling { mode, offset, .. } => {
                assert_eq!(*mode, ScalingMode::IsotropicWithOffset);
                assert_eq!(*offset, Coord::new(25, 75));
            }
            other => panic!("Unexpected record: {other:?}"),
        }
        match &records[3] {
            Record::Scaling { mode, .. } => assert_eq!(*mode, ScalingMode::None),
            other => panic!("Unexpected record: {other:?}"),
        }
    }

    #[test]
    fn user_character_marks_pen_down_points() {
        let (records, _, _) = compile(&[(b"UC", "2,0,99,4,8,-99,1,-1")]);
        assert_eq!(
            records,
            vec![Record::UserCharacter(vec![
                CoordFloat::new(2.0, 0.0),
                CoordFloat::new(10004.0, 8.0),
                CoordFloat::new(1.0, -1.0),
            ])]
        );
    }

    #[test]
    fn status_queries_reply() {
        let (records, replies, _) = compile(&[(b"OE", ""), (b"OS", ""), (b"OP", "")]);
        assert_eq!(replies, vec!["0\n", "26;\n", "0,0,16800,11880;\n"]);
        assert_eq!(
            records,
            vec![Record::OutputPoints { p1: Coord::new(0, 0), p2: Coord::new(16800, 11880) }]
        );
    }

    #[test]
    fn unsupported_mnemonics_are_ignored() {
        let (records, replies, _) = compile(&[(b"VS", "10"), (b"DF", ""), (b"ZZ", "1,2")]);
        assert!(records.is_empty());
        assert!(replies.is_empty());
    }
}

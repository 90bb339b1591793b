use hpgl_plotter::PlotSession;
use hpgl_plotter::bytecode::Record;
use hpgl_plotter::canvas::{CanvasOp, PathSeg, RecordingCanvas};
use hpgl_plotter::config::PlotterConfig;
use hpgl_plotter::hpgl::NoReplies;
use hpgl_plotter::hpgl::types::Coord;
use hpgl_plotter::render::transform::point_to_canvas;

const PLOT: &str = "IN;SP2;PU100,200;PD500,200,500,900;PR-50,0;PA;LT2;DT#;LBHello\n#SR1.5,2;\
                    LBAB#IP0,0,1000,1000;SC0,100,0,100;PU10,10;PD90,90;RO90;UC2,4,99,0,8,-99;SP0;";

fn session() -> PlotSession {
    PlotSession::new(PlotterConfig {
        auto_clear: false,
        ..PlotterConfig::default()
    })
}

fn compile(chunks: &[&str]) -> PlotSession {
    let mut s = session();
    for chunk in chunks {
        s.parse(chunk, &mut NoReplies).unwrap();
    }
    s
}

fn close(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6
}

#[test]
fn chunk_boundaries_do_not_change_bytecode() {
    let whole = compile(&[PLOT]);
    for (offset, _) in PLOT.char_indices().skip(1) {
        let split = compile(&[&PLOT[..offset], &PLOT[offset..]]);
        assert_eq!(
            split.bytecode().as_bytes(),
            whole.bytecode().as_bytes(),
            "split at {offset}"
        );
    }
}

#[test]
fn replay_is_repeatable() {
    let s = compile(&[PLOT]);
    let mut first = RecordingCanvas::new();
    let mut second = RecordingCanvas::new();
    let state_a = s.replay(&mut first, 1680.0, 1188.0);
    let state_b = s.replay(&mut second, 1680.0, 1188.0);
    assert!(!first.ops.is_empty());
    assert_eq!(first.ops, second.ops);
    assert_eq!(state_a, state_b);
}

#[test]
fn pen_down_segment_is_one_stroke() {
    let s = compile(&["IN;SP1;PU10,20;PD30,40;PU;"]);
    let mut canvas = RecordingCanvas::new();
    let state = s.replay(&mut canvas, 1000.0, 700.0);

    let strokes: Vec<&[PathSeg]> = canvas.strokes().collect();
    assert_eq!(strokes.len(), 1);
    assert_eq!(canvas.dot_count(), 0);

    let to_device = |x, y| {
        let p = point_to_canvas(Coord::new(x, y), state.area_width, state.area_height, &state, false);
        state.surface_transform.apply(p.0, p.1)
    };
    let (ax, ay) = to_device(10, 20);
    let (bx, by) = to_device(30, 40);
    match strokes[0] {
        [.., PathSeg::MoveTo(x0, y0), PathSeg::LineTo(x1, y1)] => {
            assert!(close((*x0, *y0), (ax, ay)));
            assert!(close((*x1, *y1), (bx, by)));
        }
        other => panic!("Unexpected path: {other:?}"),
    }
}

#[test]
fn lone_pen_up_draws_a_dot() {
    let s = compile(&["PU;"]);
    let mut canvas = RecordingCanvas::new();
    s.replay(&mut canvas, 1000.0, 700.0);
    assert_eq!(canvas.dot_count(), 1);
    assert_eq!(canvas.strokes().count(), 0);
}

#[test]
fn scaled_far_corner_lands_on_margin() {
    let s = compile(&["IP0,0,16800,11880;SC0,100,0,100;PU0,0;PD100,100;PU;"]);
    for (w, h) in [(1680.0, 1188.0), (3300.0, 2333.0), (500.0, 900.0)] {
        let mut canvas = RecordingCanvas::new();
        s.replay(&mut canvas, w, h);
        let end = canvas.strokes().last().and_then(|path| match path.last() {
            Some(PathSeg::LineTo(x, y)) => Some((*x, *y)),
            _ => None,
        });
        let expected = (w * 0.985, h * 0.015);
        assert!(
            end.is_some_and(|p| (p.0 - expected.0).abs() < 1e-6 && (p.1 - expected.1).abs() < 1e-6),
            "{w}x{h}: {end:?}"
        );
    }
}

#[test]
fn opposite_rotations_cancel() {
    let plain = compile(&["PU;PD100,100;"]);
    let turned = compile(&["RO90;RO270;PU;PD100,100;"]);
    let mut a = RecordingCanvas::new();
    let mut b = RecordingCanvas::new();
    let sa = plain.replay(&mut a, 1680.0, 1188.0);
    let sb = turned.replay(&mut b, 1680.0, 1188.0);
    assert_eq!(sb.rotation, 0);
    assert!(close((sa.area_width, sa.area_height), (sb.area_width, sb.area_height)));
    assert_eq!(sa.width_transformed, sb.width_transformed);
    let p = (123.0, 45.0);
    assert!(close(sa.surface_transform.apply(p.0, p.1), sb.surface_transform.apply(p.0, p.1)));
}

#[test]
fn large_rotation_argument_is_reduced() {
    let plain = compile(&["RO180;PU;PD100,100;"]);
    let turned = compile(&["RO90;RO2147483610;PU;PD100,100;"]);
    let mut a = RecordingCanvas::new();
    let mut b = RecordingCanvas::new();
    let sa = plain.replay(&mut a, 1680.0, 1188.0);
    let sb = turned.replay(&mut b, 1680.0, 1188.0);
    assert_eq!(sb.rotation, 180);
    assert_eq!(a.ops, b.ops);
    assert_eq!(sa.surface_transform, sb.surface_transform);
}

#[test]
fn pen_zero_reports_parked() {
    let mut s = session();
    assert!(!s.parse("SP1;PA0,0;", &mut NoReplies).unwrap());
    assert!(s.parse("PU;SP0;", &mut NoReplies).unwrap());
    assert!(!s.parse("", &mut NoReplies).unwrap());
    assert!(!s.parse("SP3", &mut NoReplies).unwrap());
    assert!(!s.parse(";", &mut NoReplies).unwrap());
}

#[test]
fn output_points_reply_and_record() {
    let mut s = session();
    let mut replies: Vec<String> = Vec::new();
    s.parse("OP;", &mut replies).unwrap();
    assert_eq!(replies, vec!["0,0,16800,11880;\n".to_string()]);
    let records: Vec<Record> = s.bytecode().records().collect();
    assert_eq!(
        records,
        vec![Record::OutputPoints {
            p1: Coord::new(0, 0),
            p2: Coord::new(16800, 11880),
        }]
    );
}

#[test]
fn labels_follow_the_pen() {
    let s = compile(&["PA100,100;LBAB\u{3}"]);
    let mut canvas = RecordingCanvas::new();
    s.replay(&mut canvas, 1680.0, 1188.0);
    assert!(canvas.ops.iter().any(|op| matches!(op, CanvasOp::Text { text, .. } if text == "AB")));
}

#[test]
fn scaled_point_maps_onto_input_rectangle() {
    let s = compile(&["IP0,0,1000,1000;SC0,1000,0,1000;PU500,500;PD1000,1000;PU;"]);
    for (w, h) in [(1680.0, 1188.0), (640.0, 480.0)] {
        let mut canvas = RecordingCanvas::new();
        let state = s.replay(&mut canvas, w, h);
        let corner = (
            1000.0 * state.area_width / 16800.0,
            1000.0 * state.area_height / 11880.0,
        );
        let expected = state.surface_transform.apply(corner.0, corner.1);
        let end = canvas.strokes().last().and_then(|path| match path.last() {
            Some(PathSeg::LineTo(x, y)) => Some((*x, *y)),
            _ => None,
        });
        assert!(end.is_some_and(|p| close(p, expected)), "{w}x{h}: {end:?}");
    }
}

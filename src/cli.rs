//! Command line front end: offline rendering, serial capture and port listing.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use log::{debug, info, warn};

use crate::config::PlotterConfig;
use crate::error::PlotResult;
use crate::export::{self, ExportFormat};
use crate::serial::{self, SerialListener, TransportMsg};
use crate::session::PlotSession;

#[derive(Parser, Debug)]
#[command(name = "hpgl-plotter", version, about = "Render HP-GL plotter output")]
pub struct Cli {
    /// Settings file; defaults to hpgl_plotter.json next to the executable
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use a portrait sheet
    #[arg(long, global = true)]
    pub portrait: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render an HP-GL file (or `-` for stdin) to PNG, SVG or PDF
    Render {
        input: String,
        /// Output file; the extension picks the format
        #[arg(short, long)]
        output: PathBuf,
        /// Feed the input in chunks of this many characters
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Print the decoded records to stdout
        #[arg(long)]
        dump_records: bool,
    },
    /// Capture plots from a serial port, one file per plot
    Listen {
        #[arg(short, long)]
        port: String,
        #[arg(short, long, default_value_t = 9600)]
        baud: u32,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long, default_value = "png")]
        format: String,
    },
    /// List available serial ports
    Ports,
}

impl Cli {
    pub fn run(self) -> PlotResult<()> {
        let mut config = match &self.config {
            Some(path) => PlotterConfig::load_from(path)?,
            None => PlotterConfig::load(),
        };
        if self.portrait {
            config.portrait = true;
        }

        match self.command {
            Command::Render {
                input,
                output,
                chunk_size,
                dump_records,
            } => render(config, &input, &output, chunk_size, dump_records),
            Command::Listen {
                port,
                baud,
                out_dir,
                format,
            } => listen(config, &port, baud, &out_dir, ExportFormat::from_name(&format)?),
            Command::Ports => {
                for port in serial::list_ports() {
                    println!("{port}");
                }
                Ok(())
            }
        }
    }
}

fn read_input(input: &str) -> PlotResult<String> {
    let bytes = if input == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        std::fs::read(input)?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Split on char boundaries into pieces of at most `size` chars
fn chunks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut out = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            out.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn render(
    config: PlotterConfig,
    input: &str,
    output: &Path,
    chunk_size: Option<usize>,
    dump_records: bool,
) -> PlotResult<()> {
    let text = read_input(input)?;
    let mut session = PlotSession::new(config);
    let mut replies: Vec<String> = Vec::new();

    let pieces = match chunk_size {
        Some(n) => chunks(&text, n),
        None => vec![text.as_str()],
    };
    for piece in pieces {
        session.parse(piece, &mut replies)?;
    }
    for reply in &replies {
        debug!("Reply: {}", reply.trim_end());
    }

    if dump_records {
        for record in session.bytecode().records() {
            println!("{record:?}");
        }
    }

    info!("Decoded {} bytes of plot", session.bytecode().len());
    export::save_plot(&session, output)
}

fn listen(
    config: PlotterConfig,
    port: &str,
    baud: u32,
    out_dir: &Path,
    format: ExportFormat,
) -> PlotResult<()> {
    std::fs::create_dir_all(out_dir)?;
    let poll = Duration::from_secs_f64(config.period_end_secs.max(0.05));
    let listener = SerialListener::open(port, baud)?;
    let mut replies = listener.cmd_tx.clone();
    let mut session = PlotSession::new(config);
    let mut saved = 0usize;

    loop {
        match listener.rx.recv_timeout(poll) {
            Ok(TransportMsg::Connected(name)) => info!("Listening on {name}"),
            Ok(TransportMsg::Chunk(chunk)) => {
                if session.is_quiescent(Instant::now()) && !session.is_empty() {
                    saved = save_next(&session, out_dir, format, saved)?;
                    session.clear();
                }
                if session.parse(&chunk, &mut replies)? && !session.is_empty() {
                    saved = save_next(&session, out_dir, format, saved)?;
                    session.clear();
                }
            }
            Ok(TransportMsg::Disconnected(reason)) => {
                warn!("Serial port closed: {reason}");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                if session.is_quiescent(Instant::now()) && !session.is_empty() {
                    saved = save_next(&session, out_dir, format, saved)?;
                    session.clear();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if !session.is_empty() {
        save_next(&session, out_dir, format, saved)?;
    }
    listener.disconnect();
    Ok(())
}

fn save_next(
    session: &PlotSession,
    out_dir: &Path,
    format: ExportFormat,
    saved: usize,
) -> PlotResult<usize> {
    let path = out_dir.join(format!("plot-{:04}.{}", saved + 1, format.extension()));
    export::save_plot(session, &path)?;
    Ok(saved + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_char_boundaries() {
        assert_eq!(chunks("PA1,2;", 4), vec!["PA1,", "2;"]);
        assert_eq!(chunks("LBé\u{3}", 2), vec!["LB", "é\u{3}"]);
        assert_eq!(chunks("", 3), Vec::<&str>::new());
        assert_eq!(chunks("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn parses_render_arguments() {
        let cli = Cli::try_parse_from([
            "hpgl-plotter",
            "render",
            "plot.hpgl",
            "-o",
            "out.svg",
            "--chunk-size",
            "7",
            "--portrait",
        ])
        .unwrap();
        assert!(cli.portrait);
        match cli.command {
            Command::Render {
                input,
                output,
                chunk_size,
                dump_records,
            } => {
                assert_eq!(input, "plot.hpgl");
                assert_eq!(output, PathBuf::from("out.svg"));
                assert_eq!(chunk_size, Some(7));
                assert!(!dump_records);
            }
            other => panic!("Unexpected command: {other:?}"),
        }
    }

    #[test]
    fn listen_defaults_to_9600_png() {
        let cli = Cli::try_parse_from([
            "hpgl-plotter",
            "listen",
            "--port",
            "/dev/ttyUSB0",
            "--out-dir",
            "plots",
        ])
        .unwrap();
        match cli.command {
            Command::Listen { baud, format, .. } => {
                assert_eq!(baud, 9600);
                assert_eq!(format, "png");
            }
            other => panic!("Unexpected command: {other:?}"),
        }
    }
}

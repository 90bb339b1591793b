use crossbeam_channel::{Receiver, Sender, unbounded};
use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{PlotError, PlotResult};
use crate::hpgl::ReplySink;

/// Messages from the reader thread
#[derive(Debug, Clone)]
pub enum TransportMsg {
    /// Raw HP-GL text as received
    Chunk(String),
    Connected(String),
    Disconnected(String),
}

/// Messages to the writer thread
#[derive(Debug)]
pub enum TransportCmd {
    Reply(String),
    Disconnect,
}

/// Serial line from an instrument's plotter output
pub struct SerialListener {
    pub rx: Receiver<TransportMsg>,
    pub cmd_tx: Sender<TransportCmd>,
}

impl SerialListener {
    /// Open a serial port and spawn reader/writer threads
    pub fn open(port_name: &str, baud_rate: u32) -> PlotResult<Self> {
        let mut port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| PlotError::Serial(format!("Failed to open {port_name}: {e}")))?;
        let mut writer_port = port
            .try_clone()
            .map_err(|e| PlotError::Serial(format!("Failed to clone {port_name}: {e}")))?;

        let (msg_tx, msg_rx) = unbounded::<TransportMsg>();
        let (cmd_tx, cmd_rx) = unbounded::<TransportCmd>();

        // Reader thread
        let port_name_owned = port_name.to_string();
        std::thread::spawn(move || {
            let _ = msg_tx.send(TransportMsg::Connected(port_name_owned));
            let mut buf = [0u8; 1024];
            let mut pending = Vec::new();
            loop {
                match port.read(&mut buf) {
                    Ok(0) => continue,
                    Ok(n) => {
                        pending.extend_from_slice(&buf[..n]);
                        let chunk = decode_utf8(&mut pending);
                        if chunk.is_empty() {
                            continue;
                        }
                        if msg_tx.send(TransportMsg::Chunk(chunk)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        if e.kind() == std::io::ErrorKind::TimedOut {
                            continue;
                        }
                        let _ = msg_tx.send(TransportMsg::Disconnected(e.to_string()));
                        break;
                    }
                }
            }
        });

        // Writer thread
        std::thread::spawn(move || {
            // Port is closed when the thread returns and drops it.
            while let Ok(TransportCmd::Reply(reply)) = cmd_rx.recv() {
                if let Err(e) = writer_port
                    .write_all(reply.as_bytes())
                    .and_then(|_| writer_port.flush())
                {
                    log::warn!("Failed to send reply {:?}: {e}", reply.trim_end());
                }
            }
        });

        Ok(Self {
            rx: msg_rx,
            cmd_tx,
        })
    }

    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(TransportCmd::Disconnect);
    }
}

impl ReplySink for SerialListener {
    fn reply(&mut self, reply: &str) {
        let _ = self.cmd_tx.send(TransportCmd::Reply(reply.to_string()));
    }
}

/// Replies queued on a channel, for transports driven from another thread
impl ReplySink for Sender<TransportCmd> {
    fn reply(&mut self, reply: &str) {
        let _ = self.send(TransportCmd::Reply(reply.to_string()));
    }
}

/// Decode the complete characters in `pending`, keeping a split trailing sequence for the
/// next read. Invalid bytes become U+FFFD.
fn decode_utf8(pending: &mut Vec<u8>) -> String {
    let mut out = String::new();
    loop {
        match std::str::from_utf8(pending) {
            Ok(text) => {
                out.push_str(text);
                pending.clear();
                return out;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(std::str::from_utf8(&pending[..valid]).unwrap_or_default());
                match e.error_len() {
                    None => {
                        pending.drain(..valid);
                        return out;
                    }
                    Some(bad) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + bad);
                    }
                }
            }
        }
    }
}

/// Enumerate available serial ports
pub fn list_ports() -> Vec<String> {
    let mut ports = Vec::new();

    if let Ok(system_ports) = serialport::available_ports() {
        for p in system_ports {
            ports.push(p.port_name);
        }
    }

    // Fallback: scan /dev
    if ports.is_empty() {
        for pattern in &["ttyUSB", "ttyACM", "ttyS"] {
            if let Ok(entries) = std::fs::read_dir("/dev") {
                for entry in entries.flatten() {
                    let name = entry.file_name().to_string_lossy().to_string();
                    if name.starts_with(pattern) {
                        ports.push(format!("/dev/{name}"));
                    }
                }
            }
        }
    }

    ports.sort();
    ports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_queues_replies() {
        let (mut tx, rx) = unbounded::<TransportCmd>();
        tx.reply("26;\n");
        match rx.try_recv() {
            Ok(TransportCmd::Reply(r)) => assert_eq!(r, "26;\n"),
            other => panic!("Unexpected message: {other:?}"),
        }
    }

    #[test]
    fn split_utf8_sequence_is_carried_over() {
        let bytes = "é°".as_bytes();
        let mut pending = bytes[..1].to_vec();
        assert_eq!(decode_utf8(&mut pending), "");
        assert_eq!(pending, vec![bytes[0]]);
        pending.extend_from_slice(&bytes[1..3]);
        assert_eq!(decode_utf8(&mut pending), "é");
        assert_eq!(pending, vec![bytes[2]]);
        pending.extend_from_slice(&bytes[3..]);
        assert_eq!(decode_utf8(&mut pending), "°");
        assert!(pending.is_empty());
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut pending = vec![b'P', b'U', 0xFF, b';'];
        assert_eq!(decode_utf8(&mut pending), "PU\u{FFFD};");
        assert!(pending.is_empty());
    }

    #[test]
    fn opening_missing_port_fails() {
        assert!(matches!(
            SerialListener::open("/dev/does-not-exist-hpgl", 9600),
            Err(PlotError::Serial(_))
        ));
    }
}

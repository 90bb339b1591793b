pub mod connection;

pub use connection::{SerialListener, TransportCmd, TransportMsg, list_ports};

//! HP-GL plotter emulation: decode a plotter stream into a compact bytecode and
//! replay it onto a drawing surface.

pub mod bytecode;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod hpgl;
pub mod render;
pub mod serial;
pub mod session;

pub use error::{PlotError, PlotResult};
pub use session::PlotSession;

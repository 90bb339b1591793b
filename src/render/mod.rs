pub mod label;
pub mod replay;
pub mod state;
pub mod transform;

pub use replay::Replayer;
pub use state::PlotterState;

pub mod settings;

pub use settings::PlotterConfig;

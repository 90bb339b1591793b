use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Bytecode buffer could not grow to {requested} bytes")]
    Allocation { requested: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("PNG export error: {0}")]
    Png(String),

    #[error("PDF export error: {0}")]
    Pdf(String),

    #[error("Serial error: {0}")]
    Serial(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

pub type PlotResult<T> = Result<T, PlotError>;

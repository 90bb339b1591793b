pub mod args;
pub mod charset;
pub mod commands;
pub mod parser;
pub mod types;

pub use commands::{NoReplies, ReplySink};
pub use parser::ParserSession;

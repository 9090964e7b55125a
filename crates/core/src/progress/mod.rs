//! Progress parsing for extraction tool output.

mod parser;

pub use parser::{ProgressParser, ProgressSnapshot};

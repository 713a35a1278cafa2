// Text-format `.chart` parsing and interpretation.

mod error;
mod parser;
mod song_builder;

pub use error::ChartError;
pub use parser::{Chart, ChartEvent, ChartSection, parse_chart};
pub use song_builder::{collect_warnings, song_from_chart};

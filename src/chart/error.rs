use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("line {line}: expected a section header, found {found:?}")]
    ExpectedSectionHeader { line: usize, found: String },

    #[error("line {line}: expected '{{' to open section [{section}]")]
    UnopenedSection { line: usize, section: String },

    #[error("section [{section}] is never closed")]
    UnclosedSection { section: String },

    #[error("malformed note event at tick {tick}: {event:?}")]
    MalformedNote { tick: u32, event: String },

    #[error("note code {code} at tick {tick} is out of range")]
    InvalidNoteCode { tick: u32, code: i64 },

    #[error(transparent)]
    Song(#[from] crate::model::SongError),
}

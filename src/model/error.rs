use thiserror::Error;

/// Fatal errors detected while constructing or processing a song.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SongError {
    #[error("speedup must be positive, got {0}%")]
    InvalidSpeedup(i32),

    #[error("chart resolution must be positive")]
    InvalidResolution,

    #[error("note at tick {tick} does not belong to a {family} track")]
    InvalidColour { tick: u32, family: &'static str },

    #[error("squeeze settings out of range: {0}")]
    InvalidSqueeze(&'static str),

    #[error("song has no {instrument} {difficulty} track")]
    MissingTrack {
        instrument: String,
        difficulty: String,
    },

    #[error("score exceeds the representable range")]
    Overflow,

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Recoverable inconsistencies in chart data.
///
/// The offending record is skipped and the warning is surfaced alongside the
/// result; nothing here aborts processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("star power phrase at tick {0} covers no notes")]
    PhraseWithoutNotes(u32),

    #[error("star power phrase at tick {0} overlaps an earlier phrase")]
    OverlappingPhrase(u32),

    #[error("solo at tick {start} ends at {end}, before it starts")]
    NegativeSolo { start: u32, end: u32 },

    #[error("drum fill at tick {start} ends at {end}, before it starts")]
    NegativeDrumFill { start: u32, end: u32 },
}

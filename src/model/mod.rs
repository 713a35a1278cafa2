// Domain types: songs, note tracks, and sync data.

mod error;
mod note;
mod song;
mod sync;
mod track;

pub use error::{SongError, Warning};
pub use note::{DrumColour, FiveFretColour, Note, NoteColour, SixFretColour, TrackType};
pub use song::{Difficulty, Instrument, Song, SongGlobalData};
pub use sync::{BpmEvent, SyncTrack, TimeSigEvent};
pub use track::{BigRockEnding, DiscoFlip, DrumFill, NoteTrack, Solo, StarPowerPhrase};

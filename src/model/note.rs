use serde::{Deserialize, Serialize};

use crate::timing::Tick;

/// Fret family of a note track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrackType {
    FiveFret,
    SixFret,
    Drums,
}

/// Colour of a five-fret guitar/bass note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FiveFretColour {
    Green,
    Red,
    Yellow,
    Blue,
    Orange,
    Open,
}

/// Colour of a six-fret (GHL) note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SixFretColour {
    WhiteLow,
    WhiteMid,
    WhiteHigh,
    BlackLow,
    BlackMid,
    BlackHigh,
    Open,
}

/// Pad or kick of a drum note. Cymbal variants are the pro-drums form of
/// their pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrumColour {
    Red,
    Yellow,
    Blue,
    Green,
    YellowCymbal,
    BlueCymbal,
    GreenCymbal,
    Kick,
    DoubleKick,
}

impl DrumColour {
    pub fn is_kick(self) -> bool {
        matches!(self, DrumColour::Kick | DrumColour::DoubleKick)
    }

    pub fn is_cymbal(self) -> bool {
        matches!(
            self,
            DrumColour::YellowCymbal | DrumColour::BlueCymbal | DrumColour::GreenCymbal
        )
    }
}

/// Colour of a note, one variant per fret family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteColour {
    FiveFret(FiveFretColour),
    SixFret(SixFretColour),
    Drum(DrumColour),
}

impl NoteColour {
    /// The track family this colour belongs to.
    pub fn track_type(self) -> TrackType {
        match self {
            NoteColour::FiveFret(_) => TrackType::FiveFret,
            NoteColour::SixFret(_) => TrackType::SixFret,
            NoteColour::Drum(_) => TrackType::Drums,
        }
    }
}

/// A single note in a chart.
///
/// `length` is zero for non-sustains. Tap and forced-HOPO flags do not affect
/// scoring but are preserved for downstream rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub position: Tick,
    pub length: Tick,
    pub colour: NoteColour,
    pub is_tap: bool,
    pub is_forced: bool,
}

impl Note {
    /// Create a plain five-fret note with no sustain.
    pub fn five_fret(position: u32, colour: FiveFretColour) -> Self {
        Self {
            position: Tick(position),
            length: Tick(0),
            colour: NoteColour::FiveFret(colour),
            is_tap: false,
            is_forced: false,
        }
    }

    /// Create a sustained five-fret note.
    pub fn five_fret_sustain(position: u32, length: u32, colour: FiveFretColour) -> Self {
        Self {
            position: Tick(position),
            length: Tick(length),
            colour: NoteColour::FiveFret(colour),
            is_tap: false,
            is_forced: false,
        }
    }

    /// Create a drum note.
    pub fn drum(position: u32, colour: DrumColour) -> Self {
        Self {
            position: Tick(position),
            length: Tick(0),
            colour: NoteColour::Drum(colour),
            is_tap: false,
            is_forced: false,
        }
    }

    /// Tick one past the end of the sustain.
    pub fn end(&self) -> Tick {
        Tick(self.position.0 + self.length.0)
    }

    pub fn is_sustain(&self) -> bool {
        self.length.0 > 0
    }
}

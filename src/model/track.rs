use serde::{Deserialize, Serialize};

use crate::model::error::{SongError, Warning};
use crate::model::note::{Note, TrackType};
use crate::timing::Tick;

/// Half-open tick interval `[position, position + length)` whose notes award
/// 0.25 SP when all of them are hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarPowerPhrase {
    pub position: Tick,
    pub length: Tick,
}

impl StarPowerPhrase {
    pub fn new(position: u32, length: u32) -> Self {
        Self {
            position: Tick(position),
            length: Tick(length),
        }
    }

    pub fn end(&self) -> Tick {
        Tick(self.position.0 + self.length.0)
    }

    pub fn contains(&self, tick: Tick) -> bool {
        tick >= self.position && tick < self.end()
    }
}

/// Solo section with a fixed bonus awarded at its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solo {
    pub start: Tick,
    pub end: Tick,
    pub value: u32,
}

/// Tick interval that gates drum SP activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumFill {
    pub start: Tick,
    pub end: Tick,
}

/// Disco-flip marker; scoring-neutral, preserved for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoFlip {
    pub start: Tick,
    pub end: Tick,
}

/// Big rock ending region. Kept as a hook; it contributes no points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigRockEnding {
    pub start: Tick,
    pub end: Tick,
}

/// Immutable note data for one instrument and difficulty.
///
/// Construction sorts notes by position, merges duplicates at the same tick
/// and colour (the longer sustain wins), and drops inconsistent phrases,
/// solos, and fills while collecting warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTrack {
    track_type: TrackType,
    notes: Vec<Note>,
    sp_phrases: Vec<StarPowerPhrase>,
    solos: Vec<Solo>,
    drum_fills: Vec<DrumFill>,
    disco_flips: Vec<DiscoFlip>,
    bre: Option<BigRockEnding>,
    #[serde(skip)]
    warnings: Vec<Warning>,
}

impl NoteTrack {
    pub fn new(
        track_type: TrackType,
        mut notes: Vec<Note>,
        sp_phrases: Vec<StarPowerPhrase>,
        solos: Vec<Solo>,
    ) -> Result<Self, SongError> {
        for note in &notes {
            if note.colour.track_type() != track_type {
                return Err(SongError::InvalidColour {
                    tick: note.position.0,
                    family: match track_type {
                        TrackType::FiveFret => "five-fret",
                        TrackType::SixFret => "six-fret",
                        TrackType::Drums => "drums",
                    },
                });
            }
        }

        notes.sort_by_key(|n| (n.position, n.colour));
        notes.dedup_by(|later, earlier| {
            if later.position == earlier.position && later.colour == earlier.colour {
                earlier.length = earlier.length.max(later.length);
                earlier.is_tap |= later.is_tap;
                earlier.is_forced |= later.is_forced;
                true
            } else {
                false
            }
        });

        let mut warnings = Vec::new();

        let mut sp_phrases: Vec<_> = sp_phrases
            .into_iter()
            .filter(|phrase| {
                let covered = notes
                    .iter()
                    .any(|n| phrase.contains(n.position));
                if !covered {
                    warnings.push(Warning::PhraseWithoutNotes(phrase.position.0));
                }
                covered
            })
            .collect();
        sp_phrases.sort_by_key(|p| p.position);
        let mut last_end = Tick(0);
        sp_phrases.retain(|phrase| {
            if phrase.position < last_end {
                warnings.push(Warning::OverlappingPhrase(phrase.position.0));
                false
            } else {
                last_end = phrase.end();
                true
            }
        });

        let mut solos: Vec<_> = solos
            .into_iter()
            .filter(|solo| {
                if solo.end < solo.start {
                    warnings.push(Warning::NegativeSolo {
                        start: solo.start.0,
                        end: solo.end.0,
                    });
                    false
                } else {
                    true
                }
            })
            .collect();
        solos.sort_by_key(|s| s.start);

        Ok(Self {
            track_type,
            notes,
            sp_phrases,
            solos,
            drum_fills: Vec::new(),
            disco_flips: Vec::new(),
            bre: None,
            warnings,
        })
    }

    pub fn with_drum_fills(mut self, fills: Vec<DrumFill>) -> Self {
        let mut fills: Vec<_> = fills
            .into_iter()
            .filter(|fill| {
                if fill.end < fill.start {
                    self.warnings.push(Warning::NegativeDrumFill {
                        start: fill.start.0,
                        end: fill.end.0,
                    });
                    false
                } else {
                    true
                }
            })
            .collect();
        fills.sort_by_key(|f| f.start);
        self.drum_fills = fills;
        self
    }

    pub fn with_disco_flips(mut self, mut flips: Vec<DiscoFlip>) -> Self {
        flips.sort_by_key(|f| f.start);
        self.disco_flips = flips;
        self
    }

    pub fn with_bre(mut self, bre: BigRockEnding) -> Self {
        self.bre = Some(bre);
        self
    }

    pub fn track_type(&self) -> TrackType {
        self.track_type
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn sp_phrases(&self) -> &[StarPowerPhrase] {
        &self.sp_phrases
    }

    pub fn solos(&self) -> &[Solo] {
        &self.solos
    }

    pub fn drum_fills(&self) -> &[DrumFill] {
        &self.drum_fills
    }

    pub fn disco_flips(&self) -> &[DiscoFlip] {
        &self.disco_flips
    }

    pub fn bre(&self) -> Option<&BigRockEnding> {
        self.bre.as_ref()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::note::FiveFretColour;

    #[test]
    fn notes_are_sorted_and_merged() {
        let track = NoteTrack::new(
            TrackType::FiveFret,
            vec![
                Note::five_fret(1000, FiveFretColour::Red),
                Note::five_fret_sustain(768, 10, FiveFretColour::Green),
                Note::five_fret_sustain(768, 20, FiveFretColour::Green),
            ],
            vec![],
            vec![],
        )
        .unwrap();

        assert_eq!(track.notes().len(), 2);
        assert_eq!(track.notes()[0].position, Tick(768));
        assert_eq!(track.notes()[0].length, Tick(20));
        assert_eq!(track.notes()[1].position, Tick(1000));
    }

    #[test]
    fn wrong_family_is_fatal() {
        let result = NoteTrack::new(
            TrackType::Drums,
            vec![Note::five_fret(768, FiveFretColour::Green)],
            vec![],
            vec![],
        );
        assert!(matches!(result, Err(SongError::InvalidColour { .. })));
    }

    #[test]
    fn phrase_without_notes_is_skipped_with_warning() {
        let track = NoteTrack::new(
            TrackType::FiveFret,
            vec![Note::five_fret(768, FiveFretColour::Green)],
            vec![
                StarPowerPhrase::new(768, 100),
                StarPowerPhrase::new(2000, 100),
            ],
            vec![],
        )
        .unwrap();

        assert_eq!(track.sp_phrases().len(), 1);
        assert_eq!(
            track.warnings(),
            &[Warning::PhraseWithoutNotes(2000)]
        );
    }

    #[test]
    fn overlapping_phrase_is_skipped_with_warning() {
        let track = NoteTrack::new(
            TrackType::FiveFret,
            vec![
                Note::five_fret(768, FiveFretColour::Green),
                Note::five_fret(800, FiveFretColour::Red),
            ],
            vec![
                StarPowerPhrase::new(768, 100),
                StarPowerPhrase::new(800, 100),
            ],
            vec![],
        )
        .unwrap();

        assert_eq!(track.sp_phrases().len(), 1);
        assert_eq!(track.sp_phrases()[0].position, Tick(768));
        assert_eq!(track.warnings(), &[Warning::OverlappingPhrase(800)]);
    }

    #[test]
    fn backwards_solo_is_skipped_with_warning() {
        let track = NoteTrack::new(
            TrackType::FiveFret,
            vec![Note::five_fret(768, FiveFretColour::Green)],
            vec![],
            vec![Solo {
                start: Tick(800),
                end: Tick(700),
                value: 100,
            }],
        )
        .unwrap();

        assert!(track.solos().is_empty());
        assert_eq!(
            track.warnings(),
            &[Warning::NegativeSolo { start: 800, end: 700 }]
        );
    }
}

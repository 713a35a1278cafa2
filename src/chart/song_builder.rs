use std::collections::BTreeMap;

use tracing::debug;

use crate::chart::error::ChartError;
use crate::chart::parser::{Chart, ChartSection};
use crate::model::{
    Difficulty, DrumColour, DrumFill, FiveFretColour, Instrument, Note, NoteColour, NoteTrack,
    SixFretColour, Solo, Song, StarPowerPhrase, SyncTrack, TimeSigEvent, TrackType,
};
use crate::model::{BpmEvent, Warning};
use crate::timing::Tick;

/// Bonus points per note inside a solo section.
const SOLO_VALUE_PER_NOTE: u32 = 100;

const DIFFICULTIES: [(&str, Difficulty); 4] = [
    ("Easy", Difficulty::Easy),
    ("Medium", Difficulty::Medium),
    ("Hard", Difficulty::Hard),
    ("Expert", Difficulty::Expert),
];

const INSTRUMENTS: [(&str, Instrument, TrackType); 8] = [
    ("Single", Instrument::Guitar, TrackType::FiveFret),
    ("DoubleGuitar", Instrument::GuitarCoop, TrackType::FiveFret),
    ("DoubleBass", Instrument::Bass, TrackType::FiveFret),
    ("DoubleRhythm", Instrument::Rhythm, TrackType::FiveFret),
    ("Keyboard", Instrument::Keys, TrackType::FiveFret),
    ("GHLGuitar", Instrument::GhlGuitar, TrackType::SixFret),
    ("GHLBass", Instrument::GhlBass, TrackType::SixFret),
    ("Drums", Instrument::Drums, TrackType::Drums),
];

/// Interpret a parsed chart as a [`Song`].
///
/// Unknown sections and event types are ignored the way the game ignores
/// them; out-of-range note codes are fatal.
pub fn song_from_chart(chart: &Chart) -> Result<Song, ChartError> {
    let sync = sync_track_from(chart.section("SyncTrack"));
    let mut song = Song::new(chart.resolution(), sync)?;
    if let Some(section) = chart.section("Song") {
        let global = song.global_data_mut();
        if let Some(name) = section.key_value_pairs.get("Name") {
            global.name = name.clone();
        }
        if let Some(artist) = section.key_value_pairs.get("Artist") {
            global.artist = artist.clone();
        }
        if let Some(charter) = section.key_value_pairs.get("Charter") {
            global.charter = charter.clone();
        }
    }

    for section in &chart.sections {
        let Some((difficulty, instrument, track_type)) = classify_track(&section.name) else {
            continue;
        };
        let track = note_track_from(section, track_type)?;
        debug!(
            section = section.name.as_str(),
            notes = track.notes().len(),
            "parsed track"
        );
        song.add_note_track(instrument, difficulty, track);
    }

    Ok(song)
}

fn classify_track(name: &str) -> Option<(Difficulty, Instrument, TrackType)> {
    for (prefix, difficulty) in DIFFICULTIES {
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };
        for (suffix, instrument, track_type) in INSTRUMENTS {
            if rest == suffix {
                return Some((difficulty, instrument, track_type));
            }
        }
    }
    None
}

fn sync_track_from(section: Option<&ChartSection>) -> SyncTrack {
    let mut bpms = Vec::new();
    let mut time_sigs = Vec::new();
    if let Some(section) = section {
        for event in &section.events {
            let mut fields = event.data.split_whitespace();
            match event.event_type.as_str() {
                "B" => {
                    if let Some(bpm) = fields.next().and_then(|f| f.parse().ok()) {
                        bpms.push(BpmEvent {
                            position: Tick(event.position),
                            bpm,
                        });
                    }
                }
                "TS" => {
                    let numerator = fields.next().and_then(|f| f.parse().ok());
                    // The optional second field is the denominator's power of
                    // two; absent means 4/x -> x = 4.
                    let denominator = fields
                        .next()
                        .and_then(|f| f.parse::<u32>().ok())
                        .map_or(4, |power| 2_u32.saturating_pow(power));
                    if let Some(numerator) = numerator {
                        time_sigs.push(TimeSigEvent {
                            position: Tick(event.position),
                            numerator,
                            denominator,
                        });
                    }
                }
                _ => {}
            }
        }
    }
    SyncTrack::new(time_sigs, bpms)
}

struct PendingNote {
    length: u32,
    colour: NoteColour,
}

fn note_track_from(section: &ChartSection, track_type: TrackType) -> Result<NoteTrack, ChartError> {
    // Forced/tap codes arrive as sibling events of the notes they modify, so
    // notes are grouped per tick before flags are applied.
    let mut pending: BTreeMap<u32, Vec<PendingNote>> = BTreeMap::new();
    let mut forced_ticks = Vec::new();
    let mut tap_ticks = Vec::new();
    let mut cymbal_ticks: Vec<(u32, DrumColour)> = Vec::new();
    let mut phrases = Vec::new();
    let mut fills = Vec::new();
    let mut solo_starts = Vec::new();
    let mut solo_spans = Vec::new();

    for event in &section.events {
        match event.event_type.as_str() {
            "N" => {
                let mut fields = event.data.split_whitespace();
                let (Some(Ok(code)), Some(Ok(length))) = (
                    fields.next().map(str::parse::<i64>),
                    fields.next().map(str::parse::<u32>),
                ) else {
                    return Err(ChartError::MalformedNote {
                        tick: event.position,
                        event: format!("N {}", event.data),
                    });
                };
                match note_code(code, track_type, event.position)? {
                    NoteCode::Colour(colour) => {
                        pending
                            .entry(event.position)
                            .or_default()
                            .push(PendingNote { length, colour });
                    }
                    NoteCode::Forced => forced_ticks.push(event.position),
                    NoteCode::Tap => tap_ticks.push(event.position),
                    NoteCode::Cymbal(pad) => cymbal_ticks.push((event.position, pad)),
                }
            }
            "S" => {
                let mut fields = event.data.split_whitespace();
                let kind = fields.next().and_then(|f| f.parse::<u32>().ok());
                let length = fields.next().and_then(|f| f.parse::<u32>().ok());
                match (kind, length) {
                    (Some(2), Some(length)) => {
                        phrases.push(StarPowerPhrase::new(event.position, length));
                    }
                    (Some(64), Some(length)) => fills.push(DrumFill {
                        start: Tick(event.position),
                        end: Tick(event.position + length),
                    }),
                    _ => {}
                }
            }
            "E" => match event.data.as_str() {
                "solo" => solo_starts.push(event.position),
                "soloend" => {
                    if let Some(start) = solo_starts.pop() {
                        solo_spans.push((start, event.position));
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    for (tick, pad) in cymbal_ticks {
        if let Some(notes) = pending.get_mut(&tick) {
            for note in notes {
                if note.colour == NoteColour::Drum(pad) {
                    note.colour = NoteColour::Drum(match pad {
                        DrumColour::Yellow => DrumColour::YellowCymbal,
                        DrumColour::Blue => DrumColour::BlueCymbal,
                        _ => DrumColour::GreenCymbal,
                    });
                }
            }
        }
    }

    let mut notes = Vec::new();
    for (tick, group) in &pending {
        let is_forced = forced_ticks.contains(tick);
        let is_tap = tap_ticks.contains(tick);
        for note in group {
            notes.push(Note {
                position: Tick(*tick),
                length: Tick(note.length),
                colour: note.colour,
                is_tap,
                is_forced,
            });
        }
    }

    let solos = solo_spans
        .into_iter()
        .map(|(start, end)| {
            let count = notes
                .iter()
                .filter(|n| n.position.0 >= start && n.position.0 <= end)
                .count() as u32;
            Solo {
                start: Tick(start),
                end: Tick(end),
                value: count * SOLO_VALUE_PER_NOTE,
            }
        })
        .collect();

    let track = NoteTrack::new(track_type, notes, phrases, solos)?;
    Ok(if track_type == TrackType::Drums {
        track.with_drum_fills(fills)
    } else {
        track
    })
}

enum NoteCode {
    Colour(NoteColour),
    Forced,
    Tap,
    Cymbal(DrumColour),
}

fn note_code(code: i64, track_type: TrackType, tick: u32) -> Result<NoteCode, ChartError> {
    let colour = match track_type {
        TrackType::FiveFret => match code {
            0 => NoteColour::FiveFret(FiveFretColour::Green),
            1 => NoteColour::FiveFret(FiveFretColour::Red),
            2 => NoteColour::FiveFret(FiveFretColour::Yellow),
            3 => NoteColour::FiveFret(FiveFretColour::Blue),
            4 => NoteColour::FiveFret(FiveFretColour::Orange),
            5 => return Ok(NoteCode::Forced),
            6 => return Ok(NoteCode::Tap),
            7 => NoteColour::FiveFret(FiveFretColour::Open),
            _ => return Err(ChartError::InvalidNoteCode { tick, code }),
        },
        TrackType::SixFret => match code {
            0 => NoteColour::SixFret(SixFretColour::WhiteLow),
            1 => NoteColour::SixFret(SixFretColour::WhiteMid),
            2 => NoteColour::SixFret(SixFretColour::WhiteHigh),
            3 => NoteColour::SixFret(SixFretColour::BlackLow),
            4 => NoteColour::SixFret(SixFretColour::BlackMid),
            5 => return Ok(NoteCode::Forced),
            6 => return Ok(NoteCode::Tap),
            7 => NoteColour::SixFret(SixFretColour::Open),
            8 => NoteColour::SixFret(SixFretColour::BlackHigh),
            _ => return Err(ChartError::InvalidNoteCode { tick, code }),
        },
        TrackType::Drums => match code {
            0 => NoteColour::Drum(DrumColour::Kick),
            1 => NoteColour::Drum(DrumColour::Red),
            2 => NoteColour::Drum(DrumColour::Yellow),
            3 => NoteColour::Drum(DrumColour::Blue),
            4 => NoteColour::Drum(DrumColour::Green),
            32 => NoteColour::Drum(DrumColour::DoubleKick),
            66 => return Ok(NoteCode::Cymbal(DrumColour::Yellow)),
            67 => return Ok(NoteCode::Cymbal(DrumColour::Blue)),
            68 => return Ok(NoteCode::Cymbal(DrumColour::Green)),
            _ => return Err(ChartError::InvalidNoteCode { tick, code }),
        },
    };
    Ok(NoteCode::Colour(colour))
}

/// Warnings collected across every track of a song.
pub fn collect_warnings(song: &Song) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for instrument in song.instruments() {
        for difficulty in song.difficulties(instrument) {
            if let Some(track) = song.note_track(instrument, difficulty) {
                warnings.extend_from_slice(track.warnings());
            }
        }
    }
    warnings
}

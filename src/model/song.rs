use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::error::SongError;
use crate::model::sync::SyncTrack;
use crate::model::track::NoteTrack;
use crate::timing::Tick;

/// Instruments a chart can carry tracks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Guitar,
    GuitarCoop,
    Bass,
    Rhythm,
    Keys,
    GhlGuitar,
    GhlBass,
    Drums,
}

/// Chart difficulties, easiest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

/// Chart-wide data shared by every track.
#[derive(Debug, Clone)]
pub struct SongGlobalData {
    pub name: String,
    pub artist: String,
    pub charter: String,
    pub resolution: u32,
    pub sync_track: SyncTrack,
}

impl SongGlobalData {
    fn new(resolution: u32, sync_track: SyncTrack) -> Self {
        Self {
            name: String::new(),
            artist: String::new(),
            charter: String::new(),
            resolution,
            sync_track,
        }
    }
}

/// A parsed chart: global data plus note tracks per instrument and
/// difficulty. Immutable input to the optimiser apart from `speedup`.
#[derive(Debug, Clone)]
pub struct Song {
    global: SongGlobalData,
    tracks: BTreeMap<(Instrument, Difficulty), NoteTrack>,
}

impl Song {
    pub fn new(resolution: u32, sync_track: SyncTrack) -> Result<Self, SongError> {
        if resolution == 0 {
            return Err(SongError::InvalidResolution);
        }
        Ok(Self {
            global: SongGlobalData::new(resolution, sync_track),
            tracks: BTreeMap::new(),
        })
    }

    pub fn global_data(&self) -> &SongGlobalData {
        &self.global
    }

    pub fn global_data_mut(&mut self) -> &mut SongGlobalData {
        &mut self.global
    }

    pub fn resolution(&self) -> u32 {
        self.global.resolution
    }

    pub fn add_note_track(
        &mut self,
        instrument: Instrument,
        difficulty: Difficulty,
        track: NoteTrack,
    ) {
        self.tracks.insert((instrument, difficulty), track);
    }

    pub fn note_track(&self, instrument: Instrument, difficulty: Difficulty) -> Option<&NoteTrack> {
        self.tracks.get(&(instrument, difficulty))
    }

    /// Instruments with at least one track, in instrument order.
    pub fn instruments(&self) -> Vec<Instrument> {
        let set: BTreeSet<_> = self.tracks.keys().map(|(i, _)| *i).collect();
        set.into_iter().collect()
    }

    /// Difficulties present for an instrument, easiest first.
    pub fn difficulties(&self, instrument: Instrument) -> Vec<Difficulty> {
        self.tracks
            .keys()
            .filter(|(i, _)| *i == instrument)
            .map(|(_, d)| *d)
            .collect()
    }

    /// Start ticks of phrases present on two or more instruments.
    ///
    /// Phrase lengths may differ between the instruments; only the start tick
    /// has to coincide.
    pub fn unison_phrase_positions(&self) -> Vec<Tick> {
        let mut instruments_by_tick: BTreeMap<Tick, BTreeSet<Instrument>> = BTreeMap::new();
        for ((instrument, _), track) in &self.tracks {
            for phrase in track.sp_phrases() {
                instruments_by_tick
                    .entry(phrase.position)
                    .or_default()
                    .insert(*instrument);
            }
        }
        instruments_by_tick
            .into_iter()
            .filter(|(_, instruments)| instruments.len() >= 2)
            .map(|(tick, _)| tick)
            .collect()
    }

    /// Speed the song up (or down) by a percentage: every BPM is multiplied
    /// by `percent / 100` and the name gains a "(P%)" suffix. 100 is a no-op.
    pub fn speedup(&mut self, percent: i32) -> Result<(), SongError> {
        if percent <= 0 {
            return Err(SongError::InvalidSpeedup(percent));
        }
        if percent == 100 {
            return Ok(());
        }
        self.global.sync_track.scale_tempo(percent);
        self.global.name = format!("{} ({percent}%)", self.global.name);
        Ok(())
    }
}

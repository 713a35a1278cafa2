use tracing::debug;

use crate::engine::Engine;
use crate::model::{Difficulty, Instrument, Song, SongError, Warning};
use crate::points::PointSet;
use crate::settings::{DrumSettings, SqueezeSettings};
use crate::sp::SpData;
use crate::timing::{Tick, TimeConverter};

/// Everything the path search needs for one track: the converter, SP data,
/// and point set, plus the bonus tables added outside the search.
///
/// Built once from a [`Song`] and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ProcessedSong {
    engine: Engine,
    converter: TimeConverter,
    sp_data: SpData,
    points: PointSet,
    unison_ticks: Vec<Tick>,
    warnings: Vec<Warning>,
}

impl ProcessedSong {
    /// Validate the inputs and precompute the search data.
    ///
    /// `speed_percent` multiplies every BPM; squeeze settings in seconds stay
    /// in real time, so scaling the tempo map is the whole speedup. Fails
    /// fast on non-positive speed, out-of-range squeeze settings, and missing
    /// tracks; inconsistencies in the track itself were already downgraded to
    /// warnings, which are surfaced here.
    pub fn build(
        song: &Song,
        instrument: Instrument,
        difficulty: Difficulty,
        engine: Engine,
        squeeze: SqueezeSettings,
        drums: DrumSettings,
        speed_percent: i32,
    ) -> Result<Self, SongError> {
        if speed_percent <= 0 {
            return Err(SongError::InvalidSpeedup(speed_percent));
        }
        squeeze.validate()?;
        let track =
            song.note_track(instrument, difficulty)
                .ok_or_else(|| SongError::MissingTrack {
                    instrument: format!("{instrument:?}"),
                    difficulty: format!("{difficulty:?}"),
                })?;

        let resolution = song.resolution();
        let sync = &song.global_data().sync_track;
        let converter = TimeConverter::new(sync, resolution, engine, speed_percent);
        let unison_ticks = song.unison_phrase_positions();
        let sp_data = SpData::new(track, sync, &converter, resolution, engine, &squeeze);
        let points = PointSet::new(
            track,
            &converter,
            resolution,
            engine,
            &squeeze,
            &drums,
            &unison_ticks,
        );
        let warnings = track.warnings().to_vec();

        debug!(
            points = points.len(),
            phrases = track.sp_phrases().len(),
            solos = track.solos().len(),
            "processed song built"
        );

        Ok(Self {
            engine,
            converter,
            sp_data,
            points,
            unison_ticks,
            warnings,
        })
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn converter(&self) -> &TimeConverter {
        &self.converter
    }

    pub fn sp_data(&self) -> &SpData {
        &self.sp_data
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Start ticks of phrases shared across instruments.
    pub fn unison_ticks(&self) -> &[Tick] {
        &self.unison_ticks
    }

    /// Inconsistencies skipped while reading the track.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Streak-multiplied score of every point with no SP, before solos.
    pub fn base_score(&self) -> Result<u64, SongError> {
        self.points.base_score().ok_or(SongError::Overflow)
    }

    /// Total of the solo bonuses, all assumed collected.
    pub fn solo_total(&self) -> Result<u64, SongError> {
        self.points
            .solo_bonuses()
            .iter()
            .try_fold(0_u64, |acc, s| acc.checked_add(u64::from(s.value)))
            .ok_or(SongError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FiveFretColour, Note, NoteTrack, StarPowerPhrase, SyncTrack, TrackType,
    };

    fn one_note_song() -> Song {
        let mut song = Song::new(192, SyncTrack::default()).unwrap();
        let track = NoteTrack::new(
            TrackType::FiveFret,
            vec![Note::five_fret(768, FiveFretColour::Green)],
            vec![StarPowerPhrase::new(768, 100)],
            vec![],
        )
        .unwrap();
        song.add_note_track(Instrument::Guitar, Difficulty::Expert, track);
        song
    }

    #[test]
    fn build_rejects_non_positive_speed() {
        let song = one_note_song();
        let result = ProcessedSong::build(
            &song,
            Instrument::Guitar,
            Difficulty::Expert,
            Engine::Ch,
            SqueezeSettings::optimal(),
            DrumSettings::default(),
            0,
        );
        assert_eq!(result.unwrap_err(), SongError::InvalidSpeedup(0));
    }

    #[test]
    fn build_rejects_missing_track() {
        let song = one_note_song();
        let result = ProcessedSong::build(
            &song,
            Instrument::Bass,
            Difficulty::Expert,
            Engine::Ch,
            SqueezeSettings::optimal(),
            DrumSettings::default(),
            100,
        );
        assert!(matches!(result, Err(SongError::MissingTrack { .. })));
    }

    #[test]
    fn build_produces_points_and_base_score() {
        let song = one_note_song();
        let processed = ProcessedSong::build(
            &song,
            Instrument::Guitar,
            Difficulty::Expert,
            Engine::Ch,
            SqueezeSettings::optimal(),
            DrumSettings::default(),
            100,
        )
        .unwrap();

        assert_eq!(processed.points().len(), 1);
        assert_eq!(processed.base_score().unwrap(), 50);
        assert_eq!(processed.solo_total().unwrap(), 0);
    }
}

use std::collections::HashMap;

use tracing::debug;

use crate::model::SongError;
use crate::processed::ProcessedSong;
use crate::sp::{MEASURES_PER_BAR, MINIMUM_SP_AMOUNT, SpBar};
use crate::timing::{Beat, Measure};

/// Grid the SP bar is rounded to for memoisation keys.
const SP_GRID: f64 = 10_000.0;

/// One SP activation: the contiguous range of points collected while SP was
/// active, with the beat it was engaged at and the beat SP ran out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation {
    pub act_start: usize,
    pub act_end: usize,
    pub engage_beat: Beat,
    pub end_beat: Beat,
}

/// An activation schedule and its scores.
///
/// Activations are ordered with strictly increasing, non-overlapping point
/// ranges. `score_boost` is the extra score SP contributes on top of the
/// base score; `total_score` includes base, boost, and solo bonuses.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub activations: Vec<Activation>,
    pub score_boost: u64,
    pub total_score: u64,
}

impl Path {
    fn empty(total_score: u64) -> Self {
        Self {
            activations: Vec::new(),
            score_boost: 0,
            total_score,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SubPath {
    boost: u64,
    activations: Vec<Activation>,
}

type CacheKey = (usize, i64, i64);
type Cache = HashMap<CacheKey, SubPath>;

/// Branch-and-bound search for the activation schedule with the highest
/// score.
///
/// States are (next point, SP bar); the bar is quantised onto a fixed grid
/// for the memo table. Whammy between activations accrues from the state's
/// point, phrases passed add a quarter bar, and each candidate start is
/// expanded into the contiguous prefix of feasible end points.
#[derive(Debug)]
pub struct Optimiser<'a> {
    song: &'a ProcessedSong,
    /// boost_prefix[i] is the SP contribution of points [0, i): a collected
    /// point scores at a flat 4x while SP is active, so its boost over the
    /// base score is value × (4 − multiplier).
    boost_prefix: Vec<u64>,
}

impl<'a> Optimiser<'a> {
    pub fn new(song: &'a ProcessedSong) -> Result<Self, SongError> {
        let mut boost_prefix = Vec::with_capacity(song.points().len() + 1);
        let mut total = 0_u64;
        boost_prefix.push(0);
        for point in song.points().points() {
            let value = u64::from(point.value)
                .checked_mul(u64::from(4 - point.multiplier.min(4)))
                .ok_or(SongError::Overflow)?;
            total = total.checked_add(value).ok_or(SongError::Overflow)?;
            boost_prefix.push(total);
        }
        Ok(Self { song, boost_prefix })
    }

    /// Run the search and return the best path found.
    pub fn optimal_path(&self) -> Result<Path, SongError> {
        let empty_total = self.path_total(0)?;
        if self.song.points().is_empty() {
            return Ok(Path::empty(empty_total));
        }

        let mut cache = Cache::new();
        let best = self.best_from(0, SpBar::empty(), &mut cache);
        debug!(
            activations = best.activations.len(),
            boost = best.boost,
            states = cache.len(),
            "path search finished"
        );

        let total = self.path_total(best.boost)?;
        let path = Path {
            activations: best.activations,
            score_boost: best.boost,
            total_score: total,
        };
        self.check_ordering(&path)?;
        Ok(path)
    }

    /// Recompute a path's total score from scratch.
    pub fn score(&self, path: &Path) -> Result<u64, SongError> {
        self.check_ordering(path)?;
        let mut boost = 0_u64;
        for act in &path.activations {
            boost = boost
                .checked_add(self.segment_boost(act.act_start, act.act_end))
                .ok_or(SongError::Overflow)?;
        }
        self.path_total(boost)
    }

    fn path_total(&self, boost: u64) -> Result<u64, SongError> {
        let base = self.song.base_score()?;
        let solos = self.song.solo_total()?;
        let total = base
            .checked_add(solos)
            .and_then(|t| t.checked_add(boost))
            .ok_or(SongError::Overflow)?;
        // Scores stay representable as a signed 64-bit integer.
        if total > i64::MAX as u64 {
            return Err(SongError::Overflow);
        }
        Ok(total)
    }

    fn check_ordering(&self, path: &Path) -> Result<(), SongError> {
        let n = self.song.points().len();
        let mut previous_end: Option<usize> = None;
        for act in &path.activations {
            if act.act_end < act.act_start || act.act_end >= n {
                return Err(SongError::Internal(format!(
                    "activation range {}..{} out of order",
                    act.act_start, act.act_end
                )));
            }
            if let Some(end) = previous_end {
                if act.act_start <= end {
                    return Err(SongError::Internal(format!(
                        "activation at point {} overlaps the previous one",
                        act.act_start
                    )));
                }
            }
            previous_end = Some(act.act_end);
        }
        Ok(())
    }

    fn segment_boost(&self, start: usize, end: usize) -> u64 {
        self.boost_prefix[end + 1] - self.boost_prefix[start]
    }

    fn quantise(bar: SpBar) -> (i64, i64) {
        (
            (bar.min * SP_GRID).round() as i64,
            (bar.max * SP_GRID).round() as i64,
        )
    }

    /// Best tail from `start_idx` holding `bar` on arrival there.
    fn best_from(&self, start_idx: usize, bar: SpBar, cache: &mut Cache) -> SubPath {
        let points = self.song.points().points();
        if start_idx >= points.len() {
            return SubPath::default();
        }
        let (min_q, max_q) = Self::quantise(bar);
        let key = (start_idx, min_q, max_q);
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }

        let engine = self.song.engine();
        let mut best = SubPath::default();
        let mut running = bar;
        for j in start_idx..points.len() {
            if j > start_idx {
                let passed = &points[j - 1];
                if passed.is_sp_granting {
                    running.add_phrase();
                    if passed.is_unison_granting && engine.has_unison_bonuses() {
                        running.add_phrase();
                    }
                }
            }
            // Nothing starting here or later can beat the best found.
            if self.segment_boost(j, points.len() - 1) <= best.boost {
                break;
            }
            if !points[j].is_activation_eligible {
                continue;
            }

            let mut candidate_bar = running;
            let whammy = self
                .song
                .sp_data()
                .available_whammy(points[start_idx].position.beat, points[j].position.beat);
            candidate_bar.max = (candidate_bar.max + whammy).min(1.0);
            if !candidate_bar.full_enough_to_activate() {
                continue;
            }

            for (act, next_idx) in self.candidate_activations(j, candidate_bar) {
                let tail = self.best_from(next_idx, SpBar::empty(), cache);
                let boost = self.segment_boost(act.act_start, act.act_end) + tail.boost;
                if Self::prefer(boost, &act, &tail, &best) {
                    let mut activations = Vec::with_capacity(tail.activations.len() + 1);
                    activations.push(act);
                    activations.extend_from_slice(&tail.activations);
                    best = SubPath { boost, activations };
                }
            }
        }

        cache.insert(key, best.clone());
        best
    }

    /// Tie-breaking: higher boost, then the earlier first activation, then
    /// fewer activations.
    fn prefer(boost: u64, act: &Activation, tail: &SubPath, best: &SubPath) -> bool {
        if boost != best.boost {
            return boost > best.boost;
        }
        match best.activations.first() {
            None => false,
            Some(first) => {
                if act.act_start != first.act_start {
                    act.act_start < first.act_start
                } else {
                    tail.activations.len() + 1 < best.activations.len()
                }
            }
        }
    }

    /// All feasible activations starting at point `j` with `bar` on hand.
    ///
    /// SP engages at the latest beat of `j`'s hit window and each later point
    /// must stay reachable at the earliest beat of its own window. An end is
    /// feasible when withholding whammy lets SP die before the next point;
    /// the walk stops at the first point SP cannot reach.
    fn candidate_activations(&self, j: usize, bar: SpBar) -> Vec<(Activation, usize)> {
        let points = self.song.points().points();
        let engine = self.song.engine();
        let sp_data = self.song.sp_data();

        let mut bar = bar;
        bar.min = bar.min.max(MINIMUM_SP_AMOUNT);
        let engage = points[j].hit_window_end;
        let mut pos = engage;
        if points[j].is_sp_granting {
            bar.add_phrase();
            if points[j].is_unison_granting && engine.has_unison_bonuses() {
                bar.add_phrase();
            }
        }

        let mut candidates = Vec::new();
        for k in j..points.len() {
            let death_measure = pos.measure.0 + bar.min * MEASURES_PER_BAR;
            let feasible_end = match points.get(k + 1) {
                Some(next) => death_measure < next.hit_window_start.measure.0,
                None => true,
            };
            if feasible_end {
                let end_beat = self
                    .song
                    .converter()
                    .measures_to_beats(Measure(death_measure));
                candidates.push((
                    Activation {
                        act_start: j,
                        act_end: k,
                        engage_beat: engage.beat,
                        end_beat,
                    },
                    k + 1,
                ));
            }

            let Some(next) = points.get(k + 1) else {
                break;
            };
            let next_pos = if next.hit_window_start.beat.0 > pos.beat.0 {
                next.hit_window_start
            } else {
                pos
            };
            bar = sp_data.propagate_sp_over_whammy(pos, next_pos, bar);
            if bar.has_failed() {
                break;
            }
            if next.is_sp_granting {
                bar.add_phrase();
                if next.is_unison_granting && engine.has_unison_bonuses() {
                    bar.add_phrase();
                }
            }
            pos = next_pos;
        }
        candidates
    }
}

/// Convenience entry point: build the optimiser and run the search.
pub fn optimise(song: &ProcessedSong) -> Result<Path, SongError> {
    Optimiser::new(song)?.optimal_path()
}

/// Recompute the score of a path against a processed song.
pub fn score(song: &ProcessedSong, path: &Path) -> Result<u64, SongError> {
    Optimiser::new(song)?.score(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::model::{
        Difficulty, FiveFretColour, Instrument, Note, NoteTrack, Song, StarPowerPhrase,
        SyncTrack, TrackType,
    };
    use crate::settings::{DrumSettings, SqueezeSettings};

    fn processed(notes: Vec<Note>, phrases: Vec<StarPowerPhrase>) -> ProcessedSong {
        let mut song = Song::new(192, SyncTrack::default()).unwrap();
        let track = NoteTrack::new(TrackType::FiveFret, notes, phrases, vec![]).unwrap();
        song.add_note_track(Instrument::Guitar, Difficulty::Expert, track);
        ProcessedSong::build(
            &song,
            Instrument::Guitar,
            Difficulty::Expert,
            Engine::Ch,
            SqueezeSettings::optimal(),
            DrumSettings::default(),
            100,
        )
        .unwrap()
    }

    #[test]
    fn no_phrases_gives_the_trivial_path() {
        let song = processed(
            vec![
                Note::five_fret(768, FiveFretColour::Green),
                Note::five_fret(1000, FiveFretColour::Red),
            ],
            vec![],
        );
        let path = optimise(&song).unwrap();

        assert!(path.activations.is_empty());
        assert_eq!(path.score_boost, 0);
        assert_eq!(path.total_score, 100);
    }

    #[test]
    fn empty_point_set_gives_an_empty_path() {
        let song = processed(vec![], vec![]);
        let path = optimise(&song).unwrap();
        assert!(path.activations.is_empty());
        assert_eq!(path.total_score, 0);
    }

    #[test]
    fn two_phrases_enable_one_activation() {
        // Two phrases fill half the bar; the activation should lift the
        // remaining notes to the flat 4x SP multiplier.
        let mut notes = vec![
            Note::five_fret(0, FiveFretColour::Green),
            Note::five_fret(192, FiveFretColour::Red),
        ];
        for i in 2..6 {
            notes.push(Note::five_fret(i * 192, FiveFretColour::Yellow));
        }
        let phrases = vec![StarPowerPhrase::new(0, 50), StarPowerPhrase::new(192, 50)];
        let song = processed(notes, phrases);
        let path = optimise(&song).unwrap();

        assert_eq!(path.activations.len(), 1);
        let act = &path.activations[0];
        // Half a bar covers 16 beats of 4/4, so every note after the second
        // phrase fits under SP.
        assert_eq!(act.act_start, 2);
        assert_eq!(act.act_end, 5);
        // Four 1x points of 50 lift to 4x: 50 * (4 - 1) each.
        assert_eq!(path.score_boost, 600);
        assert_eq!(path.total_score, 300 + 600);
    }

    #[test]
    fn score_matches_the_optimiser_total() {
        let mut notes = vec![
            Note::five_fret(0, FiveFretColour::Green),
            Note::five_fret(192, FiveFretColour::Red),
        ];
        for i in 2..8 {
            notes.push(Note::five_fret(i * 192, FiveFretColour::Yellow));
        }
        let phrases = vec![StarPowerPhrase::new(0, 50), StarPowerPhrase::new(192, 50)];
        let song = processed(notes, phrases);
        let path = optimise(&song).unwrap();

        assert_eq!(score(&song, &path).unwrap(), path.total_score);
    }

    #[test]
    fn optimal_path_never_scores_below_the_empty_path() {
        let song = processed(
            vec![
                Note::five_fret_sustain(0, 1440, FiveFretColour::Green),
                Note::five_fret(1536, FiveFretColour::Red),
            ],
            vec![StarPowerPhrase::new(0, 1441)],
        );
        let path = optimise(&song).unwrap();
        let empty = Path::empty(0);
        let empty_score = song.base_score().unwrap() + song.solo_total().unwrap();

        assert!(path.total_score >= empty_score);
        assert_eq!(score(&song, &empty).unwrap(), empty_score);
    }

    #[test]
    fn score_rejects_overlapping_activations() {
        let song = processed(
            vec![
                Note::five_fret(0, FiveFretColour::Green),
                Note::five_fret(192, FiveFretColour::Red),
            ],
            vec![],
        );
        let bogus = Path {
            activations: vec![
                Activation {
                    act_start: 0,
                    act_end: 1,
                    engage_beat: Beat(0.0),
                    end_beat: Beat(4.0),
                },
                Activation {
                    act_start: 1,
                    act_end: 1,
                    engage_beat: Beat(1.0),
                    end_beat: Beat(5.0),
                },
            ],
            score_boost: 0,
            total_score: 0,
        };
        assert!(matches!(
            score(&song, &bogus),
            Err(SongError::Internal(_))
        ));
    }
}

use crate::engine::Engine;
use crate::model::{NoteTrack, SyncTrack};
use crate::settings::SqueezeSettings;
use crate::timing::{Beat, Position, Second, TimeConverter};

/// SP awarded for a completed phrase.
pub const SP_PHRASE_AMOUNT: f64 = 0.25;

/// Minimum SP required to activate.
pub const MINIMUM_SP_AMOUNT: f64 = 0.5;

/// A full SP bar lasts eight measures of drain.
pub const MEASURES_PER_BAR: f64 = 8.0;

/// The minimum and maximum SP reachable at a given moment.
///
/// The two ends diverge because input-timing squeezes and whammy are
/// optional: `min` assumes the player takes none of them, `max` all of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpBar {
    pub min: f64,
    pub max: f64,
}

impl SpBar {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Award a completed phrase, saturating at a full bar.
    pub fn add_phrase(&mut self) {
        self.min = (self.min + SP_PHRASE_AMOUNT).min(1.0);
        self.max = (self.max + SP_PHRASE_AMOUNT).min(1.0);
    }

    pub fn full_enough_to_activate(&self) -> bool {
        self.max >= MINIMUM_SP_AMOUNT
    }

    /// True once a propagation has determined SP cannot last the range.
    pub fn has_failed(&self) -> bool {
        self.max == f64::NEG_INFINITY
    }

    fn failed(min: f64) -> Self {
        Self::new(min, f64::NEG_INFINITY)
    }
}

#[derive(Debug, Clone, Copy)]
struct BeatRate {
    position: Beat,
    /// Whammy gain minus drain, in SP per beat, while SP is active inside a
    /// whammy range.
    net_rate: f64,
}

#[derive(Debug, Clone, Copy)]
struct WhammyRange {
    start: Position,
    end: Position,
}

/// Precomputed whammy geometry used to push an [`SpBar`] across a time range.
///
/// Whammy only grants SP on sustains inside SP phrases, so the ranges are the
/// intersection of the two, adjusted for early/lazy whammy and whammy delay.
#[derive(Debug, Clone)]
pub struct SpData {
    beat_rates: Vec<BeatRate>,
    whammy_ranges: Vec<WhammyRange>,
    gain_rate: f64,
}

impl SpData {
    pub fn new(
        track: &NoteTrack,
        sync: &SyncTrack,
        converter: &TimeConverter,
        resolution: u32,
        engine: Engine,
        squeeze: &SqueezeSettings,
    ) -> Self {
        Self {
            beat_rates: Self::form_beat_rates(sync, resolution, engine),
            whammy_ranges: Self::form_whammy_ranges(track, converter, resolution, engine, squeeze),
            gain_rate: engine.sp_gain_rate(),
        }
    }

    /// One breakpoint per time-signature event; the drain term depends on
    /// the beats-per-measure in force there.
    fn form_beat_rates(sync: &SyncTrack, resolution: u32, engine: Engine) -> Vec<BeatRate> {
        let res = f64::from(resolution);
        if engine.ignores_time_sigs_for_sp() {
            return vec![BeatRate {
                position: Beat(0.0),
                net_rate: engine.sp_gain_rate() - 1.0 / 32.0,
            }];
        }
        sync.time_sigs()
            .iter()
            .map(|ts| {
                let beats_per_measure = 4.0 * f64::from(ts.numerator) / f64::from(ts.denominator);
                BeatRate {
                    position: Beat(f64::from(ts.position.0) / res),
                    net_rate: engine.sp_gain_rate()
                        - 1.0 / (MEASURES_PER_BAR * beats_per_measure),
                }
            })
            .collect()
    }

    fn form_whammy_ranges(
        track: &NoteTrack,
        converter: &TimeConverter,
        resolution: u32,
        engine: Engine,
        squeeze: &SqueezeSettings,
    ) -> Vec<WhammyRange> {
        let res = f64::from(resolution);
        let early_window = engine.timing_window() * squeeze.early_whammy;
        let start_delay = squeeze.lazy_whammy + squeeze.whammy_delay;

        let mut ranges: Vec<(f64, f64)> = Vec::new();
        for note in track.notes().iter().filter(|n| n.is_sustain()) {
            for phrase in track.sp_phrases() {
                let overlap_start = note.position.max(phrase.position);
                let overlap_end = note.end().min(phrase.end());
                if overlap_start >= overlap_end {
                    continue;
                }
                let start_beat = f64::from(overlap_start.0) / res;
                let end_beat = f64::from(overlap_end.0) / res;
                let start_sec = if overlap_start == note.position {
                    // Whammy can begin early within the hit window, but lazy
                    // whammy and whammy delay push it back.
                    converter.beats_to_seconds(Beat(start_beat)).0 - early_window + start_delay
                } else {
                    converter.beats_to_seconds(Beat(start_beat)).0 + squeeze.whammy_delay
                };
                let end_sec = converter.beats_to_seconds(Beat(end_beat)).0;
                if start_sec >= end_sec {
                    continue;
                }
                let start = converter.seconds_to_beats(Second(start_sec)).0;
                ranges.push((start, end_beat));
            }
        }

        ranges.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut merged: Vec<(f64, f64)> = Vec::new();
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.0 <= last.1 => last.1 = last.1.max(range.1),
                _ => merged.push(range),
            }
        }

        merged
            .into_iter()
            .map(|(start, end)| WhammyRange {
                start: converter.position_of(Beat(start)),
                end: converter.position_of(Beat(end)),
            })
            .collect()
    }

    /// SP gained from whammying every sustain between two beats, drain-free.
    pub fn available_whammy(&self, start: Beat, end: Beat) -> f64 {
        let mut total = 0.0;
        for range in &self.whammy_ranges {
            let overlap = range.end.beat.0.min(end.0) - range.start.beat.0.max(start.0);
            if overlap > 0.0 {
                total += overlap * self.gain_rate;
            }
        }
        total
    }

    /// Push an SP bar from `start` to `end` while SP is active.
    ///
    /// `min` drains without whammy and floors at zero; `max` takes all the
    /// whammy the ranges offer. If even the maximal choice runs out of SP
    /// before `end`, the result has its max pinned to the failure sentinel.
    pub fn propagate_sp_over_whammy(&self, start: Position, end: Position, bar: SpBar) -> SpBar {
        let mut bar = bar;
        bar.min = bar.min.max(0.0);
        bar.min -= (end.measure.0 - start.measure.0) / MEASURES_PER_BAR;
        bar.min = bar.min.max(0.0);

        let mut pos = start;
        let mut idx = self
            .whammy_ranges
            .partition_point(|r| r.end.beat.0 <= pos.beat.0);
        while idx < self.whammy_ranges.len() && self.whammy_ranges[idx].start.beat.0 < end.beat.0 {
            let range = &self.whammy_ranges[idx];
            if range.start.beat.0 > pos.beat.0 {
                bar.max -= (range.start.measure.0 - pos.measure.0) / MEASURES_PER_BAR;
                if bar.max < 0.0 {
                    return SpBar::failed(bar.min);
                }
                pos = range.start;
            }
            let segment_end = if end.beat.0 < range.end.beat.0 {
                end
            } else {
                range.end
            };
            match self.propagate_over_whammy_range(pos.beat, segment_end.beat, bar.max) {
                Some(amount) => bar.max = amount.min(1.0),
                None => return SpBar::failed(bar.min),
            }
            pos = segment_end;
            if pos.beat.0 >= end.beat.0 {
                return bar;
            }
            idx += 1;
        }

        bar.max -= (end.measure.0 - pos.measure.0) / MEASURES_PER_BAR;
        if bar.max < 0.0 {
            return SpBar::failed(bar.min);
        }
        bar
    }

    /// Integrate the net beat rates over `[start, end)`, clamping at a full
    /// bar. `None` when SP hits zero inside the range.
    fn propagate_over_whammy_range(&self, start: Beat, end: Beat, amount: f64) -> Option<f64> {
        let mut amount = amount;
        let mut pos = start.0;
        let mut idx = self.beat_rates.partition_point(|r| r.position.0 <= pos);
        loop {
            let rate = if idx == 0 {
                self.beat_rates.first().map_or(0.0, |r| r.net_rate)
            } else {
                self.beat_rates[idx - 1].net_rate
            };
            let segment_end = match self.beat_rates.get(idx) {
                Some(next) if next.position.0 < end.0 => next.position.0,
                _ => end.0,
            };
            amount += (segment_end - pos) * rate;
            if amount < 0.0 {
                return None;
            }
            amount = amount.min(1.0);
            if segment_end >= end.0 {
                return Some(amount);
            }
            pos = segment_end;
            idx += 1;
        }
    }
}

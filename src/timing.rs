use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::model::SyncTrack;

/// BPM assumed outside the sync track's event range, in thousandths.
const DEFAULT_BPM: u32 = 120_000;

/// Beats per measure assumed outside the time-signature event range.
const DEFAULT_BEATS_PER_MEASURE: f64 = 4.0;

/// Position in chart ticks. The chart resolution ties ticks to beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tick(pub u32);

/// Number of quarter-note beats from chart start.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Beat(pub f64);

/// Number of measures from chart start. Advances at a rate set by the
/// current time signature.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Measure(pub f64);

/// Seconds from chart start.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Second(pub f64);

/// A position expressed in both the beat and measure domains.
///
/// SP drain is linear in measures while whammy gain is linear in beats, so
/// the SP propagation code needs both forms of every boundary it touches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub beat: Beat,
    pub measure: Measure,
}

#[derive(Debug, Clone, Copy)]
struct BeatTimestamp {
    beat: f64,
    second: f64,
    /// Seconds per beat in effect after this event.
    secs_per_beat: f64,
}

#[derive(Debug, Clone, Copy)]
struct MeasureTimestamp {
    beat: f64,
    measure: f64,
    /// Beats per measure in effect after this event.
    beats_per_measure: f64,
}

/// Bidirectional mapping between tick, beat, measure, and second across
/// tempo and time-signature changes.
///
/// Cumulative timestamps are precomputed at every sync event; queries binary
/// search the containing segment and interpolate linearly. Queries before the
/// first event extrapolate at 120 BPM and 4/4, queries past the last event at
/// the final rates, so negative and post-end positions are well-defined.
#[derive(Debug, Clone)]
pub struct TimeConverter {
    beat_timestamps: Vec<BeatTimestamp>,
    measure_timestamps: Vec<MeasureTimestamp>,
    default_secs_per_beat: f64,
}

impl TimeConverter {
    /// Build a converter from a sync track.
    ///
    /// `speed_percent` multiplies every BPM (including the default used for
    /// extrapolation); callers validate it is positive. When the engine
    /// ignores time signatures for SP drain, the measure map treats the whole
    /// song as 4/4.
    pub fn new(sync: &SyncTrack, resolution: u32, engine: Engine, speed_percent: i32) -> Self {
        let speed = f64::from(speed_percent) / 100.0;
        let res = f64::from(resolution);

        let mut beat_timestamps = Vec::with_capacity(sync.bpms().len());
        let mut second = 0.0;
        let mut last_beat = 0.0;
        let mut secs_per_beat = Self::secs_per_beat(DEFAULT_BPM, speed);
        for bpm in sync.bpms() {
            let beat = f64::from(bpm.position.0) / res;
            second += (beat - last_beat) * secs_per_beat;
            secs_per_beat = Self::secs_per_beat(bpm.bpm, speed);
            beat_timestamps.push(BeatTimestamp {
                beat,
                second,
                secs_per_beat,
            });
            last_beat = beat;
        }

        let mut measure_timestamps = Vec::with_capacity(sync.time_sigs().len());
        if engine.ignores_time_sigs_for_sp() {
            measure_timestamps.push(MeasureTimestamp {
                beat: 0.0,
                measure: 0.0,
                beats_per_measure: DEFAULT_BEATS_PER_MEASURE,
            });
        } else {
            let mut measure = 0.0;
            let mut last_beat = 0.0;
            let mut beats_per_measure = DEFAULT_BEATS_PER_MEASURE;
            for ts in sync.time_sigs() {
                let beat = f64::from(ts.position.0) / res;
                measure += (beat - last_beat) / beats_per_measure;
                beats_per_measure = 4.0 * f64::from(ts.numerator) / f64::from(ts.denominator);
                measure_timestamps.push(MeasureTimestamp {
                    beat,
                    measure,
                    beats_per_measure,
                });
                last_beat = beat;
            }
        }

        Self {
            beat_timestamps,
            measure_timestamps,
            default_secs_per_beat: Self::secs_per_beat(DEFAULT_BPM, speed),
        }
    }

    fn secs_per_beat(milli_bpm: u32, speed: f64) -> f64 {
        60_000.0 / (f64::from(milli_bpm) * speed)
    }

    pub fn beats_to_seconds(&self, beats: Beat) -> Second {
        let b = beats.0;
        let idx = self.beat_timestamps.partition_point(|t| t.beat <= b);
        if idx == 0 {
            let second = match self.beat_timestamps.first() {
                Some(first) => first.second - (first.beat - b) * self.default_secs_per_beat,
                None => b * self.default_secs_per_beat,
            };
            return Second(second);
        }
        let t = &self.beat_timestamps[idx - 1];
        Second(t.second + (b - t.beat) * t.secs_per_beat)
    }

    pub fn seconds_to_beats(&self, seconds: Second) -> Beat {
        let s = seconds.0;
        let idx = self.beat_timestamps.partition_point(|t| t.second <= s);
        if idx == 0 {
            let beat = match self.beat_timestamps.first() {
                Some(first) => first.beat - (first.second - s) / self.default_secs_per_beat,
                None => s / self.default_secs_per_beat,
            };
            return Beat(beat);
        }
        let t = &self.beat_timestamps[idx - 1];
        Beat(t.beat + (s - t.second) / t.secs_per_beat)
    }

    pub fn beats_to_measures(&self, beats: Beat) -> Measure {
        let b = beats.0;
        let idx = self.measure_timestamps.partition_point(|t| t.beat <= b);
        if idx == 0 {
            let measure = match self.measure_timestamps.first() {
                Some(first) => first.measure - (first.beat - b) / DEFAULT_BEATS_PER_MEASURE,
                None => b / DEFAULT_BEATS_PER_MEASURE,
            };
            return Measure(measure);
        }
        let t = &self.measure_timestamps[idx - 1];
        Measure(t.measure + (b - t.beat) / t.beats_per_measure)
    }

    pub fn measures_to_beats(&self, measures: Measure) -> Beat {
        let m = measures.0;
        let idx = self.measure_timestamps.partition_point(|t| t.measure <= m);
        if idx == 0 {
            let beat = match self.measure_timestamps.first() {
                Some(first) => first.beat - (first.measure - m) * DEFAULT_BEATS_PER_MEASURE,
                None => m * DEFAULT_BEATS_PER_MEASURE,
            };
            return Beat(beat);
        }
        let t = &self.measure_timestamps[idx - 1];
        Beat(t.beat + (m - t.measure) * t.beats_per_measure)
    }

    /// Beat and measure forms of the same position.
    pub fn position_of(&self, beat: Beat) -> Position {
        Position {
            beat,
            measure: self.beats_to_measures(beat),
        }
    }
}

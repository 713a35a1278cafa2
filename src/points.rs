use crate::engine::Engine;
use crate::model::{NoteColour, NoteTrack, TrackType};
use crate::settings::{DrumSettings, SqueezeSettings};
use crate::timing::{Beat, Position, Second, Tick, TimeConverter};

/// One scoreable item: a note (or chord) anchor or a sustain subpoint.
///
/// Positions and hit windows are precomputed so the optimiser never touches
/// the converter. The multiplier is the streak multiplier that will apply
/// when the point is collected; activation does not change hit order, so it
/// is fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub tick: Tick,
    pub position: Position,
    pub second: Second,
    pub hit_window_start: Position,
    pub hit_window_end: Position,
    pub value: u32,
    pub multiplier: u32,
    pub is_hold_point: bool,
    pub is_sp_granting: bool,
    pub is_unison_granting: bool,
    pub is_activation_eligible: bool,
}

/// Bonus awarded at the end of a solo, outside the path search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoloBonus {
    pub beat: Beat,
    pub value: u32,
}

#[derive(Debug, Clone, Copy)]
struct RawPoint {
    tick: u32,
    value: u32,
    is_hold: bool,
    group: usize,
}

/// Ordered sequence of points for one track under one engine.
#[derive(Debug, Clone)]
pub struct PointSet {
    points: Vec<Point>,
    solo_bonuses: Vec<SoloBonus>,
}

impl PointSet {
    pub fn new(
        track: &NoteTrack,
        converter: &TimeConverter,
        resolution: u32,
        engine: Engine,
        squeeze: &SqueezeSettings,
        drums: &DrumSettings,
        unison_ticks: &[Tick],
    ) -> Self {
        let notes: Vec<_> = track
            .notes()
            .iter()
            .filter(|note| match note.colour {
                NoteColour::Drum(colour) => {
                    if drums.disable_kick && colour.is_kick() {
                        return false;
                    }
                    if !drums.enable_double_kick
                        && colour == crate::model::DrumColour::DoubleKick
                    {
                        return false;
                    }
                    true
                }
                _ => true,
            })
            .copied()
            .collect();

        let mut raw = Vec::new();
        let mut group_count = 0;
        let mut idx = 0;
        while idx < notes.len() {
            let tick = notes[idx].position;
            let mut end = idx;
            while end < notes.len() && notes[end].position == tick {
                end += 1;
            }
            let chord = &notes[idx..end];
            let group = group_count;
            group_count += 1;

            raw.push(RawPoint {
                tick: tick.0,
                value: engine.base_note_value() * chord.len() as u32,
                is_hold: false,
                group,
            });

            if engine.do_chords_multiply_sustains() {
                for note in chord.iter().filter(|n| n.is_sustain()) {
                    Self::append_sustain_points(
                        &mut raw,
                        note.position.0,
                        note.length.0,
                        resolution,
                        engine,
                        group,
                    );
                }
            } else {
                let max_length = chord.iter().map(|n| n.length.0).max().unwrap_or(0);
                if max_length > 0 {
                    Self::append_sustain_points(
                        &mut raw,
                        tick.0,
                        max_length,
                        resolution,
                        engine,
                        group,
                    );
                }
            }

            idx = end;
        }

        raw.sort_by_key(|p| (p.tick, p.is_hold));

        // Streak multipliers, anchors only; subpoints inherit their anchor's.
        // A chord is one point in hit order, so it advances the streak by one.
        let mut group_multipliers = vec![1_u32; group_count];
        let mut counted = 0_u32;
        for point in &raw {
            if !point.is_hold {
                counted += 1;
                group_multipliers[point.group] = (1 + counted / 10).min(4);
            }
        }

        // The last point inside each phrase grants its SP.
        let mut sp_granting = vec![false; raw.len()];
        let mut unison_granting = vec![false; raw.len()];
        for phrase in track.sp_phrases() {
            let last_inside = raw
                .iter()
                .rposition(|p| Tick(p.tick) >= phrase.position && Tick(p.tick) < phrase.end());
            if let Some(i) = last_inside {
                sp_granting[i] = true;
                unison_granting[i] = unison_ticks.contains(&phrase.position);
            }
        }

        let is_drums = track.track_type() == TrackType::Drums;
        let res = f64::from(resolution);
        let window = engine.timing_window() * squeeze.squeeze;

        let points = raw
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let beat = Beat(f64::from(p.tick) / res);
                let second = Second(converter.beats_to_seconds(beat).0 + squeeze.video_lag);
                let hit_window_start =
                    converter.position_of(converter.seconds_to_beats(Second(second.0 - window)));
                let hit_window_end =
                    converter.position_of(converter.seconds_to_beats(Second(second.0 + window)));
                let is_activation_eligible = !is_drums
                    || track
                        .drum_fills()
                        .iter()
                        .any(|f| Tick(p.tick) >= f.start && Tick(p.tick) <= f.end);
                Point {
                    tick: Tick(p.tick),
                    position: converter.position_of(beat),
                    second,
                    hit_window_start,
                    hit_window_end,
                    value: p.value,
                    multiplier: group_multipliers[p.group],
                    is_hold_point: p.is_hold,
                    is_sp_granting: sp_granting[i],
                    is_unison_granting: unison_granting[i],
                    is_activation_eligible,
                }
            })
            .collect();

        let solo_bonuses = track
            .solos()
            .iter()
            .map(|solo| SoloBonus {
                beat: Beat(f64::from(solo.end.0) / res),
                value: solo.value,
            })
            .collect();

        Self {
            points,
            solo_bonuses,
        }
    }

    /// Emit 1-point subpoints along a sustain.
    ///
    /// One subpoint per `tick_gap` ticks; resolutions below the points-per-
    /// beat rate fall back to one subpoint per tick. A subpoint may overshoot
    /// the sustain end by less than one gap; it is kept only inside the burst
    /// window.
    fn append_sustain_points(
        raw: &mut Vec<RawPoint>,
        start: u32,
        length: u32,
        resolution: u32,
        engine: Engine,
        group: usize,
    ) {
        let tick_gap = (resolution / engine.sust_points_per_beat()).max(1);
        let burst_ticks = (engine.burst_size() * f64::from(resolution)) as u32;
        let limit = start + length + burst_ticks;
        let mut position = start;
        let mut remaining = i64::from(length);
        while remaining > 0 {
            position += tick_gap;
            remaining -= i64::from(tick_gap);
            if position <= limit {
                raw.push(RawPoint {
                    tick: position,
                    value: 1,
                    is_hold: true,
                    group,
                });
            }
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn solo_bonuses(&self) -> &[SoloBonus] {
        &self.solo_bonuses
    }

    /// Streak-multiplied total of every point, before SP and solo bonuses.
    pub fn base_score(&self) -> Option<u64> {
        self.points.iter().try_fold(0_u64, |acc, p| {
            acc.checked_add(u64::from(p.value).checked_mul(u64::from(p.multiplier))?)
        })
    }
}

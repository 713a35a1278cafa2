use serde::{Deserialize, Serialize};

use crate::timing::Tick;

/// Tempo change. `bpm` is in thousandths of a beat per minute, so 150 BPM is
/// stored as 150_000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmEvent {
    pub position: Tick,
    pub bpm: u32,
}

/// Time-signature change. One measure spans `4 * numerator / denominator`
/// quarter-note beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSigEvent {
    pub position: Tick,
    pub numerator: u32,
    pub denominator: u32,
}

/// Ordered tempo and time-signature events for a chart.
///
/// Construction sorts events, keeps the last event of any duplicated tick,
/// drops degenerate events (zero BPM, zero numerator or denominator), and
/// inserts the implicit 120 BPM and 4/4 events at tick 0 when the chart does
/// not supply its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTrack {
    bpms: Vec<BpmEvent>,
    time_sigs: Vec<TimeSigEvent>,
}

impl SyncTrack {
    pub fn new(time_sigs: Vec<TimeSigEvent>, bpms: Vec<BpmEvent>) -> Self {
        let mut bpms: Vec<_> = bpms.into_iter().filter(|b| b.bpm > 0).collect();
        bpms.sort_by_key(|b| b.position);
        bpms.dedup_by(|later, earlier| {
            if later.position == earlier.position {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        if bpms.first().is_none_or(|b| b.position.0 != 0) {
            bpms.insert(
                0,
                BpmEvent {
                    position: Tick(0),
                    bpm: 120_000,
                },
            );
        }

        let mut time_sigs: Vec<_> = time_sigs
            .into_iter()
            .filter(|ts| ts.numerator > 0 && ts.denominator > 0)
            .collect();
        time_sigs.sort_by_key(|ts| ts.position);
        time_sigs.dedup_by(|later, earlier| {
            if later.position == earlier.position {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        if time_sigs.first().is_none_or(|ts| ts.position.0 != 0) {
            time_sigs.insert(
                0,
                TimeSigEvent {
                    position: Tick(0),
                    numerator: 4,
                    denominator: 4,
                },
            );
        }

        Self { bpms, time_sigs }
    }

    pub fn bpms(&self) -> &[BpmEvent] {
        &self.bpms
    }

    pub fn time_sigs(&self) -> &[TimeSigEvent] {
        &self.time_sigs
    }

    /// Multiply every BPM by `percent / 100`, saturating at the maximum
    /// representable tempo. Callers validate that `percent` is positive.
    pub(crate) fn scale_tempo(&mut self, percent: i32) {
        let percent = u64::from(percent.unsigned_abs());
        for bpm in &mut self.bpms {
            let scaled = u64::from(bpm.bpm) * percent / 100;
            bpm.bpm = u32::try_from(scaled).unwrap_or(u32::MAX);
        }
    }
}

impl Default for SyncTrack {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_events_at_tick_zero() {
        let sync = SyncTrack::default();
        assert_eq!(sync.bpms(), &[BpmEvent { position: Tick(0), bpm: 120_000 }]);
        assert_eq!(
            sync.time_sigs(),
            &[TimeSigEvent {
                position: Tick(0),
                numerator: 4,
                denominator: 4,
            }]
        );
    }

    #[test]
    fn explicit_first_event_replaces_implicit() {
        let sync = SyncTrack::new(
            vec![],
            vec![BpmEvent {
                position: Tick(0),
                bpm: 150_000,
            }],
        );
        assert_eq!(sync.bpms().len(), 1);
        assert_eq!(sync.bpms()[0].bpm, 150_000);
    }

    #[test]
    fn duplicate_ticks_keep_last_event() {
        let sync = SyncTrack::new(
            vec![],
            vec![
                BpmEvent {
                    position: Tick(0),
                    bpm: 150_000,
                },
                BpmEvent {
                    position: Tick(0),
                    bpm: 180_000,
                },
            ],
        );
        assert_eq!(sync.bpms(), &[BpmEvent { position: Tick(0), bpm: 180_000 }]);
    }

    #[test]
    fn events_are_sorted() {
        let sync = SyncTrack::new(
            vec![],
            vec![
                BpmEvent {
                    position: Tick(800),
                    bpm: 200_000,
                },
                BpmEvent {
                    position: Tick(0),
                    bpm: 150_000,
                },
            ],
        );
        assert_eq!(sync.bpms()[0].position, Tick(0));
        assert_eq!(sync.bpms()[1].position, Tick(800));
    }

    #[test]
    fn scale_tempo_multiplies_bpms() {
        let mut sync = SyncTrack::default();
        sync.scale_tempo(200);
        assert_eq!(sync.bpms()[0].bpm, 240_000);
    }
}

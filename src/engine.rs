use serde::{Deserialize, Serialize};

/// Scoring rule set for a game engine.
///
/// The capability set is small and closed, so the variants carry their
/// constants inline rather than going through dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Clone Hero.
    #[default]
    Ch,
    /// Rock Band.
    Rb,
}

impl Engine {
    /// Points for a single note before multipliers.
    pub fn base_note_value(self) -> u32 {
        match self {
            Engine::Ch => 50,
            Engine::Rb => 25,
        }
    }

    /// Window at the tail of a sustain, in beats, during which release still
    /// collects the remaining fractional points.
    pub fn burst_size(self) -> f64 {
        match self {
            Engine::Ch => 0.25,
            Engine::Rb => 0.0,
        }
    }

    /// Whether each colour of a chord sustain scores its own point stream.
    pub fn do_chords_multiply_sustains(self) -> bool {
        match self {
            Engine::Ch => false,
            Engine::Rb => true,
        }
    }

    /// Whether charts for this engine can contain big rock endings.
    pub fn has_bres(self) -> bool {
        match self {
            Engine::Ch => false,
            Engine::Rb => true,
        }
    }

    /// Whether phrases shared across instruments award extra SP.
    pub fn has_unison_bonuses(self) -> bool {
        match self {
            Engine::Ch => false,
            Engine::Rb => true,
        }
    }

    /// SP gained per beat of whammied sustain.
    pub fn sp_gain_rate(self) -> f64 {
        match self {
            Engine::Ch => 1.0 / 30.0,
            Engine::Rb => 0.034,
        }
    }

    /// Sustain points awarded per beat held.
    pub fn sust_points_per_beat(self) -> u32 {
        match self {
            Engine::Ch => 25,
            Engine::Rb => 12,
        }
    }

    /// Half-width of the hit window, in seconds.
    pub fn timing_window(self) -> f64 {
        match self {
            Engine::Ch => 0.07,
            Engine::Rb => 0.1,
        }
    }

    /// Whether SP drain runs at a constant 1/32 bar per beat regardless of
    /// time signature.
    pub fn ignores_time_sigs_for_sp(self) -> bool {
        match self {
            Engine::Ch => false,
            Engine::Rb => true,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::model::SongError;

/// Input-timing tolerances applied when building points and whammy ranges.
///
/// `squeeze` and `early_whammy` are fractions of the engine timing window;
/// the remaining fields are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqueezeSettings {
    /// Fraction of the timing window available for hitting a note early or
    /// late.
    pub squeeze: f64,
    /// Fraction of the pre-note window during which whammy already counts.
    pub early_whammy: f64,
    /// Dead time after a sustain starts before whammy grants SP.
    pub lazy_whammy: f64,
    /// Shift applied to every point's second position.
    pub video_lag: f64,
    /// Additional lag on whammy SP accrual.
    pub whammy_delay: f64,
}

impl SqueezeSettings {
    /// Settings for an ideal player: full squeeze, instant whammy, no lag.
    pub fn optimal() -> Self {
        Self {
            squeeze: 1.0,
            early_whammy: 1.0,
            lazy_whammy: 0.0,
            video_lag: 0.0,
            whammy_delay: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), SongError> {
        if !(0.0..=1.0).contains(&self.squeeze) {
            return Err(SongError::InvalidSqueeze("squeeze must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.early_whammy) {
            return Err(SongError::InvalidSqueeze("early whammy must be in [0, 1]"));
        }
        if self.lazy_whammy < 0.0 {
            return Err(SongError::InvalidSqueeze("lazy whammy must be non-negative"));
        }
        if self.whammy_delay < 0.0 {
            return Err(SongError::InvalidSqueeze("whammy delay must be non-negative"));
        }
        Ok(())
    }
}

impl Default for SqueezeSettings {
    fn default() -> Self {
        Self::optimal()
    }
}

/// Which drum notes take part in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrumSettings {
    pub enable_double_kick: bool,
    pub disable_kick: bool,
}

impl Default for DrumSettings {
    fn default() -> Self {
        Self {
            enable_double_kick: true,
            disable_kick: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimal_settings_validate() {
        assert!(SqueezeSettings::optimal().validate().is_ok());
    }

    #[test]
    fn out_of_range_squeeze_is_rejected() {
        let settings = SqueezeSettings {
            squeeze: 1.5,
            ..SqueezeSettings::optimal()
        };
        assert!(matches!(
            settings.validate(),
            Err(SongError::InvalidSqueeze(_))
        ));

        let settings = SqueezeSettings {
            lazy_whammy: -0.1,
            ..SqueezeSettings::optimal()
        };
        assert!(settings.validate().is_err());
    }
}

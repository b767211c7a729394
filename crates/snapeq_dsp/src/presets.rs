//! Built-in EQ Presets

use std::fmt;
use std::str::FromStr;

use crate::eq::EQ_BANDS;
use crate::error::DspError;

/// Subwoofer tuning: bass boost, mid cut, a little treble lift
pub const SUBWOOFER_BOOST_GAINS: [f32; EQ_BANDS] =
    [6.0, 4.0, 2.0, -1.0, -3.0, -1.0, 0.0, -2.0, 0.0, 3.0];

/// Named presets exposed to the configuration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// All bands at 0 dB and the EQ switched off
    FlatBypass,
    /// [`SUBWOOFER_BOOST_GAINS`], EQ on
    SubwooferBoost,
    /// Keep the current gains, EQ on
    Custom,
}

/// All presets in display order
pub const PRESETS: &[Preset] = &[Preset::FlatBypass, Preset::SubwooferBoost, Preset::Custom];

impl Preset {
    /// Display name, also the accepted input string
    pub const fn name(self) -> &'static str {
        match self {
            Preset::FlatBypass => "Flat (Bypass)",
            Preset::SubwooferBoost => "Subwoofer Boost",
            Preset::Custom => "Custom",
        }
    }

    /// Gains this preset installs, or `None` if it keeps the current ones
    pub const fn gains(self) -> Option<[f32; EQ_BANDS]> {
        match self {
            Preset::FlatBypass => Some([0.0; EQ_BANDS]),
            Preset::SubwooferBoost => Some(SUBWOOFER_BOOST_GAINS),
            Preset::Custom => None,
        }
    }

    /// Value of the `enabled` flag after applying this preset
    pub const fn enables(self) -> bool {
        !matches!(self, Preset::FlatBypass)
    }
}

impl FromStr for Preset {
    type Err = DspError;

    /// Names match exactly, including case and punctuation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PRESETS
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| DspError::UnrecognizedPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

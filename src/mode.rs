//! Treatment modes and the mode → channel duty mapping.
//!
//! Operator-facing cycling skips [`TreatmentMode::Off`]; `Off` is only ever
//! set by the controller itself.

use serde::{Deserialize, Serialize};

/// Which light channel(s) a session energises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TreatmentMode {
    Off = 0,
    RedOnly = 1,
    NirOnly = 2,
    Dual = 3,
    Alternating = 4,
}

/// Which channel is lit in `Alternating` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlternatePhase {
    Red,
    Nir,
}

impl AlternatePhase {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Red => Self::Nir,
            Self::Nir => Self::Red,
        }
    }
}

/// PWM duties for the 650 nm and 850 nm channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelDuties {
    pub red: u8,
    pub nir: u8,
}

impl ChannelDuties {
    pub const OFF: Self = Self { red: 0, nir: 0 };

    pub const fn is_off(self) -> bool {
        self.red == 0 && self.nir == 0
    }
}

impl TreatmentMode {
    /// Operator-selectable modes in cycling order.
    pub const CYCLE: [Self; 4] = [Self::RedOnly, Self::NirOnly, Self::Dual, Self::Alternating];

    /// Decode a stored byte. Unknown values yield `None`.
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Off),
            1 => Some(Self::RedOnly),
            2 => Some(Self::NirOnly),
            3 => Some(Self::Dual),
            4 => Some(Self::Alternating),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Cyclic successor over the operator modes. `Off` advances to `RedOnly`.
    pub const fn next(self) -> Self {
        match self {
            Self::Off | Self::Alternating => Self::RedOnly,
            Self::RedOnly => Self::NirOnly,
            Self::NirOnly => Self::Dual,
            Self::Dual => Self::Alternating,
        }
    }

    /// Cyclic predecessor over the operator modes. `Off` retreats to `Alternating`.
    pub const fn prev(self) -> Self {
        match self {
            Self::Off | Self::RedOnly => Self::Alternating,
            Self::NirOnly => Self::RedOnly,
            Self::Dual => Self::NirOnly,
            Self::Alternating => Self::Dual,
        }
    }

    /// 1-based position in [`Self::CYCLE`]; 0 for `Off`.
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::RedOnly => "RED",
            Self::NirOnly => "NIR",
            Self::Dual => "DUAL",
            Self::Alternating => "ALT",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Off => "Disabled",
            Self::RedOnly => "650nm Surface",
            Self::NirOnly => "850nm Deep",
            Self::Dual => "Full Spectrum",
            Self::Alternating => "Alternating",
        }
    }

    /// Channel duties for this mode at `brightness`.
    pub const fn duties(self, brightness: u8, phase: AlternatePhase) -> ChannelDuties {
        match self {
            Self::Off => ChannelDuties::OFF,
            Self::RedOnly => ChannelDuties { red: brightness, nir: 0 },
            Self::NirOnly => ChannelDuties { red: 0, nir: brightness },
            Self::Dual => ChannelDuties { red: brightness, nir: brightness },
            Self::Alternating => match phase {
                AlternatePhase::Red => ChannelDuties { red: brightness, nir: 0 },
                AlternatePhase::Nir => ChannelDuties { red: 0, nir: brightness },
            },
        }
    }
}

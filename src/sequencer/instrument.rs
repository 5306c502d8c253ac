// Instrument catalog - the nine voices of the drum machine
// Catalog order is the order rows are drawn and triggers are emitted

use crate::synth::params::{BandKind, FilterBand, NoiseLayer, ToneLayer, VoiceParams, Waveform};
use serde::{Deserialize, Serialize};

/// One drum instrument of the fixed catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Instrument {
    Kick,
    Snare,
    Hat,
    OpenHat,
    Rim,
    TomLow,
    TomMid,
    TomHigh,
    Ride,
}

impl Instrument {
    /// Every instrument, in catalog order
    pub const ALL: [Instrument; 9] = [
        Instrument::Kick,
        Instrument::Snare,
        Instrument::Hat,
        Instrument::OpenHat,
        Instrument::Rim,
        Instrument::TomLow,
        Instrument::TomMid,
        Instrument::TomHigh,
        Instrument::Ride,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position in the catalog (row index)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable identifier used in persisted snapshots
    pub fn id(self) -> &'static str {
        match self {
            Instrument::Kick => "kick",
            Instrument::Snare => "snare",
            Instrument::Hat => "hat",
            Instrument::OpenHat => "openHat",
            Instrument::Rim => "rim",
            Instrument::TomLow => "tomLow",
            Instrument::TomMid => "tomMid",
            Instrument::TomHigh => "tomHigh",
            Instrument::Ride => "ride",
        }
    }

    /// Label shown on the panel
    pub fn name(self) -> &'static str {
        match self {
            Instrument::Kick => "KICK",
            Instrument::Snare => "SNARE",
            Instrument::Hat => "CH HAT",
            Instrument::OpenHat => "OH HAT",
            Instrument::Rim => "RIM",
            Instrument::TomLow => "TOM L",
            Instrument::TomMid => "TOM M",
            Instrument::TomHigh => "TOM H",
            Instrument::Ride => "RIDE",
        }
    }

    /// Keyboard key that records this instrument at the sounding step
    pub fn key(self) -> char {
        match self {
            Instrument::Kick => 'A',
            Instrument::Snare => 'S',
            Instrument::Hat => 'D',
            Instrument::OpenHat => 'F',
            Instrument::Rim => 'G',
            Instrument::TomLow => 'H',
            Instrument::TomMid => 'J',
            Instrument::TomHigh => 'K',
            Instrument::Ride => 'L',
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|instrument| instrument.id() == id)
    }

    /// Case-insensitive lookup by keyboard key
    pub fn from_key(key: char) -> Option<Self> {
        let key = key.to_ascii_uppercase();
        Self::ALL.into_iter().find(|instrument| instrument.key() == key)
    }

    /// Synthesis recipe for this instrument
    pub fn voice(self) -> VoiceParams {
        match self {
            Instrument::Kick => VoiceParams {
                tone: Some(ToneLayer {
                    waveform: Waveform::Sine,
                    start_hz: (150.0, 180.0),
                    end_hz: (40.0, 45.0),
                    sweep_secs: 0.1,
                    gain: (1.0, 1.3),
                    decay_secs: 0.5,
                    stop_secs: 0.5,
                }),
                noise: None,
            },
            Instrument::Snare => VoiceParams {
                tone: None,
                noise: Some(NoiseLayer {
                    bands: [Some(FilterBand::new(BandKind::HighPass, (1800.0, 2000.0))), None],
                    gain: (0.9, 1.1),
                    decay_secs: 0.15,
                    stop_secs: 0.2,
                }),
            },
            Instrument::Hat => VoiceParams {
                tone: None,
                noise: Some(NoiseLayer {
                    bands: [Some(FilterBand::new(BandKind::BandPass, (8000.0, 9000.0))), None],
                    gain: (0.35, 0.45),
                    decay_secs: 0.07,
                    stop_secs: 0.05,
                }),
            },
            Instrument::OpenHat => VoiceParams {
                tone: None,
                noise: Some(NoiseLayer {
                    bands: [Some(FilterBand::new(BandKind::BandPass, (8000.0, 9000.0))), None],
                    gain: (0.35, 0.45),
                    decay_secs: 0.3,
                    stop_secs: 0.3,
                }),
            },
            Instrument::Rim => VoiceParams {
                tone: Some(ToneLayer {
                    waveform: Waveform::Square,
                    start_hz: (1150.0, 1350.0),
                    end_hz: (1150.0, 1350.0),
                    sweep_secs: 0.0,
                    gain: (0.09, 0.12),
                    decay_secs: 0.035,
                    stop_secs: 0.06,
                }),
                noise: Some(NoiseLayer {
                    bands: [
                        Some(FilterBand::new(BandKind::HighPass, (2200.0, 2500.0))),
                        Some(FilterBand::new(BandKind::BandPass, (3400.0, 3800.0)).with_q(10.0)),
                    ],
                    gain: (0.75, 0.9),
                    decay_secs: 0.06,
                    stop_secs: 0.035,
                }),
            },
            Instrument::TomLow => tom(160.0),
            Instrument::TomMid => tom(190.0),
            Instrument::TomHigh => tom(230.0),
            Instrument::Ride => VoiceParams {
                tone: None,
                noise: Some(NoiseLayer {
                    bands: [
                        Some(FilterBand::new(BandKind::BandPass, (7000.0, 7500.0))),
                        Some(FilterBand::new(BandKind::BandPass, (10000.0, 10500.0))),
                    ],
                    gain: (0.35, 0.45),
                    decay_secs: 0.9,
                    stop_secs: 0.9,
                }),
            },
        }
    }
}

/// Triangle body with a short filtered noise attack
fn tom(base_hz: f32) -> VoiceParams {
    VoiceParams {
        tone: Some(ToneLayer {
            waveform: Waveform::Triangle,
            start_hz: (base_hz * 1.08, base_hz * 1.1),
            end_hz: (base_hz * 0.95, base_hz * 0.95),
            sweep_secs: 0.16,
            gain: (0.8, 0.95),
            decay_secs: 0.28,
            stop_secs: 0.4,
        }),
        noise: Some(NoiseLayer {
            bands: [Some(FilterBand::new(BandKind::BandPass, (2500.0, 2800.0))), None],
            gain: (0.25, 0.35),
            decay_secs: 0.05,
            stop_secs: 0.03,
        }),
    }
}

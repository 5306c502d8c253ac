// Types for state persistence

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::sequencer::bank::{BankSet, NUM_BANKS, PatternStore};
use crate::sequencer::instrument::Instrument;
use crate::sequencer::pattern::StepRow;
use crate::sequencer::transport::{
    DEFAULT_BPM, DEFAULT_MASTER_LEVEL, TransportParams, clamp_bpm, clamp_level, clamp_swing,
};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// One bank as stored on disk: instrument id -> row of steps
pub type BankRows = BTreeMap<String, Vec<bool>>;

/// Everything the machine remembers between sessions
///
/// Field names are the established storage keys; the long forms are
/// accepted as aliases. Hydration is lenient: each field that has the wrong
/// type falls back to its default on its own, unknown instruments are
/// skipped, short rows are padded and out-of-range values are clamped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    #[serde(default = "default_version", deserialize_with = "lenient_version")]
    pub version: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_saved_at"
    )]
    pub saved_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(
        rename = "patternBanks",
        alias = "bankSet",
        default,
        deserialize_with = "lenient_banks"
    )]
    pub bank_set: Vec<BankRows>,
    #[serde(default, deserialize_with = "lenient_cells")]
    pub accent_pattern: Vec<bool>,
    #[serde(default = "default_bpm", deserialize_with = "lenient_bpm")]
    pub bpm: i64,
    #[serde(
        rename = "swing",
        alias = "swingPercent",
        default,
        deserialize_with = "lenient_swing"
    )]
    pub swing_percent: i64,
    #[serde(
        rename = "master",
        alias = "masterLevel",
        default = "default_master",
        deserialize_with = "lenient_master"
    )]
    pub master_level: f32,
    #[serde(
        rename = "currentBank",
        alias = "currentBankIndex",
        default,
        deserialize_with = "lenient_bank_index"
    )]
    pub current_bank_index: usize,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

fn default_bpm() -> i64 {
    DEFAULT_BPM as i64
}

fn default_master() -> f32 {
    DEFAULT_MASTER_LEVEL
}

/// Finite number, whatever its JSON representation
fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|n| n.is_finite()))
}

fn lenient_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(number(deserializer)?
        .filter(|n| *n >= 0.0)
        .map_or_else(default_version, |n| n as u32))
}

fn lenient_bpm<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(number(deserializer)?.map_or_else(default_bpm, |n| n.round() as i64))
}

fn lenient_swing<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(number(deserializer)?.map_or(0, |n| n.round() as i64))
}

fn lenient_master<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(number(deserializer)?.map_or_else(default_master, |n| n as f32))
}

// Negative or fractional indices land on bank 0
fn lenient_bank_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    Ok(number(deserializer)?
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .map_or(0, |n| n as usize))
}

fn lenient_saved_at<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Anything but `true` reads as an empty cell
fn cells(value: &Value) -> Vec<bool> {
    value
        .as_array()
        .map(|cells| cells.iter().map(|cell| cell.as_bool().unwrap_or(false)).collect())
        .unwrap_or_default()
}

fn lenient_cells<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<bool>, D::Error> {
    Ok(cells(&Value::deserialize(deserializer)?))
}

// A bank that is not an object stays in place as an empty bank, so later
// banks keep their index.
fn lenient_banks<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BankRows>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let Some(banks) = value.as_array() else {
        return Ok(Vec::new());
    };
    Ok(banks
        .iter()
        .map(|bank| {
            bank.as_object()
                .map(|rows| {
                    rows.iter()
                        .map(|(id, row)| (id.clone(), cells(row)))
                        .collect::<BankRows>()
                })
                .unwrap_or_default()
        })
        .collect())
}

impl StateSnapshot {
    /// Capture patterns and parameters, stamped with the current time
    pub fn capture(store: &PatternStore, params: &TransportParams) -> Self {
        let bank_set = store
            .banks()
            .iter()
            .map(|pattern| {
                Instrument::ALL
                    .into_iter()
                    .map(|instrument| {
                        (
                            instrument.id().to_string(),
                            pattern.row(instrument).cells().to_vec(),
                        )
                    })
                    .collect()
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Some(chrono::Utc::now()),
            bank_set,
            accent_pattern: store.accents().cells().to_vec(),
            bpm: params.bpm as i64,
            swing_percent: params.swing_percent as i64,
            master_level: params.master_level,
            current_bank_index: params.current_bank,
        }
    }

    /// Rebuild the pattern store and transport parameters
    pub fn into_parts(self) -> (PatternStore, TransportParams) {
        if self.version > SNAPSHOT_VERSION {
            log::warn!(
                "Snapshot version {} is newer than {}, loading what is understood",
                self.version,
                SNAPSHOT_VERSION
            );
        }

        let mut banks = BankSet::new();
        for (index, rows) in self.bank_set.iter().take(NUM_BANKS).enumerate() {
            let Some(pattern) = banks.get_mut(index) else {
                continue;
            };
            for (id, cells) in rows {
                match Instrument::from_id(id) {
                    Some(instrument) => {
                        *pattern.row_mut(instrument) = StepRow::from_cells(cells.iter().copied());
                    }
                    None => log::debug!("Skipping unknown instrument '{}' in bank {}", id, index),
                }
            }
        }

        let accents = StepRow::from_cells(self.accent_pattern.iter().copied());
        let params = TransportParams {
            bpm: clamp_bpm(self.bpm),
            swing_percent: clamp_swing(self.swing_percent),
            master_level: clamp_level(self.master_level).unwrap_or(DEFAULT_MASTER_LEVEL),
            current_bank: if self.current_bank_index < NUM_BANKS {
                self.current_bank_index
            } else {
                0
            },
        };

        (PatternStore::from_parts(banks, accents), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::pattern::STEPS;

    #[test]
    fn test_capture_layout() {
        let mut store = PatternStore::new();
        store.toggle_pad(1, Instrument::OpenHat, 2);
        let snapshot = StateSnapshot::capture(&store, &TransportParams::default());

        assert_eq!(snapshot.bank_set.len(), NUM_BANKS);
        assert_eq!(snapshot.bank_set[1]["openHat"].len(), STEPS);
        assert!(snapshot.bank_set[1]["openHat"][2]);
        assert_eq!(snapshot.accent_pattern.len(), STEPS);
        assert!(snapshot.saved_at.is_some());
    }

    #[test]
    fn test_json_uses_storage_keys() {
        let snapshot = StateSnapshot::capture(&PatternStore::new(), &TransportParams::default());
        let json = serde_json::to_value(&snapshot).unwrap();

        for key in ["patternBanks", "accentPattern", "bpm", "swing", "master", "currentBank"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn test_lenient_hydration() {
        let json = r#"{
            "patternBanks": [
                { "kick": [true, false, false, false, true], "cowbell": [true] },
                { "snare": [false, false, false, false, true, false, false, false,
                            false, false, false, false, true, false, false, false, true, true] }
            ],
            "accentPattern": [true],
            "bpm": 400,
            "swing": 33,
            "master": 3.0,
            "currentBank": 7
        }"#;
        let snapshot: StateSnapshot = serde_json::from_str(json).unwrap();
        let (store, params) = snapshot.into_parts();

        let bank0 = store.bank(0).copied().unwrap_or_default();
        assert!(bank0.is_active(Instrument::Kick, 0) && bank0.is_active(Instrument::Kick, 4));
        let bank1 = store.bank(1).copied().unwrap_or_default();
        assert_eq!(bank1.row(Instrument::Snare).active_steps().count(), 2);
        assert!(store.accents().get(0));

        assert_eq!(params.bpm, 200);
        assert_eq!(params.swing_percent, 35);
        assert_eq!(params.master_level, 1.0);
        assert_eq!(params.current_bank, 0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let snapshot: StateSnapshot = serde_json::from_str("{}").unwrap();
        let (store, params) = snapshot.into_parts();
        assert_eq!(store, PatternStore::new());
        assert_eq!(params, TransportParams::default());
    }

    #[test]
    fn test_long_key_aliases_accepted() {
        let json = r#"{ "bankSet": [], "swingPercent": 20, "masterLevel": 0.5, "currentBankIndex": 2 }"#;
        let snapshot: StateSnapshot = serde_json::from_str(json).unwrap();
        let (_, params) = snapshot.into_parts();
        assert_eq!(params.swing_percent, 20);
        assert_eq!(params.master_level, 0.5);
        assert_eq!(params.current_bank, 2);
    }

    #[test]
    fn test_malformed_fields_fall_back_individually() {
        let json = r#"{
            "version": "one",
            "savedAt": "yesterday",
            "patternBanks": [
                "not a bank",
                { "hat": [true, null, 1, true], "rim": "xxxx" }
            ],
            "accentPattern": { "0": true },
            "bpm": 120.5,
            "swing": null,
            "master": "loud",
            "currentBank": -1
        }"#;
        let snapshot: StateSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert!(snapshot.saved_at.is_none());

        let (store, params) = snapshot.into_parts();
        let bank1 = store.bank(1).copied().unwrap_or_default();
        let hats: Vec<_> = bank1.row(Instrument::Hat).active_steps().collect();
        assert_eq!(hats, vec![0, 3]);
        assert!(bank1.row(Instrument::Rim).is_empty());
        assert!(store.accents().is_empty());

        assert_eq!(params.bpm, 121);
        assert_eq!(params.swing_percent, 0);
        assert_eq!(params.master_level, DEFAULT_MASTER_LEVEL);
        assert_eq!(params.current_bank, 0);
    }
}

//! YAML seed catalog: starting parameter vectors per chip and combination.
//!
//! # Catalog Structure
//!
//! ```yaml
//! chips:
//!   D:
//!     description: "6581"
//!     seeds:
//!       3:
//!         bias: 0.9321273
//!         pulse_strength: 0.0
//!         top_bit: 0.0
//!         distance: 0.8860587
//!         stmix: 0.5655726
//!         score: 278
//! ```
//!
//! `score` is the last score recorded for the entry and is informational.
//!
//! # Programmatic Usage
//!
//! ```rust
//! use wavemix::CombinationCode;
//! use wavemix_fit::config::SeedCatalog;
//!
//! let catalog = SeedCatalog::builtin();
//! let chip = "E".parse().unwrap();
//! let entry = catalog.seed(chip, CombinationCode::TriangleSawtoothPulse).unwrap();
//! assert_eq!(entry.score, Some(2));
//! ```

use crate::reference::ChipId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use wavemix::{CombinationCode, ParameterVector};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read seed catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Chip '{0}' is not in the seed catalog")]
    UnknownChip(ChipId),
}

/// Root of the seed catalog file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub chips: BTreeMap<ChipId, ChipSeeds>,
}

/// Seeds recorded for one sampled chip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipSeeds {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seeds: BTreeMap<CombinationCode, SeedEntry>,
}

/// One starting vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedEntry {
    pub bias: f32,
    pub pulse_strength: f32,
    pub top_bit: f32,
    pub distance: f32,
    pub stmix: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl SeedEntry {
    pub fn from_params(params: &ParameterVector, score: Option<u32>) -> Self {
        Self {
            bias: params.bias,
            pulse_strength: params.pulse_strength,
            top_bit: params.top_bit,
            distance: params.distance,
            stmix: params.stmix,
            score,
        }
    }

    pub fn params(&self) -> ParameterVector {
        ParameterVector::new(self.bias, self.pulse_strength, self.top_bit, self.distance, self.stmix)
    }
}

impl SeedCatalog {
    /// Load a catalog from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: Self = serde_yaml::from_str(&contents)?;
        Ok(catalog)
    }

    /// Load `path` when given and present, the built-in catalog otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::info!(path = %path.display(), "seed catalog not found, using built-in seeds");
                Ok(Self::builtin())
            }
            None => Ok(Self::builtin()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn chip(&self, chip: ChipId) -> Result<&ChipSeeds, ConfigError> {
        self.chips.get(&chip).ok_or(ConfigError::UnknownChip(chip))
    }

    pub fn seed(&self, chip: ChipId, code: CombinationCode) -> Option<SeedEntry> {
        self.chips.get(&chip)?.seeds.get(&code).copied()
    }

    /// Record `entry`, creating the chip section if needed.
    pub fn insert(&mut self, chip: ChipId, code: CombinationCode, entry: SeedEntry) {
        self.chips.entry(chip).or_default().seeds.insert(code, entry);
    }

    /// Hand-curated fits of three 6581 and two 8580 samples.
    pub fn builtin() -> Self {
        let mut chips = BTreeMap::new();
        for (letter, description, rows) in BUILTIN {
            let Ok(chip) = ChipId::new(letter) else {
                continue;
            };
            let seeds = rows
                .iter()
                .filter_map(|&(code, [bias, pulse_strength, top_bit, distance, stmix], score)| {
                    let code = CombinationCode::try_from(code).ok()?;
                    let entry = SeedEntry {
                        bias,
                        pulse_strength,
                        top_bit,
                        distance,
                        stmix,
                        score: Some(score),
                    };
                    Some((code, entry))
                })
                .collect();
            chips.insert(
                chip,
                ChipSeeds {
                    description: description.to_string(),
                    seeds,
                },
            );
        }
        Self { chips }
    }
}

type SeedRow = (u8, [f32; 5], u32);

// (code, [bias, pulse_strength, top_bit, distance, stmix], score)
const BUILTIN: [(char, &str, [SeedRow; 4]); 5] = [
    (
        'D',
        "6581",
        [
            (3, [0.9321273, 0.0, 0.0, 0.8860587, 0.5655726], 278),
            (5, [0.8931507, 2.483499, 0.0, 0.03339716, 0.0], 600),
            (6, [0.8869214, 2.440879, 1.680824, 0.02267573, 0.0], 613),
            (7, [0.9266459, 0.7393153, 0.0, 0.0598464, 0.1851717], 44),
        ],
    ),
    (
        'E',
        "6581",
        [
            (3, [0.9689716, 0.0, 0.0, 1.92, 0.718864], 144),
            (5, [0.9161022, 1.879311, 0.0, 0.02331964, 0.0], 166),
            (6, [0.879145, 1.30156, 0.0, 0.006426161, 0.0], 10),
            (7, [0.9493611, 0.6681492, 0.0, 0.04524437, 0.1509331], 2),
        ],
    ),
    (
        'G',
        "6581",
        [
            (3, [0.9393118, 0.0, 0.0, 1.038816, 0.5292149], 252),
            (5, [0.8924618, 2.01122, 0.0, 0.03133072, 0.0], 360),
            (6, [0.8952018, 2.213601, 1.705941, 0.01260567, 0.0], 668),
            (7, [0.9322878, 0.9076391, 0.0, 0.05378763, 0.5269188], 10),
        ],
    ),
    (
        'V',
        "8580",
        [
            (3, [0.9738218, 0.0, 0.992848, 2.547508, 0.9599405], 314),
            (5, [0.9236207, 2.19129, 0.0, 0.1108298, 0.0], 628),
            (6, [0.9248214, 2.232846, 0.9491023, 0.1313893, 0.0], 593),
            (7, [0.9845552, 1.380867, 0.9621406, 1.592066, 0.9472086], 168),
        ],
    ),
    (
        'W',
        "8580",
        [
            (3, [0.9686383, 0.0, 0.9955494, 2.141108, 0.9635284], 314),
            (5, [0.9069195, 2.203437, 0.0, 1.129717, 0.0], 784),
            (6, [0.9074827, 2.181073, 0.9776345, 0.1201432, 0.0], 759),
            (7, [0.9882526, 1.736355, 0.9395381, 2.698372, 1.0], 211),
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chip(letter: char) -> ChipId {
        ChipId::new(letter).unwrap()
    }

    #[test]
    fn builtin_covers_five_chips_and_all_codes() {
        let catalog = SeedCatalog::builtin();
        assert_eq!(catalog.chips.len(), 5);
        for letter in ['D', 'E', 'G', 'V', 'W'] {
            let seeds = &catalog.chip(chip(letter)).unwrap().seeds;
            assert_eq!(seeds.len(), 4, "chip {letter}");
            for code in CombinationCode::ALL {
                assert!(seeds.contains_key(&code), "chip {letter} code {code}");
            }
        }
    }

    #[test]
    fn builtin_values_are_exact() {
        let catalog = SeedCatalog::builtin();
        let d6 = catalog.seed(chip('D'), CombinationCode::SawtoothPulse).unwrap();
        assert_eq!(d6.params(), ParameterVector::new(0.8869214, 2.440879, 1.680824, 0.02267573, 0.0));
        assert_eq!(d6.score, Some(613));
        assert_eq!(catalog.chip(chip('W')).unwrap().description, "8580");
    }

    #[test]
    fn unknown_chip_and_missing_seed() {
        let catalog = SeedCatalog::builtin();
        assert!(matches!(catalog.chip(chip('A')), Err(ConfigError::UnknownChip(_))));
        assert_eq!(catalog.seed(chip('A'), CombinationCode::TriangleSawtooth), None);
    }

    #[test]
    fn parses_documented_layout() {
        let yaml = r#"
chips:
  d:
    description: "6581"
    seeds:
      3: { bias: 0.9321273, pulse_strength: 0.0, top_bit: 0.0, distance: 0.8860587, stmix: 0.5655726, score: 278 }
      7: { bias: 0.9, pulse_strength: 1.0, top_bit: 0.0, distance: 0.05, stmix: 0.2 }
"#;
        let catalog: SeedCatalog = serde_yaml::from_str(yaml).unwrap();
        let st = catalog.seed(chip('D'), CombinationCode::TriangleSawtooth).unwrap();
        assert_eq!(st.distance, 0.8860587);
        let pst = catalog.seed(chip('D'), CombinationCode::TriangleSawtoothPulse).unwrap();
        assert_eq!(pst.score, None);
    }

    #[test]
    fn rejects_invalid_code_key() {
        let yaml = "chips:\n  D:\n    seeds:\n      4: { bias: 0.9, pulse_strength: 0.0, top_bit: 0.0, distance: 1.0, stmix: 0.0 }\n";
        assert!(serde_yaml::from_str::<SeedCatalog>(yaml).is_err());
    }

    #[test]
    fn saved_catalog_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/seeds.yaml");
        let mut catalog = SeedCatalog::builtin();
        catalog.insert(
            chip('A'),
            CombinationCode::TrianglePulse,
            SeedEntry::from_params(&ParameterVector::new(0.9, 2.0, 0.0, 0.03, 0.0), None),
        );
        catalog.save(&path).unwrap();

        let loaded = SeedCatalog::load(&path).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let catalog = SeedCatalog::load_or_builtin(Some(&path)).unwrap();
        assert_eq!(catalog, SeedCatalog::builtin());
    }
}

//! TOML-backed tuning shared by every subsystem of a session.

use rune_hall_world::WorldConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing a tuning document.
#[derive(Debug, Error)]
pub enum TuningError {
    /// The document is not valid TOML or does not match the tuning layout.
    #[error("failed to parse tuning document")]
    Parse(#[from] toml::de::Error),
    /// The tuning could not be rendered as TOML.
    #[error("failed to serialise tuning document")]
    Serialize(#[from] toml::ser::Error),
    /// Tiles must have a positive side length.
    #[error("tile length must be positive, got {0}")]
    InvalidTileLength(f32),
}

/// Every tunable of a session, grouped by subsystem.
///
/// Missing tables and keys fall back to their defaults, so an empty document
/// is a valid tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Seed for the session's random number generator.
    pub seed: u64,
    /// Side length of a tile in pixels.
    pub tile_length: f32,
    /// Player-facing parameters.
    pub world: WorldConfig,
    /// Hall time budget.
    pub clock: rune_hall_system_clock::Config,
    /// Enchantment spawn cadence and effects.
    pub enchantments: rune_hall_system_enchantments::Config,
    /// Monster spawn cadence and behaviour.
    pub monsters: rune_hall_system_monsters::Config,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            tile_length: 32.0,
            world: WorldConfig::default(),
            clock: rune_hall_system_clock::Config::default(),
            enchantments: rune_hall_system_enchantments::Config::default(),
            monsters: rune_hall_system_monsters::Config::default(),
        }
    }
}

impl SessionTuning {
    /// Parses a tuning document.
    pub fn from_toml_str(contents: &str) -> Result<Self, TuningError> {
        let tuning: Self = toml::from_str(contents)?;
        if tuning.tile_length.is_nan() || tuning.tile_length <= 0.0 {
            return Err(TuningError::InvalidTileLength(tuning.tile_length));
        }
        Ok(tuning)
    }

    /// Renders the tuning as a TOML document.
    pub fn to_toml_string(&self) -> Result<String, TuningError> {
        Ok(toml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let tuning = SessionTuning::from_toml_str("").expect("empty tuning parses");
        assert_eq!(tuning, SessionTuning::default());
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let tuning = SessionTuning::from_toml_str(
            "seed = 7\n\n[monsters]\nspawn_interval_secs = 3\nattack_while_lured = false\n",
        )
        .expect("tuning parses");
        assert_eq!(tuning.seed, 7);
        assert_eq!(tuning.monsters.spawn_interval_secs, 3);
        assert!(!tuning.monsters.attack_while_lured);
        assert_eq!(tuning.monsters.placement_attempts, 50);
        assert_eq!(tuning.enchantments, rune_hall_system_enchantments::Config::default());
    }

    #[test]
    fn rendered_tuning_parses_back() {
        let mut tuning = SessionTuning::default();
        tuning.world.cloak_secs = 12;
        let rendered = tuning.to_toml_string().expect("tuning renders");
        assert_eq!(
            SessionTuning::from_toml_str(&rendered).expect("rendered tuning parses"),
            tuning
        );
    }

    #[test]
    fn non_positive_tile_length_is_rejected() {
        let error = SessionTuning::from_toml_str("tile_length = 0.0").unwrap_err();
        assert!(matches!(error, TuningError::InvalidTileLength(_)));
    }
}

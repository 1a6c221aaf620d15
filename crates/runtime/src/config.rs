//! Runtime configuration from environment variables
//!
//! - `BLOCKRISE_SEED`: RNG seed (default: derived from the clock)
//! - `BLOCKRISE_SAVE_PATH`: save file (default: `blockrise_save.json`)
//! - `BLOCKRISE_DISABLE_SAVE`: set to "1" or "true" to disable persistence
//! - `BLOCKRISE_AUTOSAVE_SECS`: autosave interval (default: 5.0)
//! - `BLOCKRISE_RUN_SECS`: headless run length (default: 60)
//! - `BLOCKRISE_MODE`: `zen` or `classic` (default: zen)

use std::env;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use blockrise_types::GameMode;

pub const DEFAULT_SAVE_PATH: &str = "blockrise_save.json";

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub seed: u32,
    /// `None` disables persistence
    pub save_path: Option<PathBuf>,
    pub autosave_secs: f32,
    pub run_secs: f32,
    pub mode: GameMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: clock_seed(),
            save_path: Some(PathBuf::from(DEFAULT_SAVE_PATH)),
            autosave_secs: 5.0,
            run_secs: 60.0,
            mode: GameMode::Zen,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let seed = lookup("BLOCKRISE_SEED")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.seed);

        let disabled = lookup("BLOCKRISE_DISABLE_SAVE")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        let save_path = if disabled {
            None
        } else {
            lookup("BLOCKRISE_SAVE_PATH")
                .map(|s| s.trim().to_string())
                .and_then(|s| if s.is_empty() { None } else { Some(PathBuf::from(s)) })
                .or(defaults.save_path)
        };

        let autosave_secs = lookup("BLOCKRISE_AUTOSAVE_SECS")
            .and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(defaults.autosave_secs);

        let run_secs = lookup("BLOCKRISE_RUN_SECS")
            .and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(defaults.run_secs);

        let mode = lookup("BLOCKRISE_MODE")
            .and_then(|s| GameMode::from_str(&s))
            .unwrap_or(defaults.mode);

        Self {
            seed,
            save_path,
            autosave_secs,
            run_secs,
            mode,
        }
    }

    pub fn persistence_enabled(&self) -> bool {
        self.save_path.is_some()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_nanos() as u32) ^ (d.as_secs() as u32))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.save_path, Some(PathBuf::from(DEFAULT_SAVE_PATH)));
        assert_eq!(config.autosave_secs, 5.0);
        assert_eq!(config.run_secs, 60.0);
        assert_eq!(config.mode, GameMode::Zen);
    }

    #[test]
    fn test_values_are_parsed() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("BLOCKRISE_SEED", "42"),
            ("BLOCKRISE_SAVE_PATH", "/tmp/br.json"),
            ("BLOCKRISE_AUTOSAVE_SECS", "2.5"),
            ("BLOCKRISE_RUN_SECS", "10"),
            ("BLOCKRISE_MODE", "classic"),
        ]));
        assert_eq!(config.seed, 42);
        assert_eq!(config.save_path, Some(PathBuf::from("/tmp/br.json")));
        assert_eq!(config.autosave_secs, 2.5);
        assert_eq!(config.run_secs, 10.0);
        assert_eq!(config.mode, GameMode::ClassicRelax);
    }

    #[test]
    fn test_disable_save_wins() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("BLOCKRISE_DISABLE_SAVE", "true"),
            ("BLOCKRISE_SAVE_PATH", "/tmp/br.json"),
        ]));
        assert!(!config.persistence_enabled());
    }

    #[test]
    fn test_garbage_values_fall_back() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("BLOCKRISE_AUTOSAVE_SECS", "-3"),
            ("BLOCKRISE_MODE", "arcade"),
            ("BLOCKRISE_SEED", "x"),
        ]));
        assert_eq!(config.autosave_secs, 5.0);
        assert_eq!(config.mode, GameMode::Zen);
    }

    #[test]
    fn test_from_env_does_not_panic() {
        let _config = RuntimeConfig::from_env();
    }
}

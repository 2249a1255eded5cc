use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::coin::CoinStyle;
use crate::error::Result;
use crate::finger::{FingerConfig, DEFAULT_ORBIT_SECS, MIN_WINNERS};
use crate::spinner::option::{default_options, from_stored, to_stored};
use crate::spinner::{SpinOption, StoredOption};
use crate::usage::DEFAULT_USAGE_LIMIT;

pub const DEFAULT_SPINNER_TITLE: &str = "What to eat?";

/// Persisted user settings. Keys missing from the file take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub max_winners: usize,
    pub orbit_secs: f64,
    pub spinner_title: String,
    pub spinner_options: Vec<StoredOption>,
    pub coin_style: CoinStyle,
    pub usage_limit: u32,
    pub unlocked: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_winners: MIN_WINNERS,
            orbit_secs: DEFAULT_ORBIT_SECS,
            spinner_title: DEFAULT_SPINNER_TITLE.to_string(),
            spinner_options: to_stored(&default_options()),
            coin_style: CoinStyle::default(),
            usage_limit: DEFAULT_USAGE_LIMIT,
            unlocked: false,
        }
    }
}

impl Settings {
    pub fn finger_config(&self) -> FingerConfig {
        FingerConfig::from_settings(self.max_winners, self.orbit_secs)
    }

    /// Wheel options, falling back to the default wheel when nothing usable
    /// is stored
    pub fn wheel_options(&self) -> Vec<SpinOption> {
        let options = from_stored(&self.spinner_options);
        if options.is_empty() {
            warn!("no usable spinner options stored, using the default wheel");
            return default_options();
        }
        options
    }

    pub fn set_wheel_options(&mut self, options: &[SpinOption]) {
        self.spinner_options = to_stored(options);
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "randofun") {
            pd.config_dir().join("settings.json")
        } else {
            PathBuf::from("randofun_settings.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        let Ok(bytes) = fs::read(&self.path) else {
            return Settings::default();
        };
        match serde_json::from_slice::<Settings>(&bytes) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable settings");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("settings.json"));
        let settings = Settings::default();
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_and_load_custom_settings() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("nested/settings.json"));
        let settings = Settings {
            max_winners: 3,
            orbit_secs: 7.5,
            spinner_title: "Who pays?".into(),
            spinner_options: vec![
                StoredOption::new("Ann", Some(700)),
                StoredOption::new("Bo", None),
            ],
            coin_style: CoinStyle::Futuristic,
            usage_limit: 25,
            unlocked: true,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn malformed_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileSettingsStore::with_path(&path).load(), Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, br#"{ "max_winners": 2, "coin_style": "japanese" }"#).unwrap();
        let loaded = FileSettingsStore::with_path(&path).load();
        assert_eq!(loaded.max_winners, 2);
        assert_eq!(loaded.coin_style, CoinStyle::Japanese);
        assert_eq!(loaded.usage_limit, DEFAULT_USAGE_LIMIT);
    }

    #[test]
    fn out_of_range_finger_settings_are_clamped() {
        let settings = Settings {
            max_winners: 9,
            orbit_secs: 60.0,
            ..Settings::default()
        };
        let config = settings.finger_config();
        assert_eq!(config.max_winners, 1);
        assert_eq!(config.orbit, Duration::from_secs(10));
    }

    #[test]
    fn blank_wheel_falls_back_to_defaults() {
        let settings = Settings {
            spinner_options: vec![StoredOption::new("   ", Some(5))],
            ..Settings::default()
        };
        assert_eq!(settings.wheel_options(), default_options());
    }

    #[test]
    fn wheel_options_are_stored_as_parts_of_a_thousand() {
        let mut settings = Settings::default();
        settings.set_wheel_options(&[SpinOption::new("x", 1.0), SpinOption::new("y", 1.0)]);
        assert_eq!(
            settings.spinner_options,
            vec![
                StoredOption::new("x", Some(500)),
                StoredOption::new("y", Some(500)),
            ]
        );
        let weights: Vec<f64> = settings.wheel_options().iter().map(|o| o.weight).collect();
        assert_eq!(weights, vec![500.0, 500.0]);
    }
}

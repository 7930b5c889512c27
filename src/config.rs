//! Per-sensor enabled flags, injected into the registry at construction.

use std::{collections::BTreeMap, fs, path::PathBuf, sync::RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Mapping from sensor name to enabled flag. Sensors not named are enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorToggles {
    #[serde(default)]
    sensors: BTreeMap<String, bool>,
}

impl SensorToggles {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.sensors.get(name).copied().unwrap_or(true)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        self.sensors.insert(name.to_string(), enabled);
    }
}

/// JSON-file-backed toggle store. Missing or unreadable files fall back to the
/// all-enabled default.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<SensorToggles>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            SensorToggles::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn toggles(&self) -> SensorToggles {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, toggles: SensorToggles) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            *guard = toggles;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &SensorToggles) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_sensors_default_to_enabled() {
        let toggles = SensorToggles::default();
        assert!(toggles.is_enabled("Motion"));
    }

    #[test]
    fn explicit_flags_win_over_the_default() {
        let mut toggles = SensorToggles::default();
        toggles.set_enabled("Connectivity", false);
        assert!(!toggles.is_enabled("Connectivity"));
        assert!(toggles.is_enabled("Charging"));
    }

    #[test]
    fn store_round_trips_through_disk() {
        let path = std::env::temp_dir().join(format!(
            "sensekit-config-{}.json",
            uuid::Uuid::new_v4()
        ));

        {
            let store = ConfigStore::new(path.clone()).unwrap();
            let mut toggles = store.toggles();
            toggles.set_enabled("Motion", false);
            store.update(toggles).unwrap();
        }

        let store = ConfigStore::new(path.clone()).unwrap();
        assert!(!store.toggles().is_enabled("Motion"));

        std::fs::remove_file(&path).ok();
    }
}

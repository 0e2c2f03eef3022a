use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::prediction::threshold_from_sensitivity;

pub const DEFAULT_SENSITIVITY: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// 1 (only the surest predictions) to 10 (everything plausible).
    pub sensitivity: u8,
    pub tracking_enabled: bool,
    pub reminder_notifications: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            tracking_enabled: false,
            reminder_notifications: true,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing or unreadable-as-JSON file yields defaults;
    /// an out-of-range sensitivity is reset to the default.
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data: UserSettings = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        if threshold_from_sensitivity(data.sensitivity).is_err() {
            log::warn!(
                "Ignoring stored sensitivity {}; using {}",
                data.sensitivity,
                DEFAULT_SENSITIVITY
            );
            data.sensitivity = DEFAULT_SENSITIVITY;
        }

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> Result<UserSettings> {
        Ok(self.read()?.clone())
    }

    pub fn sensitivity(&self) -> Result<u8> {
        Ok(self.read()?.sensitivity)
    }

    /// Confidence threshold derived from the stored sensitivity.
    pub fn confidence_threshold(&self) -> Result<f64> {
        let sensitivity = self.sensitivity()?;
        Ok(threshold_from_sensitivity(sensitivity)?)
    }

    pub fn tracking_enabled(&self) -> Result<bool> {
        Ok(self.read()?.tracking_enabled)
    }

    pub fn reminder_notifications(&self) -> Result<bool> {
        Ok(self.read()?.reminder_notifications)
    }

    /// Store a new sensitivity and return the threshold it maps to.
    pub fn update_sensitivity(&self, sensitivity: u8) -> Result<f64> {
        let threshold = threshold_from_sensitivity(sensitivity)?;
        self.update(|settings| settings.sensitivity = sensitivity)?;
        Ok(threshold)
    }

    pub fn update_tracking_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.tracking_enabled = enabled)
    }

    pub fn update_reminder_notifications(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.reminder_notifications = enabled)
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = self.write()?;
        let mut next = guard.clone();
        apply(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, UserSettings>> {
        self.data
            .read()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, UserSettings>> {
        self.data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.get().unwrap(), UserSettings::default());
        assert!((store.confidence_threshold().unwrap() - 0.6).abs() < 1e-9);
        assert!(!store.tracking_enabled().unwrap());
        assert!(store.reminder_notifications().unwrap());
    }

    #[test]
    fn tracking_stays_on_once_enabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store.update_tracking_enabled(true).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert!(reopened.tracking_enabled().unwrap());
    }

    #[test]
    fn updates_persist_across_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        let threshold = store.update_sensitivity(8).unwrap();
        assert!((threshold - 0.3).abs() < 1e-9);
        store.update_reminder_notifications(false).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        let settings = reopened.get().unwrap();
        assert_eq!(settings.sensitivity, 8);
        assert!(!settings.reminder_notifications);
        assert!(!settings.tracking_enabled);
    }

    #[test]
    fn rejects_out_of_range_sensitivity() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert!(store.update_sensitivity(0).is_err());
        assert!(store.update_sensitivity(11).is_err());
        assert_eq!(store.sensitivity().unwrap(), DEFAULT_SENSITIVITY);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.get().unwrap(), UserSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "sensitivity": 42 }"#).unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.sensitivity().unwrap(), DEFAULT_SENSITIVITY);
        assert!((store.confidence_threshold().unwrap() - 0.6).abs() < 1e-9);
        assert!(store.reminder_notifications().unwrap());
    }
}

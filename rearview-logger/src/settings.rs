//! Persisted settings
//!
//! The settings file caches the radar's identity between runs together with
//! optional calibration and threshold overrides. It is read once at startup;
//! the resolved identity is written back before samples are processed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use rearview_core::config::DEFAULT_IDLE_TIMEOUT_MS;
use rearview_core::{AdmissionWindow, Calibration, PassConfig};
use serde::{Deserialize, Serialize};

use crate::CONFIG_FILE;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("--sticker-id or a stickerId in the settings file is required")]
    MissingStickerId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bluetooth_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<AdmissionWindow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_ms: Option<u64>,
}

/// Which radar this run talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorIdentity {
    pub sticker_id: String,
    /// Known once the radar has been found; None until then
    pub bluetooth_address: Option<String>,
}

impl Settings {
    /// `config.json` in the user configuration directory, or in the
    /// working directory when there is none
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "rearview-logger")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Read the settings file. A missing or unreadable file means no
    /// settings; a file that does not parse is an error, so that it is never
    /// overwritten with defaults.
    pub fn load(path: &Path) -> anyhow::Result<Option<Settings>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                log::debug!("No settings at {}: {}", path.display(), e);
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading settings {}", path.display()));
            }
        };

        let settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings {}", path.display()))?;
        Ok(Some(settings))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Decide which radar to use. An explicit sticker ID wins over the stored
    /// one; the stored address is only trusted for the sticker it was found for.
    pub fn resolve_identity(
        &self,
        sticker_id: Option<&str>,
    ) -> Result<SensorIdentity, SettingsError> {
        let sticker_id = match (sticker_id, self.sticker_id.as_deref()) {
            (Some(id), _) => id,
            (None, Some(id)) => id,
            (None, None) => return Err(SettingsError::MissingStickerId),
        };

        let bluetooth_address = if self.sticker_id.as_deref() == Some(sticker_id) {
            self.bluetooth_address.clone()
        } else {
            None
        };

        Ok(SensorIdentity {
            sticker_id: sticker_id.to_string(),
            bluetooth_address,
        })
    }

    pub fn remember(&mut self, identity: &SensorIdentity) {
        self.sticker_id = Some(identity.sticker_id.clone());
        self.bluetooth_address = identity.bluetooth_address.clone();
    }

    /// Pass tracking configuration with the stored overrides applied
    pub fn pass_config(&self) -> PassConfig {
        PassConfig {
            calibration: self.calibration.unwrap_or_default(),
            admission: self.thresholds.unwrap_or_default(),
            idle_timeout_ms: self.idle_timeout_ms.unwrap_or(DEFAULT_IDLE_TIMEOUT_MS),
            ..Default::default()
        }
    }
}

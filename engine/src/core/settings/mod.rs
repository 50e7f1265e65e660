//! Settings Persistence System
//!
//! Provides persistent sync settings with:
//! - Atomic file writes (temp file + swap)
//! - Schema validation with defaults
//! - Migration support for schema changes
//!
//! Storage location: {config_dir}/settings.json

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::{info, warn};

use crate::core::commands::DEFAULT_MAX_HISTORY;
use crate::core::cues::{TrackMeta, DEFAULT_STEP_MS};
use crate::core::fs::atomic_write_json_pretty;
use crate::core::validation::{SubtitleSpecification, DEFAULT_MIN_DURATION_FLOOR_MS};
use crate::core::TimeMs;

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Upper bound for durations and steps, one hour
const MAX_DURATION_MS: TimeMs = 3_600_000;

/// Sync settings applied to every new editing session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Specification used when a track document carries none
    #[serde(default)]
    pub spec: SubtitleSpecification,

    #[serde(default)]
    pub track: TrackDefaults,

    #[serde(default)]
    pub editing: EditingSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            spec: SubtitleSpecification::default(),
            track: TrackDefaults::default(),
            editing: EditingSettings::default(),
        }
    }
}

impl SyncSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected instead of rejected, so an old or hand-edited
    /// file still loads.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.spec.min_duration_ms = self.spec.min_duration_ms.filter(|ms| *ms > 0);
        self.spec.max_duration_ms = self
            .spec
            .max_duration_ms
            .filter(|ms| *ms > 0)
            .map(|ms| ms.min(MAX_DURATION_MS));
        if let (Some(min), Some(max)) = (self.spec.min_duration_ms, self.spec.max_duration_ms) {
            if min > max {
                warn!(min, max, "Minimum duration exceeds maximum, dropping maximum");
                self.spec.max_duration_ms = None;
            }
        }
        self.spec.max_lines_per_caption = self.spec.max_lines_per_caption.filter(|n| *n > 0);
        self.spec.max_characters_per_line = self.spec.max_characters_per_line.filter(|n| *n > 0);

        self.editing.default_step_ms = self.editing.default_step_ms.clamp(100, MAX_DURATION_MS);
        self.editing.min_duration_floor_ms = self.editing.min_duration_floor_ms.clamp(1, 10_000);
        self.editing.max_history = self.editing.max_history.clamp(1, 10_000);
    }

    /// Track metadata for a new caption track in `language`
    pub fn track_meta(&self, language: &str) -> TrackMeta {
        TrackMeta::caption(language).with_overlap(self.track.overlap_enabled)
    }
}

/// Defaults for new tracks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackDefaults {
    /// Whether neighbouring cues may overlap
    #[serde(default)]
    pub overlap_enabled: bool,
}

/// Editing behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct EditingSettings {
    /// Length of a cue added without a source interval
    #[serde(default = "default_step_ms")]
    pub default_step_ms: TimeMs,

    /// Duration an edit falls back to when no specification minimum applies
    #[serde(default = "default_min_duration_floor_ms")]
    pub min_duration_floor_ms: TimeMs,

    /// Undoable commands kept per session
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self {
            default_step_ms: default_step_ms(),
            min_duration_floor_ms: default_min_duration_floor_ms(),
            max_history: default_max_history(),
        }
    }
}

fn default_step_ms() -> TimeMs {
    DEFAULT_STEP_MS
}

fn default_min_duration_floor_ms() -> TimeMs {
    DEFAULT_MIN_DURATION_FLOOR_MS
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager rooted at `config_dir`
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(
        &self,
        exclusive: bool,
        op: impl FnOnce() -> Result<T, String>,
    ) -> Result<T, String> {
        // The lock file lives next to the settings file.
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| format!("Failed to open settings lock file: {}", e))?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)
                .map_err(|e| format!("Failed to lock settings file (exclusive): {}", e))?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)
                .map_err(|e| format!("Failed to lock settings file (shared): {}", e))?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> SyncSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(SyncSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)
                .map_err(|e| format!("Failed to read settings file: {}", e))?;

            let mut settings = serde_json::from_str::<SyncSettings>(&content)
                .map_err(|e| format!("Failed to parse settings file: {}", e))?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = Self::migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                SyncSettings::default()
            }
        }
    }

    /// Normalize and persist settings, returning what was written
    pub fn save(&self, settings: &SyncSettings) -> Result<SyncSettings, String> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            atomic_write_json_pretty(&self.settings_path, &normalized)
                .map_err(|e| format!("Failed to write settings file: {}", e))?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> Result<SyncSettings, String> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)
                    .map_err(|e| format!("Failed to delete settings file: {}", e))?;
                info!("Settings file deleted");
            }
            Ok(SyncSettings::default())
        })
    }

    fn migrate(mut settings: SyncSettings) -> SyncSettings {
        // Version 0 files predate the editing section; serde defaults cover it.
        settings.version = SETTINGS_VERSION;
        settings
    }
}

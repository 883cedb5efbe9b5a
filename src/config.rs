//! Picker configuration: three explicit tiers resolved once at construction.
//!
//! Resolution order (later tiers override earlier ones, field-wise):
//! 1. Built-in defaults
//! 2. Process-wide override profile, registered once by the host via
//!    [`register_profile`] (the shipped binary registers `$DIRPICK_PROFILE`
//!    or `~/.config/dirpick/profile.toml` when present)
//! 3. Per-instance options (`--config` file and CLI flags)
//!
//! The resolved snapshot is never re-read afterwards.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

// ── Section configs ──────────────────────────────────────────────────────────

/// Core picker settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PickerSection {
    /// Path auto-expanded when the tree is (re)built.
    pub initial_path: Option<String>,
    /// Whether each loaded branch offers a create-folder row.
    pub allow_create_folder: Option<bool>,
}

/// Display strings for the create-folder affordance. Pure presentation.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LabelsSection {
    pub create_folder: Option<String>,
    pub folder_name: Option<String>,
    pub cancel: Option<String>,
}

/// Color settings for a custom theme.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeSection {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level picker configuration.
///
/// All fields are optional so that partial configs from different tiers
/// can be merged (instance overrides profile, profile overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PickerConfig {
    pub picker: PickerSection,
    pub labels: LabelsSection,
    pub theme: ThemeSection,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_INITIAL_PATH: &str = "/";
pub const DEFAULT_CREATE_FOLDER_LABEL: &str = "Create folder";
pub const DEFAULT_FOLDER_NAME_LABEL: &str = "Folder name";
pub const DEFAULT_CANCEL_LABEL: &str = "Cancel";

// ── Process-wide override profile ────────────────────────────────────────────

static GLOBAL_PROFILE: OnceLock<PickerConfig> = OnceLock::new();

/// Register the process-wide override profile. Returns `false` when a
/// profile was already registered; the first registration wins.
pub fn register_profile(profile: PickerConfig) -> bool {
    GLOBAL_PROFILE.set(profile).is_ok()
}

/// Candidate profile file paths in priority order, for hosts that keep
/// their override profile on disk.
pub fn profile_candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(env_path) = std::env::var("DIRPICK_PROFILE") {
        paths.push(PathBuf::from(env_path));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("dirpick").join("profile.toml"));
    }
    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
pub fn load_file(path: &Path) -> Option<PickerConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match toml::from_str::<PickerConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl PickerConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &PickerConfig) -> PickerConfig {
        PickerConfig {
            picker: PickerSection {
                initial_path: other
                    .picker
                    .initial_path
                    .clone()
                    .or(self.picker.initial_path),
                allow_create_folder: other
                    .picker
                    .allow_create_folder
                    .or(self.picker.allow_create_folder),
            },
            labels: LabelsSection {
                create_folder: other
                    .labels
                    .create_folder
                    .clone()
                    .or(self.labels.create_folder),
                folder_name: other.labels.folder_name.clone().or(self.labels.folder_name),
                cancel: other.labels.cancel.clone().or(self.labels.cancel),
            },
            theme: ThemeSection {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Resolve the final configuration from the three tiers, reading the
    /// registered process-wide profile.
    pub fn resolve(instance: Option<&PickerConfig>) -> PickerConfig {
        Self::resolve_with(GLOBAL_PROFILE.get(), instance)
    }

    /// Tier merge with an explicit profile; `resolve` is the OnceLock-backed
    /// entry point.
    pub fn resolve_with(
        profile: Option<&PickerConfig>,
        instance: Option<&PickerConfig>,
    ) -> PickerConfig {
        let mut config = PickerConfig::default();
        if let Some(profile) = profile {
            config = config.merge(profile);
        }
        if let Some(instance) = instance {
            config = config.merge(instance);
        }
        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn initial_path(&self) -> &str {
        self.picker
            .initial_path
            .as_deref()
            .unwrap_or(DEFAULT_INITIAL_PATH)
    }

    pub fn allow_create_folder(&self) -> bool {
        self.picker.allow_create_folder.unwrap_or(true)
    }

    pub fn create_folder_label(&self) -> &str {
        self.labels
            .create_folder
            .as_deref()
            .unwrap_or(DEFAULT_CREATE_FOLDER_LABEL)
    }

    pub fn folder_name_label(&self) -> &str {
        self.labels
            .folder_name
            .as_deref()
            .unwrap_or(DEFAULT_FOLDER_NAME_LABEL)
    }

    pub fn cancel_label(&self) -> &str {
        self.labels.cancel.as_deref().unwrap_or(DEFAULT_CANCEL_LABEL)
    }

    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }

    /// Snapshot the resolved values the picker itself consumes.
    pub fn options(&self) -> Options {
        Options {
            initial_path: self.initial_path().to_string(),
            allow_create_folder: self.allow_create_folder(),
            labels: Labels {
                create_folder: self.create_folder_label().to_string(),
                folder_name: self.folder_name_label().to_string(),
                cancel: self.cancel_label().to_string(),
            },
        }
    }
}

// ── Resolved snapshots ───────────────────────────────────────────────────────

/// Display strings after resolution.
#[derive(Debug, Clone)]
pub struct Labels {
    pub create_folder: String,
    pub folder_name: String,
    pub cancel: String,
}

/// Picker options after resolution; never re-read from config tiers.
#[derive(Debug, Clone)]
pub struct Options {
    pub initial_path: String,
    pub allow_create_folder: bool,
    pub labels: Labels,
}

impl Default for Options {
    fn default() -> Self {
        PickerConfig::default().options()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

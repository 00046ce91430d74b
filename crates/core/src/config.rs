use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color::{default_palette, Color};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_f32(profile: &str, key: &str, default: f32) -> f32 {
    match profiled_env_opt(profile, key) {
        Some(raw) => match raw.parse::<f32>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                tracing::warn!(key, value = %raw, default, "ignoring unparseable number");
                default
            }
        },
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub layout: LayoutConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `COSMOS_PROFILE`. When set (e.g. `DEMO`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("COSMOS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            storage: StorageConfig::from_env_profiled(p),
            layout: LayoutConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  storage:  backend={}, data_dir={}",
            self.storage.backend,
            self.storage.data_dir.display()
        );
        tracing::info!(
            "  layout:   ground_bound={}, baseline_y={}, max_yaw={:.3}, palette={}",
            self.layout.ground_bound,
            self.layout.baseline_y,
            self.layout.max_yaw,
            self.layout.palette.len()
        );
    }

    /// Resolved settings as JSON, for `cosmos status`.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "storage": {
                "backend": self.storage.backend.to_string(),
                "data_dir": self.storage.data_dir,
            },
            "layout": {
                "ground_bound": self.layout.ground_bound,
                "baseline_y": self.layout.baseline_y,
                "max_yaw": self.layout.max_yaw,
                "palette": self.layout.palette,
            },
        })
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// One file per record under `data_dir/records`.
    Local,
    /// Process-lifetime only.
    Memory,
}

impl std::fmt::Display for StorageBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendKind::Local => write!(f, "local"),
            StorageBackendKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        let backend = match profiled_env_opt(p, "COSMOS_STORAGE").as_deref() {
            None | Some("local") => StorageBackendKind::Local,
            Some("memory") => StorageBackendKind::Memory,
            Some(other) => {
                tracing::warn!(value = %other, "unknown COSMOS_STORAGE, using local");
                StorageBackendKind::Local
            }
        };
        let data_dir = profiled_env_opt(p, "DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        Self { backend, data_dir }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Local,
            data_dir: default_data_dir(),
        }
    }
}

/// Platform data directory (`~/.local/share/cosmos` on Linux), else `./data`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("cosmos"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

// ── Layout ────────────────────────────────────────────────────

/// Bounds for placing new books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Half-width of the square on the ground plane (x and z).
    pub ground_bound: f32,
    /// Fixed height of every new book.
    pub baseline_y: f32,
    /// Maximum absolute yaw in radians.
    pub max_yaw: f32,
    pub palette: Vec<Color>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            ground_bound: 4.0,
            baseline_y: 0.0,
            max_yaw: std::f32::consts::FRAC_PI_2,
            palette: default_palette(),
        }
    }
}

impl LayoutConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            ground_bound: profiled_env_f32(p, "LAYOUT_GROUND_BOUND", defaults.ground_bound),
            baseline_y: profiled_env_f32(p, "LAYOUT_BASELINE_Y", defaults.baseline_y),
            max_yaw: profiled_env_f32(p, "LAYOUT_MAX_YAW", defaults.max_yaw),
            palette: profiled_env_opt(p, "LAYOUT_PALETTE")
                .map(|raw| parse_palette(&raw).unwrap_or(defaults.palette.clone()))
                .unwrap_or(defaults.palette),
        }
    }
}

/// Parse a comma-separated list of hex colors. `None` if any entry is bad
/// or the list is empty.
fn parse_palette(raw: &str) -> Option<Vec<Color>> {
    let mut palette = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match Color::parse(entry) {
            Ok(color) => palette.push(color),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring LAYOUT_PALETTE");
                return None;
            }
        }
    }
    if palette.is_empty() { None } else { Some(palette) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_defaults_match_builtin_palette() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.ground_bound, 4.0);
        assert_eq!(layout.baseline_y, 0.0);
        assert_eq!(layout.palette.len(), 7);
    }

    #[test]
    fn profiled_keys_take_precedence() {
        env::set_var("CFGTESTA_LAYOUT_GROUND_BOUND", "6");
        env::set_var("CFGTESTA_DATA_DIR", "/tmp/cosmos-cfg-test");
        env::set_var("CFGTESTA_COSMOS_STORAGE", "memory");
        let config = Config::for_profile("cfgtesta");
        assert_eq!(config.profile_label(), "CFGTESTA");
        assert_eq!(config.layout.ground_bound, 6.0);
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/cosmos-cfg-test"));
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        env::set_var("CFGTESTB_LAYOUT_MAX_YAW", "lots");
        env::set_var("CFGTESTB_LAYOUT_PALETTE", "#ffffff,purple");
        let config = Config::for_profile("CFGTESTB");
        assert_eq!(config.layout.max_yaw, std::f32::consts::FRAC_PI_2);
        assert_eq!(config.layout.palette, default_palette());
    }

    #[test]
    fn palette_parses_list() {
        let palette = parse_palette("#FFFFFF, #000000").unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette[0].as_str(), "#ffffff");
        assert!(parse_palette(" , ").is_none());
    }

    #[test]
    fn summary_reports_backend() {
        let config = Config {
            profile: String::new(),
            storage: StorageConfig::default(),
            layout: LayoutConfig::default(),
        };
        let summary = config.summary();
        assert_eq!(summary["profile"], "default");
        assert_eq!(summary["storage"]["backend"], "local");
        assert_eq!(summary["layout"]["palette"].as_array().unwrap().len(), 7);
    }
}

//! Snapper configuration
//!
//! Persistent user settings loaded from and saved to a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapError};

/// User settings for matching, snapping behaviour and overlay display.
///
/// Display settings are only carried through to whatever draws the
/// frames; nothing in this crate reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapperConfig {
    // Matching
    /// Probe/candidate pairs at or beyond this world distance never match
    pub max_snap_distance: f32,
    /// Radius under which two frames count as coincident
    pub overlap_radius: f32,
    /// Angles this close to 0 or PI are treated as degenerate
    pub angle_epsilon: f32,
    /// Only match frames whose tags meet the target's accept tags
    pub match_tags: bool,

    // Behaviour
    /// Snap principal directions antiparallel (face to face)
    pub flip: bool,
    /// Parent the snapped object to its target
    pub auto_parent: bool,
    /// Selected objects follow the dragged object
    pub move_selected: bool,

    // Display
    pub visible: bool,
    pub font_size: u32,
    pub font_shadow: bool,
    pub label_offset: [i32; 2],
    pub direction_color: [f32; 4],
    pub up_color: [f32; 4],
    pub right_color: [f32; 4],
    pub from_color: [f32; 3],
    pub to_color: [f32; 3],
    pub line_width: u32,
    pub cone_scale: f32,
    pub hide_cones: bool,
    pub hide_arrows: bool,
    /// Draw every label in `replacement_color` instead of its own colour
    pub color_override: bool,
    pub replacement_color: [f32; 4],
}

impl Default for SnapperConfig {
    fn default() -> Self {
        Self {
            max_snap_distance: 2.0,
            overlap_radius: 1e-4,
            angle_epsilon: snapper_math::ANGLE_EPSILON,
            match_tags: false,

            flip: false,
            auto_parent: false,
            move_selected: true,

            visible: true,
            font_size: 50,
            font_shadow: true,
            label_offset: [4, 4],
            direction_color: [1.0, 0.0, 0.0, 1.0],
            up_color: [0.0, 0.0, 1.0, 1.0],
            right_color: [0.0, 1.0, 0.0, 1.0],
            from_color: [0.0, 0.0, 1.0],
            to_color: [0.0, 1.0, 0.0],
            line_width: 1,
            cone_scale: 1.0,
            hide_cones: false,
            hide_arrows: false,
            color_override: false,
            replacement_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl SnapperConfig {
    pub fn with_max_snap_distance(mut self, distance: f32) -> Self {
        self.max_snap_distance = distance;
        self
    }

    pub fn with_overlap_radius(mut self, radius: f32) -> Self {
        self.overlap_radius = radius;
        self
    }

    pub fn with_match_tags(mut self, enabled: bool) -> Self {
        self.match_tags = enabled;
        self
    }

    pub fn with_flip(mut self, enabled: bool) -> Self {
        self.flip = enabled;
        self
    }

    pub fn with_auto_parent(mut self, enabled: bool) -> Self {
        self.auto_parent = enabled;
        self
    }

    pub fn with_move_selected(mut self, enabled: bool) -> Self {
        self.move_selected = enabled;
        self
    }

    /// Reject thresholds that would make matching meaningless
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f32| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(SnapError::Config(format!("{} must be positive, got {}", name, value)))
            }
        };
        positive("max_snap_distance", self.max_snap_distance)?;
        positive("overlap_radius", self.overlap_radius)?;
        positive("angle_epsilon", self.angle_epsilon)?;
        positive("cone_scale", self.cone_scale)?;
        if self.line_width == 0 {
            return Err(SnapError::Config("line_width must be at least 1".into()));
        }
        Ok(())
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| SnapError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        log::info!("Loaded snapper config from {:?}", path);
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No snapper config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save as TOML, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SnapError::Config(e.to_string()))?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, content)?;
        log::info!("Saved snapper config to {:?}", path);
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("snapper");
            p.push("config.toml");
            p
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SnapperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_snap_distance, 2.0);
        assert!(config.move_selected);
        assert!(!config.auto_parent);
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        let config = SnapperConfig::default().with_max_snap_distance(0.0);
        assert!(matches!(config.validate(), Err(SnapError::Config(_))));
        let config = SnapperConfig::default().with_overlap_radius(f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SnapperConfig = toml::from_str("flip = true\nmax_snap_distance = 0.5\n").unwrap();
        assert!(config.flip);
        assert_eq!(config.max_snap_distance, 0.5);
        assert_eq!(config.font_size, 50);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = SnapperConfig::default()
            .with_auto_parent(true)
            .with_match_tags(true);
        config.save(&path).unwrap();
        assert_eq!(SnapperConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SnapperConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, SnapperConfig::default());
    }

    #[test]
    fn test_load_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "overlap_radius = -1.0\n").unwrap();
        assert!(matches!(SnapperConfig::load(&path), Err(SnapError::Config(_))));
    }
}

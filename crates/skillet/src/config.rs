use std::path::Path;

use serde::Deserialize;

use crate::error::SkillError;
use crate::matcher::DEFAULT_THRESHOLD;

/// Settings for skill discovery and resolution, usually loaded from a
/// TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillsConfig {
    /// Search paths in precedence order; earlier paths shadow later ones.
    #[serde(default = "default_paths")]
    pub paths: Vec<String>,
    /// Where installed skills live. Defaults to the first search path.
    #[serde(default)]
    pub managed_dir: Option<String>,
    #[serde(default = "default_threshold")]
    pub relevance_threshold: f32,
    #[serde(default = "default_cache")]
    pub cache: bool,
}

fn default_paths() -> Vec<String> {
    vec!["./skills".to_string()]
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_cache() -> bool {
    true
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            managed_dir: None,
            relevance_threshold: default_threshold(),
            cache: default_cache(),
        }
    }
}

impl SkillsConfig {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Io`] when the file exists but cannot be read
    /// and [`SkillError::MalformedInput`] when it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, SkillError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Self>(&content)
                .map_err(|e| SkillError::MalformedInput(format!("invalid config: {e}")))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SKILLET_SKILLS_PATHS") {
            self.paths = v.split(':').map(str::to_string).collect();
        }
        if let Ok(v) = std::env::var("SKILLET_MANAGED_DIR") {
            self.managed_dir = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const ENV_KEYS: [&str; 2] = ["SKILLET_SKILLS_PATHS", "SKILLET_MANAGED_DIR"];

    fn clear_env() {
        for key in ENV_KEYS {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn defaults_when_file_missing() {
        clear_env();

        let config = SkillsConfig::load(Path::new("/nonexistent/skillet.toml")).unwrap();
        assert_eq!(config.paths, vec!["./skills"]);
        assert!(config.managed_dir.is_none());
        assert!((config.relevance_threshold - DEFAULT_THRESHOLD).abs() < f32::EPSILON);
        assert!(config.cache);
    }

    #[test]
    #[serial]
    fn partial_toml_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillet.toml");
        std::fs::write(&path, "paths = [\"./a\", \"./b\"]\n").unwrap();

        clear_env();

        let config = SkillsConfig::load(&path).unwrap();
        assert_eq!(config.paths, vec!["./a", "./b"]);
        assert!(config.cache);
    }

    #[test]
    #[serial]
    fn full_toml_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillet.toml");
        std::fs::write(
            &path,
            "paths = [\"./skills\"]\nmanaged_dir = \"./managed\"\nrelevance_threshold = 0.5\ncache = false\n",
        )
        .unwrap();

        clear_env();

        let config = SkillsConfig::load(&path).unwrap();
        assert_eq!(config.managed_dir.as_deref(), Some("./managed"));
        assert!((config.relevance_threshold - 0.5).abs() < f32::EPSILON);
        assert!(!config.cache);
    }

    #[test]
    fn invalid_toml_is_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillet.toml");
        std::fs::write(&path, "paths = not-a-list").unwrap();

        let err = SkillsConfig::load(&path).unwrap_err();
        assert!(matches!(err, SkillError::MalformedInput(_)));
    }

    #[test]
    #[serial]
    fn env_overrides_paths() {
        clear_env();
        let mut config = SkillsConfig::default();

        unsafe { std::env::set_var("SKILLET_SKILLS_PATHS", "/one:/two") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("SKILLET_SKILLS_PATHS") };

        assert_eq!(config.paths, vec!["/one", "/two"]);
    }
}

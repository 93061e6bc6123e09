//! Filesystem loading of skills from configured search paths.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::SkillError;
use crate::frontmatter;
use crate::resource::discover_resources;
use crate::skill::{MANIFEST_FILE, SkillMetadata, SkillRecord};

/// Load a single skill directory: parse the manifest, type the metadata,
/// inventory resources.
///
/// # Errors
///
/// Returns [`SkillError::Io`] when the manifest cannot be read, a parse
/// error from the codec, or [`SkillError::ValidationFailed`] when required
/// fields are missing.
pub fn load_skill_dir(dir: &Path) -> Result<SkillRecord, SkillError> {
    let content = std::fs::read_to_string(dir.join(MANIFEST_FILE))?;
    let parsed = frontmatter::parse(&content)?;
    let metadata = SkillMetadata::from_mapping(&parsed.metadata)?;
    let resources = discover_resources(dir);
    Ok(SkillRecord::from_parts(
        metadata,
        parsed.body,
        dir.to_path_buf(),
        resources,
    ))
}

/// Build an in-memory record from raw manifest text. No backing directory,
/// no resources.
///
/// # Errors
///
/// Same parse and typing errors as [`load_skill_dir`].
pub fn parse_skill_str(content: &str) -> Result<SkillRecord, SkillError> {
    let parsed = frontmatter::parse(content)?;
    let metadata = SkillMetadata::from_mapping(&parsed.metadata)?;
    Ok(SkillRecord::new(metadata, parsed.body))
}

/// Walks search paths in precedence order and loads skills, with an
/// optional by-name cache.
///
/// When the same skill name appears under several paths, the earliest
/// path wins and later copies are shadowed.
#[derive(Debug)]
pub struct SkillLoader {
    paths: Vec<PathBuf>,
    cache: HashMap<String, SkillRecord>,
    cache_enabled: bool,
}

impl SkillLoader {
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![base_path.into()],
            cache: HashMap::new(),
            cache_enabled: true,
        }
    }

    /// Append a search path with lower precedence than existing ones.
    pub fn add_path(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Scan every search path for `*/SKILL.md` and load all valid skills.
    ///
    /// Directory entries are visited in file-name order so repeated scans
    /// yield the same sequence. Unreadable directories and invalid
    /// manifests are logged with `tracing::warn` and skipped.
    pub fn load_all(&mut self) -> Vec<SkillRecord> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();

        for base in &self.paths {
            let Ok(entries) = std::fs::read_dir(base) else {
                tracing::warn!("cannot read skill directory: {}", base.display());
                continue;
            };

            let mut dirs: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
            dirs.sort();

            for dir in dirs {
                if !dir.join(MANIFEST_FILE).is_file() {
                    continue;
                }
                match load_skill_dir(&dir) {
                    Ok(record) => {
                        let name = record.metadata.name.clone();
                        if seen.contains(&name) {
                            tracing::debug!(
                                "skill '{name}' at {} shadowed by an earlier path",
                                dir.display()
                            );
                            continue;
                        }
                        seen.insert(name.clone());
                        if self.cache_enabled {
                            self.cache.insert(name, record.clone());
                        }
                        records.push(record);
                    }
                    Err(e) => tracing::warn!("skipping {}: {e}", dir.display()),
                }
            }
        }

        records
    }

    /// Load one skill by name: cache first, then probe each search path
    /// for a directory of that name.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when no path holds the skill.
    pub fn load(&mut self, name: &str) -> Result<SkillRecord, SkillError> {
        if self.cache_enabled
            && let Some(record) = self.cache.get(name)
        {
            return Ok(record.clone());
        }

        for base in &self.paths {
            let dir = base.join(name);
            if !dir.join(MANIFEST_FILE).is_file() {
                continue;
            }
            let record = load_skill_dir(&dir)?;
            // Directory name and manifest name can disagree; only a
            // manifest match counts.
            if record.metadata.name != name {
                tracing::debug!(
                    "directory {} holds skill '{}', not '{name}'",
                    dir.display(),
                    record.metadata.name
                );
                continue;
            }
            if self.cache_enabled {
                self.cache.insert(name.to_string(), record.clone());
            }
            return Ok(record);
        }

        Err(SkillError::NotFound(name.to_string()))
    }

    /// Cheap existence probe without loading.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        if self.cache_enabled && self.cache.contains_key(name) {
            return true;
        }
        self.paths
            .iter()
            .any(|base| base.join(name).join(MANIFEST_FILE).is_file())
    }

    /// Disabling the cache also drops it, so subsequent loads hit disk.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
        if !enabled {
            self.cache.clear();
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

//! Copy-based install lifecycle for skills under a managed directory.

use std::path::{Path, PathBuf};

use crate::error::SkillError;
use crate::frontmatter;
use crate::loader::load_skill_dir;
use crate::registry::SkillRegistry;
use crate::skill::{MANIFEST_FILE, SkillRecord};
use crate::validator::validate_content;

pub struct SkillInstaller {
    managed_dir: PathBuf,
}

impl SkillInstaller {
    #[must_use]
    pub fn new(managed_dir: impl Into<PathBuf>) -> Self {
        Self {
            managed_dir: managed_dir.into(),
        }
    }

    #[must_use]
    pub fn managed_dir(&self) -> &Path {
        &self.managed_dir
    }

    /// Install a skill from a local directory.
    ///
    /// Validates the source manifest, copies the whole directory tree into
    /// `managed_dir/<name>`, re-loads the copy as the canonical record, and
    /// registers it when a registry is supplied. A copy failure mid-way
    /// leaves a partial directory behind; there is no rollback.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::ValidationFailed`] for an invalid manifest,
    /// [`SkillError::AlreadyInstalled`] when the name is taken, and
    /// [`SkillError::Io`] when reading or copying fails.
    pub fn install(
        &self,
        source: &Path,
        registry: Option<&mut SkillRegistry>,
    ) -> Result<SkillRecord, SkillError> {
        let content = std::fs::read_to_string(source.join(MANIFEST_FILE))?;

        let report = validate_content(&content);
        if !report.is_valid() {
            return Err(SkillError::ValidationFailed(report.errors));
        }

        let name = skill_name(&content, source)?;
        check_name(&name)?;

        let dest = self.managed_dir.join(&name);
        if dest.exists() {
            return Err(SkillError::AlreadyInstalled(name));
        }

        std::fs::create_dir_all(&self.managed_dir)?;
        copy_dir_recursive(source, &dest)?;

        let record = load_skill_dir(&dest)?;
        let hash = content_hash(&dest)?;
        tracing::debug!("installed skill '{name}' ({hash})");

        if let Some(registry) = registry {
            registry.register(record.clone());
        }
        Ok(record)
    }

    /// Remove an installed skill directory and deregister it.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when no such skill is installed.
    pub fn uninstall(
        &self,
        name: &str,
        registry: Option<&mut SkillRegistry>,
    ) -> Result<(), SkillError> {
        check_name(name)?;
        let dir = self.managed_dir.join(name);
        if !dir.exists() {
            return Err(SkillError::NotFound(name.to_string()));
        }
        std::fs::remove_dir_all(&dir)?;
        if let Some(registry) = registry {
            let _ = registry.unregister(name);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_installed(&self, name: &str) -> bool {
        self.managed_dir.join(name).join(MANIFEST_FILE).is_file()
    }

    /// Names of installed skills, sorted. Directories without a manifest
    /// are not skills and are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Io`] when the managed directory exists but
    /// cannot be read.
    pub fn list_installed(&self) -> Result<Vec<String>, SkillError> {
        if !self.managed_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.managed_dir)? {
            let entry = entry?;
            if entry.path().join(MANIFEST_FILE).is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Recompute the manifest content hash for an installed skill.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when the skill is not installed.
    pub fn verify(&self, name: &str) -> Result<String, SkillError> {
        check_name(name)?;
        let dir = self.managed_dir.join(name);
        if !dir.join(MANIFEST_FILE).is_file() {
            return Err(SkillError::NotFound(name.to_string()));
        }
        content_hash(&dir)
    }
}

/// Name from the parsed manifest, falling back to the source directory's
/// base name when the manifest omits one.
fn skill_name(content: &str, source: &Path) -> Result<String, SkillError> {
    let parsed = frontmatter::parse(content)?;
    if let Some(name) = parsed.metadata.get("name").and_then(|v| v.as_str()) {
        return Ok(name.to_string());
    }
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SkillError::MalformedInput("cannot determine skill name".into()))
}

/// Names are used as directory components under the managed root; reject
/// anything that could escape it.
fn check_name(name: &str) -> Result<(), SkillError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(SkillError::MalformedInput(format!(
            "invalid skill name: {name}"
        )));
    }
    Ok(())
}

fn content_hash(skill_dir: &Path) -> Result<String, SkillError> {
    let content = std::fs::read(skill_dir.join(MANIFEST_FILE))?;
    Ok(blake3::hash(&content).to_hex().to_string())
}

pub(crate) fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

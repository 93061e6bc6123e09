//! Write skills back to disk and scaffold new ones.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::SkillError;
use crate::frontmatter;
use crate::installer::copy_dir_recursive;
use crate::resource::RESOURCE_DIRS;
use crate::skill::{MANIFEST_FILE, SkillMetadata, SkillRecord};

/// Export a record as a skill directory under `target`.
///
/// Writes `target/<name>/SKILL.md` regenerated from the record's metadata
/// and instructions, copies resource directories when the record is backed
/// by one on disk, and creates the three resource subdirectories either
/// way. Returns the path of the exported skill.
///
/// # Errors
///
/// Returns [`SkillError::Io`] when a directory or file cannot be written.
pub fn export(record: &SkillRecord, target: &Path) -> Result<PathBuf, SkillError> {
    let dest = target.join(record.name());
    std::fs::create_dir_all(&dest)?;

    let mut manifest = frontmatter::generate(&record.metadata.to_mapping());
    manifest.push_str(&record.instructions);
    if !manifest.ends_with('\n') {
        manifest.push('\n');
    }
    std::fs::write(dest.join(MANIFEST_FILE), manifest)?;

    for dir in RESOURCE_DIRS {
        let out = dest.join(dir);
        std::fs::create_dir_all(&out)?;
        if let Some(path) = &record.path {
            let src = path.join(dir);
            if src.is_dir() {
                copy_dir_recursive(&src, &out)?;
            }
        }
    }
    Ok(dest)
}

/// Export several records under one target directory, stopping at the
/// first failure.
///
/// # Errors
///
/// Propagates the first [`export`] error.
pub fn export_many<'a, I>(records: I, target: &Path) -> Result<Vec<PathBuf>, SkillError>
where
    I: IntoIterator<Item = &'a SkillRecord>,
{
    let mut paths = Vec::new();
    for record in records {
        paths.push(export(record, target)?);
    }
    Ok(paths)
}

/// [`export`] bound to a fixed target root, for callers exporting more
/// than once.
pub struct SkillExporter {
    target_root: PathBuf,
}

impl SkillExporter {
    #[must_use]
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
        }
    }

    #[must_use]
    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// # Errors
    ///
    /// See [`export`].
    pub fn export(&self, record: &SkillRecord) -> Result<PathBuf, SkillError> {
        export(record, &self.target_root)
    }

    /// # Errors
    ///
    /// See [`export_many`].
    pub fn export_many<'a, I>(&self, records: I) -> Result<Vec<PathBuf>, SkillError>
    where
        I: IntoIterator<Item = &'a SkillRecord>,
    {
        export_many(records, &self.target_root)
    }
}

/// Build an in-memory record from raw metadata fields, applying the same
/// defaults as manifest parsing. The record has no backing path until it
/// is exported.
///
/// # Errors
///
/// Returns [`SkillError::ValidationFailed`] when required fields are
/// missing or malformed.
pub fn create_skill(
    metadata: &Map<String, Value>,
    instructions: impl Into<String>,
) -> Result<SkillRecord, SkillError> {
    let metadata = SkillMetadata::from_mapping(metadata)?;
    Ok(SkillRecord::new(metadata, instructions))
}

/// A minimal valid manifest plus body skeleton for scaffolding new skills.
#[must_use]
pub fn generate_template(name: &str, description: &str) -> String {
    let mut metadata = Map::new();
    metadata.insert("name".to_string(), Value::String(name.to_string()));
    metadata.insert(
        "description".to_string(),
        Value::String(description.to_string()),
    );

    let mut out = frontmatter::generate(&metadata);
    out.push_str(&format!(
        "\n# {name}\n\n{description}\n\n## Instructions\n\n\
         Describe the workflow the agent should follow here.\n\n\
         ## Resources\n\n\
         Put helper scripts under `scripts/`, documentation under\n\
         `references/`, and other files under `assets/`.\n"
    ));
    out
}

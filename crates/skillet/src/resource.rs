use std::path::Path;

use crate::error::SkillError;

/// Well-known resource subdirectories of a skill.
pub const RESOURCE_DIRS: [&str; 3] = ["scripts", "references", "assets"];

/// File-name inventory of a skill's resource subdirectories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkillResources {
    pub scripts: Vec<String>,
    pub references: Vec<String>,
    pub assets: Vec<String>,
}

/// Inventory the resource directories of a skill. Only direct file entries
/// are listed; nested content stays reachable through [`load_resource`].
#[must_use]
pub fn discover_resources(skill_dir: &Path) -> SkillResources {
    let mut resources = SkillResources::default();

    for (subdir, target) in [
        ("scripts", &mut resources.scripts),
        ("references", &mut resources.references),
        ("assets", &mut resources.assets),
    ] {
        let dir = skill_dir.join(subdir);
        if let Ok(entries) = std::fs::read_dir(&dir) {
            for entry in entries.flatten() {
                if entry.path().is_file() {
                    target.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            target.sort();
        }
    }

    resources
}

/// Load a resource file's content with path traversal protection.
///
/// # Errors
///
/// Returns [`SkillError::Io`] if the path escapes the skill directory or
/// the file cannot be read.
pub fn load_resource(skill_dir: &Path, relative_path: &str) -> Result<Vec<u8>, SkillError> {
    let canonical_base = skill_dir.canonicalize()?;

    let target = skill_dir.join(relative_path);
    let canonical_target = target.canonicalize()?;

    if !canonical_target.starts_with(&canonical_base) {
        return Err(SkillError::Io(std::io::Error::other(format!(
            "path traversal detected: {relative_path} escapes {}",
            skill_dir.display()
        ))));
    }

    Ok(std::fs::read(&canonical_target)?)
}

//! Structural validation for manifests and skill directories.
//!
//! Errors block registration and install; warnings are advisory and never
//! stop a load.

use std::path::Path;

use serde_json::{Map, Value};

use crate::frontmatter;
use crate::resource::RESOURCE_DIRS;
use crate::skill::MANIFEST_FILE;

/// Hard limit on manifest name length.
pub const MAX_NAME_LENGTH: usize = 64;
/// Descriptions longer than this draw a warning; they bloat every prompt.
pub const RECOMMENDED_DESCRIPTION_LENGTH: usize = 200;
/// Instruction bodies longer than this draw a warning.
pub const MAX_BODY_LINES: usize = 500;

const KNOWN_FIELDS: [&str; 9] = [
    "name",
    "description",
    "license",
    "version",
    "metadata",
    "dependencies",
    "compatibility",
    "disable-model-invocation",
    "mode",
];

/// Outcome of a validation pass. Errors make the manifest unusable;
/// warnings do not.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate raw manifest content.
#[must_use]
pub fn validate_content(content: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    let parsed = match frontmatter::parse(content) {
        Ok(parsed) => parsed,
        Err(e) => {
            report.errors.push(format!("manifest parse failed: {e}"));
            return report;
        }
    };

    check_fields(&parsed.metadata, &mut report);

    if parsed.body.is_empty() {
        report.warnings.push("instructions body is empty".to_string());
    } else {
        let lines = parsed.body.lines().count();
        if lines > MAX_BODY_LINES {
            report.warnings.push(format!(
                "instructions body has {lines} lines (recommended max {MAX_BODY_LINES})"
            ));
        }
    }

    report
}

/// Validate a skill directory: manifest content plus on-disk shape.
#[must_use]
pub fn validate_directory(path: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !path.is_dir() {
        report
            .errors
            .push(format!("not a directory: {}", path.display()));
        return report;
    }

    let manifest = path.join(MANIFEST_FILE);
    if manifest.is_file() {
        match std::fs::read_to_string(&manifest) {
            Ok(content) => {
                let inner = validate_content(&content);
                report.errors.extend(inner.errors);
                report.warnings.extend(inner.warnings);
            }
            Err(e) => report
                .errors
                .push(format!("failed to read {MANIFEST_FILE}: {e}")),
        }
    } else {
        report
            .errors
            .push(format!("missing {MANIFEST_FILE} in {}", path.display()));
    }

    for name in subdirectories(path) {
        if !RESOURCE_DIRS.contains(&name.as_str()) {
            report
                .warnings
                .push(format!("unrecognized subdirectory: {name}"));
        }
    }

    check_reference_nesting(&path.join("references"), 1, &mut report);

    report
}

fn check_fields(metadata: &Map<String, Value>, report: &mut ValidationReport) {
    match metadata.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => {
            if name.chars().count() > MAX_NAME_LENGTH {
                report.errors.push(format!(
                    "name exceeds {MAX_NAME_LENGTH} characters: {name}"
                ));
            } else if !is_kebab_case(name) {
                report
                    .warnings
                    .push(format!("name is not kebab-case: {name}"));
            }
        }
        Some(Value::String(_)) | None | Some(Value::Null) => {
            report
                .errors
                .push("missing required field: name".to_string());
        }
        Some(_) => report.errors.push("field 'name' must be a string".to_string()),
    }

    match metadata.get("description") {
        Some(Value::String(description)) if !description.trim().is_empty() => {
            let chars = description.chars().count();
            if chars > RECOMMENDED_DESCRIPTION_LENGTH {
                report.warnings.push(format!(
                    "description has {chars} characters (recommended max {RECOMMENDED_DESCRIPTION_LENGTH})"
                ));
            }
        }
        Some(Value::String(_)) | None | Some(Value::Null) => {
            report
                .errors
                .push("missing required field: description".to_string());
        }
        Some(_) => report
            .errors
            .push("field 'description' must be a string".to_string()),
    }

    for key in ["metadata", "compatibility"] {
        if let Some(value) = metadata.get(key)
            && !value.is_null()
            && !value.is_object()
        {
            report.errors.push(format!("field '{key}' must be a mapping"));
        }
    }

    match metadata.get("dependencies") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            if items.iter().any(|item| !item.is_string()) {
                report
                    .errors
                    .push("field 'dependencies' must be a list of strings".to_string());
            }
        }
        Some(_) => report
            .errors
            .push("field 'dependencies' must be a list of strings".to_string()),
    }

    for key in ["disable-model-invocation", "mode"] {
        if let Some(value) = metadata.get(key)
            && !value.is_null()
            && !value.is_boolean()
        {
            report
                .warnings
                .push(format!("field '{key}' should be a boolean"));
        }
    }

    for key in ["license", "version"] {
        if let Some(value) = metadata.get(key)
            && !value.is_null()
            && !value.is_string()
        {
            report
                .warnings
                .push(format!("field '{key}' should be a string"));
        }
    }

    for key in metadata.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            report.warnings.push(format!("unrecognized field: {key}"));
        }
    }
}

/// kebab-case: lowercase ASCII letters and digits separated by single
/// hyphens.
#[must_use]
pub fn is_kebab_case(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn subdirectories(path: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn check_reference_nesting(dir: &Path, level: usize, report: &mut ValidationReport) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut subdirs: Vec<std::path::PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();
    for subdir in subdirs {
        if level >= 2 {
            report.warnings.push(format!(
                "resource nesting deeper than 2 levels: {}",
                subdir.display()
            ));
        } else {
            check_reference_nesting(&subdir, level + 1, report);
        }
    }
}

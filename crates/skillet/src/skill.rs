//! Skill data model: parsed manifest metadata plus the loaded record.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SkillError;
use crate::resource::SkillResources;

/// Manifest file name expected at the root of every skill directory.
pub const MANIFEST_FILE: &str = "SKILL.md";

/// Typed view of a manifest's metadata block.
///
/// `name` and `description` are required; everything else is optional.
/// Unknown top-level fields are dropped during typing; open-ended data
/// belongs under the `metadata` key and lands in [`SkillMetadata::extra`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    pub license: Option<String>,
    pub version: Option<String>,
    /// Contents of the manifest's open `metadata` mapping.
    pub extra: Map<String, Value>,
    pub dependencies: Vec<String>,
    pub compatibility: Map<String, Value>,
    /// When set, the skill never participates in relevance matching and
    /// must be requested by name.
    pub disable_model_invocation: bool,
    /// Marks a mode-style command rather than an ordinary skill.
    pub is_mode: bool,
}

impl SkillMetadata {
    /// Build typed metadata from a parsed manifest mapping.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::ValidationFailed`] listing every missing or
    /// wrongly shaped field.
    pub fn from_mapping(map: &Map<String, Value>) -> Result<Self, SkillError> {
        let mut errors = Vec::new();

        let name = required_string(map, "name", &mut errors);
        let description = required_string(map, "description", &mut errors);
        let extra = optional_mapping(map, "metadata", &mut errors);
        let compatibility = optional_mapping(map, "compatibility", &mut errors);

        let dependencies = match map.get("dependencies") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let mut deps = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(s) = item.as_str() {
                        deps.push(s.to_string());
                    } else {
                        errors.push("field 'dependencies' must be a list of strings".to_string());
                        break;
                    }
                }
                deps
            }
            Some(_) => {
                errors.push("field 'dependencies' must be a list of strings".to_string());
                Vec::new()
            }
        };

        if !errors.is_empty() {
            return Err(SkillError::ValidationFailed(errors));
        }

        Ok(Self {
            name,
            description,
            license: optional_string(map, "license"),
            version: optional_string(map, "version"),
            extra,
            dependencies,
            compatibility,
            disable_model_invocation: flag(map, "disable-model-invocation"),
            is_mode: flag(map, "mode"),
        })
    }

    /// Render metadata back into a manifest mapping. Optional fields are
    /// omitted when empty, so `from_mapping(to_mapping(m)) == m`.
    #[must_use]
    pub fn to_mapping(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        if let Some(license) = &self.license {
            map.insert("license".to_string(), Value::String(license.clone()));
        }
        if let Some(version) = &self.version {
            map.insert("version".to_string(), Value::String(version.clone()));
        }
        if !self.extra.is_empty() {
            map.insert("metadata".to_string(), Value::Object(self.extra.clone()));
        }
        if !self.dependencies.is_empty() {
            map.insert(
                "dependencies".to_string(),
                Value::Array(
                    self.dependencies
                        .iter()
                        .map(|d| Value::String(d.clone()))
                        .collect(),
                ),
            );
        }
        if !self.compatibility.is_empty() {
            map.insert(
                "compatibility".to_string(),
                Value::Object(self.compatibility.clone()),
            );
        }
        if self.disable_model_invocation {
            map.insert("disable-model-invocation".to_string(), Value::Bool(true));
        }
        if self.is_mode {
            map.insert("mode".to_string(), Value::Bool(true));
        }
        map
    }

    /// Tags listed under `metadata.tags`, if any.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.extra
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Author recorded under `metadata.author`, if any.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.extra.get("author").and_then(Value::as_str)
    }

    /// Case-insensitive substring match over name, description, and tags.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self
                .tags()
                .iter()
                .any(|tag| tag.to_lowercase().contains(&query))
    }
}

fn required_string(map: &Map<String, Value>, key: &str, errors: &mut Vec<String>) -> String {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            errors.push(format!("missing required field: {key}"));
            String::new()
        }
        Some(_) => {
            errors.push(format!("field '{key}' must be a string"));
            String::new()
        }
    }
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(ToString::to_string)
}

fn optional_mapping(
    map: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<String>,
) -> Map<String, Value> {
    match map.get(key) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m.clone(),
        Some(_) => {
            errors.push(format!("field '{key}' must be a mapping"));
            Map::new()
        }
    }
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Lightweight name + description pair for progressive disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillSummary {
    pub name: String,
    pub description: String,
}

/// A fully loaded skill: metadata, instructions, and resource inventory.
#[derive(Debug, Clone)]
pub struct SkillRecord {
    pub metadata: SkillMetadata,
    /// Free-form markdown after the closing delimiter, trimmed.
    pub instructions: String,
    /// Source directory on disk; `None` for in-memory records.
    pub path: Option<PathBuf>,
    pub scripts: Vec<String>,
    pub references: Vec<String>,
    pub assets: Vec<String>,
    loaded: bool,
}

impl SkillRecord {
    /// An in-memory record with no backing directory.
    #[must_use]
    pub fn new(metadata: SkillMetadata, instructions: impl Into<String>) -> Self {
        Self {
            metadata,
            instructions: instructions.into(),
            path: None,
            scripts: Vec::new(),
            references: Vec::new(),
            assets: Vec::new(),
            loaded: false,
        }
    }

    /// A record backed by a skill directory with discovered resources.
    #[must_use]
    pub fn from_parts(
        metadata: SkillMetadata,
        instructions: String,
        path: PathBuf,
        resources: SkillResources,
    ) -> Self {
        Self {
            metadata,
            instructions,
            path: Some(path),
            scripts: resources.scripts,
            references: resources.references,
            assets: resources.assets,
            loaded: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    #[must_use]
    pub fn summary(&self) -> SkillSummary {
        SkillSummary {
            name: self.metadata.name.clone(),
            description: self.metadata.description.clone(),
        }
    }

    /// Whether full instructions have been surfaced to the agent.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Read a resource file relative to the skill directory.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] for in-memory records and
    /// [`SkillError::Io`] when the read fails or the path escapes the
    /// skill directory.
    pub fn read_resource(&self, relative_path: &str) -> Result<Vec<u8>, SkillError> {
        let Some(dir) = &self.path else {
            return Err(SkillError::NotFound(format!(
                "skill '{}' has no backing directory",
                self.metadata.name
            )));
        };
        crate::resource::load_resource(dir, relative_path)
    }
}

//! SKILL.md parsing, validation, registry, lexical matching, and the
//! install lifecycle for agent skills.
//!
//! A skill is a directory holding a `SKILL.md` manifest (a `---`
//! delimited metadata block followed by free-form instructions) plus
//! optional `scripts/`, `references/`, and `assets/` subdirectories.
//! [`SkillManager`] is the front door; the underlying pieces are public
//! for callers that need only one of them.

pub mod config;
pub mod error;
pub mod exporter;
pub mod frontmatter;
pub mod installer;
pub mod loader;
pub mod manager;
pub mod matcher;
pub mod prompt;
pub mod registry;
pub mod resource;
pub mod skill;
pub mod validator;

pub use config::SkillsConfig;
pub use error::SkillError;
pub use manager::SkillManager;
pub use registry::SkillRegistry;
pub use skill::{MANIFEST_FILE, SkillMetadata, SkillRecord, SkillSummary};

//! Assemble skill content into agent prompt text.
//!
//! Two levels of disclosure: [`compose`] injects full instructions for
//! skills judged relevant, [`build_skills_index`] lists only name and
//! description for the rest so the agent can ask for more.

use std::collections::HashSet;
use std::fmt::Write;

use crate::registry::SkillRegistry;
use crate::skill::{SkillRecord, SkillSummary};

/// Append full skill sections to a base prompt.
///
/// Returns `base_prompt` unchanged when `skills` is empty. Each section
/// carries the skill's name, description, complete instructions, and an
/// inventory of resource file names grouped by kind.
#[must_use]
pub fn compose(base_prompt: &str, skills: &[SkillRecord]) -> String {
    if skills.is_empty() {
        return base_prompt.to_string();
    }

    let mut out = String::from(base_prompt);
    out.push_str("\n\n<active_skills>\n");
    for skill in skills {
        let _ = write!(
            out,
            "  <skill name=\"{}\">\n    <description>{}</description>\n    <instructions>\n{}\n    </instructions>\n",
            skill.name(),
            skill.description(),
            skill.instructions,
        );
        write_resource_inventory(&mut out, skill);
        out.push_str("  </skill>\n");
    }
    out.push_str("</active_skills>");
    out
}

fn write_resource_inventory(out: &mut String, skill: &SkillRecord) {
    for (kind, names) in [
        ("scripts", &skill.scripts),
        ("references", &skill.references),
        ("assets", &skill.assets),
    ] {
        if names.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "    <resources kind=\"{kind}\">{}</resources>",
            names.join(", ")
        );
    }
}

/// Compact name+description listing for skills that are not yet loaded.
///
/// Returns an empty string for an empty slice.
#[must_use]
pub fn build_skills_index(summaries: &[SkillSummary]) -> String {
    if summaries.is_empty() {
        return String::new();
    }

    let mut out = String::from("<available_skills>\n");
    for summary in summaries {
        let _ = writeln!(
            out,
            "  <skill name=\"{}\" description=\"{}\" />",
            summary.name, summary.description,
        );
    }
    out.push_str("</available_skills>");
    out
}

/// Full sections for loaded skills plus an index of the remaining
/// available ones, with loaded names excluded from the index.
#[must_use]
pub fn compose_with_discovery(
    base_prompt: &str,
    loaded: &[SkillRecord],
    available: &[SkillSummary],
) -> String {
    let loaded_names: HashSet<&str> = loaded.iter().map(SkillRecord::name).collect();
    let remainder: Vec<SkillSummary> = available
        .iter()
        .filter(|s| !loaded_names.contains(s.name.as_str()))
        .cloned()
        .collect();

    let mut out = compose(base_prompt, loaded);
    let index = build_skills_index(&remainder);
    if !index.is_empty() {
        out.push_str("\n\n");
        out.push_str(&index);
    }
    out
}

/// Catalog of everything registered, with mode skills listed apart from
/// ordinary ones. Empty registry yields an empty string.
#[must_use]
pub fn build_catalog(registry: &SkillRegistry) -> String {
    let mut skills = Vec::new();
    let mut modes = Vec::new();
    for record in registry.all() {
        if record.metadata.is_mode {
            modes.push(record.summary());
        } else {
            skills.push(record.summary());
        }
    }

    let mut out = build_skills_index(&skills);
    if !modes.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str("<modes>\n");
        for mode in &modes {
            let _ = writeln!(
                out,
                "  <mode name=\"{}\" description=\"{}\" />",
                mode.name, mode.description,
            );
        }
        out.push_str("</modes>");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::SkillMetadata;
    use serde_json::{Value, json};

    fn record_from(value: Value) -> SkillRecord {
        let Value::Object(map) = value else {
            unreachable!()
        };
        SkillRecord::new(
            SkillMetadata::from_mapping(&map).unwrap(),
            "Follow the checklist.",
        )
    }

    fn record(name: &str, description: &str) -> SkillRecord {
        record_from(json!({"name": name, "description": description}))
    }

    #[test]
    fn compose_returns_base_unchanged_when_empty() {
        assert_eq!(compose("You are an agent.", &[]), "You are an agent.");
    }

    #[test]
    fn compose_appends_full_sections() {
        let skills = vec![record("git-helper", "Helps with git.")];
        let output = compose("Base prompt.", &skills);

        assert!(output.starts_with("Base prompt."));
        assert!(output.ends_with("</active_skills>"));
        assert!(output.contains("<skill name=\"git-helper\">"));
        assert!(output.contains("<description>Helps with git.</description>"));
        assert!(output.contains("Follow the checklist."));
    }

    #[test]
    fn compose_lists_resources_grouped_by_kind() {
        let mut skill = record("with-files", "Has resources.");
        skill.scripts = vec!["run.sh".to_string(), "setup.sh".to_string()];
        skill.references = vec!["api.md".to_string()];

        let output = compose("Base.", &[skill]);
        assert!(output.contains("<resources kind=\"scripts\">run.sh, setup.sh</resources>"));
        assert!(output.contains("<resources kind=\"references\">api.md</resources>"));
        assert!(!output.contains("kind=\"assets\""));
    }

    #[test]
    fn index_is_empty_for_no_summaries() {
        assert_eq!(build_skills_index(&[]), "");
    }

    #[test]
    fn index_lists_names_without_instructions() {
        let summaries = vec![record("quiet", "Stays brief.").summary()];
        let output = build_skills_index(&summaries);

        assert!(output.starts_with("<available_skills>"));
        assert!(output.ends_with("</available_skills>"));
        assert!(output.contains("<skill name=\"quiet\" description=\"Stays brief.\" />"));
        assert!(!output.contains("Follow the checklist."));
    }

    #[test]
    fn discovery_excludes_loaded_names_from_index() {
        let loaded = vec![record("a", "Loaded in full.")];
        let available = vec![
            record("a", "Loaded in full.").summary(),
            record("b", "Still only listed.").summary(),
        ];

        let output = compose_with_discovery("Base.", &loaded, &available);
        assert!(output.contains("<skill name=\"a\">"));
        assert!(!output.contains("<skill name=\"a\" description="));
        assert!(output.contains("<skill name=\"b\" description=\"Still only listed.\" />"));
    }

    #[test]
    fn discovery_with_nothing_left_to_list_omits_index() {
        let loaded = vec![record("only", "The only one.")];
        let available = vec![record("only", "The only one.").summary()];

        let output = compose_with_discovery("Base.", &loaded, &available);
        assert!(!output.contains("<available_skills>"));
    }

    #[test]
    fn catalog_segregates_modes_from_skills() {
        let mut registry = SkillRegistry::new();
        registry.register(record("ordinary", "A normal skill."));
        registry.register(record_from(
            json!({"name": "pair-programmer", "description": "Drives the session.", "mode": true}),
        ));

        let output = build_catalog(&registry);
        assert!(output.contains("<skill name=\"ordinary\""));
        assert!(output.contains("<modes>"));
        assert!(output.contains("<mode name=\"pair-programmer\""));
        assert!(!output.contains("<skill name=\"pair-programmer\""));
    }

    #[test]
    fn catalog_of_empty_registry_is_empty() {
        assert_eq!(build_catalog(&SkillRegistry::new()), "");
    }
}

//! Lexical relevance ranking of registered skills against task text.

use std::cmp::Ordering;

use crate::error::SkillError;
use crate::registry::SkillRegistry;
use crate::skill::SkillRecord;

/// Default score threshold below which skills are not considered relevant.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Tokens shorter than this are dropped before scoring.
const MIN_TOKEN_LENGTH: usize = 3;

/// Filler words dropped from queries; left in, they produce spurious
/// substring hits ("the" matches inside "therapy").
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "from", "your", "are", "was", "were", "has",
    "have", "had", "but", "not", "you", "can", "could", "will", "would", "should", "into", "onto",
    "over", "under", "about", "please", "want", "need", "how", "what", "when", "where", "which",
    "why", "who", "all", "any", "some", "out", "use", "using",
];

/// Scores skills by lexical overlap between task text and skill metadata.
///
/// Per token the contribution is 1.0 for a name substring hit, 0.7 for a
/// description hit, 0.5 for a tag hit; a token counts once, at its
/// highest-matching field. The total is normalized by token count and
/// clamped to `[0, 1]`. Skills flagged `disable-model-invocation` never
/// participate.
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    threshold: f32,
}

impl Default for SkillMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl SkillMatcher {
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Skills scoring at or above the configured threshold, best first.
    /// Ties keep registry order, so identical input against an unchanged
    /// registry always returns identical ordering.
    #[must_use]
    pub fn resolve<'a>(&self, registry: &'a SkillRegistry, input: &str) -> Vec<&'a SkillRecord> {
        self.resolve_with_threshold(registry, input, self.threshold)
    }

    /// Like [`SkillMatcher::resolve`] with a one-off threshold.
    #[must_use]
    pub fn resolve_with_threshold<'a>(
        &self,
        registry: &'a SkillRegistry,
        input: &str,
        threshold: f32,
    ) -> Vec<&'a SkillRecord> {
        let mut scored = self.resolve_with_scores(registry, input);
        scored.retain(|(_, score)| *score >= threshold);
        scored.into_iter().map(|(record, _)| record).collect()
    }

    /// The single best match, if any clears the threshold.
    #[must_use]
    pub fn resolve_one<'a>(
        &self,
        registry: &'a SkillRegistry,
        input: &str,
    ) -> Option<&'a SkillRecord> {
        self.resolve(registry, input).into_iter().next()
    }

    /// Raw (record, score) pairs for every auto-invocable skill, sorted
    /// by score descending without threshold filtering. For diagnostics.
    #[must_use]
    pub fn resolve_with_scores<'a>(
        &self,
        registry: &'a SkillRegistry,
        input: &str,
    ) -> Vec<(&'a SkillRecord, f32)> {
        let tokens = tokenize(input);
        let mut scored: Vec<(&SkillRecord, f32)> = registry
            .auto_invocable()
            .into_iter()
            .map(|record| (record, score_record(record, &tokens)))
            .collect();
        // Vec::sort_by is stable: ties keep registry order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored
    }

    /// Exact-name lookup bypassing scoring and the auto-invocation filter.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when the name is not registered.
    pub fn resolve_by_name<'a>(
        &self,
        registry: &'a SkillRegistry,
        name: &str,
    ) -> Result<&'a SkillRecord, SkillError> {
        registry.get(name)
    }
}

/// Lowercase, split on whitespace, trim punctuation, then drop short
/// tokens and stop words.
#[must_use]
pub fn tokenize(input: &str) -> Vec<String> {
    input
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|token| token.chars().count() >= MIN_TOKEN_LENGTH)
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn score_record(record: &SkillRecord, tokens: &[String]) -> f32 {
    if tokens.is_empty() {
        return 0.0;
    }
    let name = record.metadata.name.to_lowercase();
    let description = record.metadata.description.to_lowercase();
    let tags: Vec<String> = record
        .metadata
        .tags()
        .iter()
        .map(|tag| tag.to_lowercase())
        .collect();

    let mut sum = 0.0_f32;
    for token in tokens {
        if name.contains(token.as_str()) {
            sum += 1.0;
        } else if description.contains(token.as_str()) {
            sum += 0.7;
        } else if tags.iter().any(|tag| tag.contains(token.as_str())) {
            sum += 0.5;
        }
    }
    (sum / tokens.len() as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::SkillMetadata;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn record_from(value: Value) -> SkillRecord {
        let Value::Object(map) = value else {
            unreachable!()
        };
        SkillRecord::new(SkillMetadata::from_mapping(&map).unwrap(), "instructions")
    }

    fn record(name: &str, description: &str) -> SkillRecord {
        record_from(json!({"name": name, "description": description}))
    }

    fn registry_with(records: Vec<SkillRecord>) -> SkillRegistry {
        let mut registry = SkillRegistry::new();
        registry.register_many(records);
        registry
    }

    #[test]
    fn tokenize_drops_short_and_stop_words() {
        assert_eq!(tokenize("in the guidelines"), vec!["guidelines"]);
        assert_eq!(tokenize("Review, my CODE!"), vec!["review", "code"]);
        assert!(tokenize("in the a of").is_empty());
    }

    #[test]
    fn ranks_name_hits_above_description_hits() {
        let registry = registry_with(vec![
            record("api-testing", "Test REST APIs"),
            record("code-review", "Review code for quality"),
            record("database-migration", "Moves schemas between versions"),
        ]);
        let matcher = SkillMatcher::default();

        let resolved = matcher.resolve(&registry, "please review my code");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].metadata.name, "code-review");

        let scored = matcher.resolve_with_scores(&registry, "please review my code");
        assert_eq!(scored[0].0.metadata.name, "code-review");
        assert!(scored[0].1 > scored[1].1);
        assert!(scored.iter().all(|(_, s)| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn token_scores_once_at_highest_field() {
        let registry = registry_with(vec![record_from(json!({
            "name": "docker-deploy",
            "description": "Ships docker images",
            "metadata": {"tags": ["docker"]}
        }))]);
        let matcher = SkillMatcher::default();

        let scored = matcher.resolve_with_scores(&registry, "docker");
        assert!((scored[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tag_hits_score_half() {
        let registry = registry_with(vec![record_from(json!({
            "name": "cluster-ops",
            "description": "Operates the fleet",
            "metadata": {"tags": ["kubernetes"]}
        }))]);
        let matcher = SkillMatcher::default();

        let scored = matcher.resolve_with_scores(&registry, "kubernetes");
        assert!((scored[0].1 - 0.5).abs() < 1e-6);
        assert_eq!(matcher.resolve(&registry, "kubernetes").len(), 1);
    }

    #[test]
    fn empty_input_matches_nothing_above_positive_threshold() {
        let registry = registry_with(vec![record("a", "d"), record("b", "d")]);
        let matcher = SkillMatcher::default();
        assert!(matcher.resolve(&registry, "").is_empty());
        assert!(matcher.resolve(&registry, "in the").is_empty());
        // Threshold zero keeps everything, in registry order.
        let all = matcher.resolve_with_threshold(&registry, "", 0.0);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].metadata.name, "a");
    }

    #[test]
    fn threshold_is_monotonic() {
        let registry = registry_with(vec![
            record("review", "looks at changes"),
            record("helper", "can review things"),
        ]);
        let matcher = SkillMatcher::default();
        let low = matcher.resolve_with_threshold(&registry, "review", 0.4);
        let high = matcher.resolve_with_threshold(&registry, "review", 0.8);
        assert!(low.len() >= high.len());
        assert_eq!(low.len(), 2);
        assert_eq!(high.len(), 1);
    }

    #[test]
    fn identical_calls_return_identical_order() {
        let registry = registry_with(vec![
            record("first-match", "shared keyword alpha"),
            record("second-match", "shared keyword alpha"),
        ]);
        let matcher = SkillMatcher::default();
        let a: Vec<&str> = matcher
            .resolve(&registry, "alpha")
            .iter()
            .map(|r| r.metadata.name.as_str())
            .collect();
        let b: Vec<&str> = matcher
            .resolve(&registry, "alpha")
            .iter()
            .map(|r| r.metadata.name.as_str())
            .collect();
        assert_eq!(a, b);
        // Equal scores keep registration order.
        assert_eq!(a, vec!["first-match", "second-match"]);
    }

    #[test]
    fn disabled_skills_never_resolve_but_remain_addressable() {
        let registry = registry_with(vec![record_from(json!({
            "name": "dangerous-tool",
            "description": "dangerous operations",
            "disable-model-invocation": true
        }))]);
        let matcher = SkillMatcher::default();

        assert!(matcher.resolve(&registry, "dangerous tool").is_empty());
        assert!(matcher.resolve_with_scores(&registry, "dangerous").is_empty());
        assert!(matcher.resolve_by_name(&registry, "dangerous-tool").is_ok());
    }

    #[test]
    fn resolve_one_returns_best() {
        let registry = registry_with(vec![
            record("weak", "mentions deploy somewhere"),
            record("deploy", "ships builds"),
        ]);
        let matcher = SkillMatcher::default();
        let top = matcher.resolve_one(&registry, "deploy").unwrap();
        assert_eq!(top.metadata.name, "deploy");
        assert!(matcher.resolve_one(&registry, "unrelated").is_none());
    }

    proptest! {
        #[test]
        fn scores_stay_bounded_and_sorted(input in ".{0,80}") {
            let registry = registry_with(vec![
                record("code-review", "Review code for quality"),
                record("api-testing", "Test REST APIs"),
            ]);
            let matcher = SkillMatcher::default();
            let scored = matcher.resolve_with_scores(&registry, &input);
            prop_assert!(scored.iter().all(|(_, s)| (0.0..=1.0).contains(s)));
            prop_assert!(scored.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }
}

//! In-memory skill registry.
//!
//! Backed by a `Vec` so iteration follows registration order, which keeps
//! prompt composition and tie-breaking in relevance ranking deterministic.

use crate::error::SkillError;
use crate::skill::{SkillRecord, SkillSummary};

#[derive(Debug, Default)]
pub struct SkillRegistry {
    records: Vec<SkillRecord>,
}

impl SkillRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record under its manifest name. Re-registering an
    /// existing name replaces the record in place, keeping its position.
    pub fn register(&mut self, record: SkillRecord) {
        match self.position(&record.metadata.name) {
            Some(pos) => self.records[pos] = record,
            None => self.records.push(record),
        }
    }

    pub fn register_many(&mut self, records: impl IntoIterator<Item = SkillRecord>) {
        for record in records {
            self.register(record);
        }
    }

    /// Remove a record, preserving the relative order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when the name is not registered.
    pub fn unregister(&mut self, name: &str) -> Result<SkillRecord, SkillError> {
        match self.position(name) {
            Some(pos) => Ok(self.records.remove(pos)),
            None => Err(SkillError::NotFound(name.to_string())),
        }
    }

    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when the name is not registered.
    pub fn get(&self, name: &str) -> Result<&SkillRecord, SkillError> {
        self.records
            .iter()
            .find(|r| r.metadata.name == name)
            .ok_or_else(|| SkillError::NotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SkillRecord> {
        self.records.iter_mut().find(|r| r.metadata.name == name)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    #[must_use]
    pub fn all(&self) -> &[SkillRecord] {
        &self.records
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.metadata.name.as_str()).collect()
    }

    /// Case-insensitive substring search over names, descriptions, and
    /// tags, in registration order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&SkillRecord> {
        self.records
            .iter()
            .filter(|r| r.metadata.matches(query))
            .collect()
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<SkillSummary> {
        self.records.iter().map(SkillRecord::summary).collect()
    }

    /// Records eligible for relevance matching: everything not flagged
    /// `disable-model-invocation`.
    #[must_use]
    pub fn auto_invocable(&self) -> Vec<&SkillRecord> {
        self.records
            .iter()
            .filter(|r| !r.metadata.disable_model_invocation)
            .collect()
    }

    /// Records flagged as mode-style commands.
    #[must_use]
    pub fn modes(&self) -> Vec<&SkillRecord> {
        self.records.iter().filter(|r| r.metadata.is_mode).collect()
    }

    /// Flag a skill's full instructions as surfaced.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when the name is not registered.
    pub fn mark_loaded(&mut self, name: &str) -> Result<(), SkillError> {
        match self.get_mut(name) {
            Some(record) => {
                record.mark_loaded();
                Ok(())
            }
            None => Err(SkillError::NotFound(name.to_string())),
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.metadata.name == name)
    }
}

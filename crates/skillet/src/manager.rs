//! Single coordination surface over loading, matching, and the install
//! lifecycle.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::SkillsConfig;
use crate::error::SkillError;
use crate::exporter;
use crate::installer::SkillInstaller;
use crate::loader::{SkillLoader, parse_skill_str};
use crate::matcher::SkillMatcher;
use crate::prompt;
use crate::registry::SkillRegistry;
use crate::skill::SkillRecord;
use crate::validator::{self, ValidationReport};

pub struct SkillManager {
    loader: SkillLoader,
    registry: SkillRegistry,
    matcher: SkillMatcher,
    installer: SkillInstaller,
    discovered: bool,
}

impl SkillManager {
    /// Manager over a single skill directory, which doubles as the
    /// managed install root.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base = base_path.into();
        Self {
            loader: SkillLoader::new(&base),
            registry: SkillRegistry::new(),
            matcher: SkillMatcher::default(),
            installer: SkillInstaller::new(base),
            discovered: false,
        }
    }

    #[must_use]
    pub fn from_config(config: &SkillsConfig) -> Self {
        let mut paths = config.paths.iter();
        let first = paths
            .next()
            .cloned()
            .unwrap_or_else(|| "./skills".to_string());
        let mut loader = SkillLoader::new(&first);
        for path in paths {
            loader.add_path(path);
        }
        loader.set_cache_enabled(config.cache);

        let managed = config.managed_dir.clone().unwrap_or_else(|| first.clone());
        let mut manager = Self {
            loader,
            registry: SkillRegistry::new(),
            matcher: SkillMatcher::new(config.relevance_threshold),
            installer: SkillInstaller::new(&managed),
            discovered: false,
        };
        manager.ensure_search_path(Path::new(&managed));
        manager
    }

    /// Redirect installs to a dedicated directory, keeping it discoverable
    /// as the lowest-precedence search path.
    #[must_use]
    pub fn with_managed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.ensure_search_path(&dir);
        self.installer = SkillInstaller::new(dir);
        self
    }

    fn ensure_search_path(&mut self, dir: &Path) {
        if !self.loader.paths().iter().any(|p| p == dir) {
            self.loader.add_path(dir);
            self.discovered = false;
        }
    }

    /// Scan every search path and register what loads cleanly. Idempotent
    /// until [`SkillManager::add_path`] re-arms it. Returns the number of
    /// registered skills.
    pub fn discover(&mut self) -> usize {
        if !self.discovered {
            let records = self.loader.load_all();
            self.registry.register_many(records);
            self.discovered = true;
            tracing::debug!("discovered {} skills", self.registry.count());
        }
        self.registry.count()
    }

    fn ensure_discovered(&mut self) {
        if !self.discovered {
            self.discover();
        }
    }

    /// Registry hit, else an on-demand loader probe across search paths.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when no skill of that name exists
    /// in the registry or on disk.
    pub fn get(&mut self, name: &str) -> Result<&SkillRecord, SkillError> {
        if !self.registry.has(name) {
            let record = self.loader.load(name)?;
            self.registry.register(record);
        }
        self.registry.get(name)
    }

    /// Skills relevant to free-text input, best match first.
    pub fn resolve(&mut self, input: &str) -> Vec<&SkillRecord> {
        self.ensure_discovered();
        self.matcher.resolve(&self.registry, input)
    }

    pub fn resolve_with_threshold(&mut self, input: &str, threshold: f32) -> Vec<&SkillRecord> {
        self.ensure_discovered();
        self.matcher
            .resolve_with_threshold(&self.registry, input, threshold)
    }

    pub fn resolve_one(&mut self, input: &str) -> Option<&SkillRecord> {
        self.ensure_discovered();
        self.matcher.resolve_one(&self.registry, input)
    }

    /// Exact-name lookup against what is already registered; never
    /// triggers discovery or disk probes.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when the name is not registered.
    pub fn resolve_by_name(&self, name: &str) -> Result<&SkillRecord, SkillError> {
        self.matcher.resolve_by_name(&self.registry, name)
    }

    /// Case-insensitive substring search over names, descriptions, and
    /// tags, in registration order.
    pub fn search(&mut self, query: &str) -> Vec<&SkillRecord> {
        self.ensure_discovered();
        self.registry.search(query)
    }

    pub fn register(&mut self, record: SkillRecord) {
        self.registry.register(record);
    }

    /// Parse raw manifest text and register the resulting in-memory skill.
    ///
    /// # Errors
    ///
    /// Propagates parse and metadata validation errors.
    pub fn register_from_str(&mut self, content: &str) -> Result<&SkillRecord, SkillError> {
        let record = parse_skill_str(content)?;
        let name = record.name().to_string();
        self.registry.register(record);
        self.registry.get(&name)
    }

    #[must_use]
    pub fn validate(&self, content: &str) -> ValidationReport {
        validator::validate_content(content)
    }

    #[must_use]
    pub fn validate_directory(&self, dir: &Path) -> ValidationReport {
        validator::validate_directory(dir)
    }

    /// Install a skill directory under the managed root and register it.
    ///
    /// # Errors
    ///
    /// See [`SkillInstaller::install`].
    pub fn install(&mut self, source: &Path) -> Result<SkillRecord, SkillError> {
        let record = self.installer.install(source, Some(&mut self.registry))?;
        self.loader.clear_cache();
        Ok(record)
    }

    /// Remove an installed skill and deregister it.
    ///
    /// # Errors
    ///
    /// See [`SkillInstaller::uninstall`].
    pub fn uninstall(&mut self, name: &str) -> Result<(), SkillError> {
        self.installer.uninstall(name, Some(&mut self.registry))?;
        self.loader.clear_cache();
        Ok(())
    }

    /// Export a known skill as a directory under `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] for an unknown name, otherwise
    /// propagates write failures.
    pub fn export(&mut self, name: &str, target: &Path) -> Result<PathBuf, SkillError> {
        let record = self.get(name)?;
        exporter::export(record, target)
    }

    /// Build an in-memory skill without registering or saving it.
    ///
    /// # Errors
    ///
    /// See [`exporter::create_skill`].
    pub fn create(
        &self,
        metadata: &Map<String, Value>,
        instructions: impl Into<String>,
    ) -> Result<SkillRecord, SkillError> {
        exporter::create_skill(metadata, instructions)
    }

    /// Add a search path and re-arm discovery.
    pub fn add_path(&mut self, path: impl Into<PathBuf>) {
        self.loader.add_path(path);
        self.discovered = false;
    }

    /// Full-catalog index for seeding a base prompt, mode skills listed
    /// apart from ordinary ones.
    pub fn generate_skills_prompt(&mut self) -> String {
        self.ensure_discovered();
        prompt::build_catalog(&self.registry)
    }

    /// Record that a skill's full instructions have been surfaced.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::NotFound`] when the name is not registered.
    pub fn mark_loaded(&mut self, name: &str) -> Result<(), SkillError> {
        self.registry.mark_loaded(name)
    }

    #[must_use]
    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SkillRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn managed_dir(&self) -> &Path {
        self.installer.managed_dir()
    }

    #[must_use]
    pub fn is_installed(&self, name: &str) -> bool {
        self.installer.is_installed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::MANIFEST_FILE;

    fn make_skill_dir(base: &Path, name: &str, description: &str) -> PathBuf {
        let dir = base.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(MANIFEST_FILE),
            format!("---\nname: {name}\ndescription: {description}\n---\nInstructions for {name}."),
        )
        .unwrap();
        dir
    }

    #[test]
    fn discover_registers_all_skills() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "alpha", "First skill.");
        make_skill_dir(dir.path(), "beta", "Second skill.");

        let mut manager = SkillManager::new(dir.path());
        assert_eq!(manager.discover(), 2);
        assert!(manager.registry().has("alpha"));
        assert!(manager.registry().has("beta"));
    }

    #[test]
    fn discover_twice_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "solo", "Only one.");

        let mut manager = SkillManager::new(dir.path());
        let first = manager.discover();
        let second = manager.discover();
        assert_eq!(first, second);
        assert_eq!(manager.registry().names(), vec!["solo"]);
    }

    #[test]
    fn add_path_rearms_discovery() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        make_skill_dir(a.path(), "first", "In path a.");
        make_skill_dir(b.path(), "second", "In path b.");

        let mut manager = SkillManager::new(a.path());
        assert_eq!(manager.discover(), 1);

        manager.add_path(b.path());
        assert_eq!(manager.discover(), 2);
    }

    #[test]
    fn get_probes_disk_without_discovery() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "lazy", "Loaded on demand.");

        let mut manager = SkillManager::new(dir.path());
        let record = manager.get("lazy").unwrap();
        assert_eq!(record.name(), "lazy");
        assert!(manager.registry().has("lazy"));
    }

    #[test]
    fn get_unknown_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = SkillManager::new(dir.path());
        assert!(matches!(
            manager.get("ghost"),
            Err(SkillError::NotFound(_))
        ));
    }

    #[test]
    fn resolve_triggers_discovery() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "code-review", "Review code for quality");

        let mut manager = SkillManager::new(dir.path());
        let matches = manager.resolve("review my code");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name(), "code-review");
    }

    #[test]
    fn resolve_by_name_skips_discovery() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "hidden", "Never discovered.");

        let manager = SkillManager::new(dir.path());
        assert!(matches!(
            manager.resolve_by_name("hidden"),
            Err(SkillError::NotFound(_))
        ));
    }

    #[test]
    fn register_from_str_makes_skill_addressable() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = SkillManager::new(dir.path());

        let record = manager
            .register_from_str("---\nname: inline\ndescription: From text.\n---\nDo it.")
            .unwrap();
        assert_eq!(record.name(), "inline");
        assert!(manager.resolve_by_name("inline").is_ok());
    }

    #[test]
    fn install_registers_and_uninstall_removes() {
        let src = tempfile::tempdir().unwrap();
        let managed = tempfile::tempdir().unwrap();
        let skill_dir = make_skill_dir(src.path(), "portable", "Moves around.");

        let mut manager = SkillManager::new(managed.path());
        manager.install(&skill_dir).unwrap();
        assert!(manager.is_installed("portable"));
        assert!(manager.registry().has("portable"));

        manager.uninstall("portable").unwrap();
        assert!(!manager.is_installed("portable"));
        assert!(!manager.registry().has("portable"));
    }

    #[test]
    fn export_round_trips_through_get() {
        let dir = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "exportable", "Goes back out.");

        let mut manager = SkillManager::new(dir.path());
        let dest = manager.export("exportable", target.path()).unwrap();
        assert!(dest.join(MANIFEST_FILE).is_file());
    }

    #[test]
    fn from_config_wires_paths_and_threshold() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        make_skill_dir(a.path(), "one", "In the first path.");
        make_skill_dir(b.path(), "two", "In the second path.");

        let config = SkillsConfig {
            paths: vec![
                a.path().to_string_lossy().into_owned(),
                b.path().to_string_lossy().into_owned(),
            ],
            managed_dir: None,
            relevance_threshold: 0.9,
            cache: false,
        };
        let mut manager = SkillManager::from_config(&config);
        assert_eq!(manager.discover(), 2);
        assert_eq!(manager.managed_dir(), a.path());
        assert!(manager.resolve("loosely related words").is_empty());
    }

    #[test]
    fn managed_dir_is_discoverable_after_install() {
        let src = tempfile::tempdir().unwrap();
        let base = tempfile::tempdir().unwrap();
        let managed = tempfile::tempdir().unwrap();
        let skill_dir = make_skill_dir(src.path(), "installed", "Lives in managed.");

        let mut manager = SkillManager::new(base.path()).with_managed_dir(managed.path());
        manager.install(&skill_dir).unwrap();

        let mut fresh = SkillManager::new(base.path()).with_managed_dir(managed.path());
        fresh.discover();
        assert!(fresh.registry().has("installed"));
    }

    #[test]
    fn generate_skills_prompt_catalogs_registry() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "listed", "Shows up in the catalog.");

        let mut manager = SkillManager::new(dir.path());
        let catalog = manager.generate_skills_prompt();
        assert!(catalog.contains("<skill name=\"listed\""));
    }

    #[test]
    fn validate_reports_manifest_problems() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SkillManager::new(dir.path());
        let report = manager.validate("---\nname: x\n---\nbody");
        assert!(!report.is_valid());
    }

    #[test]
    fn mark_loaded_tracks_disclosure() {
        let dir = tempfile::tempdir().unwrap();
        make_skill_dir(dir.path(), "tracked", "Gets marked.");

        let mut manager = SkillManager::new(dir.path());
        manager.discover();
        manager.mark_loaded("tracked").unwrap();
        assert!(manager.registry().get("tracked").unwrap().is_loaded());
    }
}

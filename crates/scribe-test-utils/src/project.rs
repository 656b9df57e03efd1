//! [`TestProject`] builder for manifest and settings scenarios.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use scribe_core::SettingsResolver;
use scribe_meta::Manifest;
use tempfile::TempDir;

/// Path to a file under the workspace `test-fixtures/` directory
pub fn fixture_path(relative: &str) -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/scribe-test-utils -> ../../test-fixtures
    manifest_dir.join("../../test-fixtures").join(relative)
}

/// Load one of the manifests in `test-fixtures/manifests/`
pub fn fixture_manifest(name: &str) -> Manifest {
    let path = fixture_path(&format!("manifests/{name}"));
    Manifest::load(&path)
        .unwrap_or_else(|e| panic!("Could not load fixture {}: {e}", path.display()))
}

/// A temporary project directory with its own global config directory.
///
/// # Example
///
/// ```rust,no_run
/// use scribe_test_utils::TestProject;
///
/// let project = TestProject::new();
/// project.write_settings("[sync]\ndry_run = true\n");
/// let settings = project.resolver().resolve().unwrap();
/// assert_eq!(settings.sync.dry_run, Some(true));
/// ```
pub struct TestProject {
    root: TempDir,
    global: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            global: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Write `scribe.toml` at the project root and return its path
    pub fn write_manifest(&self, content: &str) -> PathBuf {
        let path = self.root().join("scribe.toml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Write the project layer, `.scribe/settings.toml`
    pub fn write_settings(&self, content: &str) -> PathBuf {
        let dir = self.root().join(".scribe");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Write the global layer into this project's private config directory
    pub fn write_global_settings(&self, content: &str) -> PathBuf {
        let path = self.global.path().join("settings.toml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Resolver isolated from the user's config directory and environment
    pub fn resolver(&self) -> SettingsResolver {
        self.resolver_with_env(HashMap::new())
    }

    pub fn resolver_with_env(&self, env: HashMap<String, String>) -> SettingsResolver {
        SettingsResolver::new(self.root())
            .with_global_config_dir(self.global.path())
            .with_env(env)
    }
}

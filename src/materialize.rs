//! Template-backed file materialization.
//!
//! Every generated config file implements [`Generator`]: it knows its
//! output path and template, and can re-derive its content from the
//! current settings and session. The provided methods give all
//! implementors the same lifecycle — copy the template verbatim when
//! the output is missing, rewrite in place on demand, and re-create
//! after an external deletion. All writes stay inside `.vscode`.
//!
//! `write_file_data` has no default body on purpose: a generator that
//! cannot produce content is a compile error, not a runtime surprise.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::Session;
use crate::settings::SettingsStore;

pub fn vscode_dir(workspace_folder: &Path) -> PathBuf {
    workspace_folder.join(".vscode")
}

pub trait Generator {
    fn output_path(&self) -> &Path;

    fn template(&self) -> &'static str;

    /// Re-derives the output content from current in-memory state.
    fn write_file_data(&self, store: &SettingsStore, session: &Session) -> Result<()>;

    /// Copies the template verbatim when the output is missing.
    /// Idempotent; safe to call from multiple event paths in a row.
    fn ensure_exists(&self) -> Result<()> {
        let output = self.output_path();
        if output.exists() {
            return Ok(());
        }
        if let Some(parent) = output.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(output, self.template())
            .with_context(|| format!("Failed to write {}", output.display()))
    }

    /// Full refresh: materialize if missing, then rewrite from state.
    fn regenerate(&self, store: &SettingsStore, session: &Session) -> Result<()> {
        self.ensure_exists()?;
        self.write_file_data(store, session)
    }

    /// Delete-watch entry point: the watcher calls this for any delete
    /// under the output directory.
    fn on_output_deleted(&self) -> Result<()> {
        self.ensure_exists()
    }
}

/// The companion build script. Its content is static, so a rewrite is
/// the same verbatim copy as materialization.
pub struct MakefileGenerator {
    output_path: PathBuf,
}

impl MakefileGenerator {
    pub fn new(workspace_folder: &Path) -> Self {
        Self {
            output_path: vscode_dir(workspace_folder).join("Makefile"),
        }
    }
}

impl Generator for MakefileGenerator {
    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn template(&self) -> &'static str {
        crate::templates::MAKEFILE
    }

    fn write_file_data(&self, _store: &SettingsStore, _session: &Session) -> Result<()> {
        fs::write(&self.output_path, self.template())
            .with_context(|| format!("Failed to write {}", self.output_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn makefile_materializes_and_self_heals() {
        let dir = tempfile::tempdir().unwrap();
        let generator = MakefileGenerator::new(dir.path());

        generator.ensure_exists().unwrap();
        assert!(generator.output_path().exists());

        // A second call must not fail or change anything.
        let before = fs::read_to_string(generator.output_path()).unwrap();
        generator.ensure_exists().unwrap();
        assert_eq!(before, fs::read_to_string(generator.output_path()).unwrap());

        fs::remove_file(generator.output_path()).unwrap();
        generator.on_output_deleted().unwrap();
        assert!(generator.output_path().exists());
    }
}

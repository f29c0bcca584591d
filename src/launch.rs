//! Debug launch configuration generator (`launch.json`).
//!
//! Keeps the entry named [`DEBUG_CONFIG_NAME`] pointed at the active
//! folder's output binary for the current build mode. The `debug`
//! command resolves that entry and starts the debugger against it.

use anyhow::Result;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use crate::fsutil::{path_exists, read_json_file, replace_backslashes, write_json_file};
use crate::materialize::{Generator, vscode_dir};
use crate::session::Session;
use crate::settings::SettingsStore;
use crate::templates::LAUNCH_TEMPLATE;

pub const OUTPUT_FILENAME: &str = "launch.json";
pub const DEBUG_CONFIG_NAME: &str = "ccrun: Debug Session";

pub struct LaunchGenerator {
    output_path: PathBuf,
}

impl LaunchGenerator {
    pub fn new(workspace_folder: &Path) -> Self {
        Self {
            output_path: vscode_dir(workspace_folder).join(OUTPUT_FILENAME),
        }
    }
}

impl Generator for LaunchGenerator {
    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn template(&self) -> &'static str {
        LAUNCH_TEMPLATE
    }

    fn write_file_data(&self, store: &SettingsStore, session: &Session) -> Result<()> {
        let Some(active_folder) = session.active_folder() else {
            return Ok(());
        };

        let base = if path_exists(&self.output_path) {
            read_json_file(&self.output_path)
        } else {
            serde_json::from_str(self.template()).ok()
        };
        let Some(mut doc) = base else {
            return Ok(());
        };

        let Some(configurations) = doc.get_mut("configurations").and_then(Value::as_array_mut)
        else {
            return Ok(());
        };

        // The named entry must exist; recover it from the template if a
        // hand edit removed it.
        let index = match configuration_index(configurations, DEBUG_CONFIG_NAME) {
            Some(index) => index,
            None => {
                let template: Value = serde_json::from_str(self.template())?;
                let entry = template["configurations"][0].clone();
                configurations.push(entry);
                configurations.len() - 1
            }
        };

        let mode = session.build_mode;
        let program = active_folder
            .join("build")
            .join(mode.to_string())
            .join(format!("out{mode}"));
        let debugger = Path::new(&store.values.debugger_path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "gdb".to_string());

        let config = &mut configurations[index];
        config["program"] = json!(replace_backslashes(&program.to_string_lossy()));
        config["cwd"] = json!(replace_backslashes(&active_folder.to_string_lossy()));
        config["MIMode"] = json!(debugger);
        config["miDebuggerPath"] = json!(store.values.debugger_path);

        write_json_file(&self.output_path, &doc)
    }
}

/// Index of the configuration entry with the given display name.
pub fn configuration_index(configurations: &[Value], name: &str) -> Option<usize> {
    configurations
        .iter()
        .position(|config| config.get("name").and_then(Value::as_str) == Some(name))
}

/// The on-disk debug entry for a workspace, if it exists.
pub fn launch_configuration(workspace_folder: &Path) -> Option<Value> {
    let doc = read_json_file(&vscode_dir(workspace_folder).join(OUTPUT_FILENAME))?;
    let configurations = doc.get("configurations")?.as_array()?;
    let index = configuration_index(configurations, DEBUG_CONFIG_NAME)?;
    Some(configurations[index].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::BuildMode;
    use std::path::PathBuf;

    fn session_for(dir: &Path) -> Session {
        let mut session = Session::default();
        session.update_folders(
            Some(dir.to_path_buf()),
            Some(dir.join("app")),
        );
        session
    }

    #[test]
    fn program_tracks_mode_and_folder() {
        let dir = tempfile::tempdir().unwrap();
        let generator = LaunchGenerator::new(dir.path());
        let store = SettingsStore::open(dir.path());
        let mut session = session_for(dir.path());

        generator.regenerate(&store, &session).unwrap();
        let entry = launch_configuration(dir.path()).unwrap();
        assert!(entry["program"].as_str().unwrap().ends_with("app/build/Debug/outDebug"));

        session.update_mode(BuildMode::Release, session.architecture);
        generator.regenerate(&store, &session).unwrap();
        let entry = launch_configuration(dir.path()).unwrap();
        assert!(
            entry["program"]
                .as_str()
                .unwrap()
                .ends_with("app/build/Release/outRelease")
        );
    }

    #[test]
    fn removed_entry_is_restored_from_template() {
        let dir = tempfile::tempdir().unwrap();
        let generator = LaunchGenerator::new(dir.path());
        let store = SettingsStore::open(dir.path());
        let session = session_for(dir.path());

        generator.regenerate(&store, &session).unwrap();
        let mut doc = read_json_file(generator.output_path()).unwrap();
        doc["configurations"] = serde_json::json!([{"name": "user entry"}]);
        write_json_file(generator.output_path(), &doc).unwrap();

        generator.regenerate(&store, &session).unwrap();
        let doc = read_json_file(generator.output_path()).unwrap();
        let configurations = doc["configurations"].as_array().unwrap();
        assert_eq!(configurations.len(), 2);
        assert!(launch_configuration(dir.path()).is_some());
    }

    #[test]
    fn no_active_folder_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let generator = LaunchGenerator::new(dir.path());
        let store = SettingsStore::open(dir.path());
        let mut session = Session::default();
        session.update_folders(Some(PathBuf::from(dir.path())), None);

        generator.regenerate(&store, &session).unwrap();
        // Materialized from template, but not rewritten.
        let entry = launch_configuration(dir.path()).unwrap();
        assert_eq!(entry["program"], "");
    }
}

//! Task synthesis engine.
//!
//! Loads the embedded task template, filters and annotates the entries
//! for the active folder, and emits runnable command lines against the
//! companion Makefile. Callers depend on the fixed order Build, Run,
//! Clean, then a single Debug placeholder with no command; positional
//! indexing into the result is part of the contract.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use crate::fsutil::{detect_language, path_exists, read_json_file, replace_backslashes, write_json_file};
use crate::materialize::{Generator, vscode_dir};
use crate::session::{Language, Session};
use crate::settings::SettingsStore;
use crate::templates::TASKS_TEMPLATE;

pub const OUTPUT_FILENAME: &str = "tasks.json";
const SHELL_TYPE: &str = "shell";

/// Placeholder in the template args, replaced with the project folder
/// when a command line is executed or written into `tasks.json`.
pub const FILE_DIR_PLACEHOLDER: &str = "FILE_DIR";

/// One synthesized actionable unit. The Debug entry carries no command
/// line; it is launched through the debug-session path instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub label: String,
    pub command_line: Option<String>,
}

#[derive(Deserialize)]
struct TaskTemplate {
    tasks: Vec<TemplateTask>,
}

#[derive(Deserialize)]
struct TemplateTask {
    #[serde(rename = "type")]
    exec_type: String,
    label: String,
    #[serde(default)]
    args: Vec<String>,
    options: Option<TaskOptions>,
}

#[derive(Deserialize)]
struct TaskOptions {
    #[serde(default)]
    hide: bool,
}

/// Synthesizes the task list for the current session. No active folder
/// or an unreadable template yields an empty list, never an error.
pub fn get_tasks(
    session: &Session,
    store: &SettingsStore,
    makefile_path: &Path,
) -> Vec<TaskDescriptor> {
    let Some(active_folder) = session.active_folder() else {
        return Vec::new();
    };
    let Some(display_folder) = session.display_folder() else {
        return Vec::new();
    };
    let Ok(template) = serde_json::from_str::<TaskTemplate>(TASKS_TEMPLATE) else {
        return Vec::new();
    };

    let language = detect_language(active_folder);
    let mut tasks = Vec::new();

    for task in template.tasks {
        if task.exec_type != SHELL_TYPE {
            continue;
        }
        if task.options.as_ref().map(|o| o.hide).unwrap_or(false) {
            continue;
        }

        let label = rewrite_label(&task.label, &display_folder);
        let mut args = task.args.clone();
        append_script_args(&mut args, &label, language, session, store, makefile_path);

        let command_line = format!("{} {}", store.values.make_path, args.join(" "));
        tasks.push(TaskDescriptor {
            label,
            command_line: Some(command_line),
        });
    }

    // The Debug entry is appended separately and has no executable
    // command; the debug command path resolves it through launch.json.
    tasks.push(TaskDescriptor {
        label: rewrite_label("Debug: FOLDER", &display_folder),
        command_line: None,
    });

    tasks
}

/// Replaces the template's `FILE_DIR=FILE_DIR` placeholder with the
/// actual project folder, quoted for paths with spaces.
pub fn substitute_file_dir(command_line: &str, project_folder: &Path) -> String {
    let assignment = format!("{FILE_DIR_PLACEHOLDER}={FILE_DIR_PLACEHOLDER}");
    let replacement = format!(
        "{FILE_DIR_PLACEHOLDER}=\"{}\"",
        replace_backslashes(&project_folder.to_string_lossy())
    );
    command_line.replacen(&assignment, &replacement, 1)
}

/// Replaces the portion after the first `": "` with the display folder
/// and normalizes separators.
fn rewrite_label(label: &str, display_folder: &str) -> String {
    let rewritten = match label.split_once(": ") {
        Some((prefix, _)) => format!("{prefix}: {display_folder}"),
        None => label.to_string(),
    };
    replace_backslashes(&rewritten)
}

/// Appends the Makefile macro arguments in their fixed order.
fn append_script_args(
    args: &mut Vec<String>,
    label: &str,
    language: Language,
    session: &Session,
    store: &SettingsStore,
    makefile_path: &Path,
) {
    let settings = &store.values;
    args.push(format!(
        "--file={}",
        replace_backslashes(&makefile_path.to_string_lossy())
    ));

    // Single-value macros.
    args.push(format!("COMPILATION_MODE={}", session.build_mode));
    args.push(format!("EXECUTABLE_NAME=out{}", session.build_mode));
    args.push(format!("LANGUAGE_MODE={language}"));

    let clean_task = label.contains("Clean");
    let run_task = label.contains("Run");
    if clean_task || run_task {
        return;
    }

    match language {
        Language::C => {
            args.push(format!("C_COMPILER={}", settings.c_compiler_path));
            if !settings.c_standard.is_empty() {
                args.push(format!("C_STANDARD={}", settings.c_standard));
            }
        }
        Language::Cpp => {
            args.push(format!("CPP_COMPILER={}", settings.cpp_compiler_path));
            if !settings.cpp_standard.is_empty() {
                args.push(format!("CPP_STANDARD={}", settings.cpp_standard));
            }
        }
    }

    args.push(format!("ENABLE_WARNINGS={}", settings.enable_warnings as u8));
    args.push(format!(
        "WARNINGS_AS_ERRORS={}",
        settings.warnings_as_error as u8
    ));
    args.push(format!("ARCHITECTURE={}", session.architecture.bits()));

    // Multi-value macros, quoted so make sees one word each.
    if !settings.warnings.is_empty() {
        args.push(format!("WARNINGS=\"{}\"", settings.warnings.join(" ")));
    }
    if !settings.compiler_args.is_empty() {
        args.push(format!(
            "COMPILER_ARGS=\"{}\"",
            settings.compiler_args.join(" ")
        ));
    }
    if !settings.linker_args.is_empty() {
        args.push(format!("LINKER_ARGS=\"{}\"", settings.linker_args.join(" ")));
    }
    if !settings.include_paths.is_empty() {
        args.push(format!(
            "INCLUDE_PATHS=\"{}\"",
            settings.include_paths.join(" ")
        ));
    }
}

/// Writes the synthesized task list to `.vscode/tasks.json` so the
/// editor task runner sees the same commands the CLI executes.
pub struct TasksGenerator {
    output_path: PathBuf,
}

impl TasksGenerator {
    pub fn new(workspace_folder: &Path) -> Self {
        Self {
            output_path: vscode_dir(workspace_folder).join(OUTPUT_FILENAME),
        }
    }

    fn makefile_path(&self) -> PathBuf {
        self.output_path
            .parent()
            .map(|dir| dir.join("Makefile"))
            .unwrap_or_else(|| PathBuf::from("Makefile"))
    }
}

impl Generator for TasksGenerator {
    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn template(&self) -> &'static str {
        TASKS_TEMPLATE
    }

    fn write_file_data(&self, store: &SettingsStore, session: &Session) -> Result<()> {
        let tasks = get_tasks(session, store, &self.makefile_path());
        if tasks.is_empty() {
            return Ok(());
        }
        let Some(project_folder) = session.project_folder() else {
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

        let entries: Vec<Value> = tasks
            .iter()
            .map(|task| {
                let mut entry = json!({
                    "type": SHELL_TYPE,
                    "label": task.label,
                    "problemMatcher": ["$gcc"],
                });
                // The placeholder is resolved here so the written file
                // is runnable as-is, not just through the CLI.
                if let Some(command_line) = &task.command_line {
                    entry["command"] = json!(substitute_file_dir(command_line, project_folder));
                }
                entry
            })
            .collect();
        doc["tasks"] = json!(entries);

        write_json_file(&self.output_path, &doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Architecture, BuildMode};
    use std::fs;

    fn workspace_with(files: &[&str]) -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let active = dir.path().join("app");
        fs::create_dir_all(&active).unwrap();
        for file in files {
            fs::write(active.join(file), "").unwrap();
        }
        let mut session = Session::default();
        session.update_folders(Some(dir.path().to_path_buf()), Some(active));
        (dir, session)
    }

    fn makefile(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join(".vscode/Makefile")
    }

    #[test]
    fn file_dir_substitution_only_touches_the_value() {
        let command = "make build FILE_DIR=FILE_DIR COMPILATION_MODE=Debug";
        let result = substitute_file_dir(command, Path::new("/ws/app"));
        assert_eq!(
            result,
            "make build FILE_DIR=\"/ws/app\" COMPILATION_MODE=Debug"
        );
    }

    #[test]
    fn no_active_folder_yields_no_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path());
        let tasks = get_tasks(&Session::default(), &store, &makefile(&dir));
        assert!(tasks.is_empty());
    }

    #[test]
    fn tasks_come_in_fixed_order_with_debug_last() {
        let (dir, session) = workspace_with(&["main.c"]);
        let store = SettingsStore::open(dir.path());

        let tasks = get_tasks(&session, &store, &makefile(&dir));
        assert_eq!(tasks.len(), 4);
        assert!(tasks[0].label.starts_with("Build: "));
        assert!(tasks[1].label.starts_with("Run: "));
        assert!(tasks[2].label.starts_with("Clean: "));
        assert!(tasks[3].label.starts_with("Debug: "));
        assert!(tasks[3].command_line.is_none());
        assert!(tasks[..3].iter().all(|t| t.command_line.is_some()));
    }

    #[test]
    fn labels_embed_display_folder() {
        let (dir, session) = workspace_with(&["main.c"]);
        let store = SettingsStore::open(dir.path());
        let workspace_name = dir.path().file_name().unwrap().to_string_lossy().into_owned();

        let tasks = get_tasks(&session, &store, &makefile(&dir));
        assert_eq!(tasks[0].label, format!("Build: {workspace_name}/app"));
    }

    #[test]
    fn c_folder_gets_c_compiler_only() {
        let (dir, session) = workspace_with(&["main.c", "util.h"]);
        let store = SettingsStore::open(dir.path());

        let build = get_tasks(&session, &store, &makefile(&dir))[0]
            .command_line
            .clone()
            .unwrap();
        assert!(build.contains("LANGUAGE_MODE=C"));
        assert!(build.contains("C_COMPILER="));
        assert!(!build.contains("CPP_COMPILER="));
    }

    #[test]
    fn cpp_file_switches_language_mode() {
        let (dir, session) = workspace_with(&["main.c", "extra.cpp"]);
        let store = SettingsStore::open(dir.path());

        let build = get_tasks(&session, &store, &makefile(&dir))[0]
            .command_line
            .clone()
            .unwrap();
        assert!(build.contains("LANGUAGE_MODE=Cpp"));
        assert!(build.contains("CPP_COMPILER="));
    }

    #[test]
    fn architecture_maps_to_bit_width() {
        let (dir, mut session) = workspace_with(&["main.c"]);
        let store = SettingsStore::open(dir.path());

        session.update_mode(BuildMode::Debug, Architecture::X64);
        let build = get_tasks(&session, &store, &makefile(&dir))[0]
            .command_line
            .clone()
            .unwrap();
        assert!(build.contains("ARCHITECTURE=64"));

        session.update_mode(BuildMode::Debug, Architecture::X86);
        let build = get_tasks(&session, &store, &makefile(&dir))[0]
            .command_line
            .clone()
            .unwrap();
        assert!(build.contains("ARCHITECTURE=32"));
    }

    #[test]
    fn clean_and_run_skip_compiler_macros() {
        let (dir, session) = workspace_with(&["main.c"]);
        let store = SettingsStore::open(dir.path());

        let tasks = get_tasks(&session, &store, &makefile(&dir));
        for task in &tasks[1..3] {
            let command_line = task.command_line.as_ref().unwrap();
            assert!(command_line.contains("COMPILATION_MODE="));
            assert!(!command_line.contains("C_COMPILER="));
            assert!(!command_line.contains("ENABLE_WARNINGS="));
        }
    }

    #[test]
    fn release_mode_renames_the_executable() {
        let (dir, mut session) = workspace_with(&["main.c"]);
        let store = SettingsStore::open(dir.path());
        session.update_mode(BuildMode::Release, Architecture::X64);

        let build = get_tasks(&session, &store, &makefile(&dir))[0]
            .command_line
            .clone()
            .unwrap();
        assert!(build.contains("COMPILATION_MODE=Release"));
        assert!(build.contains("EXECUTABLE_NAME=outRelease"));
    }

    #[test]
    fn multi_value_macros_are_quoted_and_optional() {
        let (dir, session) = workspace_with(&["main.c"]);
        let mut store = SettingsStore::open(dir.path());
        store.values.include_paths = vec!["-I lib".to_string()];
        store.values.linker_args.clear();

        let build = get_tasks(&session, &store, &makefile(&dir))[0]
            .command_line
            .clone()
            .unwrap();
        assert!(build.contains("WARNINGS=\"-Wall -Wextra -Wpedantic\""));
        assert!(build.contains("INCLUDE_PATHS=\"-I lib\""));
        assert!(!build.contains("LINKER_ARGS="));
    }

    #[test]
    fn tasks_json_mirrors_the_synthesized_list() {
        let (dir, session) = workspace_with(&["main.c"]);
        let store = SettingsStore::open(dir.path());
        let generator = TasksGenerator::new(dir.path());

        generator.regenerate(&store, &session).unwrap();
        let doc = read_json_file(generator.output_path()).unwrap();
        let entries = doc["tasks"].as_array().unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries[0]["command"].as_str().unwrap().contains("COMPILATION_MODE=Debug"));
        assert!(entries[3].get("command").is_none());
    }

    #[test]
    fn written_commands_carry_the_resolved_project_folder() {
        let (dir, session) = workspace_with(&["main.c"]);
        let store = SettingsStore::open(dir.path());
        let generator = TasksGenerator::new(dir.path());

        generator.regenerate(&store, &session).unwrap();
        let doc = read_json_file(generator.output_path()).unwrap();
        let active = replace_backslashes(&dir.path().join("app").to_string_lossy());
        for entry in &doc["tasks"].as_array().unwrap()[..3] {
            let command = entry["command"].as_str().unwrap();
            assert!(!command.contains("FILE_DIR=FILE_DIR"));
            assert!(command.contains(&format!("FILE_DIR=\"{active}\"")));
        }
    }
}

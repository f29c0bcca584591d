//! IntelliSense configuration generator (`c_cpp_properties.json`).
//!
//! The first configuration entry is keyed by the OS-compiler-arch
//! triplet. The merge base is the existing on-disk file when present,
//! so fields the generator does not manage survive hand edits;
//! [`PropertiesGenerator::change_callback`] syncs hand edits of the
//! managed fields back into the settings store.

use anyhow::Result;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use crate::fsutil::{path_exists, read_json_file, write_json_file};
use crate::materialize::{Generator, vscode_dir};
use crate::session::{OperatingSystem, Session};
use crate::settings::{MSVC_COMPILER_NAME, SettingsStore};
use crate::templates::PROPERTIES_TEMPLATE;

pub const OUTPUT_FILENAME: &str = "c_cpp_properties.json";
pub const INCLUDE_PATTERN: &str = "${workspaceFolder}/**";
const DEFAULT_STANDARD: &str = "${default}";

pub struct PropertiesGenerator {
    output_path: PathBuf,
}

impl PropertiesGenerator {
    pub fn new(workspace_folder: &Path) -> Self {
        Self {
            output_path: vscode_dir(workspace_folder).join(OUTPUT_FILENAME),
        }
    }

    /// Decides whether regeneration is required without regenerating:
    /// the output is absent or unreadable, its triplet no longer names
    /// the current operating system, or MSVC is configured while the
    /// IntelliSense mode still points elsewhere.
    pub fn update_check(&self, store: &SettingsStore) -> bool {
        if !path_exists(&self.output_path) {
            return true;
        }
        let Some(doc) = read_json_file(&self.output_path) else {
            return true;
        };
        let Some(config) = doc.get("configurations").and_then(|c| c.get(0)) else {
            return true;
        };

        let name = config.get("name").and_then(Value::as_str).unwrap_or("");
        if !name.contains(&store.operating_system.to_string()) {
            return true;
        }

        if store.is_msvc() {
            let mode = config
                .get("intelliSenseMode")
                .and_then(Value::as_str)
                .unwrap_or("");
            if !mode.contains("msvc") {
                return true;
            }
        }

        false
    }

    /// Reverse synchronization: reconciles hand edits of the generated
    /// file back into the settings store.
    pub fn change_callback(&self, store: &mut SettingsStore) -> Result<()> {
        let Some(doc) = read_json_file(&self.output_path) else {
            return Ok(());
        };
        let Some(config) = doc.get("configurations").and_then(|c| c.get(0)) else {
            return Ok(());
        };

        if let Some(compiler_path) = config.get("compilerPath").and_then(Value::as_str)
            && compiler_path != store.values.c_compiler_path
            && compiler_path != store.values.cpp_compiler_path
        {
            // Fixed priority: the double-plus names must win over their
            // substrings.
            let name = compiler_label(compiler_path);
            if name.contains("clang++") {
                store.set_clangpp(compiler_path)?;
            } else if name.contains("clang") {
                store.set_clang(compiler_path)?;
            } else if name.contains("g++") {
                store.set_gpp(compiler_path)?;
            } else if name.contains("gcc") {
                store.set_gcc(compiler_path)?;
            }
        }

        if let Some(standard) = config.get("cStandard").and_then(Value::as_str)
            && standard != DEFAULT_STANDARD
            && standard != store.values.c_standard
        {
            store.values.c_standard = standard.to_string();
        }

        if let Some(standard) = config.get("cppStandard").and_then(Value::as_str)
            && standard != DEFAULT_STANDARD
            && standard != store.values.cpp_standard
        {
            store.values.cpp_standard = standard.to_string();
        }

        if let Some(args) = config.get("compilerArgs").and_then(Value::as_array) {
            store.values.compiler_args = dedup_strings(args)
                .into_iter()
                .filter(|arg| !arg.contains("-W"))
                .collect();
        }

        if let Some(paths) = config.get("includePath").and_then(Value::as_array) {
            store.values.include_paths = dedup_strings(paths)
                .into_iter()
                .filter(|path| path != INCLUDE_PATTERN)
                .collect();
        }

        store.save()
    }
}

impl Generator for PropertiesGenerator {
    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn template(&self) -> &'static str {
        PROPERTIES_TEMPLATE
    }

    fn write_file_data(&self, store: &SettingsStore, _session: &Session) -> Result<()> {
        // Merge base: the existing file when present, else the template.
        let base = if path_exists(&self.output_path) {
            read_json_file(&self.output_path)
        } else {
            serde_json::from_str(self.template()).ok()
        };
        let Some(mut doc) = base else {
            return Ok(());
        };

        if !store.discovered.c_compiler && !store.is_msvc() {
            return Ok(());
        }
        let Some(architecture) = store.architecture else {
            return Ok(());
        };

        let os = store.operating_system.to_string();
        let compiler = if store.is_msvc() {
            "msvc".to_string()
        } else {
            compiler_label(&store.values.c_compiler_path)
        };
        let triplet = format!("{os}-{compiler}-{architecture}");

        let Some(config) = doc.get_mut("configurations").and_then(|c| c.get_mut(0)) else {
            return Ok(());
        };

        config["compilerArgs"] = json!(dedup_owned(&store.values.compiler_args));

        let mut include_path = vec![INCLUDE_PATTERN.to_string()];
        for path in &store.values.include_paths {
            if path != INCLUDE_PATTERN && !include_path.contains(path) {
                include_path.push(path.clone());
            }
        }
        config["includePath"] = json!(include_path);

        config["cStandard"] = standard_or_default(&store.values.c_standard);
        config["cppStandard"] = standard_or_default(&store.values.cpp_standard);

        config["compilerPath"] = if store.is_msvc() {
            json!(
                Path::new(&store.values.msvc_tools_path)
                    .join(MSVC_COMPILER_NAME)
                    .to_string_lossy()
            )
        } else {
            json!(store.values.c_compiler_path)
        };

        // Cygwin hosts a POSIX toolchain on Windows: the editor treats
        // it as a linux IntelliSense mode under a windows-cygwin name.
        if store.values.is_cygwin
            && !store.is_msvc()
            && store.operating_system == OperatingSystem::Windows
        {
            config["name"] = json!(triplet.replace("windows", "windows-cygwin"));
            config["intelliSenseMode"] = json!(triplet.replace("windows", "linux"));
        } else {
            config["name"] = json!(triplet);
            config["intelliSenseMode"] = json!(triplet);
        }

        write_json_file(&self.output_path, &doc)
    }
}

/// Lower-cased basename without extension, e.g. `/usr/bin/gcc-13.exe`
/// becomes `gcc-13`.
fn compiler_label(compiler_path: &str) -> String {
    Path::new(compiler_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn standard_or_default(standard: &str) -> Value {
    if standard.is_empty() {
        json!(DEFAULT_STANDARD)
    } else {
        json!(standard)
    }
}

fn dedup_owned(values: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(value) {
            seen.push(value.clone());
        }
    }
    seen
}

fn dedup_strings(values: &[Value]) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if let Some(s) = value.as_str()
            && !seen.contains(&s.to_string())
        {
            seen.push(s.to_string());
        }
    }
    seen
}

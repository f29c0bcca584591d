//! Toolchain settings store.
//!
//! Single source of truth for build configuration. Values persist under
//! the `"ccrun"` object of `.vscode/settings.json`; every other key in
//! that file belongs to the user and survives a save untouched.
//!
//! Environment probing (compiler presence, architecture sniffing) never
//! fails: an absent binary is reported as not found and the
//! architecture degrades to x86.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

use crate::logger;
use crate::session::{Architecture, OperatingSystem};

pub const SETTINGS_SECTION: &str = "ccrun";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const MSVC_COMPILER_NAME: &str = "cl.exe";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub c_compiler_path: String,
    pub cpp_compiler_path: String,
    pub debugger_path: String,
    pub make_path: String,
    pub c_standard: String,
    pub cpp_standard: String,
    pub enable_warnings: bool,
    pub warnings_as_error: bool,
    pub warnings: Vec<String>,
    pub compiler_args: Vec<String>,
    pub linker_args: Vec<String>,
    pub include_paths: Vec<String>,
    pub msvc_batch_path: String,
    pub msvc_tools_path: String,
    pub operating_system: Option<OperatingSystem>,
    pub architecture: Option<Architecture>,
    pub is_cygwin: bool,
    pub logging_active: bool,
    pub experimental_execution: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            c_compiler_path: "gcc".to_string(),
            cpp_compiler_path: "g++".to_string(),
            debugger_path: "gdb".to_string(),
            make_path: "make".to_string(),
            c_standard: String::new(),
            cpp_standard: String::new(),
            enable_warnings: true,
            warnings_as_error: false,
            warnings: vec![
                "-Wall".to_string(),
                "-Wextra".to_string(),
                "-Wpedantic".to_string(),
            ],
            compiler_args: Vec::new(),
            linker_args: Vec::new(),
            include_paths: Vec::new(),
            msvc_batch_path: String::new(),
            msvc_tools_path: String::new(),
            operating_system: None,
            architecture: None,
            is_cygwin: false,
            logging_active: false,
            experimental_execution: false,
        }
    }
}

/// PATH probe results, re-derived on every `get_settings` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discovered {
    pub c_compiler: bool,
    pub cpp_compiler: bool,
    pub debugger: bool,
    pub make: bool,
}

pub struct SettingsStore {
    vscode_dir: PathBuf,
    pub values: Settings,
    pub discovered: Discovered,
    pub operating_system: OperatingSystem,
    pub architecture: Option<Architecture>,
}

impl SettingsStore {
    /// Reads the store for a workspace. Any read or parse failure
    /// degrades to built-in defaults.
    pub fn open(workspace_folder: &Path) -> Self {
        let vscode_dir = workspace_folder.join(".vscode");
        let values = read_section(&vscode_dir.join(SETTINGS_FILENAME));
        Self {
            vscode_dir,
            values,
            discovered: Discovered::default(),
            operating_system: OperatingSystem::detect(),
            architecture: None,
        }
    }

    /// MSVC is the active family exactly when a batch path is set.
    pub fn is_msvc(&self) -> bool {
        !self.values.msvc_batch_path.is_empty()
    }

    /// Probes the environment and resolves the derived values: detected
    /// operating system, per-binary presence, sniffed architecture, and
    /// the MSVC tools path when that family is selected.
    pub fn get_settings(&mut self) {
        let logging = self.values.logging_active;

        self.operating_system = self
            .values
            .operating_system
            .unwrap_or_else(OperatingSystem::detect);

        self.discovered.c_compiler = resolve_command(&mut self.values.c_compiler_path, logging);
        self.discovered.cpp_compiler = resolve_command(&mut self.values.cpp_compiler_path, logging);
        self.discovered.debugger = resolve_command(&mut self.values.debugger_path, logging);
        self.discovered.make = resolve_command(&mut self.values.make_path, logging);

        if self.is_msvc() && self.values.msvc_tools_path.is_empty() {
            if let Some(tools) = derive_msvc_tools_path(Path::new(&self.values.msvc_batch_path)) {
                self.values.msvc_tools_path = tools.to_string_lossy().into_owned();
            } else {
                logger::log(logging, "MSVC tools path could not be derived");
            }
        }

        self.architecture = Some(self.values.architecture.unwrap_or_else(|| {
            get_architecture(&self.values.c_compiler_path, logging)
        }));
    }

    /// Adopts a discovered gcc binary as the C compiler and infers the
    /// sibling C++ compiler name.
    pub fn set_gcc(&mut self, path: &str) -> Result<()> {
        self.values.c_compiler_path = path.to_string();
        self.values.cpp_compiler_path = path.replace("gcc", "g++");
        self.save()
    }

    pub fn set_gpp(&mut self, path: &str) -> Result<()> {
        self.values.cpp_compiler_path = path.to_string();
        self.values.c_compiler_path = path.replace("g++", "gcc");
        self.save()
    }

    pub fn set_clang(&mut self, path: &str) -> Result<()> {
        self.values.c_compiler_path = path.to_string();
        self.values.cpp_compiler_path = path.replace("clang", "clang++");
        self.save()
    }

    pub fn set_clangpp(&mut self, path: &str) -> Result<()> {
        self.values.cpp_compiler_path = path.to_string();
        self.values.c_compiler_path = path.replace("clang++", "clang");
        self.save()
    }

    /// Restores built-in defaults and persists them.
    pub fn reset(&mut self) -> Result<()> {
        self.values = Settings::default();
        self.discovered = Discovered::default();
        self.architecture = None;
        self.save()
    }

    /// Writes the `"ccrun"` section back, preserving all foreign keys
    /// in `settings.json`.
    pub fn save(&self) -> Result<()> {
        if !self.vscode_dir.exists() {
            fs::create_dir_all(&self.vscode_dir)
                .context("Failed to create .vscode directory")?;
        }
        let path = self.vscode_dir.join(SETTINGS_FILENAME);

        let mut root = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .and_then(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_else(Map::new);

        root.insert(
            SETTINGS_SECTION.to_string(),
            serde_json::to_value(&self.values)?,
        );

        let content = serde_json::to_string_pretty(&Value::Object(root))?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn read_section(path: &Path) -> Settings {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .and_then(|mut root| root.get_mut(SETTINGS_SECTION).map(Value::take))
        .and_then(|section| serde_json::from_value(section).ok())
        .unwrap_or_default()
}

/// Looks a command up on the search path. On success the configured
/// value is replaced with the resolved location (with a normalized
/// lower-case `.exe` suffix on Windows).
fn resolve_command(command: &mut String, logging: bool) -> bool {
    match which::which(command.as_str()) {
        Ok(resolved) => {
            let mut resolved = resolved.to_string_lossy().into_owned();
            if resolved.ends_with(".EXE") {
                resolved = resolved.replace(".EXE", ".exe");
            }
            *command = resolved;
            true
        }
        Err(_) => {
            logger::log(logging, &format!("{command} not found on PATH"));
            false
        }
    }
}

/// Asks the compiler for its target triple and keys off a 64-bit
/// marker. Any invocation failure degrades to x86.
pub fn get_architecture(compiler: &str, logging: bool) -> Architecture {
    match Command::new(compiler).arg("-dumpmachine").output() {
        Ok(output) => {
            let target = String::from_utf8_lossy(&output.stdout);
            if target.contains("64") {
                Architecture::X64
            } else {
                Architecture::X86
            }
        }
        Err(_) => {
            logger::log(logging, &format!("{compiler} -dumpmachine failed"));
            Architecture::X86
        }
    }
}

/// Derives `VC/Tools/MSVC/<newest>/bin/Hostx64/x64` from the vcvars
/// batch file location.
fn derive_msvc_tools_path(batch_path: &Path) -> Option<PathBuf> {
    let vc_root = batch_path
        .ancestors()
        .find(|dir| dir.join("VC").join("Tools").join("MSVC").is_dir())?;
    let msvc_dir = vc_root.join("VC").join("Tools").join("MSVC");

    let newest = WalkDir::new(&msvc_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .max_by(|a, b| a.file_name().cmp(&b.file_name()))?;

    let tools = newest.join("bin").join("Hostx64").join("x64");
    tools.join(MSVC_COMPILER_NAME).exists().then_some(tools)
}

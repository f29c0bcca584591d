//! Workspace session state.
//!
//! Holds which folder build/run/debug actions apply to, plus the build
//! mode and target architecture. The session is always swapped as a
//! whole pair (workspace root, active sub-folder) and survives between
//! CLI invocations via `.vscode/ccrun_session.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::fsutil::replace_backslashes;

pub const SESSION_FILENAME: &str = "ccrun_session.json";

/// Compilation mode, affecting flags and output naming (`outDebug`, `outRelease`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Debug => write!(f, "Debug"),
            BuildMode::Release => write!(f, "Release"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    #[default]
    X64,
}

impl Architecture {
    /// Bit width as passed to the build script (`ARCHITECTURE=64`/`32`).
    pub fn bits(&self) -> &'static str {
        match self {
            Architecture::X86 => "32",
            Architecture::X64 => "64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86 => write!(f, "x86"),
            Architecture::X64 => write!(f, "x64"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Windows,
    Linux,
    #[serde(rename = "macos")]
    Mac,
}

impl OperatingSystem {
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => OperatingSystem::Windows,
            "macos" => OperatingSystem::Mac,
            _ => OperatingSystem::Linux,
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingSystem::Windows => write!(f, "windows"),
            OperatingSystem::Linux => write!(f, "linux"),
            OperatingSystem::Mac => write!(f, "macos"),
        }
    }
}

/// Dominant language of a folder: any C++ source file makes it C++.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    C,
    Cpp,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::C => write!(f, "C"),
            Language::Cpp => write!(f, "Cpp"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    workspace_folder: Option<PathBuf>,
    active_folder: Option<PathBuf>,
    pub build_mode: BuildMode,
    pub architecture: Architecture,
}

impl Session {
    pub fn workspace_folder(&self) -> Option<&Path> {
        self.workspace_folder.as_deref()
    }

    pub fn active_folder(&self) -> Option<&Path> {
        self.active_folder.as_deref()
    }

    /// Replaces the folder pair wholesale. Partial updates are not
    /// allowed; rename/delete handling goes through this as well.
    pub fn update_folders(
        &mut self,
        workspace_folder: Option<PathBuf>,
        active_folder: Option<PathBuf>,
    ) {
        self.workspace_folder = workspace_folder;
        self.active_folder = active_folder;
    }

    /// Architecture is always required alongside the mode.
    pub fn update_mode(&mut self, build_mode: BuildMode, architecture: Architecture) {
        self.build_mode = build_mode;
        self.architecture = architecture;
    }

    /// Active folder else workspace root.
    pub fn project_folder(&self) -> Option<&Path> {
        self.active_folder().or(self.workspace_folder())
    }

    /// Active folder for display: the workspace prefix is replaced by
    /// its base name and path separators are normalized.
    pub fn display_folder(&self) -> Option<String> {
        let workspace = self.workspace_folder()?;
        let active = self.active_folder()?;
        let workspace_str = workspace.to_string_lossy();
        let basename = workspace
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| workspace_str.clone().into_owned());
        let display = active
            .to_string_lossy()
            .replacen(workspace_str.as_ref(), &basename, 1);
        Some(replace_backslashes(&display))
    }

    /// Reacts to a rename notification. Only an exact match against the
    /// tracked workspace or active folder swaps the pair.
    pub fn handle_rename(&mut self, old_path: &Path, new_path: &Path) -> bool {
        if self.workspace_folder.as_deref() == Some(old_path) {
            let active = self.active_folder.clone();
            self.update_folders(Some(new_path.to_path_buf()), active);
            true
        } else if self.active_folder.as_deref() == Some(old_path) {
            let workspace = self.workspace_folder.clone();
            self.update_folders(workspace, Some(new_path.to_path_buf()));
            true
        } else {
            false
        }
    }

    /// Reacts to a delete notification for an exactly matching path.
    pub fn handle_delete(&mut self, old_path: &Path) -> bool {
        if self.workspace_folder.as_deref() == Some(old_path) {
            self.update_folders(None, self.active_folder.clone());
            true
        } else if self.active_folder.as_deref() == Some(old_path) {
            self.update_folders(self.workspace_folder.clone(), None);
            true
        } else {
            false
        }
    }

    pub fn load(vscode_dir: &Path) -> Self {
        let path = vscode_dir.join(SESSION_FILENAME);
        fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, vscode_dir: &Path) -> Result<()> {
        if !vscode_dir.exists() {
            fs::create_dir_all(vscode_dir).context("Failed to create .vscode directory")?;
        }
        let path = vscode_dir.join(SESSION_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}

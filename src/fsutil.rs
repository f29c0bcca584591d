//! Filesystem predicates and JSON file helpers.
//!
//! Pure classification of filesystem entries (header vs. source file,
//! dominant language of a directory) plus the small JSON read/write
//! contract every generator uses: a read failure is `None`, never an
//! error, and writes are pretty-printed with 2-space indentation.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::session::Language;

pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

pub fn replace_backslashes(text: &str) -> String {
    text.replace('\\', "/")
}

pub fn filter_on_string(names: Vec<String>, filter_name: &str) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| !name.contains(filter_name))
        .collect()
}

pub fn is_header_file(ext: &str) -> bool {
    matches!(ext.to_lowercase().as_str(), "h" | "hh" | "hpp" | "hxx")
}

pub fn is_c_source_file(ext: &str) -> bool {
    ext.to_lowercase() == "c"
}

pub fn is_cpp_source_file(ext: &str) -> bool {
    matches!(ext.to_lowercase().as_str(), "cpp" | "cc" | "cxx")
}

pub fn is_source_file(ext: &str) -> bool {
    !is_header_file(ext) && (is_c_source_file(ext) || is_cpp_source_file(ext))
}

/// Any C++ source file in the folder makes the whole folder C++.
pub fn detect_language(folder: &Path) -> Language {
    let Ok(entries) = fs::read_dir(folder) else {
        return Language::C;
    };

    for entry in entries.flatten() {
        if !entry.path().is_file() {
            continue;
        }
        if let Some(ext) = entry.path().extension().and_then(|e| e.to_str())
            && is_cpp_source_file(ext)
        {
            return Language::Cpp;
        }
    }

    Language::C
}

/// All sub-folders of `root`, recursively, skipping `.vscode` and
/// `build` trees. Used by the folder picker.
pub fn folders_in_dir(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name != ".vscode" && name != "build" && !name.starts_with('.'))
                .unwrap_or(false)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect()
}

/// Reads and parses a JSON file. Any failure (missing file, bad UTF-8,
/// invalid JSON) yields `None`; callers treat that as "skip".
pub fn read_json_file(path: &Path) -> Option<Value> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Writes pretty-printed JSON (2-space indent), creating parent
/// directories as needed.
pub fn write_json_file(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

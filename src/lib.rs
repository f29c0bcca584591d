//! # ccrun - Zero-config C/C++ build, run and debug tasks
//!
//! ccrun detects C/C++ project folders, synthesizes build/run/clean/debug
//! tasks against a bundled Makefile, and keeps the editor config files in
//! `.vscode/` (`c_cpp_properties.json`, `launch.json`, `tasks.json`)
//! consistent with your toolchain, settings edits, folder renames and
//! deletions.
//!
//! ## Quick Start
//!
//! ```bash
//! # Generate the config files for the current workspace
//! ccrun init
//!
//! # Pick a sub-folder, then build and run it
//! ccrun folder
//! ccrun run
//! ```
//!
//! ## Module Organization
//!
//! - [`session`] - Workspace session: active folder, build mode, architecture
//! - [`settings`] - Toolchain settings store with environment probing
//! - [`materialize`] - Template-backed config file lifecycle
//! - [`properties`] - IntelliSense configuration generator
//! - [`launch`] - Debug launch configuration generator
//! - [`tasks`] - Task synthesis engine
//! - [`commands`] - CLI command handlers

/// CLI command handlers extracted from main.
pub mod commands;

/// Filesystem predicates and JSON helpers.
pub mod fsutil;

/// Debug launch configuration generator (`launch.json`).
pub mod launch;

/// Diagnostic logging gated on a setting.
pub mod logger;

/// Template-backed file materialization.
pub mod materialize;

/// IntelliSense configuration generator (`c_cpp_properties.json`).
pub mod properties;

/// Workspace session state.
pub mod session;

/// Toolchain settings store.
pub mod settings;

/// Task synthesis engine.
pub mod tasks;

/// Embedded template assets.
pub mod templates;

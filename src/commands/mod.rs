//! CLI command handlers.
//!
//! `App` bundles the workspace session, the settings store, and the
//! four generators; every handler goes through it so regeneration runs
//! against one consistent snapshot of state.

pub mod folder;
pub mod mode;
pub mod runner;
pub mod watch;

use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};

use crate::fsutil::folders_in_dir;
use crate::launch::LaunchGenerator;
use crate::logger;
use crate::materialize::{Generator, MakefileGenerator, vscode_dir};
use crate::properties::PropertiesGenerator;
use crate::session::Session;
use crate::settings::SettingsStore;
use crate::tasks::{TaskDescriptor, TasksGenerator, get_tasks};

pub struct App {
    pub workspace_folder: PathBuf,
    pub session: Session,
    pub store: SettingsStore,
    pub properties: PropertiesGenerator,
    pub launch: LaunchGenerator,
    pub tasks_file: TasksGenerator,
    pub makefile: MakefileGenerator,
}

impl App {
    pub fn open(workspace_folder: &Path) -> Result<Self> {
        anyhow::ensure!(
            workspace_folder.is_dir(),
            "{} is not a directory",
            workspace_folder.display()
        );
        let workspace_folder = workspace_folder
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", workspace_folder.display()))?;

        let store = SettingsStore::open(&workspace_folder);
        let mut session = Session::load(&vscode_dir(&workspace_folder));

        // Auto-select the root as active folder when it has no
        // sub-folders to pick from.
        if session.workspace_folder().is_none() {
            if folders_in_dir(&workspace_folder).is_empty() {
                session.update_folders(
                    Some(workspace_folder.clone()),
                    Some(workspace_folder.clone()),
                );
            } else {
                session.update_folders(Some(workspace_folder.clone()), None);
            }
        }

        Ok(Self {
            properties: PropertiesGenerator::new(&workspace_folder),
            launch: LaunchGenerator::new(&workspace_folder),
            tasks_file: TasksGenerator::new(&workspace_folder),
            makefile: MakefileGenerator::new(&workspace_folder),
            workspace_folder,
            session,
            store,
        })
    }

    pub fn vscode_dir(&self) -> PathBuf {
        vscode_dir(&self.workspace_folder)
    }

    pub fn makefile_path(&self) -> PathBuf {
        self.vscode_dir().join("Makefile")
    }

    pub fn tasks(&self) -> Vec<TaskDescriptor> {
        get_tasks(&self.session, &self.store, &self.makefile_path())
    }

    pub fn save_session(&self) -> Result<()> {
        self.session.save(&self.vscode_dir())
    }

    /// Materializes any missing output file without rewriting content.
    pub fn ensure_all(&self) -> Result<()> {
        self.makefile.ensure_exists()?;
        self.properties.ensure_exists()?;
        self.launch.ensure_exists()?;
        self.tasks_file.ensure_exists()
    }

    /// Probes the environment and rewrites every generated file from
    /// current state. Idempotent; safe to call from several event
    /// sources in quick succession.
    pub fn regenerate_all(&mut self) -> Result<()> {
        self.store.get_settings();
        self.makefile.regenerate(&self.store, &self.session)?;
        self.properties.regenerate(&self.store, &self.session)?;
        self.launch.regenerate(&self.store, &self.session)?;
        self.tasks_file.regenerate(&self.store, &self.session)
    }

    /// Delete-watch entry point for the whole output directory.
    pub fn on_output_deleted(&self) -> Result<()> {
        self.makefile.on_output_deleted()?;
        self.properties.on_output_deleted()?;
        self.launch.on_output_deleted()?;
        self.tasks_file.on_output_deleted()
    }
}

/// `ccrun init`: materialize the `.vscode` files and bring them in
/// sync with the detected toolchain.
pub fn init(workspace_folder: &Path) -> Result<()> {
    let mut app = App::open(workspace_folder)?;
    app.store.get_settings();

    // Skip the expensive rewrite when nothing drifted.
    if app.properties.update_check(&app.store) {
        app.properties.regenerate(&app.store, &app.session)?;
    }
    app.makefile.ensure_exists()?;
    app.launch.regenerate(&app.store, &app.session)?;
    app.tasks_file.regenerate(&app.store, &app.session)?;
    app.save_session()?;

    println!(
        "{} Configuration generated in {}",
        "✓".green(),
        app.vscode_dir().display()
    );
    for (found, name) in [
        (app.store.discovered.c_compiler, &app.store.values.c_compiler_path),
        (app.store.discovered.cpp_compiler, &app.store.values.cpp_compiler_path),
        (app.store.discovered.make, &app.store.values.make_path),
        (app.store.discovered.debugger, &app.store.values.debugger_path),
    ] {
        if !found {
            println!("  {} {} not found on PATH", "!".yellow(), name);
        }
    }
    Ok(())
}

/// `ccrun reset`: restore default settings and regenerate everything.
pub fn reset(workspace_folder: &Path) -> Result<()> {
    let mut app = App::open(workspace_folder)?;
    app.store.reset()?;
    app.regenerate_all()?;
    println!("{} Settings restored to defaults", "✓".green());
    Ok(())
}

/// `ccrun tasks`: list the synthesized tasks.
pub fn list_tasks(workspace_folder: &Path) -> Result<()> {
    let mut app = App::open(workspace_folder)?;
    app.store.get_settings();

    let tasks = app.tasks();
    if tasks.is_empty() {
        println!(
            "{} No tasks. Select a folder first: {}",
            "!".yellow(),
            "ccrun folder".cyan()
        );
        return Ok(());
    }

    let width = console::Term::stdout().size().1 as usize;
    for task in &tasks {
        let command = task.command_line.as_deref().unwrap_or("(debug session)");
        let command = console::truncate_str(command, width.saturating_sub(4), "…");
        println!("{}", task.label.bold());
        println!("  {}", command.dimmed());
    }

    logger::log(
        app.store.values.logging_active,
        &format!("Synthesized {} tasks", tasks.len()),
    );
    Ok(())
}

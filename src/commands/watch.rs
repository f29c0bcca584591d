//! Workspace watch loop.
//!
//! Wires filesystem notifications to the regeneration paths: deletes
//! under `.vscode` self-heal the generated files, settings edits
//! regenerate everything, hand edits of the IntelliSense file reverse
//! sync into the settings store, and folder renames/deletes swap the
//! session pair.

use anyhow::Result;
use colored::*;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use super::App;
use crate::session::SESSION_FILENAME;
use crate::settings::{SETTINGS_FILENAME, SettingsStore};
use crate::{launch, logger, properties, tasks};

/// Output paths the loop itself wrote moments ago. Notifications for
/// these are the echo of our own regeneration, not user edits; a real
/// edit arriving after the window still gets through.
struct RecentWrites {
    entries: Vec<(PathBuf, Instant)>,
}

impl RecentWrites {
    const WINDOW: Duration = Duration::from_millis(500);

    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn record_outputs(&mut self, vscode_dir: &Path) {
        let now = Instant::now();
        for name in [
            tasks::OUTPUT_FILENAME,
            properties::OUTPUT_FILENAME,
            launch::OUTPUT_FILENAME,
            SETTINGS_FILENAME,
            SESSION_FILENAME,
            "Makefile",
        ] {
            self.entries.push((vscode_dir.join(name), now));
        }
    }

    fn matches(&mut self, path: &Path) -> bool {
        self.entries.retain(|(_, at)| at.elapsed() < Self::WINDOW);
        self.entries.iter().any(|(recorded, _)| recorded == path)
    }
}

pub fn watch(workspace_folder: &Path) -> Result<()> {
    let mut app = App::open(workspace_folder)?;
    let mut recent = RecentWrites::new();
    app.regenerate_all()?;
    app.save_session()?;
    recent.record_outputs(&app.vscode_dir());

    println!(
        "{} Watching {} for changes...",
        "👀".cyan(),
        app.workspace_folder.display()
    );

    let (tx, rx) = channel();
    let config_notify = Config::default().with_poll_interval(Duration::from_secs(1));
    let mut watcher = RecommendedWatcher::new(tx, config_notify)?;
    watcher.watch(&app.workspace_folder, RecursiveMode::Recursive)?;

    while let Ok(result) = rx.recv() {
        // A single change fans out into a burst of notifications; wait
        // briefly and handle the whole batch at once.
        std::thread::sleep(Duration::from_millis(100));
        let mut events = Vec::new();
        if let Ok(event) = result {
            events.push(event);
        }
        while let Ok(more) = rx.try_recv() {
            if let Ok(event) = more {
                events.push(event);
            }
        }

        for event in &events {
            match handle_event(&mut app, &mut recent, event) {
                Ok(true) => recent.record_outputs(&app.vscode_dir()),
                Ok(false) => {}
                Err(error) => println!("{} {}", "x".red(), error),
            }
        }
    }

    Ok(())
}

/// Returns whether the event caused generated files to be rewritten.
fn handle_event(app: &mut App, recent: &mut RecentWrites, event: &Event) -> Result<bool> {
    // Build output churn and our own rewrites are not ours to react to.
    let paths: Vec<_> = event
        .paths
        .iter()
        .filter(|path| !path.components().any(|c| c.as_os_str() == "build"))
        .filter(|path| !recent.matches(path))
        .cloned()
        .collect();
    if paths.is_empty() {
        return Ok(false);
    }

    match &event.kind {
        EventKind::Remove(_) => {
            let mut wrote = false;
            for path in &paths {
                wrote |= handle_delete(app, path)?;
            }
            Ok(wrote)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
            handle_rename(app, &paths[0], &paths[1])
        }
        EventKind::Modify(_) | EventKind::Create(_) => {
            let mut wrote = false;
            for path in &paths {
                wrote |= handle_change(app, path)?;
            }
            Ok(wrote)
        }
        _ => Ok(false),
    }
}

fn handle_delete(app: &mut App, path: &Path) -> Result<bool> {
    let logging = app.store.values.logging_active;

    if path.starts_with(app.vscode_dir()) || *path == app.vscode_dir() {
        logger::log(logging, &format!("Deleted: {}", path.display()));
        app.on_output_deleted()?;
        app.regenerate_all()?;
        return Ok(true);
    }

    if app.session.handle_delete(path) {
        logger::log(logging, &format!("Tracked folder deleted: {}", path.display()));
        app.save_session()?;
        app.regenerate_all()?;
        return Ok(true);
    }
    Ok(false)
}

fn handle_rename(app: &mut App, old_path: &Path, new_path: &Path) -> Result<bool> {
    if app.session.handle_rename(old_path, new_path) {
        logger::log(
            app.store.values.logging_active,
            &format!("Renaming: {} -> {}", old_path.display(), new_path.display()),
        );
        app.save_session()?;
        app.regenerate_all()?;
        return Ok(true);
    }
    Ok(false)
}

fn handle_change(app: &mut App, path: &Path) -> Result<bool> {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(false);
    };
    if !path.starts_with(app.vscode_dir()) {
        return Ok(false);
    }

    match file_name {
        SETTINGS_FILENAME => {
            logger::log(app.store.values.logging_active, "Settings changed");
            app.store = SettingsStore::open(&app.workspace_folder);
            app.regenerate_all()?;
            Ok(true)
        }
        properties::OUTPUT_FILENAME => {
            logger::log(app.store.values.logging_active, "Reverse sync");
            app.properties.change_callback(&mut app.store)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_writes_suppress_only_recorded_paths() {
        let mut recent = RecentWrites::new();
        let vscode = Path::new("/ws/.vscode");
        recent.record_outputs(vscode);

        assert!(recent.matches(&vscode.join("c_cpp_properties.json")));
        assert!(recent.matches(&vscode.join("tasks.json")));
        assert!(!recent.matches(Path::new("/ws/app/main.c")));
    }

    #[test]
    fn recent_writes_expire_after_the_window() {
        let mut recent = RecentWrites::new();
        let vscode = Path::new("/ws/.vscode");
        recent.record_outputs(vscode);

        std::thread::sleep(RecentWrites::WINDOW + Duration::from_millis(50));
        assert!(!recent.matches(&vscode.join("settings.json")));
    }
}

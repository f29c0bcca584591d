//! Active folder selection.

use anyhow::{Context, Result};
use colored::*;
use inquire::Select;
use std::path::{Path, PathBuf};

use super::App;
use crate::fsutil::{folders_in_dir, replace_backslashes};
use crate::logger;

/// Selects the folder build/run/debug actions apply to, either from an
/// explicit path or interactively over the workspace's sub-folders.
/// The session pair is swapped wholesale and all files regenerate.
pub fn select(workspace_folder: &Path, path: Option<PathBuf>) -> Result<()> {
    let mut app = App::open(workspace_folder)?;

    let active_folder = match path {
        Some(path) => {
            let resolved = path
                .canonicalize()
                .with_context(|| format!("Folder {} does not exist", path.display()))?;
            anyhow::ensure!(resolved.is_dir(), "{} is not a directory", resolved.display());
            resolved
        }
        None => pick_folder(&app)?,
    };

    app.session
        .update_folders(Some(app.workspace_folder.clone()), Some(active_folder));
    app.regenerate_all()?;
    app.save_session()?;

    println!(
        "{} Active folder: {}",
        "✓".green(),
        app.session.display_folder().unwrap_or_default().bold()
    );
    Ok(())
}

fn pick_folder(app: &App) -> Result<PathBuf> {
    let mut folders = folders_in_dir(&app.workspace_folder);
    folders.insert(0, app.workspace_folder.clone());

    let options: Vec<String> = folders
        .iter()
        .map(|folder| replace_backslashes(&folder.to_string_lossy()))
        .collect();

    logger::log(
        app.store.values.logging_active,
        &format!("{} candidate folders", options.len()),
    );

    let picked = Select::new("Select the active folder:", options.clone())
        .prompt()
        .context("Folder selection aborted")?;
    let index = options.iter().position(|o| *o == picked).unwrap_or(0);
    Ok(folders[index].clone())
}

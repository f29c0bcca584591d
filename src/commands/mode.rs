//! Build mode and architecture selection.

use anyhow::{Context, Result};
use colored::*;
use inquire::Select;
use std::path::Path;

use super::App;
use crate::materialize::Generator;
use crate::session::{Architecture, BuildMode};

/// Updates the build mode. The architecture is part of every mode
/// update; when omitted it defaults to the session's current value so
/// the pair stays explicit inside the session.
pub fn select(
    workspace_folder: &Path,
    mode: Option<BuildMode>,
    architecture: Option<Architecture>,
) -> Result<()> {
    let mut app = App::open(workspace_folder)?;

    let (mode, architecture) = match mode {
        Some(mode) => (mode, architecture.unwrap_or(app.session.architecture)),
        None => pick_mode(app.session.build_mode, app.session.architecture)?,
    };

    app.session.update_mode(mode, architecture);
    app.store.get_settings();
    app.launch.regenerate(&app.store, &app.session)?;
    app.tasks_file.regenerate(&app.store, &app.session)?;
    app.save_session()?;

    println!(
        "{} Mode: {} - {}",
        "✓".green(),
        mode.to_string().bold(),
        architecture.to_string().bold()
    );
    Ok(())
}

fn pick_mode(
    current_mode: BuildMode,
    current_arch: Architecture,
) -> Result<(BuildMode, Architecture)> {
    let combinations = [
        (BuildMode::Debug, Architecture::X64),
        (BuildMode::Debug, Architecture::X86),
        (BuildMode::Release, Architecture::X64),
        (BuildMode::Release, Architecture::X86),
    ];
    let options: Vec<String> = combinations
        .iter()
        .map(|(mode, arch)| {
            let marker = if *mode == current_mode && *arch == current_arch {
                " (current)"
            } else {
                ""
            };
            format!("{mode} - {arch}{marker}")
        })
        .collect();

    let picked = Select::new("Select build mode:", options.clone())
        .prompt()
        .context("Mode selection aborted")?;
    let index = options.iter().position(|o| *o == picked).unwrap_or(0);
    Ok(combinations[index])
}

//! Execution of the synthesized tasks.
//!
//! Build, run and clean pull their command lines from the task engine
//! by positional index (Build, Run, Clean is a fixed ordering). Debug
//! goes through the launch configuration instead of a command line.

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::App;
use crate::fsutil::replace_backslashes;
use crate::launch;
use crate::logger;
use crate::materialize::Generator;
use crate::tasks::substitute_file_dir;

const BUILD_TASK_INDEX: usize = 0;
const RUN_TASK_INDEX: usize = 1;
const CLEAN_TASK_INDEX: usize = 2;

pub fn build(workspace_folder: &Path) -> Result<()> {
    let mut app = App::open(workspace_folder)?;
    app.store.get_settings();
    app.ensure_all()?;

    let Some((command_line, project_folder)) = task_command(&app, BUILD_TASK_INDEX) else {
        return no_folder_hint(&app);
    };

    let mode_dir = mode_dir(&app, &project_folder);
    if !mode_dir.exists() {
        fs::create_dir_all(&mode_dir)
            .with_context(|| format!("Failed to create {}", mode_dir.display()))?;
    }

    println!("{} {}", "⚙".cyan(), app.tasks()[BUILD_TASK_INDEX].label);
    execute(&app, &command_line, &project_folder)
}

pub fn run(workspace_folder: &Path, arguments: &[String]) -> Result<()> {
    let mut app = App::open(workspace_folder)?;
    app.store.get_settings();

    let Some((command_line, project_folder)) = task_command(&app, RUN_TASK_INDEX) else {
        return no_folder_hint(&app);
    };

    if !mode_dir(&app, &project_folder).exists() {
        println!(
            "{} Nothing built yet. Run {} first.",
            "!".yellow(),
            "ccrun build".cyan()
        );
        return Ok(());
    }

    let mut command_line = command_line;
    if !arguments.is_empty() {
        command_line = format!("{} ARGS=\"{}\"", command_line, arguments.join(" "));
    }

    println!("{} {}", "▶".green(), app.tasks()[RUN_TASK_INDEX].label);
    execute(&app, &command_line, &project_folder)
}

pub fn clean(workspace_folder: &Path) -> Result<()> {
    let mut app = App::open(workspace_folder)?;
    app.store.get_settings();

    let Some((_, project_folder)) = task_command(&app, CLEAN_TASK_INDEX) else {
        return no_folder_hint(&app);
    };

    let mode_dir = mode_dir(&app, &project_folder);
    if !mode_dir.exists() {
        logger::log(
            app.store.values.logging_active,
            "Nothing to clean, skipping",
        );
        return Ok(());
    }

    let relative = mode_dir
        .to_string_lossy()
        .replacen(&*app.workspace_folder.to_string_lossy(), "", 1);
    println!("{} Cleaning {}...", "🗑".cyan(), replace_backslashes(&relative));
    fs::remove_dir_all(&mode_dir)
        .with_context(|| format!("Failed to remove {}", mode_dir.display()))?;
    Ok(())
}

/// Resolves the debug entry from `launch.json` (regenerating it when
/// missing) and starts the debugger against its program.
pub fn debug(workspace_folder: &Path) -> Result<()> {
    let mut app = App::open(workspace_folder)?;
    app.store.get_settings();

    if app.session.active_folder().is_none() {
        return no_folder_hint(&app);
    }

    if launch::launch_configuration(&app.workspace_folder).is_none() {
        app.launch.regenerate(&app.store, &app.session)?;
    }
    let entry = launch::launch_configuration(&app.workspace_folder)
        .context("No debug entry in launch.json")?;

    let program = entry["program"].as_str().unwrap_or_default().to_string();
    if program.is_empty() || !Path::new(&program).exists() {
        println!(
            "{} No executable at {}. Run {} first.",
            "!".yellow(),
            program,
            "ccrun build".cyan()
        );
        return Ok(());
    }

    let debugger = entry["miDebuggerPath"]
        .as_str()
        .unwrap_or(&app.store.values.debugger_path)
        .to_string();
    let cwd = entry["cwd"].as_str().unwrap_or_default().to_string();

    println!("{} {} {}", "🐞".cyan(), debugger, program);
    let status = Command::new(&debugger)
        .arg(&program)
        .current_dir(&cwd)
        .status()
        .with_context(|| format!("Failed to start {debugger}"))?;
    anyhow::ensure!(status.success(), "Debug session exited with {status}");
    Ok(())
}

fn task_command(app: &App, index: usize) -> Option<(String, PathBuf)> {
    let tasks = app.tasks();
    let task = tasks.get(index)?;
    let command_line = task.command_line.clone()?;
    let project_folder = app.session.project_folder()?.to_path_buf();
    Some((
        substitute_file_dir(&command_line, &project_folder),
        project_folder,
    ))
}

fn mode_dir(app: &App, project_folder: &Path) -> PathBuf {
    project_folder
        .join("build")
        .join(app.session.build_mode.to_string())
}

fn no_folder_hint(app: &App) -> Result<()> {
    logger::log(app.store.values.logging_active, "No active folder selected");
    println!(
        "{} No folder selected. Run {} first.",
        "!".yellow(),
        "ccrun folder".cyan()
    );
    Ok(())
}

/// Runs a synthesized command line. The default path hands the string
/// to the shell; the experimental setting spawns the binary directly
/// with quote-aware argument splitting (needed for folders with spaces
/// or non-ASCII characters).
fn execute(app: &App, command_line: &str, cwd: &Path) -> Result<()> {
    logger::log(app.store.values.logging_active, command_line);

    let status = if app.store.values.experimental_execution {
        let words = split_command_line(command_line);
        let (program, args) = words.split_first().context("Empty command line")?;
        Command::new(program).args(args).current_dir(cwd).status()
    } else if cfg!(windows) {
        Command::new("cmd")
            .args(["/C", command_line])
            .current_dir(cwd)
            .status()
    } else {
        Command::new("sh")
            .args(["-c", command_line])
            .current_dir(cwd)
            .status()
    }
    .context("Failed to start the script runner")?;

    if status.success() {
        println!("{} Done", "✓".green());
        Ok(())
    } else {
        anyhow::bail!("Task failed with {status}")
    }
}

/// Splits a command line into words, honoring double quotes.
fn split_command_line(command_line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in command_line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

//! # ccrun CLI Entry Point
//!
//! Parses CLI arguments using clap and routes commands to the handlers.
//!
//! ## Command Structure
//!
//! - **Setup**: `init`, `folder`, `mode`, `reset`
//! - **Actions**: `build`, `run`, `clean`, `debug`, `tasks`
//! - **Daemon**: `watch`
//! - **Shell**: `completions`

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;

use ccrun::commands;
use ccrun::session::{Architecture, BuildMode};

#[derive(Parser)]
#[command(name = "ccrun")]
#[command(about = "Zero-config build, run and debug tasks for C/C++ projects", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the .vscode configuration files for this workspace
    Init,
    /// Select the active folder build/run/debug actions apply to
    Folder {
        /// Folder path (interactive picker when omitted)
        path: Option<PathBuf>,
    },
    /// Set the build mode and target architecture
    Mode {
        /// Build mode (interactive picker when omitted)
        #[arg(value_enum)]
        mode: Option<BuildMode>,
        /// Target architecture
        #[arg(long, value_enum)]
        arch: Option<Architecture>,
    },
    /// List the synthesized tasks
    Tasks,
    /// Compile the active folder
    Build,
    /// Run the built executable
    Run {
        /// Arguments forwarded to the executable
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Remove the build output of the current mode
    Clean,
    /// Start a debug session from launch.json
    Debug,
    /// Restore all settings to their defaults
    Reset,
    /// Watch the workspace and keep the config files in sync
    Watch,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(error) = dispatch(cli) {
        eprintln!("{} {}", "error:".red().bold(), error);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let workspace = &cli.workspace;

    match cli.command {
        Commands::Init => commands::init(workspace),
        Commands::Folder { path } => commands::folder::select(workspace, path),
        Commands::Mode { mode, arch } => commands::mode::select(workspace, mode, arch),
        Commands::Tasks => commands::list_tasks(workspace),
        Commands::Build => commands::runner::build(workspace),
        Commands::Run { args } => commands::runner::run(workspace, &args),
        Commands::Clean => commands::runner::clean(workspace),
        Commands::Debug => commands::runner::debug(workspace),
        Commands::Reset => commands::reset(workspace),
        Commands::Watch => commands::watch::watch(workspace),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            generate(shell, &mut command, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

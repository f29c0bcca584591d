//! Integration tests for the configuration synthesis pipeline.
//!
//! These tests drive the generators the way the CLI does, against a
//! temporary workspace, and verify the generated `.vscode` files stay
//! consistent with session and settings state.

use std::fs;
use std::path::{Path, PathBuf};

use ccrun::fsutil::read_json_file;
use ccrun::launch::{self, LaunchGenerator};
use ccrun::materialize::{Generator, MakefileGenerator};
use ccrun::properties::PropertiesGenerator;
use ccrun::session::{Architecture, BuildMode, OperatingSystem, Session};
use ccrun::settings::SettingsStore;
use ccrun::tasks::{TasksGenerator, get_tasks};

struct Fixture {
    _dir: tempfile::TempDir,
    workspace: PathBuf,
    session: Session,
    store: SettingsStore,
}

/// Workspace with one sub-folder holding the given source files.
fn fixture(files: &[&str]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().to_path_buf();
    let active = workspace.join("app");
    fs::create_dir_all(&active).unwrap();
    for file in files {
        fs::write(active.join(file), "int main() { return 0; }\n").unwrap();
    }

    let mut session = Session::default();
    session.update_folders(Some(workspace.clone()), Some(active));

    let mut store = SettingsStore::open(&workspace);
    store.discovered.c_compiler = true;
    store.operating_system = OperatingSystem::Linux;
    store.architecture = Some(Architecture::X64);

    Fixture {
        _dir: dir,
        workspace,
        session,
        store,
    }
}

fn regenerate_all(fx: &Fixture) {
    MakefileGenerator::new(&fx.workspace)
        .regenerate(&fx.store, &fx.session)
        .unwrap();
    PropertiesGenerator::new(&fx.workspace)
        .regenerate(&fx.store, &fx.session)
        .unwrap();
    LaunchGenerator::new(&fx.workspace)
        .regenerate(&fx.store, &fx.session)
        .unwrap();
    TasksGenerator::new(&fx.workspace)
        .regenerate(&fx.store, &fx.session)
        .unwrap();
}

fn generated_files(workspace: &Path) -> [PathBuf; 4] {
    let vscode = workspace.join(".vscode");
    [
        vscode.join("c_cpp_properties.json"),
        vscode.join("launch.json"),
        vscode.join("tasks.json"),
        vscode.join("Makefile"),
    ]
}

#[test]
fn full_pipeline_produces_consistent_files() {
    let mut fx = fixture(&["main.cpp"]);
    fx.store.values.cpp_standard = "c++17".to_string();
    fx.session.update_mode(BuildMode::Release, Architecture::X64);
    regenerate_all(&fx);

    for file in generated_files(&fx.workspace) {
        assert!(file.exists(), "{} missing", file.display());
    }

    // IntelliSense file keyed by the triplet.
    let properties = read_json_file(&fx.workspace.join(".vscode/c_cpp_properties.json")).unwrap();
    assert_eq!(properties["configurations"][0]["name"], "linux-gcc-x64");
    assert_eq!(properties["configurations"][0]["cppStandard"], "c++17");

    // Launch entry points at the release binary of the active folder.
    let entry = launch::launch_configuration(&fx.workspace).unwrap();
    let program = entry["program"].as_str().unwrap();
    assert!(program.ends_with("app/build/Release/outRelease"));

    // Tasks carry the same mode and standard.
    let makefile = fx.workspace.join(".vscode/Makefile");
    let tasks = get_tasks(&fx.session, &fx.store, &makefile);
    let build = tasks[0].command_line.as_ref().unwrap();
    assert!(build.contains("COMPILATION_MODE=Release"));
    assert!(build.contains("CPP_STANDARD=c++17"));
    assert!(build.contains(&format!("--file={}", makefile.display())));
}

#[test]
fn deleting_the_output_directory_self_heals() {
    let mut fx = fixture(&["main.c"]);
    fx.store.values.include_paths = vec!["vendor/include".to_string()];
    regenerate_all(&fx);

    fs::remove_dir_all(fx.workspace.join(".vscode")).unwrap();

    // The delete watch fires per generator; settings still apply after
    // re-materialization.
    MakefileGenerator::new(&fx.workspace).on_output_deleted().unwrap();
    PropertiesGenerator::new(&fx.workspace).on_output_deleted().unwrap();
    LaunchGenerator::new(&fx.workspace).on_output_deleted().unwrap();
    TasksGenerator::new(&fx.workspace).on_output_deleted().unwrap();
    regenerate_all(&fx);

    for file in generated_files(&fx.workspace) {
        assert!(file.exists(), "{} missing after self-heal", file.display());
    }
    let properties = read_json_file(&fx.workspace.join(".vscode/c_cpp_properties.json")).unwrap();
    assert_eq!(
        properties["configurations"][0]["includePath"][1],
        "vendor/include"
    );
}

#[test]
fn regeneration_is_idempotent_across_all_files() {
    let fx = fixture(&["main.c"]);
    regenerate_all(&fx);
    let first: Vec<Vec<u8>> = generated_files(&fx.workspace)
        .iter()
        .map(|f| fs::read(f).unwrap())
        .collect();

    regenerate_all(&fx);
    let second: Vec<Vec<u8>> = generated_files(&fx.workspace)
        .iter()
        .map(|f| fs::read(f).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn folder_rename_moves_the_whole_pipeline() {
    let mut fx = fixture(&["main.c"]);
    regenerate_all(&fx);

    let old_active = fx.workspace.join("app");
    let new_active = fx.workspace.join("renamed");
    fs::rename(&old_active, &new_active).unwrap();

    assert!(fx.session.handle_rename(&old_active, &new_active));
    regenerate_all(&fx);

    let entry = launch::launch_configuration(&fx.workspace).unwrap();
    assert!(entry["program"].as_str().unwrap().contains("renamed"));

    let makefile = fx.workspace.join(".vscode/Makefile");
    let tasks = get_tasks(&fx.session, &fx.store, &makefile);
    assert!(tasks[0].label.ends_with("/renamed"));
}

#[test]
fn deleting_the_active_folder_empties_the_task_list() {
    let mut fx = fixture(&["main.c"]);
    let active = fx.workspace.join("app");

    assert!(fx.session.handle_delete(&active));
    let makefile = fx.workspace.join(".vscode/Makefile");
    assert!(get_tasks(&fx.session, &fx.store, &makefile).is_empty());
}

#[test]
fn reverse_sync_round_trips_through_the_generated_file() {
    let mut fx = fixture(&["main.c"]);
    regenerate_all(&fx);

    let properties_path = fx.workspace.join(".vscode/c_cpp_properties.json");
    let mut doc = read_json_file(&properties_path).unwrap();
    doc["configurations"][0]["compilerPath"] = serde_json::json!("/usr/local/bin/clang++");
    doc["configurations"][0]["cppStandard"] = serde_json::json!("c++20");
    ccrun::fsutil::write_json_file(&properties_path, &doc).unwrap();

    PropertiesGenerator::new(&fx.workspace)
        .change_callback(&mut fx.store)
        .unwrap();

    assert_eq!(fx.store.values.cpp_compiler_path, "/usr/local/bin/clang++");
    assert_eq!(fx.store.values.c_compiler_path, "/usr/local/bin/clang");
    assert_eq!(fx.store.values.cpp_standard, "c++20");

    // The sync persisted into the settings file.
    let reopened = SettingsStore::open(&fx.workspace);
    assert_eq!(reopened.values.cpp_standard, "c++20");
}

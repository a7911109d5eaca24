//! End-to-end scenarios for a multi-module build on disk
//!
//! A build directory with a settings file and one child module is laid out
//! in a temp dir; the build tool itself is faked. Each scenario goes
//! config file -> project -> one fetch -> installed models.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use model_extensions::{ProjectExtension, ToolingType};
use model_fs::ModulePath;
use model_loader::IssueKind;
use model_project::{LoadState, LoadedModelHub, LoaderConfig, Project};
use model_test_utils::{FakeConnection, FnExtension, TestBuild};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
struct SourceSets(Vec<String>);

struct Workspace {
    _temp: TempDir,
    root: ModulePath,
    config: LoaderConfig,
}

/// A build at `<temp>/app` with `settings.gradle.kts` and a `core` module,
/// plus a loader config file next to it.
fn setup_workspace() -> Workspace {
    let _ = model_project::logging::init_with_default("warn");

    let temp = TempDir::new().unwrap();
    let app = temp.path().join("app");
    fs::create_dir_all(app.join("core")).unwrap();
    fs::write(app.join("settings.gradle.kts"), "include(\"core\")\n").unwrap();

    let config_path = temp.path().join("loader.toml");
    fs::write(
        &config_path,
        r#"
[target]
tool_version = "8.5.0"
runtime_version = "17"

[loader]
serial_thread_name = "scenario-loader"
settings_files = ["settings.gradle.kts"]
"#,
    )
    .unwrap();

    Workspace {
        root: ModulePath::canonicalize(&app).unwrap(),
        config: LoaderConfig::load(&config_path).unwrap(),
        _temp: temp,
    }
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

fn test_build(root: &ModulePath) -> TestBuild {
    TestBuild::new(root.as_str())
        .module("core")
        .tooling("app", SourceSets(vec!["main".into()]))
        .tooling("core", SourceSets(vec!["main".into(), "test".into()]))
}

fn extensions() -> Vec<Arc<dyn ProjectExtension>> {
    let java: Arc<dyn ProjectExtension> = Arc::new(FnExtension::requiring::<SourceSets>("java"));
    let meta: Arc<dyn ProjectExtension> = Arc::new(FnExtension::constant("meta"));
    vec![java, meta]
}

fn open_project(
    workspace: &Workspace,
    dir: ModulePath,
    runtime: &Runtime,
    connection: &Arc<FakeConnection>,
    hub: &Arc<LoadedModelHub>,
) -> Project {
    Project::builder(dir)
        .config(workspace.config.clone())
        .runtime(runtime.handle().clone())
        .connection(connection.clone())
        .hub(Arc::clone(hub))
        .build(|_| extensions())
        .unwrap()
}

#[test]
fn test_root_project_loads_in_one_round_trip() {
    let workspace = setup_workspace();
    let runtime = runtime();
    let connection = Arc::new(FakeConnection::new(test_build(&workspace.root).build()));
    let hub = Arc::new(LoadedModelHub::new());

    let project = Project::for_directory(workspace.root.to_native())
        .unwrap()
        .config(workspace.config.clone())
        .runtime(runtime.handle().clone())
        .connection(connection.clone())
        .hub(Arc::clone(&hub))
        .build(|_| extensions())
        .unwrap();
    project.opened();
    assert!(project.await_first_load(Some(WAIT)).unwrap());

    let settings = workspace.root.join("settings.gradle.kts");
    let model = project.current_model();
    assert_eq!(model.project_dir(), &workspace.root);
    assert_eq!(model.settings_file(), Some(&settings));
    assert_eq!(model.model_as::<SourceSets>("java"), Some(&SourceSets(vec!["main".into()])));
    assert_eq!(model.model_as::<String>("meta").map(String::as_str), Some("meta"));
    assert_eq!(model.main_module().children.len(), 1);
    assert_eq!(project.load_state(), LoadState::Installed);

    let requests = connection.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].project_dir, workspace.root);
    assert_eq!(requests[0].settings_file, Some(settings));
    assert_eq!(requests[0].tooling_types, vec![ToolingType::of::<SourceSets>()]);
}

#[test]
fn test_sibling_module_is_served_from_the_root_load() {
    let workspace = setup_workspace();
    let runtime = runtime();
    let hub = Arc::new(LoadedModelHub::new());
    let core_dir = workspace.root.join("core");

    let core_connection = Arc::new(FakeConnection::new(test_build(&workspace.root).build()).gated());
    let core = open_project(&workspace, core_dir.clone(), &runtime, &core_connection, &hub);
    core.opened();
    assert!(core_connection.wait_for_calls(1, WAIT));

    let root_connection = Arc::new(FakeConnection::new(test_build(&workspace.root).build()));
    let root = open_project(&workspace, workspace.root.clone(), &runtime, &root_connection, &hub);
    root.opened();

    assert!(core.await_first_load(Some(WAIT)).unwrap());
    let model = core.current_model();
    assert_eq!(model.project_dir(), &core_dir);
    assert_eq!(model.root_module().project_dir(), &workspace.root);
    assert_eq!(
        model.model_as::<SourceSets>("java"),
        Some(&SourceSets(vec!["main".into(), "test".into()]))
    );
    assert_eq!(model.settings_file(), Some(&workspace.root.join("settings.gradle.kts")));
    assert_eq!(core_connection.completed(), 0);
    assert_eq!(root_connection.calls(), 1);

    core.closed();
    root.closed();
    core_connection.open_gate();
}

#[test]
fn test_broken_extensions_leave_the_rest_of_the_model_intact() {
    let workspace = setup_workspace();
    let runtime = runtime();
    let connection = Arc::new(FakeConnection::new(test_build(&workspace.root).build()));

    let project = Project::builder(workspace.root.clone())
        .config(workspace.config.clone())
        .runtime(runtime.handle().clone())
        .connection(connection.clone())
        .build(|_| {
            let mut all = extensions();
            all.push(Arc::new(FnExtension::failing("lint")));
            all.push(Arc::new(FnExtension::panicking("docs")));
            all
        })
        .unwrap();

    assert!(project.await_first_load(Some(WAIT)).unwrap());
    assert!(project.load_error().is_none());

    let model = project.current_model();
    assert!(model.model_of("java").is_some());
    assert!(model.model_of("meta").is_some());
    assert!(model.model_of("lint").is_none());
    assert!(model.model_of("docs").is_none());

    let issues = project.load_issues();
    assert_eq!(issues.len(), 4);
    assert!(issues.iter().all(|issue| issue.kind == IssueKind::ExtensionParse));
}

#[test]
fn test_project_recovers_after_build_tool_failure() {
    let workspace = setup_workspace();
    let runtime = runtime();
    let connection = Arc::new(
        FakeConnection::new(test_build(&workspace.root).build()).then_fail("build tool daemon disappeared"),
    );
    let hub = Arc::new(LoadedModelHub::new());
    let project = open_project(&workspace, workspace.root.clone(), &runtime, &connection, &hub);

    assert!(project.await_first_load(Some(WAIT)).unwrap());
    assert!(project.load_error().unwrap().message.contains("daemon disappeared"));
    assert!(project.current_model().model_of("java").is_none());
    assert_eq!(project.load_state(), LoadState::FailedRetained);

    let (tx, rx) = std::sync::mpsc::channel();
    let _ = project.on_model_changed(move || {
        let _ = tx.send(());
    });
    project.reload();

    rx.recv_timeout(WAIT).unwrap();
    assert!(project.load_error().is_none());
    assert!(project.current_model().model_of("java").is_some());
    assert_eq!(connection.calls(), 2);
}

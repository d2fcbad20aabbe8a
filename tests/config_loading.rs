// tests/config_loading.rs
mod common;
use crate::common::{init_tracing, TestResult};

use std::io::Write;
use std::path::PathBuf;

use tempfile::{Builder, NamedTempFile};

use dagrun::config::{load_and_validate, load_from_path, parse_str, ConfigFile, ConfigFormat};
use dagrun::dag::TaskGraph;
use dagrun::errors::DagError;
use dagrun::report::NullReporter;
use dagrun_test_utils::ConfigFileBuilder;

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[test]
fn demo_toml_pipeline_loads() -> TestResult {
    init_tracing();
    let cfg = load_and_validate(demo("pipeline.toml"))?;

    assert_eq!(cfg.config.jobs, Some(2));
    assert_eq!(cfg.task.len(), 5);

    let package = cfg.task.iter().find(|t| t.id == "package").unwrap();
    assert_eq!(package.command, "echo packaging");
    assert_eq!(package.depends_on, vec!["lint", "test"]);
    Ok(())
}

#[test]
fn demo_yaml_pipeline_matches_toml() -> TestResult {
    let from_toml = load_and_validate(demo("pipeline.toml"))?;
    let from_yaml = load_and_validate(demo("pipeline.yaml"))?;

    assert_eq!(from_yaml.config.jobs, from_toml.config.jobs);
    assert_eq!(from_yaml.tasks(), from_toml.tasks());
    Ok(())
}

#[test]
fn demo_cycle_loads_but_fails_graph_validation() -> TestResult {
    // Cycles are a graph concern, not a config concern.
    let cfg = load_and_validate(demo("cycle.toml"))?;
    let graph = TaskGraph::from_tasks(cfg.tasks(), NullReporter::shared());

    assert!(matches!(graph.validate(), Err(DagError::CycleDetected(_))));
    Ok(())
}

#[test]
fn format_is_chosen_by_extension() {
    assert_eq!(ConfigFormat::from_path("a.yaml".as_ref()), ConfigFormat::Yaml);
    assert_eq!(ConfigFormat::from_path("a.YML".as_ref()), ConfigFormat::Yaml);
    assert_eq!(ConfigFormat::from_path("a.toml".as_ref()), ConfigFormat::Toml);
    assert_eq!(ConfigFormat::from_path("tasks".as_ref()), ConfigFormat::Toml);
}

#[test]
fn depends_on_defaults_to_empty() -> TestResult {
    let raw = parse_str(
        r#"
[[task]]
id = "solo"
command = "true"
"#,
        ConfigFormat::Toml,
    )?;

    let tasks = raw.task.unwrap();
    assert!(tasks[0].depends_on.is_empty());
    assert_eq!(raw.config.jobs, None);
    Ok(())
}

#[test]
fn declaration_order_is_preserved() -> TestResult {
    let raw = parse_str(
        r#"
tasks:
  - { id: z, command: "true" }
  - { id: a, command: "true" }
  - { id: m, command: "true" }
"#,
        ConfigFormat::Yaml,
    )?;

    let tasks = raw.task.unwrap();
    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["z", "a", "m"]);
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let result = load_from_path("/definitely/not/here/tasks.toml");

    match result {
        Err(e @ DagError::IoError(_)) => assert!(e.is_config()),
        other => panic!("expected IoError, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_toml_error() {
    let file = toml_file("[[task]\nid = ");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagError::TomlError(_))
    ));
}

#[test]
fn malformed_yaml_is_yaml_error() {
    let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(file, "tasks:\n  - id: [unclosed\n").unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagError::YamlError(_))
    ));
}

#[test]
fn task_without_command_is_rejected_by_the_parser() {
    let file = toml_file(
        r#"
[[task]]
id = "build"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagError::TomlError(_))
    ));
}

#[test]
fn empty_id_is_config_error() {
    let file = toml_file(
        r#"
[[task]]
id = "ok"
command = "true"

[[task]]
id = "  "
command = "true"
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagError::ConfigError(msg)) => assert!(msg.contains("task #2"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn empty_command_is_config_error() {
    let file = toml_file(
        r#"
[[task]]
id = "build"
command = ""
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagError::ConfigError(msg)) => assert!(msg.contains("'build'"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_jobs_is_config_error() {
    let raw = ConfigFileBuilder::new()
        .with_task("a", "true", &[])
        .with_jobs(0)
        .raw();

    match ConfigFile::try_from(raw) {
        Err(DagError::ConfigError(msg)) => assert!(msg.contains("jobs")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_dependency_is_not_a_config_error() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_task("a", "true", &["ghost"])
        .build();

    let graph = TaskGraph::from_tasks(cfg.tasks(), NullReporter::shared());
    let err = graph.validate().unwrap_err();
    assert!(err.is_validation());
    assert!(!err.is_config());
    Ok(())
}

#[test]
fn duplicate_ids_keep_the_last_definition() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", "make old", &[])
        .with_task("build", "make new", &[])
        .build();

    let graph = TaskGraph::from_tasks(cfg.tasks(), NullReporter::shared());
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.get_task("build")?.command, "make new");
    Ok(())
}

#[test]
fn empty_file_is_rejected() {
    let file = toml_file("");

    match load_and_validate(file.path()) {
        Err(e @ DagError::ConfigError(_)) => {
            assert!(e.is_config());
            assert!(e.to_string().contains("task list is missing"), "{e}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn misspelled_yaml_task_key_is_rejected() {
    let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(file, "taks:\n  - id: build\n    command: make\n").unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagError::ConfigError(_))
    ));
}

#[test]
fn config_section_alone_is_rejected() {
    let file = toml_file("[config]\njobs = 2\n");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagError::ConfigError(_))
    ));
}

#[test]
fn explicitly_empty_task_list_is_accepted() -> TestResult {
    let cfg = ConfigFile::try_from(parse_str("tasks: []\n", ConfigFormat::Yaml)?)?;

    assert!(cfg.task.is_empty());
    Ok(())
}

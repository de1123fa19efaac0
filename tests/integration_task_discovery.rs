// tests/integration_task_discovery.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::fs;
use std::sync::Arc;

use clap::Parser;
use tempfile::TempDir;

use jobrunner::cli::CliArgs;
use jobrunner::errors::JobRunnerError;
use jobrunner::fs::mock::MockFileSystem;
use jobrunner::fs::RealFileSystem;
use jobrunner::prepare;
use jobrunner::types::ResultKind;

struct JobDir {
    root: TempDir,
}

impl JobDir {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("tasks")).unwrap();
        fs::create_dir(root.path().join("conf")).unwrap();
        Self { root }
    }

    fn tasks(&self) -> std::path::PathBuf {
        self.root.path().join("tasks")
    }

    fn conf(&self) -> std::path::PathBuf {
        self.root.path().join("conf")
    }

    fn task(&self, name: &str, body: &str) -> &Self {
        fs::write(self.tasks().join(name), body).unwrap();
        self
    }

    fn task_conf(&self, stem: &str, toml: &str) -> &Self {
        fs::write(self.conf().join(format!("{stem}.toml")), toml).unwrap();
        self
    }

    fn runner_conf(&self, toml: &str) -> &Self {
        fs::write(self.conf().join("jobrunner.toml"), toml).unwrap();
        self
    }

    fn args(&self, extra: &[&str]) -> CliArgs {
        let tasks = self.tasks();
        let conf = self.conf();
        let mut argv = vec![
            "jobrunner",
            "--tasks",
            tasks.to_str().unwrap(),
            "--task-conf",
            conf.to_str().unwrap(),
        ];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }
}

#[test]
fn missing_task_directory_is_a_setup_error() {
    let job = JobDir::new();
    let mut args = job.args(&[]);
    args.tasks = job.root.path().join("nope");

    match prepare(&args, Arc::new(RealFileSystem)) {
        Err(JobRunnerError::MissingDirectory { path, .. }) => assert!(path.ends_with("nope")),
        other => panic!("expected MissingDirectory, got {other:?}"),
    }
}

#[test]
fn dependency_cycle_across_task_configs_is_rejected() {
    let job = JobDir::new();
    job.task("a.dummy", "")
        .task("b.dummy", "")
        .task_conf("a", "depends_on = [\"b.dummy\"]\n")
        .task_conf("b", "depends_on = [\"a.dummy\"]\n");

    let err = prepare(&job.args(&[]), Arc::new(RealFileSystem)).unwrap_err();
    assert!(matches!(err, JobRunnerError::DependencyCycle(_)), "got {err:?}");
}

#[test]
fn dependency_on_unknown_file_is_rejected() {
    let job = JobDir::new();
    job.task("a.dummy", "")
        .task_conf("a", "depends_on = [\"missing.sh\"]\n");

    let err = prepare(&job.args(&[]), Arc::new(RealFileSystem)).unwrap_err();
    assert_eq!(err.to_string(), "a.dummy - there is no task with an id of: missing.sh");
}

#[test]
fn invalid_runner_config_is_rejected() {
    let job = JobDir::new();
    job.task("a.dummy", "").runner_conf("[runner]\nworkers = 0\n");

    let err = prepare(&job.args(&[]), Arc::new(RealFileSystem)).unwrap_err();
    assert!(matches!(err, JobRunnerError::Config(_)), "got {err:?}");
}

#[test]
fn cli_flags_override_runner_config() {
    let job = JobDir::new();
    job.task("a.dummy", "")
        .runner_conf("[runner]\nworkers = 2\nmonitor_interval = \"1m\"\n");

    let runner = prepare(
        &job.args(&["--workers", "5", "--monitor-interval", "2s"]),
        Arc::new(RealFileSystem),
    )
    .unwrap();
    assert_eq!(runner.options().workers, 5);
    assert_eq!(runner.options().monitor_interval, std::time::Duration::from_secs(2));

    let runner = prepare(&job.args(&[]), Arc::new(RealFileSystem)).unwrap();
    assert_eq!(runner.options().workers, 2);
}

#[test]
fn mock_file_system_drives_discovery() {
    let fs = MockFileSystem::new();
    fs.add_file("/job/tasks/01.dummy", "")
        .add_file("/job/tasks/02.dummy", "")
        .add_file("/job/conf/02.toml", "depends_on = [\"01.dummy\"]\n");

    let args = CliArgs::try_parse_from([
        "jobrunner",
        "--tasks",
        "/job/tasks",
        "--task-conf",
        "/job/conf",
    ])
    .unwrap();
    let runner = prepare(&args, Arc::new(fs)).unwrap();

    assert_eq!(runner.graph().roots(), ["01.dummy".to_string()]);
    assert_eq!(runner.graph().dependencies_of("02.dummy"), ["01.dummy".to_string()]);
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shell_job_runs_end_to_end() {
    init_tracing();

    let job = JobDir::new();
    let out = job.root.path().join("out.txt");
    let out_str = out.to_str().unwrap().to_string();

    job.runner_conf(&format!("[template]\nout = \"{out_str}\"\n"))
        .task("01_create.sh", "echo created > [=out]")
        .task("02_append.sh", "echo [=greeting] >> [=out]")
        .task_conf(
            "02_append",
            "depends_on = [\"01_create.sh\"]\n[template]\ngreeting = \"hello\"\n",
        )
        .task("03_fail.sh", "exit 7")
        .task_conf("03_fail", "depends_on = [\"02_append.sh\"]\n")
        .task("04_never.sh", "echo never >> [=out]")
        .task_conf("04_never", "depends_on = [\"03_fail.sh\"]\n")
        .task("notes.txt", "ignored: unmapped extension");

    let runner = prepare(&job.args(&["--workers", "2"]), Arc::new(RealFileSystem)).unwrap();
    assert_eq!(runner.registry().len(), 4);

    let report = with_timeout(runner.run()).await.unwrap();

    assert!(report.completed);
    assert_eq!(report.kind_of("01_create.sh"), ResultKind::Success);
    assert_eq!(report.kind_of("02_append.sh"), ResultKind::Success);
    assert_eq!(report.kind_of("03_fail.sh"), ResultKind::Failed);
    assert_eq!(report.kind_of("04_never.sh"), ResultKind::Skipped);

    let failed = report.result("03_fail.sh");
    assert_eq!(failed.process().and_then(|p| p.exit_code), Some(7));
    assert_eq!(fs::read_to_string(&out).unwrap(), "created\nhello\n");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn configured_external_type_receives_rendered_file() {
    init_tracing();

    let job = JobDir::new();
    job.runner_conf(
        r#"
[extensions]
q = "query"

[task_type.query]
program = "sh"
args = ["-c", "cat \"$0\"", "{file}"]
file_suffix = ".q"
timeout = "10s"

[template]
table = "people"
"#,
    )
    .task("select.q", "select * from [=table];");

    let runner = prepare(&job.args(&[]), Arc::new(RealFileSystem)).unwrap();
    let report = with_timeout(runner.run()).await.unwrap();

    let result = report.result("select.q");
    assert_eq!(result.kind(), ResultKind::Success);
    assert_eq!(
        result.process().map(|p| p.stdout.trim().to_string()),
        Some("select * from people;".to_string())
    );
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn plain_template_type_leaves_brackets_alone() {
    init_tracing();

    let job = JobDir::new();
    job.runner_conf(
        r#"
[extensions]
raw = "verbatim"

[task_type.verbatim]
program = "sh"
template = "plain"

[template]
table = "people"
"#,
    )
    .task("literal.raw", "echo '[=table]'")
    .task("rendered.sh", "echo '[=table]'");

    let runner = prepare(&job.args(&[]), Arc::new(RealFileSystem)).unwrap();
    let report = with_timeout(runner.run()).await.unwrap();

    let stdout = |id: &str| {
        report
            .result(id)
            .process()
            .map(|p| p.stdout.trim().to_string())
    };
    assert_eq!(stdout("literal.raw"), Some("[=table]".to_string()));
    assert_eq!(stdout("rendered.sh"), Some("people".to_string()));
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_required_environment_fails_the_task() {
    init_tracing();

    let job = JobDir::new();
    job.runner_conf(
        r#"
[extensions]
hql = "hive"

[task_type.hive]
program = "${JOBRUNNER_IT_HIVE_HOME_UNSET}/bin/hive"
args = ["-f", "{file}"]
require_env = ["JOBRUNNER_IT_HIVE_HOME_UNSET"]
"#,
    )
    .task("load.hql", "select 1;");

    let runner = prepare(&job.args(&[]), Arc::new(RealFileSystem)).unwrap();
    let report = with_timeout(runner.run()).await.unwrap();

    assert_eq!(report.kind_of("load.hql"), ResultKind::Failed);
    assert_eq!(
        report.task_errors[0].error.to_string(),
        "Environment variable: JOBRUNNER_IT_HIVE_HOME_UNSET is not set"
    );
}

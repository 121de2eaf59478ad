use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use pretty_assertions::assert_eq;
use relsh::{BumpOutcome, DispatchError, Shell, SkipReason};
use relsh_commons::{ExecutionPolicy, LogLevel, MemoryLog, ReleaseOptions, StaticPolicy};
use relsh_config::SharedPolicy;
use relsh_shell_runner::{Builtin, Dispatcher, RecordedKind, RecordingProcess};

fn recording_shell(
    process: &RecordingProcess,
    policy: ExecutionPolicy,
    base_dir: impl Into<PathBuf>,
) -> (Shell, MemoryLog) {
    let log = MemoryLog::new();
    let dispatcher = Dispatcher::new(
        Arc::new(process.clone()),
        Arc::new(StaticPolicy::new(policy)),
    );
    let shell = Shell::new(dispatcher, base_dir).with_log(Arc::new(log.clone()));
    (shell, log)
}

#[tokio::test]
async fn build_without_command_does_nothing() -> Result<()> {
    let process = RecordingProcess::new();
    let (shell, _log) = recording_shell(&process, ExecutionPolicy::default(), "/work");

    let outcomes = shell.build(None, "./out").await?;

    assert!(outcomes.is_empty());
    assert!(process.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn build_recreates_the_directory_before_running() -> Result<()> {
    let process = RecordingProcess::new();
    let (shell, log) = recording_shell(&process, ExecutionPolicy::default(), "/work");

    let outcomes = shell.build(Some("make"), "./out").await?;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        process.command_lines(),
        vec!["rm -rf ./out", "mkdir -p ./out", "make"]
    );
    assert_eq!(
        log.messages(LogLevel::Execution),
        vec!["rm -rf ./out", "mkdir -p ./out", "make"]
    );
    Ok(())
}

#[tokio::test]
async fn build_stops_at_the_failing_mkdir() -> Result<()> {
    let process =
        RecordingProcess::new().with_builtin_failure(Builtin::Mkdir, "permission denied");
    let (shell, _log) = recording_shell(&process, ExecutionPolicy::default(), "/work");

    let err = shell
        .build(Some("make"), "./out")
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("build should fail"))?;

    assert!(matches!(err, DispatchError::Capability { .. }));
    assert!(err.to_string().contains("permission denied"));
    assert_eq!(process.command_lines(), vec!["rm -rf ./out", "mkdir -p ./out"]);
    Ok(())
}

#[tokio::test]
async fn build_surfaces_the_command_exit_code() -> Result<()> {
    let process = RecordingProcess::new().with_exit("npm run build", 2, "tsc: error\n");
    let (shell, _log) = recording_shell(&process, ExecutionPolicy::default(), "/work");

    let err = shell
        .build(Some("npm run build"), "dist")
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("build should fail"))?;

    assert_eq!(err.exit_code(), Some(2));
    assert_eq!(err.to_string(), "tsc: error\n");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn build_with_an_empty_dir_keeps_the_workspace() -> Result<()> {
    let temp = TempDir::new()?;
    temp.child("package.json").write_str("{\"version\":\"1.0.0\"}")?;
    temp.child("src/index.js").write_str("module.exports = 1;\n")?;
    let shell = Shell::system(
        temp.path(),
        Arc::new(StaticPolicy::new(ExecutionPolicy::default())),
    );

    let outcomes = shell.build(Some("true"), "").await?;

    assert_eq!(outcomes.len(), 3);
    temp.child("package.json").assert("{\"version\":\"1.0.0\"}");
    temp.child("src/index.js").assert("module.exports = 1;\n");
    Ok(())
}

#[tokio::test]
async fn publish_treats_empty_paths_as_absent() -> Result<()> {
    let process = RecordingProcess::new();
    let (shell, _log) = recording_shell(&process, ExecutionPolicy::default(), "/work");
    shell.npm_publish(Some("")).await?;

    let configured =
        ExecutionPolicy::default().with_options(ReleaseOptions::default().with_publish_path(""));
    let (configured_shell, _log) = recording_shell(&process, configured, "/work");
    configured_shell.npm_publish(Some("./dist")).await?;

    assert_eq!(
        process.command_lines(),
        vec!["npm publish .", "npm publish ./dist"]
    );
    Ok(())
}

#[tokio::test]
async fn publish_prefers_the_configured_path() -> Result<()> {
    let process = RecordingProcess::new();
    let (shell, _log) = recording_shell(&process, ExecutionPolicy::default(), "/work");
    shell.npm_publish(Some("./dist")).await?;

    let configured = ExecutionPolicy::default()
        .with_options(ReleaseOptions::default().with_publish_path("build/out"));
    let (configured_shell, _log) = recording_shell(&process, configured, "/work");
    configured_shell.npm_publish(Some("./dist")).await?;

    assert_eq!(
        process.command_lines(),
        vec!["npm publish ./dist", "npm publish build/out"]
    );
    Ok(())
}

#[tokio::test]
async fn publish_runs_silently_unless_verbose() -> Result<()> {
    let process = RecordingProcess::new();
    let policy = SharedPolicy::default();
    let dispatcher = Dispatcher::new(Arc::new(process.clone()), Arc::new(policy.clone()));
    let shell = Shell::new(dispatcher, "/work");

    shell.npm_publish(None).await?;
    policy.set_verbose(true);
    shell.npm_publish(None).await?;

    let silence: Vec<bool> = process.calls().iter().map(|call| call.silent).collect();
    assert_eq!(silence, vec![true, false]);
    Ok(())
}

#[tokio::test]
async fn bump_rewrites_present_files_and_skips_missing_ones() -> Result<()> {
    let temp = TempDir::new()?;
    temp.child("a.json")
        .write_str("{\"name\":\"a\",\"version\":\"1.0.0\",\"main\":\"index.js\"}")?;
    let process = RecordingProcess::new();
    let (shell, log) = recording_shell(&process, ExecutionPolicy::default(), temp.path());

    let outcomes = shell.bump(["a.json", "b.json"], "2.0.0").await;

    assert_eq!(
        outcomes.first(),
        Some(&BumpOutcome::Bumped {
            path: PathBuf::from("a.json"),
            previous_version: Some("1.0.0".to_owned()),
        })
    );
    assert_eq!(
        outcomes.get(1).and_then(BumpOutcome::skip_reason),
        Some(SkipReason::Read)
    );
    temp.child("a.json").assert(
        "{\n  \"name\": \"a\",\n  \"version\": \"2.0.0\",\n  \"main\": \"index.js\"\n}\n",
    );
    temp.child("b.json").assert(predicates::path::missing());

    let warnings = log.messages(LogLevel::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings.iter().all(|warning| warning.contains("b.json")));
    assert_eq!(
        log.messages(LogLevel::Execution),
        vec!["bump a.json b.json 2.0.0"]
    );
    assert!(process.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn bump_accepts_a_single_path() -> Result<()> {
    let temp = TempDir::new()?;
    temp.child("package.json").write_str("{\"version\":\"0.9.0\"}")?;
    let process = RecordingProcess::new();
    let (shell, _log) = recording_shell(&process, ExecutionPolicy::default(), temp.path());

    let outcomes = shell.bump("package.json", "1.0.0").await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes.iter().all(BumpOutcome::is_bumped));
    temp.child("package.json")
        .assert("{\n  \"version\": \"1.0.0\"\n}\n");
    Ok(())
}

#[tokio::test]
async fn dry_run_bump_touches_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    temp.child("package.json").write_str("{\"version\":\"0.9.0\"}")?;
    let process = RecordingProcess::new();
    let (shell, log) = recording_shell(&process, ExecutionPolicy::dry_run(), temp.path());

    let outcomes = shell.bump(vec!["package.json"], "1.0.0").await;

    assert_eq!(
        outcomes
            .iter()
            .map(BumpOutcome::skip_reason)
            .collect::<Vec<_>>(),
        vec![Some(SkipReason::DryRun)]
    );
    temp.child("package.json").assert("{\"version\":\"0.9.0\"}");
    assert_eq!(log.messages(LogLevel::Execution).len(), 1);
    assert!(log.messages(LogLevel::Warn).is_empty());
    Ok(())
}

#[tokio::test]
async fn bump_follows_pushd_of_the_system_shell() -> Result<()> {
    let temp = TempDir::new()?;
    temp.child("pkg/package.json")
        .write_str("{\"version\":\"1.0.0\"}")?;
    let shell = Shell::system(
        temp.path(),
        Arc::new(StaticPolicy::new(ExecutionPolicy::default())),
    );

    shell.pushd("pkg").await?;
    let outcomes = shell.bump("package.json", "1.1.0").await;
    shell.popd().await?;

    assert!(outcomes.iter().all(BumpOutcome::is_bumped));
    temp.child("pkg/package.json")
        .assert("{\n  \"version\": \"1.1.0\"\n}\n");
    assert_eq!(shell.working_dir(), temp.path().to_path_buf());
    Ok(())
}

#[tokio::test]
async fn popd_on_an_empty_stack_fails() -> Result<()> {
    let temp = TempDir::new()?;
    let shell = Shell::system(
        temp.path(),
        Arc::new(StaticPolicy::new(ExecutionPolicy::default())),
    );

    let err = shell
        .popd()
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("popd should fail"))?;

    assert!(err.to_string().contains("directory stack empty"));
    Ok(())
}

#[tokio::test]
async fn multi_word_names_run_as_command_lines() -> Result<()> {
    let process = RecordingProcess::new();
    let (shell, _log) = recording_shell(&process, ExecutionPolicy::default(), "/work");

    shell.run("git tag v1.0.0", Vec::<String>::new()).await?;
    shell.run("pushd", ["dist"]).await?;

    let kinds: Vec<RecordedKind> = process.calls().iter().map(|call| call.kind).collect();
    assert_eq!(
        kinds,
        vec![RecordedKind::Exec, RecordedKind::Builtin(Builtin::Pushd)]
    );
    Ok(())
}

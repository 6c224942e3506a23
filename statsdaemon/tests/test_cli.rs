use std::process::{Command, Output};

fn statsdaemon(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_statsdaemon"))
        .args(args)
        .env_remove("STATSDAEMON_CONFIG_PATH")
        .output()
        .unwrap()
}

#[test]
fn test_config_show_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let output = statsdaemon(&["-c", dir.path().to_str().unwrap(), "config", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("0.0.0.0:8125"), "{stdout}");
    assert!(stdout.contains("flush_interval: 10"), "{stdout}");
}

#[test]
fn test_config_show_from_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.yml"),
        "aggregator:\n  flush_interval: 30\n  percentiles: [90, -10]\n",
    )
    .unwrap();

    let output = statsdaemon(&["-c", dir.path().to_str().unwrap(), "config", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("flush_interval: 30"), "{stdout}");
}

#[test]
fn test_invalid_config_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.yml"),
        "aggregator:\n  flush_interval: 0\n",
    )
    .unwrap();

    let output = statsdaemon(&["-c", dir.path().to_str().unwrap(), "config", "show"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("error: "), "{stderr}");
    assert!(stderr.contains("flush_interval"), "{stderr}");
}

#[test]
fn test_run_rejects_invalid_percentile() {
    let dir = tempfile::tempdir().unwrap();
    let output = statsdaemon(&[
        "-c",
        dir.path().to_str().unwrap(),
        "run",
        "--percentile",
        "100",
        "--output",
        "discard",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("percentile"), "{stderr}");
}

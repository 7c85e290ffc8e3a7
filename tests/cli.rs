//! Integration tests for the frametrace binary.

use std::io::Write;
use std::process::{Command, Stdio};

const SAMPLE_LOG: &str = "event,frame,timestamp,stream\n\
wake_up,0,1000000,255\n\
submit,0,3000000,255\n\
encode_begin,0,1500000,0\n\
encode_end,0,2500000,0\n\
display,0,9000000,255\n\
wake_up,1,12000000,255\n\
submit,1,14000000,255\n\
display,1,20000000,255\n";

/// Command with an isolated config path so a developer's real config file
/// never leaks into test output.
fn frametrace(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_frametrace"));
    cmd.env("FRAMETRACE_CONFIG_PATH", config_dir.join("config.toml"));
    cmd
}

fn write_sample(dir: &std::path::Path) -> std::path::PathBuf {
    let log = dir.join("timings.csv");
    std::fs::write(&log, SAMPLE_LOG).expect("Failed to write sample log");
    log
}

#[test]
fn test_durations_from_file() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());

    let output = frametrace(temp.path())
        .arg("durations")
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    // Both frames: 8ms from earliest wake_up to latest display
    assert_eq!(String::from_utf8_lossy(&output.stdout), "8.000\n8.000\n");
}

#[test]
fn test_durations_from_stdin() {
    let temp = tempfile::tempdir().unwrap();

    let mut child = frametrace(temp.path())
        .args(["durations", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn frametrace");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(SAMPLE_LOG.as_bytes())
        .expect("Failed to write to stdin");

    let output = child.wait_with_output().expect("Failed to read output");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "8.000\n8.000\n");
}

#[test]
fn test_durations_stats() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());

    let output = frametrace(temp.path())
        .args(["durations", "--stats"])
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("samples 2"), "stdout: {stdout}");
    assert!(stdout.contains("mean    8.000 ms"));
    assert!(stdout.contains("p90     8.000 ms"));
}

#[test]
fn test_durations_scoped_to_stream() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());

    let output = frametrace(temp.path())
        .args([
            "durations",
            "--begin",
            "encode_begin",
            "--end",
            "encode_end",
            "--stream",
            "0",
        ])
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success());
    // Only frame 0 has encode events; frame 1 is excluded, not an error
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1.000\n");
}

#[test]
fn test_durations_skip_renumbers() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());

    let output = frametrace(temp.path())
        .args(["durations", "--skip", "1"])
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "8.000\n");
}

#[test]
fn test_durations_empty_result_warns() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());

    let output = frametrace(temp.path())
        .args(["durations", "--begin", "decode_begin", "--end", "decode_end"])
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success(), "undefined durations are not an error");
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No frame resolved"), "stderr: {stderr}");
}

#[test]
fn test_pivot_csv() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());

    let output = frametrace(temp.path())
        .arg("pivot")
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();

    let header = lines.next().unwrap();
    assert!(header.starts_with("frame,wake_up,begin,submit,encode_begin,"));
    assert!(header.contains(",s0_encode_begin,"));

    // frame 0: origin-relative wake_up 0, no global begin, submit at 2ms
    let row0 = lines.next().unwrap();
    assert!(row0.starts_with("0,0,,2000000,500000,1500000,"), "row: {row0}");
    assert_eq!(lines.count(), 1);
}

#[test]
fn test_pivot_json() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());

    let output = frametrace(temp.path())
        .args(["pivot", "--format", "json"])
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success());
    let rows: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Should output valid JSON");
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["frame"], 0);
    assert_eq!(rows[0]["submit"], 2000000);
    assert_eq!(rows[0]["s0_encode_begin"], 500000);
    assert!(rows[0]["begin"].is_null());
    assert_eq!(rows[1]["frame"], 1);
}

#[test]
fn test_render_svg_to_file() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());
    let out = temp.path().join("timeline.svg");

    let output = frametrace(temp.path())
        .arg("render")
        .arg(&log)
        .arg("-o")
        .arg(&out)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let svg = std::fs::read_to_string(&out).expect("Should write the SVG file");
    assert!(svg.starts_with("<?xml version=\"1.0\""));
    assert!(svg.contains("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(svg.contains("id=\"frame-0\""));
    assert!(svg.contains("id=\"frame-1\""));
    assert!(svg.contains("class=\"compositor\""));
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn test_malformed_row_is_fatal() {
    let temp = tempfile::tempdir().unwrap();

    let mut child = frametrace(temp.path())
        .args(["pivot", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn frametrace");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"wake_up,0,1000,255\nsubmit,0,2000\nwake_up,1,5000,255\n")
        .expect("Failed to write to stdin");

    let output = child.wait_with_output().expect("Failed to read output");

    assert!(!output.status.success(), "malformed rows should fail the read");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line"), "stderr: {stderr}");
    assert!(stderr.contains('2'), "stderr: {stderr}");
}

#[test]
fn test_config_file_supplies_duration_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());
    std::fs::write(
        temp.path().join("config.toml"),
        "[durations]\nbegin = \"wake_up\"\nend = \"submit\"\n",
    )
    .unwrap();

    let output = frametrace(temp.path())
        .arg("durations")
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    // wake_up -> submit is 2ms in both frames
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2.000\n2.000\n");
}

#[test]
fn test_cli_overrides_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let log = write_sample(temp.path());
    std::fs::write(
        temp.path().join("config.toml"),
        "[durations]\nbegin = \"wake_up\"\nend = \"submit\"\n",
    )
    .unwrap();

    let output = frametrace(temp.path())
        .args(["durations", "--end", "display"])
        .arg(&log)
        .output()
        .expect("Failed to run frametrace");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "8.000\n8.000\n");
}

use std::process::Command;

use irma_vm::RunSummary;

fn irma() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_irma"));
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn headless_runs_print_summaries() {
    let output = irma()
        .args([
            "--width", "60", "--height", "60", "--org-amount", "100", "--iterations", "5",
            "--runs", "2", "--seed", "11", "--json",
        ])
        .output()
        .expect("binary runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let summaries: Vec<RunSummary> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("summary json"))
        .collect();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].iteration, 5);
    assert_eq!(summaries[1].iteration, 10);
}

#[test]
fn lineage_log_records_seeded_population() {
    let path = std::env::temp_dir().join(format!("irma-cli-lineage-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let status = irma()
        .args([
            "--width", "100", "--height", "100", "--org-amount", "20", "--runs", "0", "--seed", "3",
        ])
        .arg("--lineage")
        .arg(&path)
        .status()
        .expect("binary runs");
    assert!(status.success());

    let raw = std::fs::read_to_string(&path).expect("lineage log");
    assert_eq!(raw.lines().count(), 5);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn invalid_configuration_fails() {
    let output = irma()
        .args(["--width", "0", "--runs", "1"])
        .output()
        .expect("binary runs");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}

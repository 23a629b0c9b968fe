use assert_cmd::cargo::cargo_bin_cmd;

fn fixture(path: &str) -> String {
    format!("{}/tests/fixtures/{path}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn help_lists_report_flags() {
    let mut cmd = cargo_bin_cmd!("jars");
    cmd.arg("--help");
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");

    assert!(stdout.contains("--report"));
    assert!(stdout.contains("--validate-only"));
    assert!(stdout.contains("--probe-only"));
}

#[test]
fn validate_only_passes_for_complete_report() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cmd = cargo_bin_cmd!("jars");
    cmd.current_dir(temp.path())
        .arg("--validate-only")
        .arg("--report")
        .arg(fixture("reports/complete.json"))
        .arg("--rules")
        .arg(fixture("rules/sna_rules.json"));
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("Validation Pass: true"));
}

#[test]
fn validate_only_exits_two_for_incomplete_report() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cmd = cargo_bin_cmd!("jars");
    cmd.current_dir(temp.path())
        .arg("--validate-only")
        .arg("--report")
        .arg(fixture("reports/incomplete.json"))
        .arg("--rules")
        .arg(fixture("rules/sna_rules.json"));
    let out = cmd.assert().code(2);
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("Warning [1]: Course information 'Teacher' is not filled!"));
    assert!(stdout.contains("Warnings: 7"));
}

#[test]
fn generation_writes_comments_and_manifest() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = temp.path().join("out").join("comments.json");
    let mut cmd = cargo_bin_cmd!("jars");
    cmd.current_dir(temp.path())
        .arg("--config")
        .arg(fixture("configs/minimal.toml"))
        .arg("--report")
        .arg(fixture("reports/complete.json"))
        .arg("--rules")
        .arg(fixture("rules/sna_rules.json"))
        .arg("--output")
        .arg(&output);
    cmd.assert().success();

    let comments = std::fs::read_to_string(&output).expect("comments written");
    let parsed: serde_json::Value = serde_json::from_str(&comments).expect("json");
    assert_eq!(parsed.as_array().map(Vec::len), Some(3));
    assert_eq!(parsed[0]["full_name"], "Ann Lee");

    let manifest = std::fs::read_to_string(temp.path().join("manifest.json")).expect("manifest");
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("json");
    assert_eq!(manifest["report_digest"].as_str().map(str::len), Some(64));
    assert_eq!(manifest["entries"][0]["status"], "done");
    assert!(temp.path().join(".cache/jars/run.jsonl").exists());
}

#[test]
fn strict_mode_fails_on_incomplete_report() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cmd = cargo_bin_cmd!("jars");
    cmd.current_dir(temp.path())
        .arg("--strict")
        .arg("--report")
        .arg(fixture("reports/incomplete.json"))
        .arg("--rules")
        .arg(fixture("rules/sna_rules.json"));
    let out = cmd.assert().failure();
    let stderr = String::from_utf8(out.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("strict mode refused generation"));
    assert!(!temp.path().join("comments.json").exists());
}

#[test]
fn missing_config_exits_nonzero() {
    let mut cmd = cargo_bin_cmd!("jars");
    cmd.arg("--config").arg(fixture("configs/missing.toml"));
    cmd.assert().failure();
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const VENDORS: &str = r#"{
    "source_id": "123-789",
    "records": [
        {"vendors": [
            {"name": "Paper Co", "budget": 15000, "expenses": 8000, "has_contract": false},
            {"name": "Ink Inc", "budget": 2000, "expenses": 1500, "has_contract": true}
        ]},
        {"vendors": [
            {"name": "Steel Ltd", "budget": 10000, "expenses": 9000, "has_contract": true},
            {"name": "Bolt Bros", "budget": 3000, "expenses": 3000, "has_contract": true}
        ]}
    ]
}"#;

const SENTENCES_CSV: &str = "attr,subject,verb,obj,action,params
_source_id,source,parse,$.source_id,,
total_vendor_count,source,parse_len,$.records[*].vendors[*],,
max_budget_only_contract,source,parse_max,$.records[*].vendors[?has_contract == true].budget,,
many_vendors,total_vendor_count,>,1,notify,\"_source_id,total_vendor_count\"
";

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn derive() -> Command {
    Command::cargo_bin("derive").unwrap()
}

#[test]
fn test_cli_run_attributes_from_csv() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(&temp_dir, "sentences.csv", SENTENCES_CSV);
    let document = write_fixture(&temp_dir, "document.json", VENDORS);

    derive()
        .arg("run")
        .arg("--sentences")
        .arg(&sentences)
        .arg("--document")
        .arg(&document)
        .assert()
        .success()
        .stdout(predicate::str::contains("total_vendor_count"))
        .stdout(predicate::str::contains("10000"))
        .stdout(predicate::str::contains("_source_id").not());
}

#[test]
fn test_cli_run_raw_outputs_json() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(&temp_dir, "sentences.csv", SENTENCES_CSV);
    let document = write_fixture(&temp_dir, "document.json", VENDORS);

    let output = derive()
        .args(["run", "--raw", "--sentences"])
        .arg(&sentences)
        .arg("--document")
        .arg(&document)
        .output()
        .unwrap();

    assert!(output.status.success());
    let values: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        values,
        serde_json::json!({
            "total_vendor_count": 4,
            "max_budget_only_contract": 10000,
            "many_vendors": true
        })
    );
}

#[test]
fn test_cli_run_rules_mode() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(&temp_dir, "sentences.csv", SENTENCES_CSV);
    let document = write_fixture(&temp_dir, "document.json", VENDORS);

    derive()
        .args(["run", "--mode", "rules", "--sentences"])
        .arg(&sentences)
        .arg("--document")
        .arg(&document)
        .assert()
        .success()
        .stdout(predicate::str::contains("many_vendors"))
        .stdout(predicate::str::contains("1 passed, 0 failed"))
        .stdout(predicate::str::contains("total_vendor_count").not());
}

#[test]
fn test_cli_run_triggers_prints_actions_as_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(&temp_dir, "sentences.csv", SENTENCES_CSV);
    let document = write_fixture(&temp_dir, "document.json", VENDORS);

    let output = derive()
        .args(["run", "--mode", "triggers", "--raw", "--sentences"])
        .arg(&sentences)
        .arg("--document")
        .arg(&document)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let action: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(
        action,
        serde_json::json!({
            "trigger": "many_vendors",
            "action": "notify",
            "params": {"_source_id": "123-789", "total_vendor_count": 4}
        })
    );
}

#[test]
fn test_cli_run_json_sentences_with_reference_date() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(
        &temp_dir,
        "sentences.json",
        r#"[
            {"name": "_signed", "subject": "source", "verb": "parse", "object": "$.signed"},
            {"name": "recent", "subject": "_signed", "verb": "within_last_days", "object": 10}
        ]"#,
    );
    let document = write_fixture(&temp_dir, "document.json", r#"{"signed": "2024-03-25"}"#);

    derive()
        .args(["run", "--raw", "--today", "2024-03-31", "--sentences"])
        .arg(&sentences)
        .arg("--document")
        .arg(&document)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"recent\": true"));
}

#[test]
fn test_cli_run_reports_evaluation_errors() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(&temp_dir, "sentences.csv", "attr,subject,verb,obj\nname,source,parse,$.missing\n");
    let document = write_fixture(&temp_dir, "document.json", "{}");

    derive()
        .arg("run")
        .arg("--sentences")
        .arg(&sentences)
        .arg("--document")
        .arg(&document)
        .assert()
        .failure()
        .stderr(predicate::str::contains("matched nothing"));
}

#[test]
fn test_cli_check_reports_cycles() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(&temp_dir, "sentences.csv", "attr,subject,verb,obj\na,b,and,true\nb,a,and,true\n");

    derive()
        .arg("check")
        .arg("--sentences")
        .arg(&sentences)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cyclic dependency detected: a -> b -> a"));
}

#[test]
fn test_cli_check_prints_evaluation_order() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(&temp_dir, "sentences.csv", SENTENCES_CSV);

    derive()
        .arg("check")
        .arg("--sentences")
        .arg(&sentences)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 sentences are valid"))
        .stdout(predicate::str::contains("many_vendors"));
}

#[test]
fn test_cli_rejects_unknown_file_types() {
    let temp_dir = TempDir::new().unwrap();
    let sentences = write_fixture(&temp_dir, "sentences.txt", "whatever");

    derive()
        .arg("check")
        .arg("--sentences")
        .arg(&sentences)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a .csv or .json file"));
}

#[test]
fn test_cli_verbs_lists_the_library() {
    derive()
        .arg("verbs")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse_median_jsonata"))
        .stdout(predicate::str::contains("list_within_last_days"));
}

//! End-to-end tests for the `vox` binary.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::process::Command;

fn vox() -> Command {
    Command::cargo_bin("vox").expect("vox binary")
}

/// Run in an empty directory so no voxcode.toml is picked up.
fn vox_in(dir: &tempfile::TempDir) -> Command {
    let mut cmd = vox();
    cmd.current_dir(dir.path());
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn decode_joins_model_words() {
    vox()
        .args(["decode", "x SP = SP 1"])
        .assert()
        .success()
        .stdout("x = 1\n");
}

#[test]
fn tokenize_prints_model_representation() {
    vox()
        .args(["tokenize", "IOException"])
        .assert()
        .success()
        .stdout("NL A io C exception\n");
}

#[test]
fn tokenize_reads_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snippet.txt");
    std::fs::write(&path, "foo[BAZ_BOO]").unwrap();

    vox()
        .args(["tokenize", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout("NL foo [ A baz _ A boo ]\n");
}

#[test]
fn tokenize_without_input_fails() {
    vox()
        .arg("tokenize")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Provide SOURCE or --file"));
}

#[test]
fn numbers_convert_spoken_digits() {
    vox()
        .args(["numbers", "go", "to", "line", "thirty", "twenty", "five"])
        .assert()
        .success()
        .stdout("go to line 3025\n");

    vox()
        .args(["numbers", "--to-words", "152"])
        .assert()
        .success()
        .stdout("one five two\n");
}

#[test]
fn numbers_reject_non_digits_for_words() {
    vox()
        .args(["numbers", "--to-words", "1a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a digit string"));
}

#[test]
fn style_detects_and_converts() {
    vox()
        .args(["--no-color", "style", "hiThere"])
        .assert()
        .success()
        .stdout("hiThere: CAMEL_CASE\n");

    vox()
        .args(["style", "foo bar", "--to", "pascal"])
        .assert()
        .success()
        .stdout("FooBar\n");

    let v = json_stdout(vox().args(["style", "hi_there", "--format", "json"]));
    insta::assert_yaml_snapshot!(v, @r#"
    input: hi_there
    styles:
      - UNDERSCORES
    "#);
}

#[test]
fn format_applies_phrase_tables() {
    vox()
        .args(["format", "x", "equals", "y", "plus", "one", "-o", "expression"])
        .assert()
        .success()
        .stdout("x = y + 1\n");

    vox()
        .args(["format", "camel", "case", "get", "user", "name"])
        .assert()
        .success()
        .stdout("getUserName\n");
}

#[test]
fn format_rejects_unknown_language() {
    vox()
        .args(["format", "--language", "cobol", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported for cobol"));
}

#[test]
fn resolve_inserts_at_the_cursor() {
    let dir = tempfile::tempdir().unwrap();
    vox_in(&dir)
        .args(["--quiet", "resolve", "get", "user", "name", "--source", "foo = ", "-o", "snippet=camel"])
        .assert()
        .success()
        .stdout("foo = getUserName\n");
}

#[test]
fn resolve_json_reports_cursor_and_changes() {
    let dir = tempfile::tempdir().unwrap();
    let v = json_stdout(vox_in(&dir).args([
        "resolve",
        "--language",
        "javascript",
        "--template",
        "return <%value%><%terminator%>",
        "--slot",
        "value=x",
        "--format",
        "json",
    ]));
    insta::assert_yaml_snapshot!(v, @r#"
    changes:
      - range:
          start: 0
          stop: 0
        substitution: return x;
    cursor: 9
    description: return x;
    source: return x;
    "#);
}

#[test]
fn resolve_writes_back_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.py");
    std::fs::write(&path, "x = \n").unwrap();

    vox_in(&dir)
        .args(["--quiet", "resolve", "one", "hundred", "--language", "python", "--cursor", "4", "--write", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout("");

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "x = 100\n");
}

#[test]
fn resolve_rejects_ranges_past_the_end() {
    let dir = tempfile::tempdir().unwrap();
    vox_in(&dir)
        .args(["resolve", "x", "--source", "abc", "--start", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid range"));
}

#[test]
fn strict_config_fails_on_unresolved_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("voxcode.toml"), "strict_placeholders = true\n").unwrap();

    vox_in(&dir)
        .args(["resolve", "--template", "<%a%> <%b%>", "--slot", "a=x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unresolved placeholder"));

    vox_in(&dir)
        .env("VOXCODE_STRICT_PLACEHOLDERS", "false")
        .args(["--quiet", "resolve", "--template", "<%a%> <%b%>", "--slot", "a=x"])
        .assert()
        .success()
        .stdout("x <%b%>\n");
}

#[test]
fn init_writes_config_once() {
    let dir = tempfile::tempdir().unwrap();
    vox()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let written = std::fs::read_to_string(dir.path().join("voxcode.toml")).unwrap();
    assert!(written.contains("max_prior_context = 35"));

    vox()
        .arg("init")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    vox().args(["--quiet", "init", "--force"]).arg(dir.path()).assert().success().stdout("");
}

#[test]
fn completions_print_to_stdout() {
    vox()
        .args(["completions", "bash", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vox"));
}

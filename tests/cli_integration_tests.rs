#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Stands in for black: spaces out `=` and refuses anything containing `def f(:`.
const FAKE_BLACK: &str = r#"
autoflake = false
isort = false
output-clearing = "inline"

[tools.black]
command = ["sh", "-c", '''
input=$(cat; echo x)
input=${input%x}
case "$input" in *'def f(:'*) echo 'cannot parse' >&2; exit 123;; esac
printf '%s' "$input" | sed -E 's/ *= */ = /'
''']
"#;

fn setup() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join(".clean-py.toml"), FAKE_BLACK).unwrap();
    temp
}

fn write_notebook(path: &Path, cells: Value) {
    let notebook = json!({
        "cells": cells,
        "metadata": {"kernelspec": {"name": "python3"}},
        "nbformat": 4,
        "nbformat_minor": 5
    });
    fs::write(path, serde_json::to_string_pretty(&notebook).unwrap()).unwrap();
}

fn read_cells(path: &Path) -> Vec<Value> {
    let notebook: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    notebook["cells"].as_array().unwrap().clone()
}

fn code_cell(source: Value) -> Value {
    json!({
        "cell_type": "code",
        "execution_count": 3,
        "id": "c1",
        "metadata": {"scrolled": true},
        "outputs": [{"output_type": "stream", "name": "stdout", "text": ["1\n"]}],
        "source": source
    })
}

#[test]
fn test_notebook_code_cell_reformatted() {
    let temp = setup();
    let nb = temp.path().join("analysis.ipynb");
    write_notebook(&nb, json!([code_cell(json!(["x=1\n", "y  =  2"]))]));

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg("analysis.ipynb")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaning completed successfully!"));

    let cells = read_cells(&nb);
    assert_eq!(cells[0]["source"], json!(["x = 1\n", "y = 2"]));
    assert_eq!(cells[0]["outputs"], json!([]));
    assert_eq!(cells[0]["execution_count"], Value::Null);
    assert_eq!(cells[0]["id"], "c1");
}

#[test]
fn test_markdown_cell_untouched() {
    let temp = setup();
    let nb = temp.path().join("notes.ipynb");
    let markdown = json!({
        "cell_type": "markdown",
        "metadata": {"tags": ["intro"]},
        "source": ["# Title\n", "a=1 is  not code"]
    });
    write_notebook(&nb, json!([markdown.clone()]));

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg("notes.ipynb")
        .assert()
        .success();

    assert_eq!(read_cells(&nb), vec![markdown]);
}

#[test]
fn test_invalid_cell_kept_and_others_cleaned() {
    let temp = setup();
    let nb = temp.path().join("broken.ipynb");
    write_notebook(
        &nb,
        json!([code_cell(json!(["def f(:\n", "    a=1"])), code_cell(json!(["b=2"]))]),
    );

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg("broken.ipynb")
        .assert()
        .success();

    let cells = read_cells(&nb);
    assert_eq!(cells[0]["source"], json!(["def f(:\n", "    a=1"]));
    assert_eq!(cells[1]["source"], json!(["b = 2"]));
}

#[test]
fn test_keep_outputs_with_flag() {
    let temp = setup();
    let nb = temp.path().join("keep.ipynb");
    write_notebook(&nb, json!([code_cell(json!(["x = 1"]))]));
    let before = fs::read_to_string(&nb).unwrap();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .args(["--no-clear-output", "keep.ipynb"])
        .assert()
        .success();

    let cells = read_cells(&nb);
    assert_eq!(cells[0]["execution_count"], 3);
    assert_eq!(cells[0]["outputs"].as_array().unwrap().len(), 1);
    let after = fs::read_to_string(&nb).unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(&before).unwrap(),
        serde_json::from_str::<Value>(&after).unwrap()
    );
}

#[test]
fn test_directory_cleans_py_and_notebooks() {
    let temp = setup();
    let pkg = temp.path().join("pkg");
    fs::create_dir_all(pkg.join(".ipynb_checkpoints")).unwrap();
    fs::write(pkg.join("mod.py"), "value=3\n").unwrap();
    fs::write(pkg.join("README.md"), "x=1\n").unwrap();
    write_notebook(&pkg.join("nb.ipynb"), json!([code_cell(json!(["z=9"]))]));
    write_notebook(
        &pkg.join(".ipynb_checkpoints/nb-checkpoint.ipynb"),
        json!([code_cell(json!(["z=9"]))]),
    );

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg("pkg")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned 2 files (2 changed)"));

    assert_eq!(fs::read_to_string(pkg.join("mod.py")).unwrap(), "value = 3\n");
    assert_eq!(fs::read_to_string(pkg.join("README.md")).unwrap(), "x=1\n");
    assert_eq!(read_cells(&pkg.join("nb.ipynb"))[0]["source"], json!(["z = 9"]));
    assert_eq!(
        read_cells(&pkg.join(".ipynb_checkpoints/nb-checkpoint.ipynb"))[0]["source"],
        json!(["z=9"])
    );
}

#[test]
fn test_failed_file_exits_one_and_others_cleaned() {
    let temp = setup();
    fs::write(temp.path().join("a_bad.py"), "def f(:\n    pass\n").unwrap();
    fs::write(temp.path().join("b_good.py"), "a=1\n").unwrap();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg(".")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 file could not be cleaned"))
        .stderr(predicate::str::contains("a_bad.py"));

    assert_eq!(fs::read_to_string(temp.path().join("a_bad.py")).unwrap(), "def f(:\n    pass\n");
    assert_eq!(fs::read_to_string(temp.path().join("b_good.py")).unwrap(), "a = 1\n");
}

#[test]
fn test_no_black_leaves_python_unchanged() {
    let temp = setup();
    fs::write(temp.path().join("a.py"), "a=1\n").unwrap();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .args(["--no-black", "a.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(0 changed)"));

    assert_eq!(fs::read_to_string(temp.path().join("a.py")).unwrap(), "a=1\n");
}

#[test]
fn test_missing_path_is_tool_error() {
    let temp = setup();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg("does_not_exist.py")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_unsupported_file_is_tool_error() {
    let temp = setup();
    fs::write(temp.path().join("notes.txt"), "hello\n").unwrap();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg("notes.txt")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unable to clean"));
}

#[test]
fn test_disabled_kind_is_tool_error() {
    let temp = setup();
    fs::write(temp.path().join("a.py"), "a=1\n").unwrap();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .args(["--no-py", "a.py"])
        .assert()
        .code(2);

    assert_eq!(fs::read_to_string(temp.path().join("a.py")).unwrap(), "a=1\n");
}

#[test]
fn test_invalid_config_is_tool_error() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join(".clean-py.toml"), "line-length = 0\n").unwrap();
    fs::write(temp.path().join("a.py"), "a=1\n").unwrap();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg("a.py")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("line-length"));
}

#[test]
fn test_explicit_config_path() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("custom.toml");
    fs::write(&config, FAKE_BLACK).unwrap();
    fs::write(temp.path().join("a.py"), "a=1\n").unwrap();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("a.py")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(temp.path().join("a.py")).unwrap(), "a = 1\n");
}

#[test]
fn test_no_paths_is_usage_error() {
    cargo_bin_cmd!("clean_py").assert().code(2);
}

#[test]
#[ignore = "needs autoflake, isort and black on PATH"]
fn test_real_tools_remove_unused_import() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("mod.py");
    fs::write(&file, "import os\nimport sys\n\ndef f():\n    return os.sep\n").unwrap();

    cargo_bin_cmd!("clean_py")
        .current_dir(temp.path())
        .args(["--no-config", "mod.py"])
        .assert()
        .success();

    let cleaned = fs::read_to_string(&file).unwrap();
    assert!(!cleaned.contains("import sys"), "{cleaned}");
    assert!(cleaned.contains("import os"), "{cleaned}");
    assert!(cleaned.contains("\n\n\ndef f():"), "{cleaned}");
}

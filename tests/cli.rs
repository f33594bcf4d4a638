mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

const SCHEMA_YAML: &str = "
name: responses
source: csv_file
columns:
  - name: name
  - name: amount
    datatype: number
  - name: submitted_at
    datatype: datetime
header_map:
  Submitted At: submitted_at
";

fn cli() -> Command {
    Command::cargo_bin("csv-reconcile").expect("binary exists")
}

#[test]
fn columns_lists_names_types_and_csv_headers() {
    let workspace = TestWorkspace::new();
    let schema = workspace.write("responses.yaml", SCHEMA_YAML);

    cli()
        .args(["columns", "-s", schema.to_str().expect("utf-8 path")])
        .assert()
        .success()
        .stdout(contains("submitted_at").and(contains("datetime")).and(contains("Submitted At")));
}

#[test]
fn import_dry_run_succeeds_on_clean_input() {
    let workspace = TestWorkspace::new();
    let schema = workspace.write("responses.yaml", SCHEMA_YAML);
    let input = workspace.write(
        "responses.csv",
        "name,amount,Submitted At\nAlice,\"$1,000\",2019-08-30\nBob,$250,2019-08-31 10:00:00\n",
    );

    cli()
        .args([
            "import",
            "-i",
            input.to_str().expect("utf-8 path"),
            "-s",
            schema.to_str().expect("utf-8 path"),
            "--pipeline",
            "trim",
        ])
        .assert()
        .success()
        .stderr(contains("Import is clean"));
}

#[test]
fn import_fails_fast_on_unknown_pipeline_step() {
    let workspace = TestWorkspace::new();
    let schema = workspace.write("responses.yaml", SCHEMA_YAML);
    let input = workspace.write("responses.csv", "name,amount\nAlice,$1\n");

    cli()
        .args([
            "import",
            "-i",
            input.to_str().expect("utf-8 path"),
            "-s",
            schema.to_str().expect("utf-8 path"),
            "--pipeline",
            "no_such_step",
        ])
        .assert()
        .failure()
        .stderr(contains("unknown pipeline step 'no_such_step'"));
}

#[test]
fn import_reports_a_missing_schema_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("responses.csv", "name,amount\nAlice,$1\n");
    let missing = workspace.path().join("absent.yaml");

    cli()
        .args([
            "import",
            "-i",
            input.to_str().expect("utf-8 path"),
            "-s",
            missing.to_str().expect("utf-8 path"),
        ])
        .assert()
        .failure()
        .stderr(contains("Loading schema"));
}

use clap::Parser;
use docsearch::{collect_input_files, read_documents, run, Cli};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_fixture(dir: &Path) {
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(
        dir.join("pets.jsonl"),
        concat!(
            r#"{"id": 1, "text": "a colorful parrot with green wings and red tail is lost", "ratings": [1, 2, 3]}"#,
            "\n",
            r#"{"id": 2, "text": "a grey hound with black ears is found at the railway station", "ratings": [1, 2, 3]}"#,
            "\n\n",
            r#"{"id": 3, "body": "a white cat with long furry tail is found near the red square", "ratings": [1, 2, 3]}"#,
            "\n",
        ),
    )
    .unwrap();
    fs::write(
        dir.join("nested/more.json"),
        r#"[
            {"id": 4, "text": "white cat with long furry tail", "status": "banned", "ratings": [9]},
            {"id": 5, "text": "bad \u0012 word"}
        ]"#,
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "not a document").unwrap();
}

fn run_args(args: &[&str]) -> Vec<Value> {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    run(cli, &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

const STOP: &str = "is are was a an in the with near at";

#[test]
fn collects_json_files_from_directory() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    let files = collect_input_files(dir.path());
    assert_eq!(files.len(), 2);
    assert_eq!(read_documents(dir.path().to_str().unwrap()).unwrap().len(), 5);
}

#[test]
fn search_prints_ranked_results_per_query() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    let input = dir.path().to_str().unwrap();

    let lines = run_args(&["docsearch", "search", "--input", input, "--stop-words", STOP, "white cat long tail", "railway"]);
    assert_eq!(lines.len(), 2);
    let first = lines[0]["results"].as_array().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0]["id"].as_i64(), Some(3));
    assert_eq!(first[1]["id"].as_i64(), Some(1));
    assert_eq!(lines[1]["results"][0]["id"].as_i64(), Some(2));

    let banned = run_args(&[
        "docsearch", "search", "--input", input, "--stop-words", STOP, "--status", "banned", "--parallel", "cat",
    ]);
    let results = banned[0]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"].as_i64(), Some(4));
    assert_eq!(results[0]["status"].as_str(), Some("banned"));
}

#[test]
fn match_and_dedup_commands() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    let input = dir.path().to_str().unwrap();

    let matched = run_args(&["docsearch", "match", "--input", input, "--stop-words", STOP, "--id", "3", "tail cat owl"]);
    assert_eq!(matched[0]["words"], serde_json::json!(["cat", "tail"]));

    fs::write(
        dir.path().join("dupes.jsonl"),
        "{\"id\": 10, \"text\": \"tail furry long cat white\"}\n",
    )
    .unwrap();
    let dedup = run_args(&["docsearch", "dedup", "--input", input, "--stop-words", STOP]);
    assert_eq!(dedup[0]["removed"], serde_json::json!([10]));
    assert_eq!(dedup[0]["remaining"].as_u64(), Some(4));
}

#[test]
fn batch_respects_config_cap() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    let config = dir.path().join("settings.cfg");
    fs::write(&config, r#"{ "max_result_document_count": 1 }"#).unwrap();
    let input = dir.path().join("pets.jsonl");

    let lines = run_args(&[
        "docsearch", "batch", "--input", input.to_str().unwrap(), "--config", config.to_str().unwrap(), "--joined",
        "red", "found",
    ]);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].as_array().unwrap().len(), 2);
}

#[test]
fn malformed_query_is_an_error() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    let cli = Cli::try_parse_from(["docsearch", "search", "--input", dir.path().to_str().unwrap(), "--", "cat --dog"]).unwrap();
    let mut out = Vec::new();
    assert!(run(cli, &mut out).is_err());
}

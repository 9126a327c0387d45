//! End-to-end tests driving the interpreter the way the binary does.

use binkv::{run, BinStore, ToolError, Value};
use tempfile::TempDir;

fn invoke(args: &[&str]) -> (Result<(), ToolError>, String) {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let mut out = Vec::new();
    let result = run(&args, &mut out);
    (result, String::from_utf8(out).unwrap())
}

fn store_path(dir: &TempDir) -> String {
    dir.path().join("f.db").to_str().unwrap().to_string()
}

#[test]
fn given_missing_file_when_set_then_store_is_created_and_readable() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let (result, _) = invoke(&[&path, "set", "-i", "count", "5"]);
    assert!(result.is_ok());

    let (result, out) = invoke(&[&path, "get", "count"]);
    assert!(result.is_ok());
    assert!(out.contains("(int)    \"count\" = 5"));
}

#[test]
fn given_two_triplets_when_set_then_list_shows_both_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    invoke(&[&path, "set", "-s", "name", "Alice", "-i", "age", "30"])
        .0
        .unwrap();

    let (result, out) = invoke(&[&path, "list"]);
    assert!(result.is_ok());

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], format!("File \"{path}\" (2 keys):"));
    assert_eq!(lines[1], "(string) \"name\" = \"Alice\"");
    assert_eq!(lines[2], "(int)    \"age\" = 30");
}

#[test]
fn given_existing_key_when_removed_then_deletion_persists() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    invoke(&[&path, "set", "-i", "count", "5"]).0.unwrap();

    let (result, out) = invoke(&[&path, "remove", "count"]);
    assert!(result.is_ok());
    assert!(out.contains("DELETING: (int)    \"count\" = 5"));

    let (result, out) = invoke(&[&path, "get", "count"]);
    assert!(result.is_ok());
    assert!(out.contains("Key not found: \"count\"."));
}

#[test]
fn given_missing_raw_source_when_set_then_store_file_is_untouched() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let missing = dir.path().join("missing.dat");

    let (result, _) = invoke(&[&path, "set", "-r", "blob", missing.to_str().unwrap()]);
    assert!(matches!(result, Err(ToolError::FileOpen(_))));
    assert!(!dir.path().join("f.db").exists());
}

#[test]
fn given_omitted_value_when_set_then_store_file_is_untouched() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    invoke(&[&path, "set", "-i", "count", "5"]).0.unwrap();
    let before = std::fs::read(&path).unwrap();

    let (result, _) = invoke(&[&path, "set", "-i", "x"]);
    assert!(matches!(
        result,
        Err(ToolError::InvalidSyntax("no value given for key"))
    ));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn given_raw_and_string_keys_when_dump_then_only_raw_is_written() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let payload = [7u8, 8, 9, 10];

    let mut store = BinStore::new();
    store.set_raw("payload", payload.to_vec());
    store.set_string("label", "hi");
    store.save(&path).unwrap();

    // Dump writes side files into the working directory.
    std::env::set_current_dir(dir.path()).unwrap();

    let (result, out) = invoke(&[&path, "dump"]);
    assert!(result.is_ok());
    assert!(out.contains("WRITING:  (raw)    \"payload\" (4 bytes) -> FILE: \"payload.bin\""));
    assert!(out.contains("IGNORING: (string) \"label\"."));

    assert_eq!(std::fs::read(dir.path().join("payload.bin")).unwrap(), payload);
    assert!(!dir.path().join("label.bin").exists());
}

#[test]
fn given_unmodified_store_when_listed_twice_then_output_is_identical() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    invoke(&[&path, "set", "-f", "ratio", "0.5", "-s", "tag", "x"])
        .0
        .unwrap();

    let (_, first) = invoke(&[&path, "list"]);
    let (_, second) = invoke(&[&path, "list"]);
    assert_eq!(first, second);
}

#[test]
fn given_non_numeric_int_token_when_set_then_value_defaults_to_zero() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    invoke(&[&path, "set", "-i", "count", "not-a-number"])
        .0
        .unwrap();

    let store = BinStore::load(&path).unwrap();
    assert_eq!(store.get_key("count").unwrap().value, Value::Int(0));
}

#[test]
fn given_help_flag_anywhere_when_run_then_usage_is_printed() {
    let (result, out) = invoke(&["whatever.db", "list", "--help"]);
    assert!(result.is_ok());
    assert!(out.contains("Usage:"));
}

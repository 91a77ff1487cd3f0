// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn line_roundtrip_preserves_order() {
    let mut record = Record::new();
    record.insert("msg", "hello");
    record.insert("level", 30);
    record.insert("zebra", true);
    record.insert("apple", 1);

    let line = record.to_line().unwrap();
    assert!(!line.contains('\n'));

    let back = Record::from_line(&line).unwrap();
    assert_eq!(back, record);

    let keys: Vec<&String> = back.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["msg", "level", "zebra", "apple"]);
}

#[test]
fn message_and_level_accessors() {
    let mut record = Record::new();
    record.insert("msg", "boom");
    record.insert("level", 50);
    assert_eq!(record.message(), Some("boom"));
    assert_eq!(record.level(), LogLevel::Error);
}

#[test]
fn level_defaults_to_info() {
    let record = Record::new();
    assert_eq!(record.level(), LogLevel::Info);

    let mut odd = Record::new();
    odd.insert("level", "not a number");
    assert_eq!(odd.level(), LogLevel::Info);
}

#[test]
fn out_of_range_level_clamps() {
    let mut record = Record::new();
    record.insert("level", 100_000);
    assert_eq!(record.level(), LogLevel::Fatal);
}

#[test]
fn nested_values_survive() {
    let mut record = Record::new();
    record.insert("msg", "nested");
    record.insert("ctx", serde_json::json!({"a": [1, 2, 3], "b": {"c": null}}));

    let back = Record::from_line(&record.to_line().unwrap()).unwrap();
    assert_eq!(back.get("ctx"), record.get("ctx"));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{Store, StoreError};

#[test]
fn migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.db");

    // Opening twice re-runs migrate() against the same file
    drop(Store::open(&path).unwrap());
    let store = Store::open(&path).unwrap();

    let version = store
        .with_conn(|conn| {
            conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
                .map_err(StoreError::Sqlite)
        })
        .unwrap();
    assert_eq!(version, 1);
}

#[test]
fn all_expected_tables_exist() {
    let store = Store::open_in_memory().unwrap();
    let tables = store
        .with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            )?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::Sqlite)
        })
        .unwrap();

    for expected in [
        "agent_activity",
        "artifacts",
        "checkpoints",
        "decisions",
        "error_log",
        "findings",
        "messages",
        "sessions",
        "tasks",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
    }
}

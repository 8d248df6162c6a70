// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migrations, tracked via `PRAGMA user_version`.

use crate::store::StoreResult;
use rusqlite::Connection;

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: r#"
CREATE TABLE sessions (
    id            TEXT PRIMARY KEY,
    workflow_type TEXT NOT NULL,
    goal          TEXT NOT NULL,
    status        TEXT NOT NULL,
    config        TEXT NOT NULL DEFAULT '{}',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE messages (
    id                TEXT PRIMARY KEY,
    session_id        TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    sender            TEXT NOT NULL,
    recipient         TEXT NOT NULL,
    kind              TEXT NOT NULL,
    priority          TEXT NOT NULL,
    subject           TEXT NOT NULL,
    body              TEXT NOT NULL DEFAULT '',
    artifacts         TEXT,
    metadata          TEXT,
    thread_id         TEXT,
    requires_response INTEGER NOT NULL DEFAULT 0,
    deadline          TEXT,
    routed            INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL
);
CREATE INDEX idx_messages_session ON messages(session_id);
CREATE INDEX idx_messages_session_created ON messages(session_id, created_at);

CREATE TABLE findings (
    id         TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    agent      TEXT NOT NULL,
    claim      TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 0,
    sources    TEXT,
    verified   INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX idx_findings_session ON findings(session_id);

CREATE TABLE artifacts (
    id            TEXT PRIMARY KEY,
    session_id    TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    agent         TEXT NOT NULL,
    path          TEXT NOT NULL,
    kind          TEXT NOT NULL,
    description   TEXT,
    review_status TEXT NOT NULL DEFAULT 'pending',
    created_at    TEXT NOT NULL
);
CREATE INDEX idx_artifacts_session ON artifacts(session_id);

CREATE TABLE decisions (
    id           TEXT PRIMARY KEY,
    session_id   TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    agent        TEXT NOT NULL,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    rationale    TEXT NOT NULL DEFAULT '',
    alternatives TEXT,
    created_at   TEXT NOT NULL
);
CREATE INDEX idx_decisions_session ON decisions(session_id);

CREATE TABLE tasks (
    id          TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    assigned_to TEXT,
    title       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status      TEXT NOT NULL DEFAULT 'pending',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX idx_tasks_session ON tasks(session_id);

CREATE TABLE checkpoints (
    id         TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    stage      TEXT NOT NULL,
    state      TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX idx_checkpoints_session ON checkpoints(session_id);

CREATE TABLE error_log (
    id          TEXT PRIMARY KEY,
    session_id  TEXT REFERENCES sessions(id) ON DELETE CASCADE,
    code        TEXT NOT NULL,
    category    TEXT NOT NULL,
    severity    TEXT NOT NULL,
    recoverable INTEGER NOT NULL,
    retryable   INTEGER NOT NULL,
    component   TEXT NOT NULL,
    message     TEXT NOT NULL,
    context     TEXT,
    recovered   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);
CREATE INDEX idx_errors_session ON error_log(session_id);
CREATE INDEX idx_errors_session_created ON error_log(session_id, created_at);

CREATE TABLE agent_activity (
    session_id         TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    role               TEXT NOT NULL,
    status             TEXT NOT NULL,
    messages_processed INTEGER NOT NULL DEFAULT 0,
    last_activity_at   TEXT NOT NULL,
    PRIMARY KEY (session_id, role)
);
"#,
}];

/// Apply any migrations newer than the database's `user_version`.
pub(crate) fn migrate(conn: &Connection) -> StoreResult<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        conn.execute_batch(migration.sql)?;
        conn.pragma_update(None, "user_version", migration.version)?;
        tracing::debug!(version = migration.version, "applied schema migration");
    }
    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

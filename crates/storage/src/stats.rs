// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate counts for one session.

use crate::store::{Store, StoreResult};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swarm_core::SessionId;

/// total + one distinguished sub-count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CountBucket {
    pub total: u64,
    pub matching: u64,
}

/// Aggregated session statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionStats {
    /// matching = verified
    pub findings: CountBucket,
    /// matching = approved
    pub artifacts: CountBucket,
    /// matching = complete
    pub tasks: CountBucket,
    pub messages_total: u64,
    pub messages_by_type: BTreeMap<String, u64>,
    pub errors_total: u64,
    pub errors_by_severity: BTreeMap<String, u64>,
}

impl Store {
    pub fn session_stats(&self, session_id: &SessionId) -> StoreResult<SessionStats> {
        self.with_conn(|conn| {
            let id = session_id.as_str();
            let findings = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(verified), 0) FROM findings WHERE session_id = ?1",
                params![id],
                |row| {
                    Ok(CountBucket {
                        total: row.get::<_, i64>(0)? as u64,
                        matching: row.get::<_, i64>(1)? as u64,
                    })
                },
            )?;
            let artifacts = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN review_status = 'approved' THEN 1 ELSE 0 END), 0)
                 FROM artifacts WHERE session_id = ?1",
                params![id],
                |row| {
                    Ok(CountBucket {
                        total: row.get::<_, i64>(0)? as u64,
                        matching: row.get::<_, i64>(1)? as u64,
                    })
                },
            )?;
            let tasks = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN status = 'complete' THEN 1 ELSE 0 END), 0)
                 FROM tasks WHERE session_id = ?1",
                params![id],
                |row| {
                    Ok(CountBucket {
                        total: row.get::<_, i64>(0)? as u64,
                        matching: row.get::<_, i64>(1)? as u64,
                    })
                },
            )?;

            let mut messages_by_type = BTreeMap::new();
            let mut messages_total = 0u64;
            {
                let mut stmt = conn.prepare(
                    "SELECT kind, COUNT(*) FROM messages WHERE session_id = ?1 GROUP BY kind",
                )?;
                let rows = stmt.query_map(params![id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
                })?;
                for row in rows {
                    let (kind, count) = row?;
                    messages_total += count;
                    messages_by_type.insert(kind, count);
                }
            }

            let mut errors_by_severity = BTreeMap::new();
            let mut errors_total = 0u64;
            {
                let mut stmt = conn.prepare(
                    "SELECT severity, COUNT(*) FROM error_log WHERE session_id = ?1 GROUP BY severity",
                )?;
                let rows = stmt.query_map(params![id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
                })?;
                for row in rows {
                    let (severity, count) = row?;
                    errors_total += count;
                    errors_by_severity.insert(severity, count);
                }
            }

            Ok(SessionStats {
                findings,
                artifacts,
                tasks,
                messages_total,
                messages_by_type,
                errors_total,
                errors_by_severity,
            })
        })
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session agent activity rows, upserted by the monitor.

use crate::store::{ts_from_sql, ts_to_sql, Store, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use swarm_core::{AgentStatus, Role, SessionId};

/// One agent's activity snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentActivity {
    pub session_id: SessionId,
    pub role: Role,
    pub status: AgentStatus,
    pub messages_processed: u64,
    pub last_activity_at: DateTime<Utc>,
}

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<Option<AgentActivity>> {
    let role_raw: String = row.get("role")?;
    let status_raw: String = row.get("status")?;
    let last_activity: String = row.get("last_activity_at")?;
    let Ok(role) = Role::parse(&role_raw) else {
        return Ok(None);
    };
    let status: AgentStatus =
        match serde_json::from_value(serde_json::Value::String(status_raw.clone())) {
            Ok(status) => status,
            Err(_) => return Ok(None),
        };
    Ok(Some(AgentActivity {
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        role,
        status,
        messages_processed: row.get::<_, i64>("messages_processed")? as u64,
        last_activity_at: ts_from_sql(&last_activity),
    }))
}

impl Store {
    pub fn upsert_agent_activity(&self, activity: &AgentActivity) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO agent_activity (session_id, role, status, messages_processed, last_activity_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (session_id, role) DO UPDATE SET
                   status = excluded.status,
                   messages_processed = excluded.messages_processed,
                   last_activity_at = excluded.last_activity_at",
                params![
                    activity.session_id.as_str(),
                    activity.role.as_str(),
                    activity.status.as_str(),
                    activity.messages_processed as i64,
                    ts_to_sql(activity.last_activity_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Activity rows for a session in role order.
    pub fn session_activity(&self, session_id: &SessionId) -> StoreResult<Vec<AgentActivity>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM agent_activity WHERE session_id = ?1 ORDER BY role ASC",
            )?;
            let rows = stmt.query_map(params![session_id.as_str()], row_to_activity)?;
            let mut out = Vec::new();
            for row in rows {
                if let Some(activity) = row? {
                    out.push(activity);
                }
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;

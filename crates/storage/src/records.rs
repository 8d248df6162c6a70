// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Findings, artifacts, decisions, and tasks: append-only creates with
//! per-id gets and per-session queries.

use crate::store::{json_or_default, ts_from_sql, ts_to_sql, Store, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use swarm_core::{
    Artifact, DecisionRecord, Finding, ReviewStatus, Role, SessionId, TaskItem, TaskStatus,
};

fn parse_role(raw: &str, table: &str) -> Role {
    Role::parse(raw).unwrap_or_else(|_| {
        tracing::warn!(raw, table, "unknown role in record, attributing to orchestrator");
        Role::Orchestrator
    })
}

fn row_to_finding(row: &Row<'_>) -> rusqlite::Result<Finding> {
    let agent: String = row.get("agent")?;
    let sources: Option<String> = row.get("sources")?;
    let created_at: String = row.get("created_at")?;
    Ok(Finding {
        id: row.get("id")?,
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        agent: parse_role(&agent, "findings"),
        claim: row.get("claim")?,
        confidence: row.get("confidence")?,
        sources: json_or_default(sources, "findings.sources"),
        verified: row.get::<_, i64>("verified")? != 0,
        created_at: ts_from_sql(&created_at),
    })
}

fn row_to_artifact(row: &Row<'_>) -> rusqlite::Result<Artifact> {
    let agent: String = row.get("agent")?;
    let review_status: String = row.get("review_status")?;
    let created_at: String = row.get("created_at")?;
    Ok(Artifact {
        id: row.get("id")?,
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        agent: parse_role(&agent, "artifacts"),
        path: row.get("path")?,
        kind: row.get("kind")?,
        description: row.get("description")?,
        review_status: ReviewStatus::parse(&review_status).unwrap_or_default(),
        created_at: ts_from_sql(&created_at),
    })
}

fn row_to_decision(row: &Row<'_>) -> rusqlite::Result<DecisionRecord> {
    let agent: String = row.get("agent")?;
    let alternatives: Option<String> = row.get("alternatives")?;
    let created_at: String = row.get("created_at")?;
    Ok(DecisionRecord {
        id: row.get("id")?,
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        agent: parse_role(&agent, "decisions"),
        title: row.get("title")?,
        description: row.get("description")?,
        rationale: row.get("rationale")?,
        alternatives: json_or_default(alternatives, "decisions.alternatives"),
        created_at: ts_from_sql(&created_at),
    })
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<TaskItem> {
    let assigned_to: Option<String> = row.get("assigned_to")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(TaskItem {
        id: row.get("id")?,
        session_id: SessionId::new(row.get::<_, String>("session_id")?),
        assigned_to: assigned_to.as_deref().and_then(|s| Role::parse(s).ok()),
        title: row.get("title")?,
        description: row.get("description")?,
        status: TaskStatus::parse(&status).unwrap_or_default(),
        created_at: ts_from_sql(&created_at),
        updated_at: ts_from_sql(&updated_at),
    })
}

impl Store {
    pub fn create_finding(&self, finding: &Finding) -> StoreResult<()> {
        let sources = serde_json::to_string(&finding.sources).ok();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO findings (id, session_id, agent, claim, confidence, sources, verified, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    finding.id,
                    finding.session_id.as_str(),
                    finding.agent.as_str(),
                    finding.claim,
                    finding.confidence,
                    sources,
                    finding.verified as i64,
                    ts_to_sql(finding.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_finding(&self, id: &str) -> StoreResult<Finding> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM findings WHERE id = ?1",
                params![id],
                row_to_finding,
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("finding", id),
                other => StoreError::Sqlite(other),
            })
        })
    }

    pub fn session_findings(&self, session_id: &SessionId) -> StoreResult<Vec<Finding>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM findings WHERE session_id = ?1 ORDER BY created_at ASC")?;
            let rows = stmt.query_map(params![session_id.as_str()], row_to_finding)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn create_artifact(&self, artifact: &Artifact) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO artifacts (id, session_id, agent, path, kind, description, review_status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    artifact.id,
                    artifact.session_id.as_str(),
                    artifact.agent.as_str(),
                    artifact.path,
                    artifact.kind,
                    artifact.description,
                    artifact.review_status.as_str(),
                    ts_to_sql(artifact.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_artifact(&self, id: &str) -> StoreResult<Artifact> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM artifacts WHERE id = ?1",
                params![id],
                row_to_artifact,
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("artifact", id),
                other => StoreError::Sqlite(other),
            })
        })
    }

    pub fn session_artifacts(&self, session_id: &SessionId) -> StoreResult<Vec<Artifact>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM artifacts WHERE session_id = ?1 ORDER BY created_at ASC")?;
            let rows = stmt.query_map(params![session_id.as_str()], row_to_artifact)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn update_artifact_review_status(
        &self,
        id: &str,
        status: ReviewStatus,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE artifacts SET review_status = ?2 WHERE id = ?1",
                params![id, status.as_str()],
            )?;
            if affected == 0 {
                return Err(StoreError::not_found("artifact", id));
            }
            Ok(())
        })
    }

    pub fn create_decision(&self, decision: &DecisionRecord) -> StoreResult<()> {
        let alternatives = serde_json::to_string(&decision.alternatives).ok();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO decisions (id, session_id, agent, title, description, rationale, alternatives, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    decision.id,
                    decision.session_id.as_str(),
                    decision.agent.as_str(),
                    decision.title,
                    decision.description,
                    decision.rationale,
                    alternatives,
                    ts_to_sql(decision.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_decision(&self, id: &str) -> StoreResult<DecisionRecord> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM decisions WHERE id = ?1",
                params![id],
                row_to_decision,
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("decision", id),
                other => StoreError::Sqlite(other),
            })
        })
    }

    pub fn session_decisions(&self, session_id: &SessionId) -> StoreResult<Vec<DecisionRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM decisions WHERE session_id = ?1 ORDER BY created_at ASC")?;
            let rows = stmt.query_map(params![session_id.as_str()], row_to_decision)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn create_task(&self, task: &TaskItem) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, session_id, assigned_to, title, description, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    task.id,
                    task.session_id.as_str(),
                    task.assigned_to.map(|r| r.as_str()),
                    task.title,
                    task.description,
                    task.status.as_str(),
                    ts_to_sql(task.created_at),
                    ts_to_sql(task.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_task(&self, id: &str) -> StoreResult<TaskItem> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM tasks WHERE id = ?1", params![id], row_to_task)
                .map_err(|err| match err {
                    rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("task", id),
                    other => StoreError::Sqlite(other),
                })
        })
    }

    pub fn session_tasks(&self, session_id: &SessionId) -> StoreResult<Vec<TaskItem>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM tasks WHERE session_id = ?1 ORDER BY created_at ASC")?;
            let rows = stmt.query_map(params![session_id.as_str()], row_to_task)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn update_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, status.as_str(), ts_to_sql(now)],
            )?;
            if affected == 0 {
                return Err(StoreError::not_found("task", id));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;

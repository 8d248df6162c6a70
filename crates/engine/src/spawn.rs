// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent spawn with retry.

use crate::orchestrator::Orchestrator;
use std::path::PathBuf;
use swarm_adapters::{PaneGateway, PaneOptions, WorktreeGateway};
use swarm_core::{
    AgentStatus, ErrorCode, ManagedAgent, OrchestratorEvent, Role, SwarmError, SwarmResult,
};
use swarm_recovery::retry_with_backoff;
use swarm_storage::AgentActivity;

/// Spawn one agent: create a pane, start the worker, wait for readiness.
///
/// Retries per the agent-spawn retry config; each failed attempt tears
/// down its pane before backing off. When the readiness indicator never
/// shows, the agent is declared ready with a warning rather than failed,
/// since pattern detection over captured output is heuristic.
pub(crate) async fn spawn_agent<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    tmux_session: &str,
    role: Role,
    worktree: PathBuf,
) -> SwarmResult<()> {
    let config = &orchestrator.config;
    let session_id = {
        let st = orchestrator.state.lock();
        st.session.as_ref().map(|s| s.id.clone())
    };

    let pane_id = retry_with_backoff(
        &config.retry.agent_spawn,
        "agent spawn",
        |attempt| {
            let panes = orchestrator.panes.clone();
            let worktree = worktree.clone();
            let command = config.worker_command.clone();
            let ready_timeout = config.agent_ready_timeout();
            let tmux_session = tmux_session.to_string();
            async move {
                tracing::debug!(role = %role, attempt, "spawning agent");
                let pane_id = panes
                    .create_pane(
                        &tmux_session,
                        &PaneOptions {
                            title: Some(role.as_str().to_string()),
                            cwd: Some(worktree.clone()),
                        },
                    )
                    .await
                    .map_err(SwarmError::from)?;

                let started = async {
                    panes
                        .start_worker(&pane_id, &command, None)
                        .await
                        .map_err(SwarmError::from)?;
                    let ready = panes
                        .wait_for_prompt(&pane_id, ready_timeout)
                        .await
                        .map_err(SwarmError::from)?;
                    if !ready {
                        tracing::warn!(
                            role = %role,
                            pane_id = %pane_id,
                            "no readiness indicator before timeout, declaring ready"
                        );
                    }
                    Ok::<(), SwarmError>(())
                }
                .await;

                match started {
                    Ok(()) => Ok(pane_id),
                    Err(err) => {
                        // Tear down the half-started pane before retrying
                        let _ = panes.kill_pane(&pane_id).await;
                        Err(err)
                    }
                }
            }
        },
    )
    .await
    .map_err(|err| {
        SwarmError::new(
            ErrorCode::AgentSpawnFailed,
            "spawn",
            format!("spawning {role}: {}", err.message),
        )
        .with_context("role", role.as_str())
    })?;

    let now = orchestrator.now();
    let mut agent = ManagedAgent::new(role, pane_id.clone(), worktree, now);
    agent.status = AgentStatus::Ready;
    {
        let mut st = orchestrator.state.lock();
        st.agents.insert(role, agent.clone());
    }
    if let Some(session_id) = session_id {
        if let Err(err) = orchestrator.store.upsert_agent_activity(&AgentActivity {
            session_id: session_id.clone(),
            role,
            status: AgentStatus::Ready,
            messages_processed: 0,
            last_activity_at: now,
        }) {
            tracing::warn!(%err, "failed to record agent activity");
        }
        orchestrator.events.emit(&OrchestratorEvent::AgentSpawned {
            session_id,
            role,
            pane_id,
        });
    }
    tracing::info!(role = %role, "agent ready");
    Ok(())
}

/// Restart a worker in its existing pane, preserving the worktree.
pub(crate) async fn restart_worker<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    role: Role,
    pane_id: &str,
) -> SwarmResult<()> {
    let panes = &orchestrator.panes;
    // Interrupt whatever is wedged, then relaunch
    panes.send_interrupt(pane_id).await.map_err(SwarmError::from)?;
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    panes
        .start_worker(pane_id, &orchestrator.config.worker_command, None)
        .await
        .map_err(SwarmError::from)?;
    let ready = panes
        .wait_for_prompt(pane_id, std::time::Duration::from_secs(5))
        .await
        .map_err(SwarmError::from)?;
    if !ready {
        tracing::warn!(role = %role, "restarted worker shows no readiness indicator");
    }
    Ok(())
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;

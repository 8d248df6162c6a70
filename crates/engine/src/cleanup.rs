// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource teardown.
//!
//! Every step is individually wrapped: one agent refusing to die must
//! not leave the next agent, the session, or the worktrees behind.

use crate::orchestrator::Orchestrator;
use std::time::Duration;
use swarm_adapters::{PaneGateway, RemoveOptions, WorktreeGateway};
use swarm_core::{AgentStatus, Role, SessionId};

/// How long to wait after the first interrupt before checking for a
/// prompt.
const INTERRUPT_GRACE: Duration = Duration::from_secs(1);

/// Tear down panes, the multiplexer session, worktrees, and (when
/// clearing queues) the mailboxes.
pub(crate) async fn cleanup_resources<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
    clear_queues: bool,
) {
    // Cancel only: this may run on the monitor task itself, so awaiting
    // the monitor handle here would deadlock.
    orchestrator.cancel_monitor();

    let agents: Vec<(Role, String)> = {
        let st = orchestrator.state.lock();
        st.agents
            .iter()
            .map(|(role, agent)| (*role, agent.pane_id.clone()))
            .collect()
    };

    for (role, pane_id) in &agents {
        terminate_agent(orchestrator, *role, pane_id).await;
        let mut st = orchestrator.state.lock();
        if let Some(agent) = st.agents.get_mut(role) {
            agent.status = AgentStatus::Terminated;
        }
    }

    // Session kill is idempotent; a dead session is a success
    if let Err(err) = orchestrator.panes.kill_session(session_id.as_str()).await {
        tracing::warn!(%err, "failed to kill multiplexer session");
    }

    if let Err(err) = orchestrator
        .worktrees
        .remove_all(&RemoveOptions {
            force: true,
            delete_branches: true,
        })
        .await
    {
        tracing::warn!(%err, "failed to remove worktrees");
    }

    if clear_queues {
        if let Err(err) = orchestrator.bus.clear_all() {
            tracing::warn!(%err, "failed to clear mailboxes");
        }
    }

    orchestrator.state.lock().reset();
    tracing::info!(session_id = %session_id, "resources cleaned up");
}

/// Gracefully stop one worker: interrupt, wait for a prompt, interrupt
/// again if needed, then kill the pane.
async fn terminate_agent<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    role: Role,
    pane_id: &str,
) {
    let panes = &orchestrator.panes;

    if let Err(err) = panes.send_interrupt(pane_id).await {
        tracing::debug!(role = %role, %err, "interrupt failed, pane likely gone");
    } else {
        tokio::time::sleep(INTERRUPT_GRACE).await;
        match panes.wait_for_prompt(pane_id, Duration::from_secs(2)).await {
            Ok(true) => {}
            Ok(false) => {
                // Still busy after one interrupt; hit it again
                if let Err(err) = panes.send_interrupt(pane_id).await {
                    tracing::debug!(role = %role, %err, "second interrupt failed");
                }
            }
            Err(err) => {
                tracing::debug!(role = %role, %err, "prompt check failed during teardown");
            }
        }
    }

    if let Err(err) = panes.kill_pane(pane_id).await {
        tracing::warn!(role = %role, %err, "failed to kill pane");
    }
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;

//! Per-connection lifecycle state.

use crate::error::session::SessionError;

use common::ErrorLocation;

use std::collections::BTreeSet;
use std::panic::Location;

/// Connection lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    AwaitingServerInfo,
    Active,
    Closed,
}

/// Session phase plus message-id bookkeeping.
///
/// Ids start at 1 and are handed out strictly increasing, in send order,
/// for the lifetime of the connection.
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
    next_message_id: u32,
    pending_requests: BTreeSet<u32>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Connecting,
            next_message_id: 1,
            pending_requests: BTreeSet::new(),
        }
    }

    /// State whose next issued id is `next_message_id`.
    #[cfg(test)]
    pub(crate) fn starting_at(next_message_id: u32) -> Self {
        Self {
            next_message_id,
            ..Self::new()
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Id the next outbound message will carry.
    pub fn next_message_id(&self) -> u32 {
        self.next_message_id
    }

    /// Ids still waiting for a correlated `ServerInfo`, `Ok` or `Error`.
    pub fn pending_requests(&self) -> &BTreeSet<u32> {
        &self.pending_requests
    }

    /// Hand out the next id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IdsExhausted`] once the counter would pass
    /// `u32::MAX`. The connection has to be replaced at that point.
    #[track_caller]
    pub(crate) fn issue_id(&mut self) -> Result<u32, SessionError> {
        let id = self.next_message_id;
        self.next_message_id = id
            .checked_add(1)
            .ok_or_else(|| SessionError::IdsExhausted {
                location: ErrorLocation::from(Location::caller()),
            })?;
        Ok(id)
    }

    pub(crate) fn track(&mut self, id: u32) {
        self.pending_requests.insert(id);
    }

    /// Clear a pending id. Returns whether it was being tracked.
    pub(crate) fn resolve(&mut self, id: u32) -> bool {
        self.pending_requests.remove(&id)
    }

    /// Move to `phase`. Leaving `Closed` is refused; returns whether the
    /// phase changed.
    pub(crate) fn transition(&mut self, phase: SessionPhase) -> bool {
        if self.phase == SessionPhase::Closed || self.phase == phase {
            return false;
        }
        self.phase = phase;
        if phase == SessionPhase::Closed {
            self.pending_requests.clear();
        }
        true
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

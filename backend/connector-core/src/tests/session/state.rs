use crate::error::session::SessionError;
use crate::session::{SessionPhase, SessionState};

#[test]
fn given_new_state_when_ids_issued_then_start_at_one_and_increase() {
    let mut state = SessionState::new();

    let ids: Vec<u32> = (0..4).map(|_| state.issue_id().unwrap()).collect();

    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(state.next_message_id(), 5);
}

/// **VALUE**: Nothing leaves `Closed`.
///
/// **BUG THIS CATCHES**: Would catch a transition that lets a late
/// `ServerInfo` resurrect a closed session.
#[test]
fn given_closed_state_when_transition_requested_then_phase_stays_closed() {
    // GIVEN: A closed state
    let mut state = SessionState::new();
    assert!(state.transition(SessionPhase::Closed));

    // WHEN: Trying to move anywhere else
    let moved = state.transition(SessionPhase::Active);

    // THEN: Refused
    assert!(!moved);
    assert_eq!(state.phase(), SessionPhase::Closed);
}

#[test]
fn given_tracked_id_when_resolved_then_removed_from_pending() {
    let mut state = SessionState::new();
    let id = state.issue_id().unwrap();
    state.track(id);

    assert!(state.pending_requests().contains(&id));
    assert!(state.resolve(id));
    assert!(!state.resolve(id), "Second resolve should report nothing pending");
    assert!(state.pending_requests().is_empty());
}

#[test]
fn given_pending_requests_when_closed_then_pending_set_cleared() {
    let mut state = SessionState::new();
    let id = state.issue_id().unwrap();
    state.track(id);

    state.transition(SessionPhase::Closed);

    assert!(state.pending_requests().is_empty());
}

/// **VALUE**: Running out of ids is an error, not an overflow panic.
///
/// **BUG THIS CATCHES**: Would catch an unchecked `+= 1` that panics in
/// debug builds or wraps back to a reused id in release builds.
#[test]
fn given_last_id_issued_when_another_requested_then_ids_exhausted() {
    // GIVEN: A counter one short of the top of the range
    let mut state = SessionState::starting_at(u32::MAX - 1);

    // WHEN: Issuing twice
    let last = state.issue_id();
    let exhausted = state.issue_id();

    // THEN: The first succeeds, the second reports exhaustion without moving the counter
    assert_eq!(last.unwrap(), u32::MAX - 1);
    assert!(matches!(exhausted, Err(SessionError::IdsExhausted { .. })));
    assert_eq!(state.next_message_id(), u32::MAX);
}

use connector_core::error::session::SessionError;
use connector_core::session::{Session, SessionPhase};

/// **VALUE**: Verifies that `begin_handshake` reports the caller's location.
///
/// **BUG THIS CATCHES**: Would catch if someone removes `#[track_caller]`
/// from `Session::begin_handshake`, which would point every misuse at the
/// session module instead of the code that made the bad call.
#[test]
fn given_second_handshake_when_formatted_then_points_at_caller() {
    // GIVEN: A session that already sent its handshake
    let mut session = Session::new("Location Test");
    session.begin_handshake().unwrap();

    // WHEN: Asking for a second one
    let err = session.begin_handshake().unwrap_err();

    // THEN: The error names the phase and this file
    assert!(matches!(
        err,
        SessionError::InvalidTransition {
            phase: SessionPhase::AwaitingServerInfo,
            ..
        }
    ));
    let error_string = err.to_string();
    assert!(error_string.contains("Invalid Transition Error"));
    assert!(error_string.contains("AwaitingServerInfo"));
    assert!(error_string.contains("session.rs"));
}

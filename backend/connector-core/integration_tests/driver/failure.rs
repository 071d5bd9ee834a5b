//! Connect failures and misuse.

use crate::helpers::{
    TEST_TIMEOUT, accept, accept_and_refuse, bind, close, intiface_config, receive_json,
};

use connector_core::connection::{ConnectionDriver, DriverExit};
use connector_core::error::CoreError;
use connector_core::error::connection::ConnectionError;
use connector_core::session::SessionPhase;

/// **VALUE**: A server that will not speak `buttplug-json` is a connect failure.
///
/// **BUG THIS CATCHES**: Would catch a client that proceeds without the
/// sub-protocol and then waits forever for a `ServerInfo` that never comes.
#[tokio::test]
async fn given_server_refuses_subprotocol_when_driver_runs_then_connect_error() {
    // GIVEN: A server that rejects the upgrade
    let (listener, port) = bind().await;
    let server = tokio::spawn(async move { accept_and_refuse(&listener).await });

    // WHEN: Running the driver
    let mut driver = ConnectionDriver::new(&intiface_config(port)).unwrap();
    let result = tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::pending()))
        .await
        .expect("Driver did not finish");
    server.await.unwrap();

    // THEN: Connect error, session closed
    assert!(matches!(
        result,
        Err(CoreError::Connection(ConnectionError::Connect { .. }))
    ));
    assert_eq!(driver.session().phase(), SessionPhase::Closed);
}

#[tokio::test]
async fn given_nothing_listening_when_driver_runs_then_connect_error() {
    // GIVEN: A port that was free a moment ago
    let (listener, port) = bind().await;
    drop(listener);

    let mut driver = ConnectionDriver::new(&intiface_config(port)).unwrap();
    let result = tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::pending()))
        .await
        .expect("Driver did not finish");

    assert!(matches!(
        result,
        Err(CoreError::Connection(ConnectionError::Connect { .. }))
    ));
    assert!(driver.session().is_closed());
}

/// **VALUE**: A session belongs to one connection; reconnecting needs a new driver.
#[tokio::test]
async fn given_finished_driver_when_run_again_then_session_error() {
    // GIVEN: A driver whose first run ended
    let (listener, port) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let _handshake = receive_json(&mut ws).await;
        close(&mut ws).await;
    });
    let mut driver = ConnectionDriver::new(&intiface_config(port)).unwrap();
    let first = tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::pending()))
        .await
        .expect("Driver did not finish");
    server.await.unwrap();
    assert!(matches!(first, Ok(DriverExit::PeerClosed)));

    // WHEN: Running it again
    let second = driver.run(std::future::pending()).await;

    // THEN: Refused without touching the network
    assert!(matches!(second, Err(CoreError::Session(_))));
}

#[tokio::test]
async fn given_shutdown_already_resolved_when_driver_runs_then_cancelled_without_connecting() {
    let (_listener, port) = bind().await;
    let mut driver = ConnectionDriver::new(&intiface_config(port)).unwrap();

    let exit = tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::ready(())))
        .await
        .expect("Driver did not finish")
        .unwrap();

    assert_eq!(exit, DriverExit::Cancelled);
    assert!(driver.session().is_closed());
}

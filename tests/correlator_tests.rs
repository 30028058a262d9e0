use std::sync::Arc;

use battleship_agent::{CorrelationError, CorrelationId, OracleResponse, ResponseCorrelator};
use tokio::time::{sleep, Duration};

fn reply(id: u64, content: &str) -> OracleResponse {
    OracleResponse::reply(CorrelationId(id), content.to_string(), "generate")
}

#[tokio::test(start_paused = true)]
async fn matching_notification_resolves_the_wait() {
    let correlator = Arc::new(ResponseCorrelator::new());
    let id = correlator.next_id();
    let pending = correlator.register(id, Duration::from_secs(60)).unwrap();

    assert!(correlator.dispatch(reply(id.0, "|PLACE|3|")));
    let response = pending.wait().await.unwrap();
    assert_eq!(response.content, "|PLACE|3|");
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn non_matching_notification_is_ignored() {
    let correlator = Arc::new(ResponseCorrelator::new());
    let id = correlator.next_id();
    let pending = correlator.register(id, Duration::from_secs(60)).unwrap();

    assert!(!correlator.dispatch(reply(id.0 + 1, "not yours")));
    assert!(correlator.is_pending(id));

    let waiter = tokio::spawn(pending.wait());
    sleep(Duration::from_secs(1)).await;
    assert!(!waiter.is_finished());
    assert!(correlator.dispatch(reply(id.0, "yours")));
    assert_eq!(waiter.await.unwrap().unwrap().content, "yours");
}

#[tokio::test(start_paused = true)]
async fn timeout_deregisters_the_listener() {
    let correlator = Arc::new(ResponseCorrelator::new());
    let id = correlator.next_id();

    let err = correlator
        .await_response(id, Duration::from_millis(60_000))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CorrelationError::Timeout {
            id,
            after: Duration::from_millis(60_000)
        }
    );
    assert!(!correlator.is_pending(id));
    assert!(!correlator.dispatch(reply(id.0, "too late")));
}

#[tokio::test(start_paused = true)]
async fn first_notification_wins() {
    let correlator = Arc::new(ResponseCorrelator::new());
    let id = correlator.next_id();
    let pending = correlator.register(id, Duration::from_secs(5)).unwrap();

    assert!(correlator.dispatch(reply(id.0, "first")));
    assert!(!correlator.dispatch(reply(id.0, "second")));
    assert_eq!(pending.wait().await.unwrap().content, "first");
}

#[tokio::test(start_paused = true)]
async fn failure_notification_ends_the_wait_early() {
    let correlator = Arc::new(ResponseCorrelator::new());
    let id = correlator.next_id();
    let pending = correlator.register(id, Duration::from_secs(60)).unwrap();
    let started = tokio::time::Instant::now();
    let waiter = tokio::spawn(pending.wait());

    sleep(Duration::from_millis(20)).await;
    assert!(correlator.dispatch(OracleResponse::failed(
        id,
        "connection refused".to_string(),
        "generate"
    )));
    let err = waiter.await.unwrap().unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(
        err,
        CorrelationError::Failed {
            id,
            cause: "connection refused".to_string()
        }
    );
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_wait_is_deregistered() {
    let correlator = Arc::new(ResponseCorrelator::new());
    let id = correlator.next_id();
    let pending = correlator.register(id, Duration::from_secs(5)).unwrap();
    assert_eq!(correlator.pending_count(), 1);
    drop(pending);
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_registration_is_refused() {
    let correlator = Arc::new(ResponseCorrelator::new());
    let id = correlator.next_id();
    let _pending = correlator.register(id, Duration::from_secs(5)).unwrap();
    assert!(matches!(
        correlator.register(id, Duration::from_secs(5)),
        Err(CorrelationError::DuplicateId { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn concurrent_correlations_are_independent() {
    let correlator = Arc::new(ResponseCorrelator::new());
    let ids: Vec<CorrelationId> = (0..8).map(|_| correlator.next_id()).collect();
    let mut waiters = Vec::new();
    for &id in &ids {
        let pending = correlator.register(id, Duration::from_secs(30)).unwrap();
        waiters.push(tokio::spawn(pending.wait()));
    }

    for &id in ids.iter().rev().step_by(2) {
        correlator.dispatch(reply(id.0, &format!("answer {}", id)));
    }
    sleep(Duration::from_secs(31)).await;

    for (i, waiter) in waiters.into_iter().enumerate() {
        let id = ids[i];
        let result = waiter.await.unwrap();
        if (ids.len() - 1 - i) % 2 == 0 {
            assert_eq!(result.unwrap().content, format!("answer {}", id));
        } else {
            assert!(matches!(result, Err(CorrelationError::Timeout { id: t, .. }) if t == id));
        }
    }
    assert_eq!(correlator.pending_count(), 0);
}

#[test]
fn ids_are_unique() {
    let correlator = ResponseCorrelator::new();
    let a = correlator.next_id();
    let b = correlator.next_id();
    assert_ne!(a, b);
}

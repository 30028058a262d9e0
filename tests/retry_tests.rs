use std::sync::atomic::{AtomicU32, Ordering};

use battleship_agent::{AgentConfig, AgentError, RetryPolicy};
use tokio::time::{Duration, Instant};

#[tokio::test(start_paused = true)]
async fn fails_twice_then_succeeds() {
    let policy = RetryPolicy::default();
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let outcome = policy
        .submit("update_odds", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(format!("congested on attempt {attempt}"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(
        outcome.delays,
        vec![Duration::from_millis(1_000), Duration::from_millis(2_000)]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(start.elapsed() >= Duration::from_millis(3_000));
    assert_eq!(outcome.into_result(), Ok(3));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_three_attempts() {
    let policy = RetryPolicy::default();
    let calls = AtomicU32::new(0);

    let outcome = policy
        .submit("update_odds", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("still congested") }
        })
        .await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3, "no fourth attempt");
    assert_eq!(outcome.delays.len(), 2, "no sleep after the last attempt");
    assert_eq!(outcome.last_error.as_deref(), Some("still congested"));
    assert_eq!(
        outcome.into_result(),
        Err(AgentError::TransientSubmissionFailure {
            operation: "update_odds",
            attempts: 3,
            last_error: "still congested".to_string(),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn first_success_needs_no_delay() {
    let start = Instant::now();
    let outcome = RetryPolicy::default()
        .submit("fire_shot", |_| async { Ok::<_, String>("receipt") })
        .await;
    assert_eq!(outcome.attempts, 1);
    assert!(outcome.delays.is_empty());
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[test]
fn backoff_is_linear_and_configurable() {
    let config = AgentConfig {
        max_retries: 5,
        retry_base_delay_ms: 250,
        ..AgentConfig::default()
    };
    let policy = RetryPolicy::from_config(&config);
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay_after(1), Duration::from_millis(250));
    assert_eq!(policy.delay_after(4), Duration::from_millis(1_000));
}

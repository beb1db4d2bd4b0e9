// ABOUTME: Integration tests for the provisioning retry policy.
// ABOUTME: Only 404/no-response retries; everything else surfaces immediately.

use caravel::api::{ApiError, RetryPolicy, with_retry};
use caravel::cancel::cancel_pair;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

fn http_error(status: u16, body: &str) -> ApiError {
    ApiError::Http {
        url: "http://backend/sandbox/clusters/sb-1".to_string(),
        status,
        body: body.to_string(),
    }
}

#[tokio::test]
async fn retries_404_up_to_max_attempts_then_surfaces_last_error() {
    let (_handle, mut cancel) = cancel_pair();
    let calls = AtomicU32::new(0);

    let result = with_retry(&fast_policy(3), &mut cancel, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(http_error(404, "still provisioning")) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let err = result.unwrap_err();
    let ApiError::Http { status, body, .. } = &err else {
        panic!("expected the last response error, got {err:?}");
    };
    assert_eq!(*status, 404);
    assert_eq!(body, "still provisioning", "error body surfaced verbatim");
}

#[tokio::test]
async fn a_single_500_surfaces_immediately_without_retry() {
    let (_handle, mut cancel) = cancel_pair();
    let calls = AtomicU32::new(0);

    let result = with_retry(&fast_policy(5), &mut cancel, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(http_error(500, "boom")) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result.unwrap_err(), ApiError::Http { status: 500, .. }));
}

#[tokio::test]
async fn succeeds_once_the_resource_materializes() {
    let (_handle, mut cancel) = cancel_pair();
    let calls = AtomicU32::new(0);

    let result = with_retry(&fast_policy(5), &mut cancel, || {
        let attempt = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt < 2 {
                Err(http_error(404, "not yet"))
            } else {
                Ok(42u32)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_other_than_404_do_not_retry() {
    let (_handle, mut cancel) = cancel_pair();
    let calls = AtomicU32::new(0);

    let result = with_retry(&fast_policy(5), &mut cancel, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(http_error(400, "bad request")) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(result.is_err());
}

#[tokio::test]
async fn cancellation_aborts_before_the_first_attempt() {
    let (handle, mut cancel) = cancel_pair();
    handle.cancel();
    let calls = AtomicU32::new(0);

    let result = with_retry(&fast_policy(5), &mut cancel, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, ApiError>(1u32) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(matches!(result.unwrap_err(), ApiError::Cancelled));
}

#[tokio::test]
async fn cancellation_during_backoff_aborts_the_retry_loop() {
    let (handle, mut cancel) = cancel_pair();
    let calls = AtomicU32::new(0);

    let policy = RetryPolicy {
        max_attempts: 10,
        initial_backoff: Duration::from_millis(50),
        max_backoff: Duration::from_millis(50),
    };

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
    });

    let result = with_retry(&policy, &mut cancel, || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(http_error(404, "not yet")) }
    })
    .await;

    assert!(matches!(result.unwrap_err(), ApiError::Cancelled));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "cancelled during the first backoff");
}

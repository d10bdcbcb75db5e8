use super::*;
use crate::clock::ManualClock;
use std::cell::Cell;

fn manual_limiter(max_requests: u32, window_ms: u64) -> (RateLimiter<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let limiter = RateLimiter::with_clock(
        RateLimitConfig::from_millis(max_requests, window_ms),
        clock.clone(),
    )
    .unwrap();
    (limiter, clock)
}

fn stored(limiter: &RateLimiter<ManualClock>) -> usize {
    limiter.timestamps.lock().unwrap().len()
}

#[test]
fn test_new_rejects_zero_max_requests() {
    let err = RateLimiter::new(0, 1_000).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { ref field, .. } if field == "max_requests"));
}

#[test]
fn test_new_rejects_zero_window() {
    let err = RateLimiter::new(5, 0).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { ref field, .. } if field == "window_ms"));
}

#[test]
fn test_new_exposes_configuration() {
    let limiter = RateLimiter::new(3, 250).unwrap();
    assert_eq!(limiter.max_requests(), 3);
    assert_eq!(limiter.window(), Duration::from_millis(250));
    assert_eq!(limiter.config(), &RateLimitConfig::from_millis(3, 250));
    assert!(limiter.can_proceed());
}

#[test]
fn test_allows_until_limit_then_denies() {
    let (limiter, clock) = manual_limiter(3, 1_000);

    for _ in 0..3 {
        assert!(limiter.can_proceed());
        limiter.record();
        clock.advance_millis(10);
    }

    assert!(!limiter.can_proceed());
    assert!(!limiter.can_proceed());
}

#[test]
fn test_can_proceed_does_not_record() {
    let (limiter, _clock) = manual_limiter(1, 1_000);

    for _ in 0..5 {
        assert!(limiter.can_proceed());
    }
    assert_eq!(limiter.usage(), (0, 1));
}

#[test]
fn test_two_per_second_scenario() {
    let (limiter, clock) = manual_limiter(2, 1_000);

    limiter.record();
    limiter.record();
    assert!(!limiter.can_proceed());

    clock.advance_millis(1_001);
    assert!(limiter.can_proceed());
}

#[test]
fn test_entry_expires_exactly_at_window_edge() {
    let (limiter, clock) = manual_limiter(1, 1_000);

    limiter.record();
    clock.advance_millis(999);
    assert!(!limiter.can_proceed());

    clock.advance_millis(1);
    assert!(limiter.can_proceed());
}

#[test]
fn test_partial_expiry_is_sliding() {
    let (limiter, clock) = manual_limiter(2, 1_000);

    limiter.record();
    clock.advance_millis(500);
    limiter.record();
    assert!(!limiter.can_proceed());

    // First entry is now 1001ms old, second is 501ms old.
    clock.advance_millis(501);
    assert!(limiter.can_proceed());
    assert_eq!(limiter.usage(), (1, 2));

    limiter.record();
    assert!(!limiter.can_proceed());

    // Second entry expires at 1500ms after start.
    clock.advance_millis(499);
    assert!(limiter.can_proceed());
    assert_eq!(limiter.usage(), (1, 2));
}

#[test]
fn test_execute_returns_result_and_runs_once() {
    let (limiter, _clock) = manual_limiter(2, 1_000);
    let calls = Cell::new(0);

    let value = limiter
        .execute(|| {
            calls.set(calls.get() + 1);
            "done"
        })
        .unwrap();

    assert_eq!(value, "done");
    assert_eq!(calls.get(), 1);
    assert_eq!(limiter.usage(), (1, 2));
}

#[test]
fn test_execute_denied_does_not_invoke() {
    let (limiter, clock) = manual_limiter(1, 1_000);
    limiter.record();
    clock.advance_millis(400);

    let calls = Cell::new(0);
    let result = limiter.execute(|| {
        calls.set(calls.get() + 1);
        "x"
    });

    assert_eq!(
        result,
        Err(Error::RateLimitExceeded {
            retry_after: Duration::from_millis(600)
        })
    );
    assert_eq!(calls.get(), 0);
    assert_eq!(limiter.usage(), (1, 1));
}

#[test]
fn test_failed_operation_keeps_its_slot() {
    let (limiter, _clock) = manual_limiter(1, 1_000);

    let outcome: Result<std::result::Result<(), &str>> = limiter.execute(|| Err("upstream 500"));
    assert_eq!(outcome, Ok(Err("upstream 500")));

    assert!(!limiter.can_proceed());
}

#[test]
fn test_try_acquire() {
    let (limiter, clock) = manual_limiter(2, 100);

    assert!(limiter.try_acquire());
    assert!(limiter.try_acquire());
    assert!(!limiter.try_acquire());
    assert_eq!(limiter.usage(), (2, 2));

    clock.advance_millis(100);
    assert!(limiter.try_acquire());
}

#[test]
fn test_reset_clears_state() {
    let (limiter, _clock) = manual_limiter(2, 60_000);

    limiter.record();
    limiter.record();
    assert!(!limiter.can_proceed());

    limiter.reset();

    assert!(limiter.can_proceed());
    assert_eq!(limiter.usage(), (0, 2));
    assert_eq!(limiter.max_requests(), 2);
    assert_eq!(limiter.window(), Duration::from_secs(60));
}

#[test]
fn test_status_snapshot() {
    let (limiter, clock) = manual_limiter(3, 1_000);

    let status = limiter.status();
    assert!(status.allowed);
    assert_eq!(status.current, 0);
    assert_eq!(status.remaining, 3);
    assert_eq!(status.retry_after, Duration::ZERO);

    limiter.record();
    clock.advance_millis(200);
    limiter.record();
    clock.advance_millis(200);
    limiter.record();

    let status = limiter.status();
    assert!(!status.allowed);
    assert_eq!(status.current, 3);
    assert_eq!(status.limit, 3);
    assert_eq!(status.remaining, 0);
    // Oldest entry is 400ms old.
    assert_eq!(status.retry_after, Duration::from_millis(600));
}

#[test]
fn test_retry_after_accounts_for_overflowing_records() {
    let (limiter, clock) = manual_limiter(1, 1_000);

    limiter.record();
    clock.advance_millis(300);
    limiter.record();

    // Both entries must expire before a slot opens.
    assert_eq!(limiter.time_until_available(), Duration::from_millis(1_000));

    clock.advance_millis(700);
    assert_eq!(limiter.time_until_available(), Duration::from_millis(300));
    assert!(!limiter.can_proceed());

    clock.advance_millis(300);
    assert_eq!(limiter.time_until_available(), Duration::ZERO);
    assert!(limiter.can_proceed());
}

#[test]
fn test_storage_is_bounded_by_one_window() {
    let (limiter, clock) = manual_limiter(5, 100);

    for _ in 0..1_000 {
        limiter.try_acquire();
        clock.advance_millis(7);
        assert!(stored(&limiter) <= 5);
    }
}

#[test]
fn test_record_prunes_expired_entries() {
    let (limiter, clock) = manual_limiter(10, 100);

    for _ in 0..4 {
        limiter.record();
    }
    assert_eq!(stored(&limiter), 4);

    clock.advance_millis(150);
    limiter.record();
    assert_eq!(stored(&limiter), 1);
}

#[tokio::test]
async fn test_execute_async() {
    let (limiter, _clock) = manual_limiter(1, 1_000);

    let value = limiter.execute_async(|| async { 7 }).await.unwrap();
    assert_eq!(value, 7);

    let ran = Cell::new(false);
    let denied = limiter
        .execute_async(|| async {
            ran.set(true);
            8
        })
        .await;
    assert!(matches!(denied, Err(Error::RateLimitExceeded { .. })));
    assert!(!ran.get());
}

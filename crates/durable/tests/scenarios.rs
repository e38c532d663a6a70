//! End-to-end scenarios from spec.md §8, driven through the public
//! `Client`/`Worker` surface against the in-memory store and a deterministic
//! clock — in the style of the teacher's
//! `tests/postgres_integration_test.rs`: one `#[tokio::test]` per scenario,
//! asserting on store state after driving the engine rather than guessing
//! at timing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dura::clock::testing::FakeClock;
use dura::prelude::*;

fn store_and_clock() -> (Arc<dyn PersistenceStore>, Arc<FakeClock>) {
    (
        Arc::new(InMemoryStore::new()),
        Arc::new(FakeClock::new(chrono::Utc::now())),
    )
}

/// S1 — happy path: two steps, both succeed, workflow finishes.
#[tokio::test]
async fn s1_happy_path() {
    let (store, clock) = store_and_clock();
    let clock: SharedClock = clock;

    let mut registry = HandlerRegistry::new();
    registry.register("h", |ctx, input| async move {
        let a = ctx.step("a", || async { Ok(serde_json::json!(10)) }).await?;
        let b = ctx.step("b", || async { Ok(serde_json::json!(20)) }).await?;
        let _ = input;
        Ok(serde_json::json!({"a": a, "b": b}))
    });

    let client = Client::new(store.clone(), clock.clone());
    assert!(client.start("W", "h", serde_json::json!(42)).await.unwrap());

    let worker = Worker::new(
        store.clone(),
        clock,
        registry,
        EngineConfig::default().with_poll_interval(Duration::ZERO),
    );
    let mut ticks = 0;
    worker.poll(|| { ticks += 1; ticks > 1 }).await;

    assert_eq!(
        store.find_status("W").await.unwrap(),
        Some(WorkflowStatus::Finished)
    );
    assert_eq!(store.find_output("W", "a").await.unwrap(), Some(serde_json::json!(10)));
    assert_eq!(store.find_output("W", "b").await.unwrap(), Some(serde_json::json!(20)));
}

/// S2 — crash between steps: a second `run` call re-enters the handler,
/// skips the already-recorded step, and runs the remaining one fresh.
#[tokio::test]
async fn s2_crash_between_steps_resumes_without_replaying_recorded_step() {
    let (store, clock) = store_and_clock();
    let clock: SharedClock = clock;
    let config = EngineConfig::default();

    store.insert("W", "h", serde_json::json!(null)).await.unwrap();

    let a_calls = Arc::new(AtomicU32::new(0));
    store.claim(clock.now(), clock.now()).await.unwrap();
    {
        let a_calls = a_calls.clone();
        let mut registry = HandlerRegistry::new();
        registry.register("h", move |ctx, _input| {
            let a_calls = a_calls.clone();
            async move {
                ctx.step("a", || {
                    let a_calls = a_calls.clone();
                    async move {
                        a_calls.fetch_add(1, Ordering::SeqCst);
                        Ok(serde_json::json!(10))
                    }
                })
                .await?;
                Err(HandlerError::new("crashed before step b").into())
            }
        });
        dura::engine::run("W", &store, &clock, &registry, &config)
            .await
            .unwrap();
    }
    assert_eq!(
        store.find_status("W").await.unwrap(),
        Some(WorkflowStatus::Failed)
    );

    // A different worker claims after the lease expires.
    store
        .claim(clock.now(), clock.now() + chrono::Duration::hours(1))
        .await
        .unwrap();
    {
        let a_calls = a_calls.clone();
        let mut registry = HandlerRegistry::new();
        registry.register("h", move |ctx, _input| {
            let a_calls = a_calls.clone();
            async move {
                let a = ctx
                    .step("a", || {
                        let a_calls = a_calls.clone();
                        async move {
                            a_calls.fetch_add(1, Ordering::SeqCst);
                            Ok(serde_json::json!(10))
                        }
                    })
                    .await?;
                let b = ctx.step("b", || async { Ok(serde_json::json!(20)) }).await?;
                Ok(serde_json::json!({"a": a, "b": b}))
            }
        });
        dura::engine::run("W", &store, &clock, &registry, &config)
            .await
            .unwrap();
    }

    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.find_status("W").await.unwrap(),
        Some(WorkflowStatus::Finished)
    );
    assert_eq!(store.find_output("W", "a").await.unwrap(), Some(serde_json::json!(10)));
    assert_eq!(store.find_output("W", "b").await.unwrap(), Some(serde_json::json!(20)));
}

/// S3 — retry to abort: a handler that always fails is retried once, then
/// aborted once failures reaches `maxFailures`, and is never re-claimed.
#[tokio::test]
async fn s3_retry_then_abort() {
    let (store, clock) = store_and_clock();
    let clock: SharedClock = clock;
    let config = EngineConfig::default().with_max_failures(2);

    store.insert("W", "h", serde_json::json!(null)).await.unwrap();

    let mut registry = HandlerRegistry::new();
    registry.register("h", |_ctx, _input| async { Err(HandlerError::new("boom").into()) });

    store.claim(clock.now(), clock.now()).await.unwrap();
    dura::engine::run("W", &store, &clock, &registry, &config)
        .await
        .unwrap();
    assert_eq!(
        store.find_status("W").await.unwrap(),
        Some(WorkflowStatus::Failed)
    );

    store
        .claim(clock.now(), clock.now() + chrono::Duration::hours(1))
        .await
        .unwrap();
    dura::engine::run("W", &store, &clock, &registry, &config)
        .await
        .unwrap();
    assert_eq!(
        store.find_status("W").await.unwrap(),
        Some(WorkflowStatus::Aborted)
    );

    // Never re-claimed thereafter, no matter how stale its lease looks.
    let far_future = clock.now() + chrono::Duration::days(365);
    assert_eq!(store.claim(far_future, far_future).await.unwrap(), None);
}

/// S4 — durable sleep: the nap is recorded before the wait, so a worker
/// that "restarts" after the wake-up instant has passed returns from
/// `sleep` immediately instead of waiting out the full duration again.
#[tokio::test]
async fn s4_durable_sleep_survives_restart() {
    let (store, clock) = store_and_clock();
    let clock: SharedClock = clock.clone();
    let config = EngineConfig::default();

    store.insert("W", "h", serde_json::json!(null)).await.unwrap();
    store.claim(clock.now(), clock.now()).await.unwrap();

    // First attempt: records the nap, then the process "crashes" before the
    // delay resolves (we never await ctx.sleep to completion here).
    store
        .update_wake_up_at(
            "W",
            "n",
            clock.now() + chrono::Duration::seconds(10),
            clock.now() + config.timeout_interval + chrono::Duration::seconds(10),
        )
        .await
        .unwrap();

    // Wall-clock advances past the wake-up instant while the worker is down.
    let clock = Arc::new(FakeClock::new(clock.now() + chrono::Duration::seconds(11)));
    let clock: SharedClock = clock;

    let done_calls = Arc::new(AtomicU32::new(0));
    let mut registry = HandlerRegistry::new();
    let done_calls_clone = done_calls.clone();
    registry.register("h", move |ctx, _input| {
        let done_calls = done_calls_clone.clone();
        async move {
            ctx.sleep("n", Duration::from_secs(10)).await?;
            ctx.step("done", || {
                let done_calls = done_calls.clone();
                async move {
                    done_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(serde_json::json!(true))
                }
            })
            .await
        }
    });

    store
        .claim(clock.now(), clock.now() + chrono::Duration::hours(1))
        .await
        .unwrap();
    dura::engine::run("W", &store, &clock, &registry, &config)
        .await
        .unwrap();

    assert_eq!(done_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.find_status("W").await.unwrap(),
        Some(WorkflowStatus::Finished)
    );
}

/// S5 — duplicate start: the second `start` for an existing id returns
/// `false` and leaves the original record untouched.
#[tokio::test]
async fn s5_duplicate_start_is_rejected() {
    let (store, clock) = store_and_clock();
    let client = Client::new(store.clone(), clock as SharedClock);

    assert!(client.start("W", "h", serde_json::json!(1)).await.unwrap());
    assert!(!client.start("W", "h2", serde_json::json!(2)).await.unwrap());

    let data = store.find_run_data("W").await.unwrap().unwrap();
    assert_eq!(data.handler, "h");
    assert_eq!(data.input, serde_json::json!(1));
}

/// S6 — wait polling: `wait` returns the first matching status it observes,
/// having polled no more than the requested budget.
#[tokio::test]
async fn s6_wait_polls_until_match_or_budget_exhausted() {
    let (store, clock) = store_and_clock();
    let clock: SharedClock = clock;
    store.insert("W", "h", serde_json::json!(null)).await.unwrap();

    let client = Client::new(store.clone(), clock);
    let statuses: HashSet<_> = [WorkflowStatus::Finished, WorkflowStatus::Aborted]
        .into_iter()
        .collect();

    // Nothing matches yet (still idle) and the budget is exhausted quickly.
    let result = client
        .wait("W", &statuses, 1, Duration::from_millis(0))
        .await
        .unwrap();
    assert_eq!(result, None);

    store.set_as_finished("W").await.unwrap();
    let result = client
        .wait("W", &statuses, 1, Duration::from_millis(0))
        .await
        .unwrap();
    assert_eq!(result, Some(WorkflowStatus::Finished));
}

/// Boundary: `wait` with a zero-attempt budget returns `None` without
/// touching the store.
#[tokio::test]
async fn wait_with_zero_times_returns_none_immediately() {
    let (store, clock) = store_and_clock();
    let client = Client::new(store, clock as SharedClock);
    let statuses: HashSet<_> = [WorkflowStatus::Finished].into_iter().collect();

    let result = client
        .wait("anything", &statuses, 0, Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(result, None);
}

/// Boundary: `claim` against an empty store returns `None`.
#[tokio::test]
async fn claim_on_empty_store_returns_none() {
    let (store, clock) = store_and_clock();
    assert_eq!(store.claim(clock.now(), clock.now()).await.unwrap(), None);
}

//! Integration tests for running the built-in suite

mod common;

use std::time::Duration;

use common::{StaticConnector, offline_provider, online_provider};
use mock_provider::{EndpointCandidates, MockProvider, SelectionPolicy};
use nexus_harness::{
    EventCollector, HarnessError, RunSummary, Test, TestCategory, TestContext, TestEvent,
    TestSuite, build_wallet_suite, run_tests, start_suite, start_wallet_suite,
};
use tokio::sync::mpsc;

const TIMEOUT: Duration = Duration::from_secs(5);

fn drain(rx: &mut mpsc::Receiver<TestEvent>) -> Vec<TestEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =============================================================================
// Built-in suite
// =============================================================================

/// Test that every built-in test passes against a healthy endpoint
#[tokio::test]
async fn test_wallet_suite_passes_online() {
    let ctx = TestContext::new(online_provider());
    let suite = build_wallet_suite();
    let (tx, mut rx) = mpsc::channel(256);

    let results = run_tests(&ctx, &suite, None, TIMEOUT, &tx).await;

    let failures: Vec<_> = results.iter().filter(|r| r.is_failure()).collect();
    assert!(failures.is_empty(), "failures: {failures:#?}");
    assert_eq!(results.len(), suite.len());

    let events = drain(&mut rx);
    assert!(matches!(events.first(), Some(TestEvent::TestStarted { .. })));
    match events.last() {
        Some(TestEvent::SuiteComplete { passed, failed, skipped }) => {
            assert_eq!((*passed, *failed, *skipped), (suite.len(), 0, 0));
        }
        other => panic!("unexpected last event: {other:?}"),
    }
}

/// Test that a degraded provider skips network tests and still runs local ones
#[tokio::test]
async fn test_wallet_suite_degraded() {
    let candidates = EndpointCandidates::new(["http://a", "http://b"]);
    let connector = StaticConnector::down();
    let provider =
        MockProvider::connect(&candidates, connector.as_ref(), SelectionPolicy::Degraded)
            .await
            .unwrap();
    assert!(provider.is_degraded());

    let ctx = TestContext::new(provider);
    let (tx, _rx) = mpsc::channel(256);
    let results = run_tests(&ctx, &build_wallet_suite(), None, TIMEOUT, &tx).await;

    let skipped: Vec<&str> =
        results.iter().filter(|r| r.skipped).map(|r| r.name.as_str()).collect();
    assert_eq!(skipped, vec!["block_number_passthrough"]);
    let summary = RunSummary::from_results(&results);
    assert_eq!(summary.failed, 0, "{results:#?}");
}

/// Test that an unreachable, non-degraded endpoint stops the run after setup
#[tokio::test]
async fn test_connection_check_failure() {
    let ctx = TestContext::new(offline_provider());
    let (tx, mut rx) = mpsc::channel(256);

    let results = run_tests(&ctx, &build_wallet_suite(), None, TIMEOUT, &tx).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].qualified_name(), "setup/connection");
    assert!(results[0].is_failure());
    assert!(results[0].error.as_deref().unwrap_or_default().contains("http://offline is down"));

    let events = drain(&mut rx);
    assert!(matches!(events.last(), Some(TestEvent::SuiteComplete { failed: 1, .. })));
}

/// Test that filters select tests by name or category
#[tokio::test]
async fn test_filter_limits_tests() {
    let ctx = TestContext::new(online_provider());
    let suite = build_wallet_suite();
    let (tx, _rx) = mpsc::channel(256);

    let typed = run_tests(&ctx, &suite, Some("typed_data_*"), TIMEOUT, &tx).await;
    let names: Vec<&str> = typed.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["typed_data_structured", "typed_data_malformed_fallback"]);

    let wallet = run_tests(&ctx, &suite, Some("wallet/*"), TIMEOUT, &tx).await;
    assert!(wallet.iter().all(|r| r.category == "wallet"));
    assert!(!wallet.is_empty());
}

/// Test that the spawned suite reports through its handle
#[tokio::test]
async fn test_start_wallet_suite() {
    let ctx = TestContext::new(online_provider());
    let mut handle = start_wallet_suite(ctx, Some("switch".to_string()), TIMEOUT);

    let results = handle.results.await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].passed);

    let events = drain(&mut handle.event_rx);
    assert_eq!(events.len(), 3);
}

// =============================================================================
// Timeouts and failures
// =============================================================================

/// Test that a hanging test fails with a timeout and the run continues
#[tokio::test]
async fn test_per_test_timeout() {
    let suite = TestSuite {
        categories: vec![TestCategory {
            name: "slow".to_string(),
            description: None,
            tests: vec![
                Test {
                    name: "hangs".to_string(),
                    description: None,
                    run: Box::new(|_| {
                        Box::pin(async {
                            std::future::pending::<()>().await;
                            Ok::<(), eyre::Report>(())
                        })
                    }),
                    skip_if: None,
                },
                Test {
                    name: "fails".to_string(),
                    description: None,
                    run: Box::new(|_| {
                        Box::pin(async { Err::<(), _>(eyre::eyre!("expected failure")) })
                    }),
                    skip_if: None,
                },
                Test {
                    name: "skipped".to_string(),
                    description: None,
                    run: Box::new(|_| Box::pin(async { Ok::<(), eyre::Report>(()) })),
                    skip_if: Some(Box::new(|_| {
                        Box::pin(async { Some("not today".to_string()) })
                    })),
                },
            ],
        }],
    };
    let ctx = TestContext::new(online_provider());
    let (tx, _rx) = mpsc::channel(256);

    let results = run_tests(&ctx, &suite, None, Duration::from_millis(20), &tx).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].error.as_deref().unwrap_or_default().contains("timed out after 20ms"));
    assert_eq!(results[1].error.as_deref(), Some("expected failure"));
    assert!(results[2].skipped);
    assert_eq!(results[2].skip_reason.as_deref(), Some("not today"));
    assert_eq!(RunSummary::from_results(&results), RunSummary { passed: 0, failed: 2, skipped: 1 });
}

/// Test that a suite stuck past the global limit fails the test in flight
#[tokio::test]
async fn test_global_timeout_fails_running_test() {
    tokio::time::pause();
    let passing = |name: &str| Test {
        name: name.to_string(),
        description: None,
        run: Box::new(|_| Box::pin(async { Ok::<(), eyre::Report>(()) })),
        skip_if: None,
    };
    let suite = TestSuite {
        categories: vec![TestCategory {
            name: "stuck".to_string(),
            description: None,
            tests: vec![
                passing("finishes"),
                Test {
                    name: "hangs".to_string(),
                    description: None,
                    run: Box::new(|_| {
                        Box::pin(async {
                            std::future::pending::<()>().await;
                            Ok::<(), eyre::Report>(())
                        })
                    }),
                    skip_if: None,
                },
                passing("never_started"),
            ],
        }],
    };
    let ctx = TestContext::new(online_provider());
    let mut handle = start_suite(ctx, suite, None, Duration::from_secs(3600));
    let mut collector = EventCollector::new();
    let mut seen = 0;

    let err = handle
        .collect(&mut collector, Duration::from_secs(1), |_| seen += 1)
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::GlobalTimeout(d) if d == Duration::from_secs(11)));
    assert_eq!(seen, 3);
    let results = collector.into_results();
    assert_eq!(results.len(), 2);
    assert!(results[0].passed);
    assert_eq!(results[1].qualified_name(), "stuck/hangs");
    assert!(results[1].is_failure());
    assert!(results[1].error.as_deref().unwrap_or_default().contains("global timeout"));
    assert_eq!(RunSummary::from_results(&results).failed, 1);
    assert!(handle.results.await.unwrap_err().is_cancelled());
}

/// Test that collecting a suite that finishes in time keeps every result
#[tokio::test]
async fn test_collect_completed_suite() {
    let ctx = TestContext::new(online_provider());
    let mut handle = start_wallet_suite(ctx, Some("signing/".to_string()), TIMEOUT);
    let mut collector = EventCollector::new();

    handle.collect(&mut collector, TIMEOUT, |_| {}).await.unwrap();

    assert_eq!(collector.running(), None);
    assert_eq!(collector.results().len(), 4);
    assert!(collector.results().iter().all(|r| r.passed));
    assert_eq!(handle.results.await.unwrap(), collector.into_results());
}

//! Test runner with channel-based progress output.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::suite::{Test, TestContext, TestSuite};

/// Result of running a single test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Name of the test.
    pub name: String,
    /// Category the test belongs to.
    pub category: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Error message if the test failed.
    pub error: Option<String>,
    /// Whether the test was skipped.
    pub skipped: bool,
    /// Reason for skipping if applicable.
    pub skip_reason: Option<String>,
}

impl TestResult {
    fn new(category: &str, name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            passed: true,
            duration_ms: duration.as_millis() as u64,
            error: None,
            skipped: false,
            skip_reason: None,
        }
    }

    fn failed(category: &str, name: &str, duration: Duration, error: String) -> Self {
        Self { passed: false, error: Some(error), ..Self::new(category, name, duration) }
    }

    fn skipped(category: &str, name: &str, duration: Duration, reason: String) -> Self {
        Self { skipped: true, skip_reason: Some(reason), ..Self::new(category, name, duration) }
    }

    /// `category/name`
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    pub const fn is_failure(&self) -> bool {
        !self.passed && !self.skipped
    }

    /// Rebuilds the result carried by a finishing event.
    pub fn from_event(event: &TestEvent) -> Option<Self> {
        match event {
            TestEvent::TestPassed { category, name, duration } => {
                Some(Self::new(category, name, *duration))
            }
            TestEvent::TestFailed { category, name, duration, error } => {
                Some(Self::failed(category, name, *duration, error.clone()))
            }
            TestEvent::TestSkipped { category, name, reason } => {
                Some(Self::skipped(category, name, Duration::ZERO, reason.clone()))
            }
            TestEvent::TestStarted { .. } | TestEvent::SuiteComplete { .. } => None,
        }
    }
}

/// Pass/fail/skip counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            if result.skipped {
                summary.skipped += 1;
            } else if result.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            summary
        })
    }

    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Events emitted during test execution.
#[derive(Debug, Clone)]
pub enum TestEvent {
    /// A test is about to start.
    TestStarted { category: String, name: String },
    /// A test passed.
    TestPassed { category: String, name: String, duration: Duration },
    /// A test failed.
    TestFailed { category: String, name: String, duration: Duration, error: String },
    /// A test was skipped.
    TestSkipped { category: String, name: String, reason: String },
    /// The entire suite finished.
    SuiteComplete { passed: usize, failed: usize, skipped: usize },
}

impl TestEvent {
    fn finished(result: &TestResult) -> Self {
        let category = result.category.clone();
        let name = result.name.clone();
        let duration = Duration::from_millis(result.duration_ms);
        if result.skipped {
            let reason = result.skip_reason.clone().unwrap_or_default();
            Self::TestSkipped { category, name, reason }
        } else if result.passed {
            Self::TestPassed { category, name, duration }
        } else {
            let error = result.error.clone().unwrap_or_default();
            Self::TestFailed { category, name, duration, error }
        }
    }
}

/// Rebuilds results from a stream of [`TestEvent`]s, tracking the test in flight.
#[derive(Debug, Default)]
pub struct EventCollector {
    results: Vec<TestResult>,
    running: Option<(String, String, Instant)>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &TestEvent) {
        if let TestEvent::TestStarted { category, name } = event {
            self.running = Some((category.clone(), name.clone(), Instant::now()));
        } else if let Some(result) = TestResult::from_event(event) {
            self.running = None;
            self.results.push(result);
        }
    }

    /// Name of the test that started but has not finished.
    pub fn running(&self) -> Option<String> {
        self.running.as_ref().map(|(category, name, _)| format!("{category}/{name}"))
    }

    /// Records the test in flight, if any, as failed.
    pub fn fail_running(&mut self, reason: &str) {
        if let Some((category, name, started)) = self.running.take() {
            let result = TestResult::failed(&category, &name, started.elapsed(), reason.into());
            self.results.push(result);
        }
    }

    /// Records the test in flight, if any, as skipped.
    pub fn skip_running(&mut self, reason: &str) {
        if let Some((category, name, started)) = self.running.take() {
            let result = TestResult::skipped(&category, &name, started.elapsed(), reason.into());
            self.results.push(result);
        }
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TestResult> {
        self.results
    }
}

/// Runs every test matching `filter`, emitting events via the channel.
///
/// A send error only means nobody is listening; the run continues.
pub async fn run_tests(
    ctx: &TestContext,
    suite: &TestSuite,
    filter: Option<&str>,
    test_timeout: Duration,
    event_tx: &mpsc::Sender<TestEvent>,
) -> Vec<TestResult> {
    let mut results = Vec::with_capacity(suite.len());

    // Check connection first, unless selection already fell back to an unreachable endpoint.
    if ctx.provider.is_degraded() {
        warn!(url = ctx.provider.endpoint_url(), "Running against degraded endpoint");
    } else {
        let start = Instant::now();
        if let Err(e) = ctx.provider.get_block_number().await {
            let result = TestResult::failed("setup", "connection", start.elapsed(), e.to_string());
            let _ = event_tx.send(TestEvent::finished(&result)).await;
            results.push(result);
            let RunSummary { passed, failed, skipped } = RunSummary::from_results(&results);
            let _ = event_tx.send(TestEvent::SuiteComplete { passed, failed, skipped }).await;
            return results;
        }
    }

    for category in &suite.categories {
        let selected =
            category.tests.iter().filter(|t| matches_filter(&category.name, &t.name, filter));
        for test in selected {
            let _ = event_tx
                .send(TestEvent::TestStarted {
                    category: category.name.clone(),
                    name: test.name.clone(),
                })
                .await;

            let result = run_single_test(ctx, &category.name, test, test_timeout).await;
            let _ = event_tx.send(TestEvent::finished(&result)).await;
            results.push(result);
        }
    }

    let RunSummary { passed, failed, skipped } = RunSummary::from_results(&results);
    let _ = event_tx.send(TestEvent::SuiteComplete { passed, failed, skipped }).await;
    results
}

/// Run a single test.
async fn run_single_test(
    ctx: &TestContext,
    category: &str,
    test: &Test,
    test_timeout: Duration,
) -> TestResult {
    let start = Instant::now();

    if let Some(skip_fn) = &test.skip_if {
        if let Some(reason) = skip_fn(ctx).await {
            return TestResult::skipped(category, &test.name, start.elapsed(), reason);
        }
    }

    match tokio::time::timeout(test_timeout, (test.run)(ctx)).await {
        Ok(Ok(())) => TestResult::new(category, &test.name, start.elapsed()),
        Ok(Err(e)) => TestResult::failed(category, &test.name, start.elapsed(), format!("{e:#}")),
        Err(_) => TestResult::failed(
            category,
            &test.name,
            start.elapsed(),
            format!("Test timed out after {}", humantime::format_duration(test_timeout)),
        ),
    }
}

/// Matches `filter` against the test name or `category/name`.
///
/// Filters containing `*` are wildcard patterns over the whole string; others
/// match as substrings.
fn matches_filter(category: &str, name: &str, filter: Option<&str>) -> bool {
    let Some(pattern) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
        return true;
    };
    let qualified = format!("{category}/{name}");
    if pattern.contains('*') {
        wildcard_match(pattern, name) || wildcard_match(pattern, &qualified)
    } else {
        qualified.contains(pattern)
    }
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut segments: Vec<&str> = pattern.split('*').collect();
    let last = segments.pop().unwrap_or_default();
    let (first, middle) = match segments.split_first() {
        Some((first, middle)) => (*first, middle),
        None => return text == last,
    };

    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };
    for segment in middle.iter().filter(|s| !s.is_empty()) {
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

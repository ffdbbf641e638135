//! End-to-end test harness around the mock wallet provider.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod config;
pub use config::{HarnessConfig, Network};

mod error;
pub use error::{HarnessError, Result};

pub mod expect;

pub mod hooks;
pub use hooks::{
    AllowanceChoice, AllowanceDecision, AllowancePrompt, AllowanceSource, HookSpy, IntentDecision,
    IntentPrompt, auto_approve_allowance_hook, auto_approve_intent_hook,
};

pub mod report;
pub use report::ReportWriter;

mod runner;
pub use runner::{EventCollector, RunSummary, TestEvent, TestResult, run_tests};

pub mod session;
pub use session::{Sdk, SdkSession};

pub mod suite;
pub use suite::{SkipFn, Test, TestCategory, TestContext, TestFn, TestSuite, build_wallet_suite};

pub mod timeout;
pub use timeout::with_global_timeout;

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

/// Handle to a running suite.
#[derive(Debug)]
pub struct SuiteHandle {
    /// Progress events, ending with [`TestEvent::SuiteComplete`].
    pub event_rx: mpsc::Receiver<TestEvent>,
    /// Resolves to every result once the suite finishes.
    pub results: JoinHandle<Vec<TestResult>>,
}

impl SuiteHandle {
    /// Feeds every event to `on_event` and `collector` until the suite completes.
    ///
    /// When `global_timeout` (plus the teardown buffer) expires first, the test
    /// in flight is recorded as failed, the suite task is aborted and
    /// [`HarnessError::GlobalTimeout`] is returned.
    pub async fn collect(
        &mut self,
        collector: &mut EventCollector,
        global_timeout: Duration,
        mut on_event: impl FnMut(&TestEvent),
    ) -> Result<()> {
        let event_rx = &mut self.event_rx;
        let drain = async {
            while let Some(event) = event_rx.recv().await {
                on_event(&event);
                collector.observe(&event);
            }
        };

        let outcome = with_global_timeout(global_timeout, drain).await;
        if let Err(e) = &outcome {
            collector.fail_running(&e.to_string());
            self.results.abort();
        }
        outcome
    }
}

/// Spawns `suite` against `ctx`.
pub fn start_suite(
    ctx: TestContext,
    suite: TestSuite,
    filter: Option<String>,
    test_timeout: Duration,
) -> SuiteHandle {
    let (event_tx, event_rx) = mpsc::channel(256);

    let results = tokio::spawn(async move {
        run_tests(&ctx, &suite, filter.as_deref(), test_timeout, &event_tx).await
    });

    SuiteHandle { event_rx, results }
}

/// Spawns the built-in wallet suite against `ctx`.
pub fn start_wallet_suite(
    ctx: TestContext,
    filter: Option<String>,
    test_timeout: Duration,
) -> SuiteHandle {
    start_suite(ctx, build_wallet_suite(), filter, test_timeout)
}

//! Built-in wallet test suite.

use std::{future::Future, pin::Pin};

use eyre::Result;
use mock_provider::MockProvider;

mod signing;
mod wallet;

/// State every test runs against.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub provider: MockProvider,
}

impl TestContext {
    pub const fn new(provider: MockProvider) -> Self {
        Self { provider }
    }
}

/// Boxed future returned by test and skip functions.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Test body.
pub type TestFn = Box<dyn for<'a> Fn(&'a TestContext) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// Returns a reason when the test should be skipped.
pub type SkipFn =
    Box<dyn for<'a> Fn(&'a TestContext) -> BoxFuture<'a, Option<String>> + Send + Sync>;

/// A single named test.
pub struct Test {
    pub name: String,
    pub description: Option<String>,
    pub run: TestFn,
    pub skip_if: Option<SkipFn>,
}

impl std::fmt::Debug for Test {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("skippable", &self.skip_if.is_some())
            .finish()
    }
}

/// Group of related tests.
#[derive(Debug)]
pub struct TestCategory {
    pub name: String,
    pub description: Option<String>,
    pub tests: Vec<Test>,
}

#[derive(Debug, Default)]
pub struct TestSuite {
    pub categories: Vec<TestCategory>,
}

impl TestSuite {
    /// Total number of tests across all categories.
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.tests.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accounts, chain handling and signing checks against a [`MockProvider`].
pub fn build_wallet_suite() -> TestSuite {
    TestSuite { categories: vec![wallet::category(), signing::category()] }
}

/// Skips tests that need a live endpoint when none answered during selection.
pub(crate) fn skip_if_offline(ctx: &TestContext) -> Option<String> {
    ctx.provider
        .is_degraded()
        .then(|| format!("no RPC endpoint reachable (using {})", ctx.provider.endpoint_url()))
}

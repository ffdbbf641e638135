//! Recording hooks for SDK approval prompts.
//!
//! The SDK asks the wallet owner to approve intents and token allowances
//! through callbacks. Tests install hooks that decide immediately and keep
//! every prompt they were shown, so assertions can check whether and how often
//! the SDK asked.

use std::sync::{Arc, Mutex};

use alloy_primitives::U256;
use serde_json::Value;

/// Records the argument of every call.
#[derive(Debug)]
pub struct HookSpy<T> {
    calls: Mutex<Vec<T>>,
}

impl<T> Default for HookSpy<T> {
    fn default() -> Self {
        Self { calls: Mutex::new(Vec::new()) }
    }
}

impl<T: Clone> HookSpy<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, arg: &T) {
        self.lock().push(arg.clone());
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    pub fn called(&self) -> bool {
        self.call_count() > 0
    }

    pub fn calls(&self) -> Vec<T> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        // Recorded calls stay valid after a panicking test poisons the lock.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// An intent the SDK wants approved before execution.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentPrompt {
    pub intent: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentDecision {
    Allow,
    Deny,
}

/// One token allowance the SDK needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceSource {
    pub chain_id: u64,
    pub token: String,
    pub current: U256,
    pub required: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowancePrompt {
    pub sources: Vec<AllowanceSource>,
}

/// Amount to approve for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceChoice {
    /// Exactly what the operation needs.
    Min,
    /// Unlimited.
    Max,
    Exact(U256),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowanceDecision {
    /// One choice per requested source, in order.
    Allow(Vec<AllowanceChoice>),
    Deny,
}

pub type IntentHook = Arc<dyn Fn(&IntentPrompt) -> IntentDecision + Send + Sync>;
pub type AllowanceHook = Arc<dyn Fn(&AllowancePrompt) -> AllowanceDecision + Send + Sync>;

/// Approves every intent.
pub fn auto_approve_intent_hook() -> IntentHook {
    Arc::new(|_| IntentDecision::Allow)
}

/// Approves the minimum allowance for every requested source.
pub fn auto_approve_allowance_hook() -> AllowanceHook {
    Arc::new(|prompt| AllowanceDecision::Allow(vec![AllowanceChoice::Min; prompt.sources.len()]))
}

/// Wraps `hook` so every prompt is recorded in `spy` before deciding.
pub fn spy_intent_hook(spy: Arc<HookSpy<IntentPrompt>>, hook: IntentHook) -> IntentHook {
    Arc::new(move |prompt| {
        spy.record(prompt);
        hook(prompt)
    })
}

pub fn spy_allowance_hook(
    spy: Arc<HookSpy<AllowancePrompt>>,
    hook: AllowanceHook,
) -> AllowanceHook {
    Arc::new(move |prompt| {
        spy.record(prompt);
        hook(prompt)
    })
}

//! Harness configuration loaded from YAML, with environment overrides.

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use mock_provider::{
    DEFAULT_CHAIN_ID, EndpointCandidates, RPC_URL_ENV, SelectionPolicy, SigningIdentity,
};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// SDK network the session is created for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testnet => write!(f, "testnet"),
            Self::Mainnet => write!(f, "mainnet"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            _ => Err(format!("Unknown network: {s}. Use 'testnet' or 'mainnet'")),
        }
    }
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_test_timeout() -> String {
    "60s".to_string()
}

fn default_global_timeout() -> String {
    "180s".to_string()
}

fn default_probe_timeout() -> String {
    "10s".to_string()
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Preferred endpoint, tried before `rpc_urls` and the built-ins.
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    /// Replaces the deterministic test key.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Chain id reported before any switch.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub network: Network,
    /// Test name filter (`*` wildcards or substring).
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default = "default_test_timeout")]
    pub test_timeout: String,
    #[serde(default = "default_global_timeout")]
    pub global_timeout: String,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: String,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
    /// Fail instead of falling back to the last candidate when no endpoint answers.
    #[serde(default)]
    pub strict_endpoints: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            rpc_urls: Vec::new(),
            private_key: None,
            chain_id: default_chain_id(),
            network: Network::default(),
            filter: None,
            test_timeout: default_test_timeout(),
            global_timeout: default_global_timeout(),
            probe_timeout: default_probe_timeout(),
            reports_dir: default_reports_dir(),
            strict_endpoints: false,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|source| HarnessError::ConfigRead { path: path.clone(), source })?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Applies `TEST_RPC_URL` when it is set and non-empty.
    pub fn with_env(self) -> Self {
        self.with_rpc_override(std::env::var(RPC_URL_ENV).ok())
    }

    /// Replaces the preferred endpoint; blank values are ignored.
    pub fn with_rpc_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.rpc_url = Some(url);
        }
        self
    }

    /// Preferred endpoint, configured list, then the built-in endpoints.
    pub fn candidates(&self) -> EndpointCandidates {
        let mut candidates = EndpointCandidates::new(self.rpc_url.iter().chain(&self.rpc_urls));
        candidates.extend_defaults();
        candidates
    }

    pub const fn selection_policy(&self) -> SelectionPolicy {
        if self.strict_endpoints { SelectionPolicy::Strict } else { SelectionPolicy::Degraded }
    }

    pub fn identity(&self) -> Result<SigningIdentity> {
        match &self.private_key {
            Some(key) => Ok(SigningIdentity::from_hex(key)?),
            None => Ok(SigningIdentity::deterministic()),
        }
    }

    pub fn test_timeout(&self) -> Result<Duration> {
        parse_duration("test_timeout", &self.test_timeout)
    }

    /// Suite-wide limit, without the teardown buffer.
    pub fn global_timeout(&self) -> Result<Duration> {
        parse_duration("global_timeout", &self.global_timeout)
    }

    pub fn probe_timeout(&self) -> Result<Duration> {
        parse_duration("probe_timeout", &self.probe_timeout)
    }
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).map_err(|source| HarnessError::InvalidDuration {
        field,
        value: value.to_string(),
        source,
    })
}

//! The executor contract and its result types.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use depin_core::BundleRef;

/// Boxed future alias for compose command results.
pub type ComposeFuture<'a> = Pin<Box<dyn Future<Output = ComposeOutput> + Send + 'a>>;

/// Boxed future alias for availability probes.
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Outcome of a single compose invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeOutput {
    pub success: bool,
    /// Combined stdout and stderr, verbatim.
    pub output: String,
    /// Human-readable failure description, set when `success` is false.
    pub error: Option<String>,
}

impl ComposeOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }

    /// Failure detail, or an empty string on success.
    pub fn error_detail(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }
}

/// One container as reported by `compose ps --format json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContainerSummary {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Service")]
    pub service: String,
    #[serde(alias = "State")]
    pub state: String,
    #[serde(alias = "Status")]
    pub status: String,
}

impl ContainerSummary {
    /// Parse `ps --format json` output.
    ///
    /// Older compose releases print one JSON array; newer ones print one
    /// object per line. Both are accepted, unparseable lines are skipped.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed).unwrap_or_default();
        }
        trimmed
            .lines()
            .filter_map(|line| serde_json::from_str(line.trim()).ok())
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }
}

/// Lifecycle commands against a compose-style container runtime.
///
/// Implementations must never panic or return early on failure; every
/// outcome is a [`ComposeOutput`]. Project names handed in may be
/// unsanitized and must be sanitized before use.
pub trait ComposeRuntime: Send + Sync {
    /// Create and start every container of the bundle under `project`.
    fn up<'a>(&'a self, bundle: &'a BundleRef, project: &'a str) -> ComposeFuture<'a>;

    /// Halt the project's containers without removing them.
    fn stop<'a>(&'a self, bundle: &'a BundleRef, project: &'a str) -> ComposeFuture<'a>;

    /// Start a previously stopped project.
    fn start<'a>(&'a self, bundle: &'a BundleRef, project: &'a str) -> ComposeFuture<'a>;

    /// Stop and remove containers, networks and ephemeral volumes.
    fn down<'a>(&'a self, bundle: &'a BundleRef, project: &'a str) -> ComposeFuture<'a>;

    /// Last `tail` lines of combined container output.
    fn logs<'a>(&'a self, project: &'a str, tail: u32) -> ComposeFuture<'a>;

    /// Container listing for the project (JSON in `output`).
    fn ps<'a>(&'a self, project: &'a str) -> ComposeFuture<'a>;

    /// Whether the runtime and its compose subcommand respond.
    fn probe(&self) -> ProbeFuture<'_>;
}

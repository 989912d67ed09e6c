//! Scenario state for the batch run BDD tests.

use std::sync::Arc;
use std::time::Duration;

use prsweep::batch::test_support::{ScriptedTransport, ThreadFixture};
use prsweep::github::ThreadId;
use prsweep::{AppError, BatchConfig, BatchSummary, PlanOutcome, PullRequestLocator};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

use super::runtime::SharedRuntime;

/// Delay every scripted call takes unless overridden.
pub(crate) const CALL_DELAY: Duration = Duration::from_millis(10);

/// Scenario state for batch run tests.
#[derive(ScenarioState, Default)]
pub(crate) struct BatchState {
    pub(crate) runtime: Slot<SharedRuntime>,
    pub(crate) pending: Slot<PendingTransport>,
    pub(crate) transport: Slot<Arc<ScriptedTransport>>,
    pub(crate) config: Slot<BatchConfig>,
    pub(crate) threads: Slot<Vec<String>>,
    pub(crate) fixtures: Slot<Vec<ThreadFixture>>,
    pub(crate) summary: Slot<BatchSummary>,
    pub(crate) plan: Slot<PlanOutcome>,
    pub(crate) output: Slot<String>,
}

/// Transport still being scripted by `given` steps.
pub(crate) struct PendingTransport(pub(crate) ScriptedTransport);

impl Default for PendingTransport {
    fn default() -> Self {
        Self(ScriptedTransport::new(CALL_DELAY))
    }
}

impl BatchState {
    /// Applies `script` to the transport under construction.
    pub(crate) fn script(&self, script: impl FnOnce(ScriptedTransport) -> ScriptedTransport) {
        let pending = self.pending.take().unwrap_or_default();
        self.pending.set(PendingTransport(script(pending.0)));
    }

    /// Finishes scripting and returns the shared transport.
    pub(crate) fn transport(&self) -> Arc<ScriptedTransport> {
        if let Some(transport) = self.transport.get() {
            return transport;
        }
        let pending = self.pending.take().unwrap_or_default();
        let transport = Arc::new(pending.0);
        self.transport.set(Arc::clone(&transport));
        transport
    }

    /// Engine limits configured so far, defaults otherwise.
    pub(crate) fn batch_config(&self) -> BatchConfig {
        self.config.get().unwrap_or_default()
    }
}

/// Ensures the runtime is initialised in `BatchState`.
pub(crate) fn ensure_runtime(state: &BatchState) -> Result<SharedRuntime, AppError> {
    super::runtime::ensure_runtime(&state.runtime).map_err(AppError::from)
}

/// Parses a thread id used in a feature file.
pub(crate) fn thread_id(raw: &str) -> Result<ThreadId, AppError> {
    Ok(ThreadId::new(raw.trim_matches('"'))?)
}

/// Locator for `octo/repo#number`.
pub(crate) fn locator(number: u64) -> Result<PullRequestLocator, AppError> {
    Ok(PullRequestLocator::parse(&format!(
        "https://github.com/octo/repo/pull/{number}"
    ))?)
}

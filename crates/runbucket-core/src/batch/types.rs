//! Data types for batch downloads.

use crate::error::{RetrievalError, RetrievalResult};
use runbucket_abstraction::ObjectRef;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Lifecycle of one item: `Pending -> InFlight -> {Succeeded, Failed}`.
///
/// Terminal states are final; transitions out of them are ignored.
#[derive(Debug, Default)]
pub enum TransferState {
    #[default]
    Pending,
    InFlight,
    Succeeded,
    Failed(RetrievalError),
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }

    /// `Pending -> InFlight`. Returns whether the transition happened.
    pub fn start(&mut self) -> bool {
        if matches!(self, Self::Pending) {
            *self = Self::InFlight;
            return true;
        }
        false
    }

    /// `InFlight -> Succeeded | Failed`. Returns whether the transition happened.
    pub fn finish(&mut self, result: RetrievalResult<()>) -> bool {
        if !matches!(self, Self::InFlight) {
            return false;
        }
        *self = match result {
            Ok(()) => Self::Succeeded,
            Err(err) => Self::Failed(err),
        };
        true
    }

    /// Fails a non-terminal item whose worker never reported back.
    pub fn abort(&mut self, err: RetrievalError) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = Self::Failed(err);
        true
    }
}

/// Final state of one object in a batch.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub object: ObjectRef,
    /// Mirror location, when one could be derived from the object name.
    pub destination: Option<PathBuf>,
    pub state: TransferState,
}

impl DownloadOutcome {
    pub(crate) fn pending(object: ObjectRef) -> Self {
        Self { object, destination: None, state: TransferState::Pending }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state, TransferState::Succeeded)
    }

    pub fn error(&self) -> Option<&RetrievalError> {
        match &self.state {
            TransferState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of a batch download, in input order.
#[derive(Debug)]
pub struct DownloadReport {
    outcomes: Vec<DownloadOutcome>,
    /// Wall-clock time until every item reached a terminal state.
    pub total_duration: Duration,
    /// Success rate as a percentage (0.0 to 100.0).
    pub success_rate: f64,
}

impl DownloadReport {
    pub fn new(outcomes: Vec<DownloadOutcome>, total_duration: Duration) -> Self {
        let total = outcomes.len();
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let success_rate = if total > 0 { (succeeded as f64 / total as f64) * 100.0 } else { 0.0 };
        Self { outcomes, total_duration, success_rate }
    }

    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    pub fn total_items(&self) -> usize {
        self.outcomes.len()
    }

    /// First outcome recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&DownloadOutcome> {
        self.outcomes.iter().find(|o| o.name() == name)
    }

    /// Per-object results keyed by object name.
    pub fn results(&self) -> BTreeMap<&str, Result<(), &RetrievalError>> {
        self.outcomes
            .iter()
            .map(|o| (o.name(), o.error().map_or(Ok(()), Err)))
            .collect()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed().map(DownloadOutcome::name).collect()
    }

    /// Handles of the failed items, ready to be handed to a rerun.
    pub fn failed_objects(&self) -> Vec<ObjectRef> {
        self.failed().map(|o| o.object.clone()).collect()
    }

    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(DownloadOutcome::is_success)
    }

    /// Escalates any per-item failure to a single `PartialBatchFailure`.
    pub fn into_result(self) -> RetrievalResult<Self> {
        if self.is_complete_success() {
            return Ok(self);
        }
        Err(RetrievalError::PartialBatchFailure {
            failed: self.failed_names().into_iter().map(str::to_string).collect(),
            total: self.total_items(),
        })
    }
}

//! Counting protocol that tells the renderer when a document is complete.
//!
//! One batch per render pass. Every reference in the pass reports exactly
//! once, success or failure, and the batch fires a single [`BatchComplete`]
//! when the last expected report arrives. Reports are tagged with the
//! [`Generation`] they were issued under; anything tagged with a superseded
//! generation is dropped on the floor.

use inlay_model::{BatchComplete, Generation, Resolution};
use tracing::debug;

use crate::error::{InlayError, Result};

/// What a single report did to the active batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Counted { resolved: usize, expected: usize },
    /// This report was the last one; the batch has now fired.
    Completed(BatchComplete),
    /// The report belongs to a superseded or ended batch and was ignored.
    Stale,
}

#[derive(Debug, Clone)]
struct BatchState {
    generation: Generation,
    expected: usize,
    claimed: usize,
    resolved: usize,
    succeeded: usize,
    failed: usize,
    fetched: usize,
    completion: Option<BatchComplete>,
}

impl BatchState {
    fn new(generation: Generation, expected: usize) -> Self {
        let mut state = Self {
            generation,
            expected,
            claimed: 0,
            resolved: 0,
            succeeded: 0,
            failed: 0,
            fetched: 0,
            completion: None,
        };
        // Nothing to wait for.
        if expected == 0 {
            state.completion = Some(state.summary());
        }
        state
    }

    fn summary(&self) -> BatchComplete {
        BatchComplete {
            generation: self.generation,
            expected: self.expected,
            succeeded: self.succeeded,
            failed: self.failed,
            fetched: self.fetched,
        }
    }
}

#[derive(Debug)]
pub struct BatchTracker {
    last_generation: Generation,
    active: Option<BatchState>,
}

impl Default for BatchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchTracker {
    pub fn new() -> Self {
        Self {
            last_generation: Generation::new(0),
            active: None,
        }
    }

    /// Start a batch of `expected_total` references, superseding any active
    /// one. A batch of zero completes immediately.
    pub fn begin(&mut self, expected_total: usize) -> Generation {
        let generation = self.last_generation.next();
        self.last_generation = generation;

        if let Some(previous) = self.active.take()
            && previous.completion.is_none()
        {
            debug!(
                generation = %previous.generation,
                resolved = previous.resolved,
                expected = previous.expected,
                "[batch] superseded before completion"
            );
        }

        self.active = Some(BatchState::new(generation, expected_total));
        generation
    }

    pub fn current(&self) -> Option<Generation> {
        self.active.as_ref().map(|state| state.generation)
    }

    /// The active batch's completion, once it has fired.
    pub fn completion(&self) -> Option<BatchComplete> {
        self.active.as_ref().and_then(|state| state.completion)
    }

    /// `(resolved, expected)` for the active batch.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.active
            .as_ref()
            .map(|state| (state.resolved, state.expected))
    }

    /// Account for one more reference being requested in the active batch.
    ///
    /// Requesting more references than were announced to [`Self::begin`] is a
    /// caller bug and is reported as [`InlayError::BatchProtocol`].
    pub fn claim(&mut self) -> Result<Generation> {
        let Some(state) = self.active.as_mut() else {
            return Err(InlayError::BatchProtocol(
                "reference requested with no active batch".into(),
            ));
        };
        if state.claimed >= state.expected {
            return Err(InlayError::BatchProtocol(format!(
                "batch {} announced {} references but request {} arrived",
                state.generation,
                state.expected,
                state.claimed + 1
            )));
        }
        state.claimed += 1;
        Ok(state.generation)
    }

    /// Count one resolved reference. Exactly one call per reference.
    pub fn report(
        &mut self,
        generation: Generation,
        resolution: Resolution,
    ) -> Result<Report> {
        let Some(state) = self
            .active
            .as_mut()
            .filter(|state| state.generation == generation)
        else {
            debug!(generation = %generation, "[batch] ignoring stale report");
            return Ok(Report::Stale);
        };

        if state.resolved >= state.expected {
            return Err(InlayError::BatchProtocol(format!(
                "batch {generation} already received all {} reports",
                state.expected
            )));
        }

        state.resolved += 1;
        match resolution {
            Resolution::Succeeded { fetched } => {
                state.succeeded += 1;
                if fetched {
                    state.fetched += 1;
                }
            }
            Resolution::Failed(_) => state.failed += 1,
        }

        if state.resolved == state.expected {
            let summary = state.summary();
            state.completion = Some(summary);
            Ok(Report::Completed(summary))
        } else {
            Ok(Report::Counted {
                resolved: state.resolved,
                expected: state.expected,
            })
        }
    }

    /// End the batch for `generation` (the rendering session closed). Later
    /// reports for it are stale. Returns whether a batch was ended.
    pub fn end(&mut self, generation: Generation) -> bool {
        if self.current() == Some(generation) {
            self.active = None;
            true
        } else {
            false
        }
    }
}

//! Per-split state machine.

use serde::Serialize;

/// Where a split is in its acquisition cycle.
///
/// `Idle → ParallelPass → Reconciling → {Done | SequentialRetry}`,
/// `SequentialRetry → ReconcilingFinal → {Done | PermanentFailure}`.
/// A split whose manifest is absent goes straight from `Idle` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitState {
    Idle,
    ParallelPass,
    Reconciling,
    SequentialRetry,
    ReconcilingFinal,
    Done,
    PermanentFailure,
}

impl SplitState {
    pub fn can_advance_to(self, next: SplitState) -> bool {
        use SplitState::*;
        matches!(
            (self, next),
            (Idle, ParallelPass)
                | (Idle, Done)
                | (ParallelPass, Reconciling)
                | (Reconciling, Done)
                | (Reconciling, SequentialRetry)
                | (SequentialRetry, ReconcilingFinal)
                | (ReconcilingFinal, Done)
                | (ReconcilingFinal, PermanentFailure)
        )
    }

    /// Terminal for this run. `PermanentFailure` is not terminal for the
    /// dataset: the next run starts again at `ParallelPass`.
    pub fn is_terminal(self) -> bool {
        matches!(self, SplitState::Done | SplitState::PermanentFailure)
    }
}

/// Current state of one split, logging every transition.
#[derive(Debug)]
pub(crate) struct StateTracker<'a> {
    split: &'a str,
    state: SplitState,
}

impl<'a> StateTracker<'a> {
    pub(crate) fn new(split: &'a str) -> Self {
        Self {
            split,
            state: SplitState::Idle,
        }
    }

    pub(crate) fn state(&self) -> SplitState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: SplitState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid split transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::info!(split = self.split, from = ?self.state, to = ?next, "split state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::SplitState::*;
    use super::*;

    #[test]
    fn happy_paths_are_allowed() {
        assert!(Idle.can_advance_to(ParallelPass));
        assert!(ParallelPass.can_advance_to(Reconciling));
        assert!(Reconciling.can_advance_to(Done));
        assert!(Reconciling.can_advance_to(SequentialRetry));
        assert!(SequentialRetry.can_advance_to(ReconcilingFinal));
        assert!(ReconcilingFinal.can_advance_to(PermanentFailure));
    }

    #[test]
    fn shortcuts_are_rejected() {
        assert!(!ParallelPass.can_advance_to(Done));
        assert!(!Reconciling.can_advance_to(PermanentFailure));
        assert!(!SequentialRetry.can_advance_to(Done));
        assert!(!Done.can_advance_to(ParallelPass));
        assert!(!PermanentFailure.can_advance_to(SequentialRetry));
    }

    #[test]
    fn terminal_states() {
        assert!(Done.is_terminal());
        assert!(PermanentFailure.is_terminal());
        assert!(!ReconcilingFinal.is_terminal());
    }
}

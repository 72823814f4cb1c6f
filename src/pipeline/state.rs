//! Operation state machine.
//!
//! ```text
//! execute: Validating → FetchingAccount → Encrypting → Building → Broadcasting → Confirming → Done
//! query:   Validating → Encrypting → Querying → Decrypting → Done
//!                          (any state) ──▶ Failed
//! ```

use std::fmt;
use uuid::Uuid;

/// Where an operation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Validating,
    FetchingAccount,
    Encrypting,
    Building,
    Broadcasting,
    Confirming,
    Querying,
    Decrypting,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::FetchingAccount => "fetching_account",
            Self::Encrypting => "encrypting",
            Self::Building => "building",
            Self::Broadcasting => "broadcasting",
            Self::Confirming => "confirming",
            Self::Querying => "querying",
            Self::Decrypting => "decrypting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs the transitions of one operation.
#[derive(Debug)]
pub(crate) struct StateTracker {
    operation_id: Uuid,
    kind: &'static str,
    state: PipelineState,
}

impl StateTracker {
    pub(crate) fn new(operation_id: Uuid, kind: &'static str) -> Self {
        tracing::debug!(
            operation_id = %operation_id,
            kind,
            state = %PipelineState::Validating,
            "Operation started"
        );
        Self {
            operation_id,
            kind,
            state: PipelineState::Validating,
        }
    }

    #[cfg(test)]
    fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to `next`. Terminal states are sticky.
    pub(crate) fn advance(&mut self, next: PipelineState) {
        if self.state.is_terminal() {
            return;
        }
        tracing::debug!(
            operation_id = %self.operation_id,
            kind = self.kind,
            from = %self.state,
            to = %next,
            "State transition"
        );
        self.state = next;
    }

    /// Enter `Failed`, recording the state the error came from.
    pub(crate) fn fail(&mut self, error: &dyn std::error::Error) {
        if self.state.is_terminal() {
            return;
        }
        tracing::warn!(
            operation_id = %self.operation_id,
            kind = self.kind,
            state = %self.state,
            error = %error,
            "Operation failed"
        );
        self.state = PipelineState::Failed;
    }
}

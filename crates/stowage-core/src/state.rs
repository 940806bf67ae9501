//! Load operation state machine

use serde::{Deserialize, Serialize};

/// States of a load operation
///
/// State transitions:
/// ```text
/// Created → WaitingOnDependencies → Extracting → Done
///    │               │                   │
///    └───────────────┴───────────────────┴──→ Failed
/// ```
///
/// Simulated operations skip dependency waiting and go straight from
/// `Created` to `Extracting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// Operation was registered but not yet polled
    #[default]
    Created,
    /// Waiting for the bundle and its dependency closure to become ready
    WaitingOnDependencies,
    /// The asset or scene extraction request is in flight
    Extracting,
    /// The result is available
    Done,
    /// The operation ended with an error
    Failed,
}

impl OperationState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: OperationState) -> bool {
        use OperationState::*;
        matches!(
            (self, target),
            (Created, WaitingOnDependencies)
                | (Created, Extracting)
                | (WaitingOnDependencies, Extracting)
                | (Extracting, Done)
                | (Created, Failed)
                | (WaitingOnDependencies, Failed)
                | (Extracting, Failed)
        )
    }

    /// Check if the operation has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Done | OperationState::Failed)
    }

    /// Rough completion fraction for progress displays
    pub fn progress(&self) -> f32 {
        match self {
            OperationState::Created | OperationState::WaitingOnDependencies => 0.0,
            OperationState::Extracting => 0.5,
            OperationState::Done | OperationState::Failed => 1.0,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            OperationState::Created => "Operation is registered",
            OperationState::WaitingOnDependencies => "Waiting for bundle dependencies",
            OperationState::Extracting => "Extracting from the opened bundle",
            OperationState::Done => "Operation completed",
            OperationState::Failed => "Operation failed",
        }
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationState::Created => write!(f, "Created"),
            OperationState::WaitingOnDependencies => write!(f, "WaitingOnDependencies"),
            OperationState::Extracting => write!(f, "Extracting"),
            OperationState::Done => write!(f, "Done"),
            OperationState::Failed => write!(f, "Failed"),
        }
    }
}

/// How a loaded scene is combined with the scenes already present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneLoadMode {
    /// Replace all loaded scenes
    #[default]
    Single,
    /// Add to the loaded scenes
    Additive,
}


#[cfg(test)]
#[path = "state/state_parameterized_tests.rs"]
mod state_parameterized_tests;

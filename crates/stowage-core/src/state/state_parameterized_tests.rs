#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// ============================================================================
// Parameterized valid transitions
// ============================================================================

#[test_case(OperationState::Created, OperationState::WaitingOnDependencies)]
#[test_case(OperationState::Created, OperationState::Extracting)]
#[test_case(OperationState::WaitingOnDependencies, OperationState::Extracting)]
#[test_case(OperationState::Extracting, OperationState::Done)]
#[test_case(OperationState::Created, OperationState::Failed)]
#[test_case(OperationState::WaitingOnDependencies, OperationState::Failed)]
#[test_case(OperationState::Extracting, OperationState::Failed)]
fn OperationState___valid_transitions___allowed(from: OperationState, to: OperationState) {
    assert!(
        from.can_transition_to(to),
        "{:?} should transition to {:?}",
        from,
        to
    );
}

// ============================================================================
// Parameterized invalid transitions
// ============================================================================

#[test_case(OperationState::Created, OperationState::Done)]
#[test_case(OperationState::WaitingOnDependencies, OperationState::Done)]
#[test_case(OperationState::WaitingOnDependencies, OperationState::Created)]
#[test_case(OperationState::Extracting, OperationState::WaitingOnDependencies)]
#[test_case(OperationState::Done, OperationState::Failed)]
#[test_case(OperationState::Done, OperationState::Extracting)]
#[test_case(OperationState::Failed, OperationState::Extracting)]
#[test_case(OperationState::Failed, OperationState::Failed)]
fn OperationState___invalid_transitions___not_allowed(from: OperationState, to: OperationState) {
    assert!(
        !from.can_transition_to(to),
        "{:?} should not transition to {:?}",
        from,
        to
    );
}

#[test_case(OperationState::Created, "Operation is registered")]
#[test_case(OperationState::Extracting, "Extracting from the opened bundle")]
#[test_case(OperationState::Failed, "Operation failed")]
fn OperationState___description___is_human_readable(state: OperationState, expected: &str) {
    assert_eq!(state.description(), expected);
}

//! The CMG application state machine, driven by entries committed to the replicated log.
mod applier;
mod cmg_state_machine;
mod events;
mod topology;
mod validation;

pub use applier::LocalStateMachineApplier;
pub use applier::StateMachineOutput;
pub use cmg_state_machine::CmgStateMachine;
pub use cmg_state_machine::JoinState;
pub use events::TopologyEvent;
pub use events::TopologyEventListener;

//! Session crate for the conversational recommendation engine.
//!
//! Contains the [`TurnOrchestrator`], the caller-facing `reply` surface
//! that coordinates entity extraction, penalty-state validation and the
//! backbone's per-turn protocol.

pub mod orchestrator;

pub use orchestrator::TurnOrchestrator;

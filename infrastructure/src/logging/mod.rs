//! Transition audit log.
//!
//! Provides [`JsonlTransitionLogger`], a JSONL file writer subscribed to the
//! [`TransitionBus`](onboard_application::TransitionBus).

mod jsonl_transition_logger;

pub use jsonl_transition_logger::JsonlTransitionLogger;

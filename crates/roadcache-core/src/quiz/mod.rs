//! Quiz taking: catalog loading and the attempt state machine.

pub mod session;

pub use session::{AttemptOutcome, LoadTicket, QuizSession, SessionPhase};

//! Supervision of the long-running conversion process.
//!
//! - [`session`]: per-session shared state and the attempt state machine
//! - [`supervisor`]: spawning, termination and the conversion worker loop

pub mod session;
pub mod supervisor;

pub use session::{ConversionSession, SessionState};
pub use supervisor::{ProcessSupervisor, SupervisedConversion};

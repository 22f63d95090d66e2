//! # Overmode Backend
//!
//! Concrete [`SolverSession`](overmode_core::session::SolverSession)
//! implementations. The pipeline stages in `overmode-core` stay
//! engine-agnostic; this crate owns the connection details.
//!
//! ## Available backends
//!
//! | Backend | Status |
//! |---------|--------|
//! | Replay (recorded solver exports) | Implemented |
//! | Live engine binding | Deployment-specific, behind the same trait |

pub mod replay;

pub use replay::ReplaySession;

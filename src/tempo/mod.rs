//! Tempo action: short/long press discrimination for a single input
//!
//! A Tempo action owns two branches. Releasing the input before the
//! threshold activates the short branch, holding it past the threshold
//! activates the long branch.
//!
//! # Architecture
//!
//! ```text
//! host ──process_event──► TempoDispatcher ──► TempoMachine<Idle|Held>
//!                                               │            │
//!                                         short branch   long branch
//!                                               ▲            ▲
//!                                  settle task ─┘            └─ timer task
//! ```
//!
//! The timer task and the deferred short press cycle run on a tokio runtime;
//! everything else happens on the caller's thread.

pub mod branch;
pub mod config;
pub mod dispatcher;
pub mod latch;
pub mod machine;


pub use branch::{Branch, BranchFailure, BranchKind, Invocation, RecordingBranch};
pub use config::{ActivateOn, TempoConfig, DEFAULT_THRESHOLD};
pub use dispatcher::TempoDispatcher;
pub use latch::{LongPressLatch, Resolution};
pub use machine::{Activation, EventPair, SHORT_PRESS_SETTLE};

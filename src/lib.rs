//! Tempo action for joystick remapping hosts.
//!
//! A Tempo action watches one button-like input and activates its "short"
//! branch when the input is released before a threshold, or its "long"
//! branch when the input is held past it.
//!
//! * [`tempo`] - the per-input dispatcher and its state machine
//! * [`model`] - persistent configuration, branch membership, XML/TOML forms
//! * [`input`] - event and value types handed over by the host
//! * [`replay`] - scripted timelines for driving a dispatcher without a host

pub mod error;
pub mod input;
pub mod model;
pub mod replay;
pub mod tempo;

pub use error::TempoError;
pub use model::{ActionFactory, ActionId, TempoModel, TempoSnapshot};
pub use tempo::{ActivateOn, Branch, BranchKind, TempoConfig, TempoDispatcher};

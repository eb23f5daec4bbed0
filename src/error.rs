//! Error definitions for the Tempo action

use thiserror::Error;

/// Error types for the Tempo dispatcher and model
#[derive(Debug, Error)]
pub enum TempoError {
    /// Invalid threshold or activation moment at configuration time
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value payload that is not a button state
    #[error("Invalid input type: {0}")]
    InputType(String),

    /// Unknown branch name when adding an action
    #[error("Invalid branch name: {0}")]
    BranchRouting(String),

    /// Failure reported by a branch while processing an event
    #[error("{branch} branch failed: {message}")]
    Branch { branch: String, message: String },

    /// The host could not create a branch member action
    #[error("Failed to create action: {0}")]
    ActionCreation(String),

    /// Malformed persisted Tempo action
    #[error("Profile error: {0}")]
    Profile(String),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dispatcher lost its state machine, only possible after a panic mid-transition
    #[error("Invalid dispatcher state: {0}")]
    State(String),
}

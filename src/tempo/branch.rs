//! Branches are the two downstream action sets a Tempo action forwards to.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tracing::info;

use crate::error::TempoError;
use crate::input::{InputEvent, InputValue};

/// Error type a branch may report back
pub type BranchFailure = Box<dyn std::error::Error + Send + Sync>;

/// Consumer of the event/value pairs a Tempo action forwards.
///
/// Implemented by the host for its action sets. Calls may arrive from the
/// caller's thread or from a runtime worker, so implementations must be
/// thread safe and return quickly.
pub trait Branch: Send + Sync + 'static {
    fn process_event(&self, event: &InputEvent, value: &InputValue) -> Result<(), BranchFailure>;
}

/// Which of the two branches an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchKind {
    Short,
    Long,
}

impl Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchKind::Short => write!(f, "short"),
            BranchKind::Long => write!(f, "long"),
        }
    }
}

impl FromStr for BranchKind {
    type Err = TempoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(BranchKind::Short),
            "long" => Ok(BranchKind::Long),
            other => Err(TempoError::BranchRouting(other.to_string())),
        }
    }
}

/// Forwards a pair to `branch`, tagging any failure with the branch name
pub(crate) fn forward(
    kind: BranchKind,
    branch: &dyn Branch,
    event: &InputEvent,
    value: &InputValue,
) -> Result<(), TempoError> {
    branch
        .process_event(event, value)
        .map_err(|e| TempoError::Branch {
            branch: kind.to_string(),
            message: e.to_string(),
        })
}

/// A single forwarded pair together with the time it arrived
#[derive(Debug, Clone)]
pub struct Invocation {
    pub event: InputEvent,
    pub value: InputValue,
    pub at: Instant,
}

impl Invocation {
    pub fn pressed(&self) -> Option<bool> {
        self.value.current.as_bool()
    }
}

/// Branch that keeps every pair it receives
///
/// Used by the replay harness and the tests to observe what a Tempo action
/// forwarded and when.
#[derive(Debug, Clone, Default)]
pub struct RecordingBranch {
    name: String,
    invocations: Arc<Mutex<Vec<Invocation>>>,
    log: bool,
}

impl RecordingBranch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invocations: Arc::new(Mutex::new(Vec::new())),
            log: false,
        }
    }

    /// Also emits an info line per invocation
    pub fn with_logging(mut self) -> Self {
        self.log = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        match self.invocations.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.invocations().len()
    }
}

impl Branch for RecordingBranch {
    fn process_event(&self, event: &InputEvent, value: &InputValue) -> Result<(), BranchFailure> {
        if self.log {
            info!(
                "{} branch <- {}:{} {:?}",
                self.name, event.device_id, event.identifier, value.current
            );
        }

        let invocation = Invocation {
            event: event.clone(),
            value: value.clone(),
            at: Instant::now(),
        };
        self.invocations
            .lock()
            .map_err(|e| format!("recording lock poisoned: {e}"))?
            .push(invocation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputType;

    #[test]
    fn branch_names_parse() {
        assert_eq!("short".parse::<BranchKind>().unwrap(), BranchKind::Short);
        assert_eq!("long".parse::<BranchKind>().unwrap(), BranchKind::Long);
        assert!(matches!(
            "medium".parse::<BranchKind>(),
            Err(TempoError::BranchRouting(name)) if name == "medium"
        ));
    }

    #[tokio::test]
    async fn recording_branch_keeps_order() {
        let branch = RecordingBranch::new("short");
        let event = InputEvent::new("stick", InputType::JoystickButton, 3);

        branch
            .process_event(&event, &InputValue::button(true))
            .unwrap();
        branch
            .process_event(&event, &InputValue::button(false))
            .unwrap();

        let calls = branch.invocations();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].pressed(), Some(true));
        assert_eq!(calls[1].pressed(), Some(false));
        assert_eq!(calls[1].event.identifier, 3);
    }

    #[derive(Debug)]
    struct Failing;

    impl Branch for Failing {
        fn process_event(&self, _: &InputEvent, _: &InputValue) -> Result<(), BranchFailure> {
            Err("vjoy device unavailable".into())
        }
    }

    #[test]
    fn forward_tags_failures_with_branch_name() {
        let event = InputEvent::new("stick", InputType::JoystickButton, 1);
        let err = forward(BranchKind::Long, &Failing, &event, &InputValue::button(true))
            .unwrap_err();
        assert_eq!(err.to_string(), "long branch failed: vjoy device unavailable");
    }
}

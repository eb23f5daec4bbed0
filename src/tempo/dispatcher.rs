use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::branch::Branch;
use super::config::TempoConfig;
use super::machine::{Held, Idle, TempoMachine};
use crate::error::TempoError;
use crate::input::{InputEvent, InputValue};

enum Stage {
    Idle(TempoMachine<Idle>),
    Held(TempoMachine<Held>),
}

/// Short/long press dispatcher for a single physical input.
///
/// The host calls [`TempoDispatcher::process_event`] for every transition of
/// the input, one call at a time. Long press timers and the deferred short
/// press cycle run as tasks on the runtime handed to [`TempoDispatcher::new`],
/// so the dispatcher may be driven from a thread outside that runtime.
pub struct TempoDispatcher {
    stage: Option<Stage>,
}

impl TempoDispatcher {
    pub fn new(
        config: TempoConfig,
        short: Arc<dyn Branch>,
        long: Arc<dyn Branch>,
        runtime: Handle,
    ) -> Self {
        let machine = TempoMachine::create(config, short, long, runtime);
        Self {
            stage: Some(Stage::Idle(machine)),
        }
    }

    /// Creates a dispatcher on the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn on_current_runtime(
        config: TempoConfig,
        short: Arc<dyn Branch>,
        long: Arc<dyn Branch>,
    ) -> Self {
        Self::new(config, short, long, Handle::current())
    }

    /// Validates and applies a new threshold and activation moment. On error
    /// the previous configuration stays active.
    pub fn configure(&mut self, threshold: f64, activate_on: &str) -> Result<(), TempoError> {
        let config = TempoConfig::parse(threshold, activate_on)?;
        match self.stage.as_mut() {
            Some(Stage::Idle(machine)) => machine.update_config(config),
            Some(Stage::Held(machine)) => machine.update_config(config),
            None => return Err(TempoError::State("dispatcher state missing".into())),
        }
        debug!(
            "Tempo dispatcher reconfigured: threshold={}s activate_on={}",
            config.threshold(),
            config.activate_on()
        );
        Ok(())
    }

    pub fn config(&self) -> Option<&TempoConfig> {
        match self.stage.as_ref()? {
            Stage::Idle(machine) => Some(machine.config()),
            Stage::Held(machine) => Some(machine.config()),
        }
    }

    pub fn is_held(&self) -> bool {
        matches!(self.stage, Some(Stage::Held(_)))
    }

    /// Handles one press or release of the input.
    ///
    /// Returns `Ok(false)` without touching any state when the value is not
    /// a button state, or for a release that has no matching press. Failures
    /// of a branch invoked on this thread are returned as
    /// [`TempoError::Branch`]; the state transition still happens.
    pub fn process_event(
        &mut self,
        event: &InputEvent,
        value: &InputValue,
    ) -> Result<bool, TempoError> {
        let pressed = match value.current.as_bool() {
            Some(pressed) => pressed,
            None => {
                let err = TempoError::InputType(format!(
                    "Tempo action only accepts button values, received {}",
                    value.current.kind()
                ));
                warn!("{}", err);
                return Ok(false);
            }
        };

        let stage = self
            .stage
            .take()
            .ok_or_else(|| TempoError::State("dispatcher state missing".into()))?;

        let (next, handled, result) = match (stage, pressed) {
            (Stage::Idle(machine), true) => {
                let held = machine.press(event.clone(), value.clone());
                let result = held.start();
                (Stage::Held(held), true, result)
            }
            (Stage::Held(machine), true) => {
                let held = machine.press_again(event.clone(), value.clone());
                let result = held.start();
                (Stage::Held(held), true, result)
            }
            (Stage::Held(machine), false) => {
                let (idle, activation) = machine.release(event.clone(), value.clone());
                let result = match activation {
                    Some(activation) => idle.complete(activation),
                    None => Ok(()),
                };
                (Stage::Idle(idle), true, result)
            }
            (Stage::Idle(machine), false) => {
                debug!("Release without a preceding press, ignoring");
                (Stage::Idle(machine), false, Ok(()))
            }
        };

        self.stage = Some(next);
        result.map(|_| handled)
    }
}

impl Drop for TempoDispatcher {
    fn drop(&mut self) {
        if let Some(Stage::Held(machine)) = self.stage.take() {
            debug!("Dropping held tempo dispatcher, cancelling long press timer");
            let _ = machine.abandon();
        }
    }
}

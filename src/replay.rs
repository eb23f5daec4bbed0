//! Scripted press/release timelines for exercising a Tempo action without a
//! host.
//!
//! ```toml
//! [tempo]
//! threshold = 0.5
//! activate_on = "release"
//!
//! [[step]]
//! at_ms = 0
//! pressed = true
//!
//! [[step]]
//! at_ms = 200
//! pressed = false
//! ```

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::error::TempoError;
use crate::input::{InputEvent, InputState, InputType, InputValue};
use crate::model::{TempoDocument, TempoModel};
use crate::tempo::{Invocation, RecordingBranch, SHORT_PRESS_SETTLE};

/// Extra wait after the last step so pending timers can settle
const DRAIN_MARGIN: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub tempo: TempoDocument,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default)]
    pub input: u32,
    #[serde(rename = "step", default)]
    pub steps: Vec<ReplayStep>,
}

fn default_device() -> String {
    "replay".to_string()
}

/// One input transition, `at_ms` after the start of the replay.
///
/// `axis` replaces the button state with an axis value, which the Tempo
/// action is expected to reject.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayStep {
    pub at_ms: u64,
    #[serde(default)]
    pub pressed: bool,
    #[serde(default)]
    pub axis: Option<f64>,
}

impl ReplayStep {
    fn value(&self) -> InputValue {
        match self.axis {
            Some(axis) => InputValue::new(InputState::Axis(axis)),
            None => InputValue::button(self.pressed),
        }
    }
}

impl ReplayScript {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TempoError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, TempoError> {
        let script: ReplayScript = toml::from_str(text)?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<(), TempoError> {
        for pair in self.steps.windows(2) {
            if pair[1].at_ms < pair[0].at_ms {
                return Err(TempoError::Profile(format!(
                    "Replay steps out of order: {}ms after {}ms",
                    pair[1].at_ms, pair[0].at_ms
                )));
            }
        }
        Ok(())
    }
}

/// What the branches received during a replay
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub started: Instant,
    pub handled: usize,
    pub rejected: usize,
    pub failed: usize,
    pub short: Vec<Invocation>,
    pub long: Vec<Invocation>,
}

impl ReplayReport {
    /// Milliseconds between the replay start and an invocation
    pub fn offset_ms(&self, invocation: &Invocation) -> u128 {
        (invocation.at - self.started).as_millis()
    }
}

/// Runs `script` on the current runtime and collects what each branch saw
pub async fn run(script: &ReplayScript) -> Result<ReplayReport, TempoError> {
    let model = script.tempo.clone().into_model(InputType::JoystickButton)?;
    run_model(&model, script).await
}

pub async fn run_model(model: &TempoModel, script: &ReplayScript) -> Result<ReplayReport, TempoError> {
    let short = RecordingBranch::new("short").with_logging();
    let long = RecordingBranch::new("long").with_logging();
    let mut dispatcher = model.create_dispatcher(
        Arc::new(short.clone()),
        Arc::new(long.clone()),
        Handle::current(),
    );
    let event = InputEvent::new(script.device.clone(), model.input_type(), script.input);

    info!(
        "Replaying {} steps against {} (threshold={}s, activate_on={})",
        script.steps.len(),
        model.id(),
        model.threshold(),
        model.activate_on()
    );

    let started = Instant::now();
    let mut report = ReplayReport {
        started,
        handled: 0,
        rejected: 0,
        failed: 0,
        short: Vec::new(),
        long: Vec::new(),
    };

    for step in &script.steps {
        sleep_until(started + Duration::from_millis(step.at_ms)).await;
        debug!("Step at {}ms: {:?}", step.at_ms, step);
        match dispatcher.process_event(&event, &step.value()) {
            Ok(true) => report.handled += 1,
            Ok(false) => report.rejected += 1,
            Err(e) => {
                warn!("Step at {}ms failed: {}", step.at_ms, e);
                report.failed += 1;
            }
        }
    }

    let drain = model
        .config()
        .threshold_duration()
        .saturating_add(SHORT_PRESS_SETTLE + DRAIN_MARGIN);
    sleep(drain).await;

    report.short = short.invocations();
    report.long = long.invocations();
    Ok(report)
}

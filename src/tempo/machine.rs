//! Idle/Held state machine behind a Tempo dispatcher
//!
//! ```text
//!          press                       release
//!   Idle ─────────► Held(capture) ─────────────► Idle
//!                     │    ▲                       │
//!                     └────┘                       ▼
//!              press (re-arm timer)         Activation::{Short, Long}
//! ```
//!
//! Entering `Held` arms a one-shot long press timer on the runtime. The timer
//! and the release path share a [`LongPressLatch`] so the long branch fires
//! at most once per activation.

use statum::{machine, state};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::branch::{forward, Branch, BranchKind};
use super::config::{ActivateOn, TempoConfig};
use super::latch::LongPressLatch;
use crate::error::TempoError;
use crate::input::{InputEvent, InputValue};

/// Delay between the synthetic press and release sent to the short branch
pub const SHORT_PRESS_SETTLE: Duration = Duration::from_millis(50);

/// An event together with the value it carried
#[derive(Debug, Clone, PartialEq)]
pub struct EventPair {
    pub event: InputEvent,
    pub value: InputValue,
}

impl EventPair {
    pub fn new(event: InputEvent, value: InputValue) -> Self {
        Self { event, value }
    }
}

/// Everything remembered about the press that is currently held.
///
/// `config` is the configuration at press time. The whole activation is
/// classified and forwarded with it, even if the dispatcher is reconfigured
/// while the input is held.
#[derive(Debug, Clone)]
pub struct PressCapture {
    pub press: EventPair,
    pub config: TempoConfig,
    pub pressed_at: Instant,
    pub latch: Arc<LongPressLatch>,
    pub timer: CancellationToken,
}

/// Classification of a completed press/release cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// Released before the threshold elapsed
    Short {
        press: EventPair,
        release: EventPair,
        activate_on: ActivateOn,
    },
    /// Held past the threshold. `invoke_long` is false when the timer already
    /// forwarded the press to the long branch.
    Long {
        release: EventPair,
        invoke_long: bool,
        activate_on: ActivateOn,
    },
}

#[state]
#[derive(Debug, Clone)]
pub enum TempoState {
    Idle,
    Held(PressCapture),
}

#[machine]
pub struct TempoMachine<S: TempoState> {
    config: TempoConfig,
    short: Arc<dyn Branch>,
    long: Arc<dyn Branch>,
    runtime: Handle,
}

impl<S: TempoState> TempoMachine<S> {
    pub fn config(&self) -> &TempoConfig {
        &self.config
    }

    /// Replaces the configuration used from the next press on. A held press
    /// keeps the configuration it was captured with.
    pub fn update_config(&mut self, config: TempoConfig) {
        self.config = config;
    }
}

impl TempoMachine<Idle> {
    pub fn create(
        config: TempoConfig,
        short: Arc<dyn Branch>,
        long: Arc<dyn Branch>,
        runtime: Handle,
    ) -> Self {
        debug!(
            "Creating tempo machine: threshold={}s activate_on={}",
            config.threshold(),
            config.activate_on()
        );
        Self::new(config, short, long, runtime)
    }

    /// Captures the press, arms the long press timer and enters `Held`
    pub fn press(self, event: InputEvent, value: InputValue) -> TempoMachine<Held> {
        let capture = self.arm(EventPair::new(event, value));
        self.transition_with(capture)
    }

    fn arm(&self, press: EventPair) -> PressCapture {
        let config = self.config;
        let pressed_at = Instant::now();
        let deadline = pressed_at.checked_add(config.threshold_duration());
        let latch = Arc::new(LongPressLatch::new());
        let timer = CancellationToken::new();

        let long = self.long.clone();
        let timer_latch = latch.clone();
        let timer_token = timer.clone();
        let pending = press.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = timer_token.cancelled() => {
                    debug!("Long press timer cancelled");
                }
                _ = wait_for(deadline) => {
                    if !timer_latch.fire() {
                        debug!("Long press already resolved by release, timer skips");
                        return;
                    }
                    info!("Long press threshold reached, activating long branch");
                    if let Err(e) = forward(BranchKind::Long, long.as_ref(), &pending.event, &pending.value) {
                        error!("Long press timer failed: {}", e);
                    }
                }
            }
        });

        PressCapture {
            press,
            config,
            pressed_at,
            latch,
            timer,
        }
    }

    /// Forwards what a completed activation owes the branches.
    ///
    /// A short release-activation is completed on a runtime task so the
    /// caller is not blocked by the settle delay.
    pub fn complete(&self, activation: Activation) -> Result<(), TempoError> {
        match activation {
            Activation::Short {
                press,
                release,
                activate_on,
            } => match activate_on {
                ActivateOn::Release => {
                    self.spawn_short_cycle(press, release);
                    Ok(())
                }
                ActivateOn::Press => forward(
                    BranchKind::Short,
                    self.short.as_ref(),
                    &release.event,
                    &release.value,
                ),
            },
            Activation::Long {
                release,
                invoke_long,
                activate_on,
            } => {
                if invoke_long {
                    forward(
                        BranchKind::Long,
                        self.long.as_ref(),
                        &release.event,
                        &release.value,
                    )?;
                }
                if activate_on == ActivateOn::Press {
                    forward(
                        BranchKind::Short,
                        self.short.as_ref(),
                        &release.event,
                        &release.value,
                    )?;
                }
                Ok(())
            }
        }
    }

    fn spawn_short_cycle(&self, press: EventPair, release: EventPair) {
        let short = self.short.clone();
        self.runtime.spawn(async move {
            if let Err(e) = forward(BranchKind::Short, short.as_ref(), &press.event, &press.value) {
                error!("Short press activation failed: {}", e);
            }
            sleep(SHORT_PRESS_SETTLE).await;
            if let Err(e) = forward(
                BranchKind::Short,
                short.as_ref(),
                &release.event,
                &release.value,
            ) {
                error!("Short press release failed: {}", e);
            }
        });
    }
}

impl TempoMachine<Held> {
    /// Sends the press to the short branch when activating on press
    pub fn start(&self) -> Result<(), TempoError> {
        match self.get_state_data() {
            Some(capture) if capture.config.activate_on() != ActivateOn::Press => Ok(()),
            Some(capture) => forward(
                BranchKind::Short,
                self.short.as_ref(),
                &capture.press.event,
                &capture.press.value,
            ),
            None => Err(TempoError::State("held without a captured press".into())),
        }
    }

    /// A second press without a release in between. The stale timer is
    /// cancelled before a new one is armed.
    pub fn press_again(self, event: InputEvent, value: InputValue) -> TempoMachine<Held> {
        warn!("Press received while already held, re-arming long press timer");
        self.abandon().press(event, value)
    }

    /// Drops the pending activation without forwarding anything
    pub fn abandon(self) -> TempoMachine<Idle> {
        if let Some(capture) = self.get_state_data() {
            capture.timer.cancel();
            let _ = capture.latch.cancel();
        }
        self.transition()
    }

    /// Classifies the activation by how long the input was held and returns
    /// to `Idle`.
    pub fn release(
        self,
        event: InputEvent,
        value: InputValue,
    ) -> (TempoMachine<Idle>, Option<Activation>) {
        let Some(capture) = self.get_state_data().cloned() else {
            error!("Held state without a captured press, dropping release");
            return (self.transition(), None);
        };

        let elapsed = capture.pressed_at.elapsed();
        let threshold = capture.config.threshold_duration();
        let activate_on = capture.config.activate_on();
        capture.timer.cancel();

        let release = EventPair::new(event, value);
        let activation = if elapsed < threshold {
            match capture.latch.cancel() {
                Ok(()) => {
                    debug!("Short press after {:.3}s", elapsed.as_secs_f64());
                    Activation::Short {
                        press: capture.press,
                        release,
                        activate_on,
                    }
                }
                Err(resolution) => {
                    debug!(
                        "Release after {:.3}s lost the race to the timer ({:?}), treating as long press",
                        elapsed.as_secs_f64(),
                        resolution
                    );
                    Activation::Long {
                        release,
                        invoke_long: false,
                        activate_on,
                    }
                }
            }
        } else {
            let invoke_long = capture.latch.claim();
            debug!(
                "Long press after {:.3}s, release handler owns long branch: {}",
                elapsed.as_secs_f64(),
                invoke_long
            );
            Activation::Long {
                release,
                invoke_long,
                activate_on,
            }
        };

        (self.transition(), Some(activation))
    }
}

/// Sleeps until `deadline`. A deadline past the clock's range never arrives.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

use std::sync::atomic::{AtomicU8, Ordering};

const PENDING: u8 = 0;
const FIRED_BY_TIMER: u8 = 1;
const CLAIMED_BY_RELEASE: u8 = 2;
const CANCELLED: u8 = 3;

/// How the long press of one activation was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Pending,
    FiredByTimer,
    ClaimedByRelease,
    Cancelled,
}

impl From<u8> for Resolution {
    fn from(raw: u8) -> Self {
        match raw {
            FIRED_BY_TIMER => Resolution::FiredByTimer,
            CLAIMED_BY_RELEASE => Resolution::ClaimedByRelease,
            CANCELLED => Resolution::Cancelled,
            _ => Resolution::Pending,
        }
    }
}

/// One-shot latch shared between the long press timer and the release path.
///
/// Exactly one transition out of `Pending` succeeds. The winner owns the long
/// branch invocation for the activation; everyone else skips it.
#[derive(Debug, Default)]
pub struct LongPressLatch {
    state: AtomicU8,
}

impl LongPressLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timer side: returns true if the timer may invoke the long branch
    pub fn fire(&self) -> bool {
        self.resolve(FIRED_BY_TIMER).is_ok()
    }

    /// Release side of a long press: returns true if the release handler
    /// may invoke the long branch
    pub fn claim(&self) -> bool {
        self.resolve(CLAIMED_BY_RELEASE).is_ok()
    }

    /// Release side of a short press. Fails with the winning resolution when
    /// the timer got there first.
    pub fn cancel(&self) -> Result<(), Resolution> {
        self.resolve(CANCELLED)
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::from(self.state.load(Ordering::Acquire))
    }

    fn resolve(&self, to: u8) -> Result<(), Resolution> {
        self.state
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(Resolution::from)
    }
}

use core::fmt;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

#[cfg(test)]
use mock_instant::Instant;
#[cfg(not(test))]
use std::time::Instant;

/// See [`ControlFlow::Handle`].
///
/// Also reused as the cancellation token for the typing animations: the machine keeps one clone and sets it to tell
/// the metronome driving the animation to die.
#[derive(Clone)]
pub struct WaitHandle(Arc<AtomicBool>);

impl WaitHandle {
    /// Create a new waiting handle
    pub fn new() -> Self {
        WaitHandle(Arc::new(AtomicBool::new(false)))
    }

    /// Notify the waiting agent that it can wake up.
    pub fn wake(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Check whether [`Self::wake`] has been called on this handle yet
    pub fn is_woken(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// How many copies of this handle exist.
    pub fn references(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl Default for WaitHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for WaitHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for WaitHandle {}
impl fmt::Debug for WaitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaitHandle(...)")
    }
}

/// What should happen to an [`Agent`][super::Agent] after it finishes [react][super::Agent::react]ing to a message.
///
/// Note that this only defines when [`Agent::react`][super::Agent::react] can start being called again -- if there
/// are no messages available, it may not actually be called! This should be rare in the actual game but it may happen
/// in tests.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum ControlFlow {
    /// Continue as normal and update next time.
    Continue,
    /// Stop updating this agent and (eventually) destroy it.
    Kill,
    /// Wait until notified by someone who has the handle
    Handle(WaitHandle),
    /// Sleep, waking up at the given time
    Time(Instant),
}

impl ControlFlow {
    /// Create a new [`ControlFlow::Handle`], with its handle so something else can wake it.
    pub fn wait() -> (Self, WaitHandle) {
        let wh = WaitHandle::new();
        (Self::Handle(wh.clone()), wh)
    }

    /// Create a new [`ControlFlow::Time`], waiting until the given time.
    pub fn sleep_until(time: Instant) -> Self {
        Self::Time(time)
    }

    /// Create a new [`ControlFlow::Time`], waiting for a given duration.
    pub fn sleep_for(amt: Duration) -> Self {
        Self::Time(Instant::now() + amt)
    }

    /// Check whether an agent which returned this control flow is ready to start reacting again.
    pub fn is_ready(&self) -> bool {
        match self {
            ControlFlow::Continue => true,
            ControlFlow::Kill => false,
            ControlFlow::Handle(wh) => wh.is_woken(),
            ControlFlow::Time(when) => &Instant::now() > when,
        }
    }
}

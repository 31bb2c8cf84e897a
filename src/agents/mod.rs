//! Agents are the engine's way of making things happen later without threads: each one reacts to the messages of a
//! round and tells the runner when it wants to be called again. The game uses them purely for timing -- a
//! [`Metronome`] drives the typewriter animations and an [`Alarm`] ends the fixed message dwells.

use std::time::Duration;

use crate::game::{Message, Replies};

mod cf;
pub use cf::{ControlFlow, WaitHandle};

/// An agent in the system, which can react to messages.
///
/// Messages are processed in rounds. There's a list of 'current' messages, which are fed into every agent and the
/// game at the same time. Then all of the replies are collected, and those are the 'current' messages for the next
/// round. As that implies, messages are inherently ephemeral -- none persist more than one round.
pub trait Agent<M: Message>: Send {
    /// Called once on spawn, to queue any starting messages or sleeps as necessary. This will always be called
    /// before `react` is ever called. By default, does nothing and returns [`ControlFlow::Continue`], so that
    /// [`Self::react`] will be called on the next tick.
    fn start(&mut self, _replies: &mut Replies<M>) -> ControlFlow {
        ControlFlow::Continue
    }

    /// React to one message of a round, indicating when the agent should be called next and optionally queueing
    /// some more messages.
    fn react(&mut self, msg: &M, replies: &mut Replies<M>) -> ControlFlow;
}

/// Queues a copy of one message on a fixed period until its handle is woken, then dies.
///
/// This is the engine half of the typing animations: the machine holds the other clone of the handle as its
/// cancellation token and wakes it when the animation finishes or is aborted.
pub struct Metronome<M> {
    period: Duration,
    msg: M,
    cancel: WaitHandle,
}

impl<M> Metronome<M> {
    /// Tick every `period`, queueing a copy of `msg`, until `cancel` is woken.
    pub fn new(period: Duration, msg: M, cancel: WaitHandle) -> Self {
        Self {
            period,
            msg,
            cancel,
        }
    }
}

impl<M: Message> Agent<M> for Metronome<M> {
    fn start(&mut self, _replies: &mut Replies<M>) -> ControlFlow {
        ControlFlow::sleep_for(self.period)
    }

    fn react(&mut self, _msg: &M, replies: &mut Replies<M>) -> ControlFlow {
        if self.cancel.is_woken() {
            return ControlFlow::Kill;
        }
        replies.queue(self.msg.clone());
        ControlFlow::sleep_for(self.period)
    }
}

/// Queues one message after a fixed delay, then dies.
pub struct Alarm<M> {
    delay: Duration,
    msg: Option<M>,
}

impl<M> Alarm<M> {
    pub fn new(delay: Duration, msg: M) -> Self {
        Self {
            delay,
            msg: Some(msg),
        }
    }
}

impl<M: Message> Agent<M> for Alarm<M> {
    fn start(&mut self, _replies: &mut Replies<M>) -> ControlFlow {
        ControlFlow::sleep_for(self.delay)
    }

    fn react(&mut self, _msg: &M, replies: &mut Replies<M>) -> ControlFlow {
        if let Some(msg) = self.msg.take() {
            replies.queue(msg);
        }
        ControlFlow::Kill
    }
}

#[cfg(test)]
mod agent_test {
    use super::*;
    use crate::machine::Msg;

    #[test]
    fn metronome_queues_until_cancelled() {
        let cancel = WaitHandle::new();
        let mut m = Metronome::new(
            Duration::from_millis(50),
            Msg::TypeTick,
            cancel.clone(),
        );
        let mut replies = Replies::default();
        assert!(matches!(m.start(&mut replies), ControlFlow::Time(_)));
        assert!(matches!(
            m.react(&Msg::Tick, &mut replies),
            ControlFlow::Time(_)
        ));
        assert_eq!(replies.messages(), &[Msg::TypeTick]);
        cancel.wake();
        assert_eq!(m.react(&Msg::Tick, &mut replies), ControlFlow::Kill);
        assert_eq!(replies.messages(), &[Msg::TypeTick]);
    }

    #[test]
    fn alarm_fires_once() {
        let mut a = Alarm::new(Duration::from_millis(900), Msg::TypeTick);
        let mut replies = Replies::default();
        assert!(matches!(a.start(&mut replies), ControlFlow::Time(_)));
        assert_eq!(a.react(&Msg::Tick, &mut replies), ControlFlow::Kill);
        assert_eq!(a.react(&Msg::Tick, &mut replies), ControlFlow::Kill);
        assert_eq!(replies.messages(), &[Msg::TypeTick]);
    }
}

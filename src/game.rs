//! Contains the "main loop" bits of the game: passes messages around, renders, and handles IO.
//!
//! This is also the primary split between the "engine" and "game" halves.

use core::fmt;
use std::{fmt::Debug, mem};

use crate::{
    agents::{Agent, ControlFlow},
    io::{input::Action, output::Screen, sys::IoSystem},
    timing::Timer,
};

pub trait Message: Clone + Send + Sync {
    /// The message to send agents when there aren't any other messages queued for processing, to ensure every awake
    /// agent processes at least one message per round. Will **not** be sent if there are any other messages.
    ///
    /// This method should be as simple and fast as possible, ideally just returning a constant value.
    fn tick() -> Self;
}

/// Allows a [`Game`] or [`Agent`] to make things happen in the engine in response to messages or input.
pub struct Replies<M: Message> {
    agents: Vec<Box<dyn Agent<M>>>,
    messages: Vec<M>,
}

impl<M: Message> Replies<M> {
    #[cfg(test)]
    /// A **test-only** function, so you can ensure your code queues the correct messages.
    pub fn messages(&self) -> &[M] {
        &self.messages
    }

    #[cfg(test)]
    /// A **test-only** function, so you can ensure your code spawns the correct number of agents.
    pub fn spawned(&self) -> usize {
        self.agents.len()
    }
}

impl<M: Message> Default for Replies<M> {
    fn default() -> Self {
        Self {
            agents: Default::default(),
            messages: Default::default(),
        }
    }
}

impl<M: Message> Debug for Replies<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(std::any::type_name::<Self>())
            .field("agents", &self.agents.len())
            .field("messages", &self.messages.len())
            .finish()
    }
}

impl<M: Message> Replies<M> {
    pub fn spawn(&mut self, agent: impl Agent<M> + 'static) -> &mut Self {
        self.agents.push(Box::new(agent));
        self
    }
    pub fn queue(&mut self, msg: M) -> &mut Self {
        self.messages.push(msg);
        self
    }
}

/// Allows a [`Game`] to control the engine in response to messages or input.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Response {
    /// Nothing in particular needs to be done.
    Nothing,
    /// The visual state has updated, and the screen needs to be redrawn.
    Redraw,
    /// The game should be exited, e.g. because the player pressed Escape.
    Quit,
}

/// Represents a game which can be run in the main loop.
///
/// The idea here is:
///
/// - When there's relevant user input, you can queue messages or spawn agents, and/or update state for rendering
/// - When a message comes back around (including one you queued!), you can update state for rendering, and spawn
///   any agents the transition needs
/// - Come time to render, you already have all the info you need from previous inputs/messages
pub trait Game: Send {
    /// The message that this `Game` will be passing around between agents and itself.
    type Message: Message;

    /// The user has done some input; update the state and queue messages or spawn agents accordingly.
    fn input(&mut self, input: Action, replies: &mut Replies<Self::Message>) -> Response;

    /// A message has happened; update the state accordingly.
    fn message(&mut self, msg: &Self::Message, replies: &mut Replies<Self::Message>) -> Response;

    /// Render the game onto the provided [`Screen`].
    fn render(&mut self, onto: &mut Screen);
}

struct AgentRunner<M: Message> {
    agents: Vec<(ControlFlow, Box<dyn Agent<M>>)>,
    replies: Replies<M>,
}

impl<M: Message> AgentRunner<M> {
    fn new() -> Self {
        Self {
            agents: Default::default(),
            replies: Default::default(),
        }
    }

    /// Perform one round of message processing.
    ///
    /// `messages` and `agents` are both input and output:
    ///
    /// - incoming, they're the messages agents should react to and the agents to start running
    /// - outgoing, they're the messages and agents that this round queued
    ///
    /// Notably the vecs *will be cleared* and old messages *will not be available*!
    fn step(&mut self, messages: &mut Vec<M>, agents: &mut Vec<Box<dyn Agent<M>>>) {
        self.agents.extend(
            agents
                .drain(..)
                .map(|mut a| (a.start(&mut self.replies), a)),
        );

        if messages.is_empty() {
            messages.push(M::tick());
        }

        for (cf, agent) in self.agents.iter_mut() {
            if !cf.is_ready() {
                continue;
            }
            for msg in messages.iter() {
                *cf = agent.react(msg, &mut self.replies);
                if !cf.is_ready() {
                    break;
                }
            }
        }

        // filter out agents that will never wake up
        self.agents.retain(|(cf, _ag)| match cf {
            // never is_ready again
            ControlFlow::Kill => false,
            // if there's only one reference, it's the one in this handle
            ControlFlow::Handle(h) => h.references() > 1,
            // otherwise it might eventually wake up, keep it around
            _ => true,
        });

        // we're done with the old messages now
        messages.clear();
        // pragmatically this just outputs self.replies.messages and clears it, but this reuses allocations
        mem::swap(&mut self.replies.messages, messages);
        // ditto but for agents (no clear needed because we drained earlier)
        mem::swap(&mut self.replies.agents, agents);
    }
}

struct GameRunner<G: Game, IO: IoSystem> {
    game: G,
    iosys: IO,
    screen: Screen,
    tainted: bool,
    render_timer: Timer,
    round_timer: Timer,
}

impl<G: Game, IO: IoSystem> GameRunner<G, IO> {
    fn new(game: G, iosys: IO) -> Self {
        let screen = Screen::new(iosys.size());
        Self {
            game,
            iosys,
            screen,
            tainted: true,
            // Render at most ~60fps
            render_timer: Timer::new(1.0 / 60.0),
            // Run agent rounds at the same pace, so short sleeps (e.g. typing ticks) fire on time
            round_timer: Timer::new(1.0 / 60.0),
        }
    }

    /// This uses the same API as [`AgentRunner::step`].
    ///
    /// Returns whether to keep running the game or not.
    fn step(&mut self, messages: &mut Vec<G::Message>, agents: &mut Vec<Box<dyn Agent<G::Message>>>) -> bool {
        // game-spawned things join whatever the agents queued last round
        let mut replies = Replies {
            agents: mem::take(agents),
            messages: vec![],
        };

        // feed this round's messages to the game first
        for msg in messages.iter() {
            match self.game.message(msg, &mut replies) {
                Response::Nothing => (),
                Response::Redraw => self.tainted = true,
                Response::Quit => return false,
            }
        }
        messages.clear();

        // then process input for any remaining time in the round
        while let Ok(Some(action)) = self.iosys.input_until(self.round_timer.remaining()) {
            match action {
                Action::Closed => return false,
                Action::Redraw => self.tainted = true,
                other => match self.game.input(other, &mut replies) {
                    Response::Nothing => (),
                    Response::Redraw => self.tainted = true,
                    Response::Quit => return false,
                },
            }
        }

        *agents = replies.agents;
        *messages = replies.messages;

        self.round_timer.tick();
        self.render();
        true
    }

    fn render(&mut self) {
        if !self.render_timer.ready() {
            return;
        }
        let new_size = self.iosys.size();
        if self.tainted || new_size != self.screen.size() {
            self.screen.resize(new_size);
            self.game.render(&mut self.screen);
            self.iosys.draw(&self.screen).unwrap();
            self.tainted = false;
        }
    }
}

/// Handles starting up and running a [`Game`].
#[must_use]
pub struct Runner<G: Game + 'static> {
    messages: Vec<G::Message>,
    agents: Vec<Box<dyn Agent<G::Message>>>,
    game: G,
}

impl<G: Game + 'static> Runner<G> {
    /// Prepare a game to be run
    pub fn new(game: G) -> Self {
        Self {
            game,
            messages: vec![],
            agents: vec![],
        }
    }

    /// Set an agent to be running at game startup, to process the first round of messages
    pub fn spawn(mut self, agent: impl Agent<G::Message> + 'static) -> Self {
        self.agents.push(Box::new(agent));
        self
    }

    /// Add a message to be handled on the first round, by the first crop of [`spawn`][Self::spawn]ed agents.
    pub fn queue(mut self, msg: G::Message) -> Self {
        self.messages.push(msg);
        self
    }

    #[cfg(feature = "__sys")]
    fn run_game(self, iosys: impl IoSystem) -> G {
        let Self {
            game,
            mut messages,
            mut agents,
        } = self;

        let mut ar = AgentRunner::new();
        let mut gr = GameRunner::new(game, iosys);

        loop {
            if !gr.step(&mut messages, &mut agents) {
                break;
            }
            ar.step(&mut messages, &mut agents);
        }
        gr.iosys.stop();
        gr.game
    }

    /// Start the game running.
    ///
    /// This **must** be run on the main thread. Ideally, you'd run it from `main` directly.
    ///
    /// This function only exits when [`Game::message`] or [`Game::input`] returns [`Response::Quit`]. It returns the
    /// [`Game`], primarily for testing purposes.
    #[cfg(feature = "__sys")]
    pub fn run(self) -> G {
        use crate::io::sys::{self, IoRunner as _};
        let (iosys, mut iorun) = sys::load().expect("failed to initialize any IO system");
        let thread = std::thread::spawn(move || self.run_game(iosys));
        iorun.run();
        thread.join().unwrap()
    }
}

//! Cashout is divided into two halves, architecturally:
//!
//! - The engine: a little message-passing main loop ([`game`]), timing agents ([`agents`]), and a multi-backend
//!   text-grid IO layer ([`io`]). Nothing in here knows what an ATM is.
//! - The game: a [`session`] record of one run, an [`outcome`] seam for everything chance decides, the narrative
//!   [`events`] catalog, and the [`machine`] that dispatches input and drives transitions. The [`panel`] draws the
//!   machine's [`view`] and reports where its hot zones landed.
//!
//! The split that matters for testing: the machine emits a view-model and consumes semantic input, so every piece
//! of game logic runs headless, with chance scripted and time injected.

pub mod agents;
pub mod constants;
pub mod events;
pub mod game;
pub mod io;
pub mod machine;
pub mod outcome;
pub mod panel;
pub mod session;
pub mod timing;
mod util;
pub mod view;

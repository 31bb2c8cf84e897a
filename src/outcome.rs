//! Every probabilistic outcome in the game, behind one seam.
//!
//! The machine never touches a random number generator directly: it asks an [`Outcomes`] for the things that can
//! happen, so tests can script them. The real implementation, [`RngOutcomes`], matches the machine's actual odds.

use rand::Rng;

use crate::{
    events::{self, EventId, Rarity},
    session::UsedEvents,
};

/// The machine's source of chance. One method per kind of draw the game makes.
pub trait Outcomes: Send {
    /// How many cents the machine pays out for one withdraw.
    fn dispense(&mut self) -> u32;
    /// Whether a withdraw at `pct` percent lock chance eats the card.
    fn roll_lock(&mut self, pct: u8) -> bool;
    /// Which rarity tier the next narrative event comes from.
    fn rarity(&mut self) -> Rarity;
    /// Which event from `tier` fires, avoiding repeats until the tier's pool runs dry. Records the pick in `used`.
    fn pick_event(&mut self, tier: Rarity, used: &mut UsedEvents) -> EventId;
    /// A 50/50 branch inside an event.
    fn coin(&mut self) -> bool;
    /// The camera event's lock shift, uniform in -15..=+15.
    fn camera_delta(&mut self) -> i16;
}

/// The real odds, over any uniform [`Rng`].
pub struct RngOutcomes<R>(pub R);

impl<R: Rng + Send> Outcomes for RngOutcomes<R> {
    fn dispense(&mut self) -> u32 {
        let r = self.0.gen::<f64>() * 100.0;
        if r < 1.0 {
            1000
        } else if r < 6.0 {
            500
        } else {
            self.0.gen_range(1..=3) * 100
        }
    }

    fn roll_lock(&mut self, pct: u8) -> bool {
        pct > 0 && self.0.gen::<f64>() * 100.0 < pct as f64
    }

    fn rarity(&mut self) -> Rarity {
        let r = self.0.gen::<f64>() * 100.0;
        if r < 60.0 {
            Rarity::Common
        } else if r < 90.0 {
            Rarity::Uncommon
        } else {
            Rarity::Rare
        }
    }

    fn pick_event(&mut self, tier: Rarity, used: &mut UsedEvents) -> EventId {
        let pool = events::pool(tier);
        let seen = used.tier_mut(tier);
        if seen.len() >= pool.len() {
            seen.clear();
        }
        let fresh: Vec<EventId> = pool.iter().copied().filter(|id| !seen.contains(id)).collect();
        let id = fresh[self.0.gen_range(0..fresh.len())];
        seen.insert(id);
        id
    }

    fn coin(&mut self) -> bool {
        self.0.gen::<f64>() < 0.5
    }

    fn camera_delta(&mut self) -> i16 {
        self.0.gen_range(-15..=15)
    }
}

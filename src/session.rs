//! The single record of progress through a run: how much the machine has paid out, how close it is to eating the
//! card, and what the narrative events have done to it.

use std::collections::HashSet;

use crate::{
    constants::{gameplay, script},
    events::{EventId, Rarity},
};

/// Everything a run of the game mutates. Owned by the machine and handed by `&mut` into whichever handler is
/// resolving the current transition; nothing else holds onto it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Cash dispensed so far, in cents.
    pub cash: u32,
    /// Percent chance, 0-99, that the next withdraw ends the run.
    pub lock_chance: u8,
    /// When true the panel shows `??` instead of the lock chance.
    pub lock_hidden: bool,
    /// What it currently costs to reset the lock chance, in cents.
    pub atm_fee: u32,
    /// Successful withdraws since the last reset; drives how fast the lock chance grows.
    pub successful_withdraws: u32,
    /// Successful withdraws since the last narrative event.
    pub withdraws_since_event: u32,
    /// Which events each rarity tier has already shown this cycle.
    pub used_events: UsedEvents,
    /// Label on the idle control. Normally `( WITHDRAW )`; the win gate and one code both relabel it.
    pub withdraw_label: &'static str,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            cash: 0,
            lock_chance: 0,
            lock_hidden: false,
            atm_fee: gameplay::STARTING_FEE_CENTS,
            successful_withdraws: 0,
            withdraws_since_event: 0,
            used_events: Default::default(),
            withdraw_label: script::WITHDRAW_LABEL,
        }
    }
}

impl Session {
    /// Start the run over: loss, win payoff, or one of the events that walks the player out.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    pub fn add_cash(&mut self, cents: u32) {
        self.cash += cents;
    }

    /// Shift the lock chance by a signed delta, clamped into `[0, 99]`.
    pub fn bump_lock(&mut self, delta: i16) {
        let bumped = (self.lock_chance as i16 + delta).clamp(0, gameplay::LOCK_CHANCE_CAP as i16);
        self.lock_chance = bumped as u8;
    }

    pub fn fee_available(&self) -> bool {
        self.cash >= self.atm_fee
    }

    /// Pay the fee: deduct it and clear the lock chance (and its hidden marker). Does nothing and reports `false`
    /// when the player can't cover it.
    pub fn pay_fee(&mut self) -> bool {
        if !self.fee_available() {
            return false;
        }
        self.cash -= self.atm_fee;
        self.lock_chance = 0;
        self.lock_hidden = false;
        true
    }

    /// Cut the fee, to a floor of zero.
    pub fn discount_fee(&mut self, cents: u32) {
        self.atm_fee = self.atm_fee.saturating_sub(cents);
    }

    /// Book a successful withdraw of `cents`: the payout lands, and the lock chance grows by the number of
    /// successful withdraws so far.
    pub fn record_withdraw(&mut self, cents: u32) {
        self.add_cash(cents);
        self.successful_withdraws += 1;
        let grown = (self.lock_chance as u32 + self.successful_withdraws)
            .min(gameplay::LOCK_CHANCE_CAP as u32);
        self.lock_chance = grown as u8;
    }

    pub fn won(&self) -> bool {
        self.cash >= gameplay::WIN_CENTS
    }
}

/// Per-rarity-tier memory of which events have already fired this cycle, so tiers don't repeat until they run dry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsedEvents {
    common: HashSet<EventId>,
    uncommon: HashSet<EventId>,
    rare: HashSet<EventId>,
}

impl UsedEvents {
    pub fn tier(&self, rarity: Rarity) -> &HashSet<EventId> {
        match rarity {
            Rarity::Common => &self.common,
            Rarity::Uncommon => &self.uncommon,
            Rarity::Rare => &self.rare,
        }
    }

    pub fn tier_mut(&mut self, rarity: Rarity) -> &mut HashSet<EventId> {
        match rarity {
            Rarity::Common => &mut self.common,
            Rarity::Uncommon => &mut self.uncommon,
            Rarity::Rare => &mut self.rare,
        }
    }
}

/// Format cents as dollars with exactly two decimal places, e.g. the cash readout.
pub fn dollars(cents: u32) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Format cents as dollars, dropping a `.00` tail, e.g. the fee readout.
pub fn dollars_trim(cents: u32) -> String {
    if cents % 100 == 0 {
        format!("{}", cents / 100)
    } else {
        dollars(cents)
    }
}

#[cfg(test)]
mod session_test {
    use super::*;

    #[test]
    fn fresh_run_defaults() {
        let s = Session::default();
        assert_eq!(s.cash, 0);
        assert_eq!(s.lock_chance, 0);
        assert!(!s.lock_hidden);
        assert_eq!(s.atm_fee, 300);
        assert_eq!(s.successful_withdraws, 0);
        assert_eq!(s.withdraws_since_event, 0);
        assert_eq!(s.withdraw_label, "( WITHDRAW )");
    }

    #[test]
    fn reset_restores_every_default() {
        let mut s = Session::default();
        s.add_cash(1234);
        s.lock_chance = 55;
        s.lock_hidden = true;
        s.atm_fee = 100;
        s.successful_withdraws = 9;
        s.withdraws_since_event = 3;
        s.used_events.tier_mut(Rarity::Rare).insert(10);
        s.withdraw_label = "( PROCEED )";
        s.reset();
        assert_eq!(s, Session::default());
    }

    #[test]
    fn first_withdraw_scenario() {
        // cash=0, lock=0, withdraws=0; a successful withdraw of `a` leaves cash=a, withdraws=1, lock=1
        for cents in [100, 200, 300, 500, 1000] {
            let mut s = Session::default();
            s.record_withdraw(cents);
            assert_eq!(s.cash, cents);
            assert_eq!(s.successful_withdraws, 1);
            assert_eq!(s.lock_chance, 1);
        }
    }

    #[test]
    fn lock_growth_accelerates_and_caps() {
        let mut s = Session::default();
        for _ in 0..5 {
            s.record_withdraw(100);
        }
        // 1+2+3+4+5
        assert_eq!(s.lock_chance, 15);
        s.lock_chance = 98;
        s.record_withdraw(100);
        assert_eq!(s.lock_chance, 99);
    }

    #[test]
    fn bump_lock_clamps_both_ways() {
        let mut s = Session::default();
        s.bump_lock(-10);
        assert_eq!(s.lock_chance, 0);
        s.bump_lock(150);
        assert_eq!(s.lock_chance, 99);
        s.bump_lock(-15);
        assert_eq!(s.lock_chance, 84);
    }

    #[test]
    fn fee_needs_funds() {
        let mut s = Session::default();
        s.add_cash(299);
        s.lock_chance = 40;
        let before = s.clone();
        assert!(!s.pay_fee());
        assert_eq!(s, before);
    }

    #[test]
    fn fee_resets_lock_and_deducts() {
        let mut s = Session::default();
        s.add_cash(500);
        s.lock_chance = 40;
        s.lock_hidden = true;
        assert!(s.pay_fee());
        assert_eq!(s.cash, 200);
        assert_eq!(s.lock_chance, 0);
        assert!(!s.lock_hidden);
    }

    #[test]
    fn fee_discount_floors_at_zero() {
        let mut s = Session::default();
        s.discount_fee(100);
        assert_eq!(s.atm_fee, 200);
        s.discount_fee(500);
        assert_eq!(s.atm_fee, 0);
    }

    #[test]
    fn dollar_formatting() {
        assert_eq!(dollars(0), "0.00");
        assert_eq!(dollars(2050), "20.50");
        assert_eq!(dollars(1), "0.01");
        assert_eq!(dollars_trim(300), "3");
        assert_eq!(dollars_trim(250), "2.50");
        assert_eq!(dollars_trim(69), "0.69");
    }
}
